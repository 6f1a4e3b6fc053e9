//! The seven-pass hierarchical chunking pipeline.
//!
//! Pages go in, chunks come out:
//!
//! 1. annotate every line with a type and token count
//! 2. group lines into semantic units at heading boundaries
//! 3. greedily pack units into chunks of at most `max_tokens`
//! 4. prepend overlap context from the previous chunk (optional)
//! 5. merge undersized chunks, with a 10% slack allowance
//! 6. split chunks that still exceed the budget at line boundaries
//! 7. strict final merge, then re-measure every chunk's token count
//!
//! Every pass consumes its input sequence and builds a new one; nothing is
//! mutated across pass boundaries. The whole pipeline is deterministic for
//! a given input and options.

pub mod annotate;
pub mod merge;
pub mod overlap;
pub mod pack;
pub mod split;
pub mod units;

use crate::tokenizer::Tokenizer;
use crate::types::{Chunk, ChunkOptions, PageText};

/// Run passes 1-7 over ordered page texts.
///
/// Pages whose text is entirely whitespace are dropped up front; an empty
/// input (or one that becomes empty after the filter) yields an empty chunk
/// sequence, which is a valid result.
pub fn chunk_pages(pages: Vec<PageText>, options: &ChunkOptions, tokenizer: &Tokenizer) -> Vec<Chunk> {
    let pages: Vec<PageText> = pages
        .into_iter()
        .filter(|p| !p.text.trim().is_empty())
        .collect();
    if pages.is_empty() {
        return Vec::new();
    }

    let lines = annotate::annotate_lines(&pages, tokenizer);
    let units = units::build_semantic_units(lines);
    let mut chunks = pack::pack_units(units, options);
    log::debug!(
        "packed {} pages into {} initial chunks",
        pages.len(),
        chunks.len()
    );

    overlap::add_overlap(&mut chunks, options.overlap_tokens, tokenizer);
    let chunks = merge::merge_small_chunks(chunks, options);
    let chunks = split::split_oversized(chunks, options, tokenizer);
    let chunks = merge::final_merge(chunks, options, tokenizer);

    log::debug!("pipeline produced {} chunks", chunks.len());
    chunks
}
