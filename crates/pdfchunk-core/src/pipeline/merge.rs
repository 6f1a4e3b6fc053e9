//! Passes 5 and 7: merging of undersized chunks.
//!
//! Pass 5 runs before the oversize split and is allowed a 10% size overshoot
//! when it prevents a very small fragment. Pass 7 runs after the split,
//! never exceeds `max_tokens`, and finishes by re-measuring every chunk
//! against the tokenizer.

use crate::tokenizer::Tokenizer;
use crate::types::{Chunk, ChunkOptions};

/// Pass 5: greedily merge undersized chunks into their successors.
///
/// A merge is allowed when the combined size stays within `max_tokens`, or
/// within `max_tokens * 1.1` when the next chunk is smaller than half the
/// minimum. It is vetoed when the next chunk opens a section (major heading
/// at level 1-2) and the current chunk is already at least half the minimum:
/// section starts are worth keeping on a chunk boundary.
pub fn merge_small_chunks(chunks: Vec<Chunk>, options: &ChunkOptions) -> Vec<Chunk> {
    let ChunkOptions {
        max_tokens,
        min_tokens,
        ..
    } = *options;

    let mut merged = Vec::with_capacity(chunks.len());
    let mut it = chunks.into_iter().peekable();

    while let Some(mut current) = it.next() {
        while current.token_count < min_tokens {
            let Some(next) = it.peek() else { break };
            let combined = current.token_count + next.token_count;

            let fits = combined <= max_tokens;
            let slack_fits = combined * 10 <= max_tokens * 11
                && next.token_count < min_tokens / 2;
            let vetoed = next.has_major_heading
                && next.min_heading_level <= 2
                && current.token_count >= min_tokens / 2;

            if vetoed || !(fits || slack_fits) {
                break;
            }

            let Some(next) = it.next() else { break };
            current.text.push_str(&next.text);
            current.token_count = combined;
            current.absorb_metadata(&next);
        }
        merged.push(current);
    }

    merged
}

/// Pass 7: strict final merge and authoritative re-measurement.
///
/// Small chunks left behind by the split pass are merged forward first,
/// then backward into their predecessor, never exceeding `max_tokens`.
/// Merge decisions here run on measured counts: chunk texts end in a
/// newline and no vocabulary entry spans a newline into a following line,
/// so the sum of two measured counts bounds the measured count of the
/// concatenation. Afterwards every chunk's `token_count` is recomputed from
/// its final text; that value is what callers see.
pub fn final_merge(chunks: Vec<Chunk>, options: &ChunkOptions, tokenizer: &Tokenizer) -> Vec<Chunk> {
    let ChunkOptions {
        max_tokens,
        min_tokens,
        ..
    } = *options;

    let mut chunks = chunks;
    for chunk in &mut chunks {
        chunk.token_count = tokenizer.count(&chunk.text);
    }

    let mut merged: Vec<Chunk> = Vec::with_capacity(chunks.len());
    let mut it = chunks.into_iter().peekable();

    while let Some(mut current) = it.next() {
        while current.token_count < min_tokens {
            let fits = it
                .peek()
                .is_some_and(|next| current.token_count + next.token_count <= max_tokens);
            if !fits {
                break;
            }
            let Some(next) = it.next() else { break };
            current.text.push_str(&next.text);
            current.token_count += next.token_count;
            current.absorb_metadata(&next);
        }

        if current.token_count < min_tokens {
            if let Some(prev) = merged.last_mut() {
                if prev.token_count + current.token_count <= max_tokens {
                    prev.text.push_str(&current.text);
                    prev.token_count += current.token_count;
                    prev.absorb_metadata(&current);
                    continue;
                }
            }
        }

        merged.push(current);
    }

    for chunk in &mut merged {
        chunk.token_count = tokenizer.count(&chunk.text);
    }

    merged
}
