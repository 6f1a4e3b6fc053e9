//! Pass 6: split chunks that still exceed the token budget.

use crate::pipeline::annotate::classify_line;
use crate::pipeline::overlap::OVERLAP_MARKER;
use crate::tokenizer::Tokenizer;
use crate::types::{Chunk, ChunkOptions, LineType};

/// Split every oversized chunk at line granularity.
///
/// Oversize is judged against the measured count of the chunk's body text;
/// an overlap prefix added by pass 4 does not count against the budget.
/// Lines are packed into sub-chunks; a flush happens when adding the next
/// line would overflow `max_tokens`, or early at a natural boundary (blank
/// line or heading) once the accumulator has reached 80% of the budget.
/// A single line that on its own exceeds the budget becomes a sub-chunk of
/// exactly that line.
///
/// Sub-chunks inherit the page range of the chunk they came from; per-line
/// page attribution is not tracked through the split, so the range is an
/// upper bound when the source chunk spanned multiple pages.
pub fn split_oversized(chunks: Vec<Chunk>, options: &ChunkOptions, tokenizer: &Tokenizer) -> Vec<Chunk> {
    let max_tokens = options.max_tokens;
    let mut result = Vec::with_capacity(chunks.len());

    for mut chunk in chunks {
        let measured = tokenizer.count(&chunk.text);
        if effective_size(&chunk, measured, tokenizer) <= max_tokens {
            chunk.token_count = measured;
            result.push(chunk);
            continue;
        }

        log::debug!(
            "splitting oversized chunk: {measured} tokens (pages {:?}-{:?})",
            chunk.start_page,
            chunk.end_page
        );

        let fresh = |text_capacity: usize| Chunk {
            text: String::with_capacity(text_capacity),
            start_page: chunk.start_page,
            end_page: chunk.end_page,
            ..Chunk::default()
        };

        let mut acc = fresh(max_tokens * 4);

        for line in chunk.text.lines() {
            // The rejoined text carries one newline per line, and no
            // vocabulary entry spans a newline into the following line, so
            // count(line) + 1 bounds each line's share of the final measured
            // size from above.
            let line_cost = tokenizer.count(line) + 1;
            let (line_type, heading_level) = classify_line(line);

            let overflow = !acc.is_empty() && acc.token_count + line_cost > max_tokens;
            let near_full = acc.token_count * 10 >= max_tokens * 8;
            let natural_boundary = matches!(
                line_type,
                LineType::Blank | LineType::MajorHeading | LineType::MinorHeading
            );

            if !acc.is_empty() && (overflow || (near_full && natural_boundary)) {
                result.push(std::mem::replace(&mut acc, fresh(max_tokens * 4)));
            }

            if line_type == LineType::MajorHeading {
                acc.has_major_heading = true;
                acc.min_heading_level = acc.min_heading_level.min(heading_level);
            }
            acc.text.push_str(line);
            acc.text.push('\n');
            acc.token_count += line_cost;
        }

        if !acc.is_empty() {
            result.push(acc);
        }
    }

    result
}

/// Measured size with the pass-4 overlap prefix discounted, so overlap never
/// triggers a split of an otherwise well-sized chunk.
fn effective_size(chunk: &Chunk, measured: usize, tokenizer: &Tokenizer) -> usize {
    if chunk.overlap_text.is_some() {
        let marker_cost = tokenizer.count(OVERLAP_MARKER) + tokenizer.count("\n\n");
        measured.saturating_sub(chunk.overlap_tokens + marker_cost)
    } else {
        measured
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(max: usize) -> ChunkOptions {
        ChunkOptions {
            max_tokens: max,
            min_tokens: 1,
            ..ChunkOptions::default()
        }
    }

    fn measured_chunk(text: &str, tokenizer: &Tokenizer) -> Chunk {
        Chunk {
            text: text.to_string(),
            token_count: tokenizer.count(text),
            start_page: Some(2),
            end_page: Some(5),
            ..Chunk::default()
        }
    }

    #[test]
    fn chunks_within_budget_pass_through() {
        let tokenizer = Tokenizer::new();
        let chunk = measured_chunk("short text\n", &tokenizer);
        let out = split_oversized(vec![chunk.clone()], &options(512), &tokenizer);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].text, chunk.text);
    }

    #[test]
    fn oversized_chunk_is_split_below_budget() {
        let tokenizer = Tokenizer::new();
        let line = "a paragraph of running text that keeps going for a while";
        let text = format!("{line}\n").repeat(40);
        let chunk = measured_chunk(&text, &tokenizer);
        assert!(chunk.token_count > 100);

        let out = split_oversized(vec![chunk], &options(100), &tokenizer);

        assert!(out.len() >= 2);
        for sub in &out {
            assert!(
                tokenizer.count(&sub.text) <= 100,
                "sub-chunk measures over budget"
            );
        }
    }

    #[test]
    fn sub_chunks_inherit_outer_page_range() {
        let tokenizer = Tokenizer::new();
        let text = "line of text here\n".repeat(60);
        let chunk = measured_chunk(&text, &tokenizer);
        let out = split_oversized(vec![chunk], &options(50), &tokenizer);

        assert!(out.len() >= 2);
        for sub in &out {
            assert_eq!(sub.start_page, Some(2));
            assert_eq!(sub.end_page, Some(5));
        }
    }

    #[test]
    fn giant_single_line_stays_intact() {
        let tokenizer = Tokenizer::new();
        let giant = "entirely unbroken stream of words ".repeat(50);
        let text = format!("before\n{giant}\nafter\n");
        let chunk = measured_chunk(&text, &tokenizer);
        let out = split_oversized(vec![chunk], &options(20), &tokenizer);

        // The giant line is preserved as an atom in its own sub-chunk.
        let holder = out
            .iter()
            .find(|c| c.text.contains("unbroken"))
            .expect("giant line must survive");
        assert_eq!(holder.text.lines().count(), 1);
    }

    #[test]
    fn overlap_prefix_does_not_force_a_split() {
        let tokenizer = Tokenizer::new();
        let body = "plain body sentence with a few words\n".repeat(8);
        let overlap = "carried over context from before";
        let text = format!("[...] {overlap}\n\n{body}");
        let mut chunk = measured_chunk(&text, &tokenizer);
        chunk.overlap_text = Some(overlap.to_string());
        chunk.overlap_tokens = tokenizer.count(overlap);

        // Budget sized so the body fits but body + overlap would not.
        let body_tokens = tokenizer.count(&body);
        let out = split_oversized(vec![chunk], &options(body_tokens + 4), &tokenizer);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn heading_metadata_is_recomputed_per_sub_chunk() {
        let tokenizer = Tokenizer::new();
        let body = "filler sentence with several words in it\n".repeat(20);
        let text = format!("# Opening\n{body}\n## Later Section\n{body}");
        let chunk = measured_chunk(&text, &tokenizer);
        let out = split_oversized(vec![chunk], &options(60), &tokenizer);

        let first = out.iter().find(|c| c.text.contains("# Opening")).unwrap();
        assert!(first.has_major_heading);
        assert_eq!(first.min_heading_level, 1);

        let plain: Vec<_> = out
            .iter()
            .filter(|c| !c.text.contains("# Opening") && !c.text.contains("## Later Section"))
            .collect();
        assert!(plain.iter().all(|c| !c.has_major_heading));
    }
}
