//! Pass 3: greedy packing of semantic units into initial chunks.

use crate::types::{Chunk, ChunkOptions, SemanticUnit};

/// Pack units into chunks of at most `max_tokens`, flushing whenever the
/// next unit would overflow a non-empty chunk.
///
/// A unit that is larger than `max_tokens` on its own still lands in a chunk
/// of its own here; the split pass deals with it later.
pub fn pack_units(units: Vec<SemanticUnit>, options: &ChunkOptions) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut current = Chunk::default();

    for unit in units {
        if !current.is_empty() && current.token_count + unit.total_tokens > options.max_tokens {
            chunks.push(std::mem::take(&mut current));
        }

        current.text.push_str(&unit.text());
        current.token_count += unit.total_tokens;

        if let (Some(&first), Some(&last)) = (unit.pages.iter().next(), unit.pages.iter().last()) {
            if current.start_page.is_none() {
                current.start_page = Some(first);
            }
            current.end_page = Some(last);
        }

        if unit.has_major_heading {
            current.has_major_heading = true;
            current.min_heading_level = current.min_heading_level.min(unit.max_heading_level);
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AnnotatedLine, LineType, NO_HEADING_LEVEL};

    fn unit(text: &str, tokens: usize, page: usize, heading_level: u32) -> SemanticUnit {
        let mut u = SemanticUnit::new();
        u.push_line(AnnotatedLine {
            text: text.to_string(),
            line_type: if heading_level > 0 {
                LineType::MajorHeading
            } else {
                LineType::Normal
            },
            token_count: tokens,
            page_number: page,
            heading_level,
        });
        u
    }

    fn options(max: usize) -> ChunkOptions {
        ChunkOptions {
            max_tokens: max,
            min_tokens: 1,
            ..ChunkOptions::default()
        }
    }

    #[test]
    fn units_accumulate_until_overflow() {
        let units = vec![
            unit("a", 200, 0, 0),
            unit("b", 200, 0, 0),
            unit("c", 200, 1, 0),
        ];
        let chunks = pack_units(units, &options(512));

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].token_count, 400);
        assert_eq!(chunks[0].text, "a\nb\n");
        assert_eq!(chunks[1].token_count, 200);
        assert_eq!(chunks[0].start_page, Some(0));
        assert_eq!(chunks[0].end_page, Some(0));
        assert_eq!(chunks[1].start_page, Some(1));
    }

    #[test]
    fn oversized_unit_gets_its_own_chunk() {
        let units = vec![unit("small", 100, 0, 0), unit("huge", 900, 0, 0)];
        let chunks = pack_units(units, &options(512));

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].token_count, 900);
    }

    #[test]
    fn heading_metadata_is_carried() {
        let units = vec![unit("# Title", 3, 0, 1), unit("body", 50, 0, 0)];
        let chunks = pack_units(units, &options(512));

        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].has_major_heading);
        assert_eq!(chunks[0].min_heading_level, 1);
    }

    #[test]
    fn no_heading_leaves_sentinel() {
        let chunks = pack_units(vec![unit("plain", 10, 2, 0)], &options(512));
        assert!(!chunks[0].has_major_heading);
        assert_eq!(chunks[0].min_heading_level, NO_HEADING_LEVEL);
    }

    #[test]
    fn empty_units_produce_no_chunks() {
        assert!(pack_units(Vec::new(), &options(512)).is_empty());
    }
}
