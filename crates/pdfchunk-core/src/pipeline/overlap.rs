//! Pass 4: prepend a marked tail of the previous chunk to each chunk.

use crate::tokenizer::{Tokenizer, TRIM_STEP_BYTES};
use crate::types::Chunk;

/// Marker placed ahead of carried-over context so downstream consumers can
/// tell it apart from body text.
pub(crate) const OVERLAP_MARKER: &str = "[...] ";

/// For every chunk after the first, copy roughly `overlap_tokens` worth of
/// the previous chunk's tail (one token ~ four bytes), snap the cut to a
/// space so no word is severed, then trim from the front in small steps
/// until the measured token count fits the budget.
///
/// The prefix changes neither the chunk's page range nor its running
/// `token_count`; the final re-measurement in pass 7 is what folds the
/// overlap into the reported count.
pub fn add_overlap(chunks: &mut [Chunk], overlap_tokens: usize, tokenizer: &Tokenizer) {
    if overlap_tokens == 0 || chunks.len() < 2 {
        return;
    }

    // Suffixes come from the unprefixed texts, so overlap never cascades
    // from one chunk into the next.
    let suffixes: Vec<Option<String>> = chunks
        .iter()
        .map(|prev| tail_within_budget(&prev.text, overlap_tokens, tokenizer))
        .collect();

    for (chunk, suffix) in chunks.iter_mut().skip(1).zip(suffixes) {
        let Some(suffix) = suffix else { continue };

        let mut text = String::with_capacity(OVERLAP_MARKER.len() + suffix.len() + 2 + chunk.text.len());
        text.push_str(OVERLAP_MARKER);
        text.push_str(&suffix);
        text.push_str("\n\n");
        text.push_str(&chunk.text);

        chunk.overlap_tokens = tokenizer.count(&suffix);
        chunk.overlap_text = Some(suffix);
        chunk.text = text;
    }
}

/// Select a word-aligned tail of `text` whose token count is at most
/// `budget`. Returns `None` when the text is too short to take a proper
/// suffix from.
fn tail_within_budget(text: &str, budget: usize, tokenizer: &Tokenizer) -> Option<String> {
    let want_bytes = budget.saturating_mul(4);
    if want_bytes == 0 || want_bytes >= text.len() {
        return None;
    }

    // Walk left to the nearest space so the suffix starts on a word.
    let bytes = text.as_bytes();
    let mut start = text.len() - want_bytes;
    while start > 0 && bytes[start] != b' ' {
        start -= 1;
    }
    if start == 0 {
        return None;
    }

    let mut suffix = text[start..].trim_start_matches(' ');
    while tokenizer.count(suffix) > budget && suffix.len() > TRIM_STEP_BYTES {
        let mut cut = TRIM_STEP_BYTES;
        while cut < suffix.len() && !suffix.is_char_boundary(cut) {
            cut += 1;
        }
        suffix = &suffix[cut..];
    }

    Some(suffix.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(text: &str, tokens: usize) -> Chunk {
        Chunk {
            text: text.to_string(),
            token_count: tokens,
            start_page: Some(0),
            end_page: Some(0),
            ..Chunk::default()
        }
    }

    #[test]
    fn first_chunk_is_untouched() {
        let tokenizer = Tokenizer::new();
        let long = "word ".repeat(100);
        let mut chunks = vec![chunk(&long, 100), chunk("second chunk body", 4)];
        add_overlap(&mut chunks, 10, &tokenizer);

        assert!(!chunks[0].text.starts_with("[...]"));
        assert!(chunks[0].overlap_text.is_none());
    }

    #[test]
    fn later_chunks_get_marked_prefix() {
        let tokenizer = Tokenizer::new();
        let long = "alpha beta gamma delta ".repeat(20);
        let mut chunks = vec![chunk(&long, 80), chunk("second chunk body", 4)];
        add_overlap(&mut chunks, 10, &tokenizer);

        assert!(chunks[1].text.starts_with("[...] "));
        assert!(chunks[1].text.ends_with("second chunk body"));
        let overlap = chunks[1].overlap_text.as_deref().unwrap();
        assert!(chunks[1].overlap_tokens <= 10 + 1);
        assert!(long.trim_end().ends_with(overlap.trim_end()));
    }

    #[test]
    fn overlap_respects_token_budget() {
        let tokenizer = Tokenizer::new();
        let long = "substantial amounts of running text here ".repeat(30);
        let mut chunks = vec![chunk(&long, 200), chunk("tail", 1)];
        add_overlap(&mut chunks, 25, &tokenizer);

        assert!(chunks[1].overlap_tokens <= 25);
    }

    #[test]
    fn zero_overlap_is_a_no_op() {
        let tokenizer = Tokenizer::new();
        let mut chunks = vec![chunk("one two three", 3), chunk("four five", 2)];
        add_overlap(&mut chunks, 0, &tokenizer);
        assert_eq!(chunks[1].text, "four five");
    }

    #[test]
    fn short_previous_text_is_skipped() {
        let tokenizer = Tokenizer::new();
        // Previous text shorter than the requested overlap window.
        let mut chunks = vec![chunk("tiny", 1), chunk("next", 1)];
        add_overlap(&mut chunks, 50, &tokenizer);
        assert_eq!(chunks[1].text, "next");
        assert!(chunks[1].overlap_text.is_none());
    }

    #[test]
    fn suffix_starts_on_a_word() {
        let tokenizer = Tokenizer::new();
        let suffix = tail_within_budget(&"lorem ipsum dolor sit amet ".repeat(10), 5, &tokenizer);
        let suffix = suffix.unwrap();
        assert!(!suffix.starts_with(' '));
        // The cut landed after a space, so the first fragment is a whole word.
        assert!(["lorem", "ipsum", "dolor", "sit", "amet"]
            .contains(&suffix.split_whitespace().next().unwrap()));
    }
}
