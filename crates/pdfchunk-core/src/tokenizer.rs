//! Greedy longest-match token counter over an embedded BPE vocabulary.
//!
//! This is an approximation, not a reference BPE implementation: real BPE
//! chooses between competing tokenizations by learned merge priority, while
//! this scanner always takes the longest vocabulary entry at the cursor.
//! Token counts typically land within a few percent of reference tooling,
//! which is sufficient for chunk sizing but not for exact interchange of
//! token ids. `decode(encode(x))` is therefore not guaranteed to reproduce
//! `x` byte-for-byte in every case.
//!
//! The vocabulary is compiled into the binary and parsed once per process
//! under a [`OnceLock`]; a malformed table is a build artifact defect and
//! aborts at first use.

use std::collections::HashMap;
use std::sync::OnceLock;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Embedded vocabulary table: one `<base64-token> <decimal-id>` pair per line.
const VOCAB_DATA: &str = include_str!("../assets/bpe_vocab.tiktoken");

/// Longest candidate considered by the encode scan. Nearly all vocabulary
/// entries are shorter; raising this preserves determinism but widens the
/// inner loop.
const MAX_CANDIDATE_LEN: usize = 20;

/// Front-trim step, in bytes, used by callers shrinking a span to a token
/// budget (see the overlap pass).
pub const TRIM_STEP_BYTES: usize = 10;

struct Vocabulary {
    encoder: HashMap<Vec<u8>, u32>,
    decoder: HashMap<u32, Vec<u8>>,
}

static VOCABULARY: OnceLock<Vocabulary> = OnceLock::new();

fn vocabulary() -> &'static Vocabulary {
    VOCABULARY.get_or_init(|| {
        let mut encoder = HashMap::new();
        let mut decoder = HashMap::new();

        for (line_no, line) in VOCAB_DATA.lines().enumerate() {
            if line.is_empty() {
                continue;
            }
            let (token_b64, id) = line
                .split_once(' ')
                .unwrap_or_else(|| panic!("vocabulary line {} has no separator", line_no + 1));
            let bytes = STANDARD
                .decode(token_b64)
                .unwrap_or_else(|e| panic!("vocabulary line {}: bad base64: {e}", line_no + 1));
            let id: u32 = id
                .parse()
                .unwrap_or_else(|e| panic!("vocabulary line {}: bad id: {e}", line_no + 1));

            if decoder.insert(id, bytes.clone()).is_some() {
                panic!("vocabulary line {}: duplicate id {id}", line_no + 1);
            }
            encoder.insert(bytes, id);
        }

        log::debug!("loaded BPE vocabulary: {} entries", encoder.len());
        Vocabulary { encoder, decoder }
    })
}

/// Handle for token counting and encoding.
///
/// Zero-sized; all state lives in the process-wide vocabulary, which is
/// immutable after its one-time load, so values of this type are freely
/// shared across threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct Tokenizer;

impl Tokenizer {
    /// Create a tokenizer, forcing the vocabulary load if it has not
    /// happened yet.
    pub fn new() -> Self {
        let _ = vocabulary();
        Self
    }

    /// Encode text into token ids.
    ///
    /// At each byte position the longest matching vocabulary entry (up to
    /// [`MAX_CANDIDATE_LEN`] bytes) wins; a byte with no match at all is
    /// emitted as its own id in `0..=255`, so the scan always advances and
    /// encoding never fails.
    pub fn encode(&self, text: &str) -> Vec<u32> {
        let vocab = vocabulary();
        let bytes = text.as_bytes();
        let mut ids = Vec::with_capacity(bytes.len() / 3 + 1);
        let mut pos = 0;

        while pos < bytes.len() {
            let max_len = MAX_CANDIDATE_LEN.min(bytes.len() - pos);
            let mut matched = 0;

            for len in (1..=max_len).rev() {
                if let Some(&id) = vocab.encoder.get(&bytes[pos..pos + len]) {
                    ids.push(id);
                    matched = len;
                    break;
                }
            }

            if matched > 0 {
                pos += matched;
            } else {
                ids.push(u32::from(bytes[pos]));
                pos += 1;
            }
        }

        ids
    }

    /// Decode token ids back to bytes.
    ///
    /// Ids absent from the vocabulary but within `0..=255` decode as raw
    /// bytes; anything else is skipped.
    pub fn decode(&self, ids: &[u32]) -> Vec<u8> {
        let vocab = vocabulary();
        let mut out = Vec::new();
        for &id in ids {
            if let Some(bytes) = vocab.decoder.get(&id) {
                out.extend_from_slice(bytes);
            } else if id < 256 {
                out.push(id as u8);
            }
        }
        out
    }

    /// Number of tokens in `text`. This is the size metric every pipeline
    /// decision uses.
    pub fn count(&self, text: &str) -> usize {
        self.encode(text).len()
    }

    /// O(1) upper-bound estimate (~4 bytes per token) for callers that do
    /// not need a real scan.
    pub fn estimate(text: &str) -> usize {
        (text.len() + 3) / 4
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_counts_zero() {
        let tok = Tokenizer::new();
        assert_eq!(tok.count(""), 0);
        assert!(tok.encode("").is_empty());
    }

    #[test]
    fn common_prose_compresses_below_byte_count() {
        let tok = Tokenizer::new();
        let text = "the quick brown fox jumps over the lazy dog";
        let count = tok.count(text);
        assert!(count > 0);
        assert!(count < text.len(), "expected multi-byte tokens, got {count}");
    }

    #[test]
    fn encode_is_deterministic() {
        let tok = Tokenizer::new();
        let text = "Hierarchical chunking of PDF documents, page 12.";
        assert_eq!(tok.encode(text), tok.encode(text));
    }

    #[test]
    fn byte_fallback_covers_arbitrary_input() {
        let tok = Tokenizer::new();
        // Multi-byte codepoints unlikely to be in the vocabulary still
        // encode; every input byte must advance the cursor.
        let text = "\u{1F980}\u{00DF}\u{4E2D}";
        let ids = tok.encode(text);
        assert!(!ids.is_empty());
        assert_eq!(tok.decode(&ids), text.as_bytes());
    }

    #[test]
    fn decode_roundtrips_ascii() {
        let tok = Tokenizer::new();
        let text = "Section 2: results and discussion.\n";
        let decoded = tok.decode(&tok.encode(text));
        assert_eq!(decoded, text.as_bytes());
    }

    #[test]
    fn concatenation_is_nearly_subadditive() {
        let tok = Tokenizer::new();
        let a = "The first part of the sentence ";
        let b = "and the second part of it.";
        let combined = format!("{a}{b}");
        assert!(tok.count(&combined) <= tok.count(a) + tok.count(b) + 1);
    }

    #[test]
    fn estimate_tracks_length() {
        assert_eq!(Tokenizer::estimate(""), 0);
        assert_eq!(Tokenizer::estimate("abcd"), 1);
        assert_eq!(Tokenizer::estimate("abcde"), 2);
    }
}
