//! Data model for the chunking pipeline.
//!
//! Each pass of the pipeline consumes the previous pass's output and produces
//! a new sequence; none of these types are shared across stages after being
//! moved in.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{ChunkError, Result};

/// Sentinel heading level meaning "no heading present".
///
/// Lower values are more important (`1` = top-level heading). This value is
/// carried through to the output schema, so it must stay stable.
pub const NO_HEADING_LEVEL: u32 = 999;

/// Plain text of one source page plus its zero-based page number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    pub text: String,
    pub page_number: usize,
}

impl PageText {
    pub fn new(text: impl Into<String>, page_number: usize) -> Self {
        Self {
            text: text.into(),
            page_number,
        }
    }
}

/// Classification assigned to each line during annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineType {
    Normal,
    /// `#` / `##` markdown headings, numbered headings and all-caps headings.
    MajorHeading,
    /// `###` and deeper markdown headings.
    MinorHeading,
    ListItem,
    Blank,
    CodeBlock,
}

/// A single line with its classification, token count and source page.
///
/// Token counts are computed once here and reused by every later pass; lines
/// are never re-measured against the vocabulary.
#[derive(Debug, Clone)]
pub struct AnnotatedLine {
    pub text: String,
    pub line_type: LineType,
    pub token_count: usize,
    pub page_number: usize,
    /// 0 for non-headings; 1-2 for major headings, 3+ for minor ones.
    pub heading_level: u32,
}

/// A group of consecutive lines that belong together, delimited by headings.
#[derive(Debug, Clone, Default)]
pub struct SemanticUnit {
    pub lines: Vec<AnnotatedLine>,
    pub total_tokens: usize,
    pub pages: BTreeSet<usize>,
    pub has_major_heading: bool,
    /// Most important (lowest) major-heading level seen, or the sentinel.
    pub max_heading_level: u32,
}

impl SemanticUnit {
    pub fn new() -> Self {
        Self {
            max_heading_level: NO_HEADING_LEVEL,
            ..Self::default()
        }
    }

    pub fn push_line(&mut self, line: AnnotatedLine) {
        self.total_tokens += line.token_count;
        self.pages.insert(line.page_number);
        if line.line_type == LineType::MajorHeading {
            self.has_major_heading = true;
            self.max_heading_level = self.max_heading_level.min(line.heading_level);
        }
        self.lines.push(line);
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Unit text with one trailing newline per line.
    pub fn text(&self) -> String {
        let capacity: usize = self.lines.iter().map(|l| l.text.len() + 1).sum();
        let mut out = String::with_capacity(capacity);
        for line in &self.lines {
            out.push_str(&line.text);
            out.push('\n');
        }
        out
    }
}

/// One output chunk as it moves through passes 3-7.
///
/// `token_count` is maintained incrementally by the packing and merge passes
/// and recomputed once against the tokenizer at the end of pass 7, which is
/// the authoritative value.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub text: String,
    pub token_count: usize,
    pub start_page: Option<usize>,
    pub end_page: Option<usize>,
    pub has_major_heading: bool,
    pub min_heading_level: u32,
    pub overlap_text: Option<String>,
    pub overlap_tokens: usize,
}

impl Default for Chunk {
    fn default() -> Self {
        Self {
            text: String::new(),
            token_count: 0,
            start_page: None,
            end_page: None,
            has_major_heading: false,
            min_heading_level: NO_HEADING_LEVEL,
            overlap_text: None,
            overlap_tokens: 0,
        }
    }
}

impl Chunk {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Fold another chunk's metadata into this one after appending its text.
    pub fn absorb_metadata(&mut self, other: &Chunk) {
        if let Some(end) = other.end_page {
            self.end_page = Some(end);
        }
        if self.start_page.is_none() {
            self.start_page = other.start_page;
        }
        if other.has_major_heading {
            self.has_major_heading = true;
            self.min_heading_level = self.min_heading_level.min(other.min_heading_level);
        }
    }
}

/// Tuning knobs for the chunking pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkOptions {
    /// Hard upper bound on chunk size in tokens.
    pub max_tokens: usize,
    /// Preferred lower bound; the tail chunk of a document may fall below it.
    pub min_tokens: usize,
    /// Tokens of context copied from the previous chunk; 0 disables overlap.
    pub overlap_tokens: usize,
    /// Worker threads for page extraction; 0 selects hardware parallelism.
    pub thread_count: usize,
}

impl Default for ChunkOptions {
    fn default() -> Self {
        Self {
            max_tokens: 512,
            min_tokens: 150,
            overlap_tokens: 0,
            thread_count: 0,
        }
    }
}

impl ChunkOptions {
    /// Check the option invariants: `0 < min_tokens <= max_tokens` and
    /// `overlap_tokens < max_tokens`.
    pub fn validate(&self) -> Result<()> {
        if self.max_tokens == 0 {
            return Err(ChunkError::InvalidOptions(
                "max_tokens must be positive".into(),
            ));
        }
        if self.min_tokens == 0 {
            return Err(ChunkError::InvalidOptions(
                "min_tokens must be positive".into(),
            ));
        }
        if self.min_tokens > self.max_tokens {
            return Err(ChunkError::InvalidOptions(format!(
                "min_tokens ({}) exceeds max_tokens ({})",
                self.min_tokens, self.max_tokens
            )));
        }
        if self.overlap_tokens >= self.max_tokens {
            return Err(ChunkError::InvalidOptions(format!(
                "overlap_tokens ({}) must be below max_tokens ({})",
                self.overlap_tokens, self.max_tokens
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_are_valid() {
        assert!(ChunkOptions::default().validate().is_ok());
    }

    #[test]
    fn min_above_max_is_rejected() {
        let opts = ChunkOptions {
            max_tokens: 100,
            min_tokens: 200,
            ..ChunkOptions::default()
        };
        assert!(matches!(
            opts.validate(),
            Err(ChunkError::InvalidOptions(_))
        ));
    }

    #[test]
    fn overlap_at_max_is_rejected() {
        let opts = ChunkOptions {
            overlap_tokens: 512,
            ..ChunkOptions::default()
        };
        assert!(opts.validate().is_err());
    }

    #[test]
    fn zero_bounds_are_rejected() {
        let opts = ChunkOptions {
            max_tokens: 0,
            min_tokens: 0,
            ..ChunkOptions::default()
        };
        assert!(opts.validate().is_err());
    }

    #[test]
    fn unit_tracks_major_heading_metadata() {
        let mut unit = SemanticUnit::new();
        unit.push_line(AnnotatedLine {
            text: "## Results".into(),
            line_type: LineType::MajorHeading,
            token_count: 3,
            page_number: 4,
            heading_level: 2,
        });
        unit.push_line(AnnotatedLine {
            text: "Body text".into(),
            line_type: LineType::Normal,
            token_count: 2,
            page_number: 4,
            heading_level: 0,
        });

        assert!(unit.has_major_heading);
        assert_eq!(unit.max_heading_level, 2);
        assert_eq!(unit.total_tokens, 5);
        assert_eq!(unit.text(), "## Results\nBody text\n");
        assert!(unit.pages.contains(&4));
    }
}
