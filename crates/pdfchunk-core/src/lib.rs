//! # pdfchunk-core
//!
//! Token-bounded hierarchical chunking of page-oriented text, plus the BPE
//! token counter every sizing decision depends on. This crate is pure value
//! transformation: no I/O and no PDF engine, which keeps the pipeline
//! trivially testable with synthetic pages.
//!
//! ## Quick start
//!
//! ```rust
//! use pdfchunk_core::{chunk_pages, ChunkOptions, PageText, Tokenizer};
//!
//! let pages = vec![PageText::new("# Title\n\nHello world.", 0)];
//! let options = ChunkOptions::default();
//! let chunks = chunk_pages(pages, &options, &Tokenizer::new());
//!
//! assert_eq!(chunks.len(), 1);
//! assert!(chunks[0].has_major_heading);
//! ```

pub mod error;
pub mod pipeline;
pub mod tokenizer;
pub mod types;

pub use error::{ChunkError, Result};
pub use pipeline::chunk_pages;
pub use tokenizer::Tokenizer;
pub use types::{
    AnnotatedLine, Chunk, ChunkOptions, LineType, PageText, SemanticUnit, NO_HEADING_LEVEL,
};
