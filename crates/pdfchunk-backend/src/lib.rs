//! # pdfchunk-backend
//!
//! PDF-facing half of the chunker: a pdfium-backed page extractor, a
//! worker-pool dispatcher that streams page text in order, and the
//! document-level [`HierarchicalChunker`] API that feeds extracted pages
//! through the `pdfchunk-core` pipeline and serializes the result as
//! docling-compatible JSON.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use pdfchunk_backend::HierarchicalChunker;
//! use pdfchunk_core::ChunkOptions;
//!
//! let chunker = HierarchicalChunker::new(ChunkOptions::default())?;
//! let result = chunker.chunk_file("report.pdf".as_ref(), None);
//!
//! for chunk in &result.chunks {
//!     println!("pages {}-{}: {} tokens", chunk.start_page, chunk.end_page, chunk.token_count);
//! }
//! # Ok::<(), pdfchunk_backend::BackendError>(())
//! ```
//!
//! The dispatcher is generic over the [`PageExtract`] capability, so tests
//! swap in synthetic extractors and never need the pdfium library.

pub mod chunker;
pub mod dispatcher;
pub mod error;
pub mod extract;
pub mod pool;
pub mod serializer;

pub use chunker::{ChunkRecord, ChunkingResult, HierarchicalChunker, ProgressCallback};
pub use dispatcher::{Dispatcher, DispatcherStats, PageResult, ParseOptions};
pub use error::{BackendError, Result};
pub use extract::{ExtractOptions, PageExtract, PdfiumExtractor};
pub use pool::ThreadPool;
