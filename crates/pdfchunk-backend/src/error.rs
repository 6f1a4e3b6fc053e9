//! Error types for extraction and document-level chunking.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the extraction backend and document pipeline.
#[derive(Error, Debug)]
pub enum BackendError {
    /// Input path does not exist or is not readable.
    #[error("input not found: {0}")]
    InputNotFound(PathBuf),

    /// The PDF engine failed to open a document.
    #[error("failed to load PDF: {0}")]
    PdfLoad(String),

    /// The PDF engine failed while rendering a single page's text.
    #[error("failed to extract page {page}: {message}")]
    PageExtract { page: usize, message: String },

    /// Chunking options failed validation.
    #[error(transparent)]
    InvalidOptions(#[from] pdfchunk_core::ChunkError),

    /// Reading input or writing output failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serializing the chunk document failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Type alias for [`Result<T, BackendError>`].
pub type Result<T> = std::result::Result<T, BackendError>;
