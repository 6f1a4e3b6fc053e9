//! Error types for the chunking pipeline.

use thiserror::Error;

/// Errors produced while configuring or running the chunking pipeline.
///
/// The pipeline itself has no recoverable failures: empty input yields empty
/// output and oversized atoms are preserved rather than rejected. The only
/// error surface is option validation at construction time.
#[derive(Error, Debug)]
pub enum ChunkError {
    /// Chunking options failed validation (e.g. `min_tokens > max_tokens`).
    #[error("invalid chunk options: {0}")]
    InvalidOptions(String),
}

/// Type alias for [`Result<T, ChunkError>`].
pub type Result<T> = std::result::Result<T, ChunkError>;
