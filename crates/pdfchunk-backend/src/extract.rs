//! Page text extraction over `pdfium-render`.
//!
//! The dispatcher only depends on the [`PageExtract`] capability, so tests
//! drive it with synthetic extractors and never touch the PDF engine.

use std::path::Path;
use std::sync::Mutex;

use pdfium_render::prelude::*;

use crate::error::{BackendError, Result};

/// What the extractor should pull out of each page.
///
/// The chunking pipeline only needs plain text, so everything defaults to
/// off; the fields mirror the knobs the underlying engine understands.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractOptions {
    pub extract_positions: bool,
    pub extract_fonts: bool,
    pub extract_colors: bool,
    pub structured_output: bool,
}

/// Capability needed by the dispatcher: page count plus per-page text.
///
/// Implementations must be callable from worker threads; each call opens
/// the document independently rather than sharing a handle across threads.
pub trait PageExtract: Send + Sync {
    /// Number of pages in the document at `path`.
    fn page_count(&self, path: &Path) -> Result<usize>;

    /// Plain text of page `index` (zero-based). Blocks are separated by a
    /// blank line and lines within a block by `\n`.
    fn extract_page(&self, path: &Path, index: usize, options: &ExtractOptions) -> Result<String>;
}

// PDFium is not reentrant: concurrent FFI calls from multiple threads crash
// inside the library even when each thread opened its own document. All
// pdfium access is funnelled through this lock; worker threads still overlap
// extraction with callback-side chunk accumulation.
static PDFIUM_FFI_LOCK: Mutex<()> = Mutex::new(());

/// Extractor backed by the `pdfium` library via `pdfium-render`.
///
/// Holds no document state of its own. Every call binds the library, opens
/// the document, does its work and drops the handle before returning, which
/// keeps the type trivially `Send + Sync` for the worker pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfiumExtractor;

impl PdfiumExtractor {
    pub fn new() -> Self {
        Self
    }

    fn bind() -> Result<Pdfium> {
        let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|e| BackendError::PdfLoad(format!("pdfium bindings unavailable: {e:?}")))?;
        Ok(Pdfium::new(bindings))
    }

    fn with_document<T>(path: &Path, f: impl FnOnce(&PdfDocument) -> Result<T>) -> Result<T> {
        let _ffi = PDFIUM_FFI_LOCK
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        let path_str = path
            .to_str()
            .ok_or_else(|| BackendError::PdfLoad(format!("non-UTF8 path: {}", path.display())))?;

        let pdfium = Self::bind()?;
        let document = pdfium
            .load_pdf_from_file(path_str, None)
            .map_err(|e| BackendError::PdfLoad(format!("{}: {e:?}", path.display())))?;
        f(&document)
    }
}

impl PageExtract for PdfiumExtractor {
    fn page_count(&self, path: &Path) -> Result<usize> {
        Self::with_document(path, |document| Ok(document.pages().len() as usize))
    }

    fn extract_page(&self, path: &Path, index: usize, _options: &ExtractOptions) -> Result<String> {
        Self::with_document(path, |document| {
            let page = document
                .pages()
                .get(index as u16)
                .map_err(|e| BackendError::PageExtract {
                    page: index,
                    message: format!("{e:?}"),
                })?;
            let text = page.text().map_err(|e| BackendError::PageExtract {
                page: index,
                message: format!("{e:?}"),
            })?;
            Ok(flatten_page_text(&text.all()))
        })
    }
}

/// Normalize engine line endings and collapse runs of blank lines into
/// block separators: blocks end up separated by one blank line, lines
/// within a block by a single `\n`.
pub fn flatten_page_text(raw: &str) -> String {
    let normalized = raw.replace("\r\n", "\n").replace('\r', "\n");

    let mut out = String::with_capacity(normalized.len());
    let mut pending_break = false;
    for line in normalized.lines() {
        if line.trim().is_empty() {
            pending_break = !out.is_empty();
            continue;
        }
        if pending_break {
            out.push_str("\n\n");
            pending_break = false;
        } else if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(line);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flatten_normalizes_carriage_returns() {
        assert_eq!(flatten_page_text("a\r\nb\rc"), "a\nb\nc");
    }

    #[test]
    fn flatten_collapses_blank_runs_into_block_breaks() {
        assert_eq!(flatten_page_text("a\n\n\n\nb"), "a\n\nb");
        assert_eq!(flatten_page_text("a\n   \nb"), "a\n\nb");
    }

    #[test]
    fn flatten_drops_leading_and_trailing_blanks() {
        assert_eq!(flatten_page_text("\n\na\nb\n\n"), "a\nb");
    }

    #[test]
    fn flatten_empty_page_is_empty() {
        assert_eq!(flatten_page_text(""), "");
        assert_eq!(flatten_page_text("\n \n"), "");
    }
}
