//! Shared synthetic extractor for backend integration tests.
#![allow(dead_code)] // not every test binary uses every helper

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pdfchunk_backend::{BackendError, ExtractOptions, PageExtract};

/// In-memory extractor with configurable failures and per-page delays.
///
/// Delays are staggered so that later pages finish before earlier ones,
/// which exercises the dispatcher's ordered delivery. Every extraction call
/// is recorded so tests can assert how much work was actually scheduled.
pub struct FakeExtractor {
    pages: Vec<String>,
    fail_pages: HashSet<usize>,
    stagger: bool,
    pub extraction_log: Arc<Mutex<Vec<usize>>>,
}

impl FakeExtractor {
    pub fn with_pages(pages: Vec<String>) -> Self {
        Self {
            pages,
            fail_pages: HashSet::new(),
            stagger: false,
            extraction_log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn numbered(count: usize) -> Self {
        Self::with_pages(
            (0..count)
                .map(|i| format!("Content of page {i} with some words in it."))
                .collect(),
        )
    }

    pub fn failing_on(mut self, pages: impl IntoIterator<Item = usize>) -> Self {
        self.fail_pages = pages.into_iter().collect();
        self
    }

    pub fn staggered(mut self) -> Self {
        self.stagger = true;
        self
    }

    pub fn extractions(&self) -> Vec<usize> {
        self.extraction_log.lock().unwrap().clone()
    }
}

impl PageExtract for FakeExtractor {
    fn page_count(&self, _path: &Path) -> Result<usize, BackendError> {
        Ok(self.pages.len())
    }

    fn extract_page(
        &self,
        _path: &Path,
        index: usize,
        _options: &ExtractOptions,
    ) -> Result<String, BackendError> {
        self.extraction_log.lock().unwrap().push(index);

        if self.stagger {
            // Later pages in a batch finish first.
            let delay = (9 - index % 10) as u64 * 3;
            std::thread::sleep(Duration::from_millis(delay));
        }

        if self.fail_pages.contains(&index) {
            return Err(BackendError::PageExtract {
                page: index,
                message: "synthetic failure".to_string(),
            });
        }

        self.pages
            .get(index)
            .cloned()
            .ok_or(BackendError::PageExtract {
                page: index,
                message: "page out of range".to_string(),
            })
    }
}

/// A real file on disk to satisfy the dispatcher's existence check.
pub fn placeholder_input() -> tempfile::NamedTempFile {
    tempfile::NamedTempFile::new().expect("create temp input")
}
