//! Ordered streaming of page-extraction results over the worker pool.
//!
//! Pages are submitted in fixed-size batches; within a batch every page is
//! extracted in parallel, but results are collected and delivered to the
//! callback strictly in page order. A batch must fully drain before the
//! next one is submitted, which bounds in-flight work to `batch_size` pages
//! regardless of pool size.

use std::path::Path;
use std::sync::mpsc;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use serde::Serialize;

use crate::error::{BackendError, Result};
use crate::extract::{ExtractOptions, PageExtract};
use crate::pool::ThreadPool;

/// Scheduling configuration for the dispatcher.
#[derive(Debug, Clone, Copy)]
pub struct ParseOptions {
    /// Worker threads; 0 selects `num_cpus::get()`.
    pub thread_count: usize,
    /// Pages submitted per batch.
    pub batch_size: usize,
    pub extract: ExtractOptions,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            thread_count: 0,
            batch_size: 10,
            extract: ExtractOptions::default(),
        }
    }
}

/// Outcome of one page-extraction task.
#[derive(Debug, Clone)]
pub struct PageResult {
    pub page_number: usize,
    pub text: Option<String>,
    pub error: Option<String>,
    pub success: bool,
}

/// Return `true` to keep receiving pages, `false` to stop after the current
/// batch drains.
pub type PageCallback<'a> = &'a mut dyn FnMut(PageResult) -> bool;

#[derive(Debug, Default, Clone, Copy)]
struct StatsInner {
    documents_processed: u64,
    pages_processed: u64,
    total_processing_ms: u64,
}

/// Snapshot of dispatcher counters, with derived rates when meaningful.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct DispatcherStats {
    pub documents_processed: u64,
    pub pages_processed: u64,
    pub total_processing_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_processing_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages_per_second: Option<f64>,
}

/// Schedules per-page extraction tasks and funnels ordered results to a
/// callback. The pool is reused across documents for the dispatcher's
/// lifetime.
pub struct Dispatcher<E: PageExtract> {
    options: ParseOptions,
    pool: ThreadPool,
    extractor: Arc<E>,
    stats: Mutex<StatsInner>,
}

impl<E: PageExtract + 'static> Dispatcher<E> {
    pub fn new(extractor: E, options: ParseOptions) -> Self {
        let threads = if options.thread_count == 0 {
            num_cpus::get()
        } else {
            options.thread_count
        };
        Self {
            options,
            pool: ThreadPool::new(threads.max(1)),
            extractor: Arc::new(extractor),
            stats: Mutex::new(StatsInner::default()),
        }
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    pub fn extractor(&self) -> &Arc<E> {
        &self.extractor
    }

    pub(crate) fn pool(&self) -> &ThreadPool {
        &self.pool
    }

    /// Stream every page of `path` through `callback` in page order.
    ///
    /// Returns the number of results delivered. When the callback returns
    /// `false`, no further batches are submitted; tasks already in flight
    /// still complete and their results are still delivered, so a stopping
    /// callback sees at most `batch_size - 1` extra invocations.
    pub fn parse_streaming(
        &self,
        path: &Path,
        callback: &mut dyn FnMut(PageResult) -> bool,
    ) -> Result<usize> {
        if !path.exists() {
            return Err(BackendError::InputNotFound(path.to_path_buf()));
        }

        let started = Instant::now();
        let page_count = self.extractor.page_count(path)?;
        log::debug!("dispatching {} pages from {}", page_count, path.display());

        let mut delivered = 0usize;
        let mut keep_going = true;

        let mut batch_start = 0;
        while batch_start < page_count && keep_going {
            let batch_end = (batch_start + self.options.batch_size).min(page_count);

            let mut pending = Vec::with_capacity(batch_end - batch_start);
            for page in batch_start..batch_end {
                let (tx, rx) = mpsc::sync_channel(1);
                let extractor = Arc::clone(&self.extractor);
                let path = path.to_path_buf();
                let extract_options = self.options.extract;

                self.pool.execute(move || {
                    let result = match extractor.extract_page(&path, page, &extract_options) {
                        Ok(text) => PageResult {
                            page_number: page,
                            text: Some(text),
                            error: None,
                            success: true,
                        },
                        Err(e) => PageResult {
                            page_number: page,
                            text: None,
                            error: Some(e.to_string()),
                            success: false,
                        },
                    };
                    let _ = tx.send(result);
                });
                pending.push((page, rx));
            }

            // Await each task in page order; this is what makes callback
            // delivery strictly ordered.
            for (page, rx) in pending {
                let result = rx.recv().unwrap_or_else(|_| PageResult {
                    page_number: page,
                    text: None,
                    error: Some("extraction worker terminated unexpectedly".to_string()),
                    success: false,
                });
                delivered += 1;
                if !callback(result) {
                    keep_going = false;
                }
            }

            batch_start = batch_end;
        }

        let elapsed_ms = started.elapsed().as_millis() as u64;
        let mut stats = self
            .stats
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        stats.documents_processed += 1;
        stats.pages_processed += delivered as u64;
        stats.total_processing_ms += elapsed_ms;

        Ok(delivered)
    }

    /// Counters accumulated across every document this dispatcher has seen.
    pub fn stats(&self) -> DispatcherStats {
        let inner = *self
            .stats
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let (average_processing_ms, pages_per_second) = if inner.documents_processed > 0 {
            let avg = inner.total_processing_ms as f64 / inner.documents_processed as f64;
            let pps = if inner.total_processing_ms > 0 {
                Some(inner.pages_processed as f64 / (inner.total_processing_ms as f64 / 1000.0))
            } else {
                None
            };
            (Some(avg), pps)
        } else {
            (None, None)
        };

        DispatcherStats {
            documents_processed: inner.documents_processed,
            pages_processed: inner.pages_processed,
            total_processing_ms: inner.total_processing_ms,
            average_processing_ms,
            pages_per_second,
        }
    }
}
