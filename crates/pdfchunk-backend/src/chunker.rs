//! Document-level chunking API: extract pages, run the pipeline, report
//! chunk records.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use serde::Serialize;

use pdfchunk_core::{chunk_pages, Chunk, ChunkOptions, PageText, Tokenizer};

use crate::dispatcher::{Dispatcher, DispatcherStats, ParseOptions};
use crate::error::{BackendError, Result};
use crate::extract::{PageExtract, PdfiumExtractor};
use crate::serializer;

/// One chunk as reported to callers.
#[derive(Debug, Clone, Serialize)]
pub struct ChunkRecord {
    pub text: String,
    pub token_count: usize,
    pub start_page: usize,
    pub end_page: usize,
    pub has_major_heading: bool,
    pub min_heading_level: u32,
    /// Tokens of carried-over context at the front of `text`; 0 when
    /// overlap is disabled.
    pub overlap_tokens: usize,
}

impl From<Chunk> for ChunkRecord {
    fn from(chunk: Chunk) -> Self {
        let start_page = chunk.start_page.unwrap_or(0);
        Self {
            token_count: chunk.token_count,
            start_page,
            end_page: chunk.end_page.unwrap_or(start_page),
            has_major_heading: chunk.has_major_heading,
            min_heading_level: chunk.min_heading_level,
            overlap_tokens: chunk.overlap_tokens,
            text: chunk.text,
        }
    }
}

/// Outcome of chunking one document.
///
/// `error` is populated (and `chunks` left empty) when the document could
/// not be opened; per-page extraction failures only drop the affected page.
/// Batch results arrive in completion order, so `source` identifies the
/// document each result belongs to.
#[derive(Debug, Clone, Serialize)]
pub struct ChunkingResult {
    pub source: PathBuf,
    pub chunks: Vec<ChunkRecord>,
    pub total_pages: usize,
    pub total_chunks: usize,
    pub processing_time_ms: f64,
    pub error: Option<String>,
}

/// Progress callback for batch chunking: `(documents_done, documents_total)`.
pub type ProgressCallback = Arc<dyn Fn(usize, usize) + Send + Sync>;

/// Hierarchical PDF chunker: parallel page extraction feeding the
/// seven-pass pipeline.
pub struct HierarchicalChunker<E: PageExtract = PdfiumExtractor> {
    options: ChunkOptions,
    dispatcher: Dispatcher<E>,
    tokenizer: Tokenizer,
}

impl HierarchicalChunker<PdfiumExtractor> {
    /// Build a chunker over the pdfium extractor.
    ///
    /// Fails fast when the options are out of range.
    pub fn new(options: ChunkOptions) -> Result<Self> {
        Self::with_extractor(PdfiumExtractor::new(), options)
    }
}

impl<E: PageExtract + 'static> HierarchicalChunker<E> {
    /// Build a chunker over a caller-supplied extractor. Used by tests to
    /// drive the pipeline without a PDF engine.
    pub fn with_extractor(extractor: E, options: ChunkOptions) -> Result<Self> {
        options.validate().map_err(BackendError::from)?;
        let parse_options = ParseOptions {
            thread_count: options.thread_count,
            ..ParseOptions::default()
        };
        Ok(Self {
            options,
            dispatcher: Dispatcher::new(extractor, parse_options),
            tokenizer: Tokenizer::new(),
        })
    }

    pub fn options(&self) -> &ChunkOptions {
        &self.options
    }

    /// Extraction counters accumulated across documents.
    pub fn stats(&self) -> DispatcherStats {
        self.dispatcher.stats()
    }

    /// Chunk a single PDF. `page_limit` caps the number of pages consumed
    /// from the extractor; `None` processes the whole document.
    pub fn chunk_file(&self, path: &Path, page_limit: Option<usize>) -> ChunkingResult {
        let started = Instant::now();
        let mut pages: Vec<PageText> = Vec::new();

        let outcome = self.dispatcher.parse_streaming(path, &mut |result| {
            let below_limit = page_limit.map_or(true, |limit| pages.len() < limit);
            if below_limit {
                if result.success {
                    if let Some(text) = result.text {
                        pages.push(PageText::new(text, result.page_number));
                    }
                } else if let Some(error) = &result.error {
                    log::warn!(
                        "page {} failed, skipping: {error}",
                        result.page_number
                    );
                }
            }
            page_limit.map_or(true, |limit| pages.len() < limit)
        });

        if let Err(e) = outcome {
            return ChunkingResult {
                source: path.to_path_buf(),
                chunks: Vec::new(),
                total_pages: 0,
                total_chunks: 0,
                processing_time_ms: elapsed_ms(started),
                error: Some(e.to_string()),
            };
        }

        let total_pages = pages.len();
        let chunks = chunk_pages(pages, &self.options, &self.tokenizer);
        let records: Vec<ChunkRecord> = chunks.into_iter().map(ChunkRecord::from).collect();

        log::info!(
            "{}: {} pages -> {} chunks",
            path.display(),
            total_pages,
            records.len()
        );

        ChunkingResult {
            source: path.to_path_buf(),
            total_chunks: records.len(),
            chunks: records,
            total_pages,
            processing_time_ms: elapsed_ms(started),
            error: None,
        }
    }

    /// Chunk `path` and write the docling-compatible JSON to `output_path`.
    pub fn process_pdf_to_json(
        &self,
        path: &Path,
        output_path: &Path,
        page_limit: Option<usize>,
    ) -> Result<ChunkingResult> {
        let result = self.chunk_file(path, page_limit);
        if let Some(error) = &result.error {
            return Err(BackendError::PdfLoad(error.clone()));
        }

        let json = serializer::chunks_to_json(&result.chunks, path)?;
        std::fs::write(output_path, json)?;
        log::info!("wrote {} chunks to {}", result.total_chunks, output_path.display());
        Ok(result)
    }

    /// Chunk several documents concurrently on the worker pool.
    ///
    /// Each document is processed inside a single pool task with sequential
    /// page extraction, so documents, not pages, are the unit of
    /// parallelism here. Results arrive in completion order; match them to
    /// inputs by `source`.
    pub fn chunk_batch(
        &self,
        paths: &[PathBuf],
        progress: Option<ProgressCallback>,
    ) -> Vec<ChunkingResult> {
        let total = paths.len();
        let results = Arc::new(Mutex::new(Vec::with_capacity(total)));
        let completed = Arc::new(AtomicUsize::new(0));

        for path in paths {
            let extractor = Arc::clone(self.dispatcher.extractor());
            let extract_options = self.dispatcher.options().extract;
            let options = self.options;
            let path = path.clone();
            let results = Arc::clone(&results);
            let completed = Arc::clone(&completed);
            let progress = progress.clone();

            self.dispatcher.pool().execute(move || {
                let result =
                    chunk_document_sequential(extractor.as_ref(), &extract_options, &options, &path);
                results
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(result);

                let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                if let Some(progress) = &progress {
                    progress(done, total);
                }
            });
        }

        self.dispatcher.pool().wait_all();

        match Arc::try_unwrap(results) {
            Ok(mutex) => mutex.into_inner().unwrap_or_else(PoisonError::into_inner),
            Err(arc) => arc
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
        }
    }
}

/// Extract and chunk one document without touching the pool; used by batch
/// tasks that already run on a worker thread.
fn chunk_document_sequential<E: PageExtract + ?Sized>(
    extractor: &E,
    extract_options: &crate::extract::ExtractOptions,
    options: &ChunkOptions,
    path: &Path,
) -> ChunkingResult {
    let started = Instant::now();

    let failure = |message: String| ChunkingResult {
        source: path.to_path_buf(),
        chunks: Vec::new(),
        total_pages: 0,
        total_chunks: 0,
        processing_time_ms: elapsed_ms(started),
        error: Some(message),
    };

    if !path.exists() {
        return failure(BackendError::InputNotFound(path.to_path_buf()).to_string());
    }

    let page_count = match extractor.page_count(path) {
        Ok(count) => count,
        Err(e) => return failure(e.to_string()),
    };

    let mut pages = Vec::with_capacity(page_count);
    for index in 0..page_count {
        match extractor.extract_page(path, index, extract_options) {
            Ok(text) => pages.push(PageText::new(text, index)),
            Err(e) => log::warn!("page {index} failed, skipping: {e}"),
        }
    }

    let total_pages = pages.len();
    let tokenizer = Tokenizer::new();
    let chunks = chunk_pages(pages, options, &tokenizer);
    let records: Vec<ChunkRecord> = chunks.into_iter().map(ChunkRecord::from).collect();

    ChunkingResult {
        source: path.to_path_buf(),
        total_chunks: records.len(),
        chunks: records,
        total_pages,
        processing_time_ms: elapsed_ms(started),
        error: None,
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}
