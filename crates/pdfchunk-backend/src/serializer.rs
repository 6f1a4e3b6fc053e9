//! Docling-compatible JSON output for chunk sequences.
//!
//! The output is a top-level array of `{"text", "meta"}` objects whose meta
//! block follows the `docling_core.transforms.chunker.DocMeta` schema, so
//! downstream consumers built against docling's chunker output can ingest
//! these files unchanged.

use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use crate::chunker::ChunkRecord;
use crate::error::Result;

const SCHEMA_NAME: &str = "docling_core.transforms.chunker.DocMeta";
const SCHEMA_VERSION: &str = "1.0.0";

#[derive(Serialize)]
struct ChunkEnvelope<'a> {
    text: &'a str,
    meta: DocMeta<'a>,
}

#[derive(Serialize)]
struct DocMeta<'a> {
    schema_name: &'a str,
    version: &'a str,
    start_page: usize,
    end_page: usize,
    page_count: usize,
    chunk_index: usize,
    total_chunks: usize,
    token_count: usize,
    has_major_heading: bool,
    min_heading_level: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    overlap_tokens: Option<usize>,
    origin: Origin<'a>,
    doc_items: Vec<Value>,
    headings: Vec<Value>,
    captions: Option<Value>,
}

#[derive(Serialize)]
struct Origin<'a> {
    mimetype: &'a str,
    binary_hash: i64,
    filename: &'a str,
    uri: Option<&'a str>,
}

/// Stable 64-bit FNV-1a hash of the input path string, reported as the
/// document's `binary_hash`. Hashing the path rather than the file contents
/// keeps re-runs cheap and is sufficient for the schema's identity field.
pub fn path_hash(path: &Path) -> i64 {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

    let mut hash = FNV_OFFSET;
    for byte in path.to_string_lossy().as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash as i64
}

/// Render the chunk sequence as a pretty-printed JSON array.
pub fn chunks_to_json(records: &[ChunkRecord], source: &Path) -> Result<String> {
    let filename = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let hash = path_hash(source);
    let total = records.len();

    let envelopes: Vec<ChunkEnvelope<'_>> = records
        .iter()
        .enumerate()
        .map(|(index, record)| ChunkEnvelope {
            text: &record.text,
            meta: DocMeta {
                schema_name: SCHEMA_NAME,
                version: SCHEMA_VERSION,
                start_page: record.start_page,
                end_page: record.end_page,
                page_count: record.end_page - record.start_page + 1,
                chunk_index: index,
                total_chunks: total,
                token_count: record.token_count,
                has_major_heading: record.has_major_heading,
                min_heading_level: record.min_heading_level,
                overlap_tokens: (record.overlap_tokens > 0).then_some(record.overlap_tokens),
                origin: Origin {
                    mimetype: "application/pdf",
                    binary_hash: hash,
                    filename: &filename,
                    uri: None,
                },
                doc_items: Vec::new(),
                headings: Vec::new(),
                captions: None,
            },
        })
        .collect();

    Ok(serde_json::to_string_pretty(&envelopes)?)
}
