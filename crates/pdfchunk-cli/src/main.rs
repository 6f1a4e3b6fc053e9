//! pdfchunk - convert a PDF into token-bounded text chunks as JSON.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use colored::Colorize;

use pdfchunk_backend::{ChunkRecord, HierarchicalChunker};
use pdfchunk_core::ChunkOptions;

#[derive(Parser, Debug)]
#[command(
    name = "pdfchunk",
    about = "Chunk PDF documents into token-bounded pieces for LLM ingestion",
    long_about = "Chunk PDF documents into token-bounded pieces for LLM ingestion.\n\n\
                  Extract text from a PDF in parallel and split it into chunks whose\n\
                  token counts fall inside a configurable band, honoring heading\n\
                  boundaries where possible. Output is a JSON array compatible with\n\
                  docling's chunker schema.",
    version
)]
struct Args {
    /// Input PDF file
    #[arg(short, long, value_name = "PATH")]
    input: Option<PathBuf>,

    /// Input PDF file (positional alternative to --input)
    #[arg(value_name = "INPUT", conflicts_with = "input")]
    input_positional: Option<PathBuf>,

    /// Output JSON path (default: <input-stem>_chunks.json next to the input)
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Maximum tokens per chunk
    #[arg(long, value_name = "N", default_value_t = 512)]
    max_chunk_size: usize,

    /// Minimum tokens per chunk (tail chunks may fall below)
    #[arg(long, value_name = "N", default_value_t = 150)]
    min_chunk_size: usize,

    /// Tokens of context carried over from the previous chunk
    #[arg(long, value_name = "N", default_value_t = 0)]
    overlap: usize,

    /// Stop after this many pages (0 or negative: process all pages)
    #[arg(long, value_name = "N", default_value_t = 0, allow_negative_numbers = true)]
    page_limit: i64,

    /// Extraction worker threads (0: one per CPU core)
    #[arg(long, value_name = "N", default_value_t = 0)]
    threads: usize,

    /// Show detailed processing information
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Emit only a single machine-readable result line
    #[arg(short, long)]
    quiet: bool,

    /// Skip the chunk distribution analysis
    #[arg(long)]
    no_analyze: bool,
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(1);
        }
    };

    init_logging(&args);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e:#}", "Error:".red().bold());
            ExitCode::from(1)
        }
    }
}

fn init_logging(args: &Args) {
    let default_level = if args.quiet {
        "error"
    } else if args.verbose {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn run(args: Args) -> Result<()> {
    let input = args
        .input
        .clone()
        .or_else(|| args.input_positional.clone())
        .context("an input PDF is required (use --input or a positional argument)")?;

    if !input.exists() {
        bail!("input file not found: {}", input.display());
    }

    let output = args.output.clone().unwrap_or_else(|| {
        let stem = input.file_stem().unwrap_or_default().to_string_lossy();
        input.with_file_name(format!("{stem}_chunks.json"))
    });

    let options = ChunkOptions {
        max_tokens: args.max_chunk_size,
        min_tokens: args.min_chunk_size,
        overlap_tokens: args.overlap,
        thread_count: args.threads,
    };
    let page_limit = usize::try_from(args.page_limit).ok().filter(|&n| n > 0);
    log::debug!("options: {options:?}, page_limit: {page_limit:?}");

    let chunker = HierarchicalChunker::new(options)
        .context("failed to configure the chunker")?;

    if !args.quiet {
        let threads = if args.threads == 0 {
            "auto".to_string()
        } else {
            args.threads.to_string()
        };
        eprintln!(
            "{} {} ({} threads)",
            "Processing:".cyan().bold(),
            input.display(),
            threads
        );
        eprintln!(
            "{} max_tokens={}, min_tokens={}, overlap={}",
            "Chunking:".cyan().bold(),
            options.max_tokens,
            options.min_tokens,
            options.overlap_tokens
        );
        if let Some(limit) = page_limit {
            eprintln!("{} {limit} pages", "Page limit:".cyan().bold());
        }
    }

    let started = Instant::now();
    let result = chunker
        .process_pdf_to_json(&input, &output, page_limit)
        .with_context(|| format!("failed to chunk {}", input.display()))?;
    let total_ms = started.elapsed().as_millis();

    if args.quiet {
        println!(
            "SUCCESS|{}|{}|{}|{}",
            input.display(),
            result.total_pages,
            result.total_chunks,
            total_ms
        );
        return Ok(());
    }

    if !args.no_analyze {
        print_distribution(&result.chunks, options.min_tokens);
    }

    eprintln!();
    eprintln!(
        "{} {} chunks from {} pages in {}ms",
        "Done:".green().bold(),
        result.total_chunks,
        result.total_pages,
        total_ms
    );
    if total_ms > 0 {
        eprintln!(
            "{} {:.1} pages/second",
            "Performance:".green().bold(),
            result.total_pages as f64 * 1000.0 / total_ms as f64
        );
    }
    eprintln!("{} {}", "Output:".green().bold(), output.display());

    Ok(())
}

/// Token-count distribution summary, printed after a successful run.
fn print_distribution(chunks: &[ChunkRecord], min_tokens: usize) {
    if chunks.is_empty() {
        println!("\nNo chunks created");
        return;
    }

    let mut counts: Vec<usize> = chunks.iter().map(|c| c.token_count).collect();
    counts.sort_unstable();

    let total = counts.len();
    let sum: usize = counts.iter().sum();

    println!("\n=== Chunk Distribution ===");
    println!("Total chunks: {total}");
    println!("Min tokens: {}", counts[0]);
    println!("Max tokens: {}", counts[total - 1]);
    println!("Average tokens: {}", sum / total);

    println!("\nQuintiles:");
    for p in [20usize, 40, 60, 80] {
        let idx = (total - 1) * p / 100;
        println!("  {p}th percentile: {} tokens", counts[idx]);
    }

    let buckets: [(&str, usize, usize); 8] = [
        ("1-50", 1, 50),
        ("51-100", 51, 100),
        ("101-200", 101, 200),
        ("201-300", 201, 300),
        ("301-400", 301, 400),
        ("401-500", 401, 500),
        ("501-512", 501, 512),
        ("513+", 513, usize::MAX),
    ];
    println!("\nToken Range Distribution:");
    for (label, lo, hi) in buckets {
        let count = counts.iter().filter(|&&t| t >= lo && t <= hi).count();
        if count > 0 {
            let percentage = count as f64 * 100.0 / total as f64;
            println!("  {label} tokens: {count} chunks ({percentage:.1}%)");
        }
    }

    let small = counts.iter().filter(|&&t| t < min_tokens).count();
    if small > 0 {
        println!("\nWARNING: {small} chunks are below the minimum threshold of {min_tokens} tokens");
    } else {
        println!("\nSUCCESS: All chunks meet the minimum threshold of {min_tokens} tokens");
    }
}
