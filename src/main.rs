//! Thin CLI front end: parses arguments into a [`blocktext::config::ScanConfig`]
//! and hands it to the orchestrator. All scanning logic lives in the library.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use blocktext::blockset::BlockSet;
use blocktext::config::{
    EncodingSet, ScanConfig, SourceSelector, DEFAULT_BUFFER_SIZE, DEFAULT_MIN_LENGTH,
};
use blocktext::filter::{Filter, FilterOptions};
use blocktext::process::Kind as RegionKind;
use blocktext::sink::BufferedSink;

/// Find printable, block-filtered text runs in binary data or process memory.
#[derive(Debug, Parser)]
#[command(name = "blocktext", version, about)]
struct Cli {
    /// Path to the file to scan.
    #[arg(long, short = 'f', conflicts_with = "pid")]
    file: Option<PathBuf>,

    /// One or more process ids to scan instead of a file.
    #[arg(long, conflicts_with = "file")]
    pid: Vec<u32>,

    /// Encodings to scan for: any of ascii, utf8, utf16le, utf16be.
    #[arg(long, value_delimiter = ',', default_value = "utf8,utf16le")]
    encoding: Vec<String>,

    /// Unicode blocks to accept, or "all"; default is BasicLatin only.
    #[arg(long, value_delimiter = ',', default_value = "BasicLatin")]
    blocks: Vec<String>,

    /// Byte offset to start scanning at.
    #[arg(long, default_value_t = 0)]
    start_offset: u64,

    /// Number of bytes to scan; 0 means "all remaining".
    #[arg(long, default_value_t = 0)]
    bytes_to_scan: u64,

    /// Minimum run length to report.
    #[arg(long, default_value_t = DEFAULT_MIN_LENGTH)]
    min_length: u8,

    /// Read buffer size in bytes.
    #[arg(long, default_value_t = DEFAULT_BUFFER_SIZE)]
    buffer_size: usize,

    /// Exclude HT/LF/CR from the printable-ASCII range.
    #[arg(long)]
    exclude_control_cp: bool,

    /// Force the sequential per-buffer decoder driver.
    #[arg(long)]
    sync: bool,

    /// Run multiple process sources concurrently.
    #[arg(long)]
    parallel_items: bool,

    /// Regex pattern a run's text must match.
    #[arg(long, conflicts_with = "wildcard")]
    regex: Option<String>,

    /// Shell wildcard pattern (`*`, `?`) a run's text must match.
    #[arg(long, conflicts_with = "regex")]
    wildcard: Option<String>,

    /// Write output to this file instead of stdout.
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,
}

impl Cli {
    /// `BLOCKTEXT_LOG` overrides the default `info` filter level.
    fn env_filter_fallback(&self) -> Option<String> {
        std::env::var("BLOCKTEXT_LOG").ok()
    }
}

fn build_filter(cli: &Cli) -> anyhow::Result<Filter> {
    if let Some(pattern) = &cli.regex {
        return Filter::regex(pattern, FilterOptions::default())
            .with_context(|| format!("invalid regex pattern `{pattern}`"));
    }
    if let Some(pattern) = &cli.wildcard {
        return Filter::wildcard(pattern)
            .with_context(|| format!("invalid wildcard pattern `{pattern}`"));
    }
    Ok(Filter::none())
}

fn build_encoding_set(names: &[String]) -> anyhow::Result<EncodingSet> {
    let mut ascii = false;
    let mut utf8 = false;
    let mut utf16le = false;
    let mut utf16be = false;
    for name in names {
        match name.to_ascii_lowercase().as_str() {
            "ascii" => ascii = true,
            "utf8" | "utf-8" => utf8 = true,
            "utf16le" | "utf-16le" => utf16le = true,
            "utf16be" | "utf-16be" => utf16be = true,
            other => anyhow::bail!("unknown encoding `{other}`"),
        }
    }
    Ok(EncodingSet::new(ascii, utf8, utf16le, utf16be))
}

fn scan_one(
    config: &ScanConfig,
    source: &mut dyn blocktext::source::Source,
    cli: &Cli,
    cancel: &Arc<AtomicBool>,
) -> anyhow::Result<()> {
    match &cli.output {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("could not create `{}`", path.display()))?;
            let sink = BufferedSink::new(file);
            blocktext::orchestrator::run(config, source, &sink, cancel).context("scan failed")?;
        }
        None => {
            let sink = BufferedSink::new(std::io::stdout());
            blocktext::orchestrator::run(config, source, &sink, cancel).context("scan failed")?;
        }
    }
    Ok(())
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter_str = cli.env_filter_fallback().unwrap_or_else(|| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter_str))
        .init();

    let source = if !cli.pid.is_empty() {
        SourceSelector::Processes(cli.pid.clone())
    } else {
        let path = cli
            .file
            .clone()
            .ok_or_else(|| anyhow::anyhow!("either --file or --pid must be given"))?;
        SourceSelector::File(path)
    };

    let encodings = build_encoding_set(&cli.encoding)?;
    let blocks = BlockSet::from_names(cli.blocks.iter().map(String::as_str))
        .map_err(|e| anyhow::anyhow!(e))?;
    let filter = build_filter(&cli)?;
    let region_mask = vec![RegionKind::PrivateData];

    let config = ScanConfig::new(
        source,
        encodings,
        blocks,
        cli.start_offset,
        cli.bytes_to_scan,
        cli.min_length,
        cli.buffer_size,
        cli.exclude_control_cp,
        region_mask,
        filter,
        cli.sync,
        cli.parallel_items,
    )
    .context("invalid configuration")?;

    let cancel = Arc::new(AtomicBool::new(false));

    match &config.source {
        SourceSelector::File(path) => {
            let mut file_source = blocktext::source::FileSource::open(path)
                .with_context(|| format!("could not open `{}`", path.display()))?;
            scan_one(&config, &mut file_source, &cli, &cancel)?;
        }
        SourceSelector::Processes(pids) => {
            for pid in pids {
                tracing::warn!(
                    pid,
                    "process-memory scanning requires a real ProcessOsInterface; \
                     none is wired into this binary"
                );
            }
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
