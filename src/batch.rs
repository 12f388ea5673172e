// WHY: Parallel batch parsing for the CLI and benchmarks
// Files are read async, parsed on the blocking pool, and written as aux JSON next to the source

use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::incremental::{aux_file_exists, write_aux_file_async};
use crate::reader::{AsyncFileReader, ReaderConfig};
use crate::script_parser::soft_wrap::split_physical_lines;
use crate::script_parser::{ParseOptions, PersonDetector, ScriptParser};

pub const STATUS_SUCCESS: &str = "success";
pub const STATUS_SKIPPED: &str = "skipped";
pub const STATUS_FAILED: &str = "failed";

/// Settings for one batch run
#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub parse: ParseOptions,
    pub reader: ReaderConfig,
    /// Re-parse files whose aux output already exists
    pub overwrite_all: bool,
    /// Abort the run on the first failed file
    pub fail_fast: bool,
    /// Files in flight at once
    pub concurrency: usize,
    pub show_progress: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            parse: ParseOptions::default(),
            reader: ReaderConfig::default(),
            overwrite_all: false,
            fail_fast: false,
            concurrency: num_cpus::get().max(1),
            show_progress: false,
        }
    }
}

/// Per-file processing statistics
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FileStats {
    pub path: String,
    /// Characters of extracted text read
    pub chars_processed: u64,
    /// Physical lines folded into a preceding line by soft-wrap merging
    pub lines_merged: u64,
    pub blocks_detected: u64,
    pub characters_detected: u64,
    /// Read + parse + write in milliseconds
    pub processing_time_ms: u64,
    /// Parse time in milliseconds (subset of processing_time_ms)
    pub parse_time_ms: u64,
    /// Processing status (success, skipped, failed)
    pub status: String,
    pub error: Option<String>,
}

impl FileStats {
    fn empty(path: &Path, status: &str) -> Self {
        Self {
            path: path.display().to_string(),
            chars_processed: 0,
            lines_merged: 0,
            blocks_detected: 0,
            characters_detected: 0,
            processing_time_ms: 0,
            parse_time_ms: 0,
            status: status.to_string(),
            error: None,
        }
    }

    fn failed(path: &Path, error: String, started: Instant) -> Self {
        Self {
            error: Some(error),
            processing_time_ms: started.elapsed().as_millis() as u64,
            ..Self::empty(path, STATUS_FAILED)
        }
    }

    pub fn is_failed(&self) -> bool {
        self.status == STATUS_FAILED
    }
}

/// Aggregate statistics for a batch run
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RunStats {
    /// Seconds since the Unix epoch when the run began
    pub run_start_unix: u64,
    pub total_processing_time_ms: u64,
    pub total_chars_processed: u64,
    pub total_blocks_detected: u64,
    pub files_processed: u64,
    pub files_skipped: u64,
    pub files_failed: u64,
    pub parse_options: ParseOptions,
    pub file_stats: Vec<FileStats>,
}

impl RunStats {
    fn from_files(parse_options: ParseOptions, run_start_unix: u64, started: Instant, file_stats: Vec<FileStats>) -> Self {
        let count = |status: &str| file_stats.iter().filter(|s| s.status == status).count() as u64;
        Self {
            run_start_unix,
            total_processing_time_ms: started.elapsed().as_millis() as u64,
            total_chars_processed: file_stats.iter().map(|s| s.chars_processed).sum(),
            total_blocks_detected: file_stats.iter().map(|s| s.blocks_detected).sum(),
            files_processed: count(STATUS_SUCCESS),
            files_skipped: count(STATUS_SKIPPED),
            files_failed: count(STATUS_FAILED),
            parse_options,
            file_stats,
        }
    }

    /// Write the stats as pretty JSON
    pub async fn write_stats(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).context("serializing run stats")?;
        tokio::fs::write(path, json)
            .await
            .with_context(|| format!("writing stats to {}", path.display()))?;
        info!("Run statistics written to: {}", path.display());
        Ok(())
    }
}

/// Skip files whose aux output exists unless overwriting
pub fn should_process_file(path: &Path, overwrite_all: bool) -> bool {
    overwrite_all || !aux_file_exists(path)
}

fn progress_bar(len: usize) -> ProgressBar {
    let bar = ProgressBar::new(len as u64);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} scripts ({percent}%) {msg}")
        .or_else(|_| ProgressStyle::default_bar().template("[{bar:40}] {pos}/{len}"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    bar.set_style(style);
    bar
}

struct Worker {
    parser: ScriptParser,
    detector: Option<Arc<dyn PersonDetector>>,
    reader: AsyncFileReader,
    fail_fast: bool,
}

impl Worker {
    async fn process(&self, path: PathBuf) -> Result<FileStats> {
        let started = Instant::now();
        let (text, read_stats) = self.reader.read_script(&path).await?;
        if let Some(error) = read_stats.read_error {
            return Ok(FileStats::failed(&path, error, started));
        }

        let parser = self.parser;
        let detector = self.detector.clone();
        let parse_started = Instant::now();
        let (parse, physical_lines, chars) = tokio::task::spawn_blocking(move || {
            let parse = parser.parse_with_detector(&text, detector.as_deref());
            (parse, split_physical_lines(&text).len(), text.chars().count())
        })
        .await
        .context("parse task panicked")?;
        let parse_time_ms = parse_started.elapsed().as_millis() as u64;

        write_aux_file_async(&path, &parse).await?;

        Ok(FileStats {
            path: path.display().to_string(),
            chars_processed: chars as u64,
            lines_merged: physical_lines.saturating_sub(parse.lines().len()) as u64,
            blocks_detected: parse.blocks().len() as u64,
            characters_detected: parse.characters().len() as u64,
            processing_time_ms: started.elapsed().as_millis() as u64,
            parse_time_ms,
            status: STATUS_SUCCESS.to_string(),
            error: None,
        })
    }
}

/// Parse every file in `paths`, writing `<stem>_cues.json` beside each
///
/// Results come back in input order. Under `fail_fast` the first failure aborts the run
/// and files not yet started are left untouched.
pub async fn process_files_parallel(paths: &[PathBuf], config: &BatchConfig) -> Result<RunStats> {
    let started = Instant::now();
    let run_start_unix = unix_timestamp();
    let worker = Arc::new(Worker {
        parser: ScriptParser::new()?,
        detector: config.parse.resolve_detector().map(Arc::from),
        reader: AsyncFileReader::new(ReaderConfig {
            fail_fast: config.fail_fast || config.reader.fail_fast,
            ..config.reader.clone()
        }),
        fail_fast: config.fail_fast,
    });

    let bar = config.show_progress.then(|| progress_bar(paths.len()));
    info!("Processing {} files with concurrency {}", paths.len(), config.concurrency);

    let mut results = stream::iter(paths.iter().cloned().enumerate())
        .map(|(index, path)| {
            let worker = Arc::clone(&worker);
            let overwrite_all = config.overwrite_all;
            async move {
                let result = if should_process_file(&path, overwrite_all) {
                    let started = Instant::now();
                    match worker.process(path.clone()).await {
                        Ok(stats) => Ok(stats),
                        Err(e) if worker.fail_fast => Err(e.context(format!("processing {}", path.display()))),
                        Err(e) => Ok(FileStats::failed(&path, format!("{e:#}"), started)),
                    }
                } else {
                    Ok(FileStats::empty(&path, STATUS_SKIPPED))
                };
                (index, result)
            }
        })
        .buffer_unordered(config.concurrency.max(1));

    // Returning early drops the stream, so files not yet started are never parsed
    let mut indexed = Vec::with_capacity(paths.len());
    while let Some((index, result)) = results.next().await {
        if let Some(bar) = &bar {
            bar.inc(1);
        }
        let stats = match result {
            Ok(stats) => stats,
            Err(e) => {
                if let Some(bar) = &bar {
                    bar.abandon_with_message("aborted");
                }
                return Err(e);
            }
        };
        if stats.is_failed() {
            warn!("Failed {}: {}", stats.path, stats.error.as_deref().unwrap_or("unknown error"));
            if config.fail_fast {
                if let Some(bar) = &bar {
                    bar.abandon_with_message("aborted");
                }
                anyhow::bail!("Aborting on failure in {}", stats.path);
            }
        }
        indexed.push((index, stats));
    }

    if let Some(bar) = &bar {
        bar.finish_with_message("done");
    }

    indexed.sort_by_key(|(index, _)| *index);
    let file_stats: Vec<FileStats> = indexed.into_iter().map(|(_, stats)| stats).collect();

    let run = RunStats::from_files(config.parse.clone(), run_start_unix, started, file_stats);
    info!(
        "Batch complete: {} processed, {} skipped, {} failed in {}ms",
        run.files_processed, run.files_skipped, run.files_failed, run.total_processing_time_ms
    );
    Ok(run)
}

fn unix_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}
