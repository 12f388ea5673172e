// WHY: Finds extracted script text under user-supplied roots for batch parsing
// Directory walks use walkdir; file names are filtered with glob patterns

use anyhow::{Context, Result};
use glob::Pattern;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::incremental::AUX_FILE_SUFFIX;

/// Configuration for file discovery behavior
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// Whether to fail fast on first error or continue processing
    pub fail_fast: bool,
    /// File-name globs a script must match
    pub patterns: Vec<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            fail_fast: false,
            patterns: vec!["*.txt".to_string(), "*.fountain".to_string()],
        }
    }
}

/// Result of file discovery validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileValidation {
    pub path: PathBuf,
    pub error: Option<String>,
}

impl FileValidation {
    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<Pattern>> {
    patterns
        .iter()
        .map(|p| Pattern::new(p).with_context(|| format!("invalid file pattern '{p}'")))
        .collect()
}

fn is_aux_output(file_name: &str) -> bool {
    file_name.ends_with(AUX_FILE_SUFFIX)
}

fn matches_any(patterns: &[Pattern], file_name: &str) -> bool {
    patterns.iter().any(|p| p.matches(file_name))
}

/// Collect script files under `root`, sorted by path
///
/// A file root is returned as-is without pattern filtering.
pub async fn collect_script_files(
    root: impl AsRef<Path>,
    config: &DiscoveryConfig,
) -> Result<Vec<FileValidation>> {
    let root = root.as_ref();

    if !root.exists() {
        anyhow::bail!("Path does not exist: {}", root.display());
    }

    if root.is_file() {
        debug!("Single file root: {}", root.display());
        return Ok(vec![validate_file(root, config).await?]);
    }

    let patterns = compile_patterns(&config.patterns)?;
    let traversal_start = std::time::Instant::now();
    info!("Starting directory traversal in: {}", root.display());

    let mut candidates = Vec::new();
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let error_msg = format!("Directory walk error: {e}");
                warn!("{}", error_msg);
                if config.fail_fast {
                    return Err(anyhow::anyhow!(error_msg));
                }
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(file_name) = entry.file_name().to_str() else {
            continue;
        };
        if is_aux_output(file_name) || !matches_any(&patterns, file_name) {
            continue;
        }
        debug!("Found matching file: {}", entry.path().display());
        candidates.push(entry.into_path());
    }
    candidates.sort();

    let mut files = Vec::with_capacity(candidates.len());
    for path in candidates {
        files.push(validate_file(&path, config).await?);
    }

    let valid_count = files.iter().filter(|f| f.is_valid()).count();
    let invalid_count = files.len() - valid_count;
    if invalid_count > 0 {
        warn!("Found {} files with validation issues", invalid_count);
    }
    info!(
        "Discovery completed in {}ms: {} valid, {} invalid",
        traversal_start.elapsed().as_millis(),
        valid_count,
        invalid_count
    );

    Ok(files)
}

/// Collect script files from several roots, dropping duplicates
pub async fn find_script_files(roots: &[PathBuf], config: &DiscoveryConfig) -> Result<Vec<FileValidation>> {
    let mut files: Vec<FileValidation> = Vec::new();
    for root in roots {
        files.extend(collect_script_files(root, config).await?);
    }
    files.sort_by(|a, b| a.path.cmp(&b.path));
    files.dedup_by(|a, b| a.path == b.path);
    Ok(files)
}

async fn validate_file(path: &Path, config: &DiscoveryConfig) -> Result<FileValidation> {
    let error = match fs::metadata(path).await {
        Ok(metadata) if metadata.is_file() => None,
        Ok(_) => Some(format!("Path is not a file: {}", path.display())),
        Err(e) => Some(format!("Cannot access file {}: {}", path.display(), e)),
    };

    if let Some(ref error) = error {
        warn!("{}", error);
        if config.fail_fast {
            return Err(anyhow::anyhow!(error.clone()));
        }
    }

    Ok(FileValidation {
        path: path.to_path_buf(),
        error,
    })
}
