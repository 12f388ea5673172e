use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, BufReader};
use tracing::{debug, info, warn};

use crate::source::{PlainTextSource, PAGE_BREAK};

/// Configuration for script file reading
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Whether to fail fast on first error or record it and continue
    pub fail_fast: bool,
    /// Buffer size for async reading (default: 8KB)
    pub buffer_size: usize,
    /// Memory-map the file instead of buffered async reads
    pub use_mmap: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            fail_fast: false,
            buffer_size: 8192,
            use_mmap: false,
        }
    }
}

/// Statistics for one script read
#[derive(Debug, Clone, Default)]
pub struct ReadStats {
    pub file_path: String,
    pub bytes_read: u64,
    pub lines_read: u64,
    pub pages_read: u64,
    pub duration_ms: u64,
    pub read_error: Option<String>,
}

/// Reads extracted script text from disk
pub struct AsyncFileReader {
    config: ReaderConfig,
}

impl AsyncFileReader {
    pub fn new(config: ReaderConfig) -> Self {
        Self { config }
    }

    /// Read a whole script file as UTF-8 text
    ///
    /// Without `fail_fast`, open and decode failures come back as empty text with
    /// `read_error` set.
    pub async fn read_script<P: AsRef<Path>>(&self, file_path: P) -> Result<(String, ReadStats)> {
        let path = file_path.as_ref();
        let start_time = std::time::Instant::now();
        let mut stats = ReadStats {
            file_path: path.display().to_string(),
            ..Default::default()
        };

        debug!("Starting read of script: {}", path.display());

        let decoded = if self.config.use_mmap {
            let owned = path.to_path_buf();
            match tokio::task::spawn_blocking(move || read_mapped(&owned)).await {
                Ok(result) => result,
                Err(e) => Err(anyhow::anyhow!("mmap read task failed: {e}")),
            }
        } else {
            self.read_buffered(path).await
        };

        let decoded = match decoded {
            Ok(decoded) => decoded,
            Err(e) => {
                let error_msg = format!("Failed to read file {}: {:#}", path.display(), e);
                return self.fail(error_msg, stats, start_time);
            }
        };
        stats.bytes_read = decoded.bytes_read;

        let text = match decoded.text {
            Ok(text) => text,
            Err(valid_up_to) => {
                let error_msg = format!("UTF-8 decoding error in {} at byte {}", path.display(), valid_up_to);
                return self.fail(error_msg, stats, start_time);
            }
        };

        stats.lines_read = text.lines().count() as u64;
        stats.pages_read = if text.is_empty() {
            0
        } else {
            text.matches(PAGE_BREAK).count() as u64 + 1
        };
        stats.duration_ms = start_time.elapsed().as_millis() as u64;

        info!(
            "Read {}: {} lines, {} pages, {} bytes in {}ms",
            path.display(),
            stats.lines_read,
            stats.pages_read,
            stats.bytes_read,
            stats.duration_ms
        );
        Ok((text, stats))
    }

    /// Read a script and wrap it as a text source
    pub async fn read_source<P: AsRef<Path>>(&self, file_path: P) -> Result<(PlainTextSource, ReadStats)> {
        let (text, stats) = self.read_script(file_path).await?;
        Ok((PlainTextSource::new(text), stats))
    }

    async fn read_buffered(&self, path: &Path) -> Result<Decoded> {
        let file = File::open(path)
            .await
            .with_context(|| format!("opening {}", path.display()))?;
        let mut reader = BufReader::with_capacity(self.config.buffer_size, file);
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).await?;
        Ok(Decoded {
            bytes_read: bytes.len() as u64,
            text: String::from_utf8(bytes).map_err(|e| e.utf8_error().valid_up_to()),
        })
    }

    fn fail(&self, error_msg: String, mut stats: ReadStats, start_time: std::time::Instant) -> Result<(String, ReadStats)> {
        warn!("{}", error_msg);
        if self.config.fail_fast {
            return Err(anyhow::anyhow!(error_msg));
        }
        stats.duration_ms = start_time.elapsed().as_millis() as u64;
        stats.read_error = Some(error_msg);
        Ok((String::new(), stats))
    }
}

/// File contents; a decoding failure carries the length of the valid UTF-8 prefix
struct Decoded {
    bytes_read: u64,
    text: std::result::Result<String, usize>,
}

/// Blocking mapped read, decoded straight from the map with a single copy
fn read_mapped(path: &Path) -> Result<Decoded> {
    let file = std::fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
    // Zero-length files cannot be mapped on every platform
    if file.metadata()?.len() == 0 {
        return Ok(Decoded {
            bytes_read: 0,
            text: Ok(String::new()),
        });
    }
    // SAFETY: the map is only read within this function and dropped before returning
    let mmap = unsafe { memmap2::Mmap::map(&file)? };
    Ok(Decoded {
        bytes_read: mmap.len() as u64,
        text: std::str::from_utf8(&mmap).map(str::to_owned).map_err(|e| e.valid_up_to()),
    })
}

/// Read a single script with default configuration
pub async fn read_script_async<P: AsRef<Path>>(file_path: P) -> Result<String> {
    let reader = AsyncFileReader::new(ReaderConfig {
        fail_fast: true,
        ..Default::default()
    });
    let (text, _stats) = reader.read_script(file_path).await?;
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::TextSource;
    use tempfile::TempDir;
    use tokio::fs;

    async fn create_test_file(dir: &Path, name: &str, content: &[u8]) -> Result<std::path::PathBuf> {
        let file_path = dir.join(name);
        fs::write(&file_path, content).await?;
        Ok(file_path)
    }

    #[tokio::test]
    async fn test_read_valid_script() {
        let temp_dir = TempDir::new().unwrap();
        let reader = AsyncFileReader::new(ReaderConfig::default());
        let file_path = create_test_file(temp_dir.path(), "script.txt", b"JOHN\nHello.\x0cMARY\nHi.").await.unwrap();

        let (text, stats) = reader.read_script(&file_path).await.unwrap();

        assert_eq!(text, "JOHN\nHello.\x0cMARY\nHi.");
        assert_eq!(stats.pages_read, 2);
        assert_eq!(stats.lines_read, 3);
        assert_eq!(stats.bytes_read, text.len() as u64);
        assert!(stats.read_error.is_none());
    }

    #[tokio::test]
    async fn test_read_empty_file() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = create_test_file(temp_dir.path(), "empty.txt", b"").await.unwrap();

        for use_mmap in [false, true] {
            let reader = AsyncFileReader::new(ReaderConfig { use_mmap, ..Default::default() });
            let (text, stats) = reader.read_script(&file_path).await.unwrap();
            assert!(text.is_empty());
            assert_eq!(stats.pages_read, 0);
            assert!(stats.read_error.is_none());
        }
    }

    #[tokio::test]
    async fn test_mmap_matches_buffered() {
        let temp_dir = TempDir::new().unwrap();
        let content = "INT. HOUSE - DAY\n\nANNA\nWho's there?\n".repeat(50);
        let file_path = create_test_file(temp_dir.path(), "long.txt", content.as_bytes()).await.unwrap();

        let buffered = AsyncFileReader::new(ReaderConfig { buffer_size: 64, ..Default::default() });
        let mapped = AsyncFileReader::new(ReaderConfig { use_mmap: true, ..Default::default() });

        let (a, _) = buffered.read_script(&file_path).await.unwrap();
        let (b, _) = mapped.read_script(&file_path).await.unwrap();
        assert_eq!(a, content);
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_missing_file_recorded() {
        let temp_dir = TempDir::new().unwrap();
        let reader = AsyncFileReader::new(ReaderConfig::default());

        let (text, stats) = reader.read_script(temp_dir.path().join("missing.txt")).await.unwrap();
        assert!(text.is_empty());
        assert!(stats.read_error.is_some());
    }

    #[tokio::test]
    async fn test_missing_file_fail_fast() {
        let temp_dir = TempDir::new().unwrap();
        let reader = AsyncFileReader::new(ReaderConfig { fail_fast: true, ..Default::default() });

        let result = reader.read_script(temp_dir.path().join("missing.txt")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_invalid_utf8_recorded() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = create_test_file(temp_dir.path(), "bad.txt", &[b'O', b'K', 0xFF, 0xFE]).await.unwrap();
        let reader = AsyncFileReader::new(ReaderConfig::default());

        let (text, stats) = reader.read_script(&file_path).await.unwrap();
        assert!(text.is_empty());
        let error = stats.read_error.unwrap();
        assert!(error.contains("UTF-8"), "unexpected error: {error}");
        assert!(error.contains("byte 2"));
    }

    #[tokio::test]
    async fn test_invalid_utf8_mapped_reports_offset() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = create_test_file(temp_dir.path(), "bad.txt", &[b'A', b'B', b'C', 0xC3, 0x28]).await.unwrap();
        let reader = AsyncFileReader::new(ReaderConfig { use_mmap: true, ..Default::default() });

        let (text, stats) = reader.read_script(&file_path).await.unwrap();
        assert!(text.is_empty());
        assert_eq!(stats.bytes_read, 5);
        assert!(stats.read_error.unwrap().contains("byte 3"));
    }

    #[tokio::test]
    async fn test_read_source_pages() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = create_test_file(temp_dir.path(), "paged.txt", b"one\x0ctwo").await.unwrap();
        let reader = AsyncFileReader::new(ReaderConfig::default());

        let (source, _) = reader.read_source(&file_path).await.unwrap();
        assert_eq!(source.page_count(), 2);
        assert_eq!(source.page_text(1).unwrap().as_deref(), Some("two"));
    }
}
