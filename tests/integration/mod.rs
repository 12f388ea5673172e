// Integration test utilities and common code
// WHY: Centralized utilities avoid duplication across integration tests

#![allow(dead_code)]

pub mod fixtures;

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Temporary directory holding script files for one test
pub struct TestFixture {
    pub temp_dir: TempDir,
    pub root_path: PathBuf,
}

impl TestFixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root_path = temp_dir.path().to_path_buf();
        Self { temp_dir, root_path }
    }

    /// Create a script text file with given content
    pub fn create_script_file<P: AsRef<Path>>(&self, relative_path: P, content: &str) -> PathBuf {
        let file_path = self.root_path.join(relative_path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        fs::write(&file_path, content).expect("Failed to write test file");
        file_path
    }

    /// Create a file with arbitrary bytes (invalid UTF-8 cases)
    pub fn create_raw_file<P: AsRef<Path>>(&self, relative_path: P, content: &[u8]) -> PathBuf {
        let file_path = self.root_path.join(relative_path);
        fs::write(&file_path, content).expect("Failed to write raw test file");
        file_path
    }

    /// Overwrite the aux output of `source_path` with a marker
    pub fn create_stale_aux_file<P: AsRef<Path>>(&self, source_path: P) -> PathBuf {
        let aux_path = cueline::generate_aux_file_path(source_path.as_ref());
        fs::write(&aux_path, "stale\n").expect("Failed to write aux file");
        aux_path
    }

    pub fn stats_path(&self) -> PathBuf {
        self.root_path.join("run_stats.json")
    }
}
