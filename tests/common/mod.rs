//! Common test utilities for hostprov integration tests

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

/// Command for the real hostprov binary, isolated from the caller's environment
#[allow(deprecated)]
pub fn hostprov_cmd() -> Command {
    let mut cmd = Command::cargo_bin("hostprov").unwrap();
    cmd.env_remove("HOSTPROV_CONFIG")
        .env_remove("HOSTPROV_DB_PASSWORD")
        .env_remove("RUST_LOG");
    cmd
}

/// A scratch host layout: students root, report directory and settings file
#[allow(dead_code)]
pub struct TestHost {
    pub temp: TempDir,
    pub path: PathBuf,
}

#[allow(dead_code)]
impl TestHost {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let path = temp.path().to_path_buf();
        std::fs::create_dir_all(path.join("students")).expect("Failed to create students root");
        std::fs::create_dir_all(path.join("reports")).expect("Failed to create report dir");
        Self { temp, path }
    }

    /// Write a settings file pointing into this host and return its path
    pub fn write_config(&self, group: &str) -> PathBuf {
        let config = format!(
            "students_root: {}\nreport_dir: {}\ngroup: {group}\ndomain: web.example.edu\n",
            self.path.join("students").display(),
            self.path.join("reports").display(),
        );
        self.write_file("config.yaml", &config)
    }

    pub fn write_file(&self, path: &str, content: &str) -> PathBuf {
        let file_path = self.path.join(path);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(&file_path, content).expect("Failed to write file");
        file_path
    }

    pub fn read_file(&self, path: &str) -> String {
        std::fs::read_to_string(self.path.join(path)).expect("Failed to read file")
    }

    pub fn report_count(&self) -> usize {
        count_entries(&self.path.join("reports"))
    }
}

impl Default for TestHost {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(dead_code)]
pub fn count_entries(dir: &Path) -> usize {
    std::fs::read_dir(dir).map_or(0, Iterator::count)
}
