//! Advisory file locks
//!
//! [`FileGuard`] holds an `fslock` lock for as long as it lives. The lock file
//! itself is left in place on release: removing it would let a waiting
//! process lock an unlinked inode while a third one creates a fresh file.

use std::path::{Path, PathBuf};

use fslock::LockFile;

use crate::error::{Result, preflight};

/// RAII guard for an exclusive advisory lock
#[derive(Debug)]
pub struct FileGuard {
    lock: LockFile,
    path: PathBuf,
}

impl FileGuard {
    /// Block until the lock at `path` is held
    pub fn acquire(path: &Path) -> Result<Self> {
        let mut lock = open(path)?;
        lock.lock()
            .map_err(|e| preflight::lock_failed(path.display().to_string(), e.to_string()))?;

        tracing::debug!(path = %path.display(), "lock acquired");
        Ok(Self {
            lock,
            path: path.to_path_buf(),
        })
    }

    /// Take the lock at `path` without blocking; `None` when another process holds it
    pub fn try_acquire(path: &Path) -> Result<Option<Self>> {
        let mut lock = open(path)?;
        let acquired = lock
            .try_lock()
            .map_err(|e| preflight::lock_failed(path.display().to_string(), e.to_string()))?;

        if acquired {
            tracing::debug!(path = %path.display(), "lock acquired");
            Ok(Some(Self {
                lock,
                path: path.to_path_buf(),
            }))
        } else {
            Ok(None)
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for FileGuard {
    fn drop(&mut self) {
        let _ = self.lock.unlock();
    }
}

fn open(path: &Path) -> Result<LockFile> {
    LockFile::open(path).map_err(|e| {
        preflight::lock_failed(
            path.display().to_string(),
            format!("failed to open lock file: {e}"),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_acquire_and_release() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".hostprov.lock");

        {
            let guard = FileGuard::acquire(&path).unwrap();
            assert_eq!(guard.path(), path);
        }

        assert!(FileGuard::try_acquire(&path).unwrap().is_some());
        assert!(path.exists());
    }

    #[test]
    fn test_missing_directory_fails() {
        let err = FileGuard::try_acquire(Path::new("/nonexistent/dir/.hostprov.lock")).unwrap_err();
        assert!(err.to_string().contains("Failed to acquire lock"));
    }
}
