//! File-level block upsert
//!
//! The read-modify-write runs under an exclusive lock on a sibling lock file.
//! The original is backed up before anything is written, and the new content
//! replaces it through a temp file in the same directory, so readers only
//! ever see the old or the new file.

use std::fs;
use std::io::Write;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};

use chrono::Local;
use nix::unistd::{Gid, Uid, chown};
use tempfile::NamedTempFile;

use super::BlockSpec;
use crate::error::{Result, fs as fs_error};
use crate::lock::FileGuard;

/// Result of reconciling one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The file was rewritten; the original is at `backup`
    Changed { backup: PathBuf },
    Unchanged,
}

impl Outcome {
    pub fn is_changed(&self) -> bool {
        matches!(self, Outcome::Changed { .. })
    }
}

/// Bring the block described by `spec` into `path`
///
/// Backups go to `backup_dir`, or next to the file when it is `None`.
pub fn upsert_block(path: &Path, spec: &BlockSpec, backup_dir: Option<&Path>) -> Result<Outcome> {
    if !path.is_file() {
        return Err(fs_error::not_found(path.display().to_string()));
    }
    let directory = parent_of(path);
    let _guard = FileGuard::acquire(&lock_path(path))?;

    let original = read(path)?;
    let updated = spec.apply(&original);
    if updated == original {
        tracing::debug!(path = %path.display(), "block already up to date");
        return Ok(Outcome::Unchanged);
    }

    let backup = backup(path, backup_dir.unwrap_or(&directory))?;
    tracing::info!(path = %path.display(), backup = %backup.display(), "backed up");

    replace(path, &directory, updated.as_bytes())?;
    tracing::info!(path = %path.display(), "block updated");

    Ok(Outcome::Changed { backup })
}

/// Whether [`upsert_block`] would rewrite `path`
pub fn would_change(path: &Path, spec: &BlockSpec) -> Result<bool> {
    if !path.is_file() {
        return Err(fs_error::not_found(path.display().to_string()));
    }
    let original = read(path)?;
    Ok(spec.apply(&original) != original)
}

/// `<dir>/.<name>.hostprov.lock`
fn lock_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    parent_of(path).join(format!(".{name}.hostprov.lock"))
}

fn parent_of(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .map_err(|e| fs_error::read_failed(path.display().to_string(), e.to_string()))
}

/// Copy `path` to `<dir>/<name>.<YYYYmmddHHMMSS>.bak`, never overwriting a backup
fn backup(path: &Path, dir: &Path) -> Result<PathBuf> {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stamp = Local::now().format("%Y%m%d%H%M%S");

    fs::create_dir_all(dir)
        .map_err(|e| fs_error::write_failed(dir.display().to_string(), e.to_string()))?;

    let mut candidate = dir.join(format!("{name}.{stamp}.bak"));
    let mut attempt = 1;
    while candidate.exists() {
        candidate = dir.join(format!("{name}.{stamp}.{attempt}.bak"));
        attempt += 1;
    }

    fs::copy(path, &candidate)
        .map_err(|e| fs_error::write_failed(candidate.display().to_string(), e.to_string()))?;
    Ok(candidate)
}

/// Atomically replace `path` with `content`, keeping its mode and owner
fn replace(path: &Path, directory: &Path, content: &[u8]) -> Result<()> {
    let write_failed = |e: &dyn std::fmt::Display| {
        fs_error::write_failed(path.display().to_string(), e.to_string())
    };

    let metadata = fs::metadata(path).map_err(|e| write_failed(&e))?;
    let mut temp = NamedTempFile::new_in(directory).map_err(|e| write_failed(&e))?;

    temp.as_file()
        .set_permissions(metadata.permissions())
        .map_err(|e| write_failed(&e))?;
    chown(
        temp.path(),
        Some(Uid::from_raw(metadata.uid())),
        Some(Gid::from_raw(metadata.gid())),
    )
    .map_err(|e| write_failed(&e))?;

    temp.write_all(content).map_err(|e| write_failed(&e))?;
    temp.as_file().sync_all().map_err(|e| write_failed(&e))?;
    temp.persist(path).map_err(|e| write_failed(&e.error))?;

    if let Err(e) = fs::File::open(directory).and_then(|dir| dir.sync_all()) {
        tracing::warn!(directory = %directory.display(), error = %e, "failed to sync directory");
    }
    Ok(())
}
