//! Host preconditions
//!
//! A provisioning run may only start once privilege, tools, the shared group,
//! the target directories and the database connection have been checked.
//! [`verify`] performs those checks, opens the administrative connection and
//! hands out [`Preconditions`], the only way to build a
//! [`crate::pipeline::Pipeline`].

use std::path::{Path, PathBuf};

use nix::unistd::{Group, geteuid};

use crate::config::Settings;
use crate::database::{DatabaseBackend, DatabaseError};
use crate::error::{Result, preflight};

/// Account tools every run shells out to
pub const ACCOUNT_TOOLS: &[&str] = &["useradd", "usermod", "chpasswd"];

/// Proof that [`verify`] succeeded
#[derive(Debug)]
pub struct Preconditions {
    _private: (),
}

/// Read-only questions about the host
pub trait HostProbe {
    fn is_privileged(&self) -> bool;

    /// Resolve `name` the way the process would when spawning it
    fn find_tool(&self, name: &str) -> Option<PathBuf>;

    fn group_exists(&self, name: &str) -> bool;

    fn is_dir(&self, path: &Path) -> bool;
}

/// [`HostProbe`] for the running host
#[derive(Debug, Default)]
pub struct SystemProbe;

impl HostProbe for SystemProbe {
    fn is_privileged(&self) -> bool {
        geteuid().is_root()
    }

    fn find_tool(&self, name: &str) -> Option<PathBuf> {
        if name.contains('/') {
            let path = PathBuf::from(name);
            return path.is_file().then_some(path);
        }
        let search = std::env::var_os("PATH")?;
        std::env::split_paths(&search)
            .map(|dir| dir.join(name))
            .find(|candidate| candidate.is_file())
    }

    fn group_exists(&self, name: &str) -> bool {
        matches!(Group::from_name(name), Ok(Some(_)))
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }
}

/// Check every precondition of a provisioning run, cheapest first
///
/// `connect` opens the administrative connection; it is only called once the
/// host checks passed, and the verified connection is returned for the run.
pub fn verify<D, F>(
    settings: &Settings,
    probe: &dyn HostProbe,
    connect: F,
) -> Result<(Preconditions, D)>
where
    D: DatabaseBackend,
    F: FnOnce() -> std::result::Result<D, DatabaseError>,
{
    check_host(settings, probe)?;

    let unreachable = |e: DatabaseError| preflight::database_unreachable(e.to_string());
    let mut database = connect().map_err(unreachable)?;
    database.verify_connectivity().map_err(unreachable)?;
    tracing::debug!("database connectivity verified");

    Ok((Preconditions { _private: () }, database))
}

/// Host-side checks that need no database connection
pub fn check_host(settings: &Settings, probe: &dyn HostProbe) -> Result<()> {
    if !probe.is_privileged() {
        return Err(crate::error::HostprovError::NotPrivileged);
    }

    for &tool in ACCOUNT_TOOLS {
        let path = probe
            .find_tool(tool)
            .ok_or_else(|| preflight::tool_not_found(tool))?;
        tracing::debug!(tool, path = %path.display(), "found tool");
    }

    if !probe.group_exists(&settings.group) {
        return Err(preflight::group_not_found(&settings.group));
    }

    let directories = [
        Some(&settings.students_root),
        Some(&settings.report_dir),
        settings.template_dir.as_ref(),
    ];
    for directory in directories.into_iter().flatten() {
        if !probe.is_dir(directory) {
            return Err(preflight::directory_not_found(
                directory.display().to_string(),
            ));
        }
    }

    Ok(())
}
