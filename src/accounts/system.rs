//! Account store backed by the local shadow-utils tools
//!
//! Lookups go through `getpwnam`/`getgrnam` (via `nix`); changes shell out to
//! `useradd`, `usermod` and `chpasswd` so distribution policy (login.defs,
//! PAM hashing) applies unchanged.

use std::fs;
use std::io::{ErrorKind, Write};
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::process::{Command, Stdio};

use nix::errno::Errno;
use nix::unistd::{self, Group, User};
use walkdir::WalkDir;

use super::{AccountError, AccountStore, DirSpec, INDEX_FILES, NewAccount};
use crate::secret::Secret;

/// [`AccountStore`] for the running host
#[derive(Debug, Default)]
pub struct SystemAccounts;

impl SystemAccounts {
    pub fn new() -> Self {
        Self
    }
}

impl AccountStore for SystemAccounts {
    fn account_exists(&self, name: &str) -> Result<bool, AccountError> {
        User::from_name(name)
            .map(|user| user.is_some())
            .map_err(|e| from_errno(&format!("cannot look up account '{name}'"), e))
    }

    fn create_account(&mut self, account: &NewAccount<'_>) -> Result<(), AccountError> {
        let mut command = Command::new("useradd");
        command
            .arg("--home-dir")
            .arg(account.home)
            .arg("--no-create-home")
            .arg("--shell")
            .arg(account.shell)
            .args(["--groups", account.group])
            .args(["--comment", account.comment])
            .arg(account.name);
        run_tool(command, "useradd", None)
    }

    fn is_member(&self, name: &str, group: &str) -> Result<bool, AccountError> {
        let user = User::from_name(name)
            .map_err(|e| from_errno(&format!("cannot look up account '{name}'"), e))?
            .ok_or_else(|| AccountError::Unavailable(format!("account '{name}' vanished")))?;
        let group = Group::from_name(group)
            .map_err(|e| from_errno(&format!("cannot look up group '{group}'"), e))?
            .ok_or_else(|| AccountError::Unavailable(format!("group '{group}' not found")))?;

        Ok(user.gid == group.gid || group.mem.iter().any(|member| member == name))
    }

    fn add_to_group(&mut self, name: &str, group: &str) -> Result<(), AccountError> {
        let mut command = Command::new("usermod");
        command.args(["--append", "--groups", group, name]);
        run_tool(command, "usermod", None)
    }

    fn set_password(&mut self, name: &str, password: &Secret) -> Result<(), AccountError> {
        let line = format!("{name}:{}\n", password.expose());
        run_tool(Command::new("chpasswd"), "chpasswd", Some(line.as_bytes()))
    }

    fn ensure_directory(&mut self, dir: &DirSpec<'_>) -> Result<(), AccountError> {
        fs::create_dir_all(dir.path).map_err(|e| from_io(dir.path, &e))?;
        chown(dir.path, dir.owner, dir.group)?;
        fs::set_permissions(dir.path, fs::Permissions::from_mode(dir.mode))
            .map_err(|e| from_io(dir.path, &e))
    }

    fn seed_template(
        &mut self,
        template: &Path,
        dest: &Path,
        owner: &str,
        group: &str,
    ) -> Result<bool, AccountError> {
        if INDEX_FILES.iter().any(|index| dest.join(index).exists()) {
            return Ok(false);
        }

        for entry in WalkDir::new(template).min_depth(1).follow_links(false) {
            let entry = entry.map_err(|e| AccountError::Unavailable(e.to_string()))?;
            let Ok(relative) = entry.path().strip_prefix(template) else {
                continue;
            };
            let target = dest.join(relative);
            let file_type = entry.file_type();

            if file_type.is_dir() {
                if !target.exists() {
                    fs::create_dir(&target).map_err(|e| from_io(&target, &e))?;
                    chown(&target, owner, group)?;
                }
            } else if file_type.is_file() && !target.exists() {
                fs::copy(entry.path(), &target).map_err(|e| from_io(&target, &e))?;
                chown(&target, owner, group)?;
            }
        }

        Ok(true)
    }
}

fn chown(path: &Path, owner: &str, group: &str) -> Result<(), AccountError> {
    let uid = User::from_name(owner)
        .map_err(|e| from_errno(&format!("cannot look up account '{owner}'"), e))?
        .ok_or_else(|| AccountError::Unavailable(format!("account '{owner}' not found")))?
        .uid;
    let gid = Group::from_name(group)
        .map_err(|e| from_errno(&format!("cannot look up group '{group}'"), e))?
        .ok_or_else(|| AccountError::Unavailable(format!("group '{group}' not found")))?
        .gid;

    unistd::chown(path, Some(uid), Some(gid))
        .map_err(|e| from_errno(&format!("cannot chown {}", path.display()), e))
}

/// Run an account tool, feeding `stdin` if given, and classify its failure
fn run_tool(mut command: Command, tool: &str, stdin: Option<&[u8]>) -> Result<(), AccountError> {
    command
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::null())
        .stderr(Stdio::piped());

    let mut child = command
        .spawn()
        .map_err(|e| AccountError::Unavailable(format!("failed to execute {tool}: {e}")))?;

    if let (Some(input), Some(mut pipe)) = (stdin, child.stdin.take()) {
        if let Err(e) = pipe.write_all(input) {
            drop(pipe);
            let _ = child.kill();
            let _ = child.wait();
            return Err(AccountError::Unavailable(format!(
                "failed to write to {tool}: {e}"
            )));
        }
    }

    let output = child
        .wait_with_output()
        .map_err(|e| AccountError::Unavailable(format!("failed to wait for {tool}: {e}")))?;
    if output.status.success() {
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    let message = format!("{tool} failed: {}", stderr.trim());
    if stderr.contains("Permission denied") {
        Err(AccountError::PermissionDenied(message))
    } else {
        Err(AccountError::Unavailable(message))
    }
}

fn from_io(path: &Path, err: &std::io::Error) -> AccountError {
    let message = format!("{}: {err}", path.display());
    if err.kind() == ErrorKind::PermissionDenied {
        AccountError::PermissionDenied(message)
    } else {
        AccountError::Unavailable(message)
    }
}

fn from_errno(context: &str, errno: Errno) -> AccountError {
    let message = format!("{context}: {errno}");
    if matches!(errno, Errno::EPERM | Errno::EACCES) {
        AccountError::PermissionDenied(message)
    } else {
        AccountError::Unavailable(message)
    }
}
