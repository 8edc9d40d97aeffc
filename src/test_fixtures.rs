//! In-memory backends and helpers shared by unit tests
//!
//! The doubles implement the same traits as the host backends, so pipeline,
//! account and preflight logic run unchanged against them:
//!
//! ```ignore
//! use crate::test_fixtures::{MemoryAccounts, MemoryDatabase, test_settings};
//!
//! let settings = test_settings();
//! let mut accounts = MemoryAccounts::default();
//! let mut database = MemoryDatabase::default();
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::accounts::{AccountError, AccountStore, DirSpec, NewAccount};
use crate::config::Settings;
use crate::database::{DatabaseBackend, DatabaseError, ResourceState};
use crate::pipeline::RowOutcome;
use crate::preflight::HostProbe;
use crate::secret::Secret;
use crate::ui::ProgressReporter;

/// Settings used across unit tests: chroot enabled, group `sftpusers`
#[must_use]
pub fn test_settings() -> Settings {
    Settings {
        students_root: PathBuf::from("/srv/students"),
        ..Settings::default()
    }
}

/// An account as recorded by [`MemoryAccounts`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Account {
    pub home: PathBuf,
    pub shell: PathBuf,
    pub comment: String,
    pub groups: BTreeSet<String>,
    pub password: Option<String>,
}

/// [`AccountStore`] over plain maps
#[derive(Debug, Default)]
pub struct MemoryAccounts {
    accounts: BTreeMap<String, Account>,
    directories: BTreeMap<PathBuf, (String, String, u32)>,
    seeded: BTreeSet<PathBuf>,
    created: usize,
    denied: bool,
    failing: BTreeSet<String>,
    directories_fail: bool,
}

impl MemoryAccounts {
    pub fn account(&self, name: &str) -> Option<&Account> {
        self.accounts.get(name)
    }

    /// Pre-existing account with the given supplementary groups
    pub fn insert_account(&mut self, name: &str, groups: &[&str]) {
        self.accounts.insert(
            name.to_string(),
            Account {
                groups: groups.iter().map(|g| (*g).to_string()).collect(),
                ..Account::default()
            },
        );
    }

    /// Accounts created through `create_account`
    pub fn created_count(&self) -> usize {
        self.created
    }

    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    /// Owner, group and mode last forced on `path`
    pub fn directory(&self, path: &Path) -> Option<(String, String, u32)> {
        self.directories.get(path).cloned()
    }

    /// Every mutation fails as if the process were unprivileged
    pub fn deny_all(&mut self) {
        self.denied = true;
    }

    /// Mutations for `name` fail with a row-level error
    pub fn fail_for(&mut self, name: &str) {
        self.failing.insert(name.to_string());
    }

    /// `ensure_directory` fails with a row-level error
    pub fn fail_directories(&mut self) {
        self.directories_fail = true;
    }

    fn check(&self, name: &str) -> Result<(), AccountError> {
        if self.denied {
            return Err(AccountError::PermissionDenied(format!(
                "cannot modify account '{name}'"
            )));
        }
        if self.failing.contains(name) {
            return Err(AccountError::Unavailable(format!(
                "cannot lock /etc/passwd for '{name}'"
            )));
        }
        Ok(())
    }
}

impl AccountStore for MemoryAccounts {
    fn account_exists(&self, name: &str) -> Result<bool, AccountError> {
        Ok(self.accounts.contains_key(name))
    }

    fn create_account(&mut self, account: &NewAccount<'_>) -> Result<(), AccountError> {
        self.check(account.name)?;
        self.accounts.insert(
            account.name.to_string(),
            Account {
                home: account.home.to_path_buf(),
                shell: account.shell.to_path_buf(),
                comment: account.comment.to_string(),
                groups: BTreeSet::from([account.group.to_string()]),
                password: None,
            },
        );
        self.created += 1;
        Ok(())
    }

    fn is_member(&self, name: &str, group: &str) -> Result<bool, AccountError> {
        Ok(self
            .accounts
            .get(name)
            .is_some_and(|account| account.groups.contains(group)))
    }

    fn add_to_group(&mut self, name: &str, group: &str) -> Result<(), AccountError> {
        self.check(name)?;
        let account = self
            .accounts
            .get_mut(name)
            .ok_or_else(|| AccountError::Unavailable(format!("no account '{name}'")))?;
        account.groups.insert(group.to_string());
        Ok(())
    }

    fn set_password(&mut self, name: &str, password: &Secret) -> Result<(), AccountError> {
        self.check(name)?;
        let account = self
            .accounts
            .get_mut(name)
            .ok_or_else(|| AccountError::Unavailable(format!("no account '{name}'")))?;
        account.password = Some(password.expose().to_string());
        Ok(())
    }

    fn ensure_directory(&mut self, dir: &DirSpec<'_>) -> Result<(), AccountError> {
        if self.denied {
            return Err(AccountError::PermissionDenied(format!(
                "cannot chown {}",
                dir.path.display()
            )));
        }
        if self.directories_fail {
            return Err(AccountError::Unavailable(format!(
                "cannot create {}: read-only file system",
                dir.path.display()
            )));
        }
        self.directories.insert(
            dir.path.to_path_buf(),
            (dir.owner.to_string(), dir.group.to_string(), dir.mode),
        );
        Ok(())
    }

    fn seed_template(
        &mut self,
        _template: &Path,
        dest: &Path,
        _owner: &str,
        _group: &str,
    ) -> Result<bool, AccountError> {
        Ok(self.seeded.insert(dest.to_path_buf()))
    }
}

/// [`DatabaseBackend`] over plain maps
#[derive(Debug)]
pub struct MemoryDatabase {
    schemas: BTreeSet<String>,
    users: BTreeMap<String, String>,
    grants: BTreeSet<String>,
    live: bool,
    failing: BTreeSet<String>,
    lose_connection_on: Option<String>,
}

impl Default for MemoryDatabase {
    fn default() -> Self {
        Self {
            schemas: BTreeSet::new(),
            users: BTreeMap::new(),
            grants: BTreeSet::new(),
            live: true,
            failing: BTreeSet::new(),
            lose_connection_on: None,
        }
    }
}

impl MemoryDatabase {
    /// A server that refuses every connection
    pub fn offline() -> Self {
        Self {
            live: false,
            ..Self::default()
        }
    }

    pub fn schema_exists(&self, id: &str) -> bool {
        self.schemas.contains(id)
    }

    pub fn user_password(&self, id: &str) -> Option<&str> {
        self.users.get(id).map(String::as_str)
    }

    pub fn has_grant(&self, id: &str) -> bool {
        self.grants.contains(id)
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    /// Statements for `id` fail on a live connection
    pub fn fail_for(&mut self, id: &str) {
        self.failing.insert(id.to_string());
    }

    /// Undo every `fail_for`
    pub fn heal(&mut self) {
        self.failing.clear();
    }

    /// The connection drops while provisioning `id`
    pub fn lose_connection_at(&mut self, id: &str) {
        self.lose_connection_on = Some(id.to_string());
    }
}

impl DatabaseBackend for MemoryDatabase {
    fn verify_connectivity(&mut self) -> Result<(), DatabaseError> {
        if self.live {
            Ok(())
        } else {
            Err(DatabaseError::ConnectionLost(
                "ERROR 2002 (HY000): Can't connect to local MySQL server".to_string(),
            ))
        }
    }

    fn user_exists(&mut self, id: &str) -> Result<bool, DatabaseError> {
        self.verify_connectivity()?;
        Ok(self.users.contains_key(id))
    }

    fn ensure_resource(
        &mut self,
        id: &str,
        password: &Secret,
        reset_password: bool,
    ) -> Result<ResourceState, DatabaseError> {
        self.verify_connectivity()?;
        if self.lose_connection_on.as_deref() == Some(id) {
            self.live = false;
            return Err(DatabaseError::ConnectionLost(
                "ERROR 2013 (HY000): Lost connection to MySQL server during query".to_string(),
            ));
        }
        if self.failing.contains(id) {
            return Err(DatabaseError::Statement(format!(
                "ERROR 1396 (HY000): Operation CREATE USER failed for '{id}'@'localhost'"
            )));
        }

        self.schemas.insert(id.to_string());
        let user_created = !self.users.contains_key(id);
        let password_set = user_created || reset_password;
        if password_set {
            self.users
                .insert(id.to_string(), password.expose().to_string());
        }
        self.grants.insert(id.to_string());

        Ok(ResourceState {
            user_created,
            password_set,
        })
    }
}

/// [`HostProbe`] with a fixed answer set
#[derive(Debug, Clone, Default)]
pub struct StaticProbe {
    pub privileged: bool,
    pub tools: BTreeSet<String>,
    pub groups: BTreeSet<String>,
    pub directories: BTreeSet<PathBuf>,
}

impl StaticProbe {
    /// A host on which every check for `settings` passes
    pub fn ready(settings: &Settings) -> Self {
        let mut directories =
            BTreeSet::from([settings.students_root.clone(), settings.report_dir.clone()]);
        if let Some(template) = &settings.template_dir {
            directories.insert(template.clone());
        }
        Self {
            privileged: true,
            tools: ["useradd", "usermod", "chpasswd"]
                .into_iter()
                .map(String::from)
                .collect(),
            groups: BTreeSet::from([settings.group.clone()]),
            directories,
        }
    }
}

impl HostProbe for StaticProbe {
    fn is_privileged(&self) -> bool {
        self.privileged
    }

    fn find_tool(&self, name: &str) -> Option<PathBuf> {
        self.tools
            .contains(name)
            .then(|| PathBuf::from("/usr/sbin").join(name))
    }

    fn group_exists(&self, name: &str) -> bool {
        self.groups.contains(name)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.directories.contains(path)
    }
}

/// [`ProgressReporter`] that keeps every event as a line of text
#[derive(Debug, Default)]
pub struct RecordingReporter {
    pub events: Vec<String>,
}

impl RecordingReporter {
    pub fn contains(&self, needle: &str) -> bool {
        self.events.iter().any(|event| event.contains(needle))
    }
}

impl ProgressReporter for RecordingReporter {
    fn begin(&mut self, total: usize) {
        self.events.push(format!("begin {total}"));
    }

    fn row_started(&mut self, student_id: &str) {
        self.events.push(format!("row {student_id}"));
    }

    fn row_finished(&mut self, outcome: &RowOutcome) {
        let student_id = match outcome {
            RowOutcome::Skipped { student_id, .. } => student_id,
            RowOutcome::Provisioned(outcome) => &outcome.student_id,
        };
        self.events.push(format!("done {student_id}"));
    }

    fn notice(&mut self, message: &str) {
        self.events.push(format!("notice {message}"));
    }

    fn finish(&mut self) {
        self.events.push("finish".to_string());
    }

    fn abandon(&mut self, message: &str) {
        self.events.push(format!("abandon {message}"));
    }
}
