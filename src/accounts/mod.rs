//! Operating-system accounts
//!
//! [`AccountStore`] is the narrow boundary over the host's account database
//! and file ownership primitives. [`ensure_account`] builds the idempotent
//! provisioning step on top of it: create or adopt the account, make the
//! home and `public_html` directories, seed default web content and rotate
//! the password.

pub mod system;

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::{RotationPolicy, Settings};
use crate::identity::CanonicalIdentity;
use crate::secret::{self, Secret};

pub use system::SystemAccounts;

/// Name of the web directory inside each home
pub const PUBLIC_HTML: &str = "public_html";

/// Files whose presence means `public_html` already has content
pub const INDEX_FILES: &[&str] = &["index.html", "index.htm", "index.php"];

/// Failure of a single account operation
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AccountError {
    /// The account database or file system rejected the change
    #[error("account store unavailable: {0}")]
    Unavailable(String),

    /// The process lacks the privilege to change accounts at all
    #[error("permission denied: {0}")]
    PermissionDenied(String),
}

impl AccountError {
    /// Fatal errors abort the whole run: no later row can succeed either
    pub fn is_fatal(&self) -> bool {
        matches!(self, AccountError::PermissionDenied(_))
    }
}

/// Stage covering lookup, group membership and creation
const ACCOUNT_STAGE: &str = "account";

/// Failure of [`ensure_account`], with how far it got
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountFailure {
    pub error: AccountError,
    /// Step that failed
    pub stage: &'static str,
    /// The account was created by this run before the failure
    pub created: bool,
}

impl AccountFailure {
    pub fn is_fatal(&self) -> bool {
        self.error.is_fatal()
    }
}

impl fmt::Display for AccountFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.stage == ACCOUNT_STAGE {
            write!(f, "{}", self.error)
        } else {
            write!(f, "{}: {}", self.stage, self.error)
        }
    }
}

impl std::error::Error for AccountFailure {}

/// Parameters for a new account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount<'a> {
    pub name: &'a str,
    pub home: &'a Path,
    pub shell: &'a Path,
    pub group: &'a str,
    pub comment: &'a str,
}

/// Desired owner and mode of a directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirSpec<'a> {
    pub path: &'a Path,
    pub owner: &'a str,
    pub group: &'a str,
    pub mode: u32,
}

/// Primitive account operations provided by the host
pub trait AccountStore {
    fn account_exists(&self, name: &str) -> Result<bool, AccountError>;

    /// Create an account with the given home, shell, supplementary group and comment
    fn create_account(&mut self, account: &NewAccount<'_>) -> Result<(), AccountError>;

    fn is_member(&self, name: &str, group: &str) -> Result<bool, AccountError>;

    /// Add a supplementary group, keeping every existing membership
    fn add_to_group(&mut self, name: &str, group: &str) -> Result<(), AccountError>;

    fn set_password(&mut self, name: &str, password: &Secret) -> Result<(), AccountError>;

    /// Create the directory if needed and force its owner and mode
    fn ensure_directory(&mut self, dir: &DirSpec<'_>) -> Result<(), AccountError>;

    /// Copy `template` into `dest` unless `dest` already holds an index file
    ///
    /// Never overwrites existing files. Returns whether anything was seeded.
    fn seed_template(
        &mut self,
        template: &Path,
        dest: &Path,
        owner: &str,
        group: &str,
    ) -> Result<bool, AccountError>;
}

/// What `ensure_account` did for one identity
#[derive(Debug)]
pub struct AccountOutcome {
    pub home: PathBuf,
    /// New password, or `None` when rotation was skipped
    pub password: Option<Secret>,
    /// The account did not exist before this run
    pub created: bool,
    /// Default web content was copied
    pub seeded: bool,
}

/// Create or adopt the account for `identity` and bring it to the desired state
pub fn ensure_account(
    store: &mut dyn AccountStore,
    settings: &Settings,
    identity: &CanonicalIdentity,
) -> Result<AccountOutcome, AccountFailure> {
    let id = identity.id.as_str();
    let group = settings.group.as_str();
    let home = settings.home_of(id);

    let created = adopt_or_create(store, settings, identity, &home).map_err(|error| {
        AccountFailure {
            error,
            stage: ACCOUNT_STAGE,
            created: false,
        }
    })?;
    let failed = |stage: &'static str| {
        move |error: AccountError| AccountFailure {
            error,
            stage,
            created,
        }
    };

    // sshd refuses to chroot into a directory the user can write to
    let home_dir = if settings.sftp.chroot {
        DirSpec {
            path: &home,
            owner: "root",
            group: "root",
            mode: 0o755,
        }
    } else {
        DirSpec {
            path: &home,
            owner: id,
            group,
            mode: 0o711,
        }
    };
    store
        .ensure_directory(&home_dir)
        .map_err(failed("home directory"))?;

    let public_html = home.join(PUBLIC_HTML);
    store
        .ensure_directory(&DirSpec {
            path: &public_html,
            owner: id,
            group,
            mode: 0o755,
        })
        .map_err(failed("web directory"))?;

    let seeded = match &settings.template_dir {
        Some(template) => store
            .seed_template(template, &public_html, id, group)
            .map_err(failed("web template"))?,
        None => false,
    };

    let password = if created || settings.rotation == RotationPolicy::Always {
        let password = secret::generate(settings.secret_length);
        store
            .set_password(id, &password)
            .map_err(failed("password"))?;
        Some(password)
    } else {
        None
    };

    Ok(AccountOutcome {
        home,
        password,
        created,
        seeded,
    })
}

/// Make sure the account exists and is in the group; true when it was created
fn adopt_or_create(
    store: &mut dyn AccountStore,
    settings: &Settings,
    identity: &CanonicalIdentity,
    home: &Path,
) -> Result<bool, AccountError> {
    let id = identity.id.as_str();
    let group = settings.group.as_str();

    if store.account_exists(id)? {
        if store.is_member(id, group)? {
            tracing::debug!(account = id, group, "account already in group");
        } else {
            store.add_to_group(id, group)?;
            tracing::info!(account = id, group, "added existing account to group");
        }
        return Ok(false);
    }

    store.create_account(&NewAccount {
        name: id,
        home,
        shell: &settings.nologin_shell,
        group,
        comment: &identity.display_name,
    })?;
    tracing::info!(account = id, home = %home.display(), "created account");
    Ok(true)
}
