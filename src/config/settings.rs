//! Provisioning settings (config.yaml) data structures
//!
//! One `Settings` value is built per invocation: defaults, then the YAML file,
//! then command-line overrides. It is passed explicitly to every component.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, config};
use crate::secret::{DEFAULT_SECRET_LEN, MIN_SECRET_LEN};

/// Settings file read when `--config` is not given; absent is fine
pub const DEFAULT_CONFIG_PATH: &str = "/etc/hostprov/config.yaml";

/// When account and database passwords are replaced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum RotationPolicy {
    /// Every run sets fresh passwords, including for existing accounts
    #[default]
    Always,
    /// Only newly created accounts and database users get passwords
    OnCreate,
}

/// Top-level settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Parent of every student home directory
    pub students_root: PathBuf,

    /// Shared supplementary group; also the SFTP `Match Group`
    pub group: String,

    /// Default web content copied into an empty `public_html`
    pub template_dir: Option<PathBuf>,

    /// Where credential reports are written
    pub report_dir: PathBuf,

    /// Host name used to print each student's web URL
    pub domain: Option<String>,

    pub rotation: RotationPolicy,

    pub secret_length: usize,

    /// Login shell of provisioned accounts
    pub nologin_shell: PathBuf,

    pub database: DatabaseSettings,

    pub sftp: SftpSettings,
}

/// Administrative database connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseSettings {
    pub admin_user: String,
    pub admin_host: String,
    pub port: u16,
    /// Unix socket used instead of TCP when set (needed for socket authentication)
    pub socket: Option<PathBuf>,
    /// Host part of every provisioned `'user'@'host'`
    pub grant_host: String,
    /// File holding the administrator password (first line)
    pub password_file: Option<PathBuf>,
    pub connect_timeout_secs: u64,
    /// Upper bound for one identity's statement batch
    pub statement_timeout_secs: u64,
}

/// SFTP restriction block in the sshd configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SftpSettings {
    pub config_path: PathBuf,
    /// Jail users into their home directory (`ChrootDirectory %h`)
    pub chroot: bool,
    /// Directory for timestamped backups; defaults to the config's own directory
    pub backup_dir: Option<PathBuf>,
    /// Run after the block changed; empty disables the reload
    pub reload_command: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            students_root: PathBuf::from("/home/students"),
            group: "sftpusers".to_string(),
            template_dir: None,
            report_dir: PathBuf::from("."),
            domain: None,
            rotation: RotationPolicy::default(),
            secret_length: DEFAULT_SECRET_LEN,
            nologin_shell: PathBuf::from("/usr/sbin/nologin"),
            database: DatabaseSettings::default(),
            sftp: SftpSettings::default(),
        }
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            admin_user: "root".to_string(),
            admin_host: "localhost".to_string(),
            port: 3306,
            socket: None,
            grant_host: "localhost".to_string(),
            password_file: None,
            connect_timeout_secs: 10,
            statement_timeout_secs: 30,
        }
    }
}

impl Default for SftpSettings {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from("/etc/ssh/sshd_config"),
            chroot: true,
            backup_dir: None,
            reload_command: vec![
                "systemctl".to_string(),
                "reload".to_string(),
                "sshd".to_string(),
            ],
        }
    }
}

impl Settings {
    /// Load settings from `path`, or from [`DEFAULT_CONFIG_PATH`] when it exists
    ///
    /// An explicitly given path must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let settings = match path {
            Some(path) => {
                if !path.is_file() {
                    return Err(config::not_found(path.display().to_string()));
                }
                Self::from_file(path)?
            }
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_PATH);
                if default_path.is_file() {
                    Self::from_file(default_path)?
                } else {
                    Self::default()
                }
            }
        };

        settings.validate()?;
        Ok(settings)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| config::read_failed(path.display().to_string(), e.to_string()))?;
        Self::from_yaml(&yaml)
            .map_err(|e| config::parse_failed(path.display().to_string(), e.to_string()))
    }

    /// Parse settings from a YAML string
    pub fn from_yaml(yaml: &str) -> std::result::Result<Self, serde_yaml::Error> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml)
    }

    /// Reject settings no run could succeed with
    pub fn validate(&self) -> Result<()> {
        if !self.students_root.is_absolute() {
            return Err(config::invalid(format!(
                "students_root must be an absolute path, got '{}'",
                self.students_root.display()
            )));
        }
        if self.group.trim().is_empty() {
            return Err(config::invalid("group must not be empty"));
        }
        if self.secret_length < MIN_SECRET_LEN {
            return Err(config::invalid(format!(
                "secret_length must be at least {MIN_SECRET_LEN}, got {}",
                self.secret_length
            )));
        }
        if self.database.admin_user.trim().is_empty() {
            return Err(config::invalid("database.admin_user must not be empty"));
        }
        if self.database.connect_timeout_secs == 0 || self.database.statement_timeout_secs == 0 {
            return Err(config::invalid(
                "database timeouts must be greater than zero",
            ));
        }
        if self
            .sftp
            .reload_command
            .first()
            .is_some_and(|program| program.trim().is_empty())
        {
            return Err(config::invalid("sftp.reload_command has an empty program"));
        }
        Ok(())
    }

    /// Home directory of a canonical identity
    pub fn home_of(&self, id: &str) -> PathBuf {
        self.students_root.join(id)
    }

    /// Public web URL of a canonical identity, when a domain is configured
    pub fn web_url_of(&self, id: &str) -> Option<String> {
        self.domain
            .as_deref()
            .map(|domain| format!("http://{domain}/~{id}/"))
    }

    /// Run lock shared by every provisioning run on this host
    pub fn run_lock_path(&self) -> PathBuf {
        self.students_root.join(".hostprov.lock")
    }
}
