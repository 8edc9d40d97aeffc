//! Configuration file handling for hostprov
//!
//! This module contains data structures for:
//! - `config.yaml` - Provisioning settings (paths, group, database, SFTP)

pub mod settings;

// Re-export commonly used types
pub use settings::{DEFAULT_CONFIG_PATH, DatabaseSettings, RotationPolicy, Settings, SftpSettings};
