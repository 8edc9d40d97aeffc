//! Operations module for provisioning and configuration
//!
//! This module provides high-level operations that coordinate:
//! - ProvisionOperation: Batch provisioning workflow
//! - ConfigureSftpOperation: SFTP restriction in sshd_config
//!
//! The operations coordinate with:
//! - Preflight: Host preconditions (from preflight module)
//! - Pipeline: Per-row provisioning (from pipeline module)
//! - Report: Credential report (from report module)
//! - Reconciler: Config-block upsert (from reconcile module)
//! - UI: Progress reporting (from ui module)

pub mod configure_sftp;
pub mod provision;

pub use configure_sftp::{ConfigureSftpOperation, ConfigureSftpOptions};
pub use provision::{ProvisionOperation, ProvisionOptions};
