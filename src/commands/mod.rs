//! Command implementations for hostprov CLI

pub mod completions;
pub mod configure_sftp;
pub mod provision;
pub mod upsert_block;
pub mod version;
