//! Version command implementation

use std::fmt::Write;
use std::path::{Path, PathBuf};

use crate::config::DEFAULT_CONFIG_PATH;
use crate::error::Result;
use crate::preflight::ACCOUNT_TOOLS;

/// Run version command
pub fn run(config: Option<PathBuf>) -> Result<()> {
    print!("{}", render(config.as_deref()));
    Ok(())
}

/// Version banner plus the host-facing settings an operator asks about first
fn render(config: Option<&Path>) -> String {
    let (path, origin) = match config {
        Some(path) => (path, "given"),
        None => (Path::new(DEFAULT_CONFIG_PATH), "default"),
    };
    let state = if path.is_file() {
        "present"
    } else if origin == "default" {
        "absent, built-in defaults apply"
    } else {
        "missing"
    };

    let mut out = String::new();
    let _ = writeln!(out, "hostprov {}", env!("CARGO_PKG_VERSION"));
    let _ = writeln!(out);
    let _ = writeln!(out, "Build info:");
    let _ = writeln!(out, "  Minimum Rust version: {}", env!("CARGO_PKG_RUST_VERSION"));
    let _ = writeln!(out, "  Profile: {}", build_profile());
    let _ = writeln!(out);
    let _ = writeln!(out, "Host:");
    let _ = writeln!(out, "  Config ({origin}): {} ({state})", path.display());
    let _ = writeln!(out, "  Account tools: {}", ACCOUNT_TOOLS.join(", "));
    let _ = writeln!(out, "  Database driver: sqlx (MySQL/MariaDB)");
    out
}

fn build_profile() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "release"
    }
}
