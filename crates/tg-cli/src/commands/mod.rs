//! Command implementations

pub mod build;
pub mod clean;

use anyhow::{Context, Result};
use std::path::Path;
use std::process::Command;
use tracing::info;

/// Run ninja inside `tg_path` and return its exit code
pub(crate) fn run_ninja(ninja: &str, tg_path: &Path, extra_args: &[&str]) -> Result<i32> {
    info!(ninja, tg_path = %tg_path.display(), "running ninja");
    let status = Command::new(ninja)
        .arg("-C")
        .arg(tg_path)
        .args(extra_args)
        .status()
        .with_context(|| format!("Failed to run '{ninja}'"))?;
    // Killed by a signal
    Ok(status.code().unwrap_or(1))
}
