use std::path::PathBuf;

use anyhow::{Context, Result};

/// Directory the running executable lives in. Default locations for the store and the output
/// notes are derived from it.
pub fn install_dir() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("Couldn't locate the running executable")?;
    exe.parent()
        .map(|v| v.to_path_buf())
        .context("Executable path has no parent directory")
}
