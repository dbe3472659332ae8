//! `dialer init-config`

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use colored::Colorize;
use dialer_core::DialerConfig;

use super::default_config_path;

pub fn execute(path: Option<PathBuf>, force: bool) -> Result<()> {
    let path = path
        .or_else(default_config_path)
        .context("no configuration directory found; pass a path")?;
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let contents = toml::to_string_pretty(&DialerConfig::default()).context("failed to render configuration")?;
    fs::write(&path, contents).with_context(|| format!("failed to write {}", path.display()))?;

    println!("{} {}", "Wrote".green().bold(), path.display());
    Ok(())
}
