use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub fn paytally_home() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".paytally"))
}

pub fn ensure_paytally_home() -> Result<PathBuf> {
    let dir = paytally_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

pub fn default_backup_dir() -> Result<PathBuf> {
    Ok(paytally_home()?.join("html_exports"))
}

/// Expand a leading `~/` against `$HOME`.
pub fn expand_home(path: &str) -> Result<PathBuf> {
    match path.strip_prefix("~/") {
        Some(rest) => {
            let home = std::env::var("HOME").context("HOME is not set")?;
            Ok(Path::new(&home).join(rest))
        }
        None => Ok(PathBuf::from(path)),
    }
}
