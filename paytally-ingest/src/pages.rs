//! Multi-page exports: combine captured tables, read them back, keep backups.

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Wrap captured `<table>` fragments into one document.
pub fn combine_pages<S: AsRef<str>>(pages: &[S]) -> String {
    if let [only] = pages {
        return format!("<html><body>{}</body></html>", only.as_ref());
    }

    let mut combined = String::from("<html><body>\n");
    for (i, part) in pages.iter().enumerate() {
        combined.push_str(&format!("<!-- Page {} -->\n{}\n", i + 1, part.as_ref()));
    }
    combined.push_str("</body></html>");
    combined
}

/// Read saved exports, in the order given.
pub fn read_exports(paths: &[PathBuf]) -> Result<Vec<String>> {
    paths
        .iter()
        .map(|p| fs::read_to_string(p).with_context(|| format!("read {}", p.display())))
        .collect()
}

/// Write `html` to `<dir>/payments_<timestamp>.html`, creating `dir` if needed.
pub fn save_backup(dir: &Path, html: &str, now: NaiveDateTime) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    let path = dir.join(format!("payments_{}.html", now.format("%Y-%m-%d_%H%M%S")));
    fs::write(&path, html).with_context(|| format!("write {}", path.display()))?;
    info!(path = %path.display(), bytes = html.len(), "saved HTML backup");
    Ok(path)
}
