use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::state::{ensure_paytally_home, paytally_home};

/// Environment variable that overrides `ledger.url`.
pub const LEDGER_URL_ENV: &str = "PAYTALLY_LEDGER_URL";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub ledger: LedgerSection,
    pub schedule: ScheduleSection,
    pub ingest: IngestSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerSection {
    /// Deployed spreadsheet web-app endpoint.
    pub url: String,
    pub table: String,
    pub settings_table: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleSection {
    /// IANA zone used to decide what day it is.
    pub timezone: String,
    /// 0 = Sunday … 6 = Saturday. Used when the ledger has no setting.
    pub default_payout_weekday: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestSection {
    /// Zone for page timestamps that carry no offset. Unset means UTC.
    pub page_timezone: Option<String>,
    /// Where raw exports are archived (default: ~/.paytally/html_exports).
    pub backup_dir: Option<String>,
}

impl Default for LedgerSection {
    fn default() -> Self {
        Self {
            url: String::new(),
            table: "Work".to_string(),
            settings_table: "Settings".to_string(),
        }
    }
}

impl Default for ScheduleSection {
    fn default() -> Self {
        Self {
            timezone: "America/Chicago".to_string(),
            default_payout_weekday: paytally_sheets::DEFAULT_PAYOUT_WEEKDAY,
        }
    }
}

impl Config {
    /// Apply environment overrides; `lookup` is `std::env::var` outside tests.
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(LEDGER_URL_ENV).filter(|u| !u.trim().is_empty()) {
            self.ledger.url = url.trim().to_string();
        }
        self
    }

    pub fn ledger_url(&self) -> Result<&str> {
        if self.ledger.url.trim().is_empty() {
            bail!(
                "no ledger url configured (set ledger.url in {} or {})",
                config_path_display(),
                LEDGER_URL_ENV
            );
        }
        Ok(self.ledger.url.trim())
    }
}

fn config_path_display() -> String {
    paytally_home()
        .map(|p| p.join("config.toml").display().to_string())
        .unwrap_or_else(|_| "~/.paytally/config.toml".to_string())
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_paytally_home()?.join("config.toml"))
}

pub fn parse_config(s: &str) -> Result<Config> {
    toml::from_str(s).context("parse config.toml")
}

pub fn load_config() -> Result<Config> {
    let p = config_path()?;
    let cfg = if p.exists() {
        let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
        parse_config(&s)?
    } else {
        Config::default()
    };
    Ok(cfg.with_env(|k| std::env::var(k).ok()))
}

pub fn save_config(cfg: &Config) -> Result<()> {
    let p = config_path()?;
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(&Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}
