//! Turn raw scraped fields into canonical entries.
//!
//! Malformed fields fall back to safe defaults: an amount that won't parse
//! becomes `0.0` and the entry still flows through, so it surfaces later as a
//! harmless new row instead of disappearing. Only an entry whose timestamp
//! cannot be resolved at all is dropped here.

use anyhow::Result;
use chrono_tz::Tz;
use regex::Regex;
use tracing::{debug, warn};

use crate::entry::{Entry, RawEntry, WorkType, round2};
use crate::time::parse_timestamp;

/// Keep digits, the decimal point and a leading minus; parse what's left.
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a currency string like "$1,234.50" and round to cents. Failure gives `0.0`.
pub fn parse_amount(raw: &str) -> f64 {
    parse_number(raw).map(round2).unwrap_or(0.0)
}

/// Map the page's free-text kind column onto the closed tag set.
pub fn parse_work_type(raw: &str) -> WorkType {
    let s = raw.trim().to_ascii_lowercase();
    if s.contains("task") {
        WorkType::Task
    } else if s.contains("time") || s.contains("project") {
        WorkType::ProjectTime
    } else {
        WorkType::from_tag(&s)
    }
}

/// Converts [`RawEntry`] rows into [`Entry`] values.
#[derive(Debug, Clone)]
pub struct Normalizer {
    hours_re: Regex,
    minutes_re: Regex,
    /// Zone for page timestamps written without an offset. `None` reads them as UTC.
    page_tz: Option<Tz>,
}

impl Normalizer {
    pub fn new(page_tz: Option<Tz>) -> Result<Self> {
        Ok(Self {
            hours_re: Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*h")?,
            minutes_re: Regex::new(r"(?i)(\d+)\s*m")?,
            page_tz,
        })
    }

    /// Hours and minutes are picked out independently, e.g. "1h 30m" → 1.5.
    ///
    /// A bare number with no unit is taken as hours. Nothing usable gives `0.0`.
    pub fn parse_duration_hours(&self, raw: &str) -> f64 {
        let text = raw.trim();
        if text.is_empty() {
            return 0.0;
        }

        let hours = self
            .hours_re
            .captures(text)
            .and_then(|c| c[1].parse::<f64>().ok());
        let minutes = self
            .minutes_re
            .captures(text)
            .and_then(|c| c[1].parse::<f64>().ok());

        match (hours, minutes) {
            (None, None) => text.parse::<f64>().ok().filter(|h| *h >= 0.0).unwrap_or(0.0),
            (h, m) => h.unwrap_or(0.0) + m.unwrap_or(0.0) / 60.0,
        }
    }

    /// Build one entry. Returns `None` only when the timestamp can't be resolved.
    pub fn normalize(&self, raw: &RawEntry) -> Option<Entry> {
        let occurred_at = match parse_timestamp(&raw.occurred_at).and_then(|t| t.to_fixed(self.page_tz)) {
            Some(t) => t,
            None => {
                warn!(
                    timestamp = %raw.occurred_at,
                    amount = %raw.amount,
                    label = %raw.label,
                    "dropping entry with unresolvable timestamp"
                );
                return None;
            }
        };

        let amount = parse_amount(&raw.amount);
        if amount <= 0.0 {
            warn!(
                amount = %raw.amount,
                %occurred_at,
                "entry amount is not a positive value; keeping it as 0.00"
            );
        }

        let entry = Entry::new(amount.max(0.0), parse_work_type(&raw.work_type), occurred_at)
            .with_duration(self.parse_duration_hours(&raw.duration))
            .with_label(raw.label.trim());
        debug!(?entry, "normalized entry");
        Some(entry)
    }

    /// Normalize a batch, dropping entries without a usable timestamp.
    pub fn normalize_all(&self, raws: &[RawEntry]) -> Vec<Entry> {
        raws.iter().filter_map(|r| self.normalize(r)).collect()
    }
}
