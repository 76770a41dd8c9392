//! Observed payment entries: the raw scraped shape and the canonical shape.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

/// Kind of paid work. Entries and records only pair when their kinds agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkType {
    #[serde(rename = "project-time")]
    ProjectTime,
    #[serde(rename = "task")]
    Task,
    #[serde(rename = "unknown", other)]
    Unknown,
}

impl WorkType {
    /// Ledger tag, as stored in the `type` column.
    pub fn as_tag(&self) -> &'static str {
        match self {
            WorkType::ProjectTime => "project-time",
            WorkType::Task => "task",
            WorkType::Unknown => "unknown",
        }
    }

    /// Read a ledger tag. Unrecognized tags become `Unknown`.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "project-time" | "project_time" | "project" | "time" => WorkType::ProjectTime,
            "task" => WorkType::Task,
            _ => WorkType::Unknown,
        }
    }

    /// Same known kind. `Unknown` never agrees with anything, itself included.
    pub fn agrees_with(&self, other: &WorkType) -> bool {
        *self != WorkType::Unknown && self == other
    }
}

/// Fields exactly as they were read off the payments page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEntry {
    /// Currency text, e.g. "$12.50"
    pub amount: String,
    /// Kind text, e.g. "Task" or "Project Time"
    pub work_type: String,
    /// Submission timestamp text
    pub occurred_at: String,
    /// Free-text duration, e.g. "1h 30m"
    pub duration: String,
    /// Project name or other grouping label
    pub label: String,
}

/// A freshly observed payment, normalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Rounded to cents.
    pub amount: f64,
    pub work_type: WorkType,
    pub occurred_at: DateTime<FixedOffset>,
    /// Hours. Zero means unknown.
    pub duration: f64,
    pub label: String,
}

impl Entry {
    pub fn new(amount: f64, work_type: WorkType, occurred_at: DateTime<FixedOffset>) -> Self {
        Self {
            amount: round2(amount),
            work_type,
            occurred_at,
            duration: 0.0,
            label: String::new(),
        }
    }

    pub fn with_duration(mut self, hours: f64) -> Self {
        self.duration = hours.max(0.0);
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn occurred_at_utc(&self) -> DateTime<Utc> {
        self.occurred_at.with_timezone(&Utc)
    }

    /// Amount in whole cents, the resolution used for matching.
    pub fn cents(&self) -> i64 {
        to_cents(self.amount)
    }

    /// `amount / duration` rounded to cents, or zero when the duration is unknown.
    pub fn hourly_rate(&self) -> f64 {
        if self.duration > 0.0 {
            round2(self.amount / self.duration)
        } else {
            0.0
        }
    }
}

/// Round a currency value to 2 decimals.
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Currency value in whole cents.
pub fn to_cents(v: f64) -> i64 {
    (v * 100.0).round() as i64
}
