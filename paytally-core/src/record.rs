//! Ledger records as stored in the spreadsheet, plus partial updates to them.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::entry::{WorkType, to_cents};

/// A ledger row. Optional spreadsheet cells are explicit fields with zero/empty defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    #[serde(default, deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::number")]
    pub earnings: f64,
    #[serde(rename = "type", default = "unknown_type", deserialize_with = "lenient::work_type")]
    pub work_type: WorkType,
    #[serde(
        default,
        deserialize_with = "lenient::timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub submitted_at: Option<DateTime<FixedOffset>>,
    #[serde(
        default,
        deserialize_with = "lenient::date",
        skip_serializing_if = "Option::is_none"
    )]
    pub date: Option<NaiveDate>,
    /// Hours. Zero means unknown.
    #[serde(default, deserialize_with = "lenient::number")]
    pub duration: f64,
    #[serde(default, deserialize_with = "lenient::string")]
    pub notes: String,
    #[serde(default, deserialize_with = "lenient::number")]
    pub hourly_rate: f64,
}

fn unknown_type() -> WorkType {
    WorkType::Unknown
}

impl Record {
    pub fn new(id: impl Into<String>, earnings: f64, work_type: WorkType) -> Self {
        Self {
            id: id.into(),
            earnings,
            work_type,
            submitted_at: None,
            date: None,
            duration: 0.0,
            notes: String::new(),
            hourly_rate: 0.0,
        }
    }

    pub fn with_submitted_at(mut self, at: DateTime<FixedOffset>) -> Self {
        self.submitted_at = Some(at);
        self
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn with_duration(mut self, hours: f64) -> Self {
        self.duration = hours;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// Earnings in whole cents.
    pub fn cents(&self) -> i64 {
        to_cents(self.earnings)
    }

    /// Stored submission time, in UTC.
    pub fn submitted_at_utc(&self) -> Option<DateTime<Utc>> {
        self.submitted_at.map(|t| t.with_timezone(&Utc))
    }

    /// Instant used for the matching window: `submittedAt`, else `date` at midnight UTC.
    pub fn window_time(&self) -> Option<DateTime<Utc>> {
        self.submitted_at_utc().or_else(|| {
            self.date
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|ndt| ndt.and_utc())
        })
    }

    pub fn has_duration(&self) -> bool {
        self.duration > 0.0
    }

    pub fn has_notes(&self) -> bool {
        !self.notes.trim().is_empty()
    }
}

/// Partial update for an existing record. `None` fields are left untouched.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPatch {
    pub submitted_at: DateTime<FixedOffset>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hourly_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl RecordPatch {
    pub fn new(submitted_at: DateTime<FixedOffset>) -> Self {
        Self {
            submitted_at,
            duration: None,
            hourly_rate: None,
            notes: None,
        }
    }

    /// Names of the fields this patch writes, for reporting.
    pub fn fields(&self) -> Vec<&'static str> {
        let mut out = vec!["submittedAt"];
        if self.duration.is_some() {
            out.push("duration");
        }
        if self.hourly_rate.is_some() {
            out.push("hourlyRate");
        }
        if self.notes.is_some() {
            out.push("notes");
        }
        out
    }

    /// Apply to a local copy of the record.
    pub fn apply_to(&self, record: &mut Record) {
        record.submitted_at = Some(self.submitted_at);
        if let Some(d) = self.duration {
            record.duration = d;
        }
        if let Some(r) = self.hourly_rate {
            record.hourly_rate = r;
        }
        if let Some(n) = &self.notes {
            record.notes = n.clone();
        }
    }
}

/// Spreadsheet cells come back as numbers, strings, blanks or nulls.
/// These readers accept all of them and fall back to defaults.
mod lenient {
    use chrono::{DateTime, FixedOffset, NaiveDate};
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use crate::entry::WorkType;
    use crate::normalize::parse_number;
    use crate::time::{parse_date, parse_timestamp};

    pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => String::new(),
        })
    }

    pub fn number<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Number(n) => n.as_f64().unwrap_or(0.0),
            Value::String(s) => parse_number(&s).unwrap_or(0.0),
            _ => 0.0,
        })
    }

    pub fn work_type<'de, D: Deserializer<'de>>(d: D) -> Result<WorkType, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::String(s) => WorkType::from_tag(&s),
            _ => WorkType::Unknown,
        })
    }

    pub fn timestamp<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Option<DateTime<FixedOffset>>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::String(s) => parse_timestamp(&s).and_then(|t| t.to_fixed(None)),
            _ => None,
        })
    }

    pub fn date<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::String(s) => parse_date(&s),
            _ => None,
        })
    }
}
