//! Time utilities: lenient timestamp parsing with explicit naive/zoned handling.

use anyhow::Result;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Layouts accepted for timestamps without an offset.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%b %d, %Y, %I:%M %p",
    "%b %d, %Y %I:%M %p",
    "%B %d, %Y, %I:%M %p",
    "%B %d, %Y %I:%M %p",
    "%m/%d/%Y %I:%M %p",
    "%m/%d/%Y %H:%M",
];

/// Layouts accepted for bare calendar dates (resolved to midnight).
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%b %d, %Y", "%B %d, %Y", "%m/%d/%Y"];

/// A timestamp as it was written: with an offset, or without one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedTime {
    Zoned(DateTime<FixedOffset>),
    Naive(NaiveDateTime),
}

impl ParsedTime {
    /// Comparison instant. A naive value is read as UTC.
    pub fn to_utc(self) -> DateTime<Utc> {
        match self {
            ParsedTime::Zoned(dt) => dt.with_timezone(&Utc),
            ParsedTime::Naive(ndt) => Utc.from_utc_datetime(&ndt),
        }
    }

    /// Attach an offset. Naive values are placed in `tz` when given, else UTC.
    ///
    /// Returns `None` only for local times that do not exist in `tz` (DST gap).
    pub fn to_fixed(self, tz: Option<Tz>) -> Option<DateTime<FixedOffset>> {
        match (self, tz) {
            (ParsedTime::Zoned(dt), _) => Some(dt),
            (ParsedTime::Naive(ndt), Some(tz)) => tz
                .from_local_datetime(&ndt)
                .earliest()
                .map(|dt| dt.fixed_offset()),
            (ParsedTime::Naive(ndt), None) => Some(Utc.from_utc_datetime(&ndt).fixed_offset()),
        }
    }
}

/// Parse a timestamp in any of the layouts the payments page and the ledger emit.
pub fn parse_timestamp(raw: &str) -> Option<ParsedTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(ParsedTime::Zoned(dt));
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S %z") {
        return Some(ParsedTime::Zoned(dt));
    }

    for fmt in NAIVE_FORMATS {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(ParsedTime::Naive(ndt));
        }
    }

    parse_date(s)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(ParsedTime::Naive)
}

/// Parse a bare calendar date. Full timestamps are cut to their date portion.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    // Sheets sometimes hands a date cell back as a full ISO timestamp.
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive())
}

/// Parse an IANA zone name like "America/Chicago".
pub fn parse_tz(name: &str) -> Result<Tz> {
    name.parse()
        .map_err(|_| anyhow::anyhow!("invalid timezone: {name}"))
}

/// Absolute distance between two instants.
pub fn abs_diff(a: DateTime<Utc>, b: DateTime<Utc>) -> chrono::Duration {
    (a - b).abs()
}
