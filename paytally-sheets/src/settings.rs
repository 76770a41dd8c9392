//! Payday setting stored in the ledger's settings tab.

use chrono::Weekday;
use serde_json::Value;
use tracing::{info, warn};

use crate::client::SheetsClient;

/// Settings key holding the payout weekday.
pub const PAYOUT_WEEKDAY_KEY: &str = "payoutWeekday";

/// Tuesday, counting 0 = Sunday … 6 = Saturday.
pub const DEFAULT_PAYOUT_WEEKDAY: u32 = 2;

const DAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// Name for a 0 = Sunday weekday number.
pub fn day_name(weekday: u32) -> &'static str {
    DAY_NAMES.get(weekday as usize).copied().unwrap_or("?")
}

/// Find the payout weekday among `{key, value}` rows.
pub fn parse_payout_weekday(rows: &[Value]) -> Option<u32> {
    rows.iter()
        .find(|r| r.get("key").and_then(Value::as_str) == Some(PAYOUT_WEEKDAY_KEY))
        .and_then(|r| r.get("value"))
        .and_then(|v| match v {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse::<u64>().ok(),
            _ => None,
        })
        .filter(|d| *d < 7)
        .map(|d| d as u32)
}

/// Payout weekday from the settings tab, or `default` when it can't be read.
pub async fn payout_weekday(client: &SheetsClient, settings_table: &str, default: u32) -> u32 {
    match client.fetch_rows(settings_table).await {
        Ok(rows) => match parse_payout_weekday(&rows) {
            Some(day) => {
                info!(payday = day_name(day), "payday from ledger settings");
                day
            }
            None => {
                info!(payday = day_name(default), "no payday setting found, using default");
                default
            }
        },
        Err(e) => {
            warn!(error = %e, payday = day_name(default), "could not read payday setting, using default");
            default
        }
    }
}

/// Whether `today` is the configured payout weekday (0 = Sunday).
pub fn is_payday(payout_weekday: u32, today: Weekday) -> bool {
    today.num_days_from_sunday() == payout_weekday
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_payout_weekday() {
        let rows = vec![
            json!({"key": "hourlyGoal", "value": 30}),
            json!({"key": "payoutWeekday", "value": "4"}),
        ];
        assert_eq!(parse_payout_weekday(&rows), Some(4));
        assert_eq!(parse_payout_weekday(&[json!({"key": "payoutWeekday", "value": 9})]), None);
        assert_eq!(parse_payout_weekday(&[]), None);
    }

    #[test]
    fn test_is_payday_counts_from_sunday() {
        assert!(is_payday(2, Weekday::Tue));
        assert!(is_payday(0, Weekday::Sun));
        assert!(!is_payday(2, Weekday::Mon));
        assert_eq!(day_name(DEFAULT_PAYOUT_WEEKDAY), "Tuesday");
    }
}
