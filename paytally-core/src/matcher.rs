//! Pair observed entries with ledger records.
//!
//! A record is a candidate for an entry when it is unused in this run, has
//! the same earnings at cent resolution, the same kind, and a window time no
//! more than [`MATCH_WINDOW_DAYS`] away from the entry. The closest candidate
//! wins; equal distances go to the record seen first in the snapshot.

use std::collections::HashSet;

use chrono::Duration;
use tracing::{debug, info};

use crate::entry::Entry;
use crate::record::Record;
use crate::snapshot::LedgerSnapshot;
use crate::time::abs_diff;

/// Maximum distance between an entry and a record's window time, inclusive.
pub const MATCH_WINDOW_DAYS: i64 = 3;

/// Record ids already consumed in the current run.
#[derive(Debug, Clone, Default)]
pub struct UsedRecords {
    ids: HashSet<String>,
}

impl UsedRecords {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Returns false when the id was already used.
    pub fn mark(&mut self, id: &str) -> bool {
        self.ids.insert(id.to_string())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// One entry paired with one record, both by index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pairing {
    pub entry: usize,
    pub record: usize,
}

/// Distance from `entry` to `record` if the record may pair with it.
fn candidate_distance(entry: &Entry, record: &Record, used: &UsedRecords) -> Option<Duration> {
    if used.contains(&record.id) {
        return None;
    }
    // A zero amount is an unreadable payout; it must never claim a record.
    if entry.cents() <= 0 || record.cents() != entry.cents() {
        return None;
    }
    if !record.work_type.agrees_with(&entry.work_type) {
        return None;
    }
    let at = record.window_time()?;
    let diff = abs_diff(at, entry.occurred_at_utc());
    (diff <= Duration::days(MATCH_WINDOW_DAYS)).then_some(diff)
}

/// Best unused record for one entry. The chosen record is marked used.
pub fn find_match(entry: &Entry, snapshot: &LedgerSnapshot, used: &mut UsedRecords) -> Option<usize> {
    let mut best: Option<(usize, Duration)> = None;
    let mut tied = 0usize;

    for (idx, record) in snapshot.records().iter().enumerate() {
        let Some(diff) = candidate_distance(entry, record, used) else {
            continue;
        };
        match best {
            Some((_, best_diff)) if diff > best_diff => {}
            Some((_, best_diff)) if diff == best_diff => tied += 1,
            _ => {
                best = Some((idx, diff));
                tied = 0;
            }
        }
    }

    let (idx, diff) = best?;
    let record = &snapshot.records()[idx];
    if tied > 0 {
        info!(
            record_id = %record.id,
            tied_candidates = tied + 1,
            amount = entry.amount,
            occurred_at = %entry.occurred_at,
            "equally close records; keeping the first in snapshot order"
        );
    }
    debug!(
        record_id = %record.id,
        diff_minutes = diff.num_minutes(),
        "paired entry with record"
    );
    used.mark(&record.id);
    Some(idx)
}

/// Pair every entry, in order, against one snapshot.
pub fn match_entries(
    entries: &[Entry],
    snapshot: &LedgerSnapshot,
    used: &mut UsedRecords,
) -> Vec<Pairing> {
    entries
        .iter()
        .enumerate()
        .filter_map(|(entry, e)| find_match(e, snapshot, used).map(|record| Pairing { entry, record }))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::WorkType;
    use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};

    fn t0() -> DateTime<FixedOffset> {
        Utc.with_ymd_and_hms(2026, 2, 18, 12, 0, 0).unwrap().fixed_offset()
    }

    fn snapshot(records: Vec<Record>) -> LedgerSnapshot {
        LedgerSnapshot::new("Work", records, Utc::now())
    }

    fn task(amount: f64) -> Entry {
        Entry::new(amount, WorkType::Task, t0())
    }

    #[test]
    fn test_picks_closest_candidate() {
        let snap = snapshot(vec![
            Record::new("far", 12.5, WorkType::Task).with_submitted_at(t0() + Duration::days(2)),
            Record::new("near", 12.5, WorkType::Task).with_submitted_at(t0() - Duration::hours(1)),
        ]);
        let mut used = UsedRecords::new();
        let idx = find_match(&task(12.5), &snap, &mut used).unwrap();
        assert_eq!(snap.records()[idx].id, "near");
        assert!(used.contains("near"));
        assert!(!used.contains("far"));
    }

    #[test]
    fn test_amount_compared_at_cents() {
        let snap = snapshot(vec![
            Record::new("a", 12.504, WorkType::Task).with_submitted_at(t0()),
        ]);
        let mut used = UsedRecords::new();
        assert!(find_match(&task(12.50), &snap, &mut used).is_some());

        let snap = snapshot(vec![Record::new("b", 12.51, WorkType::Task).with_submitted_at(t0())]);
        let mut used = UsedRecords::new();
        assert!(find_match(&task(12.50), &snap, &mut used).is_none());
    }

    #[test]
    fn test_zero_amount_never_pairs() {
        let blank: Record = serde_json::from_str(
            r#"{"id": "r1", "earnings": "", "type": "task", "submittedAt": "2026-02-18T12:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(blank.cents(), 0);
        let snap = snapshot(vec![blank]);
        let mut used = UsedRecords::new();
        assert!(find_match(&task(0.0), &snap, &mut used).is_none());
        assert!(used.is_empty());
    }

    #[test]
    fn test_type_must_agree() {
        let snap = snapshot(vec![
            Record::new("a", 12.5, WorkType::ProjectTime).with_submitted_at(t0()),
        ]);
        assert!(find_match(&task(12.5), &snap, &mut UsedRecords::new()).is_none());
    }

    #[test]
    fn test_window_is_inclusive_three_days() {
        let edge = snapshot(vec![
            Record::new("edge", 12.5, WorkType::Task).with_submitted_at(t0() + Duration::days(3)),
        ]);
        assert!(find_match(&task(12.5), &edge, &mut UsedRecords::new()).is_some());

        let beyond = snapshot(vec![
            Record::new("beyond", 12.5, WorkType::Task)
                .with_submitted_at(t0() + Duration::days(3) + Duration::seconds(1)),
        ]);
        assert!(find_match(&task(12.5), &beyond, &mut UsedRecords::new()).is_none());
    }

    #[test]
    fn test_date_fallback_and_ineligible_without_time() {
        let snap = snapshot(vec![
            Record::new("undated", 12.5, WorkType::Task),
            Record::new("dated", 12.5, WorkType::Task)
                .with_date(NaiveDate::from_ymd_opt(2026, 2, 17).unwrap()),
        ]);
        let idx = find_match(&task(12.5), &snap, &mut UsedRecords::new()).unwrap();
        assert_eq!(snap.records()[idx].id, "dated");
    }

    #[test]
    fn test_submitted_at_preferred_over_date() {
        // date is close but submittedAt is a week off: record is out of window.
        let snap = snapshot(vec![
            Record::new("a", 12.5, WorkType::Task)
                .with_date(NaiveDate::from_ymd_opt(2026, 2, 18).unwrap())
                .with_submitted_at(t0() + Duration::days(7)),
        ]);
        assert!(find_match(&task(12.5), &snap, &mut UsedRecords::new()).is_none());
    }

    #[test]
    fn test_tie_goes_to_snapshot_order() {
        let snap = snapshot(vec![
            Record::new("first", 12.5, WorkType::Task).with_submitted_at(t0() + Duration::hours(1)),
            Record::new("second", 12.5, WorkType::Task).with_submitted_at(t0() - Duration::hours(1)),
        ]);
        let idx = find_match(&task(12.5), &snap, &mut UsedRecords::new()).unwrap();
        assert_eq!(snap.records()[idx].id, "first");
    }

    #[test]
    fn test_naive_and_zoned_compare_as_utc() {
        let chicago = FixedOffset::west_opt(6 * 3600).unwrap();
        let entry = Entry::new(
            12.5,
            WorkType::Task,
            chicago.with_ymd_and_hms(2026, 2, 18, 6, 0, 0).unwrap(),
        );
        let record: Record = serde_json::from_str(
            r#"{"id": "r", "earnings": 12.5, "type": "task", "submittedAt": "2026-02-18 12:00:00"}"#,
        )
        .unwrap();
        let snap = snapshot(vec![record]);
        let mut used = UsedRecords::new();
        let idx = find_match(&entry, &snap, &mut used).unwrap();
        let diff = abs_diff(snap.records()[idx].window_time().unwrap(), entry.occurred_at_utc());
        assert_eq!(diff, Duration::zero());
    }

    #[test]
    fn test_record_used_once() {
        let snap = snapshot(vec![Record::new("only", 12.5, WorkType::Task).with_submitted_at(t0())]);
        let entries = vec![task(12.5), task(12.5)];
        let mut used = UsedRecords::new();
        let pairings = match_entries(&entries, &snap, &mut used);
        assert_eq!(pairings, vec![Pairing { entry: 0, record: 0 }]);
        assert_eq!(used.len(), 1);
    }
}
