//! Turn dispositions into ledger mutations.
//!
//! Corrections become updates that rewrite `submittedAt` and backfill empty
//! `duration`/`hourlyRate`/`notes`. New entries become inserts with a fresh
//! id. Matched entries need nothing.

use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::classifier::{Classification, Disposition};
use crate::entry::Entry;
use crate::record::{Record, RecordPatch};
use crate::snapshot::LedgerSnapshot;

/// Source of ids for inserted records.
pub trait IdGenerator {
    fn next_id(&mut self) -> String;
}

/// Random v4 UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIds;

impl IdGenerator for UuidIds {
    fn next_id(&mut self) -> String {
        Uuid::new_v4().to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationAction {
    Update,
    Insert,
}

impl MutationAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            MutationAction::Update => "update",
            MutationAction::Insert => "insert",
        }
    }
}

/// One planned write against the ledger.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Mutation {
    Update { id: String, patch: RecordPatch },
    Insert(Record),
}

impl Mutation {
    pub fn action(&self) -> MutationAction {
        match self {
            Mutation::Update { .. } => MutationAction::Update,
            Mutation::Insert(_) => MutationAction::Insert,
        }
    }

    pub fn record_id(&self) -> &str {
        match self {
            Mutation::Update { id, .. } => id,
            Mutation::Insert(record) => &record.id,
        }
    }
}

/// Update for a paired record whose stored submission time is stale.
///
/// Backfill only fills gaps: a record that already has a duration or notes keeps them.
pub fn correction_patch(entry: &Entry, record: &Record) -> RecordPatch {
    let mut patch = RecordPatch::new(entry.occurred_at);

    if entry.duration > 0.0 && !record.has_duration() {
        patch.duration = Some(entry.duration);
        patch.hourly_rate = Some(entry.hourly_rate());
    }
    if !entry.label.trim().is_empty() && !record.has_notes() {
        patch.notes = Some(entry.label.clone());
    }

    patch
}

/// Full ledger row for an entry the ledger has never seen.
pub fn new_record(entry: &Entry, id: String) -> Record {
    Record {
        id,
        earnings: entry.amount,
        work_type: entry.work_type,
        submitted_at: Some(entry.occurred_at),
        date: Some(entry.occurred_at.date_naive()),
        duration: entry.duration,
        notes: entry.label.clone(),
        hourly_rate: entry.hourly_rate(),
    }
}

/// Mutations for a classified run, corrections first, each group in entry order.
pub fn plan(
    entries: &[Entry],
    snapshot: &LedgerSnapshot,
    classification: &Classification,
    ids: &mut impl IdGenerator,
) -> Vec<Mutation> {
    let mut out = Vec::new();

    for c in classification.corrections() {
        let Disposition::Correction { record } = c.disposition else {
            continue;
        };
        let (Some(entry), Some(record)) = (entries.get(c.entry), snapshot.get(record)) else {
            continue;
        };
        let patch = correction_patch(entry, record);
        debug!(record_id = %record.id, fields = ?patch.fields(), "planned correction");
        out.push(Mutation::Update {
            id: record.id.clone(),
            patch,
        });
    }

    for c in classification.new_entries() {
        let Some(entry) = entries.get(c.entry) else {
            continue;
        };
        let record = new_record(entry, ids.next_id());
        debug!(record_id = %record.id, amount = record.earnings, "planned insert");
        out.push(Mutation::Insert(record));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::classify;
    use crate::entry::WorkType;
    use crate::matcher::{UsedRecords, match_entries};
    use chrono::{DateTime, Duration, FixedOffset, NaiveDate, TimeZone, Utc};

    struct Counter(u32);

    impl IdGenerator for Counter {
        fn next_id(&mut self) -> String {
            self.0 += 1;
            format!("new-{}", self.0)
        }
    }

    fn t0() -> DateTime<FixedOffset> {
        FixedOffset::west_opt(6 * 3600)
            .unwrap()
            .with_ymd_and_hms(2026, 2, 18, 21, 30, 0)
            .unwrap()
    }

    fn run(entries: &[Entry], records: Vec<Record>) -> Vec<Mutation> {
        let snap = LedgerSnapshot::new("Work", records, Utc::now());
        let pairings = match_entries(entries, &snap, &mut UsedRecords::new());
        let c = classify(entries, &snap, &pairings);
        plan(entries, &snap, &c, &mut Counter(0))
    }

    #[test]
    fn test_correction_backfills_empty_fields() {
        let entry = Entry::new(30.0, WorkType::ProjectTime, t0())
            .with_duration(1.5)
            .with_label("Orion");
        let record = Record::new("r", 30.0, WorkType::ProjectTime);
        let patch = correction_patch(&entry, &record);
        assert_eq!(patch.submitted_at, t0());
        assert_eq!(patch.duration, Some(1.5));
        assert_eq!(patch.hourly_rate, Some(20.0));
        assert_eq!(patch.notes.as_deref(), Some("Orion"));
    }

    #[test]
    fn test_correction_never_overwrites() {
        let entry = Entry::new(30.0, WorkType::ProjectTime, t0())
            .with_duration(1.5)
            .with_label("Orion");
        let record = Record::new("r", 30.0, WorkType::ProjectTime)
            .with_duration(2.0)
            .with_notes("manual note");
        let patch = correction_patch(&entry, &record);
        assert!(patch.duration.is_none());
        assert!(patch.hourly_rate.is_none());
        assert!(patch.notes.is_none());

        let mut applied = record.clone();
        patch.apply_to(&mut applied);
        assert_eq!(applied.duration, 2.0);
        assert_eq!(applied.notes, "manual note");
    }

    #[test]
    fn test_correction_without_entry_extras_only_moves_timestamp() {
        let entry = Entry::new(12.5, WorkType::Task, t0());
        let patch = correction_patch(&entry, &Record::new("r", 12.5, WorkType::Task));
        assert_eq!(patch.fields(), vec!["submittedAt"]);
    }

    #[test]
    fn test_new_record_shape() {
        let entry = Entry::new(45.0, WorkType::ProjectTime, t0())
            .with_duration(2.0)
            .with_label("Orion");
        let r = new_record(&entry, "id-1".to_string());
        assert_eq!(r.id, "id-1");
        // 21:30 at -06:00 is already the 19th in UTC; the date follows the entry's own offset.
        assert_eq!(r.date, NaiveDate::from_ymd_opt(2026, 2, 18));
        assert_eq!(r.submitted_at, Some(t0()));
        assert_eq!(r.hourly_rate, 22.5);
        assert_eq!(r.notes, "Orion");
        assert_eq!(r.work_type, WorkType::ProjectTime);
    }

    #[test]
    fn test_plan_orders_updates_then_inserts() {
        let entries = vec![
            Entry::new(9.0, WorkType::Task, t0()),
            Entry::new(12.5, WorkType::Task, t0()),
            Entry::new(7.0, WorkType::Task, t0()),
        ];
        let records = vec![
            Record::new("stale", 12.5, WorkType::Task).with_submitted_at(t0() + Duration::days(2)),
            Record::new("fresh", 7.0, WorkType::Task).with_submitted_at(t0()),
        ];
        let plan = run(&entries, records);
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].action(), MutationAction::Update);
        assert_eq!(plan[0].record_id(), "stale");
        assert_eq!(plan[1].action(), MutationAction::Insert);
        assert_eq!(plan[1].record_id(), "new-1");
    }

    #[test]
    fn test_uuid_ids_are_unique() {
        let mut ids = UuidIds;
        assert_ne!(ids.next_id(), ids.next_id());
    }
}
