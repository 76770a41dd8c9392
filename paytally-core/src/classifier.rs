//! Give every entry exactly one disposition: Matched, Correction or New.

use chrono::Duration;
use serde::Serialize;

use crate::entry::Entry;
use crate::matcher::Pairing;
use crate::snapshot::LedgerSnapshot;
use crate::time::abs_diff;

/// A paired record whose stored submission time is within this many minutes is up to date.
pub const SUBMISSION_TOLERANCE_MINUTES: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "disposition", rename_all = "kebab-case")]
pub enum Disposition {
    /// Already in the ledger with the right submission time.
    Matched { record: usize },
    /// In the ledger, but the stored submission time is missing or stale.
    Correction { record: usize },
    /// Not in the ledger.
    New,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Classified {
    pub entry: usize,
    #[serde(flatten)]
    pub disposition: Disposition,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispositionCounts {
    pub matched: usize,
    pub corrections: usize,
    pub new: usize,
}

impl DispositionCounts {
    pub fn total(&self) -> usize {
        self.matched + self.corrections + self.new
    }
}

/// Dispositions in entry order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Classification {
    items: Vec<Classified>,
}

impl Classification {
    pub fn items(&self) -> &[Classified] {
        &self.items
    }

    pub fn matched(&self) -> impl Iterator<Item = &Classified> {
        self.items
            .iter()
            .filter(|c| matches!(c.disposition, Disposition::Matched { .. }))
    }

    pub fn corrections(&self) -> impl Iterator<Item = &Classified> {
        self.items
            .iter()
            .filter(|c| matches!(c.disposition, Disposition::Correction { .. }))
    }

    pub fn new_entries(&self) -> impl Iterator<Item = &Classified> {
        self.items
            .iter()
            .filter(|c| matches!(c.disposition, Disposition::New))
    }

    pub fn counts(&self) -> DispositionCounts {
        let mut counts = DispositionCounts::default();
        for c in &self.items {
            match c.disposition {
                Disposition::Matched { .. } => counts.matched += 1,
                Disposition::Correction { .. } => counts.corrections += 1,
                Disposition::New => counts.new += 1,
            }
        }
        counts
    }
}

/// Classify each entry from the matcher's pairings.
///
/// Staleness is judged against the record's stored `submittedAt` only; a
/// record that matched through its `date` fallback is always a correction.
pub fn classify(entries: &[Entry], snapshot: &LedgerSnapshot, pairings: &[Pairing]) -> Classification {
    let mut paired: Vec<Option<usize>> = vec![None; entries.len()];
    for p in pairings {
        if let Some(slot) = paired.get_mut(p.entry) {
            *slot = Some(p.record);
        }
    }

    let tolerance = Duration::minutes(SUBMISSION_TOLERANCE_MINUTES);
    let items = entries
        .iter()
        .zip(paired)
        .enumerate()
        .map(|(idx, (entry, record))| {
            let disposition = match record {
                None => Disposition::New,
                Some(record) => {
                    let fresh = snapshot
                        .get(record)
                        .and_then(|r| r.submitted_at_utc())
                        .is_some_and(|stored| abs_diff(stored, entry.occurred_at_utc()) <= tolerance);
                    if fresh {
                        Disposition::Matched { record }
                    } else {
                        Disposition::Correction { record }
                    }
                }
            };
            Classified {
                entry: idx,
                disposition,
            }
        })
        .collect();

    Classification { items }
}
