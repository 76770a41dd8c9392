//! The remote ledger seam: what the reconciler needs from a store, and the
//! writer that applies a plan one mutation at a time.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::planner::{Mutation, MutationAction};
use crate::record::Record;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("ledger transport error: {0}")]
    Transport(String),
    #[error("ledger returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("ledger rejected the request: {reason}")]
    Rejected { reason: String },
    #[error("could not decode ledger response: {0}")]
    Decode(String),
    #[error("record not found: {id}")]
    NotFound { id: String },
}

/// A spreadsheet-like store of ledger tables.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Every record currently in `table`, in store order.
    async fn fetch_records(&self, table: &str) -> Result<Vec<Record>, LedgerError>;

    /// Apply one update or insert. Each call stands alone.
    async fn mutate(&self, table: &str, mutation: &Mutation) -> Result<(), LedgerError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Outcome {
    Applied,
    Failed { reason: String },
}

/// What happened to one planned mutation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MutationOutcome {
    pub action: MutationAction,
    pub record_id: String,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl MutationOutcome {
    pub fn is_applied(&self) -> bool {
        self.outcome == Outcome::Applied
    }
}

/// Apply mutations in order. A failure is recorded and the next one still runs.
pub async fn apply_plan<S: LedgerStore + ?Sized>(
    store: &S,
    table: &str,
    plan: &[Mutation],
) -> Vec<MutationOutcome> {
    let mut outcomes = Vec::with_capacity(plan.len());

    for mutation in plan {
        let outcome = match store.mutate(table, mutation).await {
            Ok(()) => {
                info!(
                    action = mutation.action().as_str(),
                    record_id = mutation.record_id(),
                    "applied"
                );
                Outcome::Applied
            }
            Err(e) => {
                warn!(
                    action = mutation.action().as_str(),
                    record_id = mutation.record_id(),
                    error = %e,
                    "mutation failed; continuing"
                );
                Outcome::Failed {
                    reason: e.to_string(),
                }
            }
        };
        outcomes.push(MutationOutcome {
            action: mutation.action(),
            record_id: mutation.record_id().to_string(),
            outcome,
        });
    }

    outcomes
}

/// In-process store keyed by table.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    tables: Mutex<HashMap<String, Vec<Record>>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(table: impl Into<String>, records: Vec<Record>) -> Self {
        let ledger = Self::new();
        ledger.replace_table(table, records);
        ledger
    }

    pub fn replace_table(&self, table: impl Into<String>, records: Vec<Record>) {
        if let Ok(mut tables) = self.tables.lock() {
            tables.insert(table.into(), records);
        }
    }

    /// Current contents of `table`; empty when it was never written.
    pub fn records(&self, table: &str) -> Vec<Record> {
        self.tables
            .lock()
            .map(|t| t.get(table).cloned().unwrap_or_default())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LedgerStore for MemoryLedger {
    async fn fetch_records(&self, table: &str) -> Result<Vec<Record>, LedgerError> {
        Ok(self.records(table))
    }

    async fn mutate(&self, table: &str, mutation: &Mutation) -> Result<(), LedgerError> {
        let mut tables = self
            .tables
            .lock()
            .map_err(|e| LedgerError::Transport(e.to_string()))?;
        let rows = tables.entry(table.to_string()).or_default();

        match mutation {
            Mutation::Update { id, patch } => {
                let record = rows
                    .iter_mut()
                    .find(|r| &r.id == id)
                    .ok_or_else(|| LedgerError::NotFound { id: id.clone() })?;
                patch.apply_to(record);
            }
            Mutation::Insert(record) => {
                if rows.iter().any(|r| r.id == record.id) {
                    return Err(LedgerError::Rejected {
                        reason: format!("duplicate id {}", record.id),
                    });
                }
                rows.push(record.clone());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::WorkType;
    use crate::record::RecordPatch;
    use chrono::{TimeZone, Utc};

    #[tokio::test]
    async fn test_apply_plan_continues_after_failure() {
        let ledger = MemoryLedger::with_table("Work", vec![Record::new("a", 5.0, WorkType::Task)]);
        let at = Utc.with_ymd_and_hms(2026, 2, 18, 10, 0, 0).unwrap().fixed_offset();

        let plan = vec![
            Mutation::Update {
                id: "missing".to_string(),
                patch: RecordPatch::new(at),
            },
            Mutation::Update {
                id: "a".to_string(),
                patch: RecordPatch::new(at),
            },
            Mutation::Insert(Record::new("b", 7.0, WorkType::Task)),
        ];

        let outcomes = apply_plan(&ledger, "Work", &plan).await;
        assert_eq!(outcomes.len(), 3);
        assert!(!outcomes[0].is_applied());
        assert!(outcomes[1].is_applied());
        assert!(outcomes[2].is_applied());

        let rows = ledger.records("Work");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].submitted_at, Some(at));
    }

    #[tokio::test]
    async fn test_duplicate_insert_rejected() {
        let ledger = MemoryLedger::with_table("Work", vec![Record::new("a", 5.0, WorkType::Task)]);
        let err = ledger
            .mutate("Work", &Mutation::Insert(Record::new("a", 1.0, WorkType::Task)))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Rejected { .. }));
    }

    #[test]
    fn test_outcome_serializes_flat() {
        let o = MutationOutcome {
            action: MutationAction::Insert,
            record_id: "x".to_string(),
            outcome: Outcome::Failed {
                reason: "boom".to_string(),
            },
        };
        let v = serde_json::to_value(&o).unwrap();
        assert_eq!(v["action"], "insert");
        assert_eq!(v["status"], "failed");
        assert_eq!(v["reason"], "boom");
    }
}
