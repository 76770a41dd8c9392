//! Point-in-time copy of one ledger table, read once per run.

use chrono::{DateTime, Utc};

use crate::record::Record;

/// Immutable for the run: matching only reads it and tracks usage separately.
#[derive(Debug, Clone)]
pub struct LedgerSnapshot {
    table: String,
    records: Vec<Record>,
    fetched_at: DateTime<Utc>,
}

impl LedgerSnapshot {
    pub fn new(table: impl Into<String>, records: Vec<Record>, fetched_at: DateTime<Utc>) -> Self {
        Self {
            table: table.into(),
            records,
            fetched_at,
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Records in the order the store returned them. Tie-breaks depend on this order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn get(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }
}
