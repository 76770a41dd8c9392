//! One reconciliation run: snapshot → match → classify → plan → apply.

use std::fmt;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use tracing::info;

use crate::classifier::{Classification, DispositionCounts, classify};
use crate::entry::Entry;
use crate::ledger::{LedgerStore, MutationOutcome, apply_plan};
use crate::matcher::{UsedRecords, match_entries};
use crate::planner::{IdGenerator, Mutation, plan};
use crate::snapshot::LedgerSnapshot;

/// Summary of a finished run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub table: String,
    pub entries: usize,
    pub snapshot_size: usize,
    pub counts: DispositionCounts,
    pub dry_run: bool,
    pub classification: Classification,
    pub plan: Vec<Mutation>,
    pub outcomes: Vec<MutationOutcome>,
}

impl RunReport {
    pub fn applied(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_applied()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_applied()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &MutationOutcome> {
        self.outcomes.iter().filter(|o| !o.is_applied())
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Reconciled {} entries against {} records in '{}'",
            self.entries, self.snapshot_size, self.table
        )?;
        writeln!(
            f,
            "  matched={} corrections={} new={}",
            self.counts.matched, self.counts.corrections, self.counts.new
        )?;
        if self.dry_run {
            write!(f, "  dry run: {} mutations planned, none applied", self.plan.len())
        } else {
            write!(
                f,
                "  mutations: {} applied, {} failed",
                self.applied(),
                self.failed()
            )
        }
    }
}

/// Runs reconciliation for one ledger table.
#[derive(Debug, Clone)]
pub struct Reconciler {
    table: String,
    dry_run: bool,
}

impl Reconciler {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            dry_run: false,
        }
    }

    /// Plan only; the store is read but never written.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Fetch the snapshot, then reconcile `entries` against it.
    ///
    /// A failed snapshot fetch aborts the run before anything is processed.
    pub async fn run<S: LedgerStore + ?Sized>(
        &self,
        store: &S,
        entries: &[Entry],
        ids: &mut impl IdGenerator,
    ) -> Result<RunReport> {
        let records = store
            .fetch_records(&self.table)
            .await
            .with_context(|| format!("fetching ledger snapshot for '{}'", self.table))?;
        let snapshot = LedgerSnapshot::new(self.table.clone(), records, Utc::now());
        info!(table = %self.table, records = snapshot.len(), entries = entries.len(), "snapshot loaded");

        let (classification, plan) = self.plan(entries, &snapshot, ids);

        let outcomes = if self.dry_run {
            Vec::new()
        } else {
            apply_plan(store, &self.table, &plan).await
        };

        let report = RunReport {
            table: self.table.clone(),
            entries: entries.len(),
            snapshot_size: snapshot.len(),
            counts: classification.counts(),
            dry_run: self.dry_run,
            classification,
            plan,
            outcomes,
        };
        info!(
            matched = report.counts.matched,
            corrections = report.counts.corrections,
            new = report.counts.new,
            failed = report.failed(),
            "run finished"
        );
        Ok(report)
    }

    /// The pure part of a run: match, classify and plan against a snapshot.
    pub fn plan(
        &self,
        entries: &[Entry],
        snapshot: &LedgerSnapshot,
        ids: &mut impl IdGenerator,
    ) -> (Classification, Vec<Mutation>) {
        let mut used = UsedRecords::new();
        let pairings = match_entries(entries, snapshot, &mut used);
        let classification = classify(entries, snapshot, &pairings);
        let mutations = plan(entries, snapshot, &classification, ids);
        (classification, mutations)
    }
}
