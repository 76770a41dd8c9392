//! Exported ledger on disk, in the web app's `{"records": [...]}` shape.
//!
//! Rows are kept as raw JSON. Mutations touch only the row they name and only
//! the fields they carry, so rows that don't decode and columns `Record` doesn't
//! model survive a run unchanged.

use anyhow::{Context, Result};
use async_trait::async_trait;
use paytally_core::{LedgerError, LedgerStore, Mutation, MutationAction, Record};
use paytally_sheets::protocol::{decode_records, mutation_request, parse_rows, row_id};
use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Debug)]
pub struct LedgerFile {
    path: PathBuf,
    rows: Mutex<Vec<Value>>,
}

impl LedgerFile {
    pub fn load(path: &Path) -> Result<Self> {
        let body = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let rows = parse_rows(&body).with_context(|| format!("parse ledger file {}", path.display()))?;
        Ok(Self {
            path: path.to_path_buf(),
            rows: Mutex::new(rows),
        })
    }

    pub fn rows(&self) -> Vec<Value> {
        self.rows.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn save(&self) -> Result<()> {
        let body = serde_json::to_string_pretty(&json!({ "records": self.rows() }))
            .context("serialize ledger")?;
        fs::write(&self.path, body).with_context(|| format!("write {}", self.path.display()))
    }
}

/// Merge one mutation into raw rows.
pub fn apply_to_rows(rows: &mut Vec<Value>, table: &str, mutation: &Mutation) -> Result<(), LedgerError> {
    let request = mutation_request(table, mutation)?;
    match mutation.action() {
        MutationAction::Update => {
            let row = rows
                .iter_mut()
                .find(|r| row_id(r).as_deref() == Some(request.id))
                .ok_or_else(|| LedgerError::NotFound {
                    id: request.id.to_string(),
                })?;
            match (row.as_object_mut(), request.data) {
                (Some(cells), Value::Object(patch)) => cells.extend(patch),
                _ => {
                    return Err(LedgerError::Rejected {
                        reason: format!("row {} is not an object", request.id),
                    });
                }
            }
        }
        MutationAction::Insert => {
            if rows.iter().any(|r| row_id(r).as_deref() == Some(request.id)) {
                return Err(LedgerError::Rejected {
                    reason: format!("duplicate id {}", request.id),
                });
            }
            rows.push(request.data);
        }
    }
    Ok(())
}

#[async_trait]
impl LedgerStore for LedgerFile {
    async fn fetch_records(&self, _table: &str) -> Result<Vec<Record>, LedgerError> {
        Ok(decode_records(self.rows()))
    }

    async fn mutate(&self, table: &str, mutation: &Mutation) -> Result<(), LedgerError> {
        let mut rows = self
            .rows
            .lock()
            .map_err(|e| LedgerError::Transport(e.to_string()))?;
        apply_to_rows(&mut rows, table, mutation)
    }
}
