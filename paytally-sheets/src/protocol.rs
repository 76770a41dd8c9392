//! Wire format of the spreadsheet web app.
//!
//! Reads:  `GET <url>?tab=<table>` → `{"records": [ {...}, ... ]}`
//! Writes: `POST <url>` with `{"action", "tab", "id", "data"}` → `{"success": true}`
//! Either side reports problems as `{"error": "<reason>"}`.

use paytally_core::{LedgerError, Mutation, Record};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

#[derive(Debug, Deserialize)]
struct RowsResponse {
    #[serde(default)]
    records: Vec<Value>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MutationRequest<'a> {
    pub action: &'static str,
    pub tab: &'a str,
    pub id: &'a str,
    pub data: Value,
}

#[derive(Debug, Deserialize)]
struct MutationResponse {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    error: Option<String>,
}

/// Raw rows of a tab, undecoded.
pub fn parse_rows(body: &str) -> Result<Vec<Value>, LedgerError> {
    let resp: RowsResponse =
        serde_json::from_str(body).map_err(|e| LedgerError::Decode(e.to_string()))?;
    match resp.error {
        Some(reason) => Err(LedgerError::Rejected { reason }),
        None => Ok(resp.records),
    }
}

/// Decode ledger rows. A row that isn't a record at all (no id) is skipped.
pub fn parse_records(body: &str) -> Result<Vec<Record>, LedgerError> {
    Ok(decode_records(parse_rows(body)?))
}

/// Decode already-parsed rows, skipping those without an id or that don't decode.
pub fn decode_records(rows: Vec<Value>) -> Vec<Record> {
    let mut out = Vec::with_capacity(rows.len());
    for (i, row) in rows.into_iter().enumerate() {
        match serde_json::from_value::<Record>(row) {
            Ok(record) if !record.id.is_empty() => out.push(record),
            Ok(_) => warn!(row = i, "skipping ledger row without id"),
            Err(e) => warn!(row = i, error = %e, "skipping undecodable ledger row"),
        }
    }
    out
}

/// The `id` cell of a raw row, read the way `Record` reads it.
pub fn row_id(row: &Value) -> Option<String> {
    match row.get("id")? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Request body for one mutation.
pub fn mutation_request<'a>(
    table: &'a str,
    mutation: &'a Mutation,
) -> Result<MutationRequest<'a>, LedgerError> {
    let data = match mutation {
        Mutation::Update { patch, .. } => serde_json::to_value(patch),
        Mutation::Insert(record) => serde_json::to_value(record),
    }
    .map_err(|e| LedgerError::Decode(e.to_string()))?;

    Ok(MutationRequest {
        action: mutation.action().as_str(),
        tab: table,
        id: mutation.record_id(),
        data,
    })
}

/// Interpret the web app's reply to a mutation.
pub fn parse_mutation_response(body: &str) -> Result<(), LedgerError> {
    let resp: MutationResponse =
        serde_json::from_str(body).map_err(|e| LedgerError::Decode(e.to_string()))?;
    if let Some(reason) = resp.error {
        return Err(LedgerError::Rejected { reason });
    }
    if resp.success == Some(false) {
        return Err(LedgerError::Rejected {
            reason: "web app reported success=false".to_string(),
        });
    }
    Ok(())
}
