use std::time::Duration;

use async_trait::async_trait;
use paytally_core::{LedgerError, LedgerStore, Mutation, Record};
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use serde_json::Value;
use tracing::debug;

use crate::protocol::{mutation_request, parse_mutation_response, parse_records, parse_rows};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Client for a spreadsheet published as a web app (one URL, tabs selected by query).
#[derive(Debug, Clone)]
pub struct SheetsClient {
    http: reqwest::Client,
    url: String,
}

impl SheetsClient {
    pub fn new(url: impl Into<String>) -> Result<Self, LedgerError> {
        Self::with_timeout(url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self, LedgerError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LedgerError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn get_tab(&self, tab: &str) -> Result<String, LedgerError> {
        debug!(tab, "GET tab");
        let resp = self
            .http
            .get(&self.url)
            .query(&[("tab", tab)])
            .send()
            .await
            .map_err(|e| LedgerError::Transport(e.to_string()))?;
        read_body(resp).await
    }

    /// Undecoded rows of any tab (e.g. settings).
    pub async fn fetch_rows(&self, tab: &str) -> Result<Vec<Value>, LedgerError> {
        parse_rows(&self.get_tab(tab).await?)
    }
}

async fn read_body(resp: reqwest::Response) -> Result<String, LedgerError> {
    let status = resp.status();
    let body = resp
        .text()
        .await
        .map_err(|e| LedgerError::Transport(e.to_string()))?;
    if !status.is_success() {
        return Err(LedgerError::Status {
            status: status.as_u16(),
            body: body.chars().take(200).collect(),
        });
    }
    Ok(body)
}

#[async_trait]
impl LedgerStore for SheetsClient {
    async fn fetch_records(&self, table: &str) -> Result<Vec<Record>, LedgerError> {
        parse_records(&self.get_tab(table).await?)
    }

    async fn mutate(&self, table: &str, mutation: &Mutation) -> Result<(), LedgerError> {
        let payload = mutation_request(table, mutation)?;
        let body = serde_json::to_string(&payload).map_err(|e| LedgerError::Decode(e.to_string()))?;
        debug!(action = payload.action, id = payload.id, "POST mutation");

        // The web app parses the raw POST body itself.
        let resp = self
            .http
            .post(&self.url)
            .header(CONTENT_TYPE, HeaderValue::from_static("text/plain;charset=utf-8"))
            .body(body)
            .send()
            .await
            .map_err(|e| LedgerError::Transport(e.to_string()))?;
        parse_mutation_response(&read_body(resp).await?)
    }
}
