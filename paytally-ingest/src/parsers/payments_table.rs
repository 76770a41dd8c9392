//! Payments-page table parser (saved HTML)
//!
//! Expected markup after the rows were expanded and the table captured:
//!   <table>
//!     <tr><th>Project</th><th>Type</th><th>Duration</th><th>Submitted</th><th>Amount</th></tr>
//!     <tr><td>Orion</td><td>Project Time</td><td>1h 30m</td><td>Feb 18, 2026, 3:45 PM</td><td>$30.00</td></tr>
//!   </table>
//!
//! Several pages may be concatenated; each header row resets the column layout.

use anyhow::Result;
use paytally_core::RawEntry;
use regex::Regex;
use tracing::debug;

use crate::types::{Column, ColumnMap};

fn decode_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&#36;", "$")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&amp;", "&")
}

/// Extract raw payment rows from one or more `<table>` blocks.
pub fn parse_payments_table(html: &str) -> Result<Vec<RawEntry>> {
    let row_re = Regex::new(r"(?is)<tr\b[^>]*>(.*?)</tr>")?;
    let cell_re = Regex::new(r"(?is)<(td|th)\b[^>]*>(.*?)</(?:td|th)>")?;
    let tag_re = Regex::new(r"(?s)<[^>]*>")?;
    let space_re = Regex::new(r"\s+")?;

    let clean = |fragment: &str| -> String {
        let text = tag_re.replace_all(fragment, " ");
        let text = decode_entities(&text);
        space_re.replace_all(&text, " ").trim().to_string()
    };

    let mut columns = ColumnMap::fallback();
    let mut out = Vec::new();

    for row in row_re.captures_iter(html) {
        let mut header = false;
        let cells: Vec<String> = cell_re
            .captures_iter(&row[1])
            .map(|c| {
                header |= c[1].eq_ignore_ascii_case("th");
                clean(&c[2])
            })
            .collect();

        if cells.is_empty() {
            continue;
        }

        if header {
            let map = ColumnMap::from_headers(&cells);
            if map.is_usable() {
                columns = map;
            }
            continue;
        }

        let amount = columns.get(&cells, Column::Amount);
        if amount.is_empty() {
            debug!(?cells, "skipping row without amount");
            continue;
        }

        let duration = columns.get(&cells, Column::Duration);
        let mut kind = columns.get(&cells, Column::Kind).to_string();
        if kind.is_empty() {
            // Hourly work carries a duration; fixed-price tasks don't.
            kind = if duration.is_empty() { "Task" } else { "Project Time" }.to_string();
        }

        out.push(RawEntry {
            amount: amount.to_string(),
            work_type: kind,
            occurred_at: columns.get(&cells, Column::Submitted).to_string(),
            duration: duration.to_string(),
            label: columns.get(&cells, Column::Label).to_string(),
        });
    }

    Ok(out)
}
