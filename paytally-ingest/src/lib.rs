//! paytally-ingest: payments-page HTML exports → raw payment rows.

pub mod pages;
pub mod parsers;
pub mod types;

pub use pages::{combine_pages, read_exports, save_backup};
pub use parsers::parse_payments_table;
pub use types::{Column, ColumnMap};
