//! paytally-sheets: spreadsheet web-app transport for the ledger, plus payday settings

pub mod client;
pub mod protocol;
pub mod settings;

pub use client::SheetsClient;
pub use settings::{DEFAULT_PAYOUT_WEEKDAY, day_name, is_payday, payout_weekday};
