//! paytally-core: reconcile scraped work payments against a spreadsheet ledger

pub mod classifier;
pub mod entry;
pub mod ledger;
pub mod matcher;
pub mod normalize;
pub mod planner;
pub mod reconcile;
pub mod record;
pub mod snapshot;
pub mod time;

pub use classifier::{Classification, Classified, Disposition, DispositionCounts, classify};
pub use entry::{Entry, RawEntry, WorkType, round2, to_cents};
pub use ledger::{LedgerError, LedgerStore, MemoryLedger, MutationOutcome, Outcome, apply_plan};
pub use matcher::{MATCH_WINDOW_DAYS, Pairing, UsedRecords, find_match, match_entries};
pub use normalize::{Normalizer, parse_amount, parse_work_type};
pub use planner::{IdGenerator, Mutation, MutationAction, UuidIds, plan};
pub use reconcile::{Reconciler, RunReport};
pub use record::{Record, RecordPatch};
pub use snapshot::LedgerSnapshot;
pub use time::{ParsedTime, parse_timestamp, parse_tz};
