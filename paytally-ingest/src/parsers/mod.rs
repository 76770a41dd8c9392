pub mod payments_table;

pub use payments_table::parse_payments_table;
