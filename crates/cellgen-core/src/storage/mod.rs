//! Table import/export.

pub mod csv;

pub use self::csv::{load_csv, parse_csv_str, to_csv_string, write_csv};
