// Ledger loading and report export

pub mod csv;
pub mod sink;
pub mod source;
pub mod xlsx;

pub use sink::{export_report, output_format};
pub use source::{load_ledger, load_ledgers};
