//! `stockbal-recon`: period inventory and sales balancing engine.
//!
//! Pure engine crate: receives pre-loaded ledgers, returns the balanced report.
//! No CLI or file IO dependencies.

pub mod aggregate;
pub mod balance;
pub mod columns;
pub mod config;
pub mod engine;
pub mod error;
pub mod merge;
pub mod model;
pub mod redistribute;
pub mod report;

pub use config::StockConfig;
pub use engine::run;
pub use error::ReconError;
pub use model::{Ledger, LedgerKind, LedgerRow, ReconInput, ReconResult, ReportRow};
