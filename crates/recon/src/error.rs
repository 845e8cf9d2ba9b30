use std::fmt;

use crate::model::LedgerKind;

#[derive(Debug)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (bad candidate list, non-finite target, etc.).
    ConfigValidation(String),
    /// One of the four ledgers was not supplied.
    MissingLedger(LedgerKind),
    /// Missing required column in a ledger.
    MissingColumn { ledger: LedgerKind, column: String },
    /// Inventory ledger without a second column to fall back on.
    TooFewColumns { ledger: LedgerKind, found: usize },
    /// IO error (file read, malformed CSV, etc.).
    Io(String),
}

impl ReconError {
    /// True for errors that mean a ledger's layout is unusable.
    pub fn is_schema(&self) -> bool {
        matches!(self, Self::MissingColumn { .. } | Self::TooFewColumns { .. })
    }
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::MissingLedger(kind) => write!(f, "missing input: no {kind} ledger supplied"),
            Self::MissingColumn { ledger, column } => {
                write!(f, "{ledger} ledger: missing column '{column}'")
            }
            Self::TooFewColumns { ledger, found } => {
                write!(f, "{ledger} ledger: expected at least 2 columns, found {found}")
            }
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}
