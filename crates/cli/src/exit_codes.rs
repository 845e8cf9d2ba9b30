//! CLI Exit Code Registry
//!
//! Single source of truth for `stockbal` exit codes. Scripts rely on them.
//!
//! | Code | Meaning                                          |
//! |------|--------------------------------------------------|
//! | 0    | Success                                          |
//! | 2    | CLI usage error (bad args, clap parse failure)   |
//! | 60   | Invalid config (TOML parse or validation)        |
//! | 61   | Missing input (ledger not configured or absent)  |
//! | 62   | Schema error (required ledger column not found)  |
//! | 63   | IO or runtime error (read, export, serialize)    |

use stockbal_recon::ReconError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// Config file could not be parsed or failed validation.
pub const EXIT_INVALID_CONFIG: u8 = 60;

/// A ledger is not configured or its file does not exist.
pub const EXIT_MISSING_INPUT: u8 = 61;

/// A ledger lacks a required column.
pub const EXIT_SCHEMA: u8 = 62;

/// Reading, writing or serialization failed.
pub const EXIT_RUNTIME: u8 = 63;

/// Map an engine error to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => EXIT_INVALID_CONFIG,
        ReconError::MissingLedger(_) => EXIT_MISSING_INPUT,
        ReconError::MissingColumn { .. } | ReconError::TooFewColumns { .. } => EXIT_SCHEMA,
        ReconError::Io(_) => EXIT_RUNTIME,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockbal_recon::LedgerKind;

    #[test]
    fn schema_errors_share_a_code() {
        let missing = ReconError::MissingColumn {
            ledger: LedgerKind::Sales,
            column: "tax".into(),
        };
        let narrow = ReconError::TooFewColumns {
            ledger: LedgerKind::Returns,
            found: 1,
        };
        assert_eq!(recon_exit_code(&missing), EXIT_SCHEMA);
        assert_eq!(recon_exit_code(&narrow), EXIT_SCHEMA);
    }

    #[test]
    fn codes_are_distinct() {
        let codes = [
            EXIT_SUCCESS,
            EXIT_USAGE,
            EXIT_INVALID_CONFIG,
            EXIT_MISSING_INPUT,
            EXIT_SCHEMA,
            EXIT_RUNTIME,
        ];
        for (i, a) in codes.iter().enumerate() {
            for b in &codes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
