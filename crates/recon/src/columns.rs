use crate::error::ReconError;
use crate::model::{Ledger, LedgerKind};

/// Header used for an inventory ledger's quantity when no candidate matches.
pub const QUANTITY_FALLBACK_INDEX: usize = 1;
/// Header used for an inventory ledger's product code when no candidate matches.
pub const CODE_FALLBACK_INDEX: usize = 0;

/// Pick the first header matching a candidate, in candidate priority order.
///
/// Headers are trimmed before comparison; candidates are compared verbatim.
/// Without a match the header at `fallback` is returned. Ledgers with fewer
/// than two columns fail regardless of a match.
pub fn resolve_column(
    ledger: LedgerKind,
    headers: &[String],
    candidates: &[String],
    fallback: usize,
) -> Result<String, ReconError> {
    if headers.len() < 2 {
        return Err(ReconError::TooFewColumns {
            ledger,
            found: headers.len(),
        });
    }

    for candidate in candidates {
        if let Some(h) = headers.iter().find(|h| h.trim() == candidate.as_str()) {
            return Ok(h.clone());
        }
    }

    headers
        .get(fallback)
        .cloned()
        .ok_or(ReconError::TooFewColumns {
            ledger,
            found: headers.len(),
        })
}

/// Resolved (code, quantity) header pair of an inventory ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryColumns {
    pub code: String,
    pub quantity: String,
}

pub fn resolve_inventory_columns(
    ledger: &Ledger,
    code_candidates: &[String],
    quantity_candidates: &[String],
) -> Result<InventoryColumns, ReconError> {
    let code = resolve_column(ledger.kind, &ledger.headers, code_candidates, CODE_FALLBACK_INDEX)?;
    let quantity = resolve_column(
        ledger.kind,
        &ledger.headers,
        quantity_candidates,
        QUANTITY_FALLBACK_INDEX,
    )?;
    log::debug!("{} ledger: code column '{code}', quantity column '{quantity}'", ledger.kind);
    Ok(InventoryColumns { code, quantity })
}

/// Every named column must be present in the header row.
pub fn require_columns(
    ledger: LedgerKind,
    headers: &[String],
    columns: &[&str],
) -> Result<(), ReconError> {
    for column in columns {
        if !headers.iter().any(|h| h.as_str() == *column) {
            return Err(ReconError::MissingColumn {
                ledger,
                column: (*column).to_string(),
            });
        }
    }
    Ok(())
}
