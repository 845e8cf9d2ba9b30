// Ledger loading: resolves each configured source and reads it by file type

use std::path::Path;
use std::thread;

use stockbal_recon::config::{LedgerSource, StockConfig};
use stockbal_recon::model::{Ledger, LedgerKind, ReconInput};
use stockbal_recon::ReconError;

use crate::{csv, xlsx};

/// Load one ledger. Relative paths are resolved against `base_dir`.
pub fn load_ledger(
    kind: LedgerKind,
    source: &LedgerSource,
    base_dir: &Path,
) -> Result<Ledger, ReconError> {
    let path = base_dir.join(&source.file);
    if xlsx::is_workbook(&path) {
        xlsx::import_ledger(kind, &path, source.sheet.as_deref())
    } else {
        if source.sheet.is_some() {
            log::warn!("{kind} ledger: 'sheet' ignored for delimited file {}", path.display());
        }
        csv::import_ledger(kind, &path, source.delimiter_byte())
    }
}

/// Load all four ledgers concurrently, one scoped thread per ledger.
///
/// Every ledger is read before any error is reported; the first failure in
/// ledger order wins.
pub fn load_ledgers(config: &StockConfig, base_dir: &Path) -> Result<ReconInput, ReconError> {
    let results: Vec<Result<Ledger, ReconError>> = thread::scope(|s| {
        let handles: Vec<_> = LedgerKind::ALL
            .iter()
            .map(|&kind| {
                let handle = s.spawn(move || {
                    let source = config.ledgers.get(&kind).ok_or(ReconError::MissingLedger(kind))?;
                    load_ledger(kind, source, base_dir)
                });
                (kind, handle)
            })
            .collect();

        handles
            .into_iter()
            .map(|(kind, handle)| {
                handle.join().unwrap_or_else(|_| {
                    Err(ReconError::Io(format!("{kind} ledger: loader panicked")))
                })
            })
            .collect()
    });

    let mut ledgers = Vec::with_capacity(results.len());
    for result in results {
        let ledger = result?;
        log::info!("loaded {} ledger: {} rows", ledger.kind, ledger.rows.len());
        ledgers.push(ledger);
    }
    Ok(ReconInput::new(ledgers))
}
