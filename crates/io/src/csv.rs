// CSV/TSV ledger import and report export

use std::path::Path;

use stockbal_recon::engine::load_csv_ledger;
use stockbal_recon::model::{Ledger, LedgerKind, ReportRow};
use stockbal_recon::ReconError;

/// Sniffing candidates, earlier ones win ties.
const DELIMITERS: [u8; 4] = [b'\t', b';', b',', b'|'];
const SNIFF_ROWS: usize = 10;

/// Read a delimited ledger. The delimiter is sniffed when not given.
pub fn import_ledger(
    kind: LedgerKind,
    path: &Path,
    delimiter: Option<u8>,
) -> Result<Ledger, ReconError> {
    let content = read_ledger_text(path)
        .map_err(|e| ReconError::Io(format!("{kind} ledger: {}: {e}", path.display())))?;
    let delimiter = delimiter.unwrap_or_else(|| sniff_delimiter(&content));
    log::debug!(
        "{kind} ledger: {} with delimiter {:?}",
        path.display(),
        delimiter as char
    );
    load_csv_ledger(kind, &content, delimiter)
}

/// Pick the delimiter that splits the header row. A candidate whose sampled rows
/// all match the header width beats one that does not; then wider headers win.
/// Falls back to a comma.
pub fn sniff_delimiter(content: &str) -> u8 {
    let mut best: Option<((bool, usize), u8)> = None;
    for delim in DELIMITERS {
        let widths = row_widths(content, delim);
        let header = match widths.first() {
            Some(&w) if w > 1 => w,
            _ => continue,
        };
        let rank = (widths.iter().all(|&w| w == header), header);
        if best.map_or(true, |(top, _)| rank > top) {
            best = Some((rank, delim));
        }
    }
    best.map_or(b',', |(_, delim)| delim)
}

/// Field counts of the first rows, read as real CSV so quoted delimiters don't count.
fn row_widths(content: &str, delimiter: u8) -> Vec<usize> {
    csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes())
        .records()
        .take(SNIFF_ROWS)
        .map_while(Result::ok)
        .map(|record| record.len())
        .collect()
}

/// Ledger text as UTF-8. Files that aren't valid UTF-8 are taken as Windows-1252,
/// which is what spreadsheet exports usually are.
fn read_ledger_text(path: &Path) -> std::io::Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => encoding_rs::WINDOWS_1252.decode(e.as_bytes()).0.into_owned(),
    })
}

/// Write the report as delimited text: one header row, then one row per product.
pub fn export_report(
    rows: &[ReportRow],
    headers: &[&str],
    path: &Path,
    delimiter: u8,
) -> Result<(), String> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_path(path)
        .map_err(|e| e.to_string())?;

    writer.write_record(headers).map_err(|e| e.to_string())?;

    for row in rows {
        let mut record = Vec::with_capacity(8);
        record.push(row.code.clone());
        record.extend(row.values().iter().map(|v| v.to_string()));
        writer.write_record(&record).map_err(|e| e.to_string())?;
    }

    writer.flush().map_err(|e| e.to_string())?;
    Ok(())
}
