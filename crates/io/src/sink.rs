// Report export: picks the writer from the configured format or file extension

use std::path::Path;

use stockbal_recon::config::{OutputFormat, ReportLabels};
use stockbal_recon::model::ReportRow;

use crate::{csv, xlsx};

/// Explicit format wins; otherwise `.csv`/`.tsv`/`.txt` write delimited text and
/// anything else writes a workbook.
pub fn output_format(path: &Path, configured: Option<OutputFormat>) -> OutputFormat {
    if let Some(format) = configured {
        return format;
    }
    match path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref() {
        Some("csv" | "tsv" | "txt") => OutputFormat::Csv,
        _ => OutputFormat::Xlsx,
    }
}

pub fn export_report(
    rows: &[ReportRow],
    labels: &ReportLabels,
    path: &Path,
    format: OutputFormat,
) -> Result<(), String> {
    let headers = labels.headers();
    match format {
        OutputFormat::Xlsx => xlsx::export_report(rows, &headers, &labels.sheet, path)?,
        OutputFormat::Csv => {
            let is_tsv = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("tsv"));
            let delimiter = if is_tsv { b'\t' } else { b',' };
            csv::export_report(rows, &headers, path, delimiter)?
        }
    }
    log::info!("wrote {} report rows to {}", rows.len(), path.display());
    Ok(())
}
