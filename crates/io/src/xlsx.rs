// Workbook ledger import (xlsx, xls, xlsb, ods) and report export (xlsx only)

use std::collections::HashMap;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader, Sheets};
use rust_xlsxwriter::{Format, FormatBorder, Workbook as XlsxWorkbook};
use stockbal_recon::model::{Ledger, LedgerKind, LedgerRow, ReportRow};
use stockbal_recon::ReconError;

/// Extensions read through calamine.
pub const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xls", "xlsb", "ods"];

pub fn is_workbook(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| WORKBOOK_EXTENSIONS.iter().any(|w| e.eq_ignore_ascii_case(w)))
}

/// Read one worksheet as a ledger. The first row of the used range is the header.
///
/// `sheet` selects a worksheet by name; the first sheet is used when omitted.
pub fn import_ledger(
    kind: LedgerKind,
    path: &Path,
    sheet: Option<&str>,
) -> Result<Ledger, ReconError> {
    let io_err = |msg: String| ReconError::Io(format!("{kind} ledger: {}: {msg}", path.display()));

    let mut workbook: Sheets<_> =
        open_workbook_auto(path).map_err(|e| io_err(format!("failed to open workbook: {e}")))?;

    let sheet_name = match sheet {
        Some(name) => name.to_string(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| io_err("workbook contains no sheets".into()))?,
    };

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| io_err(format!("failed to read sheet '{sheet_name}': {e}")))?;

    let mut rows_iter = range.rows();
    let headers: Vec<String> = rows_iter
        .next()
        .map(|header| header.iter().map(cell_text).map(|h| h.trim().to_string()).collect())
        .unwrap_or_default();

    let mut rows = Vec::new();
    for cells in rows_iter {
        let mut fields = HashMap::with_capacity(headers.len());
        for (h, cell) in headers.iter().zip(cells) {
            if !matches!(cell, Data::Empty) {
                fields.insert(h.clone(), cell_text(cell));
            }
        }
        rows.push(LedgerRow { fields });
    }

    log::debug!(
        "{kind} ledger: sheet '{sheet_name}', {} columns, {} rows",
        headers.len(),
        rows.len()
    );
    Ok(Ledger { kind, headers, rows })
}

/// Render a cell the way it would appear in a CSV export.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(n) => {
            // Integers without decimals
            if n.fract() == 0.0 && n.abs() < 1e15 {
                format!("{}", *n as i64)
            } else {
                format!("{}", n)
            }
        }
        Data::Int(n) => format!("{}", n),
        Data::Bool(b) => String::from(if *b { "TRUE" } else { "FALSE" }),
        Data::Error(e) => format!("#{:?}", e),
        Data::DateTime(dt) => format!("{}", dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
    }
}

/// Write the report to a single worksheet with a bold, frozen header row.
pub fn export_report(
    rows: &[ReportRow],
    headers: &[&str],
    sheet_name: &str,
    path: &Path,
) -> Result<(), String> {
    let mut workbook = XlsxWorkbook::new();
    let worksheet = workbook
        .add_worksheet()
        .set_name(sheet_name)
        .map_err(|e| format!("Failed to create sheet '{}': {}", sheet_name, e))?;

    let header_format = Format::new().set_bold().set_border_bottom(FormatBorder::Thin);
    for (col, header) in headers.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, *header, &header_format)
            .map_err(|e| format!("Failed to write header: {}", e))?;
    }

    for (i, row) in rows.iter().enumerate() {
        let r = (i + 1) as u32;
        worksheet
            .write_string(r, 0, &row.code)
            .map_err(|e| format!("Failed to write row {}: {}", r, e))?;
        for (offset, value) in row.values().iter().enumerate() {
            worksheet
                .write_number(r, (offset + 1) as u16, *value)
                .map_err(|e| format!("Failed to write row {}: {}", r, e))?;
        }
    }

    worksheet
        .set_freeze_panes(1, 0)
        .map_err(|e| format!("Failed to freeze header: {}", e))?;
    worksheet
        .set_column_width(0, 16)
        .map_err(|e| format!("Failed to size columns: {}", e))?;

    workbook
        .save(path)
        .map_err(|e| format!("Failed to save XLSX file: {}", e))?;
    Ok(())
}
