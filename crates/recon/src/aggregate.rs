use std::collections::BTreeMap;

use crate::model::LedgerRow;

/// Lenient numeric read: anything that is not a finite number counts as zero.
pub fn parse_number(raw: Option<&str>) -> f64 {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Trimmed product code of a row, `None` when absent or blank.
pub fn group_key<'a>(row: &'a LedgerRow, column: &str) -> Option<&'a str> {
    row.get(column).map(str::trim).filter(|k| !k.is_empty())
}

/// Group rows by `group_column` and sum `value_column`.
///
/// Rows with a blank key are skipped; unparseable values add zero.
pub fn aggregate(
    rows: &[LedgerRow],
    group_column: &str,
    value_column: &str,
) -> BTreeMap<String, f64> {
    let mut sums: BTreeMap<String, f64> = BTreeMap::new();
    let mut skipped = 0usize;

    for row in rows {
        let Some(key) = group_key(row, group_column) else {
            skipped += 1;
            continue;
        };
        *sums.entry(key.to_string()).or_insert(0.0) += parse_number(row.get(value_column));
    }

    if skipped > 0 {
        log::debug!(
            "aggregate '{value_column}' by '{group_column}': \
             skipped {skipped} row(s) without a code"
        );
    }
    sums
}
