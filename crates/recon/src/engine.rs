use std::collections::{BTreeMap, HashMap};

use crate::aggregate::aggregate;
use crate::balance::{balance_sales, balance_tax};
use crate::columns::{require_columns, resolve_inventory_columns};
use crate::config::{ColumnConfig, StockConfig};
use crate::error::ReconError;
use crate::merge::{merge, InventoryAggregates};
use crate::model::{
    Ledger, LedgerKind, LedgerRow, ReconInput, ReconMeta, ReconResult, ReconSummary,
    ReconciledRecord, ScaleReport,
};
use crate::redistribute::redistribute;
use crate::report::build_report;

/// Run the full pipeline: merge, redistribute, balance, report.
pub fn run(config: &StockConfig, input: &ReconInput) -> Result<ReconResult, ReconError> {
    input.ensure_complete()?;
    let targets = config.targets.resolve()?;

    let mut records = build_records(&config.columns, input)?;

    let negative_before = count_negative(&records);
    let (sales_total_before, tax_total_before) = sales_totals(&records);
    log::info!(
        "{} products, {} with negative ending balance",
        records.len(),
        negative_before
    );

    let brackets = redistribute(&mut records);

    let sales_outcome = balance_sales(&mut records, targets.sales_amount);
    let tax_outcome = balance_tax(&mut records, targets.tax_amount);

    let rows = build_report(&records);
    let (sales_total_after, tax_total_after) = sales_totals(&records);

    let summary = ReconSummary {
        products: records.len(),
        negative_before,
        negative_after: count_negative(&records),
        sales_total_before,
        sales_total_after,
        tax_total_before,
        tax_total_after,
        sales_scale: ScaleReport::new(&sales_outcome, &records),
        tax_scale: ScaleReport::new(&tax_outcome, &records),
        brackets,
    };

    Ok(ReconResult {
        meta: ReconMeta {
            config_name: config.name.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
            target_sales_amount: targets.sales_amount,
            target_tax_amount: targets.tax_amount,
        },
        summary,
        rows,
    })
}

/// Aggregate the four ledgers into one record per product code.
pub fn build_records(
    columns: &ColumnConfig,
    input: &ReconInput,
) -> Result<Vec<ReconciledRecord>, ReconError> {
    input.ensure_complete()?;

    let inventory = InventoryAggregates {
        opening: inventory_sums(columns, input, LedgerKind::Opening)?,
        purchased: inventory_sums(columns, input, LedgerKind::Purchases)?,
        returned: inventory_sums(columns, input, LedgerKind::Returns)?,
    };

    let sales = input.ledger(LedgerKind::Sales)?;
    require_columns(LedgerKind::Sales, &sales.headers, &columns.sales.all())?;

    Ok(merge(&inventory, &sales.rows, &columns.sales))
}

fn inventory_sums(
    columns: &ColumnConfig,
    input: &ReconInput,
    kind: LedgerKind,
) -> Result<BTreeMap<String, f64>, ReconError> {
    let ledger = input.ledger(kind)?;
    let cols = resolve_inventory_columns(ledger, &columns.code, &columns.quantity)?;
    Ok(aggregate(&ledger.rows, &cols.code, &cols.quantity))
}

fn count_negative(records: &[ReconciledRecord]) -> usize {
    records.iter().filter(|r| r.ending_balance() < 0.0).count()
}

/// (sales amount, tax) over all records.
fn sales_totals(records: &[ReconciledRecord]) -> (f64, f64) {
    records
        .iter()
        .fold((0.0, 0.0), |(amount, tax), r| (amount + r.sales.amount, tax + r.sales.tax))
}

/// Parse delimited text with a header row into a ledger.
///
/// Short rows are accepted; their missing fields are simply absent.
pub fn load_csv_ledger(
    kind: LedgerKind,
    csv_data: &str,
    delimiter: u8,
) -> Result<Ledger, ReconError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(csv_data.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ReconError::Io(format!("{kind} ledger: {e}")))?
        .iter()
        .enumerate()
        .map(|(i, h)| if i == 0 { h.trim_start_matches('\u{feff}') } else { h })
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ReconError::Io(format!("{kind} ledger: {e}")))?;
        let mut fields = HashMap::with_capacity(headers.len());
        for (i, h) in headers.iter().enumerate() {
            if let Some(val) = record.get(i) {
                fields.insert(h.clone(), val.to_string());
            }
        }
        rows.push(LedgerRow { fields });
    }

    log::debug!("{kind} ledger: {} columns, {} rows", headers.len(), rows.len());
    Ok(Ledger { kind, headers, rows })
}
