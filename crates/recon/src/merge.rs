use std::collections::{BTreeMap, BTreeSet};

use crate::aggregate::{group_key, parse_number};
use crate::config::SalesColumns;
use crate::model::{InventoryTotals, LedgerRow, ReconciledRecord, SalesAggregate};

/// Per-code quantity sums of the three inventory ledgers.
#[derive(Debug, Default)]
pub struct InventoryAggregates {
    pub opening: BTreeMap<String, f64>,
    pub purchased: BTreeMap<String, f64>,
    pub returned: BTreeMap<String, f64>,
}

impl InventoryAggregates {
    fn totals(&self, code: &str) -> InventoryTotals {
        InventoryTotals {
            opening: self.opening.get(code).copied().unwrap_or(0.0),
            purchased: self.purchased.get(code).copied().unwrap_or(0.0),
            returned: self.returned.get(code).copied().unwrap_or(0.0),
        }
    }

    fn codes(&self) -> impl Iterator<Item = &String> {
        self.opening
            .keys()
            .chain(self.purchased.keys())
            .chain(self.returned.keys())
    }
}

/// Group sales rows by code, summing quantity, amount and tax.
///
/// The tax rate is taken from the first row of each code.
pub fn aggregate_sales(
    rows: &[LedgerRow],
    columns: &SalesColumns,
) -> BTreeMap<String, SalesAggregate> {
    let mut sales: BTreeMap<String, SalesAggregate> = BTreeMap::new();
    let mut conflicting: BTreeSet<String> = BTreeSet::new();

    for row in rows {
        let Some(code) = group_key(row, &columns.code) else {
            continue;
        };
        let rate = parse_number(row.get(&columns.tax_rate));
        let entry = sales.entry(code.to_string()).or_insert_with(|| SalesAggregate {
            tax_rate: rate,
            ..SalesAggregate::default()
        });
        if entry.tax_rate != rate {
            conflicting.insert(code.to_string());
        }
        entry.quantity += parse_number(row.get(&columns.quantity));
        entry.amount += parse_number(row.get(&columns.amount));
        entry.tax += parse_number(row.get(&columns.tax));
    }

    for code in &conflicting {
        log::warn!(
            "product '{code}': sales rows disagree on tax rate, keeping first ({})",
            sales[code].tax_rate
        );
    }
    sales
}

/// One record per code seen in any ledger, sorted by code.
///
/// Codes missing from a ledger get zeros for that ledger's fields.
pub fn merge(
    inventory: &InventoryAggregates,
    sales_rows: &[LedgerRow],
    columns: &SalesColumns,
) -> Vec<ReconciledRecord> {
    let sales = aggregate_sales(sales_rows, columns);

    let codes: BTreeSet<&String> = inventory.codes().chain(sales.keys()).collect();

    codes
        .into_iter()
        .map(|code| ReconciledRecord {
            code: code.clone(),
            inventory: inventory.totals(code),
            sales: sales.get(code).copied().unwrap_or_default(),
        })
        .collect()
}
