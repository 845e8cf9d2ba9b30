use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::ReconError;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// The four source ledgers of a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerKind {
    Opening,
    Purchases,
    Returns,
    Sales,
}

impl LedgerKind {
    pub const ALL: [LedgerKind; 4] = [Self::Opening, Self::Purchases, Self::Returns, Self::Sales];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Opening => "opening",
            Self::Purchases => "purchases",
            Self::Returns => "returns",
            Self::Sales => "sales",
        }
    }
}

impl std::fmt::Display for LedgerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A single raw row from any ledger, keyed by header name.
#[derive(Debug, Clone, Default)]
pub struct LedgerRow {
    pub fields: HashMap<String, String>,
}

impl LedgerRow {
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for LedgerRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// One loaded ledger: its header row plus data rows.
#[derive(Debug, Clone)]
pub struct Ledger {
    pub kind: LedgerKind,
    pub headers: Vec<String>,
    pub rows: Vec<LedgerRow>,
}

/// Pre-loaded ledgers keyed by kind.
#[derive(Debug, Default)]
pub struct ReconInput {
    pub ledgers: BTreeMap<LedgerKind, Ledger>,
}

impl ReconInput {
    pub fn new(ledgers: impl IntoIterator<Item = Ledger>) -> Self {
        Self {
            ledgers: ledgers.into_iter().map(|l| (l.kind, l)).collect(),
        }
    }

    pub fn ledger(&self, kind: LedgerKind) -> Result<&Ledger, ReconError> {
        self.ledgers.get(&kind).ok_or(ReconError::MissingLedger(kind))
    }

    /// Fails on the first absent ledger, before any processing starts.
    pub fn ensure_complete(&self) -> Result<(), ReconError> {
        for kind in LedgerKind::ALL {
            self.ledger(kind)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Working records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct InventoryTotals {
    pub opening: f64,
    pub purchased: f64,
    pub returned: f64,
}

impl InventoryTotals {
    pub fn available(&self) -> f64 {
        self.opening + self.purchased - self.returned
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SalesAggregate {
    pub quantity: f64,
    pub amount: f64,
    pub tax: f64,
    /// Rate of the first sales row seen for the code.
    pub tax_rate: f64,
}

/// Inventory and sales of one product code, mutated by redistribution and balancing.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciledRecord {
    pub code: String,
    pub inventory: InventoryTotals,
    pub sales: SalesAggregate,
}

impl ReconciledRecord {
    /// Always derived from the current quantity.
    pub fn ending_balance(&self) -> f64 {
        self.inventory.available() - self.sales.quantity
    }
}

/// Totals moved inside one tax bracket.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BracketOutcome {
    pub tax_rate: f64,
    pub donors: usize,
    pub recipients: usize,
    pub moved_quantity: f64,
    pub moved_amount: f64,
    pub moved_tax: f64,
}

impl BracketOutcome {
    pub fn redistributed(&self) -> bool {
        self.donors > 0 && self.recipients > 0
    }
}

/// Result of scaling one column onto its target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleOutcome {
    pub ratio: f64,
    /// Target minus the sum of floored values.
    pub remainder: f64,
    /// Index of the record that absorbed the remainder.
    pub absorbed_by: Option<usize>,
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

/// One line of the balanced report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub code: String,
    pub opening: f64,
    pub purchased: f64,
    pub returned: f64,
    pub quantity: f64,
    pub sales_amount: f64,
    pub tax_amount: f64,
    pub ending_balance: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconSummary {
    pub products: usize,
    pub negative_before: usize,
    pub negative_after: usize,
    pub sales_total_before: f64,
    pub sales_total_after: f64,
    pub tax_total_before: f64,
    pub tax_total_after: f64,
    pub sales_scale: ScaleReport,
    pub tax_scale: ScaleReport,
    pub brackets: Vec<BracketOutcome>,
}

/// Serializable view of a [`ScaleOutcome`], naming the absorbing product.
#[derive(Debug, Clone, Serialize)]
pub struct ScaleReport {
    pub ratio: f64,
    pub remainder: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub absorbed_by: Option<String>,
}

impl ScaleReport {
    pub fn new(outcome: &ScaleOutcome, records: &[ReconciledRecord]) -> Self {
        Self {
            ratio: outcome.ratio,
            remainder: outcome.remainder,
            absorbed_by: outcome.absorbed_by.map(|i| records[i].code.clone()),
        }
    }
}

impl ReconSummary {
    pub fn brackets_redistributed(&self) -> usize {
        self.brackets.iter().filter(|b| b.redistributed()).count()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub config_name: String,
    pub engine_version: String,
    pub run_at: String,
    pub target_sales_amount: f64,
    pub target_tax_amount: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconResult {
    pub meta: ReconMeta,
    pub summary: ReconSummary,
    pub rows: Vec<ReportRow>,
}
