use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::ReconError;
use crate::model::LedgerKind;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct StockConfig {
    pub name: String,
    pub ledgers: BTreeMap<LedgerKind, LedgerSource>,
    #[serde(default)]
    pub columns: ColumnConfig,
    #[serde(default)]
    pub targets: TargetConfig,
    #[serde(default)]
    pub report: ReportLabels,
    #[serde(default)]
    pub output: OutputConfig,
}

// ---------------------------------------------------------------------------
// Ledger sources
// ---------------------------------------------------------------------------

/// Where one ledger is read from. Paths are relative to the config file.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerSource {
    pub file: String,
    /// Worksheet name for workbook sources; first sheet when omitted.
    #[serde(default)]
    pub sheet: Option<String>,
    /// Field delimiter for delimited text; sniffed when omitted.
    #[serde(default)]
    pub delimiter: Option<char>,
}

impl LedgerSource {
    /// Delimiter as a byte; validation guarantees it is ASCII.
    pub fn delimiter_byte(&self) -> Option<u8> {
        self.delimiter.and_then(|d| u8::try_from(d).ok())
    }
}

// ---------------------------------------------------------------------------
// Column mapping
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ColumnConfig {
    /// Product code header candidates for inventory ledgers, in priority order.
    #[serde(default = "default_code_candidates")]
    pub code: Vec<String>,
    /// Quantity header candidates for inventory ledgers, in priority order.
    #[serde(default = "default_quantity_candidates")]
    pub quantity: Vec<String>,
    #[serde(default)]
    pub sales: SalesColumns,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            code: default_code_candidates(),
            quantity: default_quantity_candidates(),
            sales: SalesColumns::default(),
        }
    }
}

fn default_code_candidates() -> Vec<String> {
    vec!["code".into(), "product_code".into()]
}

fn default_quantity_candidates() -> Vec<String> {
    vec![
        "quantity".into(),
        "qty".into(),
        "count".into(),
        "balance".into(),
        "stock".into(),
    ]
}

/// Exact header names of the sales ledger.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SalesColumns {
    pub code: String,
    pub quantity: String,
    pub tax_rate: String,
    pub amount: String,
    pub tax: String,
}

impl Default for SalesColumns {
    fn default() -> Self {
        Self {
            code: "code".into(),
            quantity: "quantity".into(),
            tax_rate: "tax_rate".into(),
            amount: "amount".into(),
            tax: "tax".into(),
        }
    }
}

impl SalesColumns {
    pub fn all(&self) -> [&str; 5] {
        [&self.code, &self.quantity, &self.tax_rate, &self.amount, &self.tax]
    }
}

// ---------------------------------------------------------------------------
// Targets
// ---------------------------------------------------------------------------

/// Control totals. Either may be left out of the file and supplied at run time.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct TargetConfig {
    #[serde(default)]
    pub sales_amount: Option<f64>,
    #[serde(default)]
    pub tax_amount: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Targets {
    pub sales_amount: f64,
    pub tax_amount: f64,
}

impl TargetConfig {
    pub fn resolve(&self) -> Result<Targets, ReconError> {
        let sales_amount = self.sales_amount.ok_or_else(|| {
            ReconError::ConfigValidation("targets.sales_amount is not set".into())
        })?;
        let tax_amount = self.tax_amount.ok_or_else(|| {
            ReconError::ConfigValidation("targets.tax_amount is not set".into())
        })?;
        Ok(Targets { sales_amount, tax_amount })
    }
}

// ---------------------------------------------------------------------------
// Report + Output
// ---------------------------------------------------------------------------

/// Header labels of the exported report, in column order.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportLabels {
    pub sheet: String,
    pub code: String,
    pub opening: String,
    pub purchased: String,
    pub returned: String,
    pub quantity: String,
    pub sales_amount: String,
    pub tax_amount: String,
    pub ending_balance: String,
}

impl Default for ReportLabels {
    fn default() -> Self {
        Self {
            sheet: "Balanced".into(),
            code: "code".into(),
            opening: "opening".into(),
            purchased: "purchased".into(),
            returned: "returned".into(),
            quantity: "quantity".into(),
            sales_amount: "sales_amount".into(),
            tax_amount: "tax_amount".into(),
            ending_balance: "ending_balance".into(),
        }
    }
}

impl ReportLabels {
    pub fn headers(&self) -> [&str; 8] {
        [
            &self.code,
            &self.opening,
            &self.purchased,
            &self.returned,
            &self.quantity,
            &self.sales_amount,
            &self.tax_amount,
            &self.ending_balance,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    Xlsx,
    Csv,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub format: Option<OutputFormat>,
    #[serde(default)]
    pub json: Option<String>,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl StockConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: StockConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        // All four ledgers, before anything is read
        for kind in LedgerKind::ALL {
            match self.ledgers.get(&kind) {
                None => return Err(ReconError::MissingLedger(kind)),
                Some(src) if src.file.trim().is_empty() => {
                    return Err(ReconError::ConfigValidation(format!(
                        "ledgers.{kind}: file must not be empty"
                    )));
                }
                Some(src) if src.delimiter.is_some_and(|d| !d.is_ascii()) => {
                    return Err(ReconError::ConfigValidation(format!(
                        "ledgers.{kind}: delimiter must be a single ASCII character"
                    )));
                }
                Some(_) => {}
            }
        }

        if self.columns.code.is_empty() {
            return Err(ReconError::ConfigValidation(
                "columns.code needs at least one candidate".into(),
            ));
        }
        if self.columns.quantity.is_empty() {
            return Err(ReconError::ConfigValidation(
                "columns.quantity needs at least one candidate".into(),
            ));
        }
        if let Some(blank) = self.columns.sales.all().iter().position(|c| c.trim().is_empty()) {
            return Err(ReconError::ConfigValidation(format!(
                "columns.sales: column #{} is empty",
                blank + 1
            )));
        }

        for (field, value) in [
            ("sales_amount", self.targets.sales_amount),
            ("tax_amount", self.targets.tax_amount),
        ] {
            if let Some(v) = value {
                if !v.is_finite() || v < 0.0 {
                    return Err(ReconError::ConfigValidation(format!(
                        "targets.{field} must be a non-negative number, got {v}"
                    )));
                }
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
