//! Forces the sales and tax columns onto their control totals.
//!
//! Each column is scaled by `target / total`, floored per row, and whatever
//! the flooring lost is added to the single row with the largest scaled value.

use crate::model::{ReconciledRecord, ScaleOutcome};

/// Scale `values` in place so they sum to `target`.
///
/// A zero total keeps a ratio of 1. Ties for the largest row go to the first.
pub fn scale_to_target(values: &mut [f64], target: f64) -> ScaleOutcome {
    let total: f64 = values.iter().sum();
    let ratio = if total == 0.0 { 1.0 } else { target / total };

    for v in values.iter_mut() {
        *v = (*v * ratio).floor();
    }

    let mut largest: Option<usize> = None;
    for (i, v) in values.iter().enumerate() {
        match largest {
            Some(j) if values[j] >= *v => {}
            _ => largest = Some(i),
        }
    }

    let Some(largest) = largest else {
        return ScaleOutcome {
            ratio,
            remainder: 0.0,
            absorbed_by: None,
        };
    };

    let floored: f64 = values.iter().sum();
    let remainder = target - floored;
    values[largest] += remainder;

    ScaleOutcome {
        ratio,
        remainder,
        absorbed_by: Some(largest),
    }
}

/// Replace every record's sales amount with its scaled value.
pub fn balance_sales(records: &mut [ReconciledRecord], target: f64) -> ScaleOutcome {
    let mut amounts: Vec<f64> = records.iter().map(|r| r.sales.amount).collect();
    let outcome = scale_to_target(&mut amounts, target);
    for (record, amount) in records.iter_mut().zip(amounts) {
        record.sales.amount = amount;
    }
    log::info!(
        "sales scaled by {:.6}, remainder {} absorbed by {}",
        outcome.ratio,
        outcome.remainder,
        absorbed_code(records, outcome.absorbed_by),
    );
    outcome
}

/// Scale tax over records with a positive rate; all other records get zero tax.
pub fn balance_tax(records: &mut [ReconciledRecord], target: f64) -> ScaleOutcome {
    let taxable: Vec<usize> = records
        .iter()
        .enumerate()
        .filter(|(_, r)| r.sales.tax_rate > 0.0)
        .map(|(i, _)| i)
        .collect();

    let mut taxes: Vec<f64> = taxable.iter().map(|&i| records[i].sales.tax).collect();
    let mut outcome = scale_to_target(&mut taxes, target);

    for record in records.iter_mut() {
        if record.sales.tax_rate <= 0.0 {
            record.sales.tax = 0.0;
        }
    }
    for (&i, tax) in taxable.iter().zip(taxes) {
        records[i].sales.tax = tax;
    }

    // report the record index, not the index within the taxable subset
    outcome.absorbed_by = outcome.absorbed_by.map(|k| taxable[k]);

    if taxable.is_empty() {
        log::warn!("no taxable products; tax target {target} cannot be met");
    } else {
        log::info!(
            "tax scaled by {:.6}, remainder {} absorbed by {}",
            outcome.ratio,
            outcome.remainder,
            absorbed_code(records, outcome.absorbed_by),
        );
    }
    outcome
}

fn absorbed_code(records: &[ReconciledRecord], index: Option<usize>) -> &str {
    index.map(|i| records[i].code.as_str()).unwrap_or("-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{InventoryTotals, SalesAggregate};

    fn record(code: &str, amount: f64, tax: f64, rate: f64) -> ReconciledRecord {
        ReconciledRecord {
            code: code.into(),
            inventory: InventoryTotals::default(),
            sales: SalesAggregate {
                quantity: 1.0,
                amount,
                tax,
                tax_rate: rate,
            },
        }
    }

    #[test]
    fn floor_remainder_goes_to_largest_row() {
        // ~1,000,000 scaled to 900,000; flooring loses one unit
        let mut values = vec![370_370.4, 370_370.4, 259_259.2];
        let outcome = scale_to_target(&mut values, 900_000.0);
        assert!((outcome.ratio - 0.9).abs() < 1e-12);
        assert_eq!(values.iter().sum::<f64>(), 900_000.0);
        assert_eq!(outcome.absorbed_by, Some(0));
        assert_eq!(values[1], (370_370.4f64 * outcome.ratio).floor());
    }

    #[test]
    fn missing_unit_added_to_largest_row() {
        let mut values = vec![100_000.5, 700_000.5, 199_999.0];
        // ratio 0.9: 90000.45 -> 90000, 630000.45 -> 630000, 179999.1 -> 179999
        let outcome = scale_to_target(&mut values, 900_000.0);
        assert_eq!(outcome.remainder, 1.0);
        assert_eq!(values, vec![90_000.0, 630_001.0, 179_999.0]);
    }

    #[test]
    fn ties_keep_first_row() {
        let mut values = vec![10.0, 10.0];
        let outcome = scale_to_target(&mut values, 21.0);
        assert_eq!(outcome.absorbed_by, Some(0));
        assert_eq!(values, vec![11.0, 10.0]);
    }

    #[test]
    fn zero_total_keeps_ratio_one() {
        let mut values = vec![0.0, 0.0];
        let outcome = scale_to_target(&mut values, 50.0);
        assert_eq!(outcome.ratio, 1.0);
        assert_eq!(values, vec![50.0, 0.0]);
    }

    #[test]
    fn empty_set_is_left_alone() {
        let mut values: Vec<f64> = vec![];
        let outcome = scale_to_target(&mut values, 50.0);
        assert_eq!(outcome.absorbed_by, None);
        assert_eq!(outcome.remainder, 0.0);
    }

    #[test]
    fn sales_hit_target_exactly() {
        let mut records = vec![
            record("A", 333.33, 0.0, 9.0),
            record("B", 123.45, 0.0, 0.0),
            record("C", 987.65, 0.0, 9.0),
        ];
        balance_sales(&mut records, 10_000.0);
        let total: f64 = records.iter().map(|r| r.sales.amount).sum();
        assert_eq!(total, 10_000.0);
        assert!(records.iter().all(|r| r.sales.amount.fract() == 0.0));
    }

    #[test]
    fn tax_only_on_taxable_records() {
        let mut records = vec![
            record("A", 0.0, 30.0, 9.0),
            record("B", 0.0, 12.0, 0.0),
            record("C", 0.0, 60.0, 9.0),
        ];
        let outcome = balance_tax(&mut records, 1_000.0);
        assert_eq!(records[1].sales.tax, 0.0);
        assert_eq!(records[0].sales.tax + records[2].sales.tax, 1_000.0);
        // C is the largest taxable row and index 2 of all records
        assert_eq!(outcome.absorbed_by, Some(2));
    }

    #[test]
    fn tax_without_taxable_records() {
        let mut records = vec![record("A", 10.0, 5.0, 0.0)];
        let outcome = balance_tax(&mut records, 1_000.0);
        assert_eq!(records[0].sales.tax, 0.0);
        assert_eq!(outcome.absorbed_by, None);
    }

    #[test]
    fn sales_pass_leaves_tax_untouched() {
        let mut records = vec![record("A", 10.0, 0.9, 9.0)];
        balance_sales(&mut records, 20.0);
        assert_eq!(records[0].sales.tax, 0.9);
    }
}
