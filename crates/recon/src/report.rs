use crate::model::{ReconciledRecord, ReportRow};

impl ReportRow {
    /// Numeric cells in export column order, after the code.
    pub fn values(&self) -> [f64; 7] {
        [
            self.opening,
            self.purchased,
            self.returned,
            self.quantity,
            self.sales_amount,
            self.tax_amount,
            self.ending_balance,
        ]
    }
}

/// Project records into report rows, keeping record order.
pub fn build_report(records: &[ReconciledRecord]) -> Vec<ReportRow> {
    records
        .iter()
        .map(|r| ReportRow {
            code: r.code.clone(),
            opening: r.inventory.opening,
            purchased: r.inventory.purchased,
            returned: r.inventory.returned,
            quantity: r.sales.quantity,
            sales_amount: r.sales.amount,
            tax_amount: r.sales.tax,
            ending_balance: r.ending_balance(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{InventoryTotals, SalesAggregate};

    #[test]
    fn ending_balance_uses_current_quantity() {
        let mut record = ReconciledRecord {
            code: "P1".into(),
            inventory: InventoryTotals {
                opening: 10.0,
                purchased: 5.0,
                returned: 1.0,
            },
            sales: SalesAggregate {
                quantity: 20.0,
                amount: 1000.0,
                tax: 90.0,
                tax_rate: 9.0,
            },
        };
        record.sales.quantity = 12.0;

        let rows = build_report(&[record]);
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.code, "P1");
        assert_eq!(row.ending_balance, 2.0);
        assert_eq!(row.values(), [10.0, 5.0, 1.0, 12.0, 1000.0, 90.0, 2.0]);
    }
}
