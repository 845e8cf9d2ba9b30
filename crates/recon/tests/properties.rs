// Property-based tests for redistribution and target balancing.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use std::collections::{BTreeMap, BTreeSet};

use proptest::prelude::*;
use stockbal_recon::balance::{balance_sales, balance_tax, scale_to_target};
use stockbal_recon::config::ColumnConfig;
use stockbal_recon::engine::build_records;
use stockbal_recon::model::{
    InventoryTotals, Ledger, LedgerKind, LedgerRow, ReconInput, ReconciledRecord, SalesAggregate,
};
use stockbal_recon::redistribute::redistribute;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn config_256() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

/// A handful of rates so brackets actually share members.
fn arb_rate() -> impl Strategy<Value = f64> {
    prop_oneof![Just(0.0), Just(9.0), Just(10.0)]
}

fn arb_record() -> impl Strategy<Value = (f64, f64, f64, f64)> {
    (0.0..200.0f64, 0.0..100.0f64, 0.0..100_000.0f64, arb_rate())
}

fn arb_records(max: usize) -> impl Strategy<Value = Vec<ReconciledRecord>> {
    proptest::collection::vec(arb_record(), 1..=max).prop_map(|items| {
        items
            .into_iter()
            .enumerate()
            .map(|(i, (available, quantity, amount, rate))| ReconciledRecord {
                code: format!("P{i:03}"),
                inventory: InventoryTotals {
                    opening: available,
                    purchased: 0.0,
                    returned: 0.0,
                },
                sales: SalesAggregate {
                    quantity,
                    amount,
                    tax: amount * rate / 100.0,
                    tax_rate: rate,
                },
            })
            .collect()
    })
}

/// Arbitrary cell: mostly numeric, sometimes text, sometimes empty.
fn arb_cell() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => r"[0-9]{1,4}(\.[0-9]{1,2})?",
        1 => r"[a-zA-Z ]{0,8}",
        1 => Just("".to_string()),
    ]
}

fn arb_code() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => r"[A-F][0-9]",
        1 => Just("".to_string()),
    ]
}

fn arb_inventory_rows() -> impl Strategy<Value = Vec<(String, String)>> {
    proptest::collection::vec((arb_code(), arb_cell()), 0..12)
}

fn arb_sales_rows() -> impl Strategy<Value = Vec<(String, String, String)>> {
    proptest::collection::vec((arb_code(), arb_cell(), arb_cell()), 0..12)
}

fn inventory_ledger(kind: LedgerKind, rows: &[(String, String)]) -> Ledger {
    Ledger {
        kind,
        headers: vec!["code".into(), "quantity".into()],
        rows: rows
            .iter()
            .map(|(code, qty)| {
                [("code", code.as_str()), ("quantity", qty.as_str())]
                    .into_iter()
                    .collect::<LedgerRow>()
            })
            .collect(),
    }
}

fn sales_ledger(rows: &[(String, String, String)]) -> Ledger {
    Ledger {
        kind: LedgerKind::Sales,
        headers: ["code", "quantity", "tax_rate", "amount", "tax"]
            .into_iter()
            .map(String::from)
            .collect(),
        rows: rows
            .iter()
            .map(|(code, qty, amount)| {
                let row: LedgerRow = [
                    ("code", code.as_str()),
                    ("quantity", qty.as_str()),
                    ("tax_rate", "9"),
                    ("amount", amount.as_str()),
                    ("tax", "0"),
                ]
                .into_iter()
                .collect();
                row
            })
            .collect(),
    }
}

fn bracket_totals(records: &[ReconciledRecord]) -> BTreeMap<String, (f64, f64, f64)> {
    let mut totals: BTreeMap<String, (f64, f64, f64)> = BTreeMap::new();
    for r in records {
        let t = totals.entry(r.sales.tax_rate.to_string()).or_default();
        t.0 += r.sales.quantity;
        t.1 += r.sales.amount;
        t.2 += r.sales.tax;
    }
    totals
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-6 * (1.0 + a.abs().max(b.abs()))
}

// ---------------------------------------------------------------------------
// Redistribution
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_256())]
    #[test]
    fn redistribution_conserves_brackets(mut records in arb_records(30)) {
        let before = bracket_totals(&records);
        redistribute(&mut records);
        let after = bracket_totals(&records);

        prop_assert_eq!(before.len(), after.len());
        for (rate, b) in &before {
            let a = after[rate];
            prop_assert!(close(a.0, b.0), "quantity drift in bracket {}: {} vs {}", rate, a.0, b.0);
            prop_assert!(close(a.1, b.1), "amount drift in bracket {}: {} vs {}", rate, a.1, b.1);
            prop_assert!(close(a.2, b.2), "tax drift in bracket {}: {} vs {}", rate, a.2, b.2);
        }
    }
}

proptest! {
    #![proptest_config(config_256())]
    #[test]
    fn donors_never_go_negative(mut records in arb_records(30)) {
        redistribute(&mut records);
        for r in &records {
            prop_assert!(r.sales.quantity >= -1e-9, "{} quantity {}", r.code, r.sales.quantity);
            prop_assert!(r.sales.amount >= -1e-6, "{} amount {}", r.code, r.sales.amount);
            prop_assert!(r.sales.tax >= -1e-6, "{} tax {}", r.code, r.sales.tax);
        }
    }
}

proptest! {
    #![proptest_config(config_256())]
    #[test]
    fn donors_reach_zero_when_quantity_covers_deficit(mut records in arb_records(30)) {
        // donors whose deficit fits inside their own sales land on zero
        let covered: Vec<usize> = records
            .iter()
            .enumerate()
            .filter(|(_, r)| {
                r.sales.quantity >= 1.0
                    && r.ending_balance() < 0.0
                    && -r.ending_balance() <= r.sales.quantity
            })
            .map(|(i, _)| i)
            .collect();
        let before = records.clone();
        let outcomes = redistribute(&mut records);

        for i in covered {
            let rate = before[i].sales.tax_rate;
            let moved = outcomes.iter().any(|o| o.tax_rate == rate && o.redistributed());
            if moved {
                prop_assert!(records[i].ending_balance().abs() < 1e-6,
                    "{} ended at {}", records[i].code, records[i].ending_balance());
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Balancing
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_256())]
    #[test]
    fn scaling_hits_integer_target(
        mut values in proptest::collection::vec(0.0..1_000_000.0f64, 1..40),
        target in 0u64..1_000_000_000_000,
    ) {
        let target = target as f64;
        scale_to_target(&mut values, target);
        prop_assert_eq!(values.iter().sum::<f64>(), target);
    }
}

proptest! {
    #![proptest_config(config_256())]
    #[test]
    fn sales_and_tax_hit_targets(
        mut records in arb_records(30),
        sales_target in 1u64..10_000_000_000,
        tax_target in 1u64..1_000_000_000,
    ) {
        redistribute(&mut records);
        balance_sales(&mut records, sales_target as f64);
        balance_tax(&mut records, tax_target as f64);

        let sales: f64 = records.iter().map(|r| r.sales.amount).sum();
        prop_assert_eq!(sales, sales_target as f64);

        let taxable: Vec<&ReconciledRecord> =
            records.iter().filter(|r| r.sales.tax_rate > 0.0).collect();
        if !taxable.is_empty() {
            let tax: f64 = taxable.iter().map(|r| r.sales.tax).sum();
            prop_assert_eq!(tax, tax_target as f64);
        }
        for r in records.iter().filter(|r| r.sales.tax_rate <= 0.0) {
            prop_assert_eq!(r.sales.tax, 0.0);
        }
    }
}

// ---------------------------------------------------------------------------
// Merging
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_256())]
    #[test]
    fn report_codes_are_union_of_ledgers(
        opening in arb_inventory_rows(),
        purchases in arb_inventory_rows(),
        returns in arb_inventory_rows(),
        sales in arb_sales_rows(),
    ) {
        let input = ReconInput::new([
            inventory_ledger(LedgerKind::Opening, &opening),
            inventory_ledger(LedgerKind::Purchases, &purchases),
            inventory_ledger(LedgerKind::Returns, &returns),
            sales_ledger(&sales),
        ]);
        let records = build_records(&ColumnConfig::default(), &input).unwrap();

        let expected: BTreeSet<String> = opening
            .iter()
            .chain(&purchases)
            .chain(&returns)
            .map(|(code, _)| code.clone())
            .chain(sales.iter().map(|(code, _, _)| code.clone()))
            .filter(|code| !code.is_empty())
            .collect();
        let got: Vec<String> = records.iter().map(|r| r.code.clone()).collect();
        let unique: BTreeSet<String> = got.iter().cloned().collect();

        prop_assert_eq!(got.len(), unique.len(), "duplicate codes");
        prop_assert_eq!(unique, expected);
    }
}
