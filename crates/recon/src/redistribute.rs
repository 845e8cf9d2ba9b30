//! Moves over-reported sales from products that ended below zero onto
//! products with stock left, one tax bracket at a time.

use std::collections::BTreeMap;

use ordered_float::OrderedFloat;

use crate::model::{BracketOutcome, ReconciledRecord};

/// Group record indices by tax rate, in ascending rate order.
pub fn tax_brackets(records: &[ReconciledRecord]) -> BTreeMap<OrderedFloat<f64>, Vec<usize>> {
    let mut brackets: BTreeMap<OrderedFloat<f64>, Vec<usize>> = BTreeMap::new();
    for (i, record) in records.iter().enumerate() {
        brackets.entry(OrderedFloat(record.sales.tax_rate)).or_default().push(i);
    }
    brackets
}

/// Run one redistribution pass over every bracket.
pub fn redistribute(records: &mut [ReconciledRecord]) -> Vec<BracketOutcome> {
    tax_brackets(records)
        .into_iter()
        .map(|(rate, members)| redistribute_bracket(records, rate.into_inner(), &members))
        .collect()
}

/// Single pass over one bracket; `members` index into `records`.
///
/// Donors and recipients are fixed up front. A donor gives away
/// `min(1, deficit / max(quantity, 1))` of its quantity, amount and tax; the
/// pooled totals go to recipients weighted by their sales amount.
pub fn redistribute_bracket(
    records: &mut [ReconciledRecord],
    tax_rate: f64,
    members: &[usize],
) -> BracketOutcome {
    let donors: Vec<usize> = members
        .iter()
        .copied()
        .filter(|&i| records[i].ending_balance() < 0.0)
        .collect();
    let recipients: Vec<usize> = members
        .iter()
        .copied()
        .filter(|&i| records[i].ending_balance() > 0.0 && records[i].sales.amount > 0.0)
        .collect();

    let mut outcome = BracketOutcome {
        tax_rate,
        donors: donors.len(),
        recipients: recipients.len(),
        ..BracketOutcome::default()
    };

    if donors.is_empty() || recipients.is_empty() {
        if !donors.is_empty() {
            log::warn!(
                "tax rate {tax_rate}: {} product(s) below zero but no product with headroom",
                donors.len()
            );
        }
        return outcome;
    }

    for &i in &donors {
        let record = &mut records[i];
        let deficit = -record.ending_balance();
        let ratio = (deficit / record.sales.quantity.max(1.0)).min(1.0);

        let qty = record.sales.quantity * ratio;
        let amount = record.sales.amount * ratio;
        let tax = record.sales.tax * ratio;

        record.sales.quantity -= qty;
        record.sales.amount -= amount;
        record.sales.tax -= tax;

        outcome.moved_quantity += qty;
        outcome.moved_amount += amount;
        outcome.moved_tax += tax;
    }

    let total_recipient_amount: f64 = recipients.iter().map(|&i| records[i].sales.amount).sum();

    for &i in &recipients {
        let record = &mut records[i];
        let weight = record.sales.amount / total_recipient_amount;
        record.sales.quantity += weight * outcome.moved_quantity;
        record.sales.amount += weight * outcome.moved_amount;
        record.sales.tax += weight * outcome.moved_tax;
    }

    log::debug!(
        "tax rate {tax_rate}: moved qty {} amount {} tax {} from {} donor(s) to {} recipient(s)",
        outcome.moved_quantity,
        outcome.moved_amount,
        outcome.moved_tax,
        outcome.donors,
        outcome.recipients,
    );
    outcome
}
