//! Ready-to-Assign calculation
//!
//! Income received through a period minus everything assigned through that
//! period. There is no stored running total; the figure is recomputed from
//! history on every call and may be negative.

use crate::models::{Allocation, BudgetPeriod, Money, Transaction};

/// Non-transfer inflows dated in or before `period`
pub fn income_through(period: BudgetPeriod, transactions: &[Transaction]) -> Money {
    transactions
        .iter()
        .filter(|t| t.is_inflow() && !t.is_transfer() && t.period() <= period)
        .map(|t| t.amount)
        .sum()
}

/// Amounts assigned out of income for periods up to and including `period`
///
/// Funds moved into a payment category by credit spending were already
/// assigned to the expense category they came from and are not counted twice.
pub fn assigned_through(period: BudgetPeriod, allocations: &[Allocation]) -> Money {
    allocations
        .iter()
        .filter(|a| a.period <= period)
        .map(|a| a.assigned())
        .sum()
}

/// Income not yet assigned to any category as of `period`
pub fn ready_to_assign(
    period: BudgetPeriod,
    transactions: &[Transaction],
    allocations: &[Allocation],
) -> Money {
    let income = income_through(period, transactions);
    let assigned = assigned_through(period, allocations);
    let ready = income - assigned;

    tracing::debug!(%period, %income, %assigned, %ready, "ready to assign");
    ready
}
