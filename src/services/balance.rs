//! Category balance calculation
//!
//! Pure functions over allocation and transaction history. Nothing is cached;
//! every read recomputes from the rows it is handed. Rows belonging to other
//! categories are ignored, so callers may pass whole tables.

use serde::Serialize;

use crate::models::{Allocation, BudgetPeriod, CategoryId, Money, Transaction};

/// Balance figures for one category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryBalance {
    /// Sum of allocations across all periods
    pub total_allocated: Money,
    /// Sum of outflows charged to the category across all periods (transfers included)
    pub total_spent: Money,
    /// `total_allocated - total_spent`, negative when overspent
    pub available: Money,
    /// Signed net of transactions within the requested period, display only
    pub activity: Money,
}

/// Sum of every allocation made to a category
pub fn total_allocated(category_id: CategoryId, allocations: &[Allocation]) -> Money {
    allocations
        .iter()
        .filter(|a| a.category_id == category_id)
        .map(|a| a.amount)
        .sum()
}

/// Sum of the absolute value of every outflow charged to a category
pub fn total_spent(category_id: CategoryId, transactions: &[Transaction]) -> Money {
    transactions
        .iter()
        .filter(|t| t.is_charged_to(category_id) && t.is_outflow())
        .map(|t| t.amount.abs())
        .sum()
}

/// Signed net of transactions charged to a category within exactly `period`
pub fn activity(category_id: CategoryId, period: BudgetPeriod, transactions: &[Transaction]) -> Money {
    transactions
        .iter()
        .filter(|t| t.is_charged_to(category_id) && period.contains(t.date))
        .map(|t| t.amount)
        .sum()
}

/// Full balance of a category, with activity scoped to `period`
pub fn category_balance(
    category_id: CategoryId,
    period: BudgetPeriod,
    allocations: &[Allocation],
    transactions: &[Transaction],
) -> CategoryBalance {
    let total_allocated = total_allocated(category_id, allocations);
    let total_spent = total_spent(category_id, transactions);

    CategoryBalance {
        total_allocated,
        total_spent,
        available: total_allocated - total_spent,
        activity: activity(category_id, period, transactions),
    }
}

/// What a category has left to spend within one period: that period's
/// allocation plus the net activity already posted in it
pub fn period_available(
    category_id: CategoryId,
    period: BudgetPeriod,
    allocations: &[Allocation],
    transactions: &[Transaction],
) -> Money {
    let allocated: Money = allocations
        .iter()
        .filter(|a| a.category_id == category_id && a.period == period)
        .map(|a| a.amount)
        .sum();

    allocated + activity(category_id, period, transactions)
}
