//! Underfunded detection for payment categories
//!
//! A payment category is underfunded when card debt that no expense-category
//! allocation backs is larger than what was assigned straight to the payment
//! category. Expense categories whose own allocations never backed their card
//! spending are reported as the cause.

use std::collections::BTreeMap;

use serde::Serialize;

use super::balance::total_allocated;
use crate::models::{Account, Allocation, CategoryId, Money, Transaction};

/// Card spending grouped by expense category
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySpending {
    pub category_id: CategoryId,
    /// Outflows on the card charged to this category
    pub spending: Money,
    /// The part of `spending` the category's own allocations could cover
    pub contribution: Money,
}

impl CategorySpending {
    pub fn is_under_allocated(&self) -> bool {
        self.spending > self.contribution
    }
}

/// Result of checking one payment category
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnderfundedReport {
    /// What the card owes, zero when the balance is not negative
    pub debt: Money,
    pub total_spending: Money,
    pub total_budgeted: Money,
    /// Spending no expense-category allocation ever backed
    pub unbudgeted_debt: Money,
    /// The payment category's own available balance
    pub payment_available: Money,
    /// Part of the payment category's allocations moved in from expense budgets
    pub payment_moved_in: Money,
    /// Shortfall, never negative
    pub underfunded: Money,
    pub by_category: Vec<CategorySpending>,
}

impl UnderfundedReport {
    pub fn is_underfunded(&self) -> bool {
        self.underfunded.is_positive()
    }

    /// Expense categories responsible for the shortfall, empty when there is none
    pub fn responsible_categories(&self) -> Vec<CategoryId> {
        if !self.is_underfunded() {
            return Vec::new();
        }
        self.by_category
            .iter()
            .filter(|c| c.is_under_allocated())
            .map(|c| c.category_id)
            .collect()
    }
}

/// Check whether a payment category covers its card's spending debt
///
/// Only rows of `transactions` posted to `card` are considered; rows charged
/// to the payment category itself are skipped. Spending an expense category's
/// allocations could back is already covered, either by funds moved into the
/// payment category or by the category's own budget. What remains, capped at
/// the debt, has to come from the payment category's directly assigned funds.
pub fn detect(
    card: &Account,
    payment_category_id: CategoryId,
    payment_available: Money,
    transactions: &[Transaction],
    allocations: &[Allocation],
) -> UnderfundedReport {
    let debt = card.debt();

    let mut spending: BTreeMap<CategoryId, Money> = BTreeMap::new();
    for txn in transactions
        .iter()
        .filter(|t| t.account_id == card.id && t.is_outflow())
    {
        match txn.category_id {
            Some(category_id) if category_id != payment_category_id => {
                *spending.entry(category_id).or_default() += txn.amount.abs();
            }
            _ => {}
        }
    }

    let by_category: Vec<_> = spending
        .into_iter()
        .map(|(category_id, spending)| CategorySpending {
            category_id,
            spending,
            contribution: spending.min(total_allocated(category_id, allocations)),
        })
        .collect();

    let total_spending: Money = by_category.iter().map(|c| c.spending).sum();
    let total_budgeted: Money = by_category.iter().map(|c| c.contribution).sum();
    let unbudgeted_debt = total_spending - total_budgeted;

    let payment_moved_in: Money = allocations
        .iter()
        .filter(|a| a.category_id == payment_category_id)
        .map(|a| a.moved_in)
        .sum();
    // Moved funds already stand for budgeted spending.
    let directly_funded = (payment_available - payment_moved_in).floor_zero();

    let underfunded = if debt.is_zero() {
        Money::zero()
    } else {
        (unbudgeted_debt.min(debt) - directly_funded).floor_zero()
    };

    tracing::debug!(
        card = %card.name,
        %debt,
        %total_spending,
        %total_budgeted,
        %payment_available,
        %payment_moved_in,
        %underfunded,
        "underfunded check"
    );

    UnderfundedReport {
        debt,
        total_spending,
        total_budgeted,
        unbudgeted_debt,
        payment_available,
        payment_moved_in,
        underfunded,
        by_category,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AccountType, BudgetPeriod};
    use chrono::NaiveDate;

    fn oct() -> BudgetPeriod {
        BudgetPeriod::monthly(2025, 10).unwrap()
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, 15).unwrap()
    }

    fn card_with_charges(charges: &[(CategoryId, i64)]) -> (Account, Vec<Transaction>) {
        let mut card = Account::new("Visa", AccountType::Credit);
        let txns: Vec<_> = charges
            .iter()
            .map(|&(category_id, cents)| {
                Transaction::categorized(card.id, category_id, day(), Money::from_cents(cents), "")
            })
            .collect();
        for txn in &txns {
            card.apply(txn.amount);
        }
        (card, txns)
    }

    fn moved(category_id: CategoryId, cents: i64) -> Allocation {
        let mut allocation = Allocation::new(category_id, oct(), Money::zero());
        allocation.add_moved_in(Money::from_cents(cents));
        allocation
    }

    #[test]
    fn test_fully_budgeted_spending_is_covered() {
        let groceries = CategoryId::new();
        let payment = CategoryId::new();
        let (card, txns) = card_with_charges(&[(groceries, -20000)]);
        let allocations = vec![Allocation::new(groceries, oct(), Money::from_cents(50000))];

        let report = detect(&card, payment, Money::from_cents(20000), &txns, &allocations);

        assert_eq!(report.debt, Money::from_cents(20000));
        assert_eq!(report.unbudgeted_debt, Money::zero());
        assert_eq!(report.underfunded, Money::zero());
        assert!(report.responsible_categories().is_empty());
    }

    #[test]
    fn test_under_allocated_category_is_blamed() {
        let groceries = CategoryId::new();
        let dining = CategoryId::new();
        let payment = CategoryId::new();
        let (card, txns) = card_with_charges(&[(groceries, -20000), (dining, -3000)]);
        let allocations = vec![
            Allocation::new(groceries, oct(), Money::from_cents(10000)),
            Allocation::new(dining, oct(), Money::from_cents(3000)),
            moved(payment, 13000),
        ];

        let report = detect(&card, payment, Money::from_cents(13000), &txns, &allocations);

        assert_eq!(report.total_spending, Money::from_cents(23000));
        assert_eq!(report.total_budgeted, Money::from_cents(13000));
        assert_eq!(report.unbudgeted_debt, Money::from_cents(10000));
        assert_eq!(report.payment_moved_in, Money::from_cents(13000));
        assert_eq!(report.underfunded, Money::from_cents(10000));
        assert_eq!(report.responsible_categories(), vec![groceries]);
    }

    #[test]
    fn test_allocation_after_the_charge_backs_it() {
        let groceries = CategoryId::new();
        let payment = CategoryId::new();
        // Nothing moved at charge time; the budget arrived later.
        let (card, txns) = card_with_charges(&[(groceries, -20000)]);
        let allocations = vec![Allocation::new(groceries, oct(), Money::from_cents(50000))];

        let report = detect(&card, payment, Money::zero(), &txns, &allocations);

        assert_eq!(report.total_budgeted, Money::from_cents(20000));
        assert_eq!(report.unbudgeted_debt, Money::zero());
        assert!(!report.is_underfunded());
        assert!(report.responsible_categories().is_empty());
    }

    #[test]
    fn test_paying_with_moved_funds_keeps_unbudgeted_debt() {
        let groceries = CategoryId::new();
        let payment = CategoryId::new();
        let (mut card, txns) = card_with_charges(&[(groceries, -20000)]);
        let allocations = vec![
            Allocation::new(groceries, oct(), Money::from_cents(10000)),
            moved(payment, 10000),
        ];
        // The $100 moved over was spent on a card payment.
        card.apply(Money::from_cents(10000));

        let report = detect(&card, payment, Money::zero(), &txns, &allocations);

        assert_eq!(report.debt, Money::from_cents(10000));
        assert_eq!(report.underfunded, Money::from_cents(10000));
        assert_eq!(report.responsible_categories(), vec![groceries]);
    }

    #[test]
    fn test_shortfall_always_names_a_category() {
        let groceries = CategoryId::new();
        let dining = CategoryId::new();
        let payment = CategoryId::new();
        let (card, txns) = card_with_charges(&[(groceries, -20000), (dining, -5000)]);

        for groceries_budget in [0, 5000, 20000, 30000] {
            for dining_budget in [0, 5000] {
                for moved_cents in [0, 5000, 15000] {
                    for direct_cents in [0, 2500, 10000, 30000] {
                        let allocations = vec![
                            Allocation::new(groceries, oct(), Money::from_cents(groceries_budget)),
                            Allocation::new(dining, oct(), Money::from_cents(dining_budget)),
                            moved(payment, moved_cents),
                        ];
                        let available = Money::from_cents(moved_cents + direct_cents);

                        let report = detect(&card, payment, available, &txns, &allocations);

                        assert!(report.underfunded <= report.unbudgeted_debt);
                        if report.is_underfunded() {
                            assert!(!report.responsible_categories().is_empty());
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_overpaid_card_is_never_underfunded() {
        let groceries = CategoryId::new();
        let (mut card, txns) = card_with_charges(&[(groceries, -20000)]);
        card.apply(Money::from_cents(25000));

        let report = detect(&card, CategoryId::new(), Money::zero(), &txns, &[]);
        assert_eq!(report.debt, Money::zero());
        assert!(!report.is_underfunded());
    }

    #[test]
    fn test_debt_without_spending_is_not_underfunded() {
        let card = Account::with_balance("Visa", AccountType::Credit, Money::from_cents(-90000));

        let report = detect(&card, CategoryId::new(), Money::zero(), &[], &[]);
        assert_eq!(report.debt, Money::from_cents(90000));
        assert_eq!(report.underfunded, Money::zero());
    }

    #[test]
    fn test_more_payment_funds_never_increase_shortfall() {
        let groceries = CategoryId::new();
        let payment = CategoryId::new();
        let (card, txns) = card_with_charges(&[(groceries, -40000)]);

        let mut last = detect(&card, payment, Money::zero(), &txns, &[]).underfunded;
        for step in 1..=6 {
            let available = Money::from_cents(step * 10000);
            let now = detect(&card, payment, available, &txns, &[]).underfunded;
            assert!(now <= last);
            assert_eq!(last - now, Money::from_cents(10000).min(last));
            last = now;
        }
        assert_eq!(last, Money::zero());
    }

    #[test]
    fn test_payment_category_rows_are_skipped() {
        let payment = CategoryId::new();
        let (card, txns) = card_with_charges(&[(payment, -5000)]);

        let report = detect(&card, payment, Money::zero(), &txns, &[]);
        assert!(report.by_category.is_empty());
        assert!(!report.is_underfunded());
    }
}
