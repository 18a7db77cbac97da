//! Allocation model
//!
//! Money assigned to one category for one period. There is at most one
//! allocation per (category, period); amounts are never negative.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{AllocationId, CategoryId};
use super::money::Money;
use super::period::BudgetPeriod;
use crate::error::EnvelopeError;

/// Unique key of an allocation row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AllocationKey {
    pub category_id: CategoryId,
    pub period: BudgetPeriod,
}

impl AllocationKey {
    pub fn new(category_id: CategoryId, period: BudgetPeriod) -> Self {
        Self {
            category_id,
            period,
        }
    }
}

impl fmt::Display for AllocationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.category_id, self.period)
    }
}

/// An amount assigned to a category for a period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub id: AllocationId,
    pub category_id: CategoryId,
    pub period: BudgetPeriod,
    pub amount: Money,

    /// Portion of `amount` moved in from expense categories by credit
    /// spending. It was already assigned once, so it does not draw on
    /// Ready-to-Assign again.
    #[serde(default)]
    pub moved_in: Money,

    #[serde(default)]
    pub notes: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Allocation {
    /// Create an allocation with an initial amount
    pub fn new(category_id: CategoryId, period: BudgetPeriod, amount: Money) -> Self {
        let now = Utc::now();
        Self {
            id: AllocationId::new(),
            category_id,
            period,
            amount,
            moved_in: Money::zero(),
            notes: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn key(&self) -> AllocationKey {
        AllocationKey::new(self.category_id, self.period)
    }

    /// Replace the amount; the moved-in portion never exceeds it
    pub fn set_amount(&mut self, amount: Money) {
        self.amount = amount;
        self.moved_in = self.moved_in.min(amount).floor_zero();
        self.updated_at = Utc::now();
    }

    /// Add to the amount (may be negative, validate afterwards)
    pub fn add_amount(&mut self, amount: Money) {
        self.set_amount(self.amount + amount);
    }

    /// Record funds moved in from an expense category
    pub fn add_moved_in(&mut self, amount: Money) {
        self.amount += amount;
        self.moved_in += amount;
        self.updated_at = Utc::now();
    }

    /// Portion of the amount that was assigned out of income
    pub fn assigned(&self) -> Money {
        self.amount - self.moved_in
    }

    pub fn validate(&self) -> Result<(), EnvelopeError> {
        if self.amount.is_negative() {
            return Err(EnvelopeError::Validation(format!(
                "Allocation amount cannot be negative ({})",
                self.amount
            )));
        }
        if self.moved_in.is_negative() || self.moved_in > self.amount {
            return Err(EnvelopeError::Validation(format!(
                "Moved-in funds ({}) must lie between zero and the allocation amount ({})",
                self.moved_in, self.amount
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Allocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} allocated: {}", self.period, self.amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn period() -> BudgetPeriod {
        BudgetPeriod::monthly(2025, 10).unwrap()
    }

    #[test]
    fn test_add_amount() {
        let mut allocation = Allocation::new(CategoryId::new(), period(), Money::from_cents(10000));
        allocation.add_amount(Money::from_cents(2500));
        assert_eq!(allocation.amount, Money::from_cents(12500));
        assert!(allocation.validate().is_ok());
    }

    #[test]
    fn test_negative_amount_is_invalid() {
        let mut allocation = Allocation::new(CategoryId::new(), period(), Money::from_cents(100));
        allocation.add_amount(Money::from_cents(-101));
        assert!(allocation.validate().is_err());
    }

    #[test]
    fn test_moved_in_is_not_assigned() {
        let mut allocation = Allocation::new(CategoryId::new(), period(), Money::from_cents(5000));
        allocation.add_moved_in(Money::from_cents(20000));
        assert_eq!(allocation.amount, Money::from_cents(25000));
        assert_eq!(allocation.assigned(), Money::from_cents(5000));

        allocation.set_amount(Money::from_cents(15000));
        assert_eq!(allocation.moved_in, Money::from_cents(15000));
        assert_eq!(allocation.assigned(), Money::zero());
    }

    #[test]
    fn test_key() {
        let category_id = CategoryId::new();
        let allocation = Allocation::new(category_id, period(), Money::zero());
        assert_eq!(allocation.key(), AllocationKey::new(category_id, period()));
    }
}
