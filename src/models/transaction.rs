//! Transaction model
//!
//! A signed amount posted to one account, optionally charged to a category.
//! Transfers are tagged by the linking collaborator and carry the paired
//! account; they are excluded from income and expense logic.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{AccountId, CategoryId, TransactionId};
use super::money::Money;
use super::period::BudgetPeriod;
use crate::error::EnvelopeError;

/// Ordinary transaction or transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    #[default]
    Normal,
    Transfer,
}

/// A financial transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub account_id: AccountId,

    #[serde(default)]
    pub category_id: Option<CategoryId>,

    /// Positive for inflow, negative for outflow
    pub amount: Money,

    #[serde(default)]
    pub description: String,

    pub date: NaiveDate,

    /// De-duplication token supplied by importers
    #[serde(default)]
    pub import_id: Option<String>,

    #[serde(default, rename = "type")]
    pub kind: TransactionType,

    /// The other side of a transfer
    #[serde(default)]
    pub transfer_account_id: Option<AccountId>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    pub fn new(account_id: AccountId, date: NaiveDate, amount: Money) -> Self {
        let now = Utc::now();
        Self {
            id: TransactionId::new(),
            account_id,
            category_id: None,
            amount,
            description: String::new(),
            date,
            import_id: None,
            kind: TransactionType::Normal,
            transfer_account_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a transaction charged to a category
    pub fn categorized(
        account_id: AccountId,
        category_id: CategoryId,
        date: NaiveDate,
        amount: Money,
        description: impl Into<String>,
    ) -> Self {
        let mut txn = Self::new(account_id, date, amount);
        txn.category_id = Some(category_id);
        txn.description = description.into();
        txn
    }

    /// Mark this as one side of a transfer
    pub fn into_transfer(mut self, paired_account: AccountId) -> Self {
        self.kind = TransactionType::Transfer;
        self.transfer_account_id = Some(paired_account);
        self
    }

    /// The budget period of the transaction date
    pub fn period(&self) -> BudgetPeriod {
        BudgetPeriod::of(self.date)
    }

    pub fn is_transfer(&self) -> bool {
        self.kind == TransactionType::Transfer
    }

    pub fn is_inflow(&self) -> bool {
        self.amount.is_positive()
    }

    pub fn is_outflow(&self) -> bool {
        self.amount.is_negative()
    }

    /// Check if the transaction is charged to the given category
    pub fn is_charged_to(&self, category_id: CategoryId) -> bool {
        self.category_id == Some(category_id)
    }

    pub fn validate(&self) -> Result<(), EnvelopeError> {
        if self.amount.is_zero() {
            return Err(EnvelopeError::Validation(
                "Transaction amount cannot be zero".into(),
            ));
        }

        if self.is_transfer() {
            match self.transfer_account_id {
                None => {
                    return Err(EnvelopeError::Validation(
                        "Transfer is missing its paired account".into(),
                    ))
                }
                Some(paired) if paired == self.account_id => {
                    return Err(EnvelopeError::Validation(
                        "Transfer cannot pair an account with itself".into(),
                    ))
                }
                Some(_) => {}
            }
        } else {
            if self.transfer_account_id.is_some() {
                return Err(EnvelopeError::Validation(
                    "Only transfers can reference a paired account".into(),
                ));
            }
            if self.is_outflow() && self.category_id.is_none() {
                return Err(EnvelopeError::Validation(
                    "Expense transactions require a category".into(),
                ));
            }
        }

        Ok(())
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.date.format("%Y-%m-%d"),
            self.description,
            self.amount
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, 15).unwrap()
    }

    #[test]
    fn test_period_follows_date() {
        let txn = Transaction::new(AccountId::new(), date(), Money::from_cents(500000));
        assert_eq!(txn.period().to_string(), "2025-10");
        assert!(txn.is_inflow());
    }

    #[test]
    fn test_expense_requires_category() {
        let mut txn = Transaction::new(AccountId::new(), date(), Money::from_cents(-2000));
        assert!(txn.validate().is_err());

        txn.category_id = Some(CategoryId::new());
        assert!(txn.validate().is_ok());
    }

    #[test]
    fn test_zero_amount_is_invalid() {
        let txn = Transaction::new(AccountId::new(), date(), Money::zero());
        assert!(txn.validate().is_err());
    }

    #[test]
    fn test_transfer_rules() {
        let account = AccountId::new();
        let outflow = Transaction::new(account, date(), Money::from_cents(-10000))
            .into_transfer(AccountId::new());
        assert!(outflow.is_transfer());
        // Transfers do not need an expense category
        assert!(outflow.validate().is_ok());

        let to_self = Transaction::new(account, date(), Money::from_cents(-10000))
            .into_transfer(account);
        assert!(to_self.validate().is_err());

        let mut stray = Transaction::new(account, date(), Money::from_cents(100));
        stray.transfer_account_id = Some(AccountId::new());
        assert!(stray.validate().is_err());
    }

    #[test]
    fn test_display() {
        let txn = Transaction::categorized(
            AccountId::new(),
            CategoryId::new(),
            date(),
            Money::from_cents(-5000),
            "Corner Store",
        );
        assert_eq!(txn.to_string(), "2025-10-15 Corner Store -$50.00");
    }
}
