//! Account model
//!
//! Accounts hold money (checking, savings, cash) or owe it (credit). The
//! running balance is in minor units; credit accounts sit at or below zero
//! while carrying debt.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::AccountId;
use super::money::Money;
use crate::error::EnvelopeError;

/// Type of account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    #[default]
    Checking,
    Savings,
    Cash,
    /// Revolving credit; gets a payment category
    Credit,
}

impl AccountType {
    /// Returns true for revolving credit accounts
    pub fn is_credit(&self) -> bool {
        matches!(self, Self::Credit)
    }

    /// Parse account type from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "checking" => Some(Self::Checking),
            "savings" => Some(Self::Savings),
            "cash" => Some(Self::Cash),
            "credit" | "credit_card" | "creditcard" => Some(Self::Credit),
            _ => None,
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Checking => write!(f, "Checking"),
            Self::Savings => write!(f, "Savings"),
            Self::Cash => write!(f, "Cash"),
            Self::Credit => write!(f, "Credit Card"),
        }
    }
}

/// A financial account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,

    /// Display name (e.g., "Chase Visa")
    pub name: String,

    #[serde(rename = "type")]
    pub account_type: AccountType,

    /// Running balance, mutated by every transaction on the account
    pub balance: Money,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Create a new account with a zero balance
    pub fn new(name: impl Into<String>, account_type: AccountType) -> Self {
        let now = Utc::now();
        Self {
            id: AccountId::new(),
            name: name.into(),
            account_type,
            balance: Money::zero(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a new account with an opening balance
    pub fn with_balance(name: impl Into<String>, account_type: AccountType, balance: Money) -> Self {
        let mut account = Self::new(name, account_type);
        account.balance = balance;
        account
    }

    pub fn is_credit(&self) -> bool {
        self.account_type.is_credit()
    }

    /// Debt owed on this account (zero when the balance is not negative)
    pub fn debt(&self) -> Money {
        (-self.balance).floor_zero()
    }

    /// Apply a signed transaction amount to the running balance
    pub fn apply(&mut self, amount: Money) {
        self.balance += amount;
        self.updated_at = Utc::now();
    }

    /// Validate the account
    pub fn validate(&self) -> Result<(), EnvelopeError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(EnvelopeError::Validation("Account name cannot be empty".into()));
        }
        if name.len() > 100 {
            return Err(EnvelopeError::Validation(format!(
                "Account name too long ({} chars, max 100)",
                name.len()
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.account_type)
    }
}
