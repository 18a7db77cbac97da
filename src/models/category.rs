//! Category and CategoryGroup models
//!
//! A category is either a spending purpose or a payment category. A payment
//! category shadows exactly one credit account (`payment_for_account_id`)
//! and holds the money set aside to pay that card off.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{AccountId, CategoryGroupId, CategoryId};
use crate::error::EnvelopeError;

/// A group of related categories (e.g., "Bills", "Needs")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryGroup {
    pub id: CategoryGroupId,
    pub name: String,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
}

impl CategoryGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: CategoryGroupId::new(),
            name: name.into(),
            sort_order: 0,
            created_at: Utc::now(),
        }
    }

    pub fn validate(&self) -> Result<(), EnvelopeError> {
        validate_name("Group", &self.name)
    }
}

impl fmt::Display for CategoryGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A budget category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,

    #[serde(default)]
    pub group_id: Option<CategoryGroupId>,

    /// Set when this is the payment category of a credit account
    #[serde(default, rename = "payment_for_account_id")]
    pub payment_for: Option<AccountId>,

    #[serde(default)]
    pub sort_order: i32,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Category {
    /// Create a regular (spending) category
    pub fn new(name: impl Into<String>, group_id: Option<CategoryGroupId>) -> Self {
        let now = Utc::now();
        Self {
            id: CategoryId::new(),
            name: name.into(),
            group_id,
            payment_for: None,
            sort_order: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create the payment category for a credit account
    pub fn payment_for(name: impl Into<String>, account_id: AccountId) -> Self {
        let mut category = Self::new(name, None);
        category.payment_for = Some(account_id);
        category
    }

    pub fn is_payment_category(&self) -> bool {
        self.payment_for.is_some()
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.updated_at = Utc::now();
    }

    pub fn validate(&self) -> Result<(), EnvelopeError> {
        validate_name("Category", &self.name)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

fn validate_name(what: &str, name: &str) -> Result<(), EnvelopeError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(EnvelopeError::Validation(format!("{} name cannot be empty", what)));
    }
    if name.len() > 100 {
        return Err(EnvelopeError::Validation(format!(
            "{} name too long ({} chars, max 100)",
            what,
            name.len()
        )));
    }
    Ok(())
}
