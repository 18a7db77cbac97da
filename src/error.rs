//! Error types for the ledger engine
//!
//! `EnvelopeError` is the internal error hierarchy (thiserror). Callers at a
//! service boundary should classify errors with [`EnvelopeError::kind`] and
//! show [`EnvelopeError::public_message`], which never exposes store detail.

use serde::Serialize;
use thiserror::Error;

use crate::models::Money;

/// The main error type for ledger operations
#[derive(Error, Debug)]
pub enum EnvelopeError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Storage errors (lock poisoning, failed writes)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Malformed or rule-breaking input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// Duplicate entity errors
    #[error("{entity_type} already exists: {identifier}")]
    Duplicate {
        entity_type: &'static str,
        identifier: String,
    },

    /// Cover-underfunded invoked on a category without a credit account
    #[error("'{0}' is not a payment category")]
    NotAPaymentCategory(String),

    /// Cover-underfunded invoked with nothing to cover
    #[error("'{0}' is not underfunded")]
    NotUnderfunded(String),

    /// Ready to Assign is smaller than the amount requested
    #[error("Insufficient funds: ready to assign is {ready_to_assign}, shortfall is {shortfall}")]
    InsufficientFunds {
        ready_to_assign: Money,
        shortfall: Money,
    },
}

/// Caller-visible error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    InvalidInput,
    NotAPaymentCategory,
    NotUnderfunded,
    InsufficientFunds,
    Internal,
}

impl EnvelopeError {
    /// Create a "not found" error for accounts
    pub fn account_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Account",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for categories
    pub fn category_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Category",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for category groups
    pub fn group_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Category group",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for transactions
    pub fn transaction_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Transaction",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for allocations
    pub fn allocation_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Allocation",
            identifier: identifier.into(),
        }
    }

    /// Classify this error for a caller
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Validation(_) | Self::Duplicate { .. } => ErrorKind::InvalidInput,
            Self::NotAPaymentCategory(_) => ErrorKind::NotAPaymentCategory,
            Self::NotUnderfunded(_) => ErrorKind::NotUnderfunded,
            Self::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            Self::Config(_) | Self::Io(_) | Self::Json(_) | Self::Storage(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Message that is safe to show outside the process
    pub fn public_message(&self) -> String {
        match self.kind() {
            ErrorKind::Internal => "internal error".to_string(),
            _ => self.to_string(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is an internal (store/connectivity) failure
    pub fn is_internal(&self) -> bool {
        self.kind() == ErrorKind::Internal
    }
}

impl From<std::io::Error> for EnvelopeError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for EnvelopeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for ledger operations
pub type EnvelopeResult<T> = Result<T, EnvelopeError>;
