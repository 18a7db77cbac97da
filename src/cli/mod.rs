//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the service layer.

pub mod account;
pub mod budget;
pub mod category;
pub mod transaction;

pub use account::{handle_account_command, AccountCommands};
pub use budget::{handle_budget_command, BudgetCommands};
pub use category::{handle_category_command, CategoryCommands};
pub use transaction::{handle_transaction_command, TransactionCommands};

use chrono::NaiveDate;
use serde::Serialize;

use crate::config::Settings;
use crate::error::{EnvelopeError, EnvelopeResult};
use crate::models::{Account, BudgetPeriod, Category, Money};
use crate::services::{AccountService, CategoryService};
use crate::storage::Storage;

/// Shared state for every command handler
pub struct CliContext<'a> {
    pub storage: &'a Storage,
    pub settings: &'a Settings,
    /// Print machine-readable JSON instead of tables
    pub json: bool,
}

impl CliContext<'_> {
    pub fn symbol(&self) -> &str {
        &self.settings.currency_symbol
    }

    pub fn account(&self, identifier: &str) -> EnvelopeResult<Account> {
        AccountService::new(self.storage)
            .find(identifier)?
            .ok_or_else(|| EnvelopeError::account_not_found(identifier))
    }

    pub fn category(&self, identifier: &str) -> EnvelopeResult<Category> {
        CategoryService::new(self.storage)
            .find_category(identifier)?
            .ok_or_else(|| EnvelopeError::category_not_found(identifier))
    }
}

/// Pretty-print a value as JSON on stdout
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> EnvelopeResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Parse an optional `YYYY-MM` argument, defaulting to the current month
pub fn parse_period(period: Option<&str>) -> EnvelopeResult<BudgetPeriod> {
    match period {
        Some(p) => BudgetPeriod::parse(p),
        None => Ok(BudgetPeriod::current_month()),
    }
}

/// Parse an optional `YYYY-MM-DD` argument, defaulting to today
pub fn parse_date(date: Option<&str>) -> EnvelopeResult<NaiveDate> {
    match date {
        Some(d) => NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d").map_err(|_| {
            EnvelopeError::Validation(format!("Invalid date '{}', expected YYYY-MM-DD", d))
        }),
        None => Ok(chrono::Local::now().date_naive()),
    }
}

/// Parse a user-entered amount such as "12.50" or "-40"
pub fn parse_amount(amount: &str) -> EnvelopeResult<Money> {
    Money::parse(amount).map_err(|_| {
        EnvelopeError::Validation(format!(
            "Invalid amount '{}'. Use a format like '12.50' or '-40'",
            amount
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_period_default_and_explicit() {
        assert_eq!(parse_period(None).unwrap(), BudgetPeriod::current_month());
        assert_eq!(
            parse_period(Some("2025-10")).unwrap(),
            BudgetPeriod::monthly(2025, 10).unwrap()
        );
        assert!(parse_period(Some("October")).is_err());
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date(Some("2025-10-03")).unwrap(),
            NaiveDate::from_ymd_opt(2025, 10, 3).unwrap()
        );
        assert!(parse_date(Some("10/03/2025")).is_err());
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("-40").unwrap(), Money::from_cents(-4000));
        assert!(parse_amount("lots").is_err());
    }
}
