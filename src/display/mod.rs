//! Display formatting for terminal output
//!
//! Plain-text tables for the CLI. Amounts use the configured currency symbol.

pub mod account;
pub mod category;
pub mod transaction;

pub use account::format_account_list;
pub use category::{format_budget_summary, format_category_tree};
pub use transaction::format_transaction_register;
