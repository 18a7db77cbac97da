//! Core data models for the ledger
//!
//! Accounts, categories, allocations and transactions, plus the money,
//! period and id value types they are built from.

pub mod account;
pub mod allocation;
pub mod category;
pub mod ids;
pub mod money;
pub mod period;
pub mod transaction;

pub use account::{Account, AccountType};
pub use allocation::{Allocation, AllocationKey};
pub use category::{Category, CategoryGroup};
pub use ids::{AccountId, AllocationId, CategoryGroupId, CategoryId, TransactionId};
pub use money::Money;
pub use period::BudgetPeriod;
pub use transaction::{Transaction, TransactionType};
