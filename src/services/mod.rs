//! Service layer
//!
//! Business logic on top of the storage layer. The calculators
//! (`balance`, `underfunded`, `ready_to_assign`) are pure functions over
//! history; the services borrow a [`crate::storage::Storage`] and own
//! validation, locking and compensation for every write.

pub mod account;
pub mod balance;
pub mod budget;
pub mod category;
pub mod ready_to_assign;
pub mod transaction;
pub mod underfunded;

pub use account::{AccountService, DeletedAccount};
pub use balance::CategoryBalance;
pub use budget::{BudgetService, CategorySummary, CoverResult};
pub use category::CategoryService;
pub use transaction::{CreateTransactionInput, TransactionService, UpdateTransactionInput};
pub use underfunded::UnderfundedReport;
