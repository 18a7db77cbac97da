//! envelope-ledger - zero-based budgeting ledger and allocation engine
//!
//! Every unit of currency that enters an on-budget account is assigned to a
//! spending category for a monthly period. Credit card spending moves money
//! from the spending category into the card's payment category as it happens,
//! and a payment category whose funds fall short of the card's debt is
//! reported as underfunded, with the categories responsible.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Path resolution and persisted settings
//! - `error`: Error types and caller-visible classification
//! - `models`: Core data models (accounts, categories, allocations, transactions)
//! - `storage`: JSON file storage with compensating commits
//! - `services`: Business logic and the balance calculators
//! - `cli`: clap command handlers
//! - `display`: Plain-text table formatting
//!
//! # Example
//!
//! ```rust,no_run
//! use envelope_ledger::config::EnvelopePaths;
//! use envelope_ledger::models::BudgetPeriod;
//! use envelope_ledger::services::BudgetService;
//! use envelope_ledger::storage::Storage;
//!
//! # fn main() -> Result<(), envelope_ledger::EnvelopeError> {
//! let storage = Storage::open(EnvelopePaths::new()?)?;
//! let rta = BudgetService::new(&storage).ready_to_assign(BudgetPeriod::current_month())?;
//! println!("Ready to Assign: {}", rta);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod models;
pub mod services;
pub mod storage;

pub use error::{EnvelopeError, EnvelopeResult};
