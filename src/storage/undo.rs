//! Before-images for compound writes
//!
//! A service records what it is about to change, applies the changes to the
//! in-memory tables, then commits. If persisting fails the log is replayed in
//! reverse so memory and disk return to the state before the operation.

use crate::error::EnvelopeError;
use crate::models::{
    Account, AccountId, Allocation, AllocationKey, Category, CategoryGroupId, CategoryId,
    Transaction, TransactionId,
};

use super::Storage;

/// One compensating step
#[derive(Debug, Clone)]
pub enum UndoAction {
    /// Put an account back as it was
    RestoreAccount(Account),
    /// Remove an account that the operation created
    RemoveAccount(AccountId),
    RestoreCategory(Category),
    RemoveCategory(CategoryId),
    RemoveGroup(CategoryGroupId),
    RestoreTransaction(Transaction),
    /// Compensating delete for an inserted transaction
    RemoveTransaction(TransactionId),
    /// Previous row for the key, `None` if the operation created it
    RestoreAllocation(AllocationKey, Option<Allocation>),
}

/// Ordered list of compensating steps
#[derive(Debug, Default)]
pub struct UndoLog {
    actions: Vec<UndoAction>,
}

impl UndoLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, action: UndoAction) {
        self.actions.push(action);
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Apply every step, newest first, to the in-memory tables
    ///
    /// All steps are attempted; the first failure is returned.
    pub fn rollback(self, storage: &Storage) -> Result<(), EnvelopeError> {
        let mut first_error = None;

        for action in self.actions.into_iter().rev() {
            let result = match action {
                UndoAction::RestoreAccount(account) => storage.accounts.upsert(account),
                UndoAction::RemoveAccount(id) => storage.accounts.delete(id).map(|_| ()),
                UndoAction::RestoreCategory(category) => {
                    storage.categories.upsert_category(category)
                }
                UndoAction::RemoveCategory(id) => {
                    storage.categories.delete_category(id).map(|_| ())
                }
                UndoAction::RemoveGroup(id) => storage.categories.delete_group(id).map(|_| ()),
                UndoAction::RestoreTransaction(txn) => storage.transactions.upsert(txn),
                UndoAction::RemoveTransaction(id) => storage.transactions.delete(id).map(|_| ()),
                UndoAction::RestoreAllocation(key, previous) => {
                    storage.allocations.restore(key, previous)
                }
            };

            if let Err(e) = result {
                tracing::error!(error = %e, "compensating step failed");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
