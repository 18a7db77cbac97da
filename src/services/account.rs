//! Account service
//!
//! Account records and the lifecycle of credit-card payment categories: one
//! is created with every credit account, renamed with it and deleted with it.

use chrono::Utc;
use tracing::info;

use crate::error::{EnvelopeError, EnvelopeResult};
use crate::models::{Account, AccountId, AccountType, Category, Money};
use crate::storage::{Storage, UndoAction};

/// Service for account management
pub struct AccountService<'a> {
    storage: &'a Storage,
}

/// What an account deletion removed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletedAccount {
    pub transactions: usize,
    pub payment_category: bool,
    pub allocations: usize,
}

impl<'a> AccountService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Create an account; credit accounts get their payment category too
    ///
    /// The opening balance is the account's starting balance, not income.
    pub fn create(
        &self,
        name: &str,
        account_type: AccountType,
        opening_balance: Money,
    ) -> EnvelopeResult<Account> {
        let _guard = self.storage.ledger_lock()?;

        let name = name.trim();
        if self.storage.accounts.name_exists(name, None)? {
            return Err(EnvelopeError::Duplicate {
                entity_type: "Account",
                identifier: name.to_string(),
            });
        }

        let account = Account::with_balance(name, account_type, opening_balance);
        account.validate()?;

        let payment = if account.is_credit() {
            if self.storage.categories.category_name_exists(name, None)? {
                return Err(EnvelopeError::Duplicate {
                    entity_type: "Category",
                    identifier: name.to_string(),
                });
            }
            Some(Category::payment_for(name, account.id))
        } else {
            None
        };

        self.storage.transact(|undo| {
            undo.record(UndoAction::RemoveAccount(account.id));
            self.storage.accounts.upsert(account.clone())?;

            if let Some(payment) = &payment {
                undo.record(UndoAction::RemoveCategory(payment.id));
                self.storage.categories.upsert_category(payment.clone())?;
            }
            Ok(())
        })?;

        info!(
            account = %account.id,
            name = %account.name,
            kind = %account.account_type,
            balance = %account.balance,
            payment_category = payment.is_some(),
            "account created"
        );
        Ok(account)
    }

    pub fn get(&self, id: AccountId) -> EnvelopeResult<Option<Account>> {
        self.storage.accounts.get(id)
    }

    /// Find an account by name, full id or short display id
    pub fn find(&self, identifier: &str) -> EnvelopeResult<Option<Account>> {
        if let Some(account) = self.storage.accounts.get_by_name(identifier)? {
            return Ok(Some(account));
        }

        if let Ok(id) = identifier.parse::<AccountId>() {
            return self.storage.accounts.get(id);
        }

        let identifier = identifier.trim().to_lowercase();
        Ok(self
            .storage
            .accounts
            .get_all()?
            .into_iter()
            .find(|a| a.id.to_string() == identifier))
    }

    /// All accounts, sorted by name
    pub fn list(&self) -> EnvelopeResult<Vec<Account>> {
        self.storage.accounts.get_all()
    }

    /// Rename an account (and its payment category)
    pub fn rename(&self, id: AccountId, name: &str) -> EnvelopeResult<Account> {
        let _guard = self.storage.ledger_lock()?;

        let mut account = self
            .storage
            .accounts
            .get(id)?
            .ok_or_else(|| EnvelopeError::account_not_found(id.to_string()))?;
        let before = account.clone();

        let name = name.trim();
        if self.storage.accounts.name_exists(name, Some(id))? {
            return Err(EnvelopeError::Duplicate {
                entity_type: "Account",
                identifier: name.to_string(),
            });
        }
        account.name = name.to_string();
        account.updated_at = Utc::now();
        account.validate()?;

        let payment = self.storage.categories.get_payment_category(id)?;
        if let Some(payment) = &payment {
            if self
                .storage
                .categories
                .category_name_exists(name, Some(payment.id))?
            {
                return Err(EnvelopeError::Duplicate {
                    entity_type: "Category",
                    identifier: name.to_string(),
                });
            }
        }

        self.storage.transact(|undo| {
            undo.record(UndoAction::RestoreAccount(before.clone()));
            self.storage.accounts.upsert(account.clone())?;

            if let Some(mut payment) = payment {
                undo.record(UndoAction::RestoreCategory(payment.clone()));
                payment.rename(name);
                self.storage.categories.upsert_category(payment)?;
            }
            Ok(())
        })?;

        info!(account = %id, from = %before.name, to = %account.name, "account renamed");
        Ok(account)
    }

    /// Delete an account with its transactions and payment category
    ///
    /// The payment category's allocations go too, and inflows or transfers
    /// on other accounts charged to it lose that category. The delete is
    /// refused while another account still has expenses charged to the
    /// payment category or transfers paired with this account.
    pub fn delete(&self, id: AccountId) -> EnvelopeResult<DeletedAccount> {
        let _guard = self.storage.ledger_lock()?;

        let account = self
            .storage
            .accounts
            .get(id)?
            .ok_or_else(|| EnvelopeError::account_not_found(id.to_string()))?;
        let payment = self.storage.categories.get_payment_category(id)?;

        let referencing = self
            .storage
            .transactions
            .get_all()?
            .iter()
            .filter(|t| t.account_id != id)
            .filter(|t| {
                t.transfer_account_id == Some(id)
                    || (!t.is_transfer()
                        && t.is_outflow()
                        && payment.as_ref().is_some_and(|p| t.category_id == Some(p.id)))
            })
            .count();
        if referencing > 0 {
            return Err(EnvelopeError::Validation(format!(
                "'{}' is referenced by {} transaction(s) on other accounts; \
                 delete or change them first",
                account.name, referencing
            )));
        }

        let deleted = self.storage.transact(|undo| {
            let mut deleted = DeletedAccount::default();

            undo.record(UndoAction::RestoreAccount(account.clone()));
            self.storage.accounts.delete(id)?;

            for txn in self.storage.transactions.delete_for_account(id)? {
                undo.record(UndoAction::RestoreTransaction(txn));
                deleted.transactions += 1;
            }

            if let Some(payment) = &payment {
                undo.record(UndoAction::RestoreCategory(payment.clone()));
                self.storage.categories.delete_category(payment.id)?;
                deleted.payment_category = true;

                for allocation in self.storage.allocations.delete_for_category(payment.id)? {
                    undo.record(UndoAction::RestoreAllocation(
                        allocation.key(),
                        Some(allocation),
                    ));
                    deleted.allocations += 1;
                }
                for txn in self.storage.transactions.clear_category(payment.id)? {
                    undo.record(UndoAction::RestoreTransaction(txn));
                }
            }
            Ok(deleted)
        })?;

        info!(
            account = %id,
            name = %account.name,
            transactions = deleted.transactions,
            allocations = deleted.allocations,
            "account deleted"
        );
        Ok(deleted)
    }
}
