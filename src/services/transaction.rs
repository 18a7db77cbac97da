//! Transaction service
//!
//! Every write path (manual entry, importers, transfer linking) goes through
//! [`TransactionService::create`] so the side effects always fire: the
//! account balance moves by the amount, and credit-card spending moves the
//! budgeted part of the charge into the card's payment category at once.

use chrono::{NaiveDate, Utc};
use tracing::{debug, info};

use super::balance::period_available;
use crate::error::{EnvelopeError, EnvelopeResult};
use crate::models::{
    Account, AccountId, Allocation, AllocationKey, Category, CategoryId, Money, Transaction,
    TransactionId,
};
use crate::storage::{Storage, UndoAction};

/// Service for transaction management
pub struct TransactionService<'a> {
    storage: &'a Storage,
}

/// Input for creating a new transaction
#[derive(Debug, Clone)]
pub struct CreateTransactionInput {
    pub account_id: AccountId,
    pub category_id: Option<CategoryId>,
    /// Positive for inflow, negative for outflow
    pub amount: Money,
    pub description: String,
    pub date: NaiveDate,
    /// De-duplication token from an importer
    pub import_id: Option<String>,
    /// Set by the transfer-linking collaborator; marks the row as a transfer
    pub transfer_account_id: Option<AccountId>,
}

impl CreateTransactionInput {
    pub fn new(account_id: AccountId, amount: Money, date: NaiveDate) -> Self {
        Self {
            account_id,
            category_id: None,
            amount,
            description: String::new(),
            date,
            import_id: None,
            transfer_account_id: None,
        }
    }

    pub fn category(mut self, category_id: CategoryId) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn import_id(mut self, import_id: impl Into<String>) -> Self {
        self.import_id = Some(import_id.into());
        self
    }

    pub fn transfer_with(mut self, account_id: AccountId) -> Self {
        self.transfer_account_id = Some(account_id);
        self
    }
}

/// Fields to change on an existing transaction
#[derive(Debug, Clone, Default)]
pub struct UpdateTransactionInput {
    pub amount: Option<Money>,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
    /// `Some(None)` clears the category
    pub category_id: Option<Option<CategoryId>>,
}

/// Funds moved into a payment category by one charge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FundMovement {
    pub from: CategoryId,
    pub to: CategoryId,
    pub amount: Money,
}

impl<'a> TransactionService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Create a transaction and apply its effects
    ///
    /// All validation happens before anything is written. If persisting
    /// fails, the insert, the balance change and any fund movement are
    /// undone together.
    pub fn create(&self, input: CreateTransactionInput) -> EnvelopeResult<Transaction> {
        let _guard = self.storage.ledger_lock()?;

        let mut account = self.get_account(input.account_id)?;

        if input.amount.is_zero() {
            return Err(EnvelopeError::Validation(
                "Transaction amount cannot be zero".into(),
            ));
        }

        let category = input
            .category_id
            .map(|id| self.get_category(id))
            .transpose()?;

        if let Some(paired) = input.transfer_account_id {
            self.get_account(paired)?;
        }

        if let Some(import_id) = input.import_id.as_deref() {
            if self
                .storage
                .transactions
                .find_by_import_id(account.id, import_id)?
                .is_some()
            {
                return Err(EnvelopeError::Duplicate {
                    entity_type: "Transaction",
                    identifier: import_id.to_string(),
                });
            }
        }

        let mut txn = Transaction::new(input.account_id, input.date, input.amount);
        txn.category_id = input.category_id;
        txn.description = input.description.trim().to_string();
        txn.import_id = input.import_id;
        if let Some(paired) = input.transfer_account_id {
            txn = txn.into_transfer(paired);
        }
        txn.validate()?;

        // Measured before the new row exists
        let movement = self.plan_movement(&account, category.as_ref(), &txn)?;

        self.storage.transact(|undo| {
            undo.record(UndoAction::RemoveTransaction(txn.id));
            self.storage.transactions.upsert(txn.clone())?;

            undo.record(UndoAction::RestoreAccount(account.clone()));
            account.apply(txn.amount);
            self.storage.accounts.upsert(account.clone())?;

            if let Some(movement) = movement {
                let key = AllocationKey::new(movement.to, txn.period());
                let previous = self.storage.allocations.get(key)?;
                let mut allocation = previous
                    .clone()
                    .unwrap_or_else(|| Allocation::new(movement.to, key.period, Money::zero()));
                allocation.add_moved_in(movement.amount);

                undo.record(UndoAction::RestoreAllocation(key, previous));
                self.storage.allocations.upsert(allocation)?;
            }
            Ok(())
        })?;

        info!(
            transaction = %txn.id,
            account = %account.name,
            amount = %txn.amount,
            balance = %account.balance,
            "transaction created"
        );
        if let Some(movement) = movement {
            info!(
                from = %movement.from,
                to = %movement.to,
                amount = %movement.amount,
                period = %txn.period(),
                "moved budgeted funds to payment category"
            );
        }

        Ok(txn)
    }

    /// Decide how much of a card charge moves to the payment category
    ///
    /// Only non-transfer outflows on a credit account charged to an expense
    /// category move funds. The amount is what the expense category had left
    /// in the charge's period, capped at the charge and never negative.
    fn plan_movement(
        &self,
        account: &Account,
        category: Option<&Category>,
        txn: &Transaction,
    ) -> EnvelopeResult<Option<FundMovement>> {
        let category = match category {
            Some(c) if account.is_credit() && txn.is_outflow() && !txn.is_transfer() => c,
            _ => return Ok(None),
        };
        if category.is_payment_category() {
            return Ok(None);
        }

        let payment = self
            .storage
            .categories
            .get_payment_category(account.id)?
            .ok_or_else(|| {
                EnvelopeError::Storage(format!(
                    "Credit account {} has no payment category",
                    account.id
                ))
            })?;

        let period = txn.period();
        let allocations = self.storage.allocations.get_for_category(category.id)?;
        let history = self.storage.transactions.get_by_category(category.id)?;
        let available = period_available(category.id, period, &allocations, &history);
        let amount = available.min(txn.amount.abs()).floor_zero();

        debug!(
            category = %category.name,
            %period,
            %available,
            charge = %txn.amount,
            to_move = %amount,
            "planning fund movement"
        );

        Ok(amount.is_positive().then_some(FundMovement {
            from: category.id,
            to: payment.id,
            amount,
        }))
    }

    /// Change an existing transaction
    ///
    /// The account balance follows the amount change. Fund movement made when
    /// the transaction was created is left as it is.
    pub fn update(
        &self,
        id: TransactionId,
        input: UpdateTransactionInput,
    ) -> EnvelopeResult<Transaction> {
        let _guard = self.storage.ledger_lock()?;

        let before = self
            .storage
            .transactions
            .get(id)?
            .ok_or_else(|| EnvelopeError::transaction_not_found(id.to_string()))?;
        let mut account = self.get_account(before.account_id)?;

        let mut txn = before.clone();
        if let Some(amount) = input.amount {
            txn.amount = amount;
        }
        if let Some(description) = input.description {
            txn.description = description.trim().to_string();
        }
        if let Some(date) = input.date {
            txn.date = date;
        }
        if let Some(category_id) = input.category_id {
            if let Some(category_id) = category_id {
                self.get_category(category_id)?;
            }
            txn.category_id = category_id;
        }
        txn.validate()?;
        txn.updated_at = Utc::now();

        let delta = txn.amount - before.amount;

        self.storage.transact(|undo| {
            undo.record(UndoAction::RestoreTransaction(before));
            self.storage.transactions.upsert(txn.clone())?;

            if !delta.is_zero() {
                undo.record(UndoAction::RestoreAccount(account.clone()));
                account.apply(delta);
                self.storage.accounts.upsert(account.clone())?;
            }
            Ok(())
        })?;

        info!(transaction = %txn.id, %delta, balance = %account.balance, "transaction updated");
        Ok(txn)
    }

    /// Delete a transaction and reverse its balance effect
    pub fn delete(&self, id: TransactionId) -> EnvelopeResult<Transaction> {
        let _guard = self.storage.ledger_lock()?;

        let txn = self
            .storage
            .transactions
            .get(id)?
            .ok_or_else(|| EnvelopeError::transaction_not_found(id.to_string()))?;
        let mut account = self.get_account(txn.account_id)?;

        self.storage.transact(|undo| {
            undo.record(UndoAction::RestoreTransaction(txn.clone()));
            self.storage.transactions.delete(id)?;

            undo.record(UndoAction::RestoreAccount(account.clone()));
            account.apply(-txn.amount);
            self.storage.accounts.upsert(account.clone())
        })?;

        info!(transaction = %txn.id, balance = %account.balance, "transaction deleted");
        Ok(txn)
    }

    pub fn get(&self, id: TransactionId) -> EnvelopeResult<Option<Transaction>> {
        self.storage.transactions.get(id)
    }

    /// Find a transaction by full id or by its short display form
    pub fn find(&self, identifier: &str) -> EnvelopeResult<Option<Transaction>> {
        if let Ok(id) = identifier.parse::<TransactionId>() {
            return self.storage.transactions.get(id);
        }

        let identifier = identifier.trim().to_lowercase();
        let mut matches = self
            .storage
            .transactions
            .get_all()?
            .into_iter()
            .filter(|t| t.id.to_string() == identifier);

        match (matches.next(), matches.next()) {
            (Some(txn), None) => Ok(Some(txn)),
            (None, _) => Ok(None),
            (Some(_), Some(_)) => Err(EnvelopeError::Validation(format!(
                "Identifier '{}' matches more than one transaction",
                identifier
            ))),
        }
    }

    /// Transactions on an account, newest first
    pub fn list_for_account(&self, account_id: AccountId) -> EnvelopeResult<Vec<Transaction>> {
        self.get_account(account_id)?;
        self.storage.transactions.get_by_account(account_id)
    }

    /// Transactions charged to a category, newest first
    pub fn list_for_category(&self, category_id: CategoryId) -> EnvelopeResult<Vec<Transaction>> {
        self.get_category(category_id)?;
        self.storage.transactions.get_by_category(category_id)
    }

    pub fn list(&self) -> EnvelopeResult<Vec<Transaction>> {
        self.storage.transactions.get_all()
    }

    fn get_account(&self, id: AccountId) -> EnvelopeResult<Account> {
        self.storage
            .accounts
            .get(id)?
            .ok_or_else(|| EnvelopeError::account_not_found(id.to_string()))
    }

    fn get_category(&self, id: CategoryId) -> EnvelopeResult<Category> {
        self.storage
            .categories
            .get_category(id)?
            .ok_or_else(|| EnvelopeError::category_not_found(id.to_string()))
    }
}
