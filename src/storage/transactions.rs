//! Transaction repository for JSON storage
//!
//! Keeps secondary indexes by account and by category. Locks are always
//! taken in the order data, by_account, by_category.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::EnvelopeError;
use crate::models::{AccountId, CategoryId, Transaction, TransactionId};

use super::file_io::{read_json, write_json_atomic};
use super::{read_guard, write_guard};

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct TransactionData {
    transactions: Vec<Transaction>,
}

type Index<K> = HashMap<K, Vec<TransactionId>>;

/// Repository for transaction persistence with indexing
pub struct TransactionRepository {
    path: PathBuf,
    data: RwLock<HashMap<TransactionId, Transaction>>,
    by_account: RwLock<Index<AccountId>>,
    by_category: RwLock<Index<CategoryId>>,
}

fn index(txn: &Transaction, by_account: &mut Index<AccountId>, by_category: &mut Index<CategoryId>) {
    by_account.entry(txn.account_id).or_default().push(txn.id);
    if let Some(category_id) = txn.category_id {
        by_category.entry(category_id).or_default().push(txn.id);
    }
}

fn unindex(
    txn: &Transaction,
    by_account: &mut Index<AccountId>,
    by_category: &mut Index<CategoryId>,
) {
    if let Some(ids) = by_account.get_mut(&txn.account_id) {
        ids.retain(|&id| id != txn.id);
    }
    if let Some(category_id) = txn.category_id {
        if let Some(ids) = by_category.get_mut(&category_id) {
            ids.retain(|&id| id != txn.id);
        }
    }
}

/// Newest first
fn sort_newest_first(transactions: &mut [Transaction]) {
    transactions.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));
}

impl TransactionRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
            by_account: RwLock::new(HashMap::new()),
            by_category: RwLock::new(HashMap::new()),
        }
    }

    /// Load transactions from disk and build indexes
    pub fn load(&self) -> Result<(), EnvelopeError> {
        let file_data: TransactionData = read_json(&self.path)?;

        let mut data = write_guard(&self.data)?;
        let mut by_account = write_guard(&self.by_account)?;
        let mut by_category = write_guard(&self.by_category)?;

        data.clear();
        by_account.clear();
        by_category.clear();

        for txn in file_data.transactions {
            index(&txn, &mut by_account, &mut by_category);
            data.insert(txn.id, txn);
        }

        Ok(())
    }

    /// Save transactions to disk
    pub fn save(&self) -> Result<(), EnvelopeError> {
        let data = read_guard(&self.data)?;

        let mut transactions: Vec<_> = data.values().cloned().collect();
        sort_newest_first(&mut transactions);

        write_json_atomic(&self.path, &TransactionData { transactions })
    }

    pub fn get(&self, id: TransactionId) -> Result<Option<Transaction>, EnvelopeError> {
        Ok(read_guard(&self.data)?.get(&id).cloned())
    }

    /// Get all transactions, newest first
    pub fn get_all(&self) -> Result<Vec<Transaction>, EnvelopeError> {
        let mut transactions: Vec<_> = read_guard(&self.data)?.values().cloned().collect();
        sort_newest_first(&mut transactions);
        Ok(transactions)
    }

    /// Get transactions posted to an account, newest first
    pub fn get_by_account(&self, account_id: AccountId) -> Result<Vec<Transaction>, EnvelopeError> {
        let data = read_guard(&self.data)?;
        let by_account = read_guard(&self.by_account)?;

        let mut transactions: Vec<_> = by_account
            .get(&account_id)
            .into_iter()
            .flatten()
            .filter_map(|id| data.get(id).cloned())
            .collect();
        sort_newest_first(&mut transactions);
        Ok(transactions)
    }

    /// Get transactions charged to a category, newest first
    pub fn get_by_category(
        &self,
        category_id: CategoryId,
    ) -> Result<Vec<Transaction>, EnvelopeError> {
        let data = read_guard(&self.data)?;
        let by_category = read_guard(&self.by_category)?;

        let mut transactions: Vec<_> = by_category
            .get(&category_id)
            .into_iter()
            .flatten()
            .filter_map(|id| data.get(id).cloned())
            .collect();
        sort_newest_first(&mut transactions);
        Ok(transactions)
    }

    /// Find a transaction on an account by its import de-duplication token
    pub fn find_by_import_id(
        &self,
        account_id: AccountId,
        import_id: &str,
    ) -> Result<Option<Transaction>, EnvelopeError> {
        let data = read_guard(&self.data)?;
        let by_account = read_guard(&self.by_account)?;

        Ok(by_account
            .get(&account_id)
            .into_iter()
            .flatten()
            .filter_map(|id| data.get(id))
            .find(|t| t.import_id.as_deref() == Some(import_id))
            .cloned())
    }

    /// Insert or update a transaction
    pub fn upsert(&self, txn: Transaction) -> Result<(), EnvelopeError> {
        let mut data = write_guard(&self.data)?;
        let mut by_account = write_guard(&self.by_account)?;
        let mut by_category = write_guard(&self.by_category)?;

        if let Some(old) = data.get(&txn.id) {
            unindex(old, &mut by_account, &mut by_category);
        }
        index(&txn, &mut by_account, &mut by_category);
        data.insert(txn.id, txn);
        Ok(())
    }

    /// Delete a transaction, returning it if it existed
    pub fn delete(&self, id: TransactionId) -> Result<Option<Transaction>, EnvelopeError> {
        let mut data = write_guard(&self.data)?;
        let mut by_account = write_guard(&self.by_account)?;
        let mut by_category = write_guard(&self.by_category)?;

        let removed = data.remove(&id);
        if let Some(txn) = &removed {
            unindex(txn, &mut by_account, &mut by_category);
        }
        Ok(removed)
    }

    /// Delete every transaction posted to an account, returning the removed rows
    pub fn delete_for_account(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<Transaction>, EnvelopeError> {
        let mut data = write_guard(&self.data)?;
        let mut by_account = write_guard(&self.by_account)?;
        let mut by_category = write_guard(&self.by_category)?;

        let ids = by_account.remove(&account_id).unwrap_or_default();
        let removed: Vec<_> = ids.iter().filter_map(|id| data.remove(id)).collect();
        for txn in &removed {
            unindex(txn, &mut by_account, &mut by_category);
        }
        Ok(removed)
    }

    /// Detach every transaction from a category, returning the rows as they
    /// were before the change
    pub fn clear_category(
        &self,
        category_id: CategoryId,
    ) -> Result<Vec<Transaction>, EnvelopeError> {
        let mut data = write_guard(&self.data)?;
        let mut by_category = write_guard(&self.by_category)?;

        let ids = by_category.remove(&category_id).unwrap_or_default();
        let mut previous = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(txn) = data.get_mut(&id) {
                previous.push(txn.clone());
                txn.category_id = None;
                txn.updated_at = chrono::Utc::now();
            }
        }
        Ok(previous)
    }

    pub fn count(&self) -> Result<usize, EnvelopeError> {
        Ok(read_guard(&self.data)?.len())
    }
}
