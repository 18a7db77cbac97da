//! Account repository for JSON storage

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::EnvelopeError;
use crate::models::{Account, AccountId};

use super::file_io::{read_json, write_json_atomic};
use super::{read_guard, write_guard};

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct AccountData {
    accounts: Vec<Account>,
}

/// Repository for account persistence
pub struct AccountRepository {
    path: PathBuf,
    data: RwLock<HashMap<AccountId, Account>>,
}

impl AccountRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
        }
    }

    /// Load accounts from disk
    pub fn load(&self) -> Result<(), EnvelopeError> {
        let file_data: AccountData = read_json(&self.path)?;

        let mut data = write_guard(&self.data)?;
        data.clear();
        data.extend(file_data.accounts.into_iter().map(|a| (a.id, a)));
        Ok(())
    }

    /// Save accounts to disk
    pub fn save(&self) -> Result<(), EnvelopeError> {
        let data = read_guard(&self.data)?;

        let mut accounts: Vec<_> = data.values().cloned().collect();
        accounts.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.name.cmp(&b.name)));

        write_json_atomic(&self.path, &AccountData { accounts })
    }

    pub fn get(&self, id: AccountId) -> Result<Option<Account>, EnvelopeError> {
        Ok(read_guard(&self.data)?.get(&id).cloned())
    }

    /// Get all accounts, sorted by name
    pub fn get_all(&self) -> Result<Vec<Account>, EnvelopeError> {
        let mut accounts: Vec<_> = read_guard(&self.data)?.values().cloned().collect();
        accounts.sort_by_key(|a| a.name.to_lowercase());
        Ok(accounts)
    }

    /// Get an account by name (case-insensitive)
    pub fn get_by_name(&self, name: &str) -> Result<Option<Account>, EnvelopeError> {
        let name_lower = name.trim().to_lowercase();
        Ok(read_guard(&self.data)?
            .values()
            .find(|a| a.name.to_lowercase() == name_lower)
            .cloned())
    }

    /// Insert or update an account
    pub fn upsert(&self, account: Account) -> Result<(), EnvelopeError> {
        write_guard(&self.data)?.insert(account.id, account);
        Ok(())
    }

    pub fn delete(&self, id: AccountId) -> Result<bool, EnvelopeError> {
        Ok(write_guard(&self.data)?.remove(&id).is_some())
    }

    /// Check if an account name is already taken
    pub fn name_exists(
        &self,
        name: &str,
        exclude_id: Option<AccountId>,
    ) -> Result<bool, EnvelopeError> {
        let name_lower = name.trim().to_lowercase();
        Ok(read_guard(&self.data)?
            .values()
            .any(|a| a.name.to_lowercase() == name_lower && Some(a.id) != exclude_id))
    }

    pub fn count(&self) -> Result<usize, EnvelopeError> {
        Ok(read_guard(&self.data)?.len())
    }
}
