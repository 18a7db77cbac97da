//! Ledger storage
//!
//! Four JSON tables (accounts, categories, allocations, transactions), each
//! held in memory behind its own lock and written back atomically. Single
//! repository calls are atomic; compound writes take [`Storage::ledger_lock`]
//! and run through [`Storage::transact`] with an [`UndoLog`].
//!
//! The ledger lock is also an advisory lock on `data/ledger.lock`, so separate
//! processes sharing a data directory take turns. The tables are reloaded once
//! the lock is held.

pub mod accounts;
pub mod allocations;
pub mod categories;
pub mod file_io;
pub mod init;
pub mod transactions;
pub mod undo;

pub use accounts::AccountRepository;
pub use allocations::AllocationRepository;
pub use categories::CategoryRepository;
pub use init::initialize_storage;
pub use transactions::TransactionRepository;
pub use undo::{UndoAction, UndoLog};

use std::fs::{File, OpenOptions};
use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use fs4::fs_std::FileExt;

use crate::config::paths::EnvelopePaths;
use crate::error::EnvelopeError;

pub(crate) fn read_guard<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>, EnvelopeError> {
    lock.read()
        .map_err(|e| EnvelopeError::Storage(format!("Failed to acquire read lock: {}", e)))
}

pub(crate) fn write_guard<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>, EnvelopeError> {
    lock.write()
        .map_err(|e| EnvelopeError::Storage(format!("Failed to acquire write lock: {}", e)))
}

/// Exclusive access to the ledger for one compound operation
///
/// Holds the in-process mutex and the file lock; dropping it releases both.
pub struct LedgerGuard<'a> {
    _file: File,
    _process: MutexGuard<'a, ()>,
}

/// Main storage coordinator that provides access to all repositories
pub struct Storage {
    paths: EnvelopePaths,
    pub accounts: AccountRepository,
    pub categories: CategoryRepository,
    pub allocations: AllocationRepository,
    pub transactions: TransactionRepository,
    ledger: Mutex<()>,
}

impl Storage {
    /// Create a storage coordinator, creating the data directory if needed
    pub fn new(paths: EnvelopePaths) -> Result<Self, EnvelopeError> {
        paths.ensure_directories()?;

        Ok(Self {
            accounts: AccountRepository::new(paths.accounts_file()),
            categories: CategoryRepository::new(paths.categories_file()),
            allocations: AllocationRepository::new(paths.allocations_file()),
            transactions: TransactionRepository::new(paths.transactions_file()),
            ledger: Mutex::new(()),
            paths,
        })
    }

    /// Create a storage coordinator and load every table
    ///
    /// Loading happens under the ledger lock, so no other writer is halfway
    /// through a commit.
    pub fn open(paths: EnvelopePaths) -> Result<Self, EnvelopeError> {
        let storage = Self::new(paths)?;
        drop(storage.ledger_lock()?);
        Ok(storage)
    }

    pub fn paths(&self) -> &EnvelopePaths {
        &self.paths
    }

    /// Load all data from disk
    pub fn load_all(&self) -> Result<(), EnvelopeError> {
        self.accounts.load()?;
        self.categories.load()?;
        self.allocations.load()?;
        self.transactions.load()?;
        Ok(())
    }

    /// Save all data to disk
    ///
    /// Transactions go first so a failed account write can still be
    /// compensated by rewriting the transaction table.
    pub fn save_all(&self) -> Result<(), EnvelopeError> {
        self.transactions.save()?;
        self.accounts.save()?;
        self.allocations.save()?;
        self.categories.save()?;
        Ok(())
    }

    /// Serialise compound read-modify-write operations
    ///
    /// Held for the whole of a create/update/delete, an allocation upsert or
    /// a cover, so no two of them interleave their reads and writes, whether
    /// they run in this process or another one. Every table is reloaded from
    /// disk before the guard is returned.
    pub fn ledger_lock(&self) -> Result<LedgerGuard<'_>, EnvelopeError> {
        let process = self
            .ledger
            .lock()
            .map_err(|e| EnvelopeError::Storage(format!("Failed to acquire ledger lock: {}", e)))?;

        let path = self.paths.lock_file();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| {
                EnvelopeError::Storage(format!("Failed to open {}: {}", path.display(), e))
            })?;
        FileExt::lock_exclusive(&file).map_err(|e| {
            EnvelopeError::Storage(format!("Failed to lock {}: {}", path.display(), e))
        })?;

        // Another process may have written since these tables were loaded.
        self.load_all()?;

        Ok(LedgerGuard {
            _file: file,
            _process: process,
        })
    }

    /// Apply a compound write to the in-memory tables and persist it
    ///
    /// `steps` records a before-image in the log ahead of each change it
    /// makes. If a step fails, what was already recorded is rolled back and
    /// the step's error returned; otherwise the result is committed. The
    /// caller holds the ledger lock.
    pub fn transact<T>(
        &self,
        steps: impl FnOnce(&mut UndoLog) -> Result<T, EnvelopeError>,
    ) -> Result<T, EnvelopeError> {
        let mut undo = UndoLog::new();
        match steps(&mut undo) {
            Ok(value) => {
                self.commit(undo)?;
                Ok(value)
            }
            Err(err) => {
                tracing::warn!(error = %err, steps = undo.len(), "write step failed, rolling back");
                if let Err(rollback_err) = undo.rollback(self) {
                    tracing::error!(error = %rollback_err, "in-memory rollback incomplete");
                }
                Err(err)
            }
        }
    }

    /// Persist the in-memory tables, compensating on failure
    ///
    /// When a write fails the undo log is replayed and the tables are written
    /// again, so nothing from the failed operation survives. The original
    /// error is returned either way.
    pub fn commit(&self, undo: UndoLog) -> Result<(), EnvelopeError> {
        let err = match self.save_all() {
            Ok(()) => return Ok(()),
            Err(e) => e,
        };

        tracing::warn!(error = %err, steps = undo.len(), "write failed, compensating");

        if let Err(rollback_err) = undo.rollback(self) {
            tracing::error!(error = %rollback_err, "in-memory rollback incomplete");
        } else if let Err(resave_err) = self.save_all() {
            tracing::error!(error = %resave_err, "could not persist compensated state");
        }

        Err(err)
    }

    /// Check if the ledger has been initialized
    pub fn is_initialized(&self) -> bool {
        self.paths.is_initialized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Account, AccountType, Money, Transaction};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = EnvelopePaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::open(paths).unwrap();
        (temp_dir, storage)
    }

    #[test]
    fn test_storage_creation() {
        let (temp_dir, storage) = create_test_storage();
        assert!(temp_dir.path().join("data").exists());
        assert!(!storage.is_initialized());
    }

    #[test]
    fn test_commit_persists() {
        let (temp_dir, storage) = create_test_storage();
        let account = Account::new("Checking", AccountType::Checking);
        storage.accounts.upsert(account.clone()).unwrap();
        storage.commit(UndoLog::new()).unwrap();

        let paths = EnvelopePaths::with_base_dir(temp_dir.path().to_path_buf());
        let reopened = Storage::open(paths).unwrap();
        assert!(reopened.accounts.get(account.id).unwrap().is_some());
    }

    #[test]
    fn test_failed_commit_rolls_back() {
        let (_temp_dir, storage) = create_test_storage();
        let mut account = Account::new("Checking", AccountType::Checking);
        storage.accounts.upsert(account.clone()).unwrap();
        storage.commit(UndoLog::new()).unwrap();

        std::fs::remove_file(storage.paths().accounts_file()).unwrap();
        std::fs::create_dir(storage.paths().accounts_file()).unwrap();

        let txn = Transaction::new(
            account.id,
            NaiveDate::from_ymd_opt(2025, 10, 1).unwrap(),
            Money::from_cents(100),
        );
        let mut undo = UndoLog::new();
        undo.record(UndoAction::RemoveTransaction(txn.id));
        storage.transactions.upsert(txn.clone()).unwrap();
        undo.record(UndoAction::RestoreAccount(account.clone()));
        account.apply(txn.amount);
        storage.accounts.upsert(account.clone()).unwrap();

        assert!(storage.commit(undo).is_err());
        assert!(storage.transactions.get(txn.id).unwrap().is_none());
        assert_eq!(
            storage.accounts.get(account.id).unwrap().unwrap().balance,
            Money::zero()
        );

        let on_disk = TransactionRepository::new(storage.paths().transactions_file());
        on_disk.load().unwrap();
        assert_eq!(on_disk.count().unwrap(), 0);
    }

    #[test]
    fn test_ledger_lock_is_exclusive() {
        let (_temp_dir, storage) = create_test_storage();
        let guard = storage.ledger_lock().unwrap();
        assert!(storage.ledger.try_lock().is_err());
        assert!(storage.paths().lock_file().exists());
        drop(guard);
        assert!(storage.ledger.try_lock().is_ok());
    }

    #[test]
    fn test_ledger_lock_sees_other_handles_writes() {
        let (temp_dir, first) = create_test_storage();
        let second =
            Storage::open(EnvelopePaths::with_base_dir(temp_dir.path().to_path_buf())).unwrap();

        let account = Account::new("Checking", AccountType::Checking);
        {
            let _guard = first.ledger_lock().unwrap();
            first.accounts.upsert(account.clone()).unwrap();
            first.commit(UndoLog::new()).unwrap();
        }

        assert!(second.accounts.get(account.id).unwrap().is_none());
        let _guard = second.ledger_lock().unwrap();
        assert!(second.accounts.get(account.id).unwrap().is_some());
    }

    #[test]
    fn test_failed_step_rolls_back_earlier_steps() {
        let (_temp_dir, storage) = create_test_storage();
        let account = Account::new("Checking", AccountType::Checking);

        let result: Result<(), EnvelopeError> = storage.transact(|undo| {
            undo.record(UndoAction::RemoveAccount(account.id));
            storage.accounts.upsert(account.clone())?;
            Err(EnvelopeError::Storage("disk went away".into()))
        });

        assert!(result.is_err());
        assert!(storage.accounts.get(account.id).unwrap().is_none());

        let on_disk = AccountRepository::new(storage.paths().accounts_file());
        on_disk.load().unwrap();
        assert_eq!(on_disk.count().unwrap(), 0);
    }

    #[test]
    fn test_transact_commits_on_success() {
        let (temp_dir, storage) = create_test_storage();
        let account = Account::new("Savings", AccountType::Savings);

        let id = storage
            .transact(|undo| {
                undo.record(UndoAction::RemoveAccount(account.id));
                storage.accounts.upsert(account.clone())?;
                Ok(account.id)
            })
            .unwrap();

        let reopened =
            Storage::open(EnvelopePaths::with_base_dir(temp_dir.path().to_path_buf())).unwrap();
        assert!(reopened.accounts.get(id).unwrap().is_some());
    }
}
