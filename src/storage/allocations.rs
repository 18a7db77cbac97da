//! Allocation repository for JSON storage
//!
//! At most one allocation exists per (category, period).

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::EnvelopeError;
use crate::models::{Allocation, AllocationKey, BudgetPeriod, CategoryId, Money};

use super::file_io::{read_json, write_json_atomic};
use super::{read_guard, write_guard};

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct AllocationData {
    allocations: Vec<Allocation>,
}

/// Repository for allocation persistence
pub struct AllocationRepository {
    path: PathBuf,
    data: RwLock<HashMap<AllocationKey, Allocation>>,
}

impl AllocationRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
        }
    }

    /// Load allocations from disk
    ///
    /// A file holding two rows for the same key is rejected rather than
    /// silently merged.
    pub fn load(&self) -> Result<(), EnvelopeError> {
        let file_data: AllocationData = read_json(&self.path)?;

        let mut data = write_guard(&self.data)?;
        data.clear();
        for allocation in file_data.allocations {
            let key = allocation.key();
            if data.insert(key, allocation).is_some() {
                return Err(EnvelopeError::Storage(format!(
                    "Duplicate allocation for {} in {}",
                    key,
                    self.path.display()
                )));
            }
        }
        Ok(())
    }

    /// Save allocations to disk
    pub fn save(&self) -> Result<(), EnvelopeError> {
        let data = read_guard(&self.data)?;

        let mut allocations: Vec<_> = data.values().cloned().collect();
        allocations.sort_by_key(|a| (a.period, a.category_id));

        write_json_atomic(&self.path, &AllocationData { allocations })
    }

    pub fn get(&self, key: AllocationKey) -> Result<Option<Allocation>, EnvelopeError> {
        Ok(read_guard(&self.data)?.get(&key).cloned())
    }

    /// Allocated amount for a key, zero when no row exists
    pub fn amount(&self, key: AllocationKey) -> Result<Money, EnvelopeError> {
        Ok(read_guard(&self.data)?
            .get(&key)
            .map(|a| a.amount)
            .unwrap_or_default())
    }

    /// Get all allocations for a category, oldest period first
    pub fn get_for_category(
        &self,
        category_id: CategoryId,
    ) -> Result<Vec<Allocation>, EnvelopeError> {
        let mut allocations: Vec<_> = read_guard(&self.data)?
            .values()
            .filter(|a| a.category_id == category_id)
            .cloned()
            .collect();
        allocations.sort_by_key(|a| a.period);
        Ok(allocations)
    }

    /// Get all allocations for one period
    pub fn get_for_period(&self, period: BudgetPeriod) -> Result<Vec<Allocation>, EnvelopeError> {
        Ok(read_guard(&self.data)?
            .values()
            .filter(|a| a.period == period)
            .cloned()
            .collect())
    }

    /// Get all allocations with a period on or before `period`
    pub fn get_through(&self, period: BudgetPeriod) -> Result<Vec<Allocation>, EnvelopeError> {
        Ok(read_guard(&self.data)?
            .values()
            .filter(|a| a.period <= period)
            .cloned()
            .collect())
    }

    pub fn get_all(&self) -> Result<Vec<Allocation>, EnvelopeError> {
        let mut allocations: Vec<_> = read_guard(&self.data)?.values().cloned().collect();
        allocations.sort_by_key(|a| (a.period, a.category_id));
        Ok(allocations)
    }

    /// Insert or update an allocation
    ///
    /// An existing row for the same key keeps its id and creation time.
    pub fn upsert(&self, mut allocation: Allocation) -> Result<(), EnvelopeError> {
        let mut data = write_guard(&self.data)?;
        let key = allocation.key();
        if let Some(existing) = data.get(&key) {
            allocation.id = existing.id;
            allocation.created_at = existing.created_at;
        }
        data.insert(key, allocation);
        Ok(())
    }

    /// Put a key back to an earlier state (`None` removes the row)
    pub fn restore(
        &self,
        key: AllocationKey,
        previous: Option<Allocation>,
    ) -> Result<(), EnvelopeError> {
        let mut data = write_guard(&self.data)?;
        match previous {
            Some(allocation) => {
                data.insert(key, allocation);
            }
            None => {
                data.remove(&key);
            }
        }
        Ok(())
    }

    /// Delete every allocation of a category, returning the removed rows
    pub fn delete_for_category(
        &self,
        category_id: CategoryId,
    ) -> Result<Vec<Allocation>, EnvelopeError> {
        let mut data = write_guard(&self.data)?;
        let keys: Vec<_> = data
            .keys()
            .filter(|k| k.category_id == category_id)
            .copied()
            .collect();
        Ok(keys.iter().filter_map(|k| data.remove(k)).collect())
    }

    pub fn count(&self) -> Result<usize, EnvelopeError> {
        Ok(read_guard(&self.data)?.len())
    }
}
