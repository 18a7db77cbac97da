//! Category service
//!
//! Groups and spending categories. Payment categories are managed by
//! [`super::AccountService`] and cannot be created or deleted here.

use tracing::info;

use crate::error::{EnvelopeError, EnvelopeResult};
use crate::models::{Category, CategoryGroup, CategoryGroupId, CategoryId};
use crate::storage::{Storage, UndoAction};

/// Service for category management
pub struct CategoryService<'a> {
    storage: &'a Storage,
}

impl<'a> CategoryService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Create a category group
    pub fn create_group(&self, name: &str) -> EnvelopeResult<CategoryGroup> {
        let _guard = self.storage.ledger_lock()?;

        let name = name.trim();
        if self.storage.categories.get_group_by_name(name)?.is_some() {
            return Err(EnvelopeError::Duplicate {
                entity_type: "Category group",
                identifier: name.to_string(),
            });
        }

        let mut group = CategoryGroup::new(name);
        group.sort_order = self.storage.categories.get_all_groups()?.len() as i32;
        group.validate()?;

        self.storage.transact(|undo| {
            undo.record(UndoAction::RemoveGroup(group.id));
            self.storage.categories.upsert_group(group.clone())
        })?;

        info!(group = %group.id, name = %group.name, "category group created");
        Ok(group)
    }

    /// Find a group by name, full id or short display id
    pub fn find_group(&self, identifier: &str) -> EnvelopeResult<Option<CategoryGroup>> {
        if let Some(group) = self.storage.categories.get_group_by_name(identifier)? {
            return Ok(Some(group));
        }
        if let Ok(id) = identifier.parse::<CategoryGroupId>() {
            return self.storage.categories.get_group(id);
        }
        let identifier = identifier.trim().to_lowercase();
        Ok(self
            .storage
            .categories
            .get_all_groups()?
            .into_iter()
            .find(|g| g.id.to_string() == identifier))
    }

    pub fn list_groups(&self) -> EnvelopeResult<Vec<CategoryGroup>> {
        self.storage.categories.get_all_groups()
    }

    /// Create a spending category, optionally inside a group
    pub fn create_category(
        &self,
        name: &str,
        group_id: Option<CategoryGroupId>,
    ) -> EnvelopeResult<Category> {
        let _guard = self.storage.ledger_lock()?;

        if let Some(group_id) = group_id {
            self.storage
                .categories
                .get_group(group_id)?
                .ok_or_else(|| EnvelopeError::group_not_found(group_id.to_string()))?;
        }

        let name = name.trim();
        if self.storage.categories.category_name_exists(name, None)? {
            return Err(EnvelopeError::Duplicate {
                entity_type: "Category",
                identifier: name.to_string(),
            });
        }

        let mut category = Category::new(name, group_id);
        category.sort_order = self.storage.categories.category_count()? as i32;
        category.validate()?;

        self.storage.transact(|undo| {
            undo.record(UndoAction::RemoveCategory(category.id));
            self.storage.categories.upsert_category(category.clone())
        })?;

        info!(category = %category.id, name = %category.name, "category created");
        Ok(category)
    }

    pub fn get_category(&self, id: CategoryId) -> EnvelopeResult<Option<Category>> {
        self.storage.categories.get_category(id)
    }

    /// Find a category by name, full id or short display id
    pub fn find_category(&self, identifier: &str) -> EnvelopeResult<Option<Category>> {
        if let Some(category) = self.storage.categories.get_category_by_name(identifier)? {
            return Ok(Some(category));
        }
        if let Ok(id) = identifier.parse::<CategoryId>() {
            return self.storage.categories.get_category(id);
        }
        let identifier = identifier.trim().to_lowercase();
        Ok(self
            .storage
            .categories
            .get_all_categories()?
            .into_iter()
            .find(|c| c.id.to_string() == identifier))
    }

    /// All categories: spending categories first, then payment categories
    pub fn list_categories(&self) -> EnvelopeResult<Vec<Category>> {
        self.storage.categories.get_all_categories()
    }

    /// Delete a spending category
    ///
    /// Its allocations are deleted and its transactions become uncategorized.
    /// Expense transactions need a category, so a category that still has
    /// outflows charged to it is refused.
    pub fn delete_category(&self, id: CategoryId) -> EnvelopeResult<()> {
        let _guard = self.storage.ledger_lock()?;

        let category = self
            .storage
            .categories
            .get_category(id)?
            .ok_or_else(|| EnvelopeError::category_not_found(id.to_string()))?;

        if category.is_payment_category() {
            return Err(EnvelopeError::Validation(format!(
                "'{}' is a payment category; delete its credit account instead",
                category.name
            )));
        }

        let outflows = self
            .storage
            .transactions
            .get_by_category(id)?
            .iter()
            .filter(|t| t.is_outflow() && !t.is_transfer())
            .count();
        if outflows > 0 {
            return Err(EnvelopeError::Validation(format!(
                "'{}' still has {} expense transaction(s); recategorize them first",
                category.name, outflows
            )));
        }

        self.storage.transact(|undo| {
            undo.record(UndoAction::RestoreCategory(category.clone()));
            self.storage.categories.delete_category(id)?;

            for allocation in self.storage.allocations.delete_for_category(id)? {
                undo.record(UndoAction::RestoreAllocation(
                    allocation.key(),
                    Some(allocation),
                ));
            }
            for txn in self.storage.transactions.clear_category(id)? {
                undo.record(UndoAction::RestoreTransaction(txn));
            }
            Ok(())
        })?;

        info!(category = %id, name = %category.name, "category deleted");
        Ok(())
    }
}
