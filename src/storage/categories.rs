//! Category and CategoryGroup repository for JSON storage
//!
//! Groups and categories share `categories.json`.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::EnvelopeError;
use crate::models::{AccountId, Category, CategoryGroup, CategoryGroupId, CategoryId};

use super::file_io::{read_json, write_json_atomic};
use super::{read_guard, write_guard};

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct CategoryData {
    #[serde(default)]
    groups: Vec<CategoryGroup>,
    #[serde(default)]
    categories: Vec<Category>,
}

/// Repository for category and group persistence
pub struct CategoryRepository {
    path: PathBuf,
    groups: RwLock<HashMap<CategoryGroupId, CategoryGroup>>,
    categories: RwLock<HashMap<CategoryId, Category>>,
}

impl CategoryRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            groups: RwLock::new(HashMap::new()),
            categories: RwLock::new(HashMap::new()),
        }
    }

    /// Load groups and categories from disk
    pub fn load(&self) -> Result<(), EnvelopeError> {
        let file_data: CategoryData = read_json(&self.path)?;

        let mut groups = write_guard(&self.groups)?;
        let mut categories = write_guard(&self.categories)?;

        groups.clear();
        groups.extend(file_data.groups.into_iter().map(|g| (g.id, g)));

        categories.clear();
        categories.extend(file_data.categories.into_iter().map(|c| (c.id, c)));

        Ok(())
    }

    /// Save groups and categories to disk
    pub fn save(&self) -> Result<(), EnvelopeError> {
        let groups = read_guard(&self.groups)?;
        let categories = read_guard(&self.categories)?;

        let mut group_list: Vec<_> = groups.values().cloned().collect();
        group_list.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then(a.name.cmp(&b.name)));

        let mut category_list: Vec<_> = categories.values().cloned().collect();
        category_list.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then(a.name.cmp(&b.name)));

        write_json_atomic(
            &self.path,
            &CategoryData {
                groups: group_list,
                categories: category_list,
            },
        )
    }

    // Group operations

    pub fn get_group(&self, id: CategoryGroupId) -> Result<Option<CategoryGroup>, EnvelopeError> {
        Ok(read_guard(&self.groups)?.get(&id).cloned())
    }

    /// Get all groups, in display order
    pub fn get_all_groups(&self) -> Result<Vec<CategoryGroup>, EnvelopeError> {
        let mut groups: Vec<_> = read_guard(&self.groups)?.values().cloned().collect();
        groups.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then(a.name.cmp(&b.name)));
        Ok(groups)
    }

    /// Get a group by name (case-insensitive)
    pub fn get_group_by_name(&self, name: &str) -> Result<Option<CategoryGroup>, EnvelopeError> {
        let name_lower = name.trim().to_lowercase();
        Ok(read_guard(&self.groups)?
            .values()
            .find(|g| g.name.to_lowercase() == name_lower)
            .cloned())
    }

    pub fn upsert_group(&self, group: CategoryGroup) -> Result<(), EnvelopeError> {
        write_guard(&self.groups)?.insert(group.id, group);
        Ok(())
    }

    pub fn delete_group(&self, id: CategoryGroupId) -> Result<bool, EnvelopeError> {
        Ok(write_guard(&self.groups)?.remove(&id).is_some())
    }

    // Category operations

    pub fn get_category(&self, id: CategoryId) -> Result<Option<Category>, EnvelopeError> {
        Ok(read_guard(&self.categories)?.get(&id).cloned())
    }

    /// Get all categories: expense categories first, then payment categories
    pub fn get_all_categories(&self) -> Result<Vec<Category>, EnvelopeError> {
        let mut categories: Vec<_> = read_guard(&self.categories)?.values().cloned().collect();
        categories.sort_by(|a, b| {
            a.is_payment_category()
                .cmp(&b.is_payment_category())
                .then(a.sort_order.cmp(&b.sort_order))
                .then(a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        });
        Ok(categories)
    }

    /// Get a category by name (case-insensitive)
    pub fn get_category_by_name(&self, name: &str) -> Result<Option<Category>, EnvelopeError> {
        let name_lower = name.trim().to_lowercase();
        Ok(read_guard(&self.categories)?
            .values()
            .find(|c| c.name.to_lowercase() == name_lower)
            .cloned())
    }

    /// Get the payment category linked to a credit account
    pub fn get_payment_category(
        &self,
        account_id: AccountId,
    ) -> Result<Option<Category>, EnvelopeError> {
        Ok(read_guard(&self.categories)?
            .values()
            .find(|c| c.payment_for == Some(account_id))
            .cloned())
    }

    pub fn upsert_category(&self, category: Category) -> Result<(), EnvelopeError> {
        write_guard(&self.categories)?.insert(category.id, category);
        Ok(())
    }

    pub fn delete_category(&self, id: CategoryId) -> Result<bool, EnvelopeError> {
        Ok(write_guard(&self.categories)?.remove(&id).is_some())
    }

    /// Check if a category name is already taken
    pub fn category_name_exists(
        &self,
        name: &str,
        exclude_id: Option<CategoryId>,
    ) -> Result<bool, EnvelopeError> {
        let name_lower = name.trim().to_lowercase();
        Ok(read_guard(&self.categories)?
            .values()
            .any(|c| c.name.to_lowercase() == name_lower && Some(c.id) != exclude_id))
    }

    pub fn category_count(&self) -> Result<usize, EnvelopeError> {
        Ok(read_guard(&self.categories)?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_repo() -> (TempDir, CategoryRepository) {
        let temp_dir = TempDir::new().unwrap();
        let repo = CategoryRepository::new(temp_dir.path().join("categories.json"));
        (temp_dir, repo)
    }

    #[test]
    fn test_groups_and_categories_round_trip_disk() {
        let (temp_dir, repo) = create_test_repo();
        let group = CategoryGroup::new("Needs");
        let groceries = Category::new("Groceries", Some(group.id));
        repo.upsert_group(group.clone()).unwrap();
        repo.upsert_category(groceries.clone()).unwrap();
        repo.save().unwrap();

        let reloaded = CategoryRepository::new(temp_dir.path().join("categories.json"));
        reloaded.load().unwrap();
        assert_eq!(reloaded.get_group(group.id).unwrap(), Some(group));
        assert_eq!(reloaded.get_category(groceries.id).unwrap(), Some(groceries));
    }

    #[test]
    fn test_payment_category_lookup() {
        let (_temp_dir, repo) = create_test_repo();
        let account_id = AccountId::new();
        let payment = Category::payment_for("Visa", account_id);
        repo.upsert_category(Category::new("Rent", None)).unwrap();
        repo.upsert_category(payment.clone()).unwrap();

        assert_eq!(
            repo.get_payment_category(account_id).unwrap().map(|c| c.id),
            Some(payment.id)
        );
        assert!(repo.get_payment_category(AccountId::new()).unwrap().is_none());
    }

    #[test]
    fn test_payment_categories_sort_last() {
        let (_temp_dir, repo) = create_test_repo();
        repo.upsert_category(Category::payment_for("Amex", AccountId::new()))
            .unwrap();
        repo.upsert_category(Category::new("Utilities", None)).unwrap();

        let names: Vec<_> = repo
            .get_all_categories()
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Utilities", "Amex"]);
    }

    #[test]
    fn test_name_lookup_is_case_insensitive() {
        let (_temp_dir, repo) = create_test_repo();
        let category = Category::new("Dining Out", None);
        repo.upsert_category(category.clone()).unwrap();

        assert!(repo.get_category_by_name("dining out").unwrap().is_some());
        assert!(repo.category_name_exists("DINING OUT", None).unwrap());
        assert!(!repo
            .category_name_exists("Dining Out", Some(category.id))
            .unwrap());

        assert!(repo.delete_category(category.id).unwrap());
        assert_eq!(repo.category_count().unwrap(), 0);
    }
}
