//! First-run setup
//!
//! Writes the settings file and seeds a fresh ledger with starter category
//! groups. Running it again on an initialized ledger changes nothing.

use crate::config::{EnvelopePaths, Settings};
use crate::error::EnvelopeError;
use crate::models::{Category, CategoryGroup};

use super::{Storage, UndoAction};

const DEFAULT_GROUPS: &[(&str, &[&str])] = &[
    ("Bills", &["Rent/Mortgage", "Electric", "Internet", "Phone", "Insurance"]),
    ("Needs", &["Groceries", "Transportation", "Medical", "Household"]),
    ("Wants", &["Dining Out", "Entertainment", "Shopping"]),
    ("Savings", &["Emergency Fund", "Vacation"]),
];

/// Initialize a ledger, returning `true` if anything was created
pub fn initialize_storage(paths: &EnvelopePaths) -> Result<bool, EnvelopeError> {
    if paths.is_initialized() {
        return Ok(false);
    }

    let storage = Storage::open(paths.clone())?;
    let _guard = storage.ledger_lock()?;
    if storage.categories.category_count()? == 0 {
        storage.transact(|undo| {
            for (order, (group_name, categories)) in DEFAULT_GROUPS.iter().enumerate() {
                let mut group = CategoryGroup::new(*group_name);
                group.sort_order = order as i32;
                for (cat_order, name) in categories.iter().enumerate() {
                    let mut category = Category::new(*name, Some(group.id));
                    category.sort_order = (order * 100 + cat_order) as i32;
                    undo.record(UndoAction::RemoveCategory(category.id));
                    storage.categories.upsert_category(category)?;
                }
                undo.record(UndoAction::RemoveGroup(group.id));
                storage.categories.upsert_group(group)?;
            }
            Ok(())
        })?;
    }

    Settings::default().save(paths)?;
    tracing::info!(base_dir = %paths.base_dir().display(), "ledger initialized");
    Ok(true)
}
