//! Budget service
//!
//! Allocation writes, the per-category summary and the cover-underfunded
//! operation. Reads load the allocation and transaction tables once and hand
//! them to the pure calculators in [`super::balance`],
//! [`super::underfunded`] and [`super::ready_to_assign`].

use serde::Serialize;
use tracing::info;

use super::balance::{category_balance, total_allocated, total_spent, CategoryBalance};
use super::ready_to_assign::ready_to_assign;
use super::underfunded::{detect, UnderfundedReport};
use crate::error::{EnvelopeError, EnvelopeResult};
use crate::models::{
    Allocation, AllocationKey, BudgetPeriod, Category, CategoryId, Money, Transaction,
};
use crate::storage::{Storage, UndoAction};

/// Service for budget management
pub struct BudgetService<'a> {
    storage: &'a Storage,
}

/// One row of the allocation summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySummary {
    pub category: Category,
    /// This period's allocation row, if one exists
    pub allocation: Option<Allocation>,
    pub activity: Money,
    pub available: Money,
    pub total_allocated: Money,
    pub total_spent: Money,
    /// Shortfall of a payment category, present only when non-zero
    #[serde(skip_serializing_if = "Option::is_none")]
    pub underfunded: Option<Money>,
    /// Names of the expense categories behind the shortfall
    #[serde(skip_serializing_if = "Option::is_none")]
    pub underfunded_categories: Option<Vec<String>>,
}

/// Outcome of covering a payment category's shortfall
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverResult {
    pub allocation: Allocation,
    pub covered_amount: Money,
    pub ready_to_assign_after: Money,
}

impl<'a> BudgetService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Set a category's allocation for a period
    pub fn assign(
        &self,
        category_id: CategoryId,
        period: BudgetPeriod,
        amount: Money,
    ) -> EnvelopeResult<Allocation> {
        let _guard = self.storage.ledger_lock()?;
        self.write_allocation(category_id, period, |allocation| {
            allocation.set_amount(amount)
        })
    }

    /// Add to (or, with a negative amount, take from) a category's allocation
    pub fn add_to_category(
        &self,
        category_id: CategoryId,
        period: BudgetPeriod,
        amount: Money,
    ) -> EnvelopeResult<Allocation> {
        let _guard = self.storage.ledger_lock()?;
        self.write_allocation(category_id, period, |allocation| {
            allocation.add_amount(amount)
        })
    }

    /// Attach notes to a category's allocation for a period
    pub fn set_notes(
        &self,
        category_id: CategoryId,
        period: BudgetPeriod,
        notes: &str,
    ) -> EnvelopeResult<Allocation> {
        let _guard = self.storage.ledger_lock()?;
        let notes = notes.trim().to_string();
        self.write_allocation(category_id, period, move |allocation| {
            allocation.notes = notes;
            allocation.updated_at = chrono::Utc::now();
        })
    }

    /// Upsert one allocation row; the caller holds the ledger lock
    fn write_allocation(
        &self,
        category_id: CategoryId,
        period: BudgetPeriod,
        change: impl FnOnce(&mut Allocation),
    ) -> EnvelopeResult<Allocation> {
        let category = self.get_category(category_id)?;
        let key = AllocationKey::new(category_id, period);

        let previous = self.storage.allocations.get(key)?;
        let mut allocation = previous
            .clone()
            .unwrap_or_else(|| Allocation::new(category_id, period, Money::zero()));
        change(&mut allocation);
        allocation.validate()?;

        self.storage.transact(|undo| {
            undo.record(UndoAction::RestoreAllocation(key, previous.clone()));
            self.storage.allocations.upsert(allocation)
        })?;

        let stored = self
            .storage
            .allocations
            .get(key)?
            .ok_or_else(|| EnvelopeError::allocation_not_found(key.to_string()))?;

        info!(
            category = %category.name,
            %period,
            before = %previous.map(|a| a.amount).unwrap_or_default(),
            after = %stored.amount,
            "allocation saved"
        );
        Ok(stored)
    }

    /// The stored allocation for a category and period, if any
    pub fn allocation(
        &self,
        category_id: CategoryId,
        period: BudgetPeriod,
    ) -> EnvelopeResult<Option<Allocation>> {
        self.storage
            .allocations
            .get(AllocationKey::new(category_id, period))
    }

    /// Balance of one category, with activity scoped to `period`
    pub fn category_balance(
        &self,
        category_id: CategoryId,
        period: BudgetPeriod,
    ) -> EnvelopeResult<CategoryBalance> {
        self.get_category(category_id)?;
        let allocations = self.storage.allocations.get_for_category(category_id)?;
        let transactions = self.storage.transactions.get_by_category(category_id)?;
        Ok(category_balance(
            category_id,
            period,
            &allocations,
            &transactions,
        ))
    }

    /// Underfunded check for a payment category, `None` for other categories
    pub fn underfunded(&self, category_id: CategoryId) -> EnvelopeResult<Option<UnderfundedReport>> {
        let category = self.get_category(category_id)?;
        let allocations = self.storage.allocations.get_all()?;
        let transactions = self.storage.transactions.get_all()?;
        self.underfunded_for(&category, &allocations, &transactions)
    }

    fn underfunded_for(
        &self,
        category: &Category,
        allocations: &[Allocation],
        transactions: &[Transaction],
    ) -> EnvelopeResult<Option<UnderfundedReport>> {
        let account_id = match category.payment_for {
            Some(id) => id,
            None => return Ok(None),
        };
        let card = self.storage.accounts.get(account_id)?.ok_or_else(|| {
            EnvelopeError::Storage(format!(
                "Payment category {} points at missing account {}",
                category.id, account_id
            ))
        })?;

        let payment_available =
            total_allocated(category.id, allocations) - total_spent(category.id, transactions);

        Ok(Some(detect(
            &card,
            category.id,
            payment_available,
            transactions,
            allocations,
        )))
    }

    /// One summary row per category, in display order
    pub fn allocation_summary(&self, period: BudgetPeriod) -> EnvelopeResult<Vec<CategorySummary>> {
        let categories = self.storage.categories.get_all_categories()?;
        let allocations = self.storage.allocations.get_all()?;
        let transactions = self.storage.transactions.get_all()?;

        categories
            .into_iter()
            .map(|category| {
                let balance = category_balance(category.id, period, &allocations, &transactions);
                let allocation = allocations
                    .iter()
                    .find(|a| a.category_id == category.id && a.period == period)
                    .cloned();

                let (underfunded, underfunded_categories) =
                    match self.underfunded_for(&category, &allocations, &transactions)? {
                        Some(report) if report.is_underfunded() => {
                            let names = report
                                .responsible_categories()
                                .into_iter()
                                .map(|id| self.category_name(id))
                                .collect::<EnvelopeResult<Vec<_>>>()?;
                            (Some(report.underfunded), Some(names))
                        }
                        _ => (None, None),
                    };

                Ok(CategorySummary {
                    category,
                    allocation,
                    activity: balance.activity,
                    available: balance.available,
                    total_allocated: balance.total_allocated,
                    total_spent: balance.total_spent,
                    underfunded,
                    underfunded_categories,
                })
            })
            .collect()
    }

    /// Income not yet assigned as of `period`
    pub fn ready_to_assign(&self, period: BudgetPeriod) -> EnvelopeResult<Money> {
        let transactions = self.storage.transactions.get_all()?;
        let allocations = self.storage.allocations.get_through(period)?;
        Ok(ready_to_assign(period, &transactions, &allocations))
    }

    /// Top up a payment category's allocation by exactly its shortfall
    ///
    /// Fails without writing anything when the category is not a payment
    /// category, has no shortfall, or Ready-to-Assign cannot pay for it.
    pub fn cover_underfunded(
        &self,
        category_id: CategoryId,
        period: BudgetPeriod,
    ) -> EnvelopeResult<CoverResult> {
        let _guard = self.storage.ledger_lock()?;

        let category = self.get_category(category_id)?;
        if !category.is_payment_category() {
            return Err(EnvelopeError::NotAPaymentCategory(category.name));
        }

        let shortfall = self
            .underfunded(category_id)?
            .map(|report| report.underfunded)
            .unwrap_or_default();
        if !shortfall.is_positive() {
            return Err(EnvelopeError::NotUnderfunded(category.name));
        }

        let ready = self.ready_to_assign(period)?;
        if ready < shortfall {
            return Err(EnvelopeError::InsufficientFunds {
                ready_to_assign: ready,
                shortfall,
            });
        }

        let allocation = self.write_allocation(category_id, period, |allocation| {
            allocation.add_amount(shortfall)
        })?;
        let ready_to_assign_after = self.ready_to_assign(period)?;

        info!(
            category = %category.name,
            %period,
            covered = %shortfall,
            %ready_to_assign_after,
            "covered underfunded payment category"
        );

        Ok(CoverResult {
            allocation,
            covered_amount: shortfall,
            ready_to_assign_after,
        })
    }

    fn get_category(&self, id: CategoryId) -> EnvelopeResult<Category> {
        self.storage
            .categories
            .get_category(id)?
            .ok_or_else(|| EnvelopeError::category_not_found(id.to_string()))
    }

    fn category_name(&self, id: CategoryId) -> EnvelopeResult<String> {
        Ok(self
            .storage
            .categories
            .get_category(id)?
            .map(|c| c.name)
            .unwrap_or_else(|| id.to_string()))
    }
}
