//! Entity builders with fixed ids and predictable defaults.

use pocketsync_model::{Category, EntryType, Transaction};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Builds a [`Transaction`].
///
/// Defaults: an expense of 10.00 in category `cat_1` dated 2025-01-15.
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    transaction: Transaction,
}

impl TransactionBuilder {
    /// Starts a transaction with the given id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            transaction: Transaction {
                id: id.into(),
                amount: Decimal::new(1000, 2),
                entry_type: EntryType::Expense,
                category_id: "cat_1".into(),
                date: "2025-01-15".into(),
                description: None,
                created_at: 1_700_000_000_000,
            },
        }
    }

    /// Sets the amount from decimal text.
    ///
    /// # Panics
    ///
    /// Panics if `amount` is not a decimal number.
    pub fn amount(mut self, amount: &str) -> Self {
        self.transaction.amount = Decimal::from_str(amount).expect("Invalid decimal amount");
        self
    }

    /// Sets the entry type.
    pub fn entry_type(mut self, entry_type: EntryType) -> Self {
        self.transaction.entry_type = entry_type;
        self
    }

    /// Sets the category id.
    pub fn category(mut self, category_id: impl Into<String>) -> Self {
        self.transaction.category_id = category_id.into();
        self
    }

    /// Sets the date.
    pub fn date(mut self, date: impl Into<String>) -> Self {
        self.transaction.date = date.into();
        self
    }

    /// Sets the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.transaction.description = Some(description.into());
        self
    }

    /// Sets the creation time.
    pub fn created_at(mut self, created_at: i64) -> Self {
        self.transaction.created_at = created_at;
        self
    }

    /// Finishes the transaction.
    pub fn build(self) -> Transaction {
        self.transaction
    }
}

/// Builds a [`Category`].
///
/// Defaults: an active expense category named after its id, updated at 1000.
#[derive(Debug, Clone)]
pub struct CategoryBuilder {
    category: Category,
}

impl CategoryBuilder {
    /// Starts a category with the given id.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            category: Category {
                name: id.clone(),
                id,
                entry_type: EntryType::Expense,
                is_active: true,
                updated_at: 1000,
                color: 0,
                icon: None,
            },
        }
    }

    /// Sets the name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.category.name = name.into();
        self
    }

    /// Sets the entry type.
    pub fn entry_type(mut self, entry_type: EntryType) -> Self {
        self.category.entry_type = entry_type;
        self
    }

    /// Sets the last-write time.
    pub fn updated_at(mut self, updated_at: i64) -> Self {
        self.category.updated_at = updated_at;
        self
    }

    /// Marks the category inactive.
    pub fn inactive(mut self) -> Self {
        self.category.is_active = false;
        self
    }

    /// Finishes the category.
    pub fn build(self) -> Category {
        self.category
    }
}
