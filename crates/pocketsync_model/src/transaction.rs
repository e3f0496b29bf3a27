//! Budget transactions.

use crate::entity::{new_local_id, now_millis, Entity};
use crate::error::{ModelError, ModelResult};
use crate::month::MonthFilter;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::Date;

const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

/// Whether money came in, went out, or was put aside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntryType {
    /// Money received.
    Income,
    /// Money spent.
    Expense,
    /// Money moved to savings.
    Savings,
}

impl EntryType {
    /// The wire and storage name.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Income => "INCOME",
            EntryType::Expense => "EXPENSE",
            EntryType::Savings => "SAVINGS",
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INCOME" => Ok(EntryType::Income),
            "EXPENSE" => Ok(EntryType::Expense),
            "SAVINGS" => Ok(EntryType::Savings),
            _ => Err(ModelError::InvalidEntryType(s.to_string())),
        }
    }
}

/// A single income, expense or savings entry.
///
/// `category_id` is not checked against existing categories at this layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Server-assigned id, or a `local_` placeholder until confirmed.
    pub id: String,
    /// Exact decimal amount.
    pub amount: Decimal,
    /// Income, expense or savings.
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    /// Id of the category this transaction is filed under.
    pub category_id: String,
    /// Calendar date, `YYYY-MM-DD`.
    pub date: String,
    /// Free-text note.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Creation time in epoch millis; the server's value replaces ours on confirm.
    #[serde(default)]
    pub created_at: i64,
}

impl Transaction {
    /// Creates a transaction with a fresh local-only id.
    pub fn new(
        amount: Decimal,
        entry_type: EntryType,
        category_id: impl Into<String>,
        date: impl Into<String>,
    ) -> Self {
        Self {
            id: new_local_id(),
            amount,
            entry_type,
            category_id: category_id.into(),
            date: date.into(),
            description: None,
            created_at: now_millis(),
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Checks that `date` is a real `YYYY-MM-DD` calendar date.
    pub fn validate(&self) -> ModelResult<()> {
        Date::parse(&self.date, DATE_FORMAT)
            .map(|_| ())
            .map_err(|_| ModelError::InvalidDate(self.date.clone()))
    }

    /// The month this transaction falls in, if the date is well formed.
    pub fn month(&self) -> Option<MonthFilter> {
        self.date.get(..7).and_then(|prefix| prefix.parse().ok())
    }
}

impl Entity for Transaction {
    const COLLECTION: &'static str = "transactions";
    const KIND: &'static str = "transaction";
    const SCOPED: bool = true;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn in_scope(&self, month: &MonthFilter) -> bool {
        month.contains(&self.date)
    }
}
