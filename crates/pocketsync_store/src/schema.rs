//! Table definitions and row mapping for each stored entity.

use pocketsync_model::{Category, Entity, EntryType, Transaction};
use rusqlite::types::{Type, Value};
use rusqlite::{Connection, Row};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Version written to `PRAGMA user_version` by this build.
pub const SCHEMA_VERSION: i64 = 2;

/// Name of the table mapping replaced local ids to canonical ids.
pub(crate) fn alias_table(table: &str) -> String {
    format!("{table}_aliases")
}

/// Creates the alias table for `table` if it does not exist (added in
/// schema version 2).
pub(crate) fn create_alias_table(connection: &Connection, table: &str) -> Result<(), rusqlite::Error> {
    connection.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS {aliases} (
            local_id TEXT PRIMARY KEY NOT NULL,
            canonical_id TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_{aliases}_canonical ON {aliases}(canonical_id);",
        aliases = alias_table(table)
    ))
}

/// An entity with an SQLite table.
///
/// Every table also carries the `is_deleted` and `pending` bookkeeping
/// columns after the entity's own columns; `COLUMNS` lists only the latter,
/// in the order `map_row` reads and `to_values` writes them.
pub trait StoredEntity: Entity {
    /// Table name.
    const TABLE: &'static str;

    /// Entity columns, `id` first.
    const COLUMNS: &'static [&'static str];

    /// `ORDER BY` clause used by list queries.
    const ORDER_BY: &'static str;

    /// Creates the table and its indexes if they do not exist.
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error>;

    /// Reads an entity from the first `COLUMNS.len()` columns of `row`.
    fn map_row(row: &Row) -> Result<Self, rusqlite::Error>;

    /// The entity's column values, in `COLUMNS` order.
    fn to_values(&self) -> Vec<Value>;
}

fn conversion_error(column: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, message.into())
}

fn entry_type_at(row: &Row, column: usize) -> Result<EntryType, rusqlite::Error> {
    let raw: String = row.get(column)?;
    EntryType::from_str(&raw).map_err(|e| conversion_error(column, e.to_string()))
}

impl StoredEntity for Transaction {
    const TABLE: &'static str = "transactions";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "amount",
        "entry_type",
        "category_id",
        "date",
        "description",
        "created_at",
    ];
    const ORDER_BY: &'static str = "date DESC, created_at DESC";

    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute_batch(
            "CREATE TABLE IF NOT EXISTS transactions (
                id TEXT PRIMARY KEY NOT NULL,
                amount TEXT NOT NULL,
                entry_type TEXT NOT NULL,
                category_id TEXT NOT NULL,
                date TEXT NOT NULL,
                description TEXT,
                created_at INTEGER NOT NULL,
                is_deleted INTEGER NOT NULL DEFAULT 0,
                pending INTEGER NOT NULL DEFAULT 0
            );
            CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(date);
            CREATE INDEX IF NOT EXISTS idx_transactions_deleted ON transactions(is_deleted);",
        )
    }

    fn map_row(row: &Row) -> Result<Self, rusqlite::Error> {
        let raw_amount: String = row.get(1)?;
        let amount = Decimal::from_str(&raw_amount)
            .map_err(|e| conversion_error(1, format!("amount \"{raw_amount}\": {e}")))?;

        Ok(Transaction {
            id: row.get(0)?,
            amount,
            entry_type: entry_type_at(row, 2)?,
            category_id: row.get(3)?,
            date: row.get(4)?,
            description: row.get(5)?,
            created_at: row.get(6)?,
        })
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.id.clone()),
            Value::Text(self.amount.to_string()),
            Value::Text(self.entry_type.as_str().to_string()),
            Value::Text(self.category_id.clone()),
            Value::Text(self.date.clone()),
            self.description.clone().map_or(Value::Null, Value::Text),
            Value::Integer(self.created_at),
        ]
    }
}

impl StoredEntity for Category {
    const TABLE: &'static str = "categories";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "entry_type",
        "is_active",
        "updated_at",
        "color",
        "icon",
    ];
    const ORDER_BY: &'static str = "name COLLATE NOCASE ASC";

    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute_batch(
            "CREATE TABLE IF NOT EXISTS categories (
                id TEXT PRIMARY KEY NOT NULL,
                name TEXT NOT NULL,
                entry_type TEXT NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 1,
                updated_at INTEGER NOT NULL,
                color INTEGER NOT NULL DEFAULT 0,
                icon TEXT,
                is_deleted INTEGER NOT NULL DEFAULT 0,
                pending INTEGER NOT NULL DEFAULT 0
            );
            CREATE INDEX IF NOT EXISTS idx_categories_deleted ON categories(is_deleted);",
        )
    }

    fn map_row(row: &Row) -> Result<Self, rusqlite::Error> {
        Ok(Category {
            id: row.get(0)?,
            name: row.get(1)?,
            entry_type: entry_type_at(row, 2)?,
            is_active: row.get(3)?,
            updated_at: row.get(4)?,
            color: row.get(5)?,
            icon: row.get(6)?,
        })
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.id.clone()),
            Value::Text(self.name.clone()),
            Value::Text(self.entry_type.as_str().to_string()),
            Value::Integer(i64::from(self.is_active)),
            Value::Integer(self.updated_at),
            Value::Integer(self.color),
            self.icon.clone().map_or(Value::Null, Value::Text),
        ]
    }
}
