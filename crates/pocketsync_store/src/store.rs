//! Opening the SQLite database and handing out table handles.

use crate::error::{StoreError, StoreResult};
use crate::schema::{create_alias_table, StoredEntity, SCHEMA_VERSION};
use crate::table::Table;
use parking_lot::Mutex;
use pocketsync_model::{Category, Transaction};
use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// The app's local database.
///
/// Owns one SQLite connection shared by every table handle. Clones share
/// the same connection and change feeds.
#[derive(Clone)]
pub struct LocalStore {
    transactions: Table<Transaction>,
    categories: Table<Category>,
}

impl LocalStore {
    /// Opens (creating if needed) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let connection = Connection::open(path)?;
        connection.busy_timeout(Duration::from_secs(5))?;
        let mode: String =
            connection.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        tracing::debug!(path = %path.display(), journal_mode = %mode, "opened local store");

        Self::with_connection(connection)
    }

    /// Opens a throwaway in-memory database.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(connection: Connection) -> StoreResult<Self> {
        initialize(&connection)?;
        let connection = Arc::new(Mutex::new(connection));
        Ok(Self {
            transactions: Table::new(Arc::clone(&connection)),
            categories: Table::new(connection),
        })
    }

    /// The transactions table.
    pub fn transactions(&self) -> &Table<Transaction> {
        &self.transactions
    }

    /// The categories table.
    pub fn categories(&self) -> &Table<Category> {
        &self.categories
    }
}

/// Creates the schema if needed and checks the schema version.
fn initialize(connection: &Connection) -> StoreResult<()> {
    let found: i64 = connection.pragma_query_value(None, "user_version", |row| row.get(0))?;
    if found > SCHEMA_VERSION {
        return Err(StoreError::SchemaTooNew {
            found,
            supported: SCHEMA_VERSION,
        });
    }

    Transaction::create_table(connection)?;
    Category::create_table(connection)?;
    create_alias_table(connection, Transaction::TABLE)?;
    create_alias_table(connection, Category::TABLE)?;

    if found < SCHEMA_VERSION {
        connection.pragma_update(None, "user_version", SCHEMA_VERSION)?;
        tracing::info!(from = found, to = SCHEMA_VERSION, "migrated local store schema");
    }
    Ok(())
}
