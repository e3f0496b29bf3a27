//! Temporary stores and mock remotes.

use pocketsync_model::{Category, Transaction};
use pocketsync_remote::MockRemote;
use pocketsync_store::LocalStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// A local store with automatic cleanup.
pub struct TestStore {
    /// The store instance.
    pub store: LocalStore,
    /// The temporary directory (kept alive to prevent cleanup).
    _temp_dir: Option<TempDir>,
    path: Option<PathBuf>,
}

impl TestStore {
    /// Creates a new in-memory store.
    pub fn memory() -> Self {
        Self {
            store: LocalStore::open_in_memory().expect("Failed to open in-memory store"),
            _temp_dir: None,
            path: None,
        }
    }

    /// Creates a new file-backed store in a temporary directory.
    pub fn file() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("pocketsync.db");
        let store = LocalStore::open(&path).expect("Failed to open file store");
        Self {
            store,
            _temp_dir: Some(temp_dir),
            path: Some(path),
        }
    }

    /// Returns the database path if file-backed, None if in-memory.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Opens a second store on the same file, as an app restart would.
    ///
    /// # Panics
    ///
    /// Panics for in-memory stores.
    pub fn reopen(&self) -> LocalStore {
        let path = self.path().expect("Only file stores can be reopened");
        LocalStore::open(path).expect("Failed to reopen file store")
    }
}

impl std::ops::Deref for TestStore {
    type Target = LocalStore;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

/// Mock remotes for both entity types.
pub struct MockServer {
    /// The transactions collection.
    pub transactions: Arc<MockRemote<Transaction>>,
    /// The categories collection.
    pub categories: Arc<MockRemote<Category>>,
}

impl MockServer {
    /// Creates an empty, online server.
    pub fn new() -> Self {
        Self {
            transactions: Arc::new(MockRemote::new()),
            categories: Arc::new(MockRemote::new()),
        }
    }

    /// Takes both collections offline or back online.
    pub fn set_offline(&self, offline: bool) {
        self.transactions.set_offline(offline);
        self.categories.set_offline(offline);
    }
}

impl Default for MockServer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::CategoryBuilder;
    use pocketsync_store::RowState;

    #[test]
    fn file_store_survives_reopen() {
        let test_store = TestStore::file();
        let category = CategoryBuilder::new("srv_1").name("Rent").build();
        test_store
            .categories()
            .upsert(&category, RowState::Synced)
            .unwrap();

        let reopened = test_store.reopen();
        assert_eq!(reopened.categories().active().unwrap(), vec![category]);
    }

    #[test]
    fn memory_store_has_no_path() {
        assert!(TestStore::memory().path().is_none());
        assert!(TestStore::file().path().is_some());
    }
}
