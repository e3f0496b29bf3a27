//! Reactive queries over a table.

use crate::error::StoreResult;
use crate::schema::StoredEntity;
use crate::table::Table;
use pocketsync_model::MonthFilter;
use tokio::sync::watch;

/// A live view of a table's active rows.
///
/// Created by [`Table::observe`]. Emissions follow commit order; writes that
/// land while the observer is busy are folded into the next emission.
pub struct Observation<T> {
    table: Table<T>,
    changes: watch::Receiver<u64>,
    scope: Option<MonthFilter>,
    primed: bool,
}

impl<T: StoredEntity> Observation<T> {
    pub(crate) fn new(
        table: Table<T>,
        changes: watch::Receiver<u64>,
        scope: Option<MonthFilter>,
    ) -> Self {
        Self {
            table,
            changes,
            scope,
            primed: false,
        }
    }

    /// Waits for the next emission.
    ///
    /// The first call returns immediately with the current rows. Returns
    /// `None` once the store has been dropped.
    pub async fn next(&mut self) -> Option<StoreResult<Vec<T>>> {
        if self.primed {
            self.changes.changed().await.ok()?;
        }
        self.primed = true;
        drop(self.changes.borrow_and_update());
        Some(self.current())
    }

    /// Returns true if a write has landed since the last emission.
    pub fn has_changed(&self) -> bool {
        !self.primed || self.changes.has_changed().unwrap_or(false)
    }

    /// Re-runs the query without waiting.
    pub fn current(&self) -> StoreResult<Vec<T>> {
        match &self.scope {
            Some(month) => self.table.active_in_scope(month),
            None => self.table.active(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{LocalStore, RowState};
    use pocketsync_model::{Category, EntryType, MonthFilter, Transaction};
    use rust_decimal::Decimal;
    use std::time::Duration;

    fn category(id: &str) -> Category {
        Category {
            id: id.into(),
            name: id.into(),
            entry_type: EntryType::Income,
            is_active: true,
            updated_at: 1,
            color: 0,
            icon: None,
        }
    }

    #[tokio::test]
    async fn first_emission_is_current_snapshot() {
        let store = LocalStore::open_in_memory().unwrap();
        store.categories().upsert(&category("a"), RowState::Synced).unwrap();

        let mut observation = store.categories().observe();
        let rows = observation.next().await.unwrap().unwrap();
        assert_eq!(rows, vec![category("a")]);
        assert!(!observation.has_changed());
    }

    #[tokio::test]
    async fn re_emits_after_each_write() {
        let store = LocalStore::open_in_memory().unwrap();
        let mut observation = store.categories().observe();
        assert!(observation.next().await.unwrap().unwrap().is_empty());

        store.categories().upsert(&category("a"), RowState::Synced).unwrap();
        let rows = tokio::time::timeout(Duration::from_secs(1), observation.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(rows.len(), 1);

        store.categories().mark_deleted("a").unwrap();
        let rows = tokio::time::timeout(Duration::from_secs(1), observation.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn writes_to_other_tables_do_not_wake_observers() {
        let store = LocalStore::open_in_memory().unwrap();
        let mut observation = store.categories().observe();
        observation.next().await.unwrap().unwrap();

        let txn = Transaction::new(Decimal::ONE, EntryType::Income, "a", "2025-01-01");
        store.transactions().upsert(&txn, RowState::PendingCreate).unwrap();

        assert!(!observation.has_changed());
        let waited = tokio::time::timeout(Duration::from_millis(50), observation.next()).await;
        assert!(waited.is_err());
    }

    #[tokio::test]
    async fn scoped_observation_filters_by_month() {
        let store = LocalStore::open_in_memory().unwrap();
        let january = MonthFilter::new(2025, 1).unwrap();
        let mut observation = store.transactions().observe_in_scope(january);
        observation.next().await.unwrap().unwrap();

        let jan = Transaction::new(Decimal::ONE, EntryType::Income, "a", "2025-01-10");
        let feb = Transaction::new(Decimal::ONE, EntryType::Income, "a", "2025-02-10");
        store
            .transactions()
            .upsert_all(&[jan.clone(), feb], RowState::Synced)
            .unwrap();

        let rows = observation.next().await.unwrap().unwrap();
        assert_eq!(rows, vec![jan]);
    }
}
