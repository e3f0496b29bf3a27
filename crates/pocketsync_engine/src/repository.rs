//! Local-first CRUD for one entity type.

use crate::bounded::bounded;
use pocketsync_model::{Category, MonthFilter, Transaction};
use pocketsync_remote::{AlwaysOnline, Connectivity, RemoteApi, RemoteError, RemoteResult};
use pocketsync_store::{Observation, RowState, StoreResult, StoredEntity, Table};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Repository for transactions.
pub type TransactionRepository = Repository<Transaction>;

/// Repository for categories.
pub type CategoryRepository = Repository<Category>;

/// The app's write path for one entity type.
///
/// Every mutation tries the server first. When the server answers, its
/// version is stored as synced; when it does not, the change is stored
/// locally with a pending marker for the next sync pass. Remote errors are
/// logged and never returned; only local store errors are.
pub struct Repository<T> {
    table: Table<T>,
    remote: Arc<dyn RemoteApi<T>>,
    connectivity: Arc<dyn Connectivity>,
    request_timeout: Duration,
}

impl<T> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
            remote: Arc::clone(&self.remote),
            connectivity: Arc::clone(&self.connectivity),
            request_timeout: self.request_timeout,
        }
    }
}

impl<T: StoredEntity> Repository<T> {
    /// Creates a repository that always attempts remote calls.
    pub fn new(table: Table<T>, remote: Arc<dyn RemoteApi<T>>, request_timeout: Duration) -> Self {
        Self {
            table,
            remote,
            connectivity: Arc::new(AlwaysOnline),
            request_timeout,
        }
    }

    /// Skips remote calls while `connectivity` reports offline.
    pub fn with_connectivity(mut self, connectivity: Arc<dyn Connectivity>) -> Self {
        self.connectivity = connectivity;
        self
    }

    /// The underlying table.
    pub fn table(&self) -> &Table<T> {
        &self.table
    }

    async fn call<R>(&self, call: impl Future<Output = RemoteResult<R>>) -> RemoteResult<R> {
        if !self.connectivity.is_online() {
            return Err(RemoteError::Offline);
        }
        bounded(self.request_timeout, call).await
    }

    /// Creates `entity`, returning the server's version or, if the server
    /// could not be reached, `entity` itself stored as a pending creation.
    pub async fn create(&self, entity: T) -> StoreResult<T> {
        match self.call(self.remote.create(&entity)).await {
            Ok(saved) => {
                let canonical = saved.clone();
                self.table
                    .run_blocking(move |table| table.replace(&entity, &canonical))
                    .await?;
                Ok(saved)
            }
            Err(err) => {
                tracing::warn!(kind = T::KIND, id = entity.id(), %err, "create failed; kept locally");
                let local = entity.clone();
                self.table
                    .run_blocking(move |table| table.upsert(&local, RowState::PendingCreate))
                    .await?;
                Ok(entity)
            }
        }
    }

    /// Saves an edit, returning the stored version.
    ///
    /// An edit holding a local id that a sync pass has since replaced goes to
    /// the canonical row. A failed edit of a row the server never confirmed
    /// stays a pending creation; any other failed edit becomes a pending
    /// update.
    pub async fn update(&self, mut entity: T) -> StoreResult<T> {
        let id = entity.id().to_string();
        let current = self.table.run_blocking(move |table| table.canonical_id(&id)).await?;
        if current != entity.id() {
            tracing::debug!(kind = T::KIND, from = entity.id(), to = %current, "edit follows replaced id");
            entity.set_id(current);
        }

        match self.call(self.remote.update(&entity)).await {
            Ok(saved) => {
                let synced = saved.clone();
                self.table
                    .run_blocking(move |table| table.upsert(&synced, RowState::Synced))
                    .await?;
                Ok(saved)
            }
            Err(err) => {
                let id = entity.id().to_string();
                let row = self
                    .table
                    .run_blocking(move |table| table.save_pending_edit(&entity))
                    .await?;
                tracing::warn!(kind = T::KIND, %id, %err, state = ?row.state, "update failed; kept locally");
                Ok(row.entity)
            }
        }
    }

    /// Deletes `id`: physically once the server confirms, otherwise soft
    /// deleted until the next sync pass pushes the deletion. A local id that
    /// a sync pass has since replaced deletes the canonical row.
    pub async fn delete(&self, id: &str) -> StoreResult<()> {
        let requested = id.to_string();
        let id = self
            .table
            .run_blocking(move |table| table.canonical_id(&requested))
            .await?;
        match self.call(self.remote.delete(&id)).await {
            Ok(()) => {
                self.table
                    .run_blocking(move |table| table.delete_confirmed(&id))
                    .await?;
            }
            Err(err) => {
                tracing::warn!(kind = T::KIND, %id, %err, "delete failed; marked for deletion");
                self.table
                    .run_blocking(move |table| table.mark_deleted(&id))
                    .await?;
            }
        }
        Ok(())
    }

    /// Deletes several rows with one batch call.
    pub async fn delete_many(&self, ids: &[String]) -> StoreResult<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let requested = ids.to_vec();
        let ids = self
            .table
            .run_blocking(move |table| {
                requested
                    .iter()
                    .map(|id| table.canonical_id(id))
                    .collect::<StoreResult<Vec<_>>>()
            })
            .await?;
        match self.call(self.remote.delete_batch(&ids)).await {
            Ok(()) => {
                self.table
                    .run_blocking(move |table| table.delete_confirmed_many(&ids))
                    .await?;
            }
            Err(err) => {
                tracing::warn!(kind = T::KIND, count = ids.len(), %err, "batch delete failed; marked for deletion");
                self.table
                    .run_blocking(move |table| table.mark_deleted_many(&ids))
                    .await?;
            }
        }
        Ok(())
    }

    // Reads stay synchronous so callers without a runtime can use them.

    /// Active rows, as of now.
    pub fn active(&self) -> StoreResult<Vec<T>> {
        self.table.active()
    }

    /// The active row with `id`.
    pub fn get(&self, id: &str) -> StoreResult<Option<T>> {
        self.table.get_active(id)
    }

    /// Live view of the active rows.
    pub fn observe(&self) -> Observation<T> {
        self.table.observe()
    }
}

impl Repository<Transaction> {
    /// Live view of the active transactions dated in `month`.
    pub fn observe_month(&self, month: MonthFilter) -> Observation<Transaction> {
        self.table.observe_in_scope(month)
    }

    /// Active transactions dated in `month`.
    pub fn in_month(&self, month: &MonthFilter) -> StoreResult<Vec<Transaction>> {
        self.table.active_in_scope(month)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pocketsync_model::EntryType;
    use pocketsync_remote::{ManualConnectivity, MockRemote, Operation, RemoteCall};
    use pocketsync_store::LocalStore;
    use rust_decimal::Decimal;

    fn setup() -> (LocalStore, Arc<MockRemote<Category>>, CategoryRepository) {
        let store = LocalStore::open_in_memory().unwrap();
        let remote = Arc::new(MockRemote::new());
        let repository = Repository::new(
            store.categories().clone(),
            remote.clone() as Arc<dyn RemoteApi<Category>>,
            Duration::from_secs(5),
        );
        (store, remote, repository)
    }

    #[tokio::test]
    async fn online_create_stores_canonical_row() {
        let (store, _remote, repository) = setup();
        let local = Category::new("Food", EntryType::Expense);

        let saved = repository.create(local.clone()).await.unwrap();

        assert_eq!(saved.id, "srv_1");
        let rows = store.categories().all().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].entity.id, "srv_1");
        assert_eq!(rows[0].state, RowState::Synced);
    }

    #[tokio::test]
    async fn offline_create_keeps_local_row_pending() {
        let (store, remote, repository) = setup();
        remote.set_offline(true);
        let local = Category::new("Food", EntryType::Expense);

        let saved = repository.create(local.clone()).await.unwrap();

        assert_eq!(saved, local);
        let row = store.categories().get(&local.id).unwrap().unwrap();
        assert_eq!(row.state, RowState::PendingCreate);
    }

    #[tokio::test]
    async fn failed_update_of_unconfirmed_row_stays_a_creation() {
        let (store, remote, repository) = setup();
        remote.set_offline(true);
        let mut local = repository
            .create(Category::new("Food", EntryType::Expense))
            .await
            .unwrap();
        local.name = "Groceries".into();

        repository.update(local.clone()).await.unwrap();

        let row = store.categories().get(&local.id).unwrap().unwrap();
        assert_eq!(row.state, RowState::PendingCreate);
        assert_eq!(row.entity.name, "Groceries");
    }

    #[tokio::test]
    async fn failed_update_of_confirmed_row_is_pending() {
        let (store, remote, repository) = setup();
        let mut saved = repository
            .create(Category::new("Food", EntryType::Expense))
            .await
            .unwrap();
        remote.fail_next(Operation::Update, RemoteError::Timeout);
        saved.name = "Groceries".into();

        repository.update(saved.clone()).await.unwrap();

        let row = store.categories().get(&saved.id).unwrap().unwrap();
        assert_eq!(row.state, RowState::PendingUpdate);
    }

    #[tokio::test]
    async fn delete_falls_back_to_soft_delete() {
        let (store, remote, repository) = setup();
        let a = repository.create(Category::new("A", EntryType::Expense)).await.unwrap();
        let b = repository.create(Category::new("B", EntryType::Expense)).await.unwrap();

        repository.delete(&a.id).await.unwrap();
        assert!(store.categories().get(&a.id).unwrap().is_none());

        remote.set_offline(true);
        repository.delete(&b.id).await.unwrap();
        assert_eq!(store.categories().pending_deletion().unwrap(), vec![b.id.clone()]);
        assert!(repository.active().unwrap().is_empty());
    }

    /// Offline-creates "Food", then lets the server confirm it as `srv_1`
    /// the way a sync pass would. Returns the stale local copy.
    async fn created_then_replaced(
        store: &LocalStore,
        remote: &MockRemote<Category>,
        repository: &CategoryRepository,
    ) -> Category {
        remote.set_offline(true);
        let local = repository
            .create(Category::new("Food", EntryType::Expense))
            .await
            .unwrap();
        remote.set_offline(false);
        let canonical = remote.create_batch(&[local.clone()]).await.unwrap().remove(0);
        store.categories().replace(&local, &canonical).unwrap();
        remote.clear_calls();
        local
    }

    #[tokio::test]
    async fn update_through_a_replaced_id_edits_the_canonical_row() {
        let (store, remote, repository) = setup();
        let mut stale = created_then_replaced(&store, &remote, &repository).await;
        stale.name = "Groceries".into();

        let saved = repository.update(stale).await.unwrap();

        assert_eq!(saved.id, "srv_1");
        assert_eq!(remote.calls(), vec![RemoteCall::Update("srv_1".into())]);
        let rows = store.categories().all().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].entity.name, "Groceries");
        assert_eq!(rows[0].state, RowState::Synced);
    }

    #[tokio::test]
    async fn failed_update_through_a_replaced_id_is_pending_on_the_canonical_row() {
        let (store, remote, repository) = setup();
        let mut stale = created_then_replaced(&store, &remote, &repository).await;
        remote.fail_next(Operation::Update, RemoteError::Timeout);
        stale.name = "Groceries".into();

        let kept = repository.update(stale).await.unwrap();

        assert_eq!(kept.id, "srv_1");
        let rows = store.categories().all().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].state, RowState::PendingUpdate);
        assert_eq!(rows[0].entity.name, "Groceries");
    }

    #[tokio::test]
    async fn delete_through_a_replaced_id_removes_the_canonical_row() {
        let (store, remote, repository) = setup();
        let stale = created_then_replaced(&store, &remote, &repository).await;

        repository.delete(&stale.id).await.unwrap();

        assert_eq!(remote.calls(), vec![RemoteCall::Delete("srv_1".into())]);
        assert!(store.categories().all().unwrap().is_empty());
        assert!(remote.items().is_empty());
    }

    #[tokio::test]
    async fn failed_delete_through_a_replaced_id_flags_the_canonical_row() {
        let (store, remote, repository) = setup();
        let stale = created_then_replaced(&store, &remote, &repository).await;
        remote.set_offline(true);

        repository.delete_many(&[stale.id.clone()]).await.unwrap();

        assert_eq!(store.categories().pending_deletion().unwrap(), vec!["srv_1".to_string()]);
        assert!(repository.active().unwrap().is_empty());
    }

    #[tokio::test]
    async fn offline_connectivity_skips_the_network() {
        let (store, remote, repository) = setup();
        let connectivity = Arc::new(ManualConnectivity::new(false));
        let repository = repository.with_connectivity(connectivity.clone());

        let local = repository
            .create(Category::new("Food", EntryType::Expense))
            .await
            .unwrap();

        assert!(remote.calls().is_empty());
        assert_eq!(
            store.categories().get(&local.id).unwrap().unwrap().state,
            RowState::PendingCreate
        );
    }

    #[tokio::test]
    async fn transaction_month_view() {
        let store = LocalStore::open_in_memory().unwrap();
        let remote = Arc::new(MockRemote::<Transaction>::new());
        let repository = Repository::new(
            store.transactions().clone(),
            remote as Arc<dyn RemoteApi<Transaction>>,
            Duration::from_secs(5),
        );
        let january = MonthFilter::new(2025, 1).unwrap();
        let mut view = repository.observe_month(january);
        assert!(view.next().await.unwrap().unwrap().is_empty());

        repository
            .create(Transaction::new(Decimal::new(1250, 2), EntryType::Expense, "c1", "2025-01-20"))
            .await
            .unwrap();
        repository
            .create(Transaction::new(Decimal::ONE, EntryType::Expense, "c1", "2025-02-01"))
            .await
            .unwrap();

        let rows = view.next().await.unwrap().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].date, "2025-01-20");
        assert_eq!(repository.in_month(&january).unwrap().len(), 1);
    }
}
