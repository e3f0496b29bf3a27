//! Per-entity reconciliation.

use crate::bounded::bounded;
use crate::error::SyncResult;
use async_trait::async_trait;
use pocketsync_model::{now_millis, MonthFilter, SyncStatus};
use pocketsync_remote::RemoteApi;
use pocketsync_store::{StoredEntity, Table};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Semaphore};

/// What one sync pass did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    /// Entity kind the pass ran for.
    pub kind: &'static str,
    /// Rows whose deletion the server confirmed.
    pub deleted: usize,
    /// Rows the server created and returned canonical versions for.
    pub created: usize,
    /// Pending edits the server accepted.
    pub updated: usize,
    /// Local rows written from the pulled snapshot.
    pub pulled: usize,
    /// Pulled rows skipped to keep a local change.
    pub kept_local: usize,
    /// Pushes that failed and stay pending, as log-ready messages.
    pub push_failures: Vec<String>,
    /// The terminal status the pass ended with.
    pub status: SyncStatus,
}

impl SyncReport {
    /// An empty report for `kind`.
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            deleted: 0,
            created: 0,
            updated: 0,
            pulled: 0,
            kept_local: 0,
            push_failures: Vec::new(),
            status: SyncStatus::Idle,
        }
    }

    /// A report for a pass that never ran.
    pub fn failed(kind: &'static str, message: impl Into<String>) -> Self {
        Self {
            status: SyncStatus::Error(message.into()),
            ..Self::new(kind)
        }
    }

    /// Returns true if the pass ended in `Success`.
    pub fn is_success(&self) -> bool {
        matches!(self.status, SyncStatus::Success(_))
    }
}

/// A sync manager of any entity type, as driven by the orchestrator.
#[async_trait]
pub trait EntitySync: Send + Sync {
    /// Entity kind, for logs and reports.
    fn kind(&self) -> &'static str;

    /// Runs one pass. Never fails; the outcome is in the report and status.
    async fn sync(&self, scope: Option<MonthFilter>) -> SyncReport;

    /// Current status.
    fn status(&self) -> SyncStatus;

    /// Receiver notified on every status change.
    fn subscribe(&self) -> watch::Receiver<SyncStatus>;

    /// Records a pass that could not start. Ignored while a pass is running.
    fn record_failure(&self, message: &str);
}

/// Reconciles one entity table with its remote collection.
///
/// A pass pushes soft deletions, then unconfirmed creations and pending
/// edits, then pulls the server's snapshot. Concurrent calls to
/// [`sync`](SyncManager::sync) queue behind each other.
pub struct SyncManager<T> {
    table: Table<T>,
    remote: Arc<dyn RemoteApi<T>>,
    status: watch::Sender<SyncStatus>,
    guard: Semaphore,
    request_timeout: Duration,
}

impl<T: StoredEntity> SyncManager<T> {
    /// Creates a manager. Each remote call is bounded by `request_timeout`.
    pub fn new(table: Table<T>, remote: Arc<dyn RemoteApi<T>>, request_timeout: Duration) -> Self {
        let (status, _) = watch::channel(SyncStatus::Idle);
        Self {
            table,
            remote,
            status,
            guard: Semaphore::new(1),
            request_timeout,
        }
    }

    /// Current status.
    pub fn status(&self) -> SyncStatus {
        self.status.borrow().clone()
    }

    /// Receiver notified on every status change.
    pub fn subscribe(&self) -> watch::Receiver<SyncStatus> {
        self.status.subscribe()
    }

    fn set_status(&self, status: SyncStatus) {
        tracing::trace!(kind = T::KIND, %status, "status changed");
        self.status.send_replace(status);
    }

    /// Runs one sync pass.
    ///
    /// `scope` narrows the pull for scoped entities. Emits `Syncing` before
    /// any network call and exactly one of `Success` or `Error` at the end.
    /// Errors never propagate; they are recorded in the status and report.
    #[tracing::instrument(name = "sync", skip(self), fields(kind = T::KIND))]
    pub async fn sync(&self, scope: Option<MonthFilter>) -> SyncReport {
        let Ok(_permit) = self.guard.acquire().await else {
            return SyncReport::failed(T::KIND, "sync manager shut down");
        };

        self.set_status(SyncStatus::Syncing);
        let mut report = SyncReport::new(T::KIND);

        report.status = match self.run_phases(scope.as_ref(), &mut report).await {
            Ok(()) => {
                tracing::info!(
                    deleted = report.deleted,
                    created = report.created,
                    updated = report.updated,
                    pulled = report.pulled,
                    push_failures = report.push_failures.len(),
                    "sync pass complete"
                );
                SyncStatus::Success(now_millis())
            }
            Err(err) => {
                tracing::error!(%err, "sync pass failed");
                SyncStatus::Error(err.to_string())
            }
        };

        self.set_status(report.status.clone());
        report
    }

    async fn run_phases(
        &self,
        scope: Option<&MonthFilter>,
        report: &mut SyncReport,
    ) -> SyncResult<()> {
        self.push_deletions(report).await?;
        self.push_creations(report).await?;
        self.push_updates(report).await?;
        self.pull(scope, report).await
    }

    async fn push_deletions(&self, report: &mut SyncReport) -> SyncResult<()> {
        let ids = self.table.run_blocking(|table| table.pending_deletion()).await?;
        if ids.is_empty() {
            return Ok(());
        }
        tracing::debug!(count = ids.len(), "pushing deletions");

        match bounded(self.request_timeout, self.remote.delete_batch(&ids)).await {
            Ok(()) => {
                let confirmed = ids.clone();
                report.deleted = self
                    .table
                    .run_blocking(move |table| table.delete_many(&confirmed))
                    .await?;
            }
            Err(err) => {
                tracing::warn!(%err, count = ids.len(), "batch delete failed; rows stay flagged");
                report.push_failures.push(format!("delete: {err}"));
            }
        }
        Ok(())
    }

    async fn push_creations(&self, report: &mut SyncReport) -> SyncResult<()> {
        let pending = self.table.run_blocking(|table| table.unconfirmed()).await?;
        if pending.is_empty() {
            return Ok(());
        }
        tracing::debug!(count = pending.len(), "pushing creations");

        let canonical = match bounded(self.request_timeout, self.remote.create_batch(&pending)).await {
            Ok(canonical) => canonical,
            Err(err) => {
                tracing::warn!(%err, count = pending.len(), "batch create failed; rows stay pending");
                report.push_failures.push(format!("create: {err}"));
                return Ok(());
            }
        };

        if canonical.len() != pending.len() {
            tracing::warn!(
                sent = pending.len(),
                received = canonical.len(),
                "batch create answered a different number of rows; unmatched rows stay pending"
            );
        }
        // Each pair carries the row as sent so edits made since survive.
        let replacements: Vec<(T, T)> = pending.into_iter().zip(canonical).collect();
        report.created = replacements.len();
        self.table
            .run_blocking(move |table| table.replace_all(&replacements))
            .await?;
        Ok(())
    }

    async fn push_updates(&self, report: &mut SyncReport) -> SyncResult<()> {
        let pending = self.table.run_blocking(|table| table.pending_updates()).await?;
        if pending.is_empty() {
            return Ok(());
        }
        tracing::debug!(count = pending.len(), "pushing edits");

        for entity in &pending {
            match bounded(self.request_timeout, self.remote.update(entity)).await {
                Ok(saved) => {
                    let sent = entity.clone();
                    let confirmed = self
                        .table
                        .run_blocking(move |table| table.confirm_update(&sent, &saved))
                        .await?;
                    if confirmed {
                        report.updated += 1;
                    }
                }
                Err(err) => {
                    tracing::warn!(%err, id = entity.id(), "update failed; edit stays pending");
                    report.push_failures.push(format!("update {}: {err}", entity.id()));
                }
            }
        }
        Ok(())
    }

    async fn pull(&self, scope: Option<&MonthFilter>, report: &mut SyncReport) -> SyncResult<()> {
        let scope = scope.filter(|_| T::SCOPED);
        tracing::debug!(scope = ?scope, "pulling");

        let snapshot = bounded(self.request_timeout, self.remote.list(scope)).await?;
        let received = snapshot.len();
        let outcome = self
            .table
            .run_blocking(move |table| table.apply_remote(&snapshot))
            .await?;
        report.pulled = outcome.written;
        report.kept_local = outcome.kept_pending + outcome.kept_newer;
        tracing::debug!(
            received,
            written = outcome.written,
            kept_pending = outcome.kept_pending,
            kept_newer = outcome.kept_newer,
            "applied pulled snapshot"
        );
        Ok(())
    }
}

#[async_trait]
impl<T: StoredEntity> EntitySync for SyncManager<T> {
    fn kind(&self) -> &'static str {
        T::KIND
    }

    async fn sync(&self, scope: Option<MonthFilter>) -> SyncReport {
        SyncManager::sync(self, scope).await
    }

    fn status(&self) -> SyncStatus {
        SyncManager::status(self)
    }

    fn subscribe(&self) -> watch::Receiver<SyncStatus> {
        SyncManager::subscribe(self)
    }

    fn record_failure(&self, message: &str) {
        if let Ok(_permit) = self.guard.try_acquire() {
            self.set_status(SyncStatus::Error(message.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pocketsync_model::{Category, EntryType};
    use pocketsync_remote::{MockRemote, Operation, RemoteError};
    use pocketsync_store::{LocalStore, RowState};

    fn setup() -> (LocalStore, Arc<MockRemote<Category>>, SyncManager<Category>) {
        let store = LocalStore::open_in_memory().unwrap();
        let remote = Arc::new(MockRemote::new());
        let manager = SyncManager::new(
            store.categories().clone(),
            remote.clone() as Arc<dyn RemoteApi<Category>>,
            Duration::from_secs(5),
        );
        (store, remote, manager)
    }

    #[tokio::test]
    async fn empty_pass_only_pulls() {
        let (_store, remote, manager) = setup();

        let report = manager.sync(None).await;

        assert!(report.is_success());
        assert_eq!(remote.calls().len(), 1);
        assert_eq!(remote.call_count(Operation::List), 1);
    }

    #[tokio::test]
    async fn push_failures_do_not_abort_the_pass() {
        let (store, remote, manager) = setup();
        let table = store.categories();
        table
            .upsert(&Category::new("Food", EntryType::Expense), RowState::PendingCreate)
            .unwrap();
        remote.fail_next(Operation::CreateBatch, RemoteError::status(503, ""));

        let report = manager.sync(None).await;

        assert!(report.is_success());
        assert_eq!(report.push_failures.len(), 1);
        assert_eq!(table.unconfirmed().unwrap().len(), 1);
        assert_eq!(remote.call_count(Operation::List), 1);
    }

    #[tokio::test]
    async fn pull_failure_ends_in_error() {
        let (_store, remote, manager) = setup();
        remote.fail_next(Operation::List, RemoteError::Network("reset".into()));

        let report = manager.sync(None).await;

        assert_eq!(
            report.status,
            SyncStatus::Error("remote error: network error: reset".into())
        );
        assert_eq!(manager.status(), report.status);
    }

    #[tokio::test]
    async fn pending_edits_are_pushed_and_confirmed() {
        let (store, remote, manager) = setup();
        let mut category = Category::new("Food", EntryType::Expense);
        category.id = "srv_1".into();
        remote.seed([category.clone()]);
        category.name = "Groceries".into();
        store
            .categories()
            .upsert(&category, RowState::PendingUpdate)
            .unwrap();

        let report = manager.sync(None).await;

        assert_eq!(report.updated, 1);
        assert_eq!(remote.item("srv_1").unwrap().name, "Groceries");
        let row = store.categories().get("srv_1").unwrap().unwrap();
        assert_eq!(row.state, RowState::Synced);
        assert_eq!(row.entity.name, "Groceries");
    }

    #[tokio::test]
    async fn record_failure_is_ignored_while_syncing() {
        let (_store, remote, manager) = setup();
        let manager = Arc::new(manager);
        remote.set_latency(Some(Duration::from_millis(100)));

        let running = tokio::spawn({
            let manager = Arc::clone(&manager);
            async move { manager.sync(None).await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        manager.record_failure("offline");
        assert_eq!(manager.status(), SyncStatus::Syncing);

        assert!(running.await.unwrap().is_success());
        manager.record_failure("offline");
        assert_eq!(manager.status(), SyncStatus::Error("offline".into()));
    }
}
