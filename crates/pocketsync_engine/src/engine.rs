//! Wiring a store, a server and the sync machinery together.

use crate::config::SyncConfig;
use crate::error::SyncResult;
use crate::manager::{EntitySync, SyncManager, SyncReport};
use crate::orchestrator::{AggregateWatch, SyncOrchestrator};
use crate::repository::{CategoryRepository, Repository, TransactionRepository};
use pocketsync_model::{Category, MonthFilter, SyncStatus, Transaction};
use pocketsync_remote::{AlwaysOnline, Connectivity, HttpRemote, RemoteApi};
use pocketsync_store::LocalStore;
use std::sync::Arc;

/// Builds a [`SyncEngine`].
///
/// Remotes default to one [`HttpRemote`] built from the configuration, and
/// connectivity defaults to [`AlwaysOnline`].
pub struct SyncEngineBuilder {
    store: LocalStore,
    config: SyncConfig,
    transactions_remote: Option<Arc<dyn RemoteApi<Transaction>>>,
    categories_remote: Option<Arc<dyn RemoteApi<Category>>>,
    connectivity: Arc<dyn Connectivity>,
}

impl SyncEngineBuilder {
    /// Uses `remote` for transactions instead of HTTP.
    pub fn transactions_remote(mut self, remote: Arc<dyn RemoteApi<Transaction>>) -> Self {
        self.transactions_remote = Some(remote);
        self
    }

    /// Uses `remote` for categories instead of HTTP.
    pub fn categories_remote(mut self, remote: Arc<dyn RemoteApi<Category>>) -> Self {
        self.categories_remote = Some(remote);
        self
    }

    /// Sets the connectivity probe.
    pub fn connectivity(mut self, connectivity: Arc<dyn Connectivity>) -> Self {
        self.connectivity = connectivity;
        self
    }

    /// Validates the configuration and assembles the engine.
    pub fn build(self) -> SyncResult<SyncEngine> {
        let config = self.config.validated()?;

        let mut http: Option<Arc<HttpRemote>> = None;
        let mut http_remote = || -> SyncResult<Arc<HttpRemote>> {
            if let Some(remote) = &http {
                return Ok(Arc::clone(remote));
            }
            let remote = Arc::new(HttpRemote::new(&config.remote_config())?);
            http = Some(Arc::clone(&remote));
            Ok(remote)
        };
        let transactions_remote: Arc<dyn RemoteApi<Transaction>> = match self.transactions_remote {
            Some(remote) => remote,
            None => http_remote()?,
        };
        let categories_remote: Arc<dyn RemoteApi<Category>> = match self.categories_remote {
            Some(remote) => remote,
            None => http_remote()?,
        };

        let timeout = config.request_timeout;
        let transactions = Repository::new(
            self.store.transactions().clone(),
            Arc::clone(&transactions_remote),
            timeout,
        )
        .with_connectivity(Arc::clone(&self.connectivity));
        let categories = Repository::new(
            self.store.categories().clone(),
            Arc::clone(&categories_remote),
            timeout,
        )
        .with_connectivity(Arc::clone(&self.connectivity));

        let transaction_sync = Arc::new(SyncManager::new(
            self.store.transactions().clone(),
            transactions_remote,
            timeout,
        ));
        let category_sync = Arc::new(SyncManager::new(
            self.store.categories().clone(),
            categories_remote,
            timeout,
        ));
        let orchestrator = SyncOrchestrator::new(
            vec![
                Arc::clone(&transaction_sync) as Arc<dyn EntitySync>,
                Arc::clone(&category_sync) as Arc<dyn EntitySync>,
            ],
            self.connectivity,
        );

        tracing::debug!(server = %config.server_url, timeout = ?timeout, "sync engine ready");
        Ok(SyncEngine {
            store: self.store,
            config,
            transactions,
            categories,
            transaction_sync,
            category_sync,
            orchestrator,
        })
    }
}

/// Repositories, sync managers and the orchestrator for one local store.
pub struct SyncEngine {
    store: LocalStore,
    config: SyncConfig,
    transactions: TransactionRepository,
    categories: CategoryRepository,
    transaction_sync: Arc<SyncManager<Transaction>>,
    category_sync: Arc<SyncManager<Category>>,
    orchestrator: SyncOrchestrator,
}

impl SyncEngine {
    /// Starts building an engine over `store`.
    pub fn builder(store: LocalStore, config: SyncConfig) -> SyncEngineBuilder {
        SyncEngineBuilder {
            store,
            config,
            transactions_remote: None,
            categories_remote: None,
            connectivity: Arc::new(AlwaysOnline),
        }
    }

    /// Builds an engine talking HTTP to `config.server_url`.
    pub fn new(store: LocalStore, config: SyncConfig) -> SyncResult<Self> {
        Self::builder(store, config).build()
    }

    /// The local store.
    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    /// The validated configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// The transaction repository.
    pub fn transactions(&self) -> &TransactionRepository {
        &self.transactions
    }

    /// The category repository.
    pub fn categories(&self) -> &CategoryRepository {
        &self.categories
    }

    /// The transaction sync manager.
    pub fn transaction_sync(&self) -> &SyncManager<Transaction> {
        &self.transaction_sync
    }

    /// The category sync manager.
    pub fn category_sync(&self) -> &SyncManager<Category> {
        &self.category_sync
    }

    /// The orchestrator.
    pub fn orchestrator(&self) -> &SyncOrchestrator {
        &self.orchestrator
    }

    /// Syncs every entity. Without an explicit `scope`, transactions are
    /// pulled for the configured default month, or in full if there is none.
    pub async fn sync(&self, scope: Option<MonthFilter>) -> Vec<SyncReport> {
        let scope = scope.or(self.config.default_scope);
        self.orchestrator.sync_all(scope).await
    }

    /// The aggregate sync status.
    pub fn status(&self) -> SyncStatus {
        self.orchestrator.status()
    }

    /// A watch on the aggregate sync status.
    pub fn subscribe(&self) -> AggregateWatch {
        self.orchestrator.subscribe()
    }
}
