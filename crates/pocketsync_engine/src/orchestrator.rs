//! Running every sync manager and aggregating their status.

use crate::manager::{EntitySync, SyncReport};
use futures_util::future::select_all;
use futures_util::FutureExt;
use pocketsync_model::{MonthFilter, SyncStatus};
use pocketsync_remote::Connectivity;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinSet;

/// Message recorded on every manager when a sync is requested offline.
pub const OFFLINE_MESSAGE: &str = "offline";

/// Runs all sync managers concurrently.
///
/// The orchestrator never retries; callers decide when to sync again.
#[derive(Clone)]
pub struct SyncOrchestrator {
    managers: Vec<Arc<dyn EntitySync>>,
    connectivity: Arc<dyn Connectivity>,
}

impl SyncOrchestrator {
    /// Creates an orchestrator over `managers`.
    pub fn new(managers: Vec<Arc<dyn EntitySync>>, connectivity: Arc<dyn Connectivity>) -> Self {
        Self {
            managers,
            connectivity,
        }
    }

    /// The managers, in registration order.
    pub fn managers(&self) -> &[Arc<dyn EntitySync>] {
        &self.managers
    }

    /// Runs one pass of every manager and waits for all of them.
    ///
    /// Reports come back in registration order. When the device is offline
    /// no pass runs and every manager records an `offline` error.
    pub async fn sync_all(&self, scope: Option<MonthFilter>) -> Vec<SyncReport> {
        if !self.connectivity.is_online() {
            tracing::warn!("device offline; sync skipped");
            return self
                .managers
                .iter()
                .map(|manager| {
                    manager.record_failure(OFFLINE_MESSAGE);
                    SyncReport::failed(manager.kind(), OFFLINE_MESSAGE)
                })
                .collect();
        }

        let mut tasks = JoinSet::new();
        for (index, manager) in self.managers.iter().enumerate() {
            let manager = Arc::clone(manager);
            tasks.spawn(async move {
                let report = match AssertUnwindSafe(manager.sync(scope)).catch_unwind().await {
                    Ok(report) => report,
                    Err(_) => {
                        tracing::error!(kind = manager.kind(), "sync pass panicked");
                        manager.record_failure("sync pass panicked");
                        SyncReport::failed(manager.kind(), "sync pass panicked")
                    }
                };
                (index, report)
            });
        }

        let mut reports = Vec::with_capacity(self.managers.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(done) => reports.push(done),
                Err(err) => tracing::error!(%err, "sync task failed"),
            }
        }
        reports.sort_by_key(|(index, _)| *index);
        reports.into_iter().map(|(_, report)| report).collect()
    }

    /// The aggregate of every manager's current status.
    pub fn status(&self) -> SyncStatus {
        let statuses: Vec<SyncStatus> = self.managers.iter().map(|m| m.status()).collect();
        SyncStatus::aggregate(&statuses)
    }

    /// A watch on the aggregate status.
    pub fn subscribe(&self) -> AggregateWatch {
        AggregateWatch {
            receivers: self.managers.iter().map(|m| m.subscribe()).collect(),
        }
    }
}

/// Follows the aggregate status of several managers.
pub struct AggregateWatch {
    receivers: Vec<watch::Receiver<SyncStatus>>,
}

impl AggregateWatch {
    /// The aggregate as of now.
    pub fn current(&self) -> SyncStatus {
        let statuses: Vec<SyncStatus> = self
            .receivers
            .iter()
            .map(|receiver| receiver.borrow().clone())
            .collect();
        SyncStatus::aggregate(&statuses)
    }

    /// Waits until any manager's status changes and returns the new
    /// aggregate. Returns `None` once the managers are gone.
    pub async fn changed(&mut self) -> Option<SyncStatus> {
        if self.receivers.is_empty() {
            return None;
        }
        let waits = self
            .receivers
            .iter_mut()
            .map(|receiver| Box::pin(receiver.changed()));
        let (result, _, _) = select_all(waits).await;
        result.ok()?;

        for receiver in &mut self.receivers {
            drop(receiver.borrow_and_update());
        }
        Some(self.current())
    }
}
