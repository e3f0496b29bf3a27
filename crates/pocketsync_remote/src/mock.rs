//! An in-memory stand-in for the REST API.

use crate::api::RemoteApi;
use crate::error::{RemoteError, RemoteResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use pocketsync_model::{is_local_id, Entity, MonthFilter};
use std::collections::{HashMap, VecDeque};
use std::time::Duration;

/// The remote operations, for failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `GET /{collection}`.
    List,
    /// `POST /{collection}`.
    Create,
    /// `POST /{collection}/batch`.
    CreateBatch,
    /// `PUT /{collection}/{id}`.
    Update,
    /// `DELETE /{collection}/{id}`.
    Delete,
    /// `POST /{collection}/batchDelete`.
    DeleteBatch,
}

/// One call received by a [`MockRemote`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    /// A list, with the scope it was sent.
    List(Option<MonthFilter>),
    /// A single create of the given (client-side) id.
    Create(String),
    /// A batch create of the given ids, in request order.
    CreateBatch(Vec<String>),
    /// An update of the given id.
    Update(String),
    /// A single delete.
    Delete(String),
    /// A batch delete.
    DeleteBatch(Vec<String>),
}

impl RemoteCall {
    /// The operation this call performed.
    pub fn operation(&self) -> Operation {
        match self {
            RemoteCall::List(_) => Operation::List,
            RemoteCall::Create(_) => Operation::Create,
            RemoteCall::CreateBatch(_) => Operation::CreateBatch,
            RemoteCall::Update(_) => Operation::Update,
            RemoteCall::Delete(_) => Operation::Delete,
            RemoteCall::DeleteBatch(_) => Operation::DeleteBatch,
        }
    }
}

struct MockState<T> {
    items: Vec<T>,
    next_id: u64,
    offline: bool,
    latency: Option<Duration>,
    failures: HashMap<Operation, VecDeque<RemoteError>>,
    batch_responses: VecDeque<Vec<T>>,
    calls: Vec<RemoteCall>,
}

/// A mock remote for testing.
///
/// Holds one collection in memory and behaves like the real server: new
/// entities with local-only ids get a canonical `srv_<n>` id, batch deletes
/// ignore unknown ids, updates and single deletes of unknown ids answer 404.
/// Failures can be queued per operation, and every call is logged.
pub struct MockRemote<T> {
    state: Mutex<MockState<T>>,
}

impl<T: Entity> Default for MockRemote<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> MockRemote<T> {
    /// Creates an empty, online mock. Canonical ids start at `srv_1`.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                items: Vec::new(),
                next_id: 1,
                offline: false,
                latency: None,
                failures: HashMap::new(),
                batch_responses: VecDeque::new(),
                calls: Vec::new(),
            }),
        }
    }

    /// Sets the number used for the next canonical id.
    pub fn with_next_id(self, next_id: u64) -> Self {
        self.state.lock().next_id = next_id;
        self
    }

    /// Adds entities to the server's collection as-is.
    pub fn seed(&self, entities: impl IntoIterator<Item = T>) {
        let mut state = self.state.lock();
        for entity in entities {
            upsert(&mut state.items, entity);
        }
    }

    /// Snapshot of the server's collection.
    pub fn items(&self) -> Vec<T> {
        self.state.lock().items.clone()
    }

    /// The server's copy of `id`.
    pub fn item(&self, id: &str) -> Option<T> {
        self.state
            .lock()
            .items
            .iter()
            .find(|item| item.id() == id)
            .cloned()
    }

    /// Makes the next call of `operation` fail with `error`.
    ///
    /// Several failures queued for the same operation are used in order.
    pub fn fail_next(&self, operation: Operation, error: RemoteError) {
        self.state
            .lock()
            .failures
            .entry(operation)
            .or_default()
            .push_back(error);
    }

    /// Makes every call fail with [`RemoteError::Offline`] while set.
    pub fn set_offline(&self, offline: bool) {
        self.state.lock().offline = offline;
    }

    /// Delays every call by `latency`.
    pub fn set_latency(&self, latency: Option<Duration>) {
        self.state.lock().latency = latency;
    }

    /// Makes the next batch create answer with `response` verbatim instead
    /// of assigning ids itself. The collection is still updated.
    pub fn respond_to_next_batch(&self, response: Vec<T>) {
        self.state.lock().batch_responses.push_back(response);
    }

    /// Every call received so far, oldest first.
    pub fn calls(&self) -> Vec<RemoteCall> {
        self.state.lock().calls.clone()
    }

    /// Number of calls of `operation` received so far.
    pub fn call_count(&self, operation: Operation) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|call| call.operation() == operation)
            .count()
    }

    /// Forgets the call log.
    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// Logs the call, waits out the latency and returns any injected failure.
    async fn begin(&self, call: RemoteCall) -> RemoteResult<()> {
        let operation = call.operation();
        let (latency, failure) = {
            let mut state = self.state.lock();
            state.calls.push(call);
            let failure = if state.offline {
                Some(RemoteError::Offline)
            } else {
                state
                    .failures
                    .get_mut(&operation)
                    .and_then(VecDeque::pop_front)
            };
            (state.latency, failure)
        };

        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        match failure {
            Some(error) => {
                tracing::trace!(?operation, %error, "mock remote failing call");
                Err(error)
            }
            None => Ok(()),
        }
    }
}

fn upsert<T: Entity>(items: &mut Vec<T>, entity: T) {
    match items.iter_mut().find(|item| item.id() == entity.id()) {
        Some(existing) => *existing = entity,
        None => items.push(entity),
    }
}

fn confirm<T: Entity>(state: &mut MockState<T>, entity: &T) -> T {
    let mut canonical = entity.clone();
    if canonical.id().is_empty() || is_local_id(canonical.id()) {
        canonical.set_id(format!("srv_{}", state.next_id));
        state.next_id += 1;
    }
    upsert(&mut state.items, canonical.clone());
    canonical
}

#[async_trait]
impl<T: Entity> RemoteApi<T> for MockRemote<T> {
    async fn list(&self, scope: Option<&MonthFilter>) -> RemoteResult<Vec<T>> {
        let scope = scope.filter(|_| T::SCOPED).copied();
        self.begin(RemoteCall::List(scope)).await?;
        let state = self.state.lock();
        Ok(state
            .items
            .iter()
            .filter(|item| scope.as_ref().map_or(true, |month| item.in_scope(month)))
            .cloned()
            .collect())
    }

    async fn create(&self, entity: &T) -> RemoteResult<T> {
        self.begin(RemoteCall::Create(entity.id().to_string()))
            .await?;
        Ok(confirm(&mut self.state.lock(), entity))
    }

    async fn create_batch(&self, entities: &[T]) -> RemoteResult<Vec<T>> {
        let ids = entities.iter().map(|e| e.id().to_string()).collect();
        self.begin(RemoteCall::CreateBatch(ids)).await?;

        let mut state = self.state.lock();
        if let Some(canned) = state.batch_responses.pop_front() {
            for entity in &canned {
                upsert(&mut state.items, entity.clone());
            }
            return Ok(canned);
        }
        Ok(entities
            .iter()
            .map(|entity| confirm(&mut state, entity))
            .collect())
    }

    async fn update(&self, entity: &T) -> RemoteResult<T> {
        self.begin(RemoteCall::Update(entity.id().to_string()))
            .await?;
        let mut state = self.state.lock();
        match state.items.iter_mut().find(|item| item.id() == entity.id()) {
            Some(existing) => {
                *existing = entity.clone();
                Ok(entity.clone())
            }
            None => Err(RemoteError::status(404, format!("no such id {}", entity.id()))),
        }
    }

    async fn delete(&self, id: &str) -> RemoteResult<()> {
        self.begin(RemoteCall::Delete(id.to_string())).await?;
        let mut state = self.state.lock();
        let before = state.items.len();
        state.items.retain(|item| item.id() != id);
        if state.items.len() == before {
            return Err(RemoteError::status(404, format!("no such id {id}")));
        }
        Ok(())
    }

    async fn delete_batch(&self, ids: &[String]) -> RemoteResult<()> {
        self.begin(RemoteCall::DeleteBatch(ids.to_vec())).await?;
        self.state
            .lock()
            .items
            .retain(|item| !ids.iter().any(|id| id == item.id()));
        Ok(())
    }
}
