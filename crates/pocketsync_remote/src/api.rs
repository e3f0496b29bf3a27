//! The per-entity REST contract.

use crate::error::RemoteResult;
use async_trait::async_trait;
use pocketsync_model::{Entity, MonthFilter};

/// CRUD access to one remote collection.
///
/// This trait abstracts the network layer so the sync engine can run against
/// the real HTTP client or an in-memory mock. Every method either returns the
/// server's answer or a [`RemoteError`](crate::RemoteError); implementations
/// never retry.
#[async_trait]
pub trait RemoteApi<T: Entity>: Send + Sync {
    /// Lists the collection. `scope` narrows scoped entities to one month
    /// and is ignored for the rest.
    async fn list(&self, scope: Option<&MonthFilter>) -> RemoteResult<Vec<T>>;

    /// Creates one entity and returns the server's canonical version.
    async fn create(&self, entity: &T) -> RemoteResult<T>;

    /// Creates several entities. The response lists the canonical versions
    /// in request order.
    async fn create_batch(&self, entities: &[T]) -> RemoteResult<Vec<T>>;

    /// Replaces the entity with the same id.
    async fn update(&self, entity: &T) -> RemoteResult<T>;

    /// Deletes one entity.
    async fn delete(&self, id: &str) -> RemoteResult<()>;

    /// Deletes several entities. Unknown ids are not an error.
    async fn delete_batch(&self, ids: &[String]) -> RemoteResult<()>;
}
