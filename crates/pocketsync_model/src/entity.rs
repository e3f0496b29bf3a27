//! The `Entity` trait and local-only id helpers.

use crate::month::MonthFilter;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;
use time::OffsetDateTime;

/// Prefix carried by ids generated on the device before the server has
/// assigned a canonical id.
pub const LOCAL_ID_PREFIX: &str = "local_";

/// Returns true if `id` was generated locally and has not been replaced by a
/// server-assigned id yet.
pub fn is_local_id(id: &str) -> bool {
    id.starts_with(LOCAL_ID_PREFIX)
}

/// Generates a new local-only id of the form `local_<millis>_<suffix>`.
///
/// The random suffix keeps ids unique when several entities are created
/// within the same millisecond.
pub fn new_local_id() -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{LOCAL_ID_PREFIX}{}_{}", now_millis(), &suffix[..8])
}

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

/// A record kept in the local store and mirrored on the remote server.
///
/// The store, the remote client and the sync engine are generic over this
/// trait; everything entity-specific about reconciliation lives here.
pub trait Entity:
    Clone + Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// REST collection segment, e.g. `transactions` in `GET /transactions`.
    const COLLECTION: &'static str;

    /// Human readable name used in logs.
    const KIND: &'static str;

    /// Whether remote listing accepts a month filter.
    const SCOPED: bool = false;

    /// The entity id.
    fn id(&self) -> &str;

    /// Replaces the entity id.
    fn set_id(&mut self, id: String);

    /// Returns true if the entity belongs to `month`.
    ///
    /// Only meaningful for scoped entities; unscoped ones are always in scope.
    fn in_scope(&self, _month: &MonthFilter) -> bool {
        true
    }

    /// Returns true if this (remote) snapshot should overwrite `local`.
    fn supersedes(&self, _local: &Self) -> bool {
        true
    }

    /// Returns true if the id is still a local-only placeholder.
    fn has_local_id(&self) -> bool {
        is_local_id(self.id())
    }
}
