//! # PocketSync Store
//!
//! The durable local cache the app reads from, backed by SQLite.
//!
//! This crate provides:
//! - One table per entity (`transactions`, `categories`)
//! - Soft deletion and pending-push markers per row (`RowState`)
//! - Insert-or-replace upserts keyed by id, single and bulk
//! - Atomic replacement of local-only rows by their canonical version
//! - A change feed and reactive `Observation`s that re-query on every write
//!
//! ## Concurrency
//!
//! All tables share one connection behind a single-writer lock. Every
//! operation takes the lock once, and multi-row operations run inside one
//! SQLite transaction, so a crash mid-operation never leaves a partial write.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod change_feed;
mod error;
mod observe;
mod row;
mod schema;
mod store;
mod table;

pub use change_feed::ChangeFeed;
pub use error::{StoreError, StoreResult};
pub use observe::Observation;
pub use row::{LocalRow, RowState, StateCounts};
pub use schema::{StoredEntity, SCHEMA_VERSION};
pub use store::LocalStore;
pub use table::{ApplyOutcome, Table};
