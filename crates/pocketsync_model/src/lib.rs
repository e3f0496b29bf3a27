//! # PocketSync Model
//!
//! Entity types shared by every PocketSync crate.
//!
//! This crate provides:
//! - `Transaction` and `Category`, the two synchronized entities
//! - The `Entity` trait the store, remote client and sync engine are generic over
//! - `MonthFilter` for month-scoped transaction pulls
//! - `SyncStatus` and its aggregation rule
//! - Local-only id generation (`local_` prefix)
//!
//! This is a pure data crate with no I/O operations.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod category;
mod entity;
mod error;
mod month;
mod status;
mod transaction;

pub use category::Category;
pub use entity::{is_local_id, new_local_id, now_millis, Entity, LOCAL_ID_PREFIX};
pub use error::{ModelError, ModelResult};
pub use month::MonthFilter;
pub use status::SyncStatus;
pub use transaction::{EntryType, Transaction};
