//! # PocketSync Remote
//!
//! Talks to the budgeting REST API.
//!
//! This crate provides:
//! - `RemoteApi`, the async per-entity CRUD contract the sync engine uses
//! - `HttpRemote`, a reqwest-backed JSON client with bounded timeouts
//! - `MockRemote`, an in-memory server with failure injection for tests
//! - `Connectivity`, the "are we online" probe
//!
//! ## Wire format
//!
//! | Operation | Request |
//! |-----------|---------|
//! | list | `GET /{collection}` (`?month=YYYY-MM` for scoped entities) |
//! | create | `POST /{collection}` |
//! | create batch | `POST /{collection}/batch` with a JSON array |
//! | update | `PUT /{collection}/{id}` |
//! | delete | `DELETE /{collection}/{id}` |
//! | delete batch | `POST /{collection}/batchDelete` with `{"ids": [...]}` |
//!
//! Any non-2xx status, network failure, timeout or undecodable body is a
//! [`RemoteError`].

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod api;
mod connectivity;
mod error;
mod http;
mod mock;

pub use api::RemoteApi;
pub use connectivity::{AlwaysOnline, Connectivity, ManualConnectivity};
pub use error::{RemoteError, RemoteResult};
pub use http::{HttpRemote, RemoteConfig};
pub use mock::{MockRemote, Operation, RemoteCall};
