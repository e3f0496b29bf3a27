//! # PocketSync Engine
//!
//! Offline-first repositories and the sync machinery behind them.
//!
//! This crate provides:
//! - `Repository`, the local-first CRUD surface the app writes through
//! - `SyncManager`, the per-entity reconciliation pass
//! - `SyncOrchestrator`, which runs every manager and aggregates their status
//! - `SyncEngine`, which wires all of the above from a `SyncConfig`
//!
//! ## Architecture
//!
//! Writes are local-first: a repository tries the server, and if the server
//! cannot be reached the change is kept locally with a pending marker.
//! A sync pass then reconciles each entity in three phases:
//! 1. Push deletions (one batch delete of every soft-deleted row)
//! 2. Push creations (one batch create of every unconfirmed row), then
//!    pending edits one at a time
//! 3. Pull the server's snapshot and apply it in one transaction
//!
//! ## Key Invariants
//!
//! - At most one pass per entity runs at a time
//! - Every pass emits `Syncing` first and exactly one terminal status
//! - Push failures never abort a pass; pull and store failures do
//! - A pull never overwrites a local change that has not been pushed
//! - Errors are reported through status, never propagated to the caller

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod bounded;
mod config;
mod engine;
mod error;
mod manager;
mod orchestrator;
mod repository;

pub use config::{SyncConfig, MAX_REQUEST_TIMEOUT, MIN_REQUEST_TIMEOUT};
pub use engine::{SyncEngine, SyncEngineBuilder};
pub use error::{SyncError, SyncResult};
pub use manager::{EntitySync, SyncManager, SyncReport};
pub use orchestrator::{AggregateWatch, SyncOrchestrator, OFFLINE_MESSAGE};
pub use repository::{CategoryRepository, Repository, TransactionRepository};
