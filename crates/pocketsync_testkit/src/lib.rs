//! # PocketSync Testkit
//!
//! Test utilities for PocketSync.
//!
//! This crate provides:
//! - Temporary stores, in memory or file-backed
//! - Builders for transactions and categories with fixed, readable ids
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pocketsync_testkit::prelude::*;
//!
//! #[test]
//! fn test_with_store() {
//!     let store = TestStore::memory();
//!     let txn = TransactionBuilder::new("srv_1").amount("42.50").build();
//!     store.transactions().upsert(&txn, RowState::Synced).unwrap();
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod builders;
pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::builders::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use pocketsync_store::RowState;
}

pub use builders::*;
pub use fixtures::*;
pub use generators::*;
