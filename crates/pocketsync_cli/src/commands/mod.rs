//! CLI command implementations.

pub mod categories;
pub mod status;
pub mod sync;
pub mod transactions;

use clap::ValueEnum;
use pocketsync_engine::{SyncConfig, SyncEngine};
use pocketsync_remote::ManualConnectivity;
use pocketsync_store::LocalStore;
use std::path::PathBuf;
use std::sync::Arc;

/// Output format for listing commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Human-readable text.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

/// Global options that decide which database and server to use.
#[derive(Debug, Clone)]
pub struct Options {
    /// Local database file.
    pub db: PathBuf,
    /// Server URL overriding the configuration file.
    pub server: Option<String>,
    /// JSON configuration file.
    pub config: Option<PathBuf>,
    /// Treat the device as offline.
    pub offline: bool,
}

/// Opens the database and wires up a sync engine.
pub fn open_engine(options: &Options) -> Result<SyncEngine, Box<dyn std::error::Error>> {
    let mut config = match &options.config {
        Some(path) => SyncConfig::from_json_file(path)?,
        None => SyncConfig::default(),
    };
    if let Some(server) = &options.server {
        config = config.with_server_url(server.clone());
    }

    tracing::debug!(db = %options.db.display(), offline = options.offline, "opening database");
    let store = LocalStore::open(&options.db)?;
    let connectivity = Arc::new(ManualConnectivity::new(!options.offline));
    let engine = SyncEngine::builder(store, config)
        .connectivity(connectivity)
        .build()?;
    Ok(engine)
}
