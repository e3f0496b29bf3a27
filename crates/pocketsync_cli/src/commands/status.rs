//! Status command implementation.

use super::Format;
use pocketsync_engine::SyncEngine;
use pocketsync_store::StateCounts;
use serde::Serialize;

/// Row counts for one entity.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct EntityStatus {
    /// Entity kind.
    pub kind: &'static str,
    /// Rows matching the server.
    pub synced: usize,
    /// Rows the server has never seen.
    pub pending_create: usize,
    /// Edits not yet pushed.
    pub pending_update: usize,
    /// Deletions not yet pushed.
    pub pending_delete: usize,
}

impl EntityStatus {
    fn new(kind: &'static str, counts: StateCounts) -> Self {
        Self {
            kind,
            synced: counts.synced,
            pending_create: counts.pending_create,
            pending_update: counts.pending_update,
            pending_delete: counts.pending_delete,
        }
    }
}

/// Collects counts for every entity.
pub fn collect(engine: &SyncEngine) -> Result<Vec<EntityStatus>, Box<dyn std::error::Error>> {
    let store = engine.store();
    Ok(vec![
        EntityStatus::new("transaction", store.transactions().counts()?),
        EntityStatus::new("category", store.categories().counts()?),
    ])
}

/// Runs the status command.
pub fn run(engine: &SyncEngine, format: Format) -> Result<(), Box<dyn std::error::Error>> {
    let statuses = collect(engine)?;
    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&statuses)?),
        Format::Text => {
            println!("Server: {}", engine.config().server_url);
            for status in &statuses {
                println!(
                    "{:<12} {} synced, {} to create, {} to update, {} to delete",
                    status.kind,
                    status.synced,
                    status.pending_create,
                    status.pending_update,
                    status.pending_delete
                );
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::offline_engine;
    use pocketsync_model::{Category, EntryType};

    #[tokio::test]
    async fn counts_pending_rows_per_entity() {
        let (engine, _dir) = offline_engine();
        engine
            .categories()
            .create(Category::new("Rent", EntryType::Expense))
            .await
            .unwrap();

        let statuses = collect(&engine).unwrap();

        assert_eq!(statuses[0].pending_create, 0);
        assert_eq!(statuses[1].kind, "category");
        assert_eq!(statuses[1].pending_create, 1);
    }
}
