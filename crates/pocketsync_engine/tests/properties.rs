//! Property tests for local writes and sync passes.

use pocketsync_engine::SyncManager;
use pocketsync_model::Transaction;
use pocketsync_remote::RemoteApi;
use pocketsync_testkit::prelude::*;
use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .expect("Failed to build runtime")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn upserting_twice_equals_upserting_once(batch in transaction_batch_strategy(12)) {
        let once = TestStore::memory();
        once.transactions().upsert_all(&batch, RowState::Synced).unwrap();

        let twice = TestStore::memory();
        twice.transactions().upsert_all(&batch, RowState::Synced).unwrap();
        twice.transactions().upsert_all(&batch, RowState::Synced).unwrap();

        prop_assert_eq!(once.transactions().all().unwrap(), twice.transactions().all().unwrap());
        prop_assert_eq!(twice.transactions().active().unwrap().len(), batch.len());
    }

    #[test]
    fn applying_a_snapshot_again_writes_nothing(batch in transaction_batch_strategy(12)) {
        let store = TestStore::memory();
        let first = store.transactions().apply_remote(&batch).unwrap();
        let second = store.transactions().apply_remote(&batch).unwrap();

        prop_assert_eq!(first.written, batch.len());
        prop_assert_eq!(second.written, 0);
        prop_assert_eq!(store.transactions().counts().unwrap().synced, batch.len());
    }

    #[test]
    fn a_clean_pass_leaves_nothing_pending(
        pending in transaction_batch_strategy(8),
        deletions in 0usize..4,
    ) {
        let store = TestStore::memory();
        let server = MockServer::new();
        let local: Vec<Transaction> = pending
            .into_iter()
            .enumerate()
            .map(|(n, mut txn)| {
                txn.id = format!("local_{n}");
                txn
            })
            .collect();
        store.transactions().upsert_all(&local, RowState::PendingCreate).unwrap();
        let doomed: Vec<String> = (0..deletions).map(|n| format!("srv_gone_{n}")).collect();
        for id in &doomed {
            let txn = TransactionBuilder::new(id.clone()).build();
            server.transactions.seed([txn.clone()]);
            store.transactions().upsert(&txn, RowState::Synced).unwrap();
        }
        store.transactions().mark_deleted_many(&doomed).unwrap();

        let manager = SyncManager::new(
            store.transactions().clone(),
            server.transactions.clone() as Arc<dyn RemoteApi<Transaction>>,
            Duration::from_secs(5),
        );
        let report = runtime().block_on(manager.sync(None));

        prop_assert!(report.is_success());
        prop_assert_eq!(report.created, local.len());
        prop_assert_eq!(report.deleted, deletions);
        let counts = store.transactions().counts().unwrap();
        prop_assert_eq!(counts.pending_create + counts.pending_update + counts.pending_delete, 0);
        prop_assert_eq!(counts.synced, local.len());
        prop_assert_eq!(server.transactions.items().len(), local.len());
    }
}
