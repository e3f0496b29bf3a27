//! Typed access to one entity table.

use crate::change_feed::ChangeFeed;
use crate::error::{StoreError, StoreResult};
use crate::observe::Observation;
use crate::row::{LocalRow, RowState, StateCounts};
use crate::schema::{alias_table, StoredEntity};
use parking_lot::Mutex;
use pocketsync_model::{MonthFilter, LOCAL_ID_PREFIX};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OptionalExtension, Row};
use std::marker::PhantomData;
use std::sync::Arc;

/// What happened when a pulled snapshot was applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyOutcome {
    /// Rows inserted or overwritten.
    pub written: usize,
    /// Remote rows skipped because the local row has unpushed changes.
    pub kept_pending: usize,
    /// Remote rows skipped because the local row is newer.
    pub kept_newer: usize,
}

/// A handle to the table holding entities of type `T`.
///
/// Handles are cheap to clone; all clones share the store's connection and
/// the table's change feed.
pub struct Table<T> {
    connection: Arc<Mutex<Connection>>,
    feed: Arc<ChangeFeed>,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for Table<T> {
    fn clone(&self) -> Self {
        Self {
            connection: Arc::clone(&self.connection),
            feed: Arc::clone(&self.feed),
            _entity: PhantomData,
        }
    }
}

impl<T: StoredEntity> Table<T> {
    pub(crate) fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self {
            connection,
            feed: Arc::new(ChangeFeed::new(T::TABLE)),
            _entity: PhantomData,
        }
    }

    /// The table's change feed.
    pub fn feed(&self) -> &ChangeFeed {
        &self.feed
    }

    fn select_columns() -> String {
        format!("{}, is_deleted, pending", T::COLUMNS.join(", "))
    }

    fn map_local_row(row: &Row) -> Result<LocalRow<T>, rusqlite::Error> {
        let entity = T::map_row(row)?;
        let offset = T::COLUMNS.len();
        let is_deleted: bool = row.get(offset)?;
        let pending: i64 = row.get(offset + 1)?;
        let state = RowState::from_columns(is_deleted, pending).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                offset + 1,
                rusqlite::types::Type::Integer,
                format!("unknown pending marker {pending}").into(),
            )
        })?;
        Ok(LocalRow { entity, state })
    }

    fn query_rows(
        connection: &Connection,
        condition: &str,
        params: Vec<Value>,
    ) -> StoreResult<Vec<LocalRow<T>>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE {} ORDER BY {}",
            Self::select_columns(),
            T::TABLE,
            condition,
            T::ORDER_BY
        );
        let mut statement = connection.prepare_cached(&sql)?;
        let rows = statement
            .query_map(params_from_iter(params), Self::map_local_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn select_row(connection: &Connection, id: &str) -> StoreResult<Option<LocalRow<T>>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE id = ?1",
            Self::select_columns(),
            T::TABLE
        );
        let row = connection
            .prepare_cached(&sql)?
            .query_row([id], Self::map_local_row)
            .optional()?;
        Ok(row)
    }

    fn upsert_row(connection: &Connection, entity: &T, state: RowState) -> StoreResult<()> {
        let width = T::COLUMNS.len() + 2;
        let placeholders = (1..=width)
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT OR REPLACE INTO {} ({}) VALUES ({})",
            T::TABLE,
            Self::select_columns(),
            placeholders
        );

        let (is_deleted, pending) = state.to_columns();
        let mut values = entity.to_values();
        values.push(Value::Integer(i64::from(is_deleted)));
        values.push(Value::Integer(pending));

        connection
            .prepare_cached(&sql)?
            .execute(params_from_iter(values))?;
        Ok(())
    }

    fn delete_row(connection: &Connection, id: &str) -> StoreResult<bool> {
        let sql = format!("DELETE FROM {} WHERE id = ?1", T::TABLE);
        let changed = connection.prepare_cached(&sql)?.execute([id])?;
        let sql = format!(
            "DELETE FROM {} WHERE canonical_id = ?1",
            alias_table(T::TABLE)
        );
        connection.prepare_cached(&sql)?.execute([id])?;
        Ok(changed > 0)
    }

    fn record_alias(connection: &Connection, local_id: &str, canonical_id: &str) -> StoreResult<()> {
        let sql = format!(
            "INSERT OR REPLACE INTO {} (local_id, canonical_id) VALUES (?1, ?2)",
            alias_table(T::TABLE)
        );
        connection
            .prepare_cached(&sql)?
            .execute([local_id, canonical_id])?;
        Ok(())
    }

    /// The id `id` lives under now: its canonical id if a sync pass replaced
    /// it, otherwise `id` itself.
    fn resolve_id(connection: &Connection, id: &str) -> StoreResult<String> {
        let sql = format!(
            "SELECT canonical_id FROM {} WHERE local_id = ?1",
            alias_table(T::TABLE)
        );
        let canonical: Option<String> = connection
            .prepare_cached(&sql)?
            .query_row([id], |row| row.get(0))
            .optional()?;
        Ok(canonical.unwrap_or_else(|| id.to_string()))
    }

    fn mark_row_deleted(connection: &Connection, id: &str) -> StoreResult<bool> {
        let id = Self::resolve_id(connection, id)?;
        let sql = format!("UPDATE {} SET is_deleted = 1 WHERE id = ?1", T::TABLE);
        let changed = connection.prepare_cached(&sql)?.execute([id])?;
        Ok(changed > 0)
    }

    /// Runs `f` inside one SQLite transaction and notifies observers if it
    /// reports a change.
    fn write<R>(
        &self,
        f: impl FnOnce(&Connection) -> StoreResult<(R, bool)>,
    ) -> StoreResult<R> {
        let (result, changed) = {
            let mut connection = self.connection.lock();
            let tx = connection.transaction()?;
            let outcome = f(&tx)?;
            tx.commit()?;
            outcome
        };
        if changed {
            self.feed.emit();
        }
        Ok(result)
    }

    /// Runs `f` on tokio's blocking pool.
    ///
    /// SQLite calls block the calling thread; async callers go through here
    /// so a slow disk stalls a pool thread instead of a runtime worker.
    /// Must be called from within a tokio runtime.
    pub async fn run_blocking<R, F>(&self, f: F) -> StoreResult<R>
    where
        R: Send + 'static,
        F: FnOnce(&Table<T>) -> StoreResult<R> + Send + 'static,
    {
        let table = self.clone();
        match tokio::task::spawn_blocking(move || f(&table)).await {
            Ok(result) => result,
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Err(_) => Err(StoreError::Cancelled),
        }
    }

    fn strip_rows(rows: Vec<LocalRow<T>>) -> Vec<T> {
        rows.into_iter().map(|row| row.entity).collect()
    }

    /// All rows that are not soft deleted.
    pub fn active(&self) -> StoreResult<Vec<T>> {
        let connection = self.connection.lock();
        Self::query_rows(&connection, "is_deleted = 0", Vec::new()).map(Self::strip_rows)
    }

    /// Active rows that fall in `month`.
    pub fn active_in_scope(&self, month: &MonthFilter) -> StoreResult<Vec<T>> {
        Ok(self
            .active()?
            .into_iter()
            .filter(|entity| entity.in_scope(month))
            .collect())
    }

    /// The id a row is stored under now.
    ///
    /// A sync pass that replaces a local-only row with the server's canonical
    /// row remembers the mapping, so handles still holding the local id can
    /// reach the canonical row.
    pub fn canonical_id(&self, id: &str) -> StoreResult<String> {
        let connection = self.connection.lock();
        Self::resolve_id(&connection, id)
    }

    /// Every row, soft-deleted ones included, with its state.
    pub fn all(&self) -> StoreResult<Vec<LocalRow<T>>> {
        let connection = self.connection.lock();
        Self::query_rows(&connection, "1 = 1", Vec::new())
    }

    /// The row with `id` and its state, deleted or not.
    pub fn get(&self, id: &str) -> StoreResult<Option<LocalRow<T>>> {
        let connection = self.connection.lock();
        Self::select_row(&connection, id)
    }

    /// The row with `id`, unless it is soft deleted.
    pub fn get_active(&self, id: &str) -> StoreResult<Option<T>> {
        Ok(self
            .get(id)?
            .filter(|row| !row.state.is_deleted())
            .map(|row| row.entity))
    }

    /// Ids of soft-deleted rows waiting for the server to confirm deletion.
    pub fn pending_deletion(&self) -> StoreResult<Vec<String>> {
        let connection = self.connection.lock();
        let rows = Self::query_rows(&connection, "is_deleted = 1", Vec::new())?;
        Ok(rows.into_iter().map(|row| row.entity.id().to_string()).collect())
    }

    /// Rows the server has never confirmed: local-only ids and rows created
    /// while offline. Soft-deleted rows are excluded.
    pub fn unconfirmed(&self) -> StoreResult<Vec<T>> {
        let connection = self.connection.lock();
        let rows = Self::query_rows(
            &connection,
            "is_deleted = 0 AND (substr(id, 1, ?1) = ?2 OR pending = 1)",
            vec![
                Value::Integer(LOCAL_ID_PREFIX.len() as i64),
                Value::Text(LOCAL_ID_PREFIX.to_string()),
            ],
        )?;
        Ok(Self::strip_rows(rows))
    }

    /// Confirmed rows edited while offline.
    pub fn pending_updates(&self) -> StoreResult<Vec<T>> {
        let connection = self.connection.lock();
        let rows = Self::query_rows(
            &connection,
            "is_deleted = 0 AND pending = 2 AND substr(id, 1, ?1) <> ?2",
            vec![
                Value::Integer(LOCAL_ID_PREFIX.len() as i64),
                Value::Text(LOCAL_ID_PREFIX.to_string()),
            ],
        )?;
        Ok(Self::strip_rows(rows))
    }

    /// Number of rows in each state.
    pub fn counts(&self) -> StoreResult<StateCounts> {
        let mut counts = StateCounts::default();
        for row in self.all()? {
            counts.add(row.state);
        }
        Ok(counts)
    }

    /// Inserts `entity`, or replaces the row with the same id.
    pub fn upsert(&self, entity: &T, state: RowState) -> StoreResult<()> {
        self.write(|tx| Self::upsert_row(tx, entity, state).map(|()| ((), true)))
    }

    /// Upserts every entity in one transaction.
    pub fn upsert_all(&self, entities: &[T], state: RowState) -> StoreResult<()> {
        if entities.is_empty() {
            return Ok(());
        }
        self.write(|tx| {
            for entity in entities {
                Self::upsert_row(tx, entity, state)?;
            }
            Ok(((), true))
        })
    }

    /// Applies a snapshot pulled from the server, in one transaction.
    ///
    /// Rows with unpushed local changes (pending create, update or deletion)
    /// are left alone so the next push can deliver them. Synced rows are
    /// overwritten when the remote snapshot supersedes them.
    pub fn apply_remote(&self, entities: &[T]) -> StoreResult<ApplyOutcome> {
        if entities.is_empty() {
            return Ok(ApplyOutcome::default());
        }
        self.write(|tx| {
            let mut outcome = ApplyOutcome::default();
            for remote in entities {
                match Self::select_row(tx, remote.id())? {
                    Some(local) if local.state.is_pending() => outcome.kept_pending += 1,
                    Some(local) if !remote.supersedes(&local.entity) => outcome.kept_newer += 1,
                    Some(local) if local.entity == *remote => {}
                    _ => {
                        Self::upsert_row(tx, remote, RowState::Synced)?;
                        outcome.written += 1;
                    }
                }
            }
            let changed = outcome.written > 0;
            Ok((outcome, changed))
        })
    }

    /// Replaces the row that was pushed as `sent` with the server's
    /// canonical version.
    ///
    /// The old row is removed and the canonical row inserted in the same
    /// transaction, so observers never see both or neither. The old id is
    /// remembered as an alias of the canonical id (see
    /// [`canonical_id`](Self::canonical_id)).
    ///
    /// Changes made while the push was in flight survive: a soft-deleted row
    /// stays soft deleted, and a row edited since `sent` keeps the edit under
    /// the canonical id as a pending update.
    pub fn replace(&self, sent: &T, canonical: &T) -> StoreResult<()> {
        self.replace_all(&[(sent.clone(), canonical.clone())])
    }

    /// Applies several `(sent, canonical)` replacements in one transaction.
    pub fn replace_all(&self, replacements: &[(T, T)]) -> StoreResult<()> {
        if replacements.is_empty() {
            return Ok(());
        }
        self.write(|tx| {
            for (sent, canonical) in replacements {
                let (entity, state) = match Self::select_row(tx, sent.id())? {
                    Some(row) if row.state.is_deleted() => {
                        (canonical.clone(), RowState::PendingDelete)
                    }
                    Some(row) if row.entity != *sent => {
                        let mut edited = row.entity;
                        edited.set_id(canonical.id().to_string());
                        (edited, RowState::PendingUpdate)
                    }
                    _ => (canonical.clone(), RowState::Synced),
                };
                if sent.id() != canonical.id() {
                    Self::delete_row(tx, sent.id())?;
                    Self::record_alias(tx, sent.id(), canonical.id())?;
                }
                Self::upsert_row(tx, &entity, state)?;
            }
            Ok(((), true))
        })
    }

    /// Stores an edit the server has not accepted yet, returning the row as
    /// written.
    ///
    /// The edit lands on the row's current id even if a sync pass replaced
    /// the id `entity` carries. Rows the server never confirmed stay pending
    /// creations, soft-deleted rows stay deleted, anything else becomes a
    /// pending update.
    pub fn save_pending_edit(&self, entity: &T) -> StoreResult<LocalRow<T>> {
        self.write(|tx| {
            let mut entity = entity.clone();
            let id = Self::resolve_id(tx, entity.id())?;
            if id != entity.id() {
                entity.set_id(id);
            }
            let state = match Self::select_row(tx, entity.id())? {
                Some(row) if row.state.is_deleted() => RowState::PendingDelete,
                Some(row) if row.state == RowState::PendingCreate => RowState::PendingCreate,
                _ if entity.has_local_id() => RowState::PendingCreate,
                _ => RowState::PendingUpdate,
            };
            Self::upsert_row(tx, &entity, state)?;
            Ok((LocalRow { entity, state }, true))
        })
    }

    /// Marks a pushed edit as confirmed by storing the server's version.
    ///
    /// Does nothing and returns false if the row changed since `sent` was
    /// read, so an edit made while the push was in flight stays pending.
    pub fn confirm_update(&self, sent: &T, saved: &T) -> StoreResult<bool> {
        self.write(|tx| {
            let unchanged = matches!(
                Self::select_row(tx, sent.id())?,
                Some(row) if row.state == RowState::PendingUpdate && row.entity == *sent
            );
            if unchanged {
                Self::upsert_row(tx, saved, RowState::Synced)?;
            }
            Ok((unchanged, unchanged))
        })
    }

    /// Physically deletes the row. Returns false if there was no such row.
    pub fn delete(&self, id: &str) -> StoreResult<bool> {
        self.write(|tx| Self::delete_row(tx, id).map(|deleted| (deleted, deleted)))
    }

    /// Records that the server deleted `id`.
    ///
    /// If a sync pass replaced `id` meanwhile, the server only dropped the
    /// stale id; the canonical row is soft deleted so the next pass deletes
    /// it remotely too. Otherwise the row is physically deleted.
    pub fn delete_confirmed(&self, id: &str) -> StoreResult<bool> {
        self.write(|tx| Self::confirm_row_deleted(tx, id).map(|changed| (changed, changed)))
    }

    /// [`delete_confirmed`](Self::delete_confirmed) for several ids in one
    /// transaction. Returns how many rows changed.
    pub fn delete_confirmed_many(&self, ids: &[String]) -> StoreResult<usize> {
        self.write(|tx| {
            let mut changed = 0;
            for id in ids {
                if Self::confirm_row_deleted(tx, id)? {
                    changed += 1;
                }
            }
            Ok((changed, changed > 0))
        })
    }

    fn confirm_row_deleted(connection: &Connection, id: &str) -> StoreResult<bool> {
        let current = Self::resolve_id(connection, id)?;
        if current == id {
            Self::delete_row(connection, id)
        } else {
            Self::mark_row_deleted(connection, &current)
        }
    }

    /// Physically deletes every listed row in one transaction.
    pub fn delete_many(&self, ids: &[String]) -> StoreResult<usize> {
        self.write(|tx| {
            let mut deleted = 0;
            for id in ids {
                if Self::delete_row(tx, id)? {
                    deleted += 1;
                }
            }
            Ok((deleted, deleted > 0))
        })
    }

    /// Soft deletes the row, following a replaced local id to its canonical
    /// row. Returns false if there was no such row.
    pub fn mark_deleted(&self, id: &str) -> StoreResult<bool> {
        self.write(|tx| Self::mark_row_deleted(tx, id).map(|marked| (marked, marked)))
    }

    /// Soft deletes every listed row in one transaction.
    pub fn mark_deleted_many(&self, ids: &[String]) -> StoreResult<usize> {
        self.write(|tx| {
            let mut marked = 0;
            for id in ids {
                if Self::mark_row_deleted(tx, id)? {
                    marked += 1;
                }
            }
            Ok((marked, marked > 0))
        })
    }

    /// Observes the active rows.
    ///
    /// The first `next()` yields the current rows; every later call waits for
    /// a committed write to the table and yields the re-queried rows.
    pub fn observe(&self) -> Observation<T> {
        Observation::new(self.clone(), self.feed.subscribe(), None)
    }

    /// Observes the active rows that fall in `month`.
    pub fn observe_in_scope(&self, month: MonthFilter) -> Observation<T> {
        Observation::new(self.clone(), self.feed.subscribe(), Some(month))
    }
}
