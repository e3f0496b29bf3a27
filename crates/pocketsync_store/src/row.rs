//! Per-row sync state.

/// Where a local row stands relative to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowState {
    /// The row matches what the server last returned.
    Synced,
    /// Created locally; the server has not confirmed it yet.
    PendingCreate,
    /// Edited locally; the server has not confirmed the edit yet.
    PendingUpdate,
    /// Deleted locally; kept until the server confirms the deletion.
    ///
    /// Rows in this state are never returned by active queries.
    PendingDelete,
}

const PENDING_NONE: i64 = 0;
const PENDING_CREATE: i64 = 1;
const PENDING_UPDATE: i64 = 2;

impl RowState {
    /// Encodes the state as the `(is_deleted, pending)` column pair.
    pub(crate) fn to_columns(self) -> (bool, i64) {
        match self {
            RowState::Synced => (false, PENDING_NONE),
            RowState::PendingCreate => (false, PENDING_CREATE),
            RowState::PendingUpdate => (false, PENDING_UPDATE),
            RowState::PendingDelete => (true, PENDING_NONE),
        }
    }

    /// Decodes the `(is_deleted, pending)` column pair.
    ///
    /// A deleted row is `PendingDelete` whatever its pending marker says.
    pub(crate) fn from_columns(is_deleted: bool, pending: i64) -> Option<Self> {
        if is_deleted {
            return Some(RowState::PendingDelete);
        }
        match pending {
            PENDING_NONE => Some(RowState::Synced),
            PENDING_CREATE => Some(RowState::PendingCreate),
            PENDING_UPDATE => Some(RowState::PendingUpdate),
            _ => None,
        }
    }

    /// Returns true if the row is soft deleted.
    pub fn is_deleted(&self) -> bool {
        matches!(self, RowState::PendingDelete)
    }

    /// Returns true if the row holds a change the server has not seen.
    pub fn is_pending(&self) -> bool {
        !matches!(self, RowState::Synced)
    }
}

/// An entity together with its local sync state.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalRow<T> {
    /// The stored entity.
    pub entity: T,
    /// Its sync state.
    pub state: RowState,
}

/// Number of rows in each state, for status displays.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StateCounts {
    /// Rows matching the server.
    pub synced: usize,
    /// Rows created offline.
    pub pending_create: usize,
    /// Rows edited offline.
    pub pending_update: usize,
    /// Rows deleted offline.
    pub pending_delete: usize,
}

impl StateCounts {
    /// Total number of rows, including soft-deleted ones.
    pub fn total(&self) -> usize {
        self.synced + self.pending_create + self.pending_update + self.pending_delete
    }

    /// Number of rows the next sync needs to push.
    pub fn pending(&self) -> usize {
        self.pending_create + self.pending_update + self.pending_delete
    }

    pub(crate) fn add(&mut self, state: RowState) {
        match state {
            RowState::Synced => self.synced += 1,
            RowState::PendingCreate => self.pending_create += 1,
            RowState::PendingUpdate => self.pending_update += 1,
            RowState::PendingDelete => self.pending_delete += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_encoding_round_trips() {
        for state in [
            RowState::Synced,
            RowState::PendingCreate,
            RowState::PendingUpdate,
            RowState::PendingDelete,
        ] {
            let (deleted, pending) = state.to_columns();
            assert_eq!(RowState::from_columns(deleted, pending), Some(state));
        }
    }

    #[test]
    fn deleted_flag_wins_over_pending_marker() {
        assert_eq!(
            RowState::from_columns(true, PENDING_CREATE),
            Some(RowState::PendingDelete)
        );
        assert_eq!(RowState::from_columns(false, 9), None);
    }

    #[test]
    fn counts_track_pending_rows() {
        let mut counts = StateCounts::default();
        counts.add(RowState::Synced);
        counts.add(RowState::PendingDelete);
        counts.add(RowState::PendingCreate);
        assert_eq!(counts.total(), 3);
        assert_eq!(counts.pending(), 2);
    }
}
