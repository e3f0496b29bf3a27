//! Sync status reported by each sync manager and by the orchestrator.

use serde::Serialize;
use std::fmt;

/// The state of a sync manager, or the aggregate of several.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", content = "detail", rename_all = "lowercase")]
pub enum SyncStatus {
    /// No sync has run yet.
    #[default]
    Idle,
    /// A sync pass is in progress.
    Syncing,
    /// The last pass completed at the given epoch millis.
    Success(i64),
    /// The last pass failed with the given message.
    Error(String),
}

impl SyncStatus {
    /// Returns true for `Success` and `Error`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SyncStatus::Success(_) | SyncStatus::Error(_))
    }

    /// Returns true while a pass is running.
    pub fn is_syncing(&self) -> bool {
        matches!(self, SyncStatus::Syncing)
    }

    /// Combines several statuses into one.
    ///
    /// Any `Syncing` wins, then the first `Error` (errors are not merged),
    /// then `Success` with the latest timestamp if every status succeeded.
    /// Anything else, including an empty input, is `Idle`.
    pub fn aggregate<'a, I>(statuses: I) -> SyncStatus
    where
        I: IntoIterator<Item = &'a SyncStatus>,
    {
        let statuses: Vec<&SyncStatus> = statuses.into_iter().collect();

        if statuses.iter().any(|s| s.is_syncing()) {
            return SyncStatus::Syncing;
        }

        if let Some(error) = statuses.iter().find(|s| matches!(s, SyncStatus::Error(_))) {
            return (**error).clone();
        }

        let mut latest = None;
        for status in &statuses {
            match status {
                SyncStatus::Success(at) => latest = Some(latest.map_or(*at, |l: i64| l.max(*at))),
                _ => return SyncStatus::Idle,
            }
        }

        latest.map_or(SyncStatus::Idle, SyncStatus::Success)
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncStatus::Idle => f.write_str("idle"),
            SyncStatus::Syncing => f.write_str("syncing"),
            SyncStatus::Success(at) => write!(f, "synced at {at}"),
            SyncStatus::Error(message) => write!(f, "sync failed: {message}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn syncing_dominates() {
        let statuses = [
            SyncStatus::Error("boom".into()),
            SyncStatus::Syncing,
            SyncStatus::Success(3),
        ];
        assert_eq!(SyncStatus::aggregate(&statuses), SyncStatus::Syncing);
    }

    #[test]
    fn first_error_surfaces() {
        let statuses = [
            SyncStatus::Success(1),
            SyncStatus::Error("first".into()),
            SyncStatus::Error("second".into()),
        ];
        assert_eq!(
            SyncStatus::aggregate(&statuses),
            SyncStatus::Error("first".into())
        );
    }

    #[test]
    fn all_success_takes_latest_timestamp() {
        let statuses = [SyncStatus::Success(10), SyncStatus::Success(30)];
        assert_eq!(SyncStatus::aggregate(&statuses), SyncStatus::Success(30));
    }

    #[test]
    fn mixed_idle_and_success_is_idle() {
        let statuses = [SyncStatus::Success(10), SyncStatus::Idle];
        assert_eq!(SyncStatus::aggregate(&statuses), SyncStatus::Idle);
        assert_eq!(SyncStatus::aggregate(std::iter::empty()), SyncStatus::Idle);
    }

    #[test]
    fn display_reads_like_a_banner() {
        assert_eq!(
            SyncStatus::Error("offline".into()).to_string(),
            "sync failed: offline"
        );
        assert_eq!(SyncStatus::Success(7).to_string(), "synced at 7");
    }

    fn status_strategy() -> impl Strategy<Value = SyncStatus> {
        prop_oneof![
            Just(SyncStatus::Idle),
            Just(SyncStatus::Syncing),
            any::<i64>().prop_map(SyncStatus::Success),
            "[a-z]{1,8}".prop_map(SyncStatus::Error),
        ]
    }

    proptest! {
        #[test]
        fn aggregate_is_one_of_the_rules(statuses in prop::collection::vec(status_strategy(), 0..6)) {
            let aggregate = SyncStatus::aggregate(&statuses);
            match aggregate {
                SyncStatus::Syncing => prop_assert!(statuses.iter().any(|s| s.is_syncing())),
                SyncStatus::Error(_) => {
                    prop_assert!(!statuses.iter().any(|s| s.is_syncing()));
                    prop_assert!(statuses.contains(&aggregate));
                }
                SyncStatus::Success(at) => {
                    prop_assert!(statuses.iter().all(|s| matches!(s, SyncStatus::Success(t) if *t <= at)));
                }
                SyncStatus::Idle => prop_assert!(
                    statuses.is_empty() || statuses.iter().any(|s| *s == SyncStatus::Idle)
                ),
            }
        }
    }
}
