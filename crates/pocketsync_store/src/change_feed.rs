//! Change feed for observing committed table writes.
//!
//! Each table owns one feed. Every committed write bumps the feed's sequence
//! number, and subscribers wake up and re-run their query. Subscribers that
//! fall behind see only the latest sequence, so a burst of writes produces at
//! least one wake-up rather than one per write.

use tokio::sync::watch;

/// Distributes "table changed" notifications to observers.
#[derive(Debug)]
pub struct ChangeFeed {
    table: &'static str,
    sender: watch::Sender<u64>,
}

impl ChangeFeed {
    /// Creates a feed for `table`, starting at sequence 0.
    pub fn new(table: &'static str) -> Self {
        let (sender, _) = watch::channel(0);
        Self { table, sender }
    }

    /// The table this feed reports on.
    pub fn table(&self) -> &'static str {
        self.table
    }

    /// Subscribes to the feed.
    ///
    /// The returned receiver has already seen the current sequence; it fires
    /// on the next commit.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.sender.subscribe()
    }

    /// Records a committed write.
    ///
    /// Called by the table after the SQLite transaction commits, never before.
    pub fn emit(&self) {
        self.sender.send_modify(|sequence| *sequence += 1);
        tracing::trace!(table = self.table, sequence = *self.sender.borrow(), "table changed");
    }

    /// Returns the latest sequence number.
    pub fn latest_sequence(&self) -> u64 {
        *self.sender.borrow()
    }

    /// Returns the number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emit_bumps_sequence() {
        let feed = ChangeFeed::new("transactions");
        assert_eq!(feed.latest_sequence(), 0);
        feed.emit();
        feed.emit();
        assert_eq!(feed.latest_sequence(), 2);
        assert_eq!(feed.table(), "transactions");
    }

    #[tokio::test]
    async fn subscribers_wake_on_emit() {
        let feed = ChangeFeed::new("categories");
        let mut rx = feed.subscribe();
        assert_eq!(feed.subscriber_count(), 1);

        feed.emit();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), 1);
    }

    #[test]
    fn dropped_subscribers_are_not_counted() {
        let feed = ChangeFeed::new("categories");
        let rx = feed.subscribe();
        drop(rx);
        assert_eq!(feed.subscriber_count(), 0);
        feed.emit();
    }
}
