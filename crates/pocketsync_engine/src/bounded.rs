//! Time bounds for remote calls.

use pocketsync_remote::{RemoteError, RemoteResult};
use std::future::Future;
use std::time::Duration;

/// Runs a remote call, turning an overrun of `limit` into a timeout error.
pub(crate) async fn bounded<R>(
    limit: Duration,
    call: impl Future<Output = RemoteResult<R>>,
) -> RemoteResult<R> {
    tokio::time::timeout(limit, call)
        .await
        .unwrap_or(Err(RemoteError::Timeout))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn slow_calls_time_out() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(1)
        };
        assert_eq!(
            bounded(Duration::from_millis(20), slow).await,
            Err(RemoteError::Timeout)
        );
        assert_eq!(
            bounded(Duration::from_millis(20), async { Ok(2) }).await,
            Ok(2)
        );
    }
}
