//! Configuration for the sync engine.

use crate::error::{SyncError, SyncResult};
use pocketsync_model::MonthFilter;
use pocketsync_remote::RemoteConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Shortest request timeout `validated` allows.
pub const MIN_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Longest request timeout `validated` allows.
pub const MAX_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for sync operations.
///
/// Timeouts are written as whole seconds in JSON:
///
/// ```json
/// { "server_url": "http://localhost:8080/api", "request_timeout_secs": 10 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Base URL of the REST API.
    pub server_url: String,
    /// Bound on each remote call.
    #[serde(rename = "request_timeout_secs", with = "secs")]
    pub request_timeout: Duration,
    /// Bound on establishing a connection.
    #[serde(rename = "connect_timeout_secs", with = "secs")]
    pub connect_timeout: Duration,
    /// `User-Agent` override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Month pulled for scoped entities when a sync names none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_scope: Option<MonthFilter>,
}

impl SyncConfig {
    /// Creates a configuration with default timeouts.
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            request_timeout: Duration::from_secs(15),
            connect_timeout: Duration::from_secs(5),
            user_agent: None,
            default_scope: None,
        }
    }

    /// Loads a configuration from a JSON file and validates it.
    pub fn from_json_file(path: impl AsRef<Path>) -> SyncResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: SyncConfig = serde_json::from_str(&raw)?;
        config.validated()
    }

    /// Sets the server URL.
    pub fn with_server_url(mut self, server_url: impl Into<String>) -> Self {
        self.server_url = server_url.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Sets the month pulled when a sync names none.
    pub fn with_default_scope(mut self, month: MonthFilter) -> Self {
        self.default_scope = Some(month);
        self
    }

    /// Checks the server URL and clamps the request timeout to
    /// [`MIN_REQUEST_TIMEOUT`]..=[`MAX_REQUEST_TIMEOUT`].
    pub fn validated(mut self) -> SyncResult<Self> {
        if self.server_url.trim().is_empty() {
            return Err(SyncError::config("server_url is empty"));
        }
        let clamped = self
            .request_timeout
            .clamp(MIN_REQUEST_TIMEOUT, MAX_REQUEST_TIMEOUT);
        if clamped != self.request_timeout {
            tracing::debug!(
                requested = ?self.request_timeout,
                used = ?clamped,
                "request timeout clamped"
            );
            self.request_timeout = clamped;
        }
        if self.connect_timeout > self.request_timeout {
            self.connect_timeout = self.request_timeout;
        }
        Ok(self)
    }

    /// The HTTP client settings.
    pub fn remote_config(&self) -> RemoteConfig {
        let config = RemoteConfig::new(self.server_url.clone())
            .with_request_timeout(self.request_timeout)
            .with_connect_timeout(self.connect_timeout);
        match &self.user_agent {
            Some(user_agent) => config.with_user_agent(user_agent.clone()),
            None => config,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new("http://localhost:8080/api")
    }
}

mod secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn sync_config_builder() {
        let month = MonthFilter::new(2025, 3).unwrap();
        let config = SyncConfig::new("https://budget.example.com/api")
            .with_request_timeout(Duration::from_secs(20))
            .with_user_agent("tests")
            .with_default_scope(month);

        assert_eq!(config.server_url, "https://budget.example.com/api");
        assert_eq!(config.request_timeout, Duration::from_secs(20));
        assert_eq!(config.default_scope, Some(month));

        let remote = config.remote_config();
        assert_eq!(remote.user_agent, "tests");
        assert_eq!(remote.request_timeout, Duration::from_secs(20));
    }

    #[test]
    fn validated_clamps_request_timeout() {
        let short = SyncConfig::default()
            .with_request_timeout(Duration::from_secs(1))
            .validated()
            .unwrap();
        assert_eq!(short.request_timeout, MIN_REQUEST_TIMEOUT);

        let long = SyncConfig::default()
            .with_request_timeout(Duration::from_secs(120))
            .validated()
            .unwrap();
        assert_eq!(long.request_timeout, MAX_REQUEST_TIMEOUT);
    }

    #[test]
    fn validated_rejects_missing_server() {
        let result = SyncConfig::new("  ").validated();
        assert!(matches!(result, Err(SyncError::Config(_))));
    }

    #[test]
    fn loads_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"server_url": "http://10.0.2.2:8080/api", "request_timeout_secs": 8, "default_scope": "2025-02"}}"#
        )
        .unwrap();

        let config = SyncConfig::from_json_file(file.path()).unwrap();

        assert_eq!(config.server_url, "http://10.0.2.2:8080/api");
        assert_eq!(config.request_timeout, Duration::from_secs(8));
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.default_scope, Some(MonthFilter::new(2025, 2).unwrap()));
    }

    #[test]
    fn malformed_json_is_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(matches!(
            SyncConfig::from_json_file(file.path()),
            Err(SyncError::Json(_))
        ));
        assert!(matches!(
            SyncConfig::from_json_file("/definitely/not/here.json"),
            Err(SyncError::Io(_))
        ));
    }
}
