//! HTTP client for the REST API.
//!
//! One `reqwest::Client` is shared by every entity type; requests carry no
//! per-call state, so a single `HttpRemote` can back both repositories.

use crate::api::RemoteApi;
use crate::error::{RemoteError, RemoteResult};
use async_trait::async_trait;
use pocketsync_model::{Entity, MonthFilter};
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// Default bound on a whole request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Default bound on establishing a connection.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Connection settings for [`HttpRemote`].
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Base URL of the API, e.g. `http://localhost:8080/api`.
    pub base_url: String,
    /// Bound on a whole request, connect included.
    pub request_timeout: Duration,
    /// Bound on establishing a connection.
    pub connect_timeout: Duration,
    /// `User-Agent` header value.
    pub user_agent: String,
}

impl RemoteConfig {
    /// Creates a configuration with default timeouts.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            user_agent: concat!("pocketsync/", env!("CARGO_PKG_VERSION")).to_string(),
        }
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
        self.user_agent = user_agent.into();
        self
    }
}

#[derive(Serialize)]
struct DeleteBatchBody<'a> {
    ids: &'a [String],
}

/// JSON-over-HTTP implementation of [`RemoteApi`].
#[derive(Debug, Clone)]
pub struct HttpRemote {
    base_url: Url,
    client: Client,
}

impl HttpRemote {
    /// Builds the client.
    pub fn new(config: &RemoteConfig) -> RemoteResult<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| RemoteError::Url(format!("{}: {e}", config.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(RemoteError::Url(config.base_url.clone()));
        }

        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        Ok(Self { base_url, client })
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> RemoteResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| RemoteError::Url(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn execute(&self, request: RequestBuilder) -> RemoteResult<Response> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        tracing::debug!(status = status.as_u16(), %body, "request rejected");
        Err(RemoteError::status(status.as_u16(), body))
    }

    async fn execute_json<R: DeserializeOwned>(&self, request: RequestBuilder) -> RemoteResult<R> {
        let body = self.execute(request).await?.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| RemoteError::Decode(e.to_string()))
    }
}

#[async_trait]
impl<T: Entity> RemoteApi<T> for HttpRemote {
    async fn list(&self, scope: Option<&MonthFilter>) -> RemoteResult<Vec<T>> {
        let mut request = self.client.get(self.endpoint(&[T::COLLECTION])?);
        if let Some(month) = scope.filter(|_| T::SCOPED) {
            request = request.query(&[("month", month.to_string())]);
        }
        self.execute_json(request).await
    }

    async fn create(&self, entity: &T) -> RemoteResult<T> {
        let url = self.endpoint(&[T::COLLECTION])?;
        self.execute_json(self.client.post(url).json(entity)).await
    }

    async fn create_batch(&self, entities: &[T]) -> RemoteResult<Vec<T>> {
        let url = self.endpoint(&[T::COLLECTION, "batch"])?;
        self.execute_json(self.client.post(url).json(entities)).await
    }

    async fn update(&self, entity: &T) -> RemoteResult<T> {
        let url = self.endpoint(&[T::COLLECTION, entity.id()])?;
        self.execute_json(self.client.put(url).json(entity)).await
    }

    async fn delete(&self, id: &str) -> RemoteResult<()> {
        let url = self.endpoint(&[T::COLLECTION, id])?;
        self.execute(self.client.delete(url)).await.map(|_| ())
    }

    async fn delete_batch(&self, ids: &[String]) -> RemoteResult<()> {
        let url = self.endpoint(&[T::COLLECTION, "batchDelete"])?;
        let body = DeleteBatchBody { ids };
        self.execute(self.client.post(url).json(&body))
            .await
            .map(|_| ())
    }
}
