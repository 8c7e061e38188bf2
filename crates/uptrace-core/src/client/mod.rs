//! HTTP transport for the Uptrace monitors API.
//!
//! Every request carries the project's bearer token. Transient failures
//! (connection errors, 5xx, 429) of GET, PUT and DELETE are retried with
//! exponential backoff by `reqwest-retry`; this layer is the only place
//! retries happen. POST is sent once.
//!
//! # Usage
//!
//! ```rust,no_run
//! use uptrace_core::client::{ClientConfig, UptraceClient};
//! use uptrace_core::transport::MonitorTransport;
//!
//! #[tokio::main]
//! async fn main() -> uptrace_core::Result<()> {
//!     let client = UptraceClient::new(ClientConfig::new("3255", "secret-token"))?;
//!     let monitors = client.list().await?;
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, Jitter, RetryTransientMiddleware};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::transport::MonitorTransport;
use crate::types::Monitor;

/// Default Uptrace API endpoint
pub const DEFAULT_BASE_URL: &str = "https://api2.uptrace.dev";

/// Bounded retry around the HTTP round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// No retries at all.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }
}

/// Connection settings for one Uptrace project.
#[derive(Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub project_id: String,
    pub token: String,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl ClientConfig {
    pub fn new(project_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            project_id: project_id.into(),
            token: token.into(),
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("project_id", &self.project_id)
            .field("token", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .finish()
    }
}

/// API client for the Uptrace monitors endpoints
#[derive(Clone)]
pub struct UptraceClient {
    /// Base URL without trailing slash
    base_url: String,
    project_id: String,
    token: String,
    /// Retries transient failures; used for idempotent methods
    client: ClientWithMiddleware,
    /// No retries; used for POST
    single_shot: ClientWithMiddleware,
}

impl UptraceClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        if config.project_id.trim().is_empty() {
            return Err(Error::Config("project id is empty".into()));
        }
        if config.token.trim().is_empty() {
            return Err(Error::Config("API token is empty".into()));
        }

        let base_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        let retry_policy = ExponentialBackoff::builder()
            .jitter(Jitter::Full)
            .retry_bounds(config.retry.initial_backoff, config.retry.max_backoff)
            .build_with_max_retries(config.retry.max_retries);

        let client = ClientBuilder::new(base_client.clone())
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();
        // POST creates a monitor; replaying it can create a duplicate.
        let single_shot = ClientBuilder::new(base_client).build();

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            project_id: config.project_id,
            token: config.token,
            client,
            single_shot,
        })
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    fn monitors_path(&self) -> String {
        format!("/internal/v1/projects/{}/monitors", self.project_id)
    }

    fn monitor_path(&self, id: u64) -> String {
        format!("{}/{}", self.monitors_path(), id)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // HTTP Helpers
    // ─────────────────────────────────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request(reqwest::Method::GET, path, Option::<&()>::None).await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        self.request(reqwest::Method::POST, path, Some(body)).await
    }

    async fn put<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        self.request(reqwest::Method::PUT, path, Some(body)).await
    }

    async fn request<T: DeserializeOwned, B: Serialize>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T> {
        let bytes = self.send(method, path, body).await?;
        serde_json::from_slice(&bytes).map_err(|e| Error::Decode(format!("{} {}: {}", path, e, preview(&bytes))))
    }

    async fn send<B: Serialize>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Vec<u8>> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Uptrace request: {} {}", method, url);

        let client = if method == reqwest::Method::POST {
            &self.single_shot
        } else {
            &self.client
        };
        let mut req = client.request(method, &url).bearer_auth(&self.token);
        if let Some(b) = body {
            req = req.json(b);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| Error::Transport(format!("HTTP request failed: {}", e)))?;

        let status = resp.status();
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| Error::Transport(format!("Failed to read response: {}", e)))?;
        debug!("Uptrace response: {} ({} bytes)", status, bytes.len());

        if status.is_success() {
            Ok(bytes.to_vec())
        } else if status == reqwest::StatusCode::NOT_FOUND {
            Err(Error::NotFound(path.to_string()))
        } else {
            Err(Error::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            })
        }
    }
}

#[async_trait]
impl MonitorTransport for UptraceClient {
    async fn fetch(&self, id: u64) -> Result<Option<Monitor>> {
        let result: Result<MonitorEnvelope> = self.get(&self.monitor_path(id)).await;
        match result {
            Ok(env) => Ok(Some(env.monitor)),
            Err(Error::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn create(&self, monitor: &Monitor) -> Result<(u64, Monitor)> {
        let created: MonitorIdEnvelope = self.post(&self.monitors_path(), monitor).await?;
        let id = created.monitor.id;
        // The create response only carries the id.
        match self.fetch(id).await {
            Ok(Some(stored)) => Ok((id, stored)),
            Ok(None) => Err(Error::Unconfirmed {
                id,
                reason: "monitor vanished right after it was created".into(),
            }),
            Err(e) => Err(Error::Unconfirmed {
                id,
                reason: e.to_string(),
            }),
        }
    }

    async fn update(&self, id: u64, monitor: &Monitor) -> Result<Monitor> {
        let _: MonitorIdEnvelope = self.put(&self.monitor_path(id), monitor).await?;
        self.fetch(id)
            .await?
            .ok_or_else(|| Error::NotFound(self.monitor_path(id)))
    }

    async fn delete(&self, id: u64) -> Result<()> {
        self.send(reqwest::Method::DELETE, &self.monitor_path(id), Option::<&()>::None)
            .await
            .map(|_| ())
    }

    async fn list(&self) -> Result<Vec<Monitor>> {
        let resp: MonitorList = self.get(&self.monitors_path()).await?;
        Ok(resp.monitors)
    }
}

fn preview(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    text.chars().take(200).collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Request/Response Types
// ─────────────────────────────────────────────────────────────────────────────

/// `{"monitor": {...}}`
#[derive(Debug, Deserialize)]
pub struct MonitorEnvelope {
    pub monitor: Monitor,
}

/// Create/update response
#[derive(Debug, Deserialize)]
pub struct MonitorIdEnvelope {
    pub monitor: MonitorRef,
}

#[derive(Debug, Deserialize)]
pub struct MonitorRef {
    #[serde(deserialize_with = "crate::types::de::id")]
    pub id: u64,
}

/// List response
#[derive(Debug, Deserialize)]
pub struct MonitorList {
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub monitors: Vec<Monitor>,
}
