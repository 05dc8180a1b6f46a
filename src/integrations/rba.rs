//! Runbook automation (RBA) service integration.
//!
//! Provides the [`RunbookService`] abstraction used by the sync engine and
//! [`RbaClient`], its HTTP implementation against the RBA REST API.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::core::RemoteConfig;
use crate::runbook::Runbook;

/// Representation the service uses when listing runbooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Live entities with internal automation ids
    Standard,
    /// Export format with stable placeholder automation ids
    Export,
}

impl FetchMode {
    /// Value of the `exportFormat` query parameter.
    pub fn export_format(self) -> &'static str {
        match self {
            Self::Standard => "false",
            Self::Export => "keepId",
        }
    }
}

/// Result type for RBA operations.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Error types for RBA operations.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Authentication failed")]
    Unauthorized,
}

/// Operations the sync engine needs from the runbook service.
#[async_trait]
pub trait RunbookService: Send + Sync {
    /// List the latest version of every runbook.
    async fn list_runbooks(&self, mode: FetchMode) -> RemoteResult<Vec<Runbook>>;

    /// Fetch a single runbook in standard mode.
    async fn get_runbook(&self, id: &str) -> RemoteResult<Runbook>;

    /// Create runbooks in one batch, returning the service's report.
    async fn create_runbooks(
        &self,
        runbooks: &[Runbook],
        publish: bool,
        verbose: bool,
    ) -> RemoteResult<serde_json::Value>;

    /// Replace a runbook with the given content.
    async fn patch_runbook(&self, id: &str, runbook: &Runbook, publish: bool) -> RemoteResult<()>;
}

/// RBA REST API client.
#[derive(Debug, Clone)]
pub struct RbaClient {
    /// Base URL, e.g. `https://noi.example.com:443`
    base_url: String,
    /// API key user
    user: String,
    /// API key password
    password: String,
    /// HTTP client
    client: reqwest::Client,
}

impl RbaClient {
    /// Create a client from the remote configuration.
    pub fn new(config: &RemoteConfig) -> RemoteResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("rbsync/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            base_url: base_url(&config.host),
            user: config.user.clone(),
            password: config.password.clone(),
            client,
        })
    }

    /// Get the API URL for a path below the runbooks collection.
    fn api_url(&self, path: &str) -> String {
        format!("{}/api/v1/rba/runbooks{}", self.base_url, path)
    }

    /// Make an authenticated request.
    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .basic_auth(&self.user, Some(&self.password))
            .header("Accept", "application/json")
    }

    /// Send a request and turn non-success statuses into errors.
    async fn send(&self, request: reqwest::RequestBuilder) -> RemoteResult<reqwest::Response> {
        let response = request.send().await?;
        if response.status().is_success() {
            return Ok(response);
        }
        Err(self.parse_error(response).await)
    }

    /// Parse error response from the RBA API.
    async fn parse_error(&self, response: reqwest::Response) -> RemoteError {
        let status = response.status().as_u16();
        if status == 401 {
            return RemoteError::Unauthorized;
        }

        let message = response
            .text()
            .await
            .ok()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| format!("HTTP {}", status));
        RemoteError::Api { status, message }
    }

    async fn send_json<T: Serialize + ?Sized + Sync>(
        &self,
        method: reqwest::Method,
        url: &str,
        body: &T,
    ) -> RemoteResult<reqwest::Response> {
        self.send(self.request(method, url).json(body)).await
    }
}

#[async_trait]
impl RunbookService for RbaClient {
    async fn list_runbooks(&self, mode: FetchMode) -> RemoteResult<Vec<Runbook>> {
        let url =
            self.api_url(&format!("?version=latest&exportFormat={}", mode.export_format()));
        tracing::debug!(?mode, "Listing runbooks");

        let response = self.send(self.request(reqwest::Method::GET, &url)).await?;
        Ok(response.json().await?)
    }

    async fn get_runbook(&self, id: &str) -> RemoteResult<Runbook> {
        let url = self.api_url(&format!("/{}", urlencoding::encode(id)));
        tracing::debug!(runbook = id, "Fetching runbook");

        let response = self.send(self.request(reqwest::Method::GET, &url)).await?;
        let runbooks: Vec<Runbook> = response.json().await?;
        runbooks
            .into_iter()
            .next()
            .ok_or_else(|| RemoteError::NotFound(format!("Runbook {id}")))
    }

    async fn create_runbooks(
        &self,
        runbooks: &[Runbook],
        publish: bool,
        verbose: bool,
    ) -> RemoteResult<serde_json::Value> {
        let url = self.api_url(&format!("/import?publish={publish}&verbose={verbose}"));
        tracing::debug!(count = runbooks.len(), publish, "Creating runbooks");

        let response = self.send_json(reqwest::Method::POST, &url, runbooks).await?;
        let text = response.text().await?;
        Ok(serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text)))
    }

    async fn patch_runbook(&self, id: &str, runbook: &Runbook, publish: bool) -> RemoteResult<()> {
        let url = self.api_url(&format!("/{}?publish={publish}", urlencoding::encode(id)));
        tracing::debug!(runbook = id, publish, "Patching runbook");

        self.send_json(reqwest::Method::PATCH, &url, runbook).await?;
        Ok(())
    }
}

/// Build the base URL for a configured host.
///
/// A bare `host[:port]` is served over HTTPS; an explicit scheme is kept.
fn base_url(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{host}")
    }
}

/// Format a create report for display.
pub fn format_create_report(report: &serde_json::Value) -> String {
    match report {
        serde_json::Value::String(s) => s.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}
