use std::time::Duration;

use outlooksync_domain::{Result, SyncError};
use reqwest::{Client as ReqwestClient, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::errors::InfraError;

const DEFAULT_USER_AGENT: &str = concat!("outlook-sync/", env!("CARGO_PKG_VERSION"));

/// HTTP client with a fixed timeout and error mapping into [`SyncError`].
///
/// Requests are never retried: a failed Graph query ends the run.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Convenience constructor with default configuration.
    ///
    /// # Errors
    /// Returns `SyncError::RemoteQuery` if the TLS backend cannot be set up.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    pub fn get(&self, url: &str) -> RequestBuilder {
        self.client.get(url)
    }

    pub fn post(&self, url: &str) -> RequestBuilder {
        self.client.post(url)
    }

    /// Execute a request, mapping transport failures only.
    ///
    /// The status code is left for the caller to inspect.
    ///
    /// # Errors
    /// Returns `SyncError::RemoteQuery` on connection failures and timeouts.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let request = builder.build().map_err(|err| SyncError::from(InfraError::from(err)))?;
        let method = request.method().clone();
        let url = request.url().clone();
        debug!(%method, url = %redact_query(&url), "sending HTTP request");

        match self.client.execute(request).await {
            Ok(response) => {
                debug!(%method, status = %response.status(), "received HTTP response");
                Ok(response)
            }
            Err(err) => {
                debug!(%method, error = %err, "HTTP request failed");
                Err(InfraError::from(err).into())
            }
        }
    }

    /// Execute a request and decode a successful JSON body.
    ///
    /// # Errors
    /// - `SyncError::Auth` for 401 and 403 responses
    /// - `SyncError::RemoteQuery` for other error statuses, transport failures
    ///   and undecodable bodies
    pub async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = self.send(builder).await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }

        response.json::<T>().await.map_err(|err| InfraError::from(err).into())
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    user_agent: String,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self { timeout: Duration::from_secs(30), user_agent: DEFAULT_USER_AGENT.to_string() }
    }
}

impl HttpClientBuilder {
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// # Errors
    /// Returns `SyncError::RemoteQuery` if the TLS backend cannot be set up.
    pub fn build(self) -> Result<HttpClient> {
        let client = ReqwestClient::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent)
            .no_proxy()
            .build()
            .map_err(|err| SyncError::from(InfraError::from(err)))?;

        Ok(HttpClient { client })
    }
}

/// Graph wraps failures as `{"error": {"code", "message"}}`.
#[derive(Debug, Deserialize)]
struct GraphErrorEnvelope {
    error: GraphErrorBody,
}

#[derive(Debug, Deserialize)]
struct GraphErrorBody {
    code: String,
    #[serde(default)]
    message: String,
}

fn status_error(status: StatusCode, body: &str) -> SyncError {
    let detail = match serde_json::from_str::<GraphErrorEnvelope>(body) {
        Ok(envelope) => format!("{}: {}", envelope.error.code, envelope.error.message),
        Err(_) => status.canonical_reason().unwrap_or("unknown status").to_string(),
    };
    let message = format!("HTTP {} ({detail})", status.as_u16());

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => SyncError::Auth(message),
        _ => SyncError::RemoteQuery(message),
    }
}

/// Next links carry opaque skip tokens; keep them out of the logs.
fn redact_query(url: &reqwest::Url) -> String {
    let mut shown = url.clone();
    shown.set_query(None);
    shown.to_string()
}
