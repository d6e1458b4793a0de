// # Meraki Dashboard Transport
//
// This crate provides the production `Transport` for the Local DNS console,
// carrying requests to the Meraki Dashboard API v1 over `reqwest`.
//
// ## Architectural Constraints
//
// ### Trust Level: Untrusted (Transport)
//
// **Allowed Capabilities**:
// - ✅ Perform HTTP/HTTPS calls to the URL it is handed
// - ✅ Report the status and body of whatever comes back
//
// **Forbidden Capabilities**:
// - ❌ Retry, back off or rate-limit (every failure is terminal for the call)
// - ❌ Classify HTTP statuses (owned by `RestClient`)
// - ❌ Cache responses (owned by `ListingCache`)
// - ❌ Spawn tasks
//
// ## Security Requirements
//
// - The bearer token arrives inside request headers and NEVER appears in logs
// - Client construction failures are returned, never panicked on
//
// ## API Reference
//
// - Dashboard API v1: https://developer.cisco.com/meraki/api-v1/
// - Local DNS: `/organizations/{organizationId}/appliance/dns/local/...`

use async_trait::async_trait;
use localdns_core::traits::{HttpMethod, HttpRequest, HttpResponse, Transport, TransportError};
use localdns_core::{ApiSession, Error, Result, SessionConfig};
use std::sync::Arc;
use std::time::Duration;

/// Default HTTP timeout for API requests (30 seconds)
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!("localdns-console/", env!("CARGO_PKG_VERSION"));

/// Meraki Dashboard transport
///
/// # Trust Level: Untrusted
///
/// Stateless and single-shot: one `execute` is one HTTP request.
#[derive(Clone)]
pub struct MerakiTransport {
    /// HTTP client for API requests
    client: reqwest::Client,

    timeout: Duration,
}

// Custom Debug implementation; the client holds no secrets but stays opaque
impl std::fmt::Debug for MerakiTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MerakiTransport")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl MerakiTransport {
    /// Create a transport with the default timeout
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_HTTP_TIMEOUT)
    }

    /// Create a transport with a custom timeout
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::transport("meraki", format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, timeout })
    }

    /// Create a transport honoring `http_timeout_secs`
    pub fn from_config(config: &SessionConfig) -> Result<Self> {
        Self::with_timeout(Duration::from_secs(config.http_timeout_secs))
    }

    /// Configured request timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Build a session that talks to the Dashboard API through [`MerakiTransport`]
///
/// `api_key` falls back to the environment variable named in `config`.
pub fn connect(config: SessionConfig, api_key: Option<&str>) -> Result<ApiSession> {
    let transport = Arc::new(MerakiTransport::from_config(&config)?);
    ApiSession::new(config, transport, api_key)
}

fn reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Delete => reqwest::Method::DELETE,
    }
}

fn classify(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout(error.to_string())
    } else if error.is_connect() {
        TransportError::Connection(error.to_string())
    } else {
        TransportError::Request(error.to_string())
    }
}

#[async_trait]
impl Transport for MerakiTransport {
    async fn execute(&self, request: HttpRequest) -> std::result::Result<HttpResponse, TransportError> {
        tracing::debug!("Sending {} {}", request.method, request.url);

        let mut builder = self
            .client
            .request(reqwest_method(request.method), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(classify)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(classify)?;

        tracing::debug!("Received status {} ({} bytes)", status, body.len());
        Ok(HttpResponse::new(status, body))
    }

    fn transport_name(&self) -> &'static str {
        "meraki"
    }
}
