//! REST client for the vendor Dashboard API
//!
//! The client turns a method, an endpoint and an optional JSON payload into a
//! [`HttpRequest`], sends it through a [`Transport`] and classifies what comes
//! back:
//!
//! | Outcome | Result |
//! |---|---|
//! | 2xx with a body | `Ok(ApiResponse::Json(..))` |
//! | 2xx with an empty body | `Ok(ApiResponse::NoContent)` |
//! | 2xx with an undecodable body | `Err(RequestException)` |
//! | non-2xx | `Err(HTTPError)` with status and raw body |
//! | transport failure | `Err(ConnectionError / TimeoutError / RequestException)` |
//!
//! Every failure is terminal for the call: no retries, no backoff.

use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::error::{ApiError, ApiResult};
use crate::scope::{Credential, ScopeState};
use crate::traits::{HttpMethod, HttpRequest, Transport, TransportError};
use crate::utils::truncate_for_log;

/// Path of the Local DNS sub-API below an organization
pub const LOCAL_DNS_PATH: &str = "appliance/dns/local";

/// A successful response
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    /// Parsed JSON body
    Json(Value),
    /// 2xx with an empty body
    NoContent,
}

impl ApiResponse {
    /// The JSON body, if any
    pub fn into_json(self) -> Option<Value> {
        match self {
            ApiResponse::Json(value) => Some(value),
            ApiResponse::NoContent => None,
        }
    }

    /// Whether the response had no body
    pub fn is_no_content(&self) -> bool {
        matches!(self, ApiResponse::NoContent)
    }
}

/// Authenticated client for the Dashboard and Local DNS endpoints
#[derive(Clone)]
pub struct RestClient {
    transport: Arc<dyn Transport>,
    base_url: String,
}

impl std::fmt::Debug for RestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestClient")
            .field("transport", &self.transport.transport_name())
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl RestClient {
    /// Create a client for `base_url` (e.g. `https://api.meraki.com/api/v1`)
    pub fn new(transport: Arc<dyn Transport>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            transport,
            base_url,
        }
    }

    /// Base URL without trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Name of the underlying transport
    pub fn transport_name(&self) -> &'static str {
        self.transport.transport_name()
    }

    /// Standard headers for an authenticated JSON request
    pub fn headers(credential: Option<&Credential>) -> BTreeMap<String, String> {
        let mut headers = BTreeMap::new();
        if let Some(credential) = credential {
            headers.insert(
                "Authorization".to_string(),
                format!("Bearer {}", credential.expose()),
            );
        }
        headers.insert("Accept".to_string(), "application/json".to_string());
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        headers
    }

    /// URL of a Local DNS endpoint for an organization
    pub fn local_dns_url(&self, organization_id: &str, endpoint: &str) -> String {
        format!(
            "{}/organizations/{}/{}/{}",
            self.base_url,
            organization_id,
            LOCAL_DNS_PATH,
            endpoint.trim_start_matches('/')
        )
    }

    /// URL of a Dashboard endpoint outside the Local DNS path
    pub fn dashboard_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Call a Local DNS endpoint of the selected organization
    ///
    /// Fails with `NoOrganizationSelected` before touching the network when
    /// the scope has no organization.
    pub async fn request(
        &self,
        scope: &ScopeState,
        method: HttpMethod,
        endpoint: &str,
        payload: Option<&Value>,
    ) -> ApiResult<ApiResponse> {
        let Some(organization_id) = scope.organization_id() else {
            tracing::warn!(
                "Attempted to make API request '{} {}' without a selected organization id.",
                method,
                endpoint
            );
            return Err(ApiError::no_organization());
        };

        let url = self.local_dns_url(organization_id, endpoint);
        self.send(method, &url, Self::headers(scope.api_key()), payload)
            .await
    }

    /// Call a Dashboard endpoint such as `organizations`
    ///
    /// Requires a credential; without one the dashboard client does not exist
    /// and the call fails with `DashboardAPIError`.
    pub async fn dashboard_request(
        &self,
        scope: &ScopeState,
        method: HttpMethod,
        path: &str,
    ) -> ApiResult<ApiResponse> {
        let Some(credential) = scope.api_key() else {
            error!("Cannot use the Dashboard API: API key is not set.");
            return Err(ApiError::dashboard_unavailable());
        };

        let url = self.dashboard_url(path);
        self.send(method, &url, Self::headers(Some(credential)), None)
            .await
    }

    /// Send a request and classify the outcome
    pub async fn send(
        &self,
        method: HttpMethod,
        url: &str,
        headers: BTreeMap<String, String>,
        payload: Option<&Value>,
    ) -> ApiResult<ApiResponse> {
        let body = match payload.map(serde_json::to_string).transpose() {
            Ok(body) => body,
            Err(e) => {
                error!("Failed to serialize payload for {} {}: {}", method, url, e);
                return Err(ApiError::unexpected(e.to_string()));
            }
        };

        info!("Making {} request to {}", method, url);
        if let Some(ref body) = body {
            debug!("Request payload: {}", truncate_for_log(body));
        }

        let request = HttpRequest::new(method, url)
            .with_headers(headers)
            .with_body(body);

        let response = match self.transport.execute(request).await {
            Ok(response) => response,
            Err(TransportError::Connection(detail)) => {
                error!("Connection error occurred during {} {}: {}", method, url, detail);
                return Err(ApiError::connection(detail));
            }
            Err(TransportError::Timeout(detail)) => {
                error!("Timeout error occurred during {} {}: {}", method, url, detail);
                return Err(ApiError::timeout(detail));
            }
            Err(TransportError::Request(detail)) => {
                error!("A general request error occurred during {} {}: {}", method, url, detail);
                return Err(ApiError::request(detail));
            }
        };

        if !response.is_success() {
            error!(
                "HTTP error occurred during {} {}. Status Code: {}, Response: {}",
                method,
                url,
                response.status,
                truncate_for_log(&response.body)
            );
            return Err(ApiError::http(response.status, response.body));
        }

        if response.body.trim().is_empty() {
            info!("API Response ({}): No content", response.status);
            return Ok(ApiResponse::NoContent);
        }

        match serde_json::from_str::<Value>(&response.body) {
            Ok(json) => {
                debug!(
                    "API Response ({}): {}",
                    response.status,
                    truncate_for_log(&response.body)
                );
                Ok(ApiResponse::Json(json))
            }
            Err(e) => {
                error!(
                    "Failed to decode {} response from {} {}: {}",
                    response.status, method, url, e
                );
                Err(ApiError::request(e.to_string()))
            }
        }
    }
}
