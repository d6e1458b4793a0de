// # Transport Trait
//
// Defines the interface for sending a single HTTP request to the vendor API.
//
// ## Implementations
//
// - reqwest: `localdns-meraki` crate
// - Scripted in-memory transports in tests and demos
//
// ## Usage
//
// ```rust,ignore
// use localdns_core::traits::{HttpMethod, HttpRequest, Transport};
//
// let response = transport
//     .execute(HttpRequest::new(HttpMethod::Get, "https://api.meraki.com/api/v1/organizations"))
//     .await?;
// assert!(response.is_success());
// ```

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// HTTP methods used against the vendor API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Delete,
}

impl HttpMethod {
    /// Upper-case method name
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully built request
#[derive(Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    /// Serialized JSON body
    pub body: Option<String>,
}

impl HttpRequest {
    /// Create a request without headers or body
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: BTreeMap::new(),
            body: None,
        }
    }

    /// Replace the header set
    pub fn with_headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    /// Attach a serialized body
    pub fn with_body(mut self, body: Option<String>) -> Self {
        self.body = body;
        self
    }

    /// Look up a header by exact name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

// Custom Debug implementation that hides the Authorization header
impl fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let headers: BTreeMap<&str, &str> = self
            .headers
            .iter()
            .map(|(name, value)| {
                if name.eq_ignore_ascii_case("authorization") {
                    (name.as_str(), "<REDACTED>")
                } else {
                    (name.as_str(), value.as_str())
                }
            })
            .collect();

        f.debug_struct("HttpRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &headers)
            .field("body", &self.body)
            .finish()
    }
}

/// A received response, whatever its status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    /// Create a response
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Status is in the 2xx range
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failure to obtain any response at all
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// DNS failure, refused connection, TLS failure
    #[error("connection error: {0}")]
    Connection(String),

    /// The request did not complete in time
    #[error("timeout: {0}")]
    Timeout(String),

    /// Any other request-level failure
    #[error("request error: {0}")]
    Request(String),
}

/// Trait for transports that carry requests to the vendor API
///
/// # Trust Level: Untrusted
///
/// A transport is single-shot: one call, one request. Non-2xx statuses are
/// returned as [`HttpResponse`]s, never as errors; classification belongs to
/// [`RestClient`](crate::client::RestClient).
///
/// Transports must not retry, back off, cache, or log header values.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one request and return the response
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;

    /// Transport name (for logging)
    fn transport_name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_authorization() {
        let mut headers = BTreeMap::new();
        headers.insert("Authorization".to_string(), "Bearer secret_key_1234".to_string());
        headers.insert("Accept".to_string(), "application/json".to_string());

        let request = HttpRequest::new(HttpMethod::Get, "https://example.test").with_headers(headers);
        let debug_str = format!("{:?}", request);

        assert!(!debug_str.contains("secret_key_1234"));
        assert!(debug_str.contains("<REDACTED>"));
        assert!(debug_str.contains("application/json"));
    }

    #[test]
    fn success_range() {
        assert!(HttpResponse::new(200, "").is_success());
        assert!(HttpResponse::new(204, "").is_success());
        assert!(!HttpResponse::new(302, "").is_success());
        assert!(!HttpResponse::new(404, "").is_success());
    }
}
