//! Test doubles and common utilities for contract tests
//!
//! [`MockTransport`] stands in for the vendor API: responses are scripted per
//! method and URL suffix, every request is recorded, and calls are counted.
//! No test in this directory touches the network.

#![allow(dead_code)]

use localdns_core::traits::{HttpMethod, HttpRequest, HttpResponse, Transport, TransportError};
use localdns_core::{ApiSession, SessionConfig};
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Environment variable that no test sets
pub const UNSET_KEY_ENV: &str = "LOCALDNS_CONTRACT_TEST_UNSET_KEY";

/// API key used by scoped sessions
pub const TEST_API_KEY: &str = "test-api-key-0001";

pub const BASE_URL: &str = "https://api.test/api/v1";

type Outcome = Result<HttpResponse, TransportError>;

struct Route {
    method: HttpMethod,
    suffix: String,
    /// The last outcome repeats once the queue is down to one
    outcomes: VecDeque<Outcome>,
}

/// A scripted transport that records what it is asked
pub struct MockTransport {
    routes: Mutex<Vec<Route>>,
    requests: Mutex<Vec<HttpRequest>>,
    call_count: AtomicUsize,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            routes: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
            call_count: AtomicUsize::new(0),
        })
    }

    fn push(&self, method: HttpMethod, suffix: &str, outcome: Outcome, replace: bool) {
        let mut routes = self.routes.lock().unwrap();
        match routes
            .iter_mut()
            .find(|route| route.method == method && route.suffix == suffix)
        {
            Some(route) => {
                if replace {
                    route.outcomes.clear();
                }
                route.outcomes.push_back(outcome);
            }
            None => routes.push(Route {
                method,
                suffix: suffix.to_string(),
                outcomes: VecDeque::from([outcome]),
            }),
        }
    }

    /// Respond to `method` on URLs ending in `/<suffix>`, replacing earlier scripts
    pub fn respond(&self, method: HttpMethod, suffix: &str, status: u16, body: impl Into<String>) {
        self.push(
            method,
            suffix,
            Ok(HttpResponse::new(status, body.into())),
            true,
        );
    }

    /// Respond with a JSON body and status 200
    pub fn respond_json(&self, method: HttpMethod, suffix: &str, body: Value) {
        self.respond(method, suffix, 200, body.to_string());
    }

    /// Queue a further response after the ones already scripted
    pub fn then_respond(&self, method: HttpMethod, suffix: &str, status: u16, body: impl Into<String>) {
        self.push(
            method,
            suffix,
            Ok(HttpResponse::new(status, body.into())),
            false,
        );
    }

    /// Fail at the transport level
    pub fn fail(&self, method: HttpMethod, suffix: &str, error: TransportError) {
        self.push(method, suffix, Err(error), true);
    }

    /// Number of execute() calls
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Number of calls whose method and URL suffix match
    pub fn calls_to(&self, method: HttpMethod, suffix: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|request| request.method == method && matches_suffix(&request.url, suffix))
            .count()
    }

    /// Every recorded request, oldest first
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// The most recent request
    pub fn last_request(&self) -> Option<HttpRequest> {
        self.requests.lock().unwrap().last().cloned()
    }

    /// Parsed body of the most recent request
    pub fn last_body(&self) -> Option<Value> {
        self.last_request()
            .and_then(|request| request.body)
            .map(|body| serde_json::from_str(&body).unwrap())
    }
}

fn matches_suffix(url: &str, suffix: &str) -> bool {
    url.ends_with(&format!("/{}", suffix))
}

#[async_trait::async_trait]
impl Transport for MockTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        let mut routes = self.routes.lock().unwrap();
        let route = routes
            .iter_mut()
            .filter(|route| route.method == request.method && matches_suffix(&request.url, &route.suffix))
            .max_by_key(|route| route.suffix.len());

        match route {
            Some(route) if route.outcomes.len() > 1 => route.outcomes.pop_front().unwrap(),
            Some(route) => route.outcomes.front().cloned().unwrap(),
            None => Ok(HttpResponse::new(404, r#"{"errors":["Not found"]}"#)),
        }
    }

    fn transport_name(&self) -> &'static str {
        "mock"
    }
}

/// Session config that never picks up a real key from the environment
pub fn test_config(enable_caching: bool) -> SessionConfig {
    SessionConfig::default()
        .with_api_base_url(BASE_URL)
        .with_api_key_env(UNSET_KEY_ENV)
        .with_caching(enable_caching)
}

/// Session with no key and no organization
pub fn bare_session(transport: Arc<MockTransport>) -> ApiSession {
    ApiSession::new(test_config(false), transport, None).unwrap()
}

/// Session with a key and organization `o1` selected
pub fn scoped_session(transport: Arc<MockTransport>, enable_caching: bool) -> ApiSession {
    let mut session = ApiSession::new(test_config(enable_caching), transport, Some(TEST_API_KEY)).unwrap();
    session.set_organization("o1", Some("Acme"));
    session
}

pub fn organizations_body() -> Value {
    json!([
        {
            "id": "o1",
            "name": "Acme",
            "url": "https://dashboard.test/o/1",
            "api": {"enabled": true},
            "licensing": {"model": "co-term"}
        },
        {
            "id": "o2",
            "name": "Globex",
            "url": "https://dashboard.test/o/2"
        }
    ])
}

pub fn networks_body(networks: &[(&str, &str)]) -> Value {
    Value::Array(
        networks
            .iter()
            .map(|(id, name)| {
                json!({
                    "id": id,
                    "name": name,
                    "type": "appliance",
                    "timeZone": "Europe/Amsterdam",
                    "tags": ["branch"]
                })
            })
            .collect(),
    )
}

pub fn profiles_body(profiles: &[(&str, &str)]) -> Value {
    json!({
        "items": profiles
            .iter()
            .map(|(id, name)| json!({"profileId": id, "name": name}))
            .collect::<Vec<_>>()
    })
}

/// `(assignment id, network id, profile id)` triples
pub fn assignments_body(assignments: &[(&str, &str, &str)]) -> Value {
    json!({
        "items": assignments
            .iter()
            .map(|(assignment_id, network_id, profile_id)| json!({
                "assignmentId": assignment_id,
                "network": {"id": network_id},
                "profile": {"id": profile_id}
            }))
            .collect::<Vec<_>>()
    })
}
