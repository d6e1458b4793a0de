//! Minimal embedding example for localdns-core
//!
//! This example drives an `ApiSession` against an in-process Dashboard stand-in.
//! The session, its scope and the log poller are fully managed by the application.

#![allow(dead_code)]

use localdns_core::logging::{LogBuffer, LogPoller};
use localdns_core::traits::{HttpMethod, HttpRequest, HttpResponse, Transport, TransportError};
use localdns_core::{ApiSession, RequiredParameters, SessionConfig, SetupParameters};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_stream::StreamExt;
use tracing_subscriber::prelude::*;

const BASE_URL: &str = "https://dashboard.embedded/api/v1";
const ORG_ID: &str = "org-1";

/// In-memory Local DNS state
#[derive(Default)]
struct DashboardState {
    next_id: u64,
    profiles: BTreeMap<String, String>,
    records: BTreeMap<String, Value>,
    assignments: BTreeMap<String, (String, String)>,
}

impl DashboardState {
    fn allocate(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}{}", prefix, self.next_id)
    }
}

/// Custom transport answering like the Dashboard API
struct EmbeddedDashboard {
    state: Mutex<DashboardState>,
    calls: std::sync::atomic::AtomicUsize,
}

impl EmbeddedDashboard {
    fn new() -> Self {
        Self {
            state: Mutex::new(DashboardState::default()),
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }

    fn handle(&self, method: HttpMethod, path: &str, body: Value) -> (u16, Value) {
        let mut state = self.state.lock().unwrap();
        let local = format!("organizations/{}/appliance/dns/local/", ORG_ID);

        if method == HttpMethod::Get && path == "organizations" {
            return (200, json!([{"id": ORG_ID, "name": "Embedded Org", "url": "", "api": {"enabled": true}}]));
        }
        if method == HttpMethod::Get && path == format!("organizations/{}/networks", ORG_ID) {
            return (200, json!([{"id": "N_1", "name": "Branch"}, {"id": "N_2", "name": "Lab"}]));
        }
        let Some(endpoint) = path.strip_prefix(&local) else {
            return (404, json!({"errors": ["Not found"]}));
        };

        match (method, endpoint) {
            (HttpMethod::Get, "profiles") => {
                let items: Vec<Value> = state
                    .profiles
                    .iter()
                    .map(|(id, name)| json!({"profileId": id, "name": name}))
                    .collect();
                (200, json!({"items": items}))
            }
            (HttpMethod::Post, "profiles") => {
                let id = state.allocate("P_");
                let name = body["name"].as_str().unwrap_or_default().to_string();
                state.profiles.insert(id.clone(), name.clone());
                (201, json!({"profileId": id, "name": name}))
            }
            (HttpMethod::Get, "records") => {
                let items: Vec<Value> = state.records.values().cloned().collect();
                (200, json!({"items": items}))
            }
            (HttpMethod::Post, "records") => {
                let id = state.allocate("R_");
                let mut record = body;
                record["recordId"] = json!(id);
                state.records.insert(id, record.clone());
                (201, record)
            }
            (HttpMethod::Get, "profiles/assignments") => {
                let items: Vec<Value> = state
                    .assignments
                    .iter()
                    .map(|(id, (network, profile))| {
                        json!({"assignmentId": id, "network": {"id": network}, "profile": {"id": profile}})
                    })
                    .collect();
                (200, json!({"items": items}))
            }
            (HttpMethod::Post, "profiles/assignments/bulkCreate") => {
                let item = &body["items"][0];
                let network = item["network"]["id"].as_str().unwrap_or_default().to_string();
                let profile = item["profile"]["id"].as_str().unwrap_or_default().to_string();
                let id = state.allocate("A_");
                state.assignments.insert(id.clone(), (network.clone(), profile.clone()));
                (
                    201,
                    json!({"items": [{"assignmentId": id, "network": {"id": network}, "profile": {"id": profile}}]}),
                )
            }
            (HttpMethod::Post, "profiles/assignments/bulkDelete") => {
                if let Some(id) = body["items"][0]["assignmentId"].as_str() {
                    state.assignments.remove(id);
                }
                (200, Value::Null)
            }
            (HttpMethod::Delete, other) => {
                let removed = match other.split_once('/') {
                    Some(("profiles", id)) => state.profiles.remove(id).is_some(),
                    Some(("records", id)) => state.records.remove(id).is_some(),
                    _ => false,
                };
                if removed {
                    (204, Value::Null)
                } else {
                    (404, json!({"errors": ["Not found"]}))
                }
            }
            _ => (404, json!({"errors": ["Not found"]})),
        }
    }
}

#[async_trait::async_trait]
impl Transport for EmbeddedDashboard {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        let path = request
            .url
            .strip_prefix(BASE_URL)
            .unwrap_or(&request.url)
            .trim_start_matches('/')
            .to_string();
        let body = request
            .body
            .as_deref()
            .and_then(|text| serde_json::from_str(text).ok())
            .unwrap_or(Value::Null);

        let (status, reply) = self.handle(request.method, &path, body);
        let text = if reply.is_null() { String::new() } else { reply.to_string() };
        Ok(HttpResponse::new(status, text))
    }

    fn transport_name(&self) -> &'static str {
        "embedded"
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    println!("=== Embedded localdns-core Example ===\n");

    // Capture logs into a buffer instead of printing them directly
    let buffer = LogBuffer::new(200);
    tracing_subscriber::registry().with(buffer.layer()).init();

    // Spawn log watcher (optional)
    println!("1. Starting log watcher...");
    let mut watch = LogPoller::new(buffer.clone(), Duration::from_millis(50)).spawn();

    // Create session with a custom transport
    println!("2. Creating session...");
    let dashboard = Arc::new(EmbeddedDashboard::new());
    let config = SessionConfig::default()
        .with_api_base_url(BASE_URL)
        .with_api_key_env("EMBEDDED_UNUSED_KEY_ENV")
        .with_caching(true);
    let mut session = ApiSession::new(config, dashboard.clone(), Some("embedded-key-0001"))?;

    let setup = SetupParameters::new().with_organization(ORG_ID, Some("Embedded Org".to_string()));
    if !session.setup_application_parameters(RequiredParameters::organization(), Some(&setup), None) {
        anyhow::bail!("scope setup failed: {:?}", session.check_current_parameters_status());
    }
    println!("   Parameters: {:?}", session.current_app_params());

    // Drive the Local DNS operations
    println!("\n3. Creating a profile, a record and an assignment...");
    let dns = session.local_dns();
    let profile = dns.create_profile("Branch printers").await?;
    let record = dns
        .create_dns_record(&profile.profile_id, "printer.branch.lan", "10.10.0.20")
        .await?;
    let links = dns.assign_profile_to_network("N_1", &profile.profile_id).await?;
    println!("   Created {:?}", profile);
    println!("   Created {:?}", record);

    println!("\n4. Listing joined views...");
    for view in dns.list_profiles(true).await? {
        println!("   [Profile] {} -> {}", view.name, view.network_name);
    }
    for assignment in dns.list_network_assignments(true).await? {
        println!(
            "   [Assignment] {} : {} -> {}",
            assignment.assignment_id, assignment.network_name, assignment.profile_name
        );
    }

    println!("\n5. Cleaning up...");
    for link in links {
        dns.remove_network_assignment(&link.assignment_id).await?;
    }
    dns.delete_dns_record(&record.record_id).await?;
    dns.delete_profile(&profile.profile_id).await?;

    // A second delete surfaces the vendor error unchanged
    if let Err(e) = dns.delete_profile(&profile.profile_id).await {
        println!("   Expected failure: {}", serde_json::to_string(&e)?);
    }
    println!("   Transport calls: {}", dashboard.call_count());

    // Drain captured logs, then stop the watcher
    println!("\n6. Captured log lines:");
    tokio::time::sleep(Duration::from_millis(100)).await;
    while let Ok(Some(entry)) = tokio::time::timeout(Duration::from_millis(100), watch.next()).await {
        println!("   [Log {}] {}", entry.sequence, entry.line);
    }
    watch.stop().await;

    println!("\n=== Embedding Successful ===");
    println!("Key Points:");
    println!("- Session lifecycle is fully controlled by application");
    println!("- No global session state");
    println!("- The transport is custom (not the Meraki default)");

    Ok(())
}
