//! Local DNS domain operations
//!
//! Thin compositions over [`RestClient::request`](crate::client::RestClient::request):
//! each operation issues one call (or, for the joined listings, one call per
//! collection) and reshapes the vendor payload into display records.
//!
//! Operations never mutate scope and never touch the listing cache except
//! through the network listing they join against. Nothing is re-read after a
//! mutation.

use serde_json::{Value, json};
use std::collections::HashMap;
use tracing::{debug, error, info};

use crate::client::ApiResponse;
use crate::error::{ApiError, ApiResult};
use crate::session::ApiSession;
use crate::traits::HttpMethod;
use crate::types::{
    AssignmentLink, DnsRecord, FromVendor, Items, NetworkAssignment, Profile, ProfileView, UNKNOWN,
};

const PROFILES: &str = "profiles";
const RECORDS: &str = "records";
const ASSIGNMENTS: &str = "profiles/assignments";
const ASSIGNMENTS_BULK_CREATE: &str = "profiles/assignments/bulkCreate";
const ASSIGNMENTS_BULK_DELETE: &str = "profiles/assignments/bulkDelete";

/// Local DNS operations bound to a session
#[derive(Debug, Clone, Copy)]
pub struct LocalDns<'a> {
    session: &'a ApiSession,
}

impl<'a> LocalDns<'a> {
    /// Bind to a session
    pub fn new(session: &'a ApiSession) -> Self {
        Self { session }
    }

    async fn call(
        &self,
        method: HttpMethod,
        endpoint: &str,
        payload: Option<&Value>,
    ) -> ApiResult<ApiResponse> {
        self.session
            .client()
            .request(self.session.scope(), method, endpoint, payload)
            .await
    }

    async fn fetch_profiles(&self) -> ApiResult<Vec<Profile>> {
        let response = self.call(HttpMethod::Get, PROFILES, None).await?;
        decode_items(response, "profiles")
    }

    async fn fetch_assignments(&self) -> ApiResult<Vec<AssignmentLink>> {
        let response = self.call(HttpMethod::Get, ASSIGNMENTS, None).await?;
        decode_items(response, "assignments")
    }

    async fn network_names(&self, use_cache: bool) -> ApiResult<HashMap<String, String>> {
        let networks = self.session.get_networks(None, use_cache).await?;
        let names: HashMap<String, String> = networks
            .into_iter()
            .map(|network| (network.id, network.name))
            .collect();
        debug!("Created network map with {} entries.", names.len());
        Ok(names)
    }

    /// List profiles with their assigned network
    ///
    /// Profiles without an assignment carry [`UNASSIGNED`](crate::UNASSIGNED)
    /// in both network fields; an assignment to a network missing from the
    /// listing resolves to [`UNKNOWN`]. When a profile has several
    /// assignments, the last one listed wins.
    pub async fn list_profiles(&self, use_cache: bool) -> ApiResult<Vec<ProfileView>> {
        info!("Attempting to list profiles with associated networks.");

        let profiles = self.fetch_profiles().await.inspect_err(|e| {
            error!("Error fetching profiles: {}", e.details);
        })?;
        if profiles.is_empty() {
            info!("No profiles found.");
            return Ok(Vec::new());
        }
        debug!("Fetched {} raw profiles.", profiles.len());

        let network_names = self.network_names(use_cache).await.inspect_err(|e| {
            error!("Error fetching networks for profiles: {}", e.details);
        })?;

        let assignments = self.fetch_assignments().await.inspect_err(|e| {
            error!("Error fetching network assignments for profiles: {}", e.details);
        })?;

        let mut assigned: HashMap<String, (String, String)> = HashMap::new();
        for link in assignments {
            if link.profile_id.is_empty() || link.network_id.is_empty() {
                continue;
            }
            let network_name = network_names
                .get(&link.network_id)
                .cloned()
                .unwrap_or_else(|| UNKNOWN.to_string());
            assigned.insert(link.profile_id, (link.network_id, network_name));
        }
        debug!("Mapped {} profiles to networks.", assigned.len());

        let views: Vec<ProfileView> = profiles
            .into_iter()
            .map(|profile| match assigned.remove(&profile.profile_id) {
                Some((network_id, network_name)) => ProfileView {
                    profile_id: profile.profile_id,
                    name: profile.name,
                    network_id,
                    network_name,
                },
                None => ProfileView::unassigned(profile),
            })
            .collect();

        info!("Successfully formatted {} profiles for display.", views.len());
        Ok(views)
    }

    /// Create a profile
    pub async fn create_profile(&self, name: &str) -> ApiResult<Profile> {
        info!("Attempting to create profile with name: '{}'", name);
        let payload = json!({ "name": name });

        let profile: Profile = self
            .call(HttpMethod::Post, PROFILES, Some(&payload))
            .await
            .and_then(|response| decode_created(response, "profile"))
            .inspect_err(|e| {
                error!("Failed to create profile '{}': {}", name, e.details);
            })?;

        info!(
            "Profile '{}' (ID: {}) created successfully.",
            profile.name, profile.profile_id
        );
        Ok(profile)
    }

    /// Delete a profile by id
    pub async fn delete_profile(&self, profile_id: &str) -> ApiResult<()> {
        info!("Attempting to delete profile with ID: '{}'", profile_id);
        self.call(HttpMethod::Delete, &format!("{}/{}", PROFILES, profile_id), None)
            .await
            .inspect_err(|e| {
                error!("Failed to delete profile '{}': {}", profile_id, e.details);
            })?;

        info!("Profile '{}' deleted successfully.", profile_id);
        Ok(())
    }

    /// List every DNS record of the selected organization
    pub async fn list_dns_records(&self) -> ApiResult<Vec<DnsRecord>> {
        info!("Attempting to list DNS records.");
        let response = self.call(HttpMethod::Get, RECORDS, None).await.inspect_err(|e| {
            error!("Error fetching DNS records: {}", e.details);
        })?;

        let records: Vec<DnsRecord> = decode_items(response, "records")?;
        if records.is_empty() {
            info!("No DNS records found or response was empty.");
        } else {
            info!("Successfully formatted {} DNS records for display.", records.len());
        }
        Ok(records)
    }

    /// Create a hostname → address record in a profile
    pub async fn create_dns_record(
        &self,
        profile_id: &str,
        hostname: &str,
        address: &str,
    ) -> ApiResult<DnsRecord> {
        info!(
            "Attempting to create DNS record: Hostname='{}', Address='{}', Profile ID='{}'",
            hostname, address, profile_id
        );
        let payload = json!({
            "hostname": hostname,
            "address": address,
            "profile": { "id": profile_id },
        });

        let record: DnsRecord = self
            .call(HttpMethod::Post, RECORDS, Some(&payload))
            .await
            .and_then(|response| decode_created(response, "DNS record"))
            .inspect_err(|e| {
                error!(
                    "Failed to create DNS record '{}' for profile '{}': {}",
                    hostname, profile_id, e.details
                );
            })?;

        info!(
            "DNS record '{}' (ID: {}) created successfully for profile '{}'.",
            hostname, record.record_id, profile_id
        );
        Ok(record)
    }

    /// Delete a DNS record by id
    pub async fn delete_dns_record(&self, record_id: &str) -> ApiResult<()> {
        info!("Attempting to delete DNS record with ID: '{}'", record_id);
        self.call(HttpMethod::Delete, &format!("{}/{}", RECORDS, record_id), None)
            .await
            .inspect_err(|e| {
                error!("Failed to delete DNS record '{}': {}", record_id, e.details);
            })?;

        info!("DNS record '{}' deleted successfully.", record_id);
        Ok(())
    }

    /// List assignments with network and profile names resolved
    ///
    /// Ids missing from the current listings resolve to [`UNKNOWN`].
    pub async fn list_network_assignments(
        &self,
        use_cache: bool,
    ) -> ApiResult<Vec<NetworkAssignment>> {
        info!("Attempting to list network assignments.");

        let network_names = self.network_names(use_cache).await.inspect_err(|e| {
            error!("Error fetching networks for assignments: {}", e.details);
        })?;

        let profile_names: HashMap<String, String> = self
            .fetch_profiles()
            .await
            .inspect_err(|e| {
                error!("Error fetching profiles for assignments: {}", e.details);
            })?
            .into_iter()
            .map(|profile| (profile.profile_id, profile.name))
            .collect();
        debug!("Created profile map with {} entries.", profile_names.len());

        let links = self.fetch_assignments().await.inspect_err(|e| {
            error!("Error fetching raw assignments: {}", e.details);
        })?;

        let resolve = |names: &HashMap<String, String>, id: &str| {
            names.get(id).cloned().unwrap_or_else(|| UNKNOWN.to_string())
        };

        let assignments: Vec<NetworkAssignment> = links
            .into_iter()
            .map(|link| NetworkAssignment {
                network_name: resolve(&network_names, &link.network_id),
                profile_name: resolve(&profile_names, &link.profile_id),
                assignment_id: link.assignment_id,
                network_id: link.network_id,
                profile_id: link.profile_id,
            })
            .collect();

        if assignments.is_empty() {
            info!("No network assignments found or response was empty.");
        } else {
            info!(
                "Successfully formatted {} network assignments for display.",
                assignments.len()
            );
        }
        Ok(assignments)
    }

    /// Assign a profile to a network
    ///
    /// Goes through the vendor bulk endpoint with a one-element list.
    pub async fn assign_profile_to_network(
        &self,
        network_id: &str,
        profile_id: &str,
    ) -> ApiResult<Vec<AssignmentLink>> {
        info!(
            "Attempting to assign profile '{}' to network '{}'.",
            profile_id, network_id
        );
        let payload = json!({
            "items": [
                { "network": { "id": network_id }, "profile": { "id": profile_id } }
            ]
        });

        let links: Vec<AssignmentLink> = self
            .call(HttpMethod::Post, ASSIGNMENTS_BULK_CREATE, Some(&payload))
            .await
            .and_then(|response| decode_items(response, "assignments"))
            .inspect_err(|e| {
                error!(
                    "Failed to assign profile '{}' to network '{}': {}",
                    profile_id, network_id, e.details
                );
            })?;

        info!(
            "Profile '{}' successfully assigned to network '{}'.",
            profile_id, network_id
        );
        Ok(links)
    }

    /// Remove an assignment by id
    pub async fn remove_network_assignment(&self, assignment_id: &str) -> ApiResult<()> {
        info!(
            "Attempting to remove network assignment with ID: '{}'",
            assignment_id
        );
        let payload = json!({ "items": [ { "assignmentId": assignment_id } ] });

        self.call(HttpMethod::Post, ASSIGNMENTS_BULK_DELETE, Some(&payload))
            .await
            .inspect_err(|e| {
                error!(
                    "Failed to remove network assignment '{}': {}",
                    assignment_id, e.details
                );
            })?;

        info!("Network assignment '{}' removed successfully.", assignment_id);
        Ok(())
    }
}

/// Decode an `{"items": [...]}` collection; no content or a missing key is empty
fn decode_items<T: FromVendor>(response: ApiResponse, what: &str) -> ApiResult<Vec<T>> {
    match response {
        ApiResponse::NoContent => Ok(Vec::new()),
        ApiResponse::Json(Value::Null) => Ok(Vec::new()),
        ApiResponse::Json(value) => serde_json::from_value::<Items<T::Wire>>(value)
            .map(|envelope| envelope.items.into_iter().map(T::from_vendor).collect())
            .map_err(|e| {
                error!("Malformed {} response: {}", what, e);
                ApiError::unexpected(format!("Malformed {} response: {}", what, e))
            }),
    }
}

/// Decode the entity echoed back by a create call
fn decode_created<T: FromVendor>(response: ApiResponse, what: &str) -> ApiResult<T> {
    match response {
        ApiResponse::NoContent => Err(ApiError::unexpected(format!(
            "Create {} returned no content",
            what
        ))),
        ApiResponse::Json(value) => serde_json::from_value::<T::Wire>(value)
            .map(T::from_vendor)
            .map_err(|e| ApiError::unexpected(format!("Malformed {} response: {}", what, e))),
    }
}
