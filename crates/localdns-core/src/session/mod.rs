//! API session
//!
//! [`ApiSession`] is the single per-session object that owns:
//! - the [`ScopeState`] (API key → organization → network),
//! - the [`ListingCache`] for organization and network listings,
//! - the [`RestClient`] used for every call.
//!
//! Concurrent sessions use separate instances; nothing here is process-global.
//!
//! ## Example
//!
//! ```rust,ignore
//! use localdns_core::{ApiSession, SessionConfig, RequiredParameters, SetupParameters};
//!
//! let mut session = ApiSession::new(SessionConfig::default(), transport, None)?;
//! let ok = session.setup_application_parameters(
//!     RequiredParameters::organization(),
//!     Some(&SetupParameters::new().with_organization("123456", None)),
//!     Some(true),
//! );
//! let profiles = session.local_dns().list_profiles(false).await?;
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::cache::ListingCache;
use crate::client::{ApiResponse, RestClient};
use crate::config::{RequiredParameters, SessionConfig, SetupParameters};
use crate::error::{ApiError, ApiResult, ErrorKind, Result};
use crate::local_dns::LocalDns;
use crate::scope::ScopeState;
use crate::traits::{HttpMethod, Transport};
use crate::types::{FromVendor, Network, Organization, ParameterEntry, ParameterStatus};

/// Per-session API wrapper
#[derive(Debug)]
pub struct ApiSession {
    config: SessionConfig,
    scope: ScopeState,
    cache: ListingCache,
    client: RestClient,
    enable_caching: bool,
}

impl ApiSession {
    /// Create a session
    ///
    /// `initial_api_key` is applied like [`ApiSession::set_api_key`], so an
    /// absent key falls back to the configured environment variable.
    pub fn new(
        config: SessionConfig,
        transport: Arc<dyn Transport>,
        initial_api_key: Option<&str>,
    ) -> Result<Self> {
        config.validate()?;

        let client = RestClient::new(transport, config.base_url());
        let mut session = Self {
            scope: ScopeState::new(config.api_key_env.clone()),
            cache: ListingCache::new(),
            client,
            enable_caching: config.enable_caching,
            config,
        };
        session.set_api_key(initial_api_key, "initialization");
        Ok(session)
    }

    /// Session configuration
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Current scope
    pub fn scope(&self) -> &ScopeState {
        &self.scope
    }

    /// REST client bound to this session's transport
    pub fn client(&self) -> &RestClient {
        &self.client
    }

    /// Listing cache
    pub fn cache(&self) -> &ListingCache {
        &self.cache
    }

    /// Whether listing caches are consulted and filled
    pub fn caching_enabled(&self) -> bool {
        self.enable_caching
    }

    /// Enable or disable listing caches
    pub fn set_caching(&mut self, enable_caching: bool) {
        self.enable_caching = enable_caching;
    }

    /// Set the API key (argument first, then environment)
    ///
    /// When a key ends up set, subsequent requests carry
    /// `Authorization: Bearer <key>`; when it does not, Dashboard calls fail
    /// with `DashboardAPIError` until a key is provided.
    pub fn set_api_key(&mut self, api_key: Option<&str>, source: &str) -> bool {
        let is_set = self.scope.set_api_key(api_key, source);
        if is_set {
            debug!(
                "API key updated. Dashboard client ready via {} transport.",
                self.client.transport_name()
            );
        } else {
            warn!("API key is currently not set. Dashboard client not initialized.");
        }
        is_set
    }

    /// Whether an API key is set
    pub fn is_api_key_set(&self) -> bool {
        self.scope.is_api_key_set()
    }

    /// Select an organization (empty ids are ignored)
    pub fn set_organization(&mut self, organization_id: &str, organization_name: Option<&str>) {
        self.scope.set_organization(organization_id, organization_name);
    }

    /// Select a network (empty ids are ignored)
    pub fn set_network(&mut self, network_id: &str, network_name: Option<&str>) {
        self.scope.set_network(network_id, network_name);
    }

    /// Check that requirements follow API key → organization → network
    pub fn check_required_parameter_order(required: &RequiredParameters) -> bool {
        ScopeState::check_required_parameter_order(required)
    }

    /// Configure the scope from requirements and supplied values
    ///
    /// Only required fields are set. Returns `false` as soon as the ordering
    /// is invalid or a required field cannot be set; fields set before the
    /// failure are kept.
    pub fn setup_application_parameters(
        &mut self,
        required: RequiredParameters,
        supplied: Option<&SetupParameters>,
        enable_caching: Option<bool>,
    ) -> bool {
        info!("Attempting to set up application parameters.");

        if let Some(enable_caching) = enable_caching {
            self.enable_caching = enable_caching;
        }
        info!("Application caching enabled: {}", self.enable_caching);

        if !ScopeState::check_required_parameter_order(&required) {
            return false;
        }
        self.scope.set_required(required);

        let empty = SetupParameters::default();
        let supplied = supplied.unwrap_or(&empty);

        if required.api_key {
            self.set_api_key(supplied.api_key.as_deref(), "setup_parameters_or_env");
            if !self.is_api_key_set() {
                error!("Failed to set API key, which is required.");
                return false;
            }
        } else {
            debug!("API key is not required by setup parameters.");
        }

        if required.organization_id {
            if !self.is_api_key_set() {
                error!("Cannot set organization id: API key is not set, but is a prerequisite.");
                return false;
            }

            match supplied.organization_id.as_deref().filter(|id| !id.is_empty()) {
                Some(id) => self.set_organization(id, supplied.organization_name.as_deref()),
                None => {
                    error!("Organization id is required but not provided in setup parameters.");
                    return false;
                }
            }

            if !self.scope.is_organization_set() {
                error!("Failed to set organization id, which is required.");
                return false;
            }
        } else {
            debug!("Organization id is not required by setup parameters.");
        }

        if required.network_id {
            if !self.is_api_key_set() || !self.scope.is_organization_set() {
                error!(
                    "Cannot set network id: API key or organization id not set, but are prerequisites."
                );
                return false;
            }

            match supplied.network_id.as_deref().filter(|id| !id.is_empty()) {
                Some(id) => self.set_network(id, supplied.network_name.as_deref()),
                None => {
                    error!("Network id is required but not provided in setup parameters.");
                    return false;
                }
            }

            if !self.scope.is_network_set() {
                error!("Failed to set network id, which is required.");
                return false;
            }
        } else {
            debug!("Network id is not required by setup parameters.");
        }

        info!("Application parameter setup complete.");
        true
    }

    /// Compare the recorded requirements against the current scope
    pub fn check_current_parameters_status(&self) -> ParameterStatus {
        self.scope.parameter_status()
    }

    /// Displayable values of the required scope fields (key masked)
    pub fn current_app_params(&self) -> BTreeMap<String, ParameterEntry> {
        self.scope.current_parameters()
    }

    /// Fetch the organizations visible to the API key
    ///
    /// With `use_cache` and caching enabled, a cached listing is returned
    /// verbatim. Fresh fetches are stored when caching is enabled; a failed
    /// fetch stores a negative entry that later cached reads serve as an
    /// empty list.
    pub async fn get_organizations(&self, use_cache: bool) -> ApiResult<Vec<Organization>> {
        if use_cache && self.enable_caching {
            if let Some(cached) = self.cache.organizations().await {
                if cached.is_negative() {
                    warn!("Serving empty organization list from a failed earlier fetch.");
                } else {
                    info!("Using cached organizations data.");
                }
                return Ok(cached.items());
            }
        }

        let fetched = self
            .client
            .dashboard_request(&self.scope, HttpMethod::Get, "organizations")
            .await
            .and_then(decode_list::<Organization>);

        match fetched {
            Ok(organizations) => {
                if self.enable_caching {
                    self.cache.store_organizations(organizations.clone()).await;
                    info!(
                        "Successfully fetched {} organizations and stored in cache.",
                        organizations.len()
                    );
                } else {
                    info!(
                        "Successfully fetched {} organizations (not cached).",
                        organizations.len()
                    );
                }
                Ok(organizations)
            }
            Err(e) => {
                error!("Error fetching organizations: {}", e);
                if self.enable_caching && e.kind != ErrorKind::DashboardApiError {
                    self.cache.store_organizations_failure(e.clone()).await;
                }
                Err(e)
            }
        }
    }

    /// Fetch the networks of an organization
    ///
    /// `organization_id` falls back to the selected organization; when neither
    /// is available the call fails with `NoOrganizationSelected`.
    pub async fn get_networks(
        &self,
        organization_id: Option<&str>,
        use_cache: bool,
    ) -> ApiResult<Vec<Network>> {
        let Some(organization_id) = organization_id
            .or(self.scope.organization_id())
            .filter(|id| !id.is_empty())
        else {
            warn!("Attempted to get networks without a selected organization id.");
            return Err(ApiError::no_organization());
        };

        if use_cache && self.enable_caching {
            if let Some(cached) = self.cache.networks(organization_id).await {
                if cached.is_negative() {
                    warn!(
                        "Serving empty network list for organization {} from a failed earlier fetch.",
                        organization_id
                    );
                } else {
                    info!("Using cached networks data for organization {}.", organization_id);
                }
                return Ok(cached.items());
            }
        }

        let path = format!("organizations/{}/networks", organization_id);
        let fetched = self
            .client
            .dashboard_request(&self.scope, HttpMethod::Get, &path)
            .await
            .and_then(decode_list::<Network>);

        match fetched {
            Ok(networks) => {
                if self.enable_caching {
                    self.cache
                        .store_networks(organization_id, networks.clone())
                        .await;
                    info!(
                        "Successfully fetched {} networks for organization {} and stored in cache.",
                        networks.len(),
                        organization_id
                    );
                } else {
                    info!(
                        "Successfully fetched {} networks for organization {} (not cached).",
                        networks.len(),
                        organization_id
                    );
                }
                Ok(networks)
            }
            Err(e) => {
                error!(
                    "Error fetching networks for organization {}: {}",
                    organization_id, e
                );
                if self.enable_caching && e.kind != ErrorKind::DashboardApiError {
                    self.cache
                        .store_networks_failure(organization_id, e.clone())
                        .await;
                }
                Err(e)
            }
        }
    }

    /// Organizations formatted for display
    pub async fn list_organizations(&self, use_cache: bool) -> ApiResult<Vec<Organization>> {
        info!("Attempting to list organizations.");
        let organizations = self.get_organizations(use_cache).await?;
        if organizations.is_empty() {
            info!("No organizations found or response was empty.");
        } else {
            info!(
                "Successfully formatted {} organizations for display.",
                organizations.len()
            );
        }
        Ok(organizations)
    }

    /// Networks of the given (or selected) organization formatted for display
    pub async fn list_networks(
        &self,
        organization_id: Option<&str>,
        use_cache: bool,
    ) -> ApiResult<Vec<Network>> {
        info!(
            "Attempting to list networks for organization id: {}",
            organization_id
                .or(self.scope.organization_id())
                .unwrap_or("<none>")
        );
        let networks = self.get_networks(organization_id, use_cache).await?;
        if networks.is_empty() {
            info!("No networks found for the selected organization.");
        } else {
            info!("Successfully formatted {} networks for display.", networks.len());
        }
        Ok(networks)
    }

    /// Local DNS operations bound to this session
    pub fn local_dns(&self) -> LocalDns<'_> {
        LocalDns::new(self)
    }
}

/// Decode a JSON array response; no content decodes as an empty list
fn decode_list<T: FromVendor>(response: ApiResponse) -> ApiResult<Vec<T>> {
    match response {
        ApiResponse::NoContent => Ok(Vec::new()),
        ApiResponse::Json(value) => serde_json::from_value::<Vec<T::Wire>>(value)
            .map(|wires| wires.into_iter().map(T::from_vendor).collect())
            .map_err(|e| {
                error!("Unexpected response shape: {}", e);
                ApiError::unexpected(format!("Unexpected response shape: {}", e))
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{HttpRequest, HttpResponse, TransportError};
    use async_trait::async_trait;

    struct NullTransport;

    #[async_trait]
    impl Transport for NullTransport {
        async fn execute(&self, _request: HttpRequest) -> std::result::Result<HttpResponse, TransportError> {
            Ok(HttpResponse::new(200, "[]"))
        }

        fn transport_name(&self) -> &'static str {
            "null"
        }
    }

    fn config() -> SessionConfig {
        SessionConfig::default().with_api_key_env("LOCALDNS_SESSION_TEST_UNSET_KEY")
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut bad = config();
        bad.http_timeout_secs = 0;
        assert!(ApiSession::new(bad, Arc::new(NullTransport), None).is_err());
    }

    #[test]
    fn initial_key_is_applied() {
        let session = ApiSession::new(config(), Arc::new(NullTransport), Some("k-1")).unwrap();
        assert!(session.is_api_key_set());

        let session = ApiSession::new(config(), Arc::new(NullTransport), None).unwrap();
        assert!(!session.is_api_key_set());
    }

    #[test]
    fn setup_overrides_caching_even_when_order_is_invalid() {
        let mut session = ApiSession::new(config(), Arc::new(NullTransport), None).unwrap();
        let invalid = RequiredParameters {
            api_key: false,
            organization_id: true,
            network_id: false,
        };

        assert!(!session.setup_application_parameters(invalid, None, Some(true)));
        assert!(session.caching_enabled());
        assert!(session.scope().required().is_none());
    }

    #[test]
    fn setup_sets_only_required_fields() {
        let mut session = ApiSession::new(config(), Arc::new(NullTransport), None).unwrap();
        let supplied = SetupParameters::new()
            .with_api_key("key-5678")
            .with_organization("o1", Some("Acme".to_string()))
            .with_network("n1", Some("Branch".to_string()));

        assert!(session.setup_application_parameters(
            RequiredParameters::organization(),
            Some(&supplied),
            None
        ));
        assert_eq!(session.scope().organization_id(), Some("o1"));
        assert!(!session.scope().is_network_set());
        assert!(session.check_current_parameters_status().all_set);
    }

    #[test]
    fn decode_list_handles_no_content() {
        let networks: Vec<Network> = decode_list(ApiResponse::NoContent).unwrap();
        assert!(networks.is_empty());

        let err = decode_list::<Network>(ApiResponse::Json(serde_json::json!({"not": "a list"})))
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnexpectedError);
    }
}
