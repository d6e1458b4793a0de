// # Credential & Scope State
//
// Holds the API key and the selected organization / network.
//
// ## Ordering
//
// Scope fields depend on each other: API key → organization → network.
// A configuration that requires a field must also require every field
// before it. Violations are logged and reported as `false`, never raised.
//
// ## Lifecycle
//
// Each field is either unset or set. Setters move unset → set or overwrite;
// there is no teardown short of building a new session. The only exception
// is the API key, which falls back to unset when neither an argument nor the
// environment provides one.
//
// ## Security
//
// The API key never appears in logs or `Debug` output.

use crate::config::RequiredParameters;
use crate::types::{ParameterEntry, ParameterStatus};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, error, info, warn};

/// Placeholder used when no requirement configuration has been recorded
pub const NO_REQUIRED_PARAMETERS: &str = "No required parameters defined";

/// Placeholder used when the recorded configuration violates the ordering
pub const INVALID_REQUIRED_PARAMETERS: &str =
    "Invalid required parameter configuration stored in session";

/// The vendor API key
///
/// Debug and Display never reveal the value.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a non-empty key
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.is_empty() { None } else { Some(Self(value)) }
    }

    /// Raw key for building the Authorization header
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Key with everything but the last four characters replaced by `*`
    pub fn masked(&self) -> String {
        let total = self.0.chars().count();
        let hidden = total.saturating_sub(4);
        let tail: String = self.0.chars().skip(hidden).collect();
        format!("{}{}", "*".repeat(hidden), tail)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<REDACTED>)")
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<REDACTED>")
    }
}

/// Credential, organization and network selection for one session
#[derive(Debug, Clone)]
pub struct ScopeState {
    api_key: Option<Credential>,
    api_key_env: String,
    organization_id: Option<String>,
    organization_name: Option<String>,
    network_id: Option<String>,
    network_name: Option<String>,
    required: Option<RequiredParameters>,
}

impl ScopeState {
    /// Create an empty scope that falls back to `api_key_env` for the key
    pub fn new(api_key_env: impl Into<String>) -> Self {
        Self {
            api_key: None,
            api_key_env: api_key_env.into(),
            organization_id: None,
            organization_name: None,
            network_id: None,
            network_name: None,
            required: None,
        }
    }

    /// Set the API key, falling back to the environment
    ///
    /// An empty or absent `api_key` consults the configured environment
    /// variable; if that is empty too the key becomes unset. `source` is only
    /// used for logging. Returns whether a key is set afterwards.
    pub fn set_api_key(&mut self, api_key: Option<&str>, source: &str) -> bool {
        if let Some(credential) = api_key.and_then(Credential::new) {
            self.api_key = Some(credential);
            info!("API key set from provided argument. Source: {}", source);
        } else if let Some(credential) = std::env::var(&self.api_key_env)
            .ok()
            .and_then(Credential::new)
        {
            self.api_key = Some(credential);
            info!("API key loaded from environment variable ({}).", self.api_key_env);
        } else {
            self.api_key = None;
            error!(
                "API key ({}) not found in environment variables or passed parameter.",
                self.api_key_env
            );
        }
        self.is_api_key_set()
    }

    /// The current key, if set
    pub fn api_key(&self) -> Option<&Credential> {
        self.api_key.as_ref()
    }

    /// Whether a non-empty key is set
    pub fn is_api_key_set(&self) -> bool {
        self.api_key.is_some()
    }

    /// Name of the environment variable used as key fallback
    pub fn api_key_env(&self) -> &str {
        &self.api_key_env
    }

    /// Select an organization; an empty id is logged and ignored
    pub fn set_organization(&mut self, organization_id: &str, organization_name: Option<&str>) {
        if organization_id.is_empty() {
            warn!("Attempted to set an empty organization id.");
            return;
        }

        self.organization_id = Some(organization_id.to_string());
        info!("Organization id set to: {}", organization_id);

        match organization_name.filter(|name| !name.is_empty()) {
            Some(name) => {
                self.organization_name = Some(name.to_string());
                info!("Organization name set to: {}", name);
            }
            None => debug!("Organization name not provided when setting id."),
        }
    }

    /// Selected organization id
    pub fn organization_id(&self) -> Option<&str> {
        self.organization_id.as_deref()
    }

    /// Selected organization name
    pub fn organization_name(&self) -> Option<&str> {
        self.organization_name.as_deref()
    }

    /// Whether an organization is selected
    pub fn is_organization_set(&self) -> bool {
        self.organization_id.is_some()
    }

    /// Select a network; an empty id is logged and ignored
    pub fn set_network(&mut self, network_id: &str, network_name: Option<&str>) {
        if network_id.is_empty() {
            warn!("Attempted to set an empty network id.");
            return;
        }

        self.network_id = Some(network_id.to_string());
        info!("Network id set to: {}", network_id);

        match network_name.filter(|name| !name.is_empty()) {
            Some(name) => {
                self.network_name = Some(name.to_string());
                info!("Network name set to: {}", name);
            }
            None => debug!("Network name not provided when setting id."),
        }
    }

    /// Selected network id
    pub fn network_id(&self) -> Option<&str> {
        self.network_id.as_deref()
    }

    /// Selected network name
    pub fn network_name(&self) -> Option<&str> {
        self.network_name.as_deref()
    }

    /// Whether a network is selected
    pub fn is_network_set(&self) -> bool {
        self.network_id.is_some()
    }

    /// Check that requirements follow API key → organization → network
    pub fn check_required_parameter_order(required: &RequiredParameters) -> bool {
        if required.organization_id && !required.api_key {
            error!(
                "Invalid required parameters: 'organization_id' cannot be required if 'api_key' is not."
            );
            return false;
        }
        if required.network_id && (!required.api_key || !required.organization_id) {
            error!(
                "Invalid required parameters: 'network_id' cannot be required if 'api_key' or 'organization_id' is not."
            );
            return false;
        }
        true
    }

    /// The requirement configuration recorded by the last successful ordering check
    pub fn required(&self) -> Option<&RequiredParameters> {
        self.required.as_ref()
    }

    pub(crate) fn set_required(&mut self, required: RequiredParameters) {
        self.required = Some(required);
    }

    /// Compare the recorded requirements against the current state
    pub fn parameter_status(&self) -> ParameterStatus {
        let Some(required) = self.required else {
            warn!(
                "No required application parameters have been defined yet. Call setup_application_parameters first."
            );
            return ParameterStatus {
                all_set: false,
                missing: vec![NO_REQUIRED_PARAMETERS.to_string()],
            };
        };

        if !Self::check_required_parameter_order(&required) {
            return ParameterStatus {
                all_set: false,
                missing: vec![INVALID_REQUIRED_PARAMETERS.to_string()],
            };
        }

        let mut missing = Vec::new();
        if required.api_key && !self.is_api_key_set() {
            missing.push("API_KEY".to_string());
        }
        if required.organization_id && !self.is_organization_set() {
            missing.push("ORGANIZATION_ID".to_string());
        }
        if required.network_id && !self.is_network_set() {
            missing.push("NETWORK_ID".to_string());
        }

        if missing.is_empty() {
            info!("All currently required parameters are set.");
            ParameterStatus {
                all_set: true,
                missing,
            }
        } else {
            error!("Missing required parameters: {}", missing.join(", "));
            ParameterStatus {
                all_set: false,
                missing,
            }
        }
    }

    /// Displayable values of the required fields, with the key masked
    pub fn current_parameters(&self) -> BTreeMap<String, ParameterEntry> {
        let required = self.required.unwrap_or_default();
        let mut params = BTreeMap::new();

        if required.api_key {
            let masked = self
                .api_key
                .as_ref()
                .map_or_else(|| "N/A".to_string(), Credential::masked);
            params.insert("api_key".to_string(), ParameterEntry::new(masked, "API Key"));
        }

        if required.organization_id {
            params.insert(
                "organization_id".to_string(),
                ParameterEntry::new(self.organization_id().unwrap_or("N/A"), "Organization ID"),
            );
            params.insert(
                "organization_name".to_string(),
                ParameterEntry::new(self.organization_name().unwrap_or("N/A"), "Organization Name"),
            );
        }

        if required.network_id {
            params.insert(
                "network_id".to_string(),
                ParameterEntry::new(self.network_id().unwrap_or("N/A"), "Network ID"),
            );
            params.insert(
                "network_name".to_string(),
                ParameterEntry::new(self.network_name().unwrap_or("N/A"), "Network Name"),
            );
        }

        params
    }
}
