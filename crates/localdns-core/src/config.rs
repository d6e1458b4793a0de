//! Configuration types for the Local DNS console
//!
//! This module defines the session configuration and the typed forms of the
//! "which scope fields are required" and "which values were supplied" inputs
//! used by [`ApiSession::setup_application_parameters`].
//!
//! [`ApiSession::setup_application_parameters`]: crate::ApiSession::setup_application_parameters

use serde::{Deserialize, Serialize};

/// Default vendor Dashboard API base URL
pub const DEFAULT_API_BASE_URL: &str = "https://api.meraki.com/api/v1";

/// Default environment variable holding the API key
pub const DEFAULT_API_KEY_ENV: &str = "MK_CSM_KEY";

/// Session configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Dashboard API base URL (without trailing slash)
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Environment variable consulted when no API key is supplied
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Whether organization and network listings are memoized
    #[serde(default)]
    pub enable_caching: bool,

    /// Transport timeout in seconds
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    /// Maximum number of formatted log lines kept in memory
    #[serde(default = "default_log_buffer_capacity")]
    pub log_buffer_capacity: usize,

    /// Interval at which the log poller drains the buffer
    #[serde(default = "default_log_poll_interval_secs")]
    pub log_poll_interval_secs: u64,
}

impl SessionConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            api_key_env: default_api_key_env(),
            enable_caching: false,
            http_timeout_secs: default_http_timeout_secs(),
            log_buffer_capacity: default_log_buffer_capacity(),
            log_poll_interval_secs: default_log_poll_interval_secs(),
        }
    }

    /// Enable or disable listing caches
    pub fn with_caching(mut self, enable_caching: bool) -> Self {
        self.enable_caching = enable_caching;
        self
    }

    /// Override the API base URL
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Override the environment variable used for the API key fallback
    pub fn with_api_key_env(mut self, name: impl Into<String>) -> Self {
        self.api_key_env = name.into();
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.api_base_url.is_empty() {
            return Err(crate::Error::config("API base URL cannot be empty"));
        }
        if !self.api_base_url.starts_with("https://") && !self.api_base_url.starts_with("http://")
        {
            return Err(crate::Error::config(format!(
                "API base URL must use HTTP or HTTPS scheme. Got: {}",
                self.api_base_url
            )));
        }
        if self.api_key_env.is_empty() {
            return Err(crate::Error::config(
                "API key environment variable name cannot be empty",
            ));
        }
        if self.http_timeout_secs == 0 {
            return Err(crate::Error::config("HTTP timeout must be > 0"));
        }
        if self.log_buffer_capacity == 0 {
            return Err(crate::Error::config("Log buffer capacity must be > 0"));
        }
        if self.log_poll_interval_secs == 0 {
            return Err(crate::Error::config("Log poll interval must be > 0"));
        }
        Ok(())
    }

    /// Base URL with any trailing slash removed
    pub fn base_url(&self) -> &str {
        self.api_base_url.trim_end_matches('/')
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_api_key_env() -> String {
    DEFAULT_API_KEY_ENV.to_string()
}

fn default_http_timeout_secs() -> u64 {
    30
}

fn default_log_buffer_capacity() -> usize {
    1000
}

fn default_log_poll_interval_secs() -> u64 {
    2
}

/// Which scope fields an application requires
///
/// Requirements must respect the dependency order
/// API key → organization → network.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredParameters {
    /// The API key must be set
    #[serde(default)]
    pub api_key: bool,

    /// An organization must be selected
    #[serde(default)]
    pub organization_id: bool,

    /// A network must be selected
    #[serde(default)]
    pub network_id: bool,
}

impl RequiredParameters {
    /// Only the API key is required
    pub fn api_key_only() -> Self {
        Self {
            api_key: true,
            organization_id: false,
            network_id: false,
        }
    }

    /// API key and organization are required
    pub fn organization() -> Self {
        Self {
            api_key: true,
            organization_id: true,
            network_id: false,
        }
    }

    /// Every scope field is required
    pub fn network() -> Self {
        Self {
            api_key: true,
            organization_id: true,
            network_id: true,
        }
    }
}

/// Values supplied for scope setup
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetupParameters {
    /// API key; falls back to the configured environment variable
    #[serde(default)]
    pub api_key: Option<String>,

    /// Organization id
    #[serde(default)]
    pub organization_id: Option<String>,

    /// Organization display name
    #[serde(default)]
    pub organization_name: Option<String>,

    /// Network id
    #[serde(default)]
    pub network_id: Option<String>,

    /// Network display name
    #[serde(default)]
    pub network_name: Option<String>,
}

impl SetupParameters {
    /// Create an empty parameter set
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the API key
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the organization id and optional name
    pub fn with_organization(mut self, id: impl Into<String>, name: Option<String>) -> Self {
        self.organization_id = Some(id.into());
        self.organization_name = name;
        self
    }

    /// Set the network id and optional name
    pub fn with_network(mut self, id: impl Into<String>, name: Option<String>) -> Self {
        self.network_id = Some(id.into());
        self.network_name = name;
        self
    }
}
