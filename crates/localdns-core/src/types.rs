//! Domain records exchanged with the presentation layer
//!
//! Display records serialise and deserialise in flat camelCase. Records whose
//! vendor shape nests references (`{"profile": {"id": ...}}`) are decoded from
//! the vendor through a crate-private wire struct ([`FromVendor`]) and
//! flattened on the way in.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Shown when a profile has no network assignment
pub const UNASSIGNED: &str = "[unassigned]";

/// Shown when a referenced id cannot be resolved to a name
pub const UNKNOWN: &str = "[unknown]";

/// Conversion from the JSON shape the vendor sends
pub(crate) trait FromVendor: Sized {
    type Wire: DeserializeOwned;

    fn from_vendor(wire: Self::Wire) -> Self;
}

/// An organization visible to the API key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: String,
    pub name: String,
    pub url: String,
    pub api_enabled: bool,
    pub licensing_model: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct OrganizationWire {
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    api: Option<ApiFlagWire>,
    #[serde(default)]
    licensing: Option<LicensingWire>,
}

#[derive(Deserialize)]
struct ApiFlagWire {
    #[serde(default)]
    enabled: bool,
}

#[derive(Deserialize)]
struct LicensingWire {
    #[serde(default)]
    model: Option<String>,
}

impl FromVendor for Organization {
    type Wire = OrganizationWire;

    fn from_vendor(wire: OrganizationWire) -> Self {
        Self {
            id: wire.id,
            name: wire.name,
            url: wire.url,
            api_enabled: wire.api.is_some_and(|api| api.enabled),
            licensing_model: wire.licensing.and_then(|l| l.model),
        }
    }
}

/// A network (site) belonging to an organization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Network {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub network_type: String,
    #[serde(default)]
    pub time_zone: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl FromVendor for Network {
    type Wire = Self;

    fn from_vendor(wire: Self) -> Self {
        wire
    }
}

/// A Local DNS profile as returned by the vendor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub profile_id: String,
    #[serde(default)]
    pub name: String,
}

impl FromVendor for Profile {
    type Wire = Self;

    fn from_vendor(wire: Self) -> Self {
        wire
    }
}

/// A profile joined with its network assignment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    pub profile_id: String,
    pub name: String,
    /// Assigned network id, or [`UNASSIGNED`]
    pub network_id: String,
    /// Assigned network name, [`UNKNOWN`] or [`UNASSIGNED`]
    pub network_name: String,
}

impl ProfileView {
    /// A view for a profile without any assignment
    pub fn unassigned(profile: Profile) -> Self {
        Self {
            profile_id: profile.profile_id,
            name: profile.name,
            network_id: UNASSIGNED.to_string(),
            network_name: UNASSIGNED.to_string(),
        }
    }

    /// Whether the profile has an assignment
    pub fn is_assigned(&self) -> bool {
        self.network_id != UNASSIGNED
    }
}

/// A hostname → address record inside a profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DnsRecord {
    pub record_id: String,
    pub hostname: String,
    pub address: String,
    pub profile_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DnsRecordWire {
    record_id: String,
    #[serde(default)]
    hostname: String,
    #[serde(default)]
    address: String,
    #[serde(default)]
    profile: IdRef,
}

impl FromVendor for DnsRecord {
    type Wire = DnsRecordWire;

    fn from_vendor(wire: DnsRecordWire) -> Self {
        Self {
            record_id: wire.record_id,
            hostname: wire.hostname,
            address: wire.address,
            profile_id: wire.profile.id,
        }
    }
}

/// A raw profile ↔ network link as returned by the vendor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentLink {
    pub assignment_id: String,
    pub network_id: String,
    pub profile_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AssignmentWire {
    #[serde(default)]
    assignment_id: String,
    #[serde(default)]
    network: IdRef,
    #[serde(default)]
    profile: IdRef,
}

impl FromVendor for AssignmentLink {
    type Wire = AssignmentWire;

    fn from_vendor(wire: AssignmentWire) -> Self {
        Self {
            assignment_id: wire.assignment_id,
            network_id: wire.network.id,
            profile_id: wire.profile.id,
        }
    }
}

/// An assignment with network and profile names resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkAssignment {
    pub assignment_id: String,
    pub network_id: String,
    /// Resolved network name, or [`UNKNOWN`]
    pub network_name: String,
    pub profile_id: String,
    /// Resolved profile name, or [`UNKNOWN`]
    pub profile_name: String,
}

#[derive(Debug, Default, Deserialize)]
struct IdRef {
    #[serde(default)]
    id: String,
}

/// `{"items": [...]}` envelope used by the Local DNS collection endpoints
#[derive(Debug, Deserialize)]
pub(crate) struct Items<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

/// One displayable scope parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterEntry {
    pub value: String,
    pub label: String,
}

impl ParameterEntry {
    pub(crate) fn new(value: impl Into<String>, label: &str) -> Self {
        Self {
            value: value.into(),
            label: label.to_string(),
        }
    }
}

/// Result of checking the required scope fields against the current state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterStatus {
    /// Every required field is set
    pub all_set: bool,
    /// Names of missing fields (or a descriptive placeholder)
    pub missing: Vec<String>,
}
