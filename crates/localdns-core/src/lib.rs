// # localdns-core
//
// Core library for the Local DNS admin console.
//
// ## Architecture Overview
//
// This library provides everything between a presentation layer and the
// vendor Dashboard API:
// - **ScopeState**: API key → organization → network selection with ordering rules
// - **ListingCache**: Optional per-session memo of organization and network listings
// - **RestClient**: Builds authenticated requests and classifies every outcome
// - **ApiSession**: Per-session owner of scope, cache and client
// - **LocalDns**: Profile, record and assignment operations with name joins
// - **Transport**: Trait for the HTTP seam (reqwest lives in `localdns-meraki`)
// - **LogBuffer / LogPoller**: Bounded log capture drained on a fixed interval
//
// ## Design Principles
//
// 1. **Session-Scoped**: No process-wide state; one `ApiSession` per session
// 2. **Tagged Results**: Every operation returns `Result<T, ApiError>`
// 3. **Library-First**: No HTTP library in core; transports are pluggable
// 4. **No Hidden Retries**: Every failure is terminal for its call

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod local_dns;
pub mod logging;
pub mod scope;
pub mod session;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export core types for convenience
pub use cache::{CachedListing, ListingCache};
pub use client::{ApiResponse, RestClient};
pub use config::{RequiredParameters, SessionConfig, SetupParameters};
pub use error::{ApiError, ApiResult, Error, ErrorKind, Result};
pub use local_dns::LocalDns;
pub use logging::{LogBuffer, LogBufferLayer, LogEntry, LogPoller, LogWatch};
pub use scope::{Credential, ScopeState};
pub use session::ApiSession;
pub use traits::{HttpMethod, HttpRequest, HttpResponse, Transport, TransportError};
pub use types::{
    AssignmentLink, DnsRecord, Network, NetworkAssignment, Organization, ParameterEntry,
    ParameterStatus, Profile, ProfileView, UNASSIGNED, UNKNOWN,
};
