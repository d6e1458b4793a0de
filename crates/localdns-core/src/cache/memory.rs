// # Memory Listing Cache
//
// In-memory memoization of the organization list (single slot) and the
// network lists (keyed by organization id).
//
// ## Lifetime
//
// - Entries live as long as the owning session; there is no TTL, no size
//   bound and no invalidation on mutation.
// - A failed fetch is remembered as a negative entry so the session does not
//   hammer a failing endpoint. Reads of a negative entry yield an empty list,
//   but the entry stays distinguishable through [`CachedListing::is_negative`].

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::ApiError;
use crate::types::{Network, Organization};

/// A cached listing result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachedListing<T> {
    /// The fetch succeeded with these items
    Fetched(Vec<T>),
    /// The fetch failed; served as an empty list
    Failed(ApiError),
}

impl<T: Clone> CachedListing<T> {
    /// Items to serve for a cached read
    pub fn items(&self) -> Vec<T> {
        match self {
            CachedListing::Fetched(items) => items.clone(),
            CachedListing::Failed(_) => Vec::new(),
        }
    }

    /// Whether this entry records a failure
    pub fn is_negative(&self) -> bool {
        matches!(self, CachedListing::Failed(_))
    }
}

/// In-memory listing cache
///
/// Clones share the same underlying maps.
///
/// # Example
///
/// ```rust,no_run
/// use localdns_core::cache::ListingCache;
///
/// #[tokio::main]
/// async fn main() {
///     let cache = ListingCache::new();
///     cache.store_networks("o1", Vec::new()).await;
///     assert!(cache.networks("o1").await.is_some());
///     assert!(cache.networks("o2").await.is_none());
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ListingCache {
    organizations: Arc<RwLock<Option<CachedListing<Organization>>>>,
    networks: Arc<RwLock<HashMap<String, CachedListing<Network>>>>,
}

impl ListingCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached organization listing, if any
    pub async fn organizations(&self) -> Option<CachedListing<Organization>> {
        self.organizations.read().await.clone()
    }

    /// Remember a successful organization listing
    pub async fn store_organizations(&self, organizations: Vec<Organization>) {
        *self.organizations.write().await = Some(CachedListing::Fetched(organizations));
    }

    /// Remember a failed organization listing
    pub async fn store_organizations_failure(&self, error: ApiError) {
        *self.organizations.write().await = Some(CachedListing::Failed(error));
    }

    /// Cached network listing for an organization, if any
    pub async fn networks(&self, organization_id: &str) -> Option<CachedListing<Network>> {
        self.networks.read().await.get(organization_id).cloned()
    }

    /// Remember a successful network listing
    pub async fn store_networks(&self, organization_id: &str, networks: Vec<Network>) {
        self.networks
            .write()
            .await
            .insert(organization_id.to_string(), CachedListing::Fetched(networks));
    }

    /// Remember a failed network listing
    pub async fn store_networks_failure(&self, organization_id: &str, error: ApiError) {
        self.networks
            .write()
            .await
            .insert(organization_id.to_string(), CachedListing::Failed(error));
    }

    /// Number of organizations with a cached network entry
    pub async fn network_entry_count(&self) -> usize {
        self.networks.read().await.len()
    }
}
