//! Listing caches
//!
//! Per-session memoization of organization and network listings.

pub mod memory;

pub use memory::{CachedListing, ListingCache};
