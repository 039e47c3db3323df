//! Venue-generation collaborator
//!
//! The provider (an AI model backed by a places API) is the expensive call
//! the cache exists to avoid. The cache only needs this one operation.

use crate::error::Result;
use crate::model::{VenueQuery, VenueRecord};
use async_trait::async_trait;

/// Produces fresh venue listings for a query
#[async_trait]
pub trait VenueProvider: Send + Sync {
    /// Generate venues; failures should be reported as `VenueCacheError::ProviderError`
    async fn generate(&self, query: &VenueQuery) -> Result<Vec<VenueRecord>>;
}
