//! Caller-facing venue cache facade

use crate::cache::{
    entry::{CacheEntry, WriteKind},
    refresh::{CachedVenues, RefreshCoordinator},
    store::{FileVenueStore, MemoryVenueStore, VenueStore},
    types::{CacheStats, PurgeScope},
};
use crate::clock::{Clock, SystemClock};
use crate::config::ServiceConfig;
use crate::enrichment::{awards::AwardRegistry, EnrichmentPipeline};
use crate::error::{Result, VenueCacheError};
use crate::identity::{
    GoogleSearchClient, HttpWebsiteFetcher, IdentityCache, IdentityDiscoveryEngine,
};
use crate::model::{CacheLocation, VenueQuery, VenueRecord};
use crate::provider::VenueProvider;
use std::sync::Arc;
use tracing::{info, warn};

/// Entry point for HTTP handlers and admin tooling
#[derive(Clone)]
pub struct VenueCacheService {
    coordinator: RefreshCoordinator,
}

impl VenueCacheService {
    pub fn new(coordinator: RefreshCoordinator) -> Self {
        Self { coordinator }
    }

    /// Wire the whole stack from configuration.
    ///
    /// Uses the file store when a store path is configured and the search
    /// step only when search credentials are present.
    pub async fn from_config(
        config: ServiceConfig,
        provider: Arc<dyn VenueProvider>,
        awards: AwardRegistry,
    ) -> Result<Self> {
        config.validate()?;
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let store: Arc<dyn VenueStore> = match &config.cache.store_path {
            Some(path) => Arc::new(FileVenueStore::open(path).await?),
            None => Arc::new(MemoryVenueStore::new()),
        };

        let identity_cache = IdentityCache::with_ttls(
            Arc::clone(&clock),
            to_chrono(config.discovery.found_ttl)?,
            to_chrono(config.discovery.not_found_ttl)?,
        );
        let mut engine = IdentityDiscoveryEngine::new(Arc::new(identity_cache), config.discovery.clone())
            .with_fetcher(Arc::new(HttpWebsiteFetcher::new(config.discovery.fetch_timeout)?));
        if config.search.is_configured() {
            engine = engine.with_search(Arc::new(GoogleSearchClient::new(config.search.clone())?));
        } else {
            warn!("Search credentials not configured, identity search step disabled");
        }

        let pipeline = EnrichmentPipeline::new(Arc::new(awards))
            .with_identity(Arc::new(engine))
            .with_concurrency(config.cache.enrichment_concurrency);

        let policy = config
            .cache
            .freshness_policy()
            .map_err(VenueCacheError::ConfigError)?;

        info!(
            "Venue cache ready (fresh for {}h, expires after {}h)",
            policy.fresh_for().num_hours(),
            policy.expire_after().num_hours()
        );
        Ok(Self::new(RefreshCoordinator::new(
            store,
            provider,
            Arc::new(pipeline),
            policy,
            clock,
        )))
    }

    /// Venues for a location with the freshness band they were read in
    pub async fn get_cached_venues(&self, query: &VenueQuery) -> Result<CachedVenues> {
        self.coordinator.get_fresh(query).await
    }

    /// Store venues refreshed out of band, as given
    pub async fn save_venues(&self, location: &CacheLocation, venues: Vec<VenueRecord>) -> Result<CacheEntry> {
        let now = self.coordinator.clock().now();
        let entry = self
            .coordinator
            .store()
            .upsert(location, venues, WriteKind::Manual, now)
            .await?;
        info!("Saved {} venues for {}", entry.payload.len(), entry.key);
        Ok(entry)
    }

    /// Entry counts per category and freshness band
    pub async fn cache_stats(&self) -> Result<CacheStats> {
        let now = self.coordinator.clock().now();
        self.coordinator.store().stats(self.coordinator.policy(), now).await
    }

    /// Remove a category, or everything
    pub async fn purge_cache(&self, scope: &PurgeScope) -> Result<usize> {
        self.coordinator.store().purge(scope).await
    }

    pub fn coordinator(&self) -> &RefreshCoordinator {
        &self.coordinator
    }
}

fn to_chrono(duration: std::time::Duration) -> Result<chrono::Duration> {
    chrono::Duration::from_std(duration).map_err(|e| VenueCacheError::ConfigError(e.to_string()))
}
