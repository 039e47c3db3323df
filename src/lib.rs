//! # venue-cache
//!
//! Stale-while-revalidate cache for venue listings (restaurants, bars, cafés)
//! with award and Instagram enrichment.
//!
//! ## Features
//!
//! - Three freshness bands (FRESH, STALE, EXPIRED) with configurable thresholds
//! - At most one refresh per cache key in flight, shared by every waiter
//! - Degraded serving of expired payloads when the provider fails
//! - Award registry matching with Turkish-aware name normalization
//! - Instagram profile discovery: cache, scored search, website scrape,
//!   hint and bounded username probing
//! - JSON file store with atomic writes
//!
//! ## Serving Venues
//!
//! ```no_run
//! use std::sync::Arc;
//! use venue_cache::{AwardRegistry, CacheLocation, ServiceConfig, VenueCacheService, VenueQuery};
//! use venue_cache::provider::VenueProvider;
//!
//! # async fn example(provider: Arc<dyn VenueProvider>) -> anyhow::Result<()> {
//! let config = ServiceConfig::from_env()?;
//! let awards = AwardRegistry::from_path("data/awards.json")?;
//! let service = VenueCacheService::from_config(config, provider, awards).await?;
//!
//! let location = CacheLocation::new("restaurants", "Istanbul").neighborhood(Some("Karaköy"));
//! let cached = service.get_cached_venues(&VenueQuery::new(location)).await?;
//! for venue in &cached.venues {
//!     println!("{} {:?}", venue.name, venue.instagram);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Identity Discovery
//!
//! ```no_run
//! use std::sync::Arc;
//! use venue_cache::config::DiscoveryConfig;
//! use venue_cache::identity::{DiscoveryRequest, IdentityCache, IdentityDiscoveryEngine};
//!
//! # async fn example() {
//! let engine = IdentityDiscoveryEngine::new(Arc::new(IdentityCache::default()), DiscoveryConfig::default());
//! let resolution = engine.discover(&DiscoveryRequest::new("Neolokal", "Istanbul")).await;
//! println!("{:?} via {}", resolution.url, resolution.source);
//! # }
//! ```

pub mod cache;
pub mod clock;
pub mod config;
pub mod enrichment;
pub mod error;
pub mod identity;
pub mod model;
pub mod provider;
pub mod service;
pub mod telemetry;
pub mod text;

// Re-export main types for convenience
pub use cache::{
    CacheConfig, CacheEntry, CacheKey, CacheKeyBuilder, CacheStats, CachedVenues, FileVenueStore,
    FreshnessPolicy, FreshnessState, MemoryVenueStore, PurgeScope, RefreshCoordinator, VenueStore,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::ServiceConfig;
pub use enrichment::{awards::AwardRegistry, EnrichmentPipeline};
pub use error::{Result, VenueCacheError};
pub use identity::{DiscoveryRequest, IdentityCache, IdentityDiscoveryEngine, Resolution};
pub use model::{AwardRecord, AwardTier, CacheLocation, IdentitySource, VenueQuery, VenueRecord};
pub use provider::VenueProvider;
pub use service::VenueCacheService;
