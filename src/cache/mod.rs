//! # Stale-While-Revalidate Venue Cache
//!
//! Venue listings are cached per category and location and classified by age
//! into three bands:
//!
//! - **FRESH** (younger than 24h): served as-is
//! - **STALE** (24h up to 96h): served as-is while one background refresh runs
//! - **EXPIRED** (96h and older, or missing): refreshed before serving
//!
//! Refreshes are deduplicated per key by the [`RefreshCoordinator`], and a
//! failed refresh of an expired entry falls back to the old payload.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use venue_cache::cache::{FreshnessPolicy, MemoryVenueStore, RefreshCoordinator};
//! use venue_cache::clock::SystemClock;
//! use venue_cache::enrichment::{awards::AwardRegistry, EnrichmentPipeline};
//! use venue_cache::model::{CacheLocation, VenueQuery};
//! use venue_cache::provider::VenueProvider;
//!
//! # async fn example(provider: Arc<dyn VenueProvider>) -> anyhow::Result<()> {
//! let coordinator = RefreshCoordinator::new(
//!     Arc::new(MemoryVenueStore::new()),
//!     provider,
//!     Arc::new(EnrichmentPipeline::new(Arc::new(AwardRegistry::default()))),
//!     FreshnessPolicy::default(),
//!     Arc::new(SystemClock),
//! );
//!
//! let query = VenueQuery::new(CacheLocation::new("restaurants", "Istanbul").district(Some("Kadıköy")));
//! let cached = coordinator.get_fresh(&query).await?;
//! println!("{} venues ({})", cached.venues.len(), cached.state);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod entry;
pub mod freshness;
pub mod key;
pub mod refresh;
pub mod store;
pub mod types;

pub use config::{CacheConfig, CacheConfigBuilder};
pub use entry::{CacheEntry, WriteKind};
pub use freshness::{FreshnessPolicy, FreshnessState};
pub use key::CacheKeyBuilder;
pub use refresh::{CachedVenues, RefreshCoordinator};
pub use store::{FileVenueStore, MemoryVenueStore, VenueStore};
pub use types::{BandCounts, CacheKey, CacheStats, PurgeScope};
