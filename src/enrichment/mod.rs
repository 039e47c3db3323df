//! Venue enrichment
//!
//! Adds award data and an Instagram profile to raw provider venues. Each step
//! only fills fields that are still empty, so enriching twice changes nothing,
//! and no step can fail the venue: a step that comes up empty leaves its
//! fields as they were.

pub mod awards;

use crate::identity::{DiscoveryRequest, IdentityDiscoveryEngine};
use crate::model::{CacheLocation, IdentitySource, VenueRecord};
use crate::text::non_empty;
use awards::AwardRegistry;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::debug;

pub use awards::MIN_SUBSTRING_MATCH_LEN;

const INSTAGRAM_BASE: &str = "https://www.instagram.com";

/// Award + identity enrichment for provider venues
pub struct EnrichmentPipeline {
    awards: Arc<AwardRegistry>,
    identity: Option<Arc<IdentityDiscoveryEngine>>,
    concurrency: usize,
}

impl EnrichmentPipeline {
    /// Award lookup only
    pub fn new(awards: Arc<AwardRegistry>) -> Self {
        Self {
            awards,
            identity: None,
            concurrency: 4,
        }
    }

    /// Also resolve Instagram profiles through `engine`
    pub fn with_identity(mut self, engine: Arc<IdentityDiscoveryEngine>) -> Self {
        self.identity = Some(engine);
        self
    }

    /// Venues enriched concurrently by [`enrich_all`](Self::enrich_all)
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Enrich every venue, keeping input order
    pub async fn enrich_all(&self, venues: Vec<VenueRecord>, location: &CacheLocation) -> Vec<VenueRecord> {
        stream::iter(venues)
            .map(|venue| self.enrich(venue, location))
            .buffered(self.concurrency)
            .collect()
            .await
    }

    /// Enrich one venue found at `location`
    pub async fn enrich(&self, mut venue: VenueRecord, location: &CacheLocation) -> VenueRecord {
        self.attach_award(&mut venue);
        self.resolve_identity(&mut venue, location).await;
        venue
    }

    fn attach_award(&self, venue: &mut VenueRecord) {
        if venue.award_tier.is_some() {
            return;
        }
        let Some(record) = self.awards.find(&venue.name) else {
            return;
        };

        venue.award_tier = Some(record.tier);
        if venue.award.is_none() {
            venue.award = record.award.clone();
        }

        if venue.instagram_url().is_none() {
            if let Some(handle) = non_empty(record.instagram.as_deref()) {
                venue.instagram = Some(format!(
                    "{}/{}/",
                    INSTAGRAM_BASE,
                    handle.trim_start_matches('@').to_lowercase()
                ));
                venue.instagram_verified = true;
                venue.instagram_source = Some(IdentitySource::Award);
            }
        }
    }

    async fn resolve_identity(&self, venue: &mut VenueRecord, location: &CacheLocation) {
        if venue.instagram_verified || venue.instagram_source.is_some() {
            return;
        }
        let Some(engine) = &self.identity else {
            return;
        };

        let request = DiscoveryRequest {
            name: venue.name.clone(),
            city: location.city.clone(),
            website: non_empty(venue.website.as_deref()).map(str::to_string),
            hint: venue.instagram_url().map(str::to_string),
            district: venue.district.clone().or_else(|| location.district.clone()),
            neighborhood: venue
                .neighborhood
                .clone()
                .or_else(|| location.neighborhood.clone()),
        };

        let resolution = engine.discover(&request).await;
        debug!(
            "Identity for {}: {:?} ({}, verified: {})",
            venue.name, resolution.url, resolution.source, resolution.verified
        );

        venue.instagram_source = Some(resolution.source);
        if let Some(url) = resolution.url {
            venue.instagram = Some(url);
            venue.instagram_verified = resolution.verified;
        }
    }
}
