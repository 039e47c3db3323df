//! Cache entry for one category/location key

use crate::cache::freshness::{FreshnessPolicy, FreshnessState};
use crate::cache::types::CacheKey;
use crate::model::{CacheLocation, VenueRecord};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// How a payload reached the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    /// Produced by the refresh coordinator
    Refresh,
    /// Saved explicitly by a caller after an out-of-band refresh
    Manual,
}

/// Cached venues for one key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The cache key
    pub key: CacheKey,

    pub category: String,

    pub city: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neighborhood: Option<String>,

    /// Venues in provider order
    pub payload: Vec<VenueRecord>,

    /// When the key was first written
    pub created_at: DateTime<Utc>,

    /// Last payload replacement; drives freshness
    pub updated_at: DateTime<Utc>,

    /// Last replacement made by the refresh coordinator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_refresh_at: Option<DateTime<Utc>>,
}

impl CacheEntry {
    /// Create a new entry for `location`
    pub fn new(
        location: &CacheLocation,
        payload: Vec<VenueRecord>,
        kind: WriteKind,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            key: location.cache_key(),
            category: location.category.clone(),
            city: location.city.clone(),
            district: location.district.clone(),
            neighborhood: location.neighborhood.clone(),
            payload,
            created_at: now,
            updated_at: now,
            last_refresh_at: (kind == WriteKind::Refresh).then_some(now),
        }
    }

    /// Replace the payload, keeping `created_at`
    pub fn replace_payload(&mut self, payload: Vec<VenueRecord>, kind: WriteKind, now: DateTime<Utc>) {
        self.payload = payload;
        self.updated_at = now;
        if kind == WriteKind::Refresh {
            self.last_refresh_at = Some(now);
        }
    }

    /// The location this entry was written for
    pub fn location(&self) -> CacheLocation {
        CacheLocation {
            category: self.category.clone(),
            city: self.city.clone(),
            district: self.district.clone(),
            neighborhood: self.neighborhood.clone(),
        }
    }

    /// Age of the payload at `now`
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.updated_at
    }

    /// Freshness band of the payload at `now`
    pub fn freshness(&self, policy: &FreshnessPolicy, now: DateTime<Utc>) -> FreshnessState {
        policy.classify(self.updated_at, now)
    }
}
