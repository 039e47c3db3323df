//! Core type definitions for the cache system

use crate::cache::freshness::FreshnessState;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Cache key type - derived from category and location
pub type CacheKey = String;

/// Entry counts per freshness band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BandCounts {
    pub fresh: usize,
    pub stale: usize,
    pub expired: usize,
}

impl BandCounts {
    pub fn record(&mut self, state: FreshnessState) {
        match state {
            FreshnessState::Fresh => self.fresh += 1,
            FreshnessState::Stale => self.stale += 1,
            FreshnessState::Expired => self.expired += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.fresh + self.stale + self.expired
    }
}

/// Per-category and per-band entry counts for observability
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CacheStats {
    /// Counts keyed by category, as stored on the entries
    pub by_category: BTreeMap<String, BandCounts>,

    /// Counts over all categories
    pub totals: BandCounts,

    /// Number of venues across all payloads
    pub venues: usize,
}

impl CacheStats {
    pub fn record(&mut self, category: &str, state: FreshnessState, venues: usize) {
        self.by_category
            .entry(category.to_string())
            .or_default()
            .record(state);
        self.totals.record(state);
        self.venues += venues;
    }

    /// Number of cached entries
    pub fn entries(&self) -> usize {
        self.totals.total()
    }

    /// Share of entries that can be served without a synchronous refresh (0-100)
    pub fn servable_rate(&self) -> f64 {
        let total = self.entries();
        if total == 0 {
            0.0
        } else {
            ((self.totals.fresh + self.totals.stale) as f64 / total as f64) * 100.0
        }
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CacheStats {{ entries: {}, fresh: {}, stale: {}, expired: {}, venues: {}, servable: {:.2}% }}",
            self.entries(),
            self.totals.fresh,
            self.totals.stale,
            self.totals.expired,
            self.venues,
            self.servable_rate()
        )
    }
}

/// Scope of an administrative purge
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurgeScope {
    All,
    Category(String),
}

impl PurgeScope {
    /// `"all"` (any case) purges everything, anything else names a category
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.eq_ignore_ascii_case("all") {
            PurgeScope::All
        } else {
            PurgeScope::Category(value.to_string())
        }
    }
}

impl fmt::Display for PurgeScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PurgeScope::All => write!(f, "all"),
            PurgeScope::Category(category) => write!(f, "category:{}", category),
        }
    }
}
