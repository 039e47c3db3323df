//! Configuration for the venue cache

use crate::cache::freshness::FreshnessPolicy;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the SWR venue cache
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Entries younger than this are served without refreshing
    pub fresh_for: Duration,

    /// Entries at least this old are refreshed before serving
    pub expire_after: Duration,

    /// Location of the JSON file backing `FileVenueStore`
    pub store_path: Option<PathBuf>,

    /// Venues enriched concurrently during one refresh
    pub enrichment_concurrency: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            // 24 hours fresh
            fresh_for: Duration::from_secs(24 * 3600),
            // 96 hours until expired
            expire_after: Duration::from_secs(96 * 3600),
            store_path: None,
            enrichment_concurrency: 4,
        }
    }
}

impl CacheConfig {
    /// Create a new builder for cache configuration
    pub fn builder() -> CacheConfigBuilder {
        CacheConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.fresh_for.is_zero() {
            return Err("fresh_for must be greater than 0".to_string());
        }

        if self.expire_after <= self.fresh_for {
            return Err("expire_after must be greater than fresh_for".to_string());
        }

        if self.enrichment_concurrency == 0 {
            return Err("enrichment_concurrency must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Freshness policy described by this configuration
    pub fn freshness_policy(&self) -> Result<FreshnessPolicy, String> {
        let fresh_for = chrono::Duration::from_std(self.fresh_for).map_err(|e| e.to_string())?;
        let expire_after =
            chrono::Duration::from_std(self.expire_after).map_err(|e| e.to_string())?;
        FreshnessPolicy::new(fresh_for, expire_after)
    }
}

/// Builder for cache configuration
#[derive(Debug, Default)]
pub struct CacheConfigBuilder {
    fresh_for: Option<Duration>,
    expire_after: Option<Duration>,
    store_path: Option<PathBuf>,
    enrichment_concurrency: Option<usize>,
}

impl CacheConfigBuilder {
    /// Set how long entries stay fresh
    pub fn fresh_for(mut self, ttl: Duration) -> Self {
        self.fresh_for = Some(ttl);
        self
    }

    /// Set the age at which entries expire
    pub fn expire_after(mut self, ttl: Duration) -> Self {
        self.expire_after = Some(ttl);
        self
    }

    /// Set the JSON store path
    pub fn store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store_path = Some(path.into());
        self
    }

    /// Set how many venues are enriched at once
    pub fn enrichment_concurrency(mut self, concurrency: usize) -> Self {
        self.enrichment_concurrency = Some(concurrency);
        self
    }

    /// Build the cache configuration
    pub fn build(self) -> CacheConfig {
        let defaults = CacheConfig::default();

        CacheConfig {
            fresh_for: self.fresh_for.unwrap_or(defaults.fresh_for),
            expire_after: self.expire_after.unwrap_or(defaults.expire_after),
            store_path: self.store_path.or(defaults.store_path),
            enrichment_concurrency: self
                .enrichment_concurrency
                .unwrap_or(defaults.enrichment_concurrency),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CacheConfig::default();
        assert_eq!(config.fresh_for, Duration::from_secs(24 * 3600));
        assert_eq!(config.expire_after, Duration::from_secs(96 * 3600));
        assert!(config.validate().is_ok());
        assert_eq!(config.freshness_policy().unwrap(), FreshnessPolicy::default());
    }

    #[test]
    fn test_config_validation() {
        let mut invalid_config = CacheConfig::default();
        invalid_config.expire_after = invalid_config.fresh_for;
        assert!(invalid_config.validate().is_err());

        let mut invalid_config = CacheConfig::default();
        invalid_config.enrichment_concurrency = 0;
        assert!(invalid_config.validate().is_err());
    }

    #[test]
    fn test_config_builder() {
        let config = CacheConfig::builder()
            .fresh_for(Duration::from_secs(600))
            .expire_after(Duration::from_secs(1200))
            .store_path("/tmp/venues.json")
            .build();

        assert_eq!(config.fresh_for, Duration::from_secs(600));
        assert_eq!(config.expire_after, Duration::from_secs(1200));
        assert_eq!(config.store_path, Some(PathBuf::from("/tmp/venues.json")));
        assert_eq!(config.enrichment_concurrency, 4);
    }
}
