//! Service configuration
//!
//! Every setting has a default; `ServiceConfig::from_env` overrides them from
//! the process environment after loading an optional `.env` file.

use crate::cache::config::CacheConfig;
use crate::error::{Result, VenueCacheError};
use crate::identity::probe::ProbeLimits;
use crate::identity::scoring::ACCEPT_THRESHOLD;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const ENV_STORE_PATH: &str = "VENUE_CACHE_STORE_PATH";
pub const ENV_FRESH_HOURS: &str = "VENUE_CACHE_FRESH_HOURS";
pub const ENV_EXPIRE_HOURS: &str = "VENUE_CACHE_EXPIRE_HOURS";
pub const ENV_ENRICH_CONCURRENCY: &str = "VENUE_CACHE_ENRICH_CONCURRENCY";
pub const ENV_SEARCH_API_KEY: &str = "GOOGLE_SEARCH_API_KEY";
pub const ENV_SEARCH_ENGINE_ID: &str = "GOOGLE_SEARCH_ENGINE_ID";
pub const ENV_SEARCH_TIMEOUT_SECS: &str = "VENUE_CACHE_SEARCH_TIMEOUT_SECS";
pub const ENV_FETCH_TIMEOUT_SECS: &str = "VENUE_CACHE_FETCH_TIMEOUT_SECS";

/// Identity discovery settings
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// How long a found profile stays cached
    pub found_ttl: Duration,

    /// How long a "not found" stays cached
    pub not_found_ttl: Duration,

    /// Minimum search score for a candidate to be accepted
    pub accept_threshold: i32,

    /// Username probing bounds
    pub probe: ProbeLimits,

    /// Timeout for venue website fetches
    pub fetch_timeout: Duration,

    /// Site that search queries are restricted to
    pub profile_site: String,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            found_ttl: Duration::from_secs(7 * 24 * 3600),
            not_found_ttl: Duration::from_secs(24 * 3600),
            accept_threshold: ACCEPT_THRESHOLD,
            probe: ProbeLimits::default(),
            fetch_timeout: Duration::from_secs(5),
            profile_site: "instagram.com".to_string(),
        }
    }
}

impl DiscoveryConfig {
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.found_ttl.is_zero() || self.not_found_ttl.is_zero() {
            return Err("identity cache TTLs must be greater than 0".to_string());
        }
        if self.probe.max_concurrent == 0 {
            return Err("probe max_concurrent must be greater than 0".to_string());
        }
        if self.profile_site.trim().is_empty() {
            return Err("profile_site must not be empty".to_string());
        }
        Ok(())
    }
}

/// Search API settings
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub api_key: Option<String>,
    pub engine_id: Option<String>,
    pub endpoint: String,
    pub timeout: Duration,
    pub results_per_query: u8,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            engine_id: None,
            endpoint: "https://www.googleapis.com/customsearch/v1".to_string(),
            timeout: Duration::from_secs(8),
            results_per_query: 10,
        }
    }
}

impl SearchConfig {
    /// Whether both credentials are present
    pub fn is_configured(&self) -> bool {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        present(&self.api_key) && present(&self.engine_id)
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.endpoint.trim().is_empty() {
            return Err("search endpoint must not be empty".to_string());
        }
        if !(1..=10).contains(&self.results_per_query) {
            return Err("results_per_query must be between 1 and 10".to_string());
        }
        Ok(())
    }
}

/// Complete service configuration
#[derive(Debug, Clone, Default)]
pub struct ServiceConfig {
    pub cache: CacheConfig,
    pub discovery: DiscoveryConfig,
    pub search: SearchConfig,
}

impl ServiceConfig {
    /// Defaults overridden by environment variables (and `.env`, if present)
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cache = CacheConfig::builder().store_path(
            lookup(ENV_STORE_PATH)
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(default_store_path),
        );
        if let Some(hours) = parse_var::<u64>(&lookup, ENV_FRESH_HOURS)? {
            cache = cache.fresh_for(Duration::from_secs(hours * 3600));
        }
        if let Some(hours) = parse_var::<u64>(&lookup, ENV_EXPIRE_HOURS)? {
            cache = cache.expire_after(Duration::from_secs(hours * 3600));
        }
        if let Some(n) = parse_var::<usize>(&lookup, ENV_ENRICH_CONCURRENCY)? {
            cache = cache.enrichment_concurrency(n);
        }

        let mut config = ServiceConfig {
            cache: cache.build(),
            ..Default::default()
        };
        if let Some(secs) = parse_var::<u64>(&lookup, ENV_SEARCH_TIMEOUT_SECS)? {
            config.search.timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_var::<u64>(&lookup, ENV_FETCH_TIMEOUT_SECS)? {
            config.discovery.fetch_timeout = Duration::from_secs(secs);
        }
        config.search.api_key = lookup(ENV_SEARCH_API_KEY);
        config.search.engine_id = lookup(ENV_SEARCH_ENGINE_ID);

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.cache
            .validate()
            .and_then(|_| self.discovery.validate())
            .and_then(|_| self.search.validate())
            .map_err(VenueCacheError::ConfigError)
    }
}

/// `<data dir>/venue-cache/venues.json`, falling back to the working directory
pub fn default_store_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("venue-cache")
        .join("venues.json")
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| VenueCacheError::ConfigError(format!("{}={}: {}", name, raw, e))),
        _ => Ok(None),
    }
}
