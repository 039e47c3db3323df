//! Short-term cache of identity discovery outcomes
//!
//! Found profiles are kept for 7 days, misses for 1 day so that venues
//! without a profile are retried sooner.

use crate::clock::{Clock, SystemClock};
use crate::text::normalize_name;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Lowercased (name, city, district, neighborhood)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityKey {
    pub name: String,
    pub city: String,
    pub district: String,
    pub neighborhood: String,
}

impl IdentityKey {
    pub fn new(name: &str, city: &str, district: Option<&str>, neighborhood: Option<&str>) -> Self {
        Self {
            name: normalize_name(name),
            city: normalize_name(city),
            district: normalize_name(district.unwrap_or_default()),
            neighborhood: normalize_name(neighborhood.unwrap_or_default()),
        }
    }
}

/// A cached outcome: `url` is `None` for a negative result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityCacheEntry {
    pub url: Option<String>,
    pub expires_at: DateTime<Utc>,
}

/// Process-wide identity cache, constructed and injected explicitly
pub struct IdentityCache {
    entries: Mutex<HashMap<IdentityKey, IdentityCacheEntry>>,
    found_ttl: Duration,
    not_found_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl Default for IdentityCache {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl IdentityCache {
    /// Cache with the default 7 day / 1 day TTLs
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_ttls(clock, Duration::days(7), Duration::days(1))
    }

    pub fn with_ttls(clock: Arc<dyn Clock>, found_ttl: Duration, not_found_ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            found_ttl,
            not_found_ttl,
            clock,
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<IdentityKey, IdentityCacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Look up `key`.
    ///
    /// `None` is a miss; `Some(None)` is a cached "not found". Expired
    /// entries are evicted on access.
    pub fn get(&self, key: &IdentityKey) -> Option<Option<String>> {
        let now = self.clock.now();
        let mut entries = self.entries();

        match entries.get(key) {
            Some(entry) if entry.expires_at > now => Some(entry.url.clone()),
            Some(_) => {
                debug!("Identity cache entry expired: {:?}", key);
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Record an outcome with the TTL matching its kind
    pub fn insert(&self, key: IdentityKey, url: Option<String>) {
        let ttl = if url.is_some() {
            self.found_ttl
        } else {
            self.not_found_ttl
        };
        let entry = IdentityCacheEntry {
            url,
            expires_at: self.clock.now() + ttl,
        };
        self.entries().insert(key, entry);
    }

    /// Drop every expired entry, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    pub fn clear(&self) {
        self.entries().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn key() -> IdentityKey {
        IdentityKey::new("Neolokal", "Istanbul", None, None)
    }

    #[test]
    fn test_key_is_case_insensitive() {
        assert_eq!(
            IdentityKey::new("NEOLOKAL", " istanbul", Some(""), None),
            IdentityKey::new("Neolokal", "İstanbul", None, Some(" "))
        );
    }

    #[test]
    fn test_hit_and_negative_hit() {
        let cache = IdentityCache::default();
        assert_eq!(cache.get(&key()), None);

        cache.insert(key(), Some("https://www.instagram.com/neolokal/".to_string()));
        assert_eq!(
            cache.get(&key()),
            Some(Some("https://www.instagram.com/neolokal/".to_string()))
        );

        let other = IdentityKey::new("Nowhere", "Istanbul", None, None);
        cache.insert(other.clone(), None);
        assert_eq!(cache.get(&other), Some(None));
    }

    #[test]
    fn test_asymmetric_ttl() {
        let clock = Arc::new(ManualClock::default());
        let cache = IdentityCache::new(clock.clone());
        let missing = IdentityKey::new("Nowhere", "Istanbul", None, None);

        cache.insert(key(), Some("https://www.instagram.com/neolokal/".to_string()));
        cache.insert(missing.clone(), None);

        clock.advance(Duration::hours(23));
        assert_eq!(cache.get(&missing), Some(None));

        clock.advance(Duration::hours(2));
        assert_eq!(cache.get(&missing), None);
        assert!(cache.get(&key()).is_some());

        clock.advance(Duration::days(6));
        assert_eq!(cache.get(&key()), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_purge_expired() {
        let clock = Arc::new(ManualClock::default());
        let cache = IdentityCache::new(clock.clone());
        cache.insert(key(), Some("https://www.instagram.com/neolokal/".to_string()));
        cache.insert(IdentityKey::new("Nowhere", "Istanbul", None, None), None);

        clock.advance(Duration::days(2));
        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
    }
}
