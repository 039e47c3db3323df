//! Venue cache stores
//!
//! A store holds one [`CacheEntry`] per key. Writes replace the whole payload
//! at once; no reader ever sees a mix of old and new venues.

use crate::cache::{
    entry::{CacheEntry, WriteKind},
    freshness::FreshnessPolicy,
    types::{CacheKey, CacheStats, PurgeScope},
};
use crate::error::{Result, VenueCacheError};
use crate::model::{CacheLocation, VenueRecord};
use crate::text::normalize_name;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Persistence contract of the venue cache
#[async_trait]
pub trait VenueStore: Send + Sync {
    /// Read the entry for `key`
    async fn read(&self, key: &str) -> Result<Option<CacheEntry>>;

    /// Atomically replace the payload for `location`, creating the entry if needed
    async fn upsert(
        &self,
        location: &CacheLocation,
        payload: Vec<VenueRecord>,
        kind: WriteKind,
        now: DateTime<Utc>,
    ) -> Result<CacheEntry>;

    /// Snapshot of every entry
    async fn entries(&self) -> Result<Vec<CacheEntry>>;

    /// Remove entries in `scope`, returning how many were removed
    async fn purge(&self, scope: &PurgeScope) -> Result<usize>;

    /// Entry counts per category and freshness band at `now`
    async fn stats(&self, policy: &FreshnessPolicy, now: DateTime<Utc>) -> Result<CacheStats> {
        let mut stats = CacheStats::default();
        for entry in self.entries().await? {
            stats.record(&entry.category, entry.freshness(policy, now), entry.payload.len());
        }
        Ok(stats)
    }
}

/// Apply an upsert to an in-memory map
fn upsert_entry(
    entries: &mut HashMap<CacheKey, CacheEntry>,
    location: &CacheLocation,
    payload: Vec<VenueRecord>,
    kind: WriteKind,
    now: DateTime<Utc>,
) -> CacheEntry {
    let key = location.cache_key();
    match entries.get_mut(&key) {
        Some(existing) => {
            debug!("Replacing cache entry: {}", key);
            existing.replace_payload(payload, kind, now);
            existing.clone()
        }
        None => {
            debug!("Creating cache entry: {}", key);
            let entry = CacheEntry::new(location, payload, kind, now);
            entries.insert(key, entry.clone());
            entry
        }
    }
}

/// Remove entries matching `scope` from an in-memory map
fn purge_entries(entries: &mut HashMap<CacheKey, CacheEntry>, scope: &PurgeScope) -> usize {
    let before = entries.len();
    match scope {
        PurgeScope::All => entries.clear(),
        PurgeScope::Category(category) => {
            let wanted = normalize_name(category);
            entries.retain(|_, entry| normalize_name(&entry.category) != wanted);
        }
    }
    before - entries.len()
}

/// Volatile store for tests and single-process deployments
#[derive(Default)]
pub struct MemoryVenueStore {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
}

impl MemoryVenueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VenueStore for MemoryVenueStore {
    async fn read(&self, key: &str) -> Result<Option<CacheEntry>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn upsert(
        &self,
        location: &CacheLocation,
        payload: Vec<VenueRecord>,
        kind: WriteKind,
        now: DateTime<Utc>,
    ) -> Result<CacheEntry> {
        let mut entries = self.entries.write().await;
        Ok(upsert_entry(&mut entries, location, payload, kind, now))
    }

    async fn entries(&self) -> Result<Vec<CacheEntry>> {
        Ok(self.entries.read().await.values().cloned().collect())
    }

    async fn purge(&self, scope: &PurgeScope) -> Result<usize> {
        let mut entries = self.entries.write().await;
        let removed = purge_entries(&mut entries, scope);
        info!("Purged {} cache entries ({})", removed, scope);
        Ok(removed)
    }
}

/// Store persisted as a single JSON document
///
/// The document is mirrored in memory. Every mutation rewrites a sibling
/// temp file and renames it over the target while holding the write lock,
/// so the file on disk is always a complete snapshot.
pub struct FileVenueStore {
    path: PathBuf,
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
}

impl FileVenueStore {
    /// Open the store at `path`, loading existing entries if the file exists
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let entries = match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let list: Vec<CacheEntry> = serde_json::from_slice(&bytes)?;
                list.into_iter().map(|e| (e.key.clone(), e)).collect()
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                return Err(VenueCacheError::StorageError(format!(
                    "failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        info!("Opened venue store at {} ({} entries)", path.display(), entries.len());

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, entries: &HashMap<CacheKey, CacheEntry>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let mut list: Vec<&CacheEntry> = entries.values().collect();
        list.sort_by(|a, b| a.key.cmp(&b.key));
        let bytes = serde_json::to_vec_pretty(&list)?;

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl VenueStore for FileVenueStore {
    async fn read(&self, key: &str) -> Result<Option<CacheEntry>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn upsert(
        &self,
        location: &CacheLocation,
        payload: Vec<VenueRecord>,
        kind: WriteKind,
        now: DateTime<Utc>,
    ) -> Result<CacheEntry> {
        let mut entries = self.entries.write().await;
        let mut next = entries.clone();
        let entry = upsert_entry(&mut next, location, payload, kind, now);
        self.persist(&next).await?;
        *entries = next;
        Ok(entry)
    }

    async fn entries(&self) -> Result<Vec<CacheEntry>> {
        Ok(self.entries.read().await.values().cloned().collect())
    }

    async fn purge(&self, scope: &PurgeScope) -> Result<usize> {
        let mut entries = self.entries.write().await;
        let mut next = entries.clone();
        let removed = purge_entries(&mut next, scope);
        if removed > 0 {
            self.persist(&next).await?;
            *entries = next;
        }
        info!("Purged {} cache entries ({})", removed, scope);
        Ok(removed)
    }
}
