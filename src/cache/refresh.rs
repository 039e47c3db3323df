//! Stale-while-revalidate refresh coordination
//!
//! The coordinator owns a slot table mapping each key to the shared result of
//! its in-flight refresh. At most one refresh per key runs at any time:
//! - stale reads start a refresh only if none is running and never wait on it
//! - expired reads and misses join the running refresh, or start one, and wait
//!
//! Refreshes run as spawned tasks so that they finish even if every waiter
//! goes away. A drop guard inside the task releases the slot on success,
//! failure or panic.

use crate::cache::{
    entry::WriteKind,
    freshness::{FreshnessPolicy, FreshnessState},
    store::VenueStore,
    types::CacheKey,
};
use crate::clock::Clock;
use crate::enrichment::EnrichmentPipeline;
use crate::error::{Result, VenueCacheError};
use crate::model::{VenueQuery, VenueRecord};
use crate::provider::VenueProvider;
use futures::future::{BoxFuture, FutureExt, Shared};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tracing::{debug, info, warn};

type RefreshOutcome = std::result::Result<Vec<VenueRecord>, VenueCacheError>;
type SharedRefresh = Shared<BoxFuture<'static, RefreshOutcome>>;

/// Result of a freshness-aware read
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CachedVenues {
    pub venues: Vec<VenueRecord>,

    /// Band observed when the entry was read; a miss reports `Expired`
    pub state: FreshnessState,

    /// The venues come from a refresh completed during this call
    pub refreshed: bool,

    /// This call started a background refresh
    pub refresh_scheduled: bool,

    /// Refresh failed and an expired payload was served instead
    pub degraded: bool,
}

impl CachedVenues {
    fn served(venues: Vec<VenueRecord>, state: FreshnessState, refresh_scheduled: bool) -> Self {
        Self {
            venues,
            state,
            refreshed: false,
            refresh_scheduled,
            degraded: false,
        }
    }

    fn refreshed(venues: Vec<VenueRecord>) -> Self {
        Self {
            venues,
            state: FreshnessState::Expired,
            refreshed: true,
            refresh_scheduled: false,
            degraded: false,
        }
    }

    fn degraded(venues: Vec<VenueRecord>) -> Self {
        Self {
            venues,
            state: FreshnessState::Expired,
            refreshed: false,
            refresh_scheduled: false,
            degraded: true,
        }
    }
}

struct RefreshSlot {
    generation: u64,
    outcome: SharedRefresh,
}

struct CoordinatorInner {
    store: Arc<dyn VenueStore>,
    provider: Arc<dyn VenueProvider>,
    pipeline: Arc<EnrichmentPipeline>,
    policy: FreshnessPolicy,
    clock: Arc<dyn Clock>,
    slots: Mutex<HashMap<CacheKey, RefreshSlot>>,
    generations: AtomicU64,
}

impl CoordinatorInner {
    fn slots(&self) -> MutexGuard<'_, HashMap<CacheKey, RefreshSlot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Remove the slot for `key` if it still belongs to `generation`
    fn release(&self, key: &str, generation: u64) {
        let mut slots = self.slots();
        if slots.get(key).is_some_and(|slot| slot.generation == generation) {
            slots.remove(key);
            debug!("Released refresh slot: {}", key);
        }
    }

    async fn refresh(&self, query: &VenueQuery) -> RefreshOutcome {
        let started = Instant::now();
        info!("Refreshing venues for {}", query.location);

        let raw = self.provider.generate(query).await?;
        if raw.is_empty() {
            return Err(VenueCacheError::ProviderError(format!(
                "no venues returned for {}",
                query.location
            )));
        }

        let venues = self.pipeline.enrich_all(raw, &query.location).await;
        let entry = self
            .store
            .upsert(&query.location, venues, WriteKind::Refresh, self.clock.now())
            .await?;

        info!(
            "Refreshed {} ({} venues, {}ms)",
            entry.key,
            entry.payload.len(),
            started.elapsed().as_millis()
        );
        Ok(entry.payload)
    }
}

/// Releases a refresh slot when the refresh task ends, however it ends
struct SlotGuard {
    inner: Arc<CoordinatorInner>,
    key: CacheKey,
    generation: u64,
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        self.inner.release(&self.key, self.generation);
    }
}

/// Serves venues from the store and keeps them fresh
#[derive(Clone)]
pub struct RefreshCoordinator {
    inner: Arc<CoordinatorInner>,
}

impl RefreshCoordinator {
    pub fn new(
        store: Arc<dyn VenueStore>,
        provider: Arc<dyn VenueProvider>,
        pipeline: Arc<EnrichmentPipeline>,
        policy: FreshnessPolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            inner: Arc::new(CoordinatorInner {
                store,
                provider,
                pipeline,
                policy,
                clock,
                slots: Mutex::new(HashMap::new()),
                generations: AtomicU64::new(0),
            }),
        }
    }

    /// Freshness-aware read
    ///
    /// Fails only when no entry exists for the key and the refresh fails.
    pub async fn get_fresh(&self, query: &VenueQuery) -> Result<CachedVenues> {
        let key = query.location.cache_key();
        let now = self.inner.clock.now();

        let Some(entry) = self.inner.store.read(&key).await? else {
            debug!("Cache miss: {}", key);
            let venues = self.refresh_now(query).await?;
            return Ok(CachedVenues::refreshed(venues));
        };

        match entry.freshness(&self.inner.policy, now) {
            FreshnessState::Fresh => {
                debug!("Cache hit (fresh): {}", key);
                Ok(CachedVenues::served(entry.payload, FreshnessState::Fresh, false))
            }
            FreshnessState::Stale => {
                let scheduled = self.schedule_refresh(query);
                debug!("Cache hit (stale, refresh scheduled: {}): {}", scheduled, key);
                Ok(CachedVenues::served(entry.payload, FreshnessState::Stale, scheduled))
            }
            FreshnessState::Expired => match self.refresh_now(query).await {
                Ok(venues) => Ok(CachedVenues::refreshed(venues)),
                Err(e) => {
                    warn!("Serving expired venues for {} after failed refresh: {}", key, e);
                    Ok(CachedVenues::degraded(entry.payload))
                }
            },
        }
    }

    /// Start a background refresh unless one is already running for the key.
    ///
    /// Returns whether a new refresh was started. Failures are logged by the
    /// refresh task and never reach the caller.
    pub fn schedule_refresh(&self, query: &VenueQuery) -> bool {
        let (_, started) = self.join_refresh(query);
        started
    }

    /// Join the running refresh for the key, or start one, and wait for it
    pub async fn refresh_now(&self, query: &VenueQuery) -> Result<Vec<VenueRecord>> {
        let (outcome, _) = self.join_refresh(query);
        outcome.await
    }

    /// Number of refreshes currently running
    pub fn in_flight(&self) -> usize {
        self.inner.slots().len()
    }

    /// Whether a refresh is running for `key`
    pub fn is_refreshing(&self, key: &str) -> bool {
        self.inner.slots().contains_key(key)
    }

    pub fn policy(&self) -> &FreshnessPolicy {
        &self.inner.policy
    }

    pub fn store(&self) -> &Arc<dyn VenueStore> {
        &self.inner.store
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.inner.clock
    }

    fn join_refresh(&self, query: &VenueQuery) -> (SharedRefresh, bool) {
        let key = query.location.cache_key();
        let mut slots = self.inner.slots();

        if let Some(slot) = slots.get(&key) {
            debug!("Joining in-flight refresh: {}", key);
            return (slot.outcome.clone(), false);
        }

        let generation = self.inner.generations.fetch_add(1, Ordering::Relaxed);
        let inner = Arc::clone(&self.inner);
        let task_key = key.clone();
        let query = query.clone();

        // Releasing takes the slot lock, so the task cannot release before the insert below.
        let handle = tokio::spawn(async move {
            let _guard = SlotGuard {
                inner: Arc::clone(&inner),
                key: task_key,
                generation,
            };
            let outcome = inner.refresh(&query).await;
            if let Err(e) = &outcome {
                warn!("Refresh failed for {}: {}", query.location, e);
            }
            outcome
        });

        let outcome = async move {
            match handle.await {
                Ok(outcome) => outcome,
                Err(e) => Err(VenueCacheError::RefreshAborted(e.to_string())),
            }
        }
        .boxed()
        .shared();

        slots.insert(
            key,
            RefreshSlot {
                generation,
                outcome: outcome.clone(),
            },
        );
        (outcome, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::store::MemoryVenueStore;
    use crate::clock::ManualClock;
    use crate::enrichment::awards::AwardRegistry;
    use crate::model::CacheLocation;
    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use std::sync::atomic::AtomicUsize;

    struct CountingProvider {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl VenueProvider for CountingProvider {
        async fn generate(&self, _query: &VenueQuery) -> Result<Vec<VenueRecord>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            if self.fail {
                return Err(VenueCacheError::ProviderError("provider down".to_string()));
            }
            Ok(vec![VenueRecord::new(format!("venue-{}", call))])
        }
    }

    fn coordinator(
        fail: bool,
    ) -> (RefreshCoordinator, Arc<CountingProvider>, Arc<MemoryVenueStore>, Arc<ManualClock>) {
        let provider = Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
            fail,
        });
        let store = Arc::new(MemoryVenueStore::new());
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let pipeline = Arc::new(EnrichmentPipeline::new(Arc::new(AwardRegistry::default())));
        let coordinator = RefreshCoordinator::new(
            store.clone(),
            provider.clone(),
            pipeline,
            FreshnessPolicy::default(),
            clock.clone(),
        );
        (coordinator, provider, store, clock)
    }

    fn query() -> VenueQuery {
        VenueQuery::new(CacheLocation::new("Bars", "Ankara"))
    }

    #[tokio::test]
    async fn test_miss_refreshes_synchronously() {
        let (coordinator, provider, store, _) = coordinator(false);

        let result = coordinator.get_fresh(&query()).await.unwrap();
        assert!(result.refreshed);
        assert_eq!(result.state, FreshnessState::Expired);
        assert_eq!(result.venues[0].name, "venue-1");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert!(store.read("bars:ankara").await.unwrap().is_some());
        assert_eq!(coordinator.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_fresh_hit_does_not_refresh() {
        let (coordinator, provider, _, _) = coordinator(false);
        coordinator.get_fresh(&query()).await.unwrap();

        let result = coordinator.get_fresh(&query()).await.unwrap();
        assert_eq!(result.state, FreshnessState::Fresh);
        assert!(!result.refreshed);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_miss_with_failing_provider_errors() {
        let (coordinator, _, _, _) = coordinator(true);

        let result = coordinator.get_fresh(&query()).await;
        assert!(matches!(result, Err(VenueCacheError::ProviderError(_))));
        assert_eq!(coordinator.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_expired_with_failing_provider_is_degraded() {
        let (coordinator, _, store, clock) = coordinator(true);
        store
            .upsert(
                &query().location,
                vec![VenueRecord::new("old")],
                WriteKind::Manual,
                clock.now(),
            )
            .await
            .unwrap();
        clock.advance(Duration::hours(100));

        let result = coordinator.get_fresh(&query()).await.unwrap();
        assert!(result.degraded);
        assert_eq!(result.state, FreshnessState::Expired);
        assert_eq!(result.venues[0].name, "old");
    }

    #[tokio::test]
    async fn test_stale_schedules_once() {
        let (coordinator, provider, store, clock) = coordinator(false);
        store
            .upsert(&query().location, vec![VenueRecord::new("old")], WriteKind::Refresh, clock.now())
            .await
            .unwrap();
        clock.advance(Duration::hours(30));

        let first = coordinator.get_fresh(&query()).await.unwrap();
        let second = coordinator.get_fresh(&query()).await.unwrap();

        assert_eq!(first.state, FreshnessState::Stale);
        assert_eq!(first.venues[0].name, "old");
        assert!(first.refresh_scheduled);
        assert!(!second.refresh_scheduled);

        let refreshed = coordinator.refresh_now(&query()).await.unwrap();
        assert_eq!(refreshed[0].name, "venue-1");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_provider_result_is_not_written() {
        struct EmptyProvider;

        #[async_trait]
        impl VenueProvider for EmptyProvider {
            async fn generate(&self, _query: &VenueQuery) -> Result<Vec<VenueRecord>> {
                Ok(Vec::new())
            }
        }

        let store = Arc::new(MemoryVenueStore::new());
        let coordinator = RefreshCoordinator::new(
            store.clone(),
            Arc::new(EmptyProvider),
            Arc::new(EnrichmentPipeline::new(Arc::new(AwardRegistry::default()))),
            FreshnessPolicy::default(),
            Arc::new(ManualClock::default()),
        );

        assert!(coordinator.get_fresh(&query()).await.is_err());
        assert!(store.entries().await.unwrap().is_empty());
    }
}
