//! Username probing with a bounded worker pool
//!
//! The profile host does not allow anonymous existence checks, so the
//! default probe is a plausibility heuristic over the handle text. It has a
//! known false-positive rate: it accepts handles that look like brand
//! handles, whether or not the account exists.

use crate::identity::variants::is_valid_handle;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Checks whether a candidate handle is worth accepting
#[async_trait]
pub trait HandleProbe: Send + Sync {
    async fn check(&self, handle: &str) -> bool;
}

/// Handles containing one of these are accepted outright
const DOMAIN_KEYWORDS: &[&str] = &[
    "coffee", "kahve", "cafe", "kafe", "roast", "espresso", "brew", "bakery", "firin", "patisserie",
    "pastane", "bistro", "kitchen", "mutfak", "lokanta", "meyhane", "restaurant", "restoran",
    "grill", "kebap", "kebab", "ocakbasi", "pizza", "burger", "sushi", "steak", "wine", "sarap",
    "bar", "food", "yemek", "sofra", "gastro", "chef",
];

/// Long handles are accepted only with one of these endings
const OFFICIAL_SUFFIXES: &[&str] = &[
    "official", "resmi", "tr", "turkey", "turkiye", "istanbul", "ist", "ankara", "izmir",
];

/// Handles up to this length are taken as brand handles
const SHORT_HANDLE_LEN: usize = 12;

/// Text-only plausibility check
#[derive(Debug, Clone, Copy, Default)]
pub struct PlausibilityProbe;

impl PlausibilityProbe {
    pub fn is_plausible(handle: &str) -> bool {
        if !is_valid_handle(handle) {
            return false;
        }
        if DOMAIN_KEYWORDS.iter().any(|k| handle.contains(k)) {
            return true;
        }
        if handle.len() <= SHORT_HANDLE_LEN {
            return true;
        }
        OFFICIAL_SUFFIXES.iter().any(|s| handle.ends_with(s))
    }
}

#[async_trait]
impl HandleProbe for PlausibilityProbe {
    async fn check(&self, handle: &str) -> bool {
        Self::is_plausible(handle)
    }
}

/// Bounds of one probing round
#[derive(Debug, Clone, Copy)]
pub struct ProbeLimits {
    /// Candidates probed at most
    pub max_candidates: usize,
    /// Probes running at once
    pub max_concurrent: usize,
    /// Wall-clock budget for the whole round
    pub budget: Duration,
}

impl Default for ProbeLimits {
    fn default() -> Self {
        Self {
            max_candidates: 6,
            max_concurrent: 3,
            budget: Duration::from_secs(10),
        }
    }
}

/// Probe candidates concurrently and return the first accepted handle.
///
/// When a handle is accepted or the budget runs out, probes still waiting
/// for a permit are cancelled and running ones are detached: they finish on
/// their own but are no longer awaited.
pub async fn first_accepted(
    probe: Arc<dyn HandleProbe>,
    candidates: Vec<String>,
    limits: ProbeLimits,
) -> Option<String> {
    if candidates.is_empty() || limits.max_candidates == 0 {
        return None;
    }

    let token = CancellationToken::new();
    let permits = Arc::new(Semaphore::new(limits.max_concurrent.max(1)));
    let mut probes = JoinSet::new();

    for handle in candidates.into_iter().take(limits.max_candidates) {
        let probe = Arc::clone(&probe);
        let permits = Arc::clone(&permits);
        let token = token.clone();

        probes.spawn(async move {
            let _permit = tokio::select! {
                _ = token.cancelled() => return None,
                permit = permits.acquire_owned() => permit.ok()?,
            };
            if token.is_cancelled() {
                return None;
            }
            if probe.check(&handle).await {
                Some(handle)
            } else {
                None
            }
        });
    }

    let deadline = Instant::now() + limits.budget;
    let accepted = loop {
        match tokio::time::timeout_at(deadline, probes.join_next()).await {
            Ok(Some(Ok(Some(handle)))) => break Some(handle),
            Ok(Some(Ok(None))) => continue,
            Ok(Some(Err(e))) => {
                debug!("Probe task failed: {}", e);
                continue;
            }
            Ok(None) => break None,
            Err(_) => {
                debug!("Probe budget of {:?} exhausted", limits.budget);
                break None;
            }
        }
    };

    token.cancel();
    probes.detach_all();
    accepted
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_plausibility_rules() {
        // length and charset
        assert!(!PlausibilityProbe::is_plausible("ab"));
        assert!(!PlausibilityProbe::is_plausible("has-dash"));
        assert!(!PlausibilityProbe::is_plausible(&"a".repeat(31)));
        // keyword
        assert!(PlausibilityProbe::is_plausible("verylongnamecoffeeroasters"));
        // short brand handle
        assert!(PlausibilityProbe::is_plausible("neolokal"));
        assert!(PlausibilityProbe::is_plausible("abcdefghijkl"));
        // long handles need a suffix
        assert!(!PlausibilityProbe::is_plausible("abcdefghijklm"));
        assert!(PlausibilityProbe::is_plausible("abcdefghijklm_official"));
        assert!(PlausibilityProbe::is_plausible("abcdefghijklmist"));
    }

    struct SlowProbe {
        accept: &'static str,
        delay: Duration,
        running: AtomicUsize,
        peak: AtomicUsize,
        calls: AtomicUsize,
    }

    impl SlowProbe {
        fn new(accept: &'static str, delay: Duration) -> Self {
            Self {
                accept,
                delay,
                running: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl HandleProbe for SlowProbe {
        async fn check(&self, handle: &str) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.running.fetch_sub(1, Ordering::SeqCst);
            handle == self.accept
        }
    }

    fn candidates(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("handle{}", i)).collect()
    }

    #[tokio::test]
    async fn test_finds_accepted_handle_with_bounded_concurrency() {
        let probe = Arc::new(SlowProbe::new("handle4", Duration::from_millis(20)));
        let found = first_accepted(probe.clone(), candidates(8), ProbeLimits::default()).await;

        assert_eq!(found.as_deref(), Some("handle4"));
        assert!(probe.peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn test_only_first_six_candidates_probed() {
        let probe = Arc::new(SlowProbe::new("handle7", Duration::from_millis(1)));
        let found = first_accepted(probe.clone(), candidates(8), ProbeLimits::default()).await;

        assert!(found.is_none());
        assert_eq!(probe.calls.load(Ordering::SeqCst), 6);
    }

    #[tokio::test]
    async fn test_budget_abandons_slow_probes() {
        let probe = Arc::new(SlowProbe::new("handle0", Duration::from_secs(30)));
        let limits = ProbeLimits {
            budget: Duration::from_millis(50),
            ..Default::default()
        };

        let started = std::time::Instant::now();
        let found = first_accepted(probe, candidates(6), limits).await;
        assert!(found.is_none());
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_empty_candidates() {
        let found = first_accepted(Arc::new(PlausibilityProbe), Vec::new(), ProbeLimits::default()).await;
        assert!(found.is_none());
    }
}
