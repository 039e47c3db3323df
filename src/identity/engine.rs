//! Instagram profile resolution chain

use crate::config::DiscoveryConfig;
use crate::identity::cache::{IdentityCache, IdentityKey};
use crate::identity::probe::{first_accepted, HandleProbe, PlausibilityProbe};
use crate::identity::scoring::{extract_handle, first_profile_in_html, is_profile_url, profile_url, ScoringContext};
use crate::identity::scrape::WebsiteFetcher;
use crate::identity::search::{build_queries, SearchProvider};
use crate::identity::variants::username_variants;
use crate::model::IdentitySource;
use crate::text::non_empty;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// What the chain knows about a venue
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiscoveryRequest {
    pub name: String,
    pub city: String,
    pub website: Option<String>,
    /// Unconfirmed profile URL from an earlier step
    pub hint: Option<String>,
    pub district: Option<String>,
    pub neighborhood: Option<String>,
}

impl DiscoveryRequest {
    pub fn new(name: impl Into<String>, city: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            city: city.into(),
            ..Default::default()
        }
    }

    fn key(&self) -> IdentityKey {
        IdentityKey::new(
            &self.name,
            &self.city,
            self.district.as_deref(),
            self.neighborhood.as_deref(),
        )
    }
}

/// Outcome of a discovery; `url` is `None` exactly when `source` is `NotFound`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub url: Option<String>,
    pub verified: bool,
    pub source: IdentitySource,
}

impl Resolution {
    pub fn found(url: String, verified: bool, source: IdentitySource) -> Self {
        Self {
            url: Some(url),
            verified,
            source,
        }
    }

    pub fn not_found() -> Self {
        Self {
            url: None,
            verified: false,
            source: IdentitySource::NotFound,
        }
    }

    pub fn is_found(&self) -> bool {
        self.url.is_some()
    }
}

/// Resolves venues to Instagram profiles.
///
/// Steps run in order and the first success wins: local cache, scored
/// search, website scrape, hint, username guess. Search and website steps
/// are skipped when their collaborator is not configured.
pub struct IdentityDiscoveryEngine {
    cache: Arc<IdentityCache>,
    search: Option<Arc<dyn SearchProvider>>,
    fetcher: Option<Arc<dyn WebsiteFetcher>>,
    probe: Arc<dyn HandleProbe>,
    config: DiscoveryConfig,
}

impl IdentityDiscoveryEngine {
    pub fn new(cache: Arc<IdentityCache>, config: DiscoveryConfig) -> Self {
        Self {
            cache,
            search: None,
            fetcher: None,
            probe: Arc::new(PlausibilityProbe),
            config,
        }
    }

    pub fn with_search(mut self, search: Arc<dyn SearchProvider>) -> Self {
        self.search = Some(search);
        self
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn WebsiteFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn with_probe(mut self, probe: Arc<dyn HandleProbe>) -> Self {
        self.probe = probe;
        self
    }

    pub fn cache(&self) -> &Arc<IdentityCache> {
        &self.cache
    }

    /// Resolve `request`, caching the outcome whether found or not
    pub async fn discover(&self, request: &DiscoveryRequest) -> Resolution {
        if request.name.trim().is_empty() {
            return Resolution::not_found();
        }

        let key = request.key();
        match self.cache.get(&key) {
            Some(Some(url)) => {
                debug!("Identity cache hit for {}", request.name);
                return Resolution::found(url, true, IdentitySource::Cache);
            }
            Some(None) => {
                debug!("Identity cache negative hit for {}", request.name);
                return Resolution::not_found();
            }
            None => {}
        }

        let resolution = self.run_chain(request).await;
        self.cache.insert(key, resolution.url.clone());
        resolution
    }

    async fn run_chain(&self, request: &DiscoveryRequest) -> Resolution {
        if let Some(url) = self.from_search(request).await {
            return Resolution::found(url, true, IdentitySource::Search);
        }
        if let Some(url) = self.from_website(request).await {
            return Resolution::found(url, true, IdentitySource::Website);
        }
        if let Some(url) = Self::from_hint(request) {
            return Resolution::found(url, false, IdentitySource::Hint);
        }
        if let Some(url) = self.from_guess(request).await {
            return Resolution::found(url, false, IdentitySource::Guess);
        }
        debug!("No profile found for {}", request.name);
        Resolution::not_found()
    }

    async fn from_search(&self, request: &DiscoveryRequest) -> Option<String> {
        let search = self.search.as_ref()?;
        let context = ScoringContext::new(
            &request.name,
            &request.city,
            request.district.as_deref(),
            request.neighborhood.as_deref(),
        );
        let queries = build_queries(
            &request.name,
            &request.city,
            request.district.as_deref(),
            request.neighborhood.as_deref(),
            &self.config.profile_site,
        );

        // only the first sighting of a handle is scored
        let mut seen: HashSet<String> = HashSet::new();
        let mut best: Option<(i32, String)> = None;
        for query in &queries {
            let hits = match search.search(query).await {
                Ok(hits) => hits,
                Err(e) if e.is_search_unavailable() => {
                    warn!("Skipping search step for {}: {}", request.name, e);
                    break;
                }
                Err(e) => {
                    warn!("Search query '{}' failed: {}", query.text, e);
                    continue;
                }
            };

            for (rank, hit) in hits.iter().enumerate() {
                let Some(handle) = extract_handle(&hit.link) else {
                    continue;
                };
                if !seen.insert(handle.clone()) {
                    continue;
                }
                let score = context.score(&handle, hit, rank);
                if best.as_ref().map_or(true, |(top, _)| score > *top) {
                    best = Some((score, handle));
                }
            }
        }

        match best {
            Some((score, handle)) if score >= self.config.accept_threshold => {
                debug!("Search accepted @{} for {} (score {})", handle, request.name, score);
                Some(profile_url(&handle))
            }
            Some((score, handle)) => {
                debug!("Best search candidate @{} scored {}, below threshold", handle, score);
                None
            }
            None => None,
        }
    }

    async fn from_website(&self, request: &DiscoveryRequest) -> Option<String> {
        let fetcher = self.fetcher.as_ref()?;
        let website = non_empty(request.website.as_deref())?;

        match fetcher.fetch(website).await {
            Ok(Some(html)) => first_profile_in_html(&html).map(|handle| profile_url(&handle)),
            Ok(None) => None,
            Err(e) => {
                warn!("Website fetch for {} failed: {}", request.name, e);
                None
            }
        }
    }

    fn from_hint(request: &DiscoveryRequest) -> Option<String> {
        let hint = non_empty(request.hint.as_deref())?;
        if !is_profile_url(hint) {
            return None;
        }
        extract_handle(hint)
            .or_else(|| extract_handle(&format!("https://{}", hint)))
            .map(|handle| profile_url(&handle))
    }

    async fn from_guess(&self, request: &DiscoveryRequest) -> Option<String> {
        let candidates = username_variants(&request.name, &request.city);
        let handle = first_accepted(Arc::clone(&self.probe), candidates, self.config.probe).await?;
        Some(profile_url(&handle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Result, VenueCacheError};
    use crate::identity::search::{SearchHit, SearchQuery};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct RejectAll;

    #[async_trait]
    impl HandleProbe for RejectAll {
        async fn check(&self, _handle: &str) -> bool {
            false
        }
    }

    struct FixedSearch {
        hits: Vec<SearchHit>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SearchProvider for FixedSearch {
        async fn search(&self, _query: &SearchQuery) -> Result<Vec<SearchHit>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.hits.clone())
        }
    }

    struct FailingFetcher;

    #[async_trait]
    impl WebsiteFetcher for FailingFetcher {
        async fn fetch(&self, url: &str) -> Result<Option<String>> {
            Err(VenueCacheError::FetchTimeout {
                timeout_ms: 5000,
                context: url.to_string(),
            })
        }
    }

    fn engine() -> IdentityDiscoveryEngine {
        IdentityDiscoveryEngine::new(Arc::new(IdentityCache::default()), DiscoveryConfig::default())
            .with_probe(Arc::new(RejectAll))
    }

    #[tokio::test]
    async fn test_empty_name_skips_cache() {
        let engine = engine();
        let resolution = engine.discover(&DiscoveryRequest::new("  ", "Istanbul")).await;
        assert_eq!(resolution, Resolution::not_found());
        assert!(engine.cache().is_empty());
    }

    #[tokio::test]
    async fn test_hint_accepted_unverified() {
        let engine = engine();
        let mut request = DiscoveryRequest::new("Neolokal", "Istanbul");
        request.hint = Some("instagram.com/Neolokal".to_string());

        let resolution = engine.discover(&request).await;
        assert_eq!(resolution.url.as_deref(), Some("https://www.instagram.com/neolokal/"));
        assert!(!resolution.verified);
        assert_eq!(resolution.source, IdentitySource::Hint);
    }

    #[tokio::test]
    async fn test_post_link_hint_ignored() {
        let engine = engine();
        let mut request = DiscoveryRequest::new("Neolokal", "Istanbul");
        request.hint = Some("https://www.instagram.com/p/Cx1234/".to_string());
        request.website = Some("https://neolokal.com".to_string());

        let engine = engine.with_fetcher(Arc::new(FailingFetcher));
        let resolution = engine.discover(&request).await;
        assert_eq!(resolution.source, IdentitySource::NotFound);
    }

    #[tokio::test]
    async fn test_search_result_is_cached() {
        let search = Arc::new(FixedSearch {
            hits: vec![SearchHit {
                link: "https://www.instagram.com/neolokal/".to_string(),
                title: "Neolokal (@neolokal)".to_string(),
                snippet: "Istanbul".to_string(),
            }],
            calls: AtomicUsize::new(0),
        });
        let engine = engine().with_search(search.clone());
        let request = DiscoveryRequest::new("Neolokal", "Istanbul");

        let first = engine.discover(&request).await;
        assert_eq!(first.source, IdentitySource::Search);
        assert!(first.verified);
        let calls = search.calls.load(Ordering::SeqCst);
        assert!(calls > 0);

        let second = engine.discover(&request).await;
        assert_eq!(second.source, IdentitySource::Cache);
        assert_eq!(second.url, first.url);
        assert!(second.verified);
        assert_eq!(search.calls.load(Ordering::SeqCst), calls);
    }

    #[tokio::test]
    async fn test_guess_uses_probe() {
        let engine = IdentityDiscoveryEngine::new(Arc::new(IdentityCache::default()), DiscoveryConfig::default());
        let resolution = engine.discover(&DiscoveryRequest::new("Neolokal", "Istanbul")).await;

        let url = resolution.url.unwrap();
        assert!(url.starts_with("https://www.instagram.com/neolokal"));
        assert!(!resolution.verified);
        assert_eq!(resolution.source, IdentitySource::Guess);
    }
}
