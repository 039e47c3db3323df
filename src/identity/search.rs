//! Web search collaborator used to find profile URLs

use crate::config::SearchConfig;
use crate::error::{Result, VenueCacheError};
use crate::text::non_empty;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

/// One organic search result
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SearchHit {
    pub link: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub snippet: String,
}

/// A search query, optionally restricted to one site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub text: String,
    pub site: Option<String>,
}

impl SearchQuery {
    pub fn restricted(text: impl Into<String>, site: &str) -> Self {
        Self {
            text: text.into(),
            site: Some(site.to_string()),
        }
    }

    pub fn open(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            site: None,
        }
    }
}

/// Search backend
///
/// Implementations return [`VenueCacheError::SearchUnavailable`] when the
/// backend cannot be used at all (no credentials, quota exhausted) so the
/// caller can skip the remaining queries.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchHit>>;
}

/// Queries for a venue, most specific first.
///
/// Site-restricted queries come first, followed by two unrestricted ones
/// that mention the profile host by name.
pub fn build_queries(
    name: &str,
    city: &str,
    district: Option<&str>,
    neighborhood: Option<&str>,
    site: &str,
) -> Vec<SearchQuery> {
    let name = name.trim();
    let city = city.trim();
    let mut queries = Vec::new();

    if !city.is_empty() {
        queries.push(SearchQuery::restricted(format!("\"{}\" {}", name, city), site));
        queries.push(SearchQuery::restricted(format!("{} {}", name, city), site));
    }
    if let Some(neighborhood) = non_empty(neighborhood) {
        queries.push(SearchQuery::restricted(format!("{} {}", name, neighborhood), site));
    }
    if let Some(district) = non_empty(district) {
        queries.push(SearchQuery::restricted(format!("{} {}", name, district), site));
    }
    queries.push(SearchQuery::restricted(format!("\"{}\"", name), site));

    if !city.is_empty() {
        queries.push(SearchQuery::open(format!("{} {} instagram", name, city)));
    }
    queries.push(SearchQuery::open(format!("{} instagram", name)));

    let mut seen = std::collections::HashSet::new();
    queries.retain(|q| seen.insert((q.text.to_lowercase(), q.site.clone())));
    queries
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchHit>,
}

/// Google Custom Search JSON API client
pub struct GoogleSearchClient {
    http: reqwest::Client,
    config: SearchConfig,
}

impl GoogleSearchClient {
    pub fn new(config: SearchConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| VenueCacheError::HttpError(e.to_string()))?;
        Ok(Self { http, config })
    }

    fn credentials(&self) -> Result<(&str, &str)> {
        let key = non_empty(self.config.api_key.as_deref());
        let engine = non_empty(self.config.engine_id.as_deref());
        match (key, engine) {
            (Some(key), Some(engine)) => Ok((key, engine)),
            _ => Err(VenueCacheError::SearchUnavailable(
                "search API key or engine id not configured".to_string(),
            )),
        }
    }

    fn map_http_error(&self, err: reqwest::Error, query: &SearchQuery) -> VenueCacheError {
        if err.is_timeout() {
            return VenueCacheError::FetchTimeout {
                timeout_ms: self.config.timeout.as_millis() as u64,
                context: format!("search '{}'", query.text),
            };
        }
        VenueCacheError::HttpError(err.to_string())
    }
}

#[async_trait]
impl SearchProvider for GoogleSearchClient {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchHit>> {
        let (key, engine) = self.credentials()?;

        let mut params = vec![
            ("key", key.to_string()),
            ("cx", engine.to_string()),
            ("q", query.text.clone()),
            ("num", self.config.results_per_query.to_string()),
        ];
        if let Some(site) = &query.site {
            params.push(("siteSearch", site.clone()));
            params.push(("siteSearchFilter", "i".to_string()));
        }

        let response = self
            .http
            .get(&self.config.endpoint)
            .query(&params)
            .send()
            .await
            .map_err(|e| self.map_http_error(e, query))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS
            || status == StatusCode::FORBIDDEN
            || status == StatusCode::UNAUTHORIZED
        {
            return Err(VenueCacheError::SearchUnavailable(format!(
                "search API returned {}",
                status
            )));
        }
        if !status.is_success() {
            return Err(VenueCacheError::HttpError(format!(
                "search API returned {} for '{}'",
                status, query.text
            )));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| VenueCacheError::SerializationError(e.to_string()))?;
        debug!("Search '{}' returned {} results", query.text, body.items.len());
        Ok(body.items)
    }
}
