//! Venue website fetching for profile-link extraction

use crate::error::{Result, VenueCacheError};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

/// Fetches a page body
///
/// `Ok(None)` means the page answered but not with 200.
#[async_trait]
pub trait WebsiteFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Option<String>>;
}

/// `reqwest` fetcher with a browser-like user agent
pub struct HttpWebsiteFetcher {
    http: reqwest::Client,
    timeout: Duration,
}

impl HttpWebsiteFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| VenueCacheError::HttpError(e.to_string()))?;
        Ok(Self { http, timeout })
    }
}

/// Prefix bare hosts with https
pub fn normalize_website(url: &str) -> String {
    let url = url.trim();
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{}", url.trim_start_matches("//"))
    }
}

#[async_trait]
impl WebsiteFetcher for HttpWebsiteFetcher {
    async fn fetch(&self, url: &str) -> Result<Option<String>> {
        let url = normalize_website(url);
        let response = self.http.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                VenueCacheError::FetchTimeout {
                    timeout_ms: self.timeout.as_millis() as u64,
                    context: url.clone(),
                }
            } else {
                VenueCacheError::HttpError(e.to_string())
            }
        })?;

        if response.status() != reqwest::StatusCode::OK {
            debug!("Website {} answered {}", url, response.status());
            return Ok(None);
        }

        let body = response
            .text()
            .await
            .map_err(|e| VenueCacheError::HttpError(e.to_string()))?;
        Ok(Some(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_website() {
        assert_eq!(normalize_website("neolokal.com"), "https://neolokal.com");
        assert_eq!(normalize_website(" http://neolokal.com "), "http://neolokal.com");
        assert_eq!(normalize_website("//neolokal.com/menu"), "https://neolokal.com/menu");
    }

    #[test]
    fn test_fetcher_builds() {
        assert!(HttpWebsiteFetcher::new(Duration::from_secs(5)).is_ok());
    }
}
