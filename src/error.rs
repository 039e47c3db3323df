//! Error types for venue cache operations
//!
//! The variants mirror the failure taxonomy of the cache: provider failures
//! surface to callers only when no payload can be served, while search,
//! fetch and probe failures are absorbed by the enrichment chain.

use thiserror::Error;

/// Main error type for the venue cache
///
/// `Clone` so that a single refresh outcome can be handed to every caller
/// waiting on the same in-flight refresh.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VenueCacheError {
    /// External venue-generation provider failed
    #[error("Provider error: {0}")]
    ProviderError(String),

    /// Search API has no credentials, is over quota, or is down
    #[error("Search unavailable: {0}")]
    SearchUnavailable(String),

    /// Website fetch or probe exceeded its budget
    #[error("Fetch timed out after {timeout_ms}ms: {context}")]
    FetchTimeout { timeout_ms: u64, context: String },

    /// Non-timeout HTTP transport failure
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Cache store read/write failure
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Serialization/Deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The refresh task was cancelled or panicked before producing a result
    #[error("Refresh aborted: {0}")]
    RefreshAborted(String),

    /// Generic error with context
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for venue cache operations
pub type Result<T> = std::result::Result<T, VenueCacheError>;

impl VenueCacheError {
    /// Whether the error means the search step should be skipped entirely
    pub fn is_search_unavailable(&self) -> bool {
        matches!(self, VenueCacheError::SearchUnavailable(_))
    }
}

impl From<String> for VenueCacheError {
    fn from(s: String) -> Self {
        VenueCacheError::Other(s)
    }
}

impl From<&str> for VenueCacheError {
    fn from(s: &str) -> Self {
        VenueCacheError::Other(s.to_string())
    }
}

impl From<serde_json::Error> for VenueCacheError {
    fn from(e: serde_json::Error) -> Self {
        VenueCacheError::SerializationError(e.to_string())
    }
}

impl From<std::io::Error> for VenueCacheError {
    fn from(e: std::io::Error) -> Self {
        VenueCacheError::StorageError(e.to_string())
    }
}
