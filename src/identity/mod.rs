//! Instagram identity discovery
//!
//! Resolves a venue to a profile URL through a chain of increasingly
//! speculative steps, caching every outcome.

pub mod cache;
pub mod engine;
pub mod probe;
pub mod scoring;
pub mod scrape;
pub mod search;
pub mod variants;

pub use cache::{IdentityCache, IdentityKey};
pub use engine::{DiscoveryRequest, IdentityDiscoveryEngine, Resolution};
pub use probe::{HandleProbe, PlausibilityProbe, ProbeLimits};
pub use scrape::{HttpWebsiteFetcher, WebsiteFetcher};
pub use search::{GoogleSearchClient, SearchHit, SearchProvider, SearchQuery};
pub use variants::username_variants;
