//! Venue data model

use crate::cache::key::CacheKeyBuilder;
use crate::cache::types::CacheKey;
use crate::text::non_empty;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// A single venue as produced by the venue-generation provider
///
/// Named fields cover what the cache and enrichment pipeline read or write;
/// everything else the provider sends is kept verbatim in `extra`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VenueRecord {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neighborhood: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,

    /// Instagram profile URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instagram: Option<String>,

    /// True when the URL was confirmed by search, site content, cache or the award registry
    #[serde(default)]
    pub instagram_verified: bool,

    /// Which discovery step produced `instagram`; set once resolution has run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instagram_source: Option<IdentitySource>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_level: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cuisine: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub award_tier: Option<AwardTier>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub award: Option<String>,

    /// Provider-specific attributes
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VenueRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_website(mut self, website: impl Into<String>) -> Self {
        self.website = Some(website.into());
        self
    }

    pub fn with_instagram(mut self, url: impl Into<String>) -> Self {
        self.instagram = Some(url.into());
        self
    }

    pub fn with_location(mut self, district: Option<&str>, neighborhood: Option<&str>) -> Self {
        self.district = non_empty(district).map(str::to_string);
        self.neighborhood = non_empty(neighborhood).map(str::to_string);
        self
    }

    /// Instagram URL, if present and non-blank
    pub fn instagram_url(&self) -> Option<&str> {
        non_empty(self.instagram.as_deref())
    }
}

/// Origin of a resolved (or unresolved) Instagram profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentitySource {
    /// Known handle from the award registry
    Award,
    /// Local identity cache
    Cache,
    /// Scored web search
    Search,
    /// Link found on the venue's own website
    Website,
    /// Unconfirmed URL passed in by an upstream step
    Hint,
    /// Username heuristic
    Guess,
    /// Every step came up empty
    NotFound,
}

impl fmt::Display for IdentitySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            IdentitySource::Award => "award",
            IdentitySource::Cache => "cache",
            IdentitySource::Search => "search",
            IdentitySource::Website => "website",
            IdentitySource::Hint => "hint",
            IdentitySource::Guess => "guess",
            IdentitySource::NotFound => "not_found",
        };
        f.write_str(label)
    }
}

/// Rating scheme of an award tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TierKind {
    Toque,
    Star,
}

/// Award tier, e.g. three toques or one star
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AwardTier {
    pub kind: TierKind,
    pub level: u8,
}

impl fmt::Display for AwardTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = match self.kind {
            TierKind::Toque => "toque",
            TierKind::Star => "star",
        };
        let plural = if self.level == 1 { "" } else { "s" };
        write!(f, "{} {}{}", self.level, unit, plural)
    }
}

/// Entry of the static award registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AwardRecord {
    pub name: String,
    pub tier: AwardTier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub award: Option<String>,
    /// Known Instagram handle, without the leading `@`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instagram: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
}

/// The key space of the venue cache: one category in one place
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheLocation {
    pub category: String,
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neighborhood: Option<String>,
}

impl CacheLocation {
    pub fn new(category: impl Into<String>, city: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            city: city.into(),
            district: None,
            neighborhood: None,
        }
    }

    pub fn district(mut self, district: Option<&str>) -> Self {
        self.district = non_empty(district).map(str::to_string);
        self
    }

    pub fn neighborhood(mut self, neighborhood: Option<&str>) -> Self {
        self.neighborhood = non_empty(neighborhood).map(str::to_string);
        self
    }

    /// Stable cache key for this location
    pub fn cache_key(&self) -> CacheKey {
        CacheKeyBuilder::new(&self.category)
            .city(&self.city)
            .district(self.district.as_deref())
            .neighborhood(self.neighborhood.as_deref())
            .build()
    }
}

impl fmt::Display for CacheLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} in {}", self.category, self.city)?;
        if let Some(district) = &self.district {
            write!(f, "/{}", district)?;
        }
        if let Some(neighborhood) = &self.neighborhood {
            write!(f, "/{}", neighborhood)?;
        }
        Ok(())
    }
}

/// A request to the venue-generation provider
///
/// Filters are forwarded to the provider but do not take part in the cache key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VenueQuery {
    pub location: CacheLocation,
    #[serde(default)]
    pub filters: BTreeMap<String, String>,
}

impl VenueQuery {
    pub fn new(location: CacheLocation) -> Self {
        Self {
            location,
            filters: BTreeMap::new(),
        }
    }

    pub fn filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(key.into(), value.into());
        self
    }
}

impl From<CacheLocation> for VenueQuery {
    fn from(location: CacheLocation) -> Self {
        Self::new(location)
    }
}
