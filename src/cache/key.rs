//! Cache key derivation for category + location

use crate::cache::types::CacheKey;
use crate::text::{non_empty, normalize_name};

/// Builds the stable key of a category/location pair
///
/// Segments are folded to ASCII, lowercased and have inner whitespace
/// replaced by `-`; absent or blank optional segments are omitted.
/// Delimiter characters inside a segment are percent-encoded.
pub struct CacheKeyBuilder {
    category: String,
    city: String,
    params: Vec<(&'static str, String)>,
}

impl CacheKeyBuilder {
    /// Create a new cache key builder
    pub fn new(category: impl AsRef<str>) -> Self {
        Self {
            category: Self::segment(category.as_ref()),
            city: String::new(),
            params: Vec::new(),
        }
    }

    /// Set the city
    pub fn city(mut self, city: impl AsRef<str>) -> Self {
        self.city = Self::segment(city.as_ref());
        self
    }

    /// Set the district, ignored when absent or blank
    pub fn district(self, district: Option<&str>) -> Self {
        self.param("district", district)
    }

    /// Set the neighborhood, ignored when absent or blank
    pub fn neighborhood(self, neighborhood: Option<&str>) -> Self {
        self.param("neighborhood", neighborhood)
    }

    fn param(mut self, name: &'static str, value: Option<&str>) -> Self {
        if let Some(value) = non_empty(value) {
            self.params.push((name, Self::segment(value)));
        }
        self
    }

    /// Build the cache key
    pub fn build(self) -> CacheKey {
        let mut key = format!("{}:{}", self.category, self.city);

        if !self.params.is_empty() {
            let params_str: Vec<String> = self
                .params
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            key.push_str(&format!("?{}", params_str.join("&")));
        }

        key
    }

    fn segment(value: &str) -> String {
        let mut segment = String::new();
        for c in normalize_name(value).chars() {
            match c {
                ' ' => segment.push('-'),
                // key delimiters are percent-encoded
                '%' | '&' | '=' | '?' | ':' => segment.push_str(&format!("%{:02X}", c as u32)),
                _ => segment.push(c),
            }
        }
        segment
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_without_optional_segments() {
        let key = CacheKeyBuilder::new("FineDining").city("Istanbul").build();
        assert_eq!(key, "finedining:istanbul");

        let key = CacheKeyBuilder::new("FineDining")
            .city("Istanbul")
            .district(Some(""))
            .neighborhood(None)
            .build();
        assert_eq!(key, "finedining:istanbul");
    }

    #[test]
    fn test_key_with_location() {
        let key = CacheKeyBuilder::new("Cafes")
            .city("İstanbul")
            .district(Some("Kadıköy"))
            .neighborhood(Some("Moda"))
            .build();
        assert_eq!(key, "cafes:istanbul?district=kadikoy&neighborhood=moda");
    }

    #[test]
    fn test_delimiters_in_segments_are_encoded() {
        let smuggled = CacheKeyBuilder::new("bars")
            .city("Ankara")
            .district(Some("a&neighborhood=b"))
            .build();
        let split = CacheKeyBuilder::new("bars")
            .city("Ankara")
            .district(Some("a"))
            .neighborhood(Some("b"))
            .build();
        assert_ne!(smuggled, split);
        assert_eq!(smuggled, "bars:ankara?district=a%26neighborhood%3Db");

        let key = CacheKeyBuilder::new("wine:bars").city("Izmir?x=1").build();
        assert_eq!(key, "wine%3Abars:izmir%3Fx%3D1");
        assert_ne!(key, CacheKeyBuilder::new("wine").city("bars:izmir?x=1").build());
    }

    #[test]
    fn test_key_is_stable_across_spelling() {
        let a = CacheKeyBuilder::new("Street Food")
            .city("  Izmir ")
            .district(Some("Karşıyaka"))
            .build();
        let b = CacheKeyBuilder::new("street   food")
            .city("izmir")
            .district(Some("KARSIYAKA"))
            .build();
        assert_eq!(a, b);
        assert_eq!(a, "street-food:izmir?district=karsiyaka");
    }
}
