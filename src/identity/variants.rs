//! Candidate Instagram usernames derived from a venue name

use crate::text::words;
use std::collections::HashSet;

/// Most candidates returned by [`username_variants`]
pub const MAX_VARIANTS: usize = 10;

pub const MIN_HANDLE_LEN: usize = 3;
pub const MAX_HANDLE_LEN: usize = 30;

/// Generic venue-type words that rarely appear in a brand handle
const STOPWORDS: &[&str] = &[
    "the", "and", "of", "by", "a", "an", "ve", "restaurant", "restoran", "restaurante", "cafe",
    "kafe", "coffee", "bar", "pub", "house", "evi", "lokanta", "lokantasi", "kitchen", "mutfak",
    "bistro", "meyhane", "meyhanesi", "grill", "steakhouse", "shop", "co", "company",
];

/// Short forms used for Turkish cities in handles
const CITY_ABBREVIATIONS: &[(&str, &str)] = &[
    ("istanbul", "ist"),
    ("ankara", "ank"),
    ("izmir", "izm"),
    ("antalya", "ayt"),
    ("bodrum", "bdr"),
    ("bursa", "brs"),
];

/// Whether `handle` is a well-formed lowercase candidate
pub fn is_valid_handle(handle: &str) -> bool {
    (MIN_HANDLE_LEN..=MAX_HANDLE_LEN).contains(&handle.len())
        && handle
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' || c == '_')
}

/// Abbreviation of a city for handle suffixes
pub fn city_abbreviation(city: &str) -> Option<String> {
    let city: String = words(city).concat();
    if city.is_empty() {
        return None;
    }
    let abbreviation = CITY_ABBREVIATIONS
        .iter()
        .find(|(name, _)| *name == city)
        .map(|(_, abbr)| abbr.to_string())
        .unwrap_or_else(|| city.chars().take(3).collect());
    Some(abbreviation)
}

/// Generate up to [`MAX_VARIANTS`] plausible handles for a venue.
///
/// Candidates are unique, match `[a-z0-9_.]{3,30}` and are ordered
/// shortest first.
pub fn username_variants(name: &str, city: &str) -> Vec<String> {
    let all_words = words(name);
    let significant: Vec<&str> = all_words
        .iter()
        .map(String::as_str)
        .filter(|w| !STOPWORDS.contains(w))
        .collect();

    let full = all_words.concat();
    let base = if significant.is_empty() {
        full.clone()
    } else {
        significant.concat()
    };
    if base.is_empty() {
        return Vec::new();
    }

    let city_word: String = words(city).concat();
    let abbreviation = city_abbreviation(city);
    let separators = ["", "_", "."];

    let mut candidates = vec![base.clone(), full];

    for sep in separators {
        if !city_word.is_empty() {
            candidates.push(format!("{}{}{}", base, sep, city_word));
        }
        if let Some(abbr) = &abbreviation {
            candidates.push(format!("{}{}{}", base, sep, abbr));
        }
    }

    if let Some(first) = significant.first() {
        candidates.push(first.to_string());
        candidates.push(format!("{}tr", first));
        candidates.push(format!("{}official", first));
        if let Some(abbr) = &abbreviation {
            candidates.push(format!("{}{}", first, abbr));
        }
    }

    if let [first, second, ..] = significant.as_slice() {
        for sep in separators {
            candidates.push(format!("{}{}{}", first, sep, second));
        }
    }

    let mut seen = HashSet::new();
    let mut variants: Vec<String> = candidates
        .into_iter()
        .map(|c| c.to_lowercase())
        .filter(|c| is_valid_handle(c))
        .filter(|c| seen.insert(c.clone()))
        .collect();

    variants.sort_by_key(String::len);
    variants.truncate(MAX_VARIANTS);
    variants
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_well_formed(variants: &[String]) {
        assert!(variants.len() <= MAX_VARIANTS);
        let unique: HashSet<String> = variants.iter().map(|v| v.to_lowercase()).collect();
        assert_eq!(unique.len(), variants.len());
        for v in variants {
            assert!(is_valid_handle(v), "invalid handle {}", v);
        }
        for pair in variants.windows(2) {
            assert!(pair[0].len() <= pair[1].len());
        }
    }

    #[test]
    fn test_single_word_name() {
        let variants = username_variants("Neolokal", "Istanbul");
        assert_well_formed(&variants);
        assert_eq!(variants[0], "neolokal");
        assert!(variants.contains(&"neolokaltr".to_string()));
        assert!(variants.contains(&"neolokal_ist".to_string()));
        assert!(variants.contains(&"neolokalist".to_string()));
    }

    #[test]
    fn test_stopwords_removed_from_base() {
        let variants = username_variants("The Kitchen Karaköy Balık Restaurant", "İstanbul");
        assert_well_formed(&variants);
        assert!(variants.contains(&"karakoybalik".to_string()));
        assert!(variants.contains(&"karakoy".to_string()));
        assert!(variants.contains(&"karakoy_balik".to_string()));
    }

    #[test]
    fn test_only_stopwords_falls_back_to_full_join() {
        let variants = username_variants("The Coffee House", "Izmir");
        assert_well_formed(&variants);
        assert_eq!(variants[0], "thecoffeehouse");
    }

    #[test]
    fn test_degenerate_names() {
        assert!(username_variants("", "Istanbul").is_empty());
        assert!(username_variants("!!!", "Istanbul").is_empty());
        // two letters never reach the minimum length on their own
        let variants = username_variants("Ab", "");
        assert_well_formed(&variants);
        assert!(!variants.contains(&"ab".to_string()));
    }

    #[test]
    fn test_long_names_are_capped() {
        let variants = username_variants(
            "Extraordinarily Longnamed Gastronomic Experience Atelier",
            "Istanbul",
        );
        assert_well_formed(&variants);
        assert!(variants.iter().all(|v| v.len() <= MAX_HANDLE_LEN));
    }

    #[test]
    fn test_city_abbreviation() {
        assert_eq!(city_abbreviation("İstanbul").as_deref(), Some("ist"));
        assert_eq!(city_abbreviation("Eskişehir").as_deref(), Some("esk"));
        assert_eq!(city_abbreviation(""), None);
    }
}
