//! Handle extraction and relevance scoring of search results

use crate::identity::search::SearchHit;
use crate::identity::variants::MAX_HANDLE_LEN;
use crate::text::{normalize_name, words};
use regex::Regex;
use std::sync::OnceLock;

/// Lowest score a search candidate needs to be accepted
pub const ACCEPT_THRESHOLD: i32 = 20;

const TITLE_WORD: i32 = 30;
const SNIPPET_WORD: i32 = 10;
const HANDLE_WORD: i32 = 25;
const CITY_IN_HANDLE: i32 = 15;
const CITY_IN_TITLE: i32 = 10;
const CITY_IN_SNIPPET: i32 = 5;
const NEIGHBORHOOD_MATCH: i32 = 20;
const DISTRICT_MATCH: i32 = 15;
const MAX_POSITION_BONUS: i32 = 10;
const POSITION_DECAY: i32 = 2;
const OFFICIAL_BONUS: i32 = 20;
const GENERIC_HANDLE_PENALTY: i32 = -50;

/// First path segments on the profile host that are not profiles
const RESERVED_SEGMENTS: &[&str] = &[
    "p", "reel", "reels", "stories", "explore", "tv", "accounts", "tags", "locations", "direct",
    "about", "legal", "developer", "web", "api", "static",
];

/// Words too generic to describe a venue on their own
const NAME_STOPWORDS: &[&str] = &[
    "the", "and", "of", "ve", "restaurant", "restoran", "cafe", "bar", "house", "kitchen",
];

/// Handles that are a bare category or place word
const GENERIC_HANDLES: &[&str] = &[
    "restaurant", "restaurants", "restoran", "cafe", "coffee", "bar", "bars", "food", "foodie",
    "yemek", "lokanta", "meyhane", "bistro", "kitchen", "istanbul", "ankara", "izmir", "turkey",
    "turkiye", "instagram",
];

fn profile_url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^(?:https?://)?(?:www\.|m\.)?instagram\.com/([A-Za-z0-9_.]+)/?(?:[?#].*)?$")
            .expect("profile URL regex is valid")
    })
}

fn profile_link_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(?:https?:)?//(?:www\.|m\.)?instagram\.com/([A-Za-z0-9_.]+)")
            .expect("profile link regex is valid")
    })
}

fn accept_handle(raw: &str) -> Option<String> {
    let handle = raw.trim_matches('.').to_lowercase();
    if handle.is_empty() || handle.len() > MAX_HANDLE_LEN {
        return None;
    }
    if RESERVED_SEGMENTS.contains(&handle.as_str()) {
        return None;
    }
    Some(handle)
}

/// Profile handle of a result link; post, reel and other non-profile links yield `None`
pub fn extract_handle(url: &str) -> Option<String> {
    let captures = profile_link_regex().captures(url)?;
    accept_handle(captures.get(1)?.as_str())
}

/// First profile handle linked from an HTML document
pub fn first_profile_in_html(html: &str) -> Option<String> {
    profile_link_regex()
        .captures_iter(html)
        .filter_map(|c| c.get(1))
        .find_map(|m| accept_handle(m.as_str()))
}

/// Whether `url` is shaped like a profile URL (not a post, reel, ...)
pub fn is_profile_url(url: &str) -> bool {
    profile_url_regex()
        .captures(url.trim())
        .and_then(|c| c.get(1))
        .and_then(|m| accept_handle(m.as_str()))
        .is_some()
}

/// Canonical profile URL for a handle
pub fn profile_url(handle: &str) -> String {
    format!("https://www.instagram.com/{}/", handle.to_lowercase())
}

/// Venue attributes the scorer compares results against, pre-normalized
#[derive(Debug, Clone)]
pub struct ScoringContext {
    name_words: Vec<String>,
    city: String,
    district: String,
    neighborhood: String,
}

impl ScoringContext {
    pub fn new(name: &str, city: &str, district: Option<&str>, neighborhood: Option<&str>) -> Self {
        let mut name_words: Vec<String> = words(name)
            .into_iter()
            .filter(|w| w.len() >= 2 && !NAME_STOPWORDS.contains(&w.as_str()))
            .collect();
        if name_words.is_empty() {
            name_words = words(name);
        }

        Self {
            name_words,
            city: normalize_name(city),
            district: normalize_name(district.unwrap_or_default()),
            neighborhood: normalize_name(neighborhood.unwrap_or_default()),
        }
    }

    /// Score a candidate handle found in the result at `rank` (0-based)
    pub fn score(&self, handle: &str, hit: &SearchHit, rank: usize) -> i32 {
        let title = normalize_name(&hit.title);
        let snippet = normalize_name(&hit.snippet);
        let bare_handle: String = handle.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
        let compact_city: String = self.city.chars().filter(|c| c.is_ascii_alphanumeric()).collect();

        let mut score = 0;

        for word in &self.name_words {
            if title.contains(word.as_str()) {
                score += TITLE_WORD;
            }
            if snippet.contains(word.as_str()) {
                score += SNIPPET_WORD;
            }
            if bare_handle.contains(word.as_str()) {
                score += HANDLE_WORD;
            }
        }

        if !compact_city.is_empty() {
            if bare_handle.contains(&compact_city) {
                score += CITY_IN_HANDLE;
            }
            if title.contains(&self.city) {
                score += CITY_IN_TITLE;
            }
            if snippet.contains(&self.city) {
                score += CITY_IN_SNIPPET;
            }
        }

        if !self.neighborhood.is_empty()
            && (title.contains(&self.neighborhood) || snippet.contains(&self.neighborhood))
        {
            score += NEIGHBORHOOD_MATCH;
        }
        if !self.district.is_empty()
            && (title.contains(&self.district) || snippet.contains(&self.district))
        {
            score += DISTRICT_MATCH;
        }

        let rank = rank.min(MAX_POSITION_BONUS as usize) as i32;
        score += (MAX_POSITION_BONUS - POSITION_DECAY * rank).max(0);

        if handle.contains("official")
            || title.contains("official")
            || snippet.contains("official")
            || title.contains("resmi")
        {
            score += OFFICIAL_BONUS;
        }

        if GENERIC_HANDLES.contains(&bare_handle.as_str()) {
            score += GENERIC_HANDLE_PENALTY;
        }

        score
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(link: &str, title: &str, snippet: &str) -> SearchHit {
        SearchHit {
            link: link.to_string(),
            title: title.to_string(),
            snippet: snippet.to_string(),
        }
    }

    #[test]
    fn test_extract_handle() {
        assert_eq!(
            extract_handle("https://www.instagram.com/Neolokal/").as_deref(),
            Some("neolokal")
        );
        assert_eq!(
            extract_handle("https://instagram.com/mikla.istanbul?hl=en").as_deref(),
            Some("mikla.istanbul")
        );
        assert_eq!(extract_handle("https://www.instagram.com/p/Cx1234/"), None);
        assert_eq!(extract_handle("https://www.instagram.com/explore/tags/food/"), None);
        assert_eq!(extract_handle("https://www.instagram.com/reel/abc/"), None);
        assert_eq!(extract_handle("https://example.com/neolokal"), None);
    }

    #[test]
    fn test_is_profile_url() {
        assert!(is_profile_url("https://www.instagram.com/neolokal/"));
        assert!(is_profile_url("instagram.com/neolokal"));
        assert!(!is_profile_url("https://www.instagram.com/p/abc/"));
        assert!(!is_profile_url("https://www.instagram.com/neolokal/reels/"));
        assert!(!is_profile_url("https://facebook.com/neolokal"));
    }

    #[test]
    fn test_first_profile_in_html() {
        let html = r#"<a href="https://www.instagram.com/p/xyz/">post</a>
            <a href="//instagram.com/Neolokal">follow</a>"#;
        assert_eq!(first_profile_in_html(html).as_deref(), Some("neolokal"));
        assert_eq!(first_profile_in_html("<html></html>"), None);
    }

    #[test]
    fn test_score_strong_match() {
        let ctx = ScoringContext::new("Neolokal", "Istanbul", Some("Beyoğlu"), Some("Karaköy"));
        let score = ctx.score(
            "neolokal",
            &hit(
                "https://www.instagram.com/neolokal/",
                "Neolokal (@neolokal) • Instagram photos",
                "Neolokal restaurant in Karaköy, Istanbul",
            ),
            0,
        );
        // title 30 + snippet 10 + handle 25 + city snippet 5 + neighborhood 20 + position 10
        assert_eq!(score, 100);
        assert!(score >= ACCEPT_THRESHOLD);
    }

    #[test]
    fn test_score_position_decay() {
        let ctx = ScoringContext::new("Mikla", "Ankara", None, None);
        let plain = hit("https://www.instagram.com/x/", "", "");
        assert_eq!(ctx.score("x", &plain, 0), 10);
        assert_eq!(ctx.score("x", &plain, 3), 4);
        assert_eq!(ctx.score("x", &plain, 9), 0);
    }

    #[test]
    fn test_score_generic_handle_penalty() {
        let ctx = ScoringContext::new("Best Bar", "Izmir", None, None);
        let generic = hit("https://www.instagram.com/bar/", "Bar", "");
        assert!(ctx.score("bar", &generic, 5) < ACCEPT_THRESHOLD);
    }

    #[test]
    fn test_score_official_and_city() {
        let ctx = ScoringContext::new("Zorba Taverna", "Izmir", None, None);
        let score = ctx.score(
            "zorba_official_izmir",
            &hit("https://www.instagram.com/zorba_official_izmir/", "", ""),
            6,
        );
        // handle word 25 + city in handle 15 + official 20
        assert_eq!(score, 60);
    }
}
