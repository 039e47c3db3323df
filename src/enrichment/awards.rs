//! Static award registry lookup

use crate::error::{Result, VenueCacheError};
use crate::model::AwardRecord;
use crate::text::normalize_name;
use std::path::Path;
use tracing::debug;

/// Shortest normalized name allowed to take part in a substring match
pub const MIN_SUBSTRING_MATCH_LEN: usize = 4;

/// Read-only list of award records, in priority order
#[derive(Debug, Clone, Default)]
pub struct AwardRegistry {
    records: Vec<AwardRecord>,
    normalized: Vec<String>,
}

impl AwardRegistry {
    pub fn new(records: Vec<AwardRecord>) -> Self {
        let normalized = records.iter().map(|r| normalize_name(&r.name)).collect();
        Self {
            records,
            normalized,
        }
    }

    /// Parse a JSON array of award records
    pub fn from_json_str(json: &str) -> Result<Self> {
        let records: Vec<AwardRecord> = serde_json::from_str(json)?;
        Ok(Self::new(records))
    }

    /// Load a JSON array of award records from disk
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            VenueCacheError::StorageError(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&json)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Find the award record for a venue name.
    ///
    /// Exact normalized match wins over any substring match. Substring
    /// matches, in either direction, need both names to be at least
    /// [`MIN_SUBSTRING_MATCH_LEN`] characters. The first hit in registry
    /// order is returned.
    pub fn find(&self, venue_name: &str) -> Option<&AwardRecord> {
        let name = normalize_name(venue_name);
        if name.is_empty() {
            return None;
        }

        if let Some(i) = self.normalized.iter().position(|n| *n == name) {
            debug!("Award exact match: {} -> {}", venue_name, self.records[i].name);
            return Some(&self.records[i]);
        }

        if name.chars().count() < MIN_SUBSTRING_MATCH_LEN {
            return None;
        }

        let i = self.normalized.iter().position(|n| {
            n.chars().count() >= MIN_SUBSTRING_MATCH_LEN
                && (n.contains(name.as_str()) || name.contains(n.as_str()))
        })?;
        debug!("Award substring match: {} -> {}", venue_name, self.records[i].name);
        Some(&self.records[i])
    }
}
