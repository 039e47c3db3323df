//! Freshness classification of cache entries

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Freshness band of a cache entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FreshnessState {
    /// Serve as-is
    Fresh,
    /// Serve as-is and refresh in the background
    Stale,
    /// Refresh before serving; also used when no entry exists
    Expired,
}

impl FreshnessState {
    /// Whether the payload can be returned without waiting for a refresh
    pub fn is_servable(&self) -> bool {
        matches!(self, FreshnessState::Fresh | FreshnessState::Stale)
    }
}

impl fmt::Display for FreshnessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FreshnessState::Fresh => write!(f, "FRESH"),
            FreshnessState::Stale => write!(f, "STALE"),
            FreshnessState::Expired => write!(f, "EXPIRED"),
        }
    }
}

/// Age thresholds separating the freshness bands
///
/// Each band includes its lower bound: an entry exactly `fresh_for` old is
/// stale, one exactly `expire_after` old is expired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreshnessPolicy {
    fresh_for: Duration,
    expire_after: Duration,
}

impl Default for FreshnessPolicy {
    fn default() -> Self {
        Self {
            fresh_for: Duration::hours(24),
            expire_after: Duration::hours(96),
        }
    }
}

impl FreshnessPolicy {
    pub fn new(fresh_for: Duration, expire_after: Duration) -> Result<Self, String> {
        if fresh_for <= Duration::zero() {
            return Err("fresh_for must be positive".to_string());
        }
        if expire_after <= fresh_for {
            return Err("expire_after must be greater than fresh_for".to_string());
        }
        Ok(Self {
            fresh_for,
            expire_after,
        })
    }

    pub fn fresh_for(&self) -> Duration {
        self.fresh_for
    }

    pub fn expire_after(&self) -> Duration {
        self.expire_after
    }

    /// Classify an entry last written at `updated_at`
    pub fn classify(&self, updated_at: DateTime<Utc>, now: DateTime<Utc>) -> FreshnessState {
        self.classify_age(now - updated_at)
    }

    /// Classify by age; negative ages (clock skew) count as fresh
    pub fn classify_age(&self, age: Duration) -> FreshnessState {
        if age < self.fresh_for {
            FreshnessState::Fresh
        } else if age < self.expire_after {
            FreshnessState::Stale
        } else {
            FreshnessState::Expired
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bands() {
        let policy = FreshnessPolicy::default();

        assert_eq!(policy.classify_age(Duration::zero()), FreshnessState::Fresh);
        assert_eq!(
            policy.classify_age(Duration::hours(24) - Duration::seconds(1)),
            FreshnessState::Fresh
        );
        assert_eq!(policy.classify_age(Duration::hours(24)), FreshnessState::Stale);
        assert_eq!(policy.classify_age(Duration::hours(95)), FreshnessState::Stale);
        assert_eq!(
            policy.classify_age(Duration::hours(96) - Duration::milliseconds(1)),
            FreshnessState::Stale
        );
        assert_eq!(policy.classify_age(Duration::hours(96)), FreshnessState::Expired);
        assert_eq!(policy.classify_age(Duration::days(365)), FreshnessState::Expired);
    }

    #[test]
    fn test_every_hour_lands_in_one_band() {
        let policy = FreshnessPolicy::default();
        for hours in 0..200 {
            let expected = match hours {
                h if h < 24 => FreshnessState::Fresh,
                h if h < 96 => FreshnessState::Stale,
                _ => FreshnessState::Expired,
            };
            assert_eq!(policy.classify_age(Duration::hours(hours)), expected, "age {}h", hours);
        }
    }

    #[test]
    fn test_clock_skew_is_fresh() {
        let policy = FreshnessPolicy::default();
        let now = Utc::now();
        assert_eq!(
            policy.classify(now + Duration::minutes(5), now),
            FreshnessState::Fresh
        );
    }

    #[test]
    fn test_policy_validation() {
        assert!(FreshnessPolicy::new(Duration::hours(1), Duration::hours(2)).is_ok());
        assert!(FreshnessPolicy::new(Duration::hours(2), Duration::hours(2)).is_err());
        assert!(FreshnessPolicy::new(Duration::zero(), Duration::hours(2)).is_err());
    }

    #[test]
    fn test_state_display() {
        assert_eq!(FreshnessState::Stale.to_string(), "STALE");
        assert!(FreshnessState::Stale.is_servable());
        assert!(!FreshnessState::Expired.is_servable());
    }
}
