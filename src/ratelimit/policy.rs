//! Per-call rate limit configuration and the decision returned by a check.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{AdmissionError, Result};

/// Limits applied to a single check.
///
/// The config is supplied with every call rather than stored per key, so one
/// limiter can serve routes with different limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Sliding window length in milliseconds
    pub window_ms: u64,
    /// Maximum allowed requests inside any window
    pub max: u32,
    /// Minimum milliseconds between two allowed requests (0 disables)
    #[serde(default)]
    pub min_interval_ms: u64,
}

impl RateLimitConfig {
    /// Create a validated config.
    pub fn new(window_ms: u64, max: u32, min_interval_ms: u64) -> Result<Self> {
        let config = Self {
            window_ms,
            max,
            min_interval_ms,
        };
        config.validate()?;
        Ok(config)
    }

    /// A sliding-window quota with no spacing constraint.
    pub fn window(window_ms: u64, max: u32) -> Result<Self> {
        Self::new(window_ms, max, 0)
    }

    /// Reject configs that cannot be enforced.
    pub fn validate(&self) -> Result<()> {
        if self.window_ms == 0 {
            return Err(AdmissionError::InvalidConfig(
                "window_ms must be greater than zero".to_string(),
            ));
        }
        if self.max == 0 {
            return Err(AdmissionError::InvalidConfig(
                "max must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// How long a key's history stays relevant under this config.
    pub(crate) fn horizon_ms(&self) -> u64 {
        self.window_ms.max(self.min_interval_ms)
    }
}

/// Outcome of a rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Decision {
    /// Whether the request may proceed
    pub allowed: bool,
    /// Advisory wait before a retry is worthwhile; zero when allowed
    pub retry_after_ms: u64,
}

impl Decision {
    pub(crate) fn allow() -> Self {
        Self {
            allowed: true,
            retry_after_ms: 0,
        }
    }

    pub(crate) fn deny(retry_after_ms: u64) -> Self {
        Self {
            allowed: false,
            retry_after_ms: retry_after_ms.max(1),
        }
    }

    /// Whether the request was denied.
    pub fn is_denied(&self) -> bool {
        !self.allowed
    }

    /// The retry hint as a `Duration`.
    pub fn retry_after(&self) -> Duration {
        Duration::from_millis(self.retry_after_ms)
    }

    /// The retry hint in whole seconds, rounded up, for `Retry-After` headers.
    ///
    /// Returns `None` for allowed requests.
    pub fn retry_after_secs(&self) -> Option<u64> {
        if self.allowed {
            return None;
        }
        Some(self.retry_after_ms.div_ceil(1000).max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_validates() {
        assert!(RateLimitConfig::new(1000, 3, 0).is_ok());
        assert!(matches!(
            RateLimitConfig::new(0, 3, 0),
            Err(AdmissionError::InvalidConfig(_))
        ));
        assert!(matches!(
            RateLimitConfig::new(1000, 0, 0),
            Err(AdmissionError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_min_interval_defaults_to_zero() {
        let config: RateLimitConfig = serde_yaml::from_str("window_ms: 500\nmax: 2\n").unwrap();
        assert_eq!(config, RateLimitConfig::window(500, 2).unwrap());
    }

    #[test]
    fn test_negative_min_interval_does_not_parse() {
        let result: std::result::Result<RateLimitConfig, _> =
            serde_yaml::from_str("window_ms: 500\nmax: 2\nmin_interval_ms: -5\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_horizon_is_largest_constraint() {
        assert_eq!(RateLimitConfig::new(1000, 1, 200).unwrap().horizon_ms(), 1000);
        assert_eq!(RateLimitConfig::new(50, 1, 200).unwrap().horizon_ms(), 200);
    }

    #[test]
    fn test_retry_after_secs_rounds_up() {
        assert_eq!(Decision::allow().retry_after_secs(), None);
        assert_eq!(Decision::deny(1).retry_after_secs(), Some(1));
        assert_eq!(Decision::deny(1000).retry_after_secs(), Some(1));
        assert_eq!(Decision::deny(1001).retry_after_secs(), Some(2));
        assert_eq!(Decision::deny(250).retry_after(), Duration::from_millis(250));
    }

    #[test]
    fn test_denial_hint_is_positive() {
        assert_eq!(Decision::deny(0).retry_after_ms, 1);
    }

    #[test]
    fn test_decision_serializes() {
        let json = serde_json::to_value(Decision::deny(120)).unwrap();
        assert_eq!(json["allowed"], false);
        assert_eq!(json["retry_after_ms"], 120);
    }
}
