//! Route rules configuration and lookup.
//!
//! Callers usually pick a different limit per endpoint. This module maps a
//! route or action name to the [`RateLimitConfig`] that guards it, with an
//! optional default for routes that have no rule of their own.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

use super::policy::RateLimitConfig;
use crate::error::{AdmissionError, Result};

/// A table of per-route rate limits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitRules {
    /// Rule applied to routes without an entry in `routes`
    #[serde(default)]
    pub default: Option<RateLimitConfig>,
    /// Map of route name to rule
    #[serde(default)]
    pub routes: HashMap<String, RateLimitConfig>,
}

impl LimitRules {
    /// Create an empty rule table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default rule.
    pub fn with_default(mut self, config: RateLimitConfig) -> Self {
        self.default = Some(config);
        self
    }

    /// Add or replace the rule for a route.
    pub fn with_route(mut self, route: impl Into<String>, config: RateLimitConfig) -> Self {
        self.routes.insert(route.into(), config);
        self
    }

    /// Load rules from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading rate limit rules");

        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Load rules from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let rules: LimitRules = serde_yaml::from_str(yaml)
            .map_err(|e| AdmissionError::Config(format!("Failed to parse rate limit rules: {}", e)))?;
        rules.validate()?;
        Ok(rules)
    }

    /// Check that every rule is enforceable.
    pub fn validate(&self) -> Result<()> {
        if let Some(default) = &self.default {
            default
                .validate()
                .map_err(|e| AdmissionError::InvalidConfig(format!("default rule: {}", e)))?;
        }
        for (route, config) in &self.routes {
            config
                .validate()
                .map_err(|e| AdmissionError::InvalidConfig(format!("route '{}': {}", route, e)))?;
        }
        Ok(())
    }

    /// Find the rule for a route, falling back to the default.
    ///
    /// Route names match exactly.
    pub fn find(&self, route: &str) -> Option<&RateLimitConfig> {
        self.routes.get(route).or(self.default.as_ref())
    }

    /// Whether no rule is configured at all.
    pub fn is_empty(&self) -> bool {
        self.default.is_none() && self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rules() {
        let yaml = r#"
default:
  window_ms: 60000
  max: 120
routes:
  login:
    window_ms: 60000
    max: 5
    min_interval_ms: 1000
  checkout:
    window_ms: 1000
    max: 1
"#;
        let rules = LimitRules::from_yaml(yaml).unwrap();
        assert_eq!(rules.routes.len(), 2);
        assert_eq!(rules.default, Some(RateLimitConfig::window(60000, 120).unwrap()));

        let login = rules.find("login").unwrap();
        assert_eq!(login.max, 5);
        assert_eq!(login.min_interval_ms, 1000);

        let checkout = rules.find("checkout").unwrap();
        assert_eq!(checkout.min_interval_ms, 0);
    }

    #[test]
    fn test_find_falls_back_to_default() {
        let rules = LimitRules::new()
            .with_default(RateLimitConfig::window(1000, 10).unwrap())
            .with_route("login", RateLimitConfig::new(1000, 2, 100).unwrap());

        assert_eq!(rules.find("login").unwrap().max, 2);
        assert_eq!(rules.find("search").unwrap().max, 10);
    }

    #[test]
    fn test_find_no_match() {
        let rules = LimitRules::new().with_route("login", RateLimitConfig::window(1000, 2).unwrap());

        assert!(rules.find("Login").is_none());
        assert!(rules.find("search").is_none());
    }

    #[test]
    fn test_invalid_rule_rejected() {
        let yaml = r#"
routes:
  login:
    window_ms: 0
    max: 5
"#;
        let err = LimitRules::from_yaml(yaml).unwrap_err();
        match err {
            AdmissionError::InvalidConfig(msg) => assert!(msg.contains("login")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_malformed_yaml_is_config_error() {
        let err = LimitRules::from_yaml("routes: [1, 2").unwrap_err();
        assert!(matches!(err, AdmissionError::Config(_)));
    }

    #[test]
    fn test_empty_rules() {
        let rules = LimitRules::from_yaml("{}").unwrap();
        assert!(rules.is_empty());
        assert!(rules.find("anything").is_none());
    }
}
