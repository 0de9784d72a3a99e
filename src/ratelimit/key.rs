//! Limiter key composition.

use std::fmt;

/// A limiter key scoping one client to one route or action.
///
/// Rendered as `"<client>:<route>"`. The limiter compares keys by exact
/// string equality, so any normalization must happen before a key is built.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LimiterKey {
    /// Client identity, usually an address from the request headers
    pub client: String,
    /// Route or action name
    pub route: String,
}

impl LimiterKey {
    pub fn new(client: impl Into<String>, route: impl Into<String>) -> Self {
        Self {
            client: client.into(),
            route: route.into(),
        }
    }

    /// The string form passed to the limiter.
    pub fn to_string_key(&self) -> String {
        format!("{}:{}", self.client, self.route)
    }
}

impl fmt::Display for LimiterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.client, self.route)
    }
}
