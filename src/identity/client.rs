//! Client address extraction.

use tracing::trace;

use super::headers::HeaderSource;
use super::{CF_CONNECTING_IP, X_FORWARDED_FOR, X_REAL_IP};
use crate::config::IdentitySettings;

/// Identity reported when no client header is usable.
pub const DEFAULT_UNKNOWN_CLIENT: &str = "unknown";

/// Derives a client identity from proxy headers.
///
/// Precedence, first usable header wins:
///
/// 1. `x-forwarded-for`: the leftmost entry, which the first proxy recorded
///    as the client address.
/// 2. `x-real-ip`
/// 3. `cf-connecting-ip`
///
/// A header that is empty after trimming counts as absent. Values are not
/// checked to be IP addresses.
///
/// All three headers can be forged by the client. The result identifies a
/// client only when an edge proxy strips or overwrites them before the
/// request reaches this service; without that, a client can pick a fresh
/// identity per request and escape per-client limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentifier {
    unknown: String,
}

impl ClientIdentifier {
    /// Create an identifier reporting `"unknown"` when no header matches.
    pub fn new() -> Self {
        Self::with_unknown(DEFAULT_UNKNOWN_CLIENT)
    }

    /// Create an identifier with a custom fallback identity.
    pub fn with_unknown(unknown: impl Into<String>) -> Self {
        Self {
            unknown: unknown.into(),
        }
    }

    pub fn from_settings(settings: &IdentitySettings) -> Self {
        Self::with_unknown(settings.unknown_client.clone())
    }

    /// The fallback identity.
    pub fn unknown(&self) -> &str {
        &self.unknown
    }

    /// Extract the client identity, falling back to the unknown sentinel.
    pub fn extract<H: HeaderSource + ?Sized>(&self, headers: &H) -> String {
        match Self::lookup(headers) {
            Some(client) => client.to_string(),
            None => {
                trace!(fallback = %self.unknown, "No client address header present");
                self.unknown.clone()
            }
        }
    }

    /// Find the client address in the headers, if any header carries one.
    pub fn lookup<H: HeaderSource + ?Sized>(headers: &H) -> Option<&str> {
        if let Some(first) = headers
            .header(X_FORWARDED_FOR)
            .and_then(|chain| chain.split(',').next())
            .map(str::trim)
            .filter(|first| !first.is_empty())
        {
            trace!(header = X_FORWARDED_FOR, client = %first, "Client address found");
            return Some(first);
        }

        for name in [X_REAL_IP, CF_CONNECTING_IP] {
            if let Some(value) = headers
                .header(name)
                .map(str::trim)
                .filter(|value| !value.is_empty())
            {
                trace!(header = name, client = %value, "Client address found");
                return Some(value);
            }
        }

        None
    }
}

impl Default for ClientIdentifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract the client identity with the default fallback.
pub fn client_ip<H: HeaderSource + ?Sized>(headers: &H) -> String {
    ClientIdentifier::new().extract(headers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{HeaderMap, HeaderValue};

    #[test]
    fn test_forwarded_for_takes_first_entry() {
        let headers = [("x-forwarded-for", "1.2.3.4, 5.6.7.8")];
        assert_eq!(client_ip(&headers), "1.2.3.4");
    }

    #[test]
    fn test_forwarded_for_is_trimmed() {
        let headers = [("x-forwarded-for", "  10.0.0.1  ,10.0.0.2")];
        assert_eq!(client_ip(&headers), "10.0.0.1");
    }

    #[test]
    fn test_real_ip() {
        let headers = [("x-real-ip", "9.9.9.9")];
        assert_eq!(client_ip(&headers), "9.9.9.9");
    }

    #[test]
    fn test_cf_connecting_ip() {
        let headers = [("cf-connecting-ip", "8.8.8.8")];
        assert_eq!(client_ip(&headers), "8.8.8.8");
    }

    #[test]
    fn test_precedence() {
        let headers = [
            ("cf-connecting-ip", "8.8.8.8"),
            ("x-real-ip", "9.9.9.9"),
            ("x-forwarded-for", "1.2.3.4"),
        ];
        assert_eq!(client_ip(&headers), "1.2.3.4");

        let headers = [("cf-connecting-ip", "8.8.8.8"), ("x-real-ip", "9.9.9.9")];
        assert_eq!(client_ip(&headers), "9.9.9.9");
    }

    #[test]
    fn test_empty_headers_fall_through() {
        let headers = [
            ("x-forwarded-for", " , 1.2.3.4"),
            ("x-real-ip", "   "),
            ("cf-connecting-ip", "8.8.8.8"),
        ];
        assert_eq!(client_ip(&headers), "8.8.8.8");
    }

    #[test]
    fn test_no_headers_returns_sentinel() {
        let headers: [(&str, &str); 0] = [];
        assert_eq!(client_ip(&headers), "unknown");

        let identifier = ClientIdentifier::with_unknown("");
        assert_eq!(identifier.extract(&HeaderMap::new()), "");
    }

    #[test]
    fn test_no_address_validation() {
        let headers = [("x-real-ip", "not-an-ip")];
        assert_eq!(client_ip(&headers), "not-an-ip");
    }

    #[test]
    fn test_header_map_case_insensitive() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Forwarded-For", HeaderValue::from_static("203.0.113.7, 10.0.0.1"));
        assert_eq!(ClientIdentifier::new().extract(&headers), "203.0.113.7");
    }

    #[test]
    fn test_from_settings() {
        let settings = IdentitySettings {
            unknown_client: "anonymous".to_string(),
        };
        let identifier = ClientIdentifier::from_settings(&settings);
        assert_eq!(identifier.unknown(), "anonymous");
        assert_eq!(identifier.extract(&HeaderMap::new()), "anonymous");
    }

    #[test]
    fn test_lookup_borrows_from_headers() {
        let headers = [("x-real-ip", " 9.9.9.9 ")];
        assert_eq!(ClientIdentifier::lookup(&headers), Some("9.9.9.9"));
        assert_eq!(ClientIdentifier::lookup(&[("accept", "*/*")]), None);
    }
}
