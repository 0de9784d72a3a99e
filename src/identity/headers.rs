//! Read-only header access.

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

/// Case-insensitive, read-only view of request headers.
///
/// Implemented for `http::HeaderMap` and for plain maps and pair slices so
/// callers outside an HTTP stack can identify clients too.
pub trait HeaderSource {
    /// Get the first value of a header. `name` is lowercase.
    ///
    /// Values that are not valid UTF-8 are reported as absent.
    fn header(&self, name: &str) -> Option<&str>;
}

impl HeaderSource for http::HeaderMap {
    fn header(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|value| value.to_str().ok())
    }
}

impl<S: BuildHasher> HeaderSource for HashMap<String, String, S> {
    fn header(&self, name: &str) -> Option<&str> {
        if let Some(value) = self.get(name) {
            return Some(value.as_str());
        }
        self.iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

impl HeaderSource for BTreeMap<String, String> {
    fn header(&self, name: &str) -> Option<&str> {
        self.iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

impl<'a> HeaderSource for [(&'a str, &'a str)] {
    fn header(&self, name: &str) -> Option<&str> {
        self.iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| *value)
    }
}

impl<'a, const N: usize> HeaderSource for [(&'a str, &'a str); N] {
    fn header(&self, name: &str) -> Option<&str> {
        self.as_slice().header(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{HeaderMap, HeaderValue};

    #[test]
    fn test_header_map_lookup() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Real-IP", HeaderValue::from_static("9.9.9.9"));
        assert_eq!(headers.header("x-real-ip"), Some("9.9.9.9"));
        assert_eq!(headers.header("x-forwarded-for"), None);
    }

    #[test]
    fn test_header_map_first_value_wins() {
        let mut headers = HeaderMap::new();
        headers.append("x-forwarded-for", HeaderValue::from_static("1.1.1.1"));
        headers.append("x-forwarded-for", HeaderValue::from_static("2.2.2.2"));
        assert_eq!(headers.header("x-forwarded-for"), Some("1.1.1.1"));
    }

    #[test]
    fn test_header_map_non_utf8_is_absent() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_bytes(&[0xff, 0xfe]).unwrap());
        assert_eq!(headers.header("x-real-ip"), None);
    }

    #[test]
    fn test_hash_map_is_case_insensitive() {
        let mut headers = HashMap::new();
        headers.insert("CF-Connecting-IP".to_string(), "8.8.8.8".to_string());
        assert_eq!(headers.header("cf-connecting-ip"), Some("8.8.8.8"));
    }

    #[test]
    fn test_btree_map_is_case_insensitive() {
        let mut headers = BTreeMap::new();
        headers.insert("X-Forwarded-For".to_string(), "1.2.3.4".to_string());
        assert_eq!(headers.header("x-forwarded-for"), Some("1.2.3.4"));
    }

    #[test]
    fn test_pairs() {
        let headers = [("X-Real-Ip", "9.9.9.9")];
        assert_eq!(headers.header("x-real-ip"), Some("9.9.9.9"));
        assert_eq!(headers[..].header("x-real-ip"), Some("9.9.9.9"));
    }
}
