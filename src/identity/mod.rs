//! Client identification from proxy headers.
//!
//! Produces the client half of a limiter key. The result is a best-effort
//! identity signal, not an authenticated address: see [`ClientIdentifier`]
//! for the trust assumptions.

mod client;
mod headers;

pub use client::{client_ip, ClientIdentifier, DEFAULT_UNKNOWN_CLIENT};
pub use headers::HeaderSource;

/// Proxy chain header, client address first.
pub const X_FORWARDED_FOR: &str = "x-forwarded-for";
/// Single address set by a reverse proxy.
pub const X_REAL_IP: &str = "x-real-ip";
/// Client address set by the Cloudflare edge.
pub const CF_CONNECTING_IP: &str = "cf-connecting-ip";
