//! Admission - request admission control
//!
//! This crate decides whether an incoming request may proceed. A keyed
//! [`RateLimiter`](ratelimit::RateLimiter) enforces a sliding-window quota
//! and a minimum spacing between allowed requests, and a
//! [`ClientIdentifier`](identity::ClientIdentifier) derives the client half
//! of a limiter key from proxy headers. [`Gate`](gate::Gate) composes both
//! for request handlers.
//!
//! ```
//! use admission::ratelimit::{RateLimitConfig, RateLimiter};
//! use admission::identity::client_ip;
//!
//! let limiter = RateLimiter::new();
//! let config = RateLimitConfig::new(1000, 3, 0)?;
//! let client = client_ip(&[("x-forwarded-for", "1.2.3.4, 5.6.7.8")]);
//! let key = format!("{}:login", client);
//!
//! assert!(limiter.check(&key, &config, 0)?.allowed);
//! # Ok::<(), admission::error::AdmissionError>(())
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod gate;
pub mod identity;
pub mod ratelimit;

pub use error::{AdmissionError, Result};
