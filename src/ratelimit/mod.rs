//! Rate limiting logic and state management.

mod key;
mod limiter;
mod policy;
mod rules;
mod state;
mod sweeper;

pub use key::LimiterKey;
pub use limiter::RateLimiter;
pub use policy::{Decision, RateLimitConfig};
pub use rules::LimitRules;
pub use state::KeyState;
pub use sweeper::Sweeper;
