//! Core rate limiter implementation.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tracing::{debug, trace};

use super::policy::{Decision, RateLimitConfig};
use super::state::KeyState;
use crate::config::LimiterSettings;
use crate::error::Result;

/// Share of `max_keys` evicted at once when the limiter is full and no key
/// is idle, so one scan pays for many inserts.
const EVICTION_BATCH_DIVISOR: usize = 16;

/// Keyed rate limiter enforcing a sliding-window quota and a minimum spacing
/// between allowed requests.
///
/// State lives in a sharded concurrent map, so checks on unrelated keys
/// rarely contend. A whole check for one key runs under its shard's write
/// lock. The limiter never reads a clock; callers pass `now` in epoch
/// milliseconds.
pub struct RateLimiter {
    /// Key state indexed by limiter key
    states: DashMap<String, KeyState>,
    /// Number of map shards
    shard_count: usize,
    /// Upper bound on tracked keys
    max_keys: Option<usize>,
    /// Largest window or interval any check has used
    horizon_ms: AtomicU64,
}

impl RateLimiter {
    /// Create a new rate limiter with default settings.
    pub fn new() -> Self {
        Self::with_settings(&LimiterSettings::default())
    }

    /// Create a rate limiter with the given shard count and key capacity.
    ///
    /// The shard count is rounded up to a power of two, at least 2.
    pub fn with_settings(settings: &LimiterSettings) -> Self {
        let shard_count = settings.shards.max(2).next_power_of_two();

        Self {
            states: DashMap::with_shard_amount(shard_count),
            shard_count,
            max_keys: settings.max_keys.map(|max_keys| max_keys.max(1)),
            horizon_ms: AtomicU64::new(0),
        }
    }

    /// Check whether a request for `key` may proceed at `now`.
    ///
    /// Allowed requests are recorded. Denied requests leave the key's state
    /// untouched, so retrying at the reported time succeeds unless other
    /// requests were allowed in between.
    pub fn check(&self, key: &str, config: &RateLimitConfig, now: u64) -> Result<Decision> {
        config.validate()?;

        let existing = self.states.get_mut(key).map(|mut state| {
            self.raise_horizon(config);
            state.check(config, now)
        });

        let decision = match existing {
            Some(decision) => decision,
            None => {
                self.make_room(now);
                let mut state = self.states.entry(key.to_string()).or_insert_with(|| {
                    debug!(
                        key = %key,
                        window_ms = config.window_ms,
                        max = config.max,
                        min_interval_ms = config.min_interval_ms,
                        "Creating rate limit state"
                    );
                    KeyState::new(now)
                });
                self.raise_horizon(config);
                state.check(config, now)
            }
        };

        trace!(
            key = %key,
            now = now,
            allowed = decision.allowed,
            "Checked rate limit"
        );

        if !decision.allowed {
            debug!(
                key = %key,
                retry_after_ms = decision.retry_after_ms,
                "Rate limit exceeded"
            );
        }

        Ok(decision)
    }

    /// Must be called while holding the key's entry, so a sweep of that
    /// shard sees the raised horizon.
    fn raise_horizon(&self, config: &RateLimitConfig) {
        self.horizon_ms.fetch_max(config.horizon_ms(), Ordering::SeqCst);
    }

    /// Evaluate a check without recording it.
    pub fn peek(&self, key: &str, config: &RateLimitConfig, now: u64) -> Result<Decision> {
        config.validate()?;

        let decision = match self.states.get(key) {
            Some(state) => {
                let mut view = state.clone();
                view.prune(config.window_ms, now);
                view.evaluate(config, now)
            }
            None => Decision::allow(),
        };
        Ok(decision)
    }

    /// Free space for a new key when the limiter is full.
    ///
    /// Idle keys go first. If none are idle, the least recently seen batch
    /// is evicted. No entry lock may be held by the caller.
    fn make_room(&self, now: u64) {
        let Some(max_keys) = self.max_keys else {
            return;
        };
        if self.states.len() < max_keys {
            return;
        }

        let swept = self.sweep(now);
        let len = self.states.len();
        if len < max_keys {
            return;
        }

        let batch = max_keys.div_ceil(EVICTION_BATCH_DIVISOR);
        let count = batch.max(len + 1 - max_keys);

        let mut candidates: Vec<(u64, String)> = self
            .states
            .iter()
            .map(|entry| (entry.value().last_seen(), entry.key().clone()))
            .collect();
        if count < candidates.len() {
            candidates.select_nth_unstable(count - 1);
            candidates.truncate(count);
        }

        for (_, key) in &candidates {
            self.states.remove(key);
        }

        debug!(
            swept = swept,
            evicted = candidates.len(),
            max_keys = max_keys,
            "Evicted least recently seen rate limit state"
        );
    }

    /// Remove keys whose history can no longer influence a decision.
    ///
    /// A key is removed once its latest allowed request is older than the
    /// largest window or interval this limiter has been checked with.
    /// Returns the number of keys removed.
    pub fn sweep(&self, now: u64) -> usize {
        let before = self.states.len();

        // The horizon is re-read under each shard lock.
        self.states.retain(|_, state| {
            let horizon_ms = self.horizon_ms.load(Ordering::SeqCst);
            !state.is_idle(horizon_ms, now)
        });

        let removed = before.saturating_sub(self.states.len());
        if removed > 0 {
            debug!(
                removed = removed,
                horizon_ms = self.horizon_ms.load(Ordering::SeqCst),
                "Swept idle rate limit state"
            );
        }
        removed
    }

    /// Number of recorded requests for `key` inside the window ending at `now`.
    ///
    /// Returns `None` if no state exists for the key.
    pub fn request_count(&self, key: &str, window_ms: u64, now: u64) -> Option<usize> {
        self.states
            .get(key)
            .map(|state| state.count_in_window(window_ms, now))
    }

    /// Forget the state of one key. Returns whether the key was tracked.
    pub fn reset(&self, key: &str) -> bool {
        self.states.remove(key).is_some()
    }

    /// Clear all state.
    pub fn clear(&self) {
        self.states.clear();
    }

    /// Get the number of tracked keys.
    pub fn key_count(&self) -> usize {
        self.states.len()
    }

    /// Get the number of shards.
    pub fn shard_count(&self) -> usize {
        self.shard_count
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("keys", &self.states.len())
            .field("shards", &self.shard_count)
            .field("max_keys", &self.max_keys)
            .field("horizon_ms", &self.horizon_ms.load(Ordering::SeqCst))
            .finish()
    }
}
