//! Per-key request history.

use std::collections::VecDeque;

use super::policy::{Decision, RateLimitConfig};

/// Request history for one limiter key.
///
/// Not synchronized: the limiter holds the owning shard lock for the whole
/// prune, evaluate and record sequence.
#[derive(Debug, Clone, Default)]
pub struct KeyState {
    /// Allowed request times, oldest first
    timestamps: VecDeque<u64>,
    /// Time of the most recent allowed request
    last_allowed_at: Option<u64>,
    /// Time of the most recent check, allowed or not
    last_seen: u64,
}

impl KeyState {
    pub fn new(now: u64) -> Self {
        Self {
            timestamps: VecDeque::new(),
            last_allowed_at: None,
            last_seen: now,
        }
    }

    /// Drop timestamps that have left the window ending at `now`.
    ///
    /// An entry exactly `window_ms` old is outside the window, so a caller
    /// retrying at `oldest + window_ms` finds the slot free.
    pub fn prune(&mut self, window_ms: u64, now: u64) {
        while let Some(&oldest) = self.timestamps.front() {
            if oldest.saturating_add(window_ms) <= now {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }
    }

    /// Decide without recording anything.
    pub fn evaluate(&self, config: &RateLimitConfig, now: u64) -> Decision {
        if config.min_interval_ms > 0 {
            if let Some(last) = self.last_allowed_at {
                let elapsed = now.saturating_sub(last);
                if elapsed < config.min_interval_ms {
                    return Decision::deny(config.min_interval_ms - elapsed);
                }
            }
        }

        if self.timestamps.len() >= config.max as usize {
            if let Some(&oldest) = self.timestamps.front() {
                let expires_at = oldest.saturating_add(config.window_ms);
                return Decision::deny(expires_at.saturating_sub(now));
            }
        }

        Decision::allow()
    }

    /// Prune, evaluate and, when allowed, record `now`.
    pub fn check(&mut self, config: &RateLimitConfig, now: u64) -> Decision {
        self.last_seen = self.last_seen.max(now);
        self.prune(config.window_ms, now);

        let decision = self.evaluate(config, now);
        if decision.allowed {
            self.timestamps.push_back(now);
            self.last_allowed_at = Some(now);
        }
        decision
    }

    /// Number of recorded requests inside the window ending at `now`.
    pub fn count_in_window(&self, window_ms: u64, now: u64) -> usize {
        self.timestamps
            .iter()
            .filter(|&&t| t.saturating_add(window_ms) > now)
            .count()
    }

    pub fn last_allowed_at(&self) -> Option<u64> {
        self.last_allowed_at
    }

    pub fn last_seen(&self) -> u64 {
        self.last_seen
    }

    /// Whether this history can no longer affect any decision made with
    /// limits no longer than `horizon_ms`.
    pub fn is_idle(&self, horizon_ms: u64, now: u64) -> bool {
        match self.last_allowed_at {
            Some(last) => last.saturating_add(horizon_ms) <= now,
            None => true,
        }
    }
}
