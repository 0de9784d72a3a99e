//! Request-boundary admission.
//!
//! [`Gate`] bundles the pieces a request handler needs: it identifies the
//! client, builds the limiter key for the route, resolves the route's rule,
//! reads the clock and runs the check. Handlers map a denied [`Admission`]
//! to their own rejection, typically 429 with a `Retry-After` header.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, instrument};

use crate::clock::{Clock, SystemClock};
use crate::config::{AdmissionConfig, LimiterSettings};
use crate::error::{AdmissionError, Result};
use crate::identity::{ClientIdentifier, HeaderSource};
use crate::ratelimit::{Decision, LimitRules, LimiterKey, RateLimiter, Sweeper};

/// Result of admitting one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission {
    /// The key the request was counted under
    pub key: LimiterKey,
    /// The limiter's decision
    pub decision: Decision,
}

impl Admission {
    pub fn allowed(&self) -> bool {
        self.decision.allowed
    }
}

/// Admission control for incoming requests.
pub struct Gate {
    limiter: Arc<RateLimiter>,
    identifier: ClientIdentifier,
    rules: LimitRules,
    clock: Arc<dyn Clock>,
    sweep_interval: Duration,
}

impl Gate {
    /// Create a gate from its parts, sweeping at the default interval.
    pub fn new(
        limiter: Arc<RateLimiter>,
        identifier: ClientIdentifier,
        rules: LimitRules,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            limiter,
            identifier,
            rules,
            clock,
            sweep_interval: Duration::from_millis(LimiterSettings::default().sweep_interval_ms),
        }
    }

    /// Build a gate using wall-clock time.
    pub fn from_config(config: &AdmissionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(
            Arc::new(RateLimiter::with_settings(&config.limiter)),
            ClientIdentifier::from_settings(&config.identity),
            config.rules.clone(),
            Arc::new(SystemClock),
        )
        .with_sweep_interval(Duration::from_millis(config.limiter.sweep_interval_ms)))
    }

    /// Replace the clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the interval used by [`Gate::spawn_sweeper`].
    pub fn with_sweep_interval(mut self, every: Duration) -> Self {
        self.sweep_interval = every;
        self
    }

    pub fn sweep_interval(&self) -> Duration {
        self.sweep_interval
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    pub fn rules(&self) -> &LimitRules {
        &self.rules
    }

    pub fn identifier(&self) -> &ClientIdentifier {
        &self.identifier
    }

    /// Admit a request for `route`, identifying the client from `headers`.
    #[instrument(skip(self, headers))]
    pub fn admit<H: HeaderSource + ?Sized>(&self, headers: &H, route: &str) -> Result<Admission> {
        let client = self.identifier.extract(headers);
        self.admit_client(&client, route)
    }

    /// Admit a request for `route` from an already identified client.
    pub fn admit_client(&self, client: &str, route: &str) -> Result<Admission> {
        let config = self
            .rules
            .find(route)
            .ok_or_else(|| AdmissionError::UnknownRoute(route.to_string()))?;

        let key = LimiterKey::new(client, route);
        let decision = self
            .limiter
            .check(&key.to_string_key(), config, self.clock.now_ms())?;

        if decision.allowed {
            debug!(key = %key, "Request admitted");
        } else {
            info!(
                key = %key,
                retry_after_ms = decision.retry_after_ms,
                "Request rejected by rate limit"
            );
        }

        Ok(Admission { key, decision })
    }

    /// Start evicting idle limiter state in the background, at the
    /// configured sweep interval.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn_sweeper(&self) -> Result<Sweeper> {
        Sweeper::spawn(self.limiter.clone(), self.clock.clone(), self.sweep_interval)
    }
}

impl std::fmt::Debug for Gate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gate")
            .field("limiter", &self.limiter)
            .field("identifier", &self.identifier)
            .field("rules", &self.rules)
            .field("sweep_interval", &self.sweep_interval)
            .finish()
    }
}
