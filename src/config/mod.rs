//! Session configuration (layered: code > env > defaults).

use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::policy::CompletionPolicy;

/// Configuration for one conversation session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Completion policy applied to every round of this conversation.
    pub policy: CompletionPolicy,
    /// Delay before the deferred re-evaluation scheduled after an approval
    /// is recorded. Zero means the next scheduler tick.
    pub resubmit_delay: Duration,
    /// Upper bound on true decisions per message; a guard against runaway
    /// resubmission loops, not a substitute for the fingerprint cache.
    pub max_rounds_per_message: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            policy: CompletionPolicy::ApprovalGated,
            resubmit_delay: Duration::ZERO,
            max_rounds_per_message: 20,
        }
    }
}

impl SessionConfig {
    pub fn new(policy: CompletionPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// Load defaults, then apply environment overrides
    /// (`CONFAB_POLICY`, `CONFAB_RESUBMIT_DELAY_MS`, `CONFAB_MAX_ROUNDS`).
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        let mut config = Self::default();

        if let Ok(raw) = std::env::var("CONFAB_POLICY") {
            match CompletionPolicy::from_str(&raw) {
                Ok(policy) => config.policy = policy,
                Err(_) => warn!(value = %raw, "ignoring unknown CONFAB_POLICY"),
            }
        }
        if let Ok(raw) = std::env::var("CONFAB_RESUBMIT_DELAY_MS") {
            match raw.parse::<u64>() {
                Ok(ms) => config.resubmit_delay = Duration::from_millis(ms),
                Err(_) => warn!(value = %raw, "ignoring invalid CONFAB_RESUBMIT_DELAY_MS"),
            }
        }
        if let Ok(raw) = std::env::var("CONFAB_MAX_ROUNDS") {
            match raw.parse::<usize>() {
                Ok(n) if n > 0 => config.max_rounds_per_message = n,
                _ => warn!(value = %raw, "ignoring invalid CONFAB_MAX_ROUNDS"),
            }
        }

        config
    }

    #[must_use]
    pub fn with_policy(mut self, policy: CompletionPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_resubmit_delay(mut self, delay: Duration) -> Self {
        self.resubmit_delay = delay;
        self
    }

    #[must_use]
    pub fn with_max_rounds_per_message(mut self, max: usize) -> Self {
        self.max_rounds_per_message = max;
        self
    }
}
