//! Linear-capped reconnect backoff with a hard attempt ceiling.
//!
//! interval(n) = base + min(n, cap) × step
//!
//! With the reference timing (1 s, 2 s, cap 10) the sequence is
//! 1 s, 3 s, 5 s … 21 s.  Once `max_attempts` connect attempts have been
//! spent the policy reports exhaustion and the caller stops attempting.
//! Only a successful link resets the counter; there is no timed auto-reset.

use crate::config::TimingConfig;
use crate::scheduler::{Cadence, Millis};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub base_ms: Millis,
    pub step_ms: Millis,
    pub cap: u8,
    pub max_attempts: u8,
}

impl BackoffPolicy {
    pub fn from_timing(timing: &TimingConfig) -> Self {
        Self {
            base_ms: timing.link_backoff_base_ms,
            step_ms: timing.link_backoff_step_ms,
            cap: timing.link_backoff_cap,
            max_attempts: timing.link_max_attempts,
        }
    }

    /// Interval to wait after `attempts` failed attempts.
    pub fn interval_ms(&self, attempts: u8) -> Millis {
        self.base_ms + Millis::from(attempts.min(self.cap)) * self.step_ms
    }
}

/// Attempt counter plus the timestamp of the last check.
#[derive(Debug, Clone)]
pub struct Backoff {
    policy: BackoffPolicy,
    attempts: u8,
    check: Cadence,
}

impl Backoff {
    pub fn new(policy: BackoffPolicy) -> Self {
        Self {
            policy,
            attempts: 0,
            check: Cadence::every(policy.interval_ms(0)),
        }
    }

    /// Whether the current interval has elapsed; marks the check if so.
    pub fn check_due(&mut self, now: Millis) -> bool {
        self.check.fire_if_due(now)
    }

    /// Count one connect attempt.  Saturates at `max_attempts`.
    pub fn record_attempt(&mut self) {
        if self.attempts < self.policy.max_attempts {
            self.attempts += 1;
        }
        self.check.set_period_ms(self.policy.interval_ms(self.attempts));
    }

    /// Successful link: back to the base interval.
    pub fn reset(&mut self) {
        self.attempts = 0;
        self.check.set_period_ms(self.policy.interval_ms(0));
    }

    pub fn attempts(&self) -> u8 {
        self.attempts
    }

    pub fn is_exhausted(&self) -> bool {
        self.attempts >= self.policy.max_attempts
    }

    pub fn interval_ms(&self) -> Millis {
        self.check.period_ms()
    }

    pub fn policy(&self) -> &BackoffPolicy {
        &self.policy
    }
}
