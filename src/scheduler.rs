//! Software timers for the cooperative scheduler pass.
//!
//! There are no hardware timers or threads behind these: every component
//! keeps one or more [`Cadence`]s and asks, once per
//! [`Runtime::tick`](crate::app::service::Runtime::tick), whether enough
//! time has passed since it last ran.
//!
//! ```text
//!   now ──▶ Cadence::fire_if_due ──▶ true  → run work, remember `now`
//!                                └─▶ false → skip this pass
//! ```

/// Milliseconds since boot.  Monotonic, never wraps in practice (u64).
pub type Millis = u64;

/// A "time since last due" software timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cadence {
    period_ms: Millis,
    last_ms: Millis,
    /// Fire only once elapsed time is strictly greater than the period.
    strict: bool,
}

impl Cadence {
    /// Due when `now - last >= period`.  The first fire happens once
    /// `now >= period`, measured from boot.
    pub const fn every(period_ms: Millis) -> Self {
        Self {
            period_ms,
            last_ms: 0,
            strict: false,
        }
    }

    /// Due when `now - last > period`.
    pub const fn after(period_ms: Millis) -> Self {
        Self {
            period_ms,
            last_ms: 0,
            strict: true,
        }
    }

    pub fn period_ms(&self) -> Millis {
        self.period_ms
    }

    /// Change the period without touching the last-fired timestamp.
    pub fn set_period_ms(&mut self, period_ms: Millis) {
        self.period_ms = period_ms;
    }

    pub fn last_ms(&self) -> Millis {
        self.last_ms
    }

    pub fn elapsed(&self, now: Millis) -> Millis {
        now.saturating_sub(self.last_ms)
    }

    pub fn is_due(&self, now: Millis) -> bool {
        let elapsed = self.elapsed(now);
        if self.strict {
            elapsed > self.period_ms
        } else {
            elapsed >= self.period_ms
        }
    }

    /// Record that the work ran at `now`.
    pub fn mark(&mut self, now: Millis) {
        self.last_ms = now;
    }

    /// `is_due` + `mark` in one step.
    pub fn fire_if_due(&mut self, now: Millis) -> bool {
        if self.is_due(now) {
            self.mark(now);
            true
        } else {
            false
        }
    }
}
