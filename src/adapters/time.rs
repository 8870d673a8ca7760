//! Monotonic clock adapter.
//!
//! Supplies the `now` handed to every scheduler pass.
//!
//! - **`target_os = "espidf"`**: wraps `esp_timer_get_time()` from the
//!   ESP-IDF high-resolution timer (microsecond precision, monotonic).
//! - **`not(target_os = "espidf")`**: uses `std::time::Instant` for
//!   host-side testing and simulation.

use crate::scheduler::Millis;

/// Milliseconds since boot.
pub struct MonotonicClock {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }

    #[cfg(target_os = "espidf")]
    pub fn now_ms(&self) -> Millis {
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as Millis / 1000
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn now_ms(&self) -> Millis {
        self.start.elapsed().as_millis() as Millis
    }
}
