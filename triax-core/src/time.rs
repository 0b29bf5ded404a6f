//! Time management for the rig loop
//!
//! Provides a clock abstraction and the interval gate every main-loop
//! subsystem uses:
//! - Monotonic clock (std builds, measured from construction)
//! - Fixed clock (tests and replay)
//! - `IntervalTimer`, which fires once its period has elapsed since the
//!   last time it fired. There are no timers or alarms; callers check it on
//!   every loop iteration.

use crate::constants::time::MS_PER_SECOND;

/// Timestamp in milliseconds since the clock's origin
pub type Timestamp = u64;

/// Source of time for the system
pub trait TimeSource {
    /// Get current timestamp in milliseconds
    fn now(&self) -> Timestamp;
}

/// Monotonic time source backed by `std::time::Instant`
///
/// Starts at 0 on construction, always increases
#[cfg(feature = "std")]
#[derive(Debug, Clone)]
pub struct MonotonicTime {
    origin: std::time::Instant,
}

#[cfg(feature = "std")]
impl MonotonicTime {
    /// Clock reading 0 now
    pub fn new() -> Self {
        Self { origin: std::time::Instant::now() }
    }
}

#[cfg(feature = "std")]
impl Default for MonotonicTime {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl TimeSource for MonotonicTime {
    fn now(&self) -> Timestamp {
        self.origin.elapsed().as_millis() as Timestamp
    }
}

/// Fixed time source for testing
#[derive(Debug, Clone)]
pub struct FixedTime {
    timestamp: Timestamp,
}

impl FixedTime {
    /// Clock stopped at `timestamp`
    pub fn new(timestamp: Timestamp) -> Self {
        Self { timestamp }
    }

    /// Move the clock to `timestamp`
    pub fn set(&mut self, timestamp: Timestamp) {
        self.timestamp = timestamp;
    }

    /// Move the clock forward by `ms`
    pub fn advance(&mut self, ms: u64) {
        self.timestamp += ms;
    }
}

impl TimeSource for FixedTime {
    fn now(&self) -> Timestamp {
        self.timestamp
    }
}

/// Elapsed seconds between two timestamps (zero if the clock went backwards)
pub fn elapsed_secs(earlier: Timestamp, later: Timestamp) -> f32 {
    later.saturating_sub(earlier) as f32 / MS_PER_SECOND as f32
}

/// [`elapsed_secs`] at full millisecond resolution over multi-day spans
pub fn elapsed_secs_f64(earlier: Timestamp, later: Timestamp) -> f64 {
    later.saturating_sub(earlier) as f64 / MS_PER_SECOND as f64
}

/// Convert a period in seconds to whole milliseconds
pub fn secs_to_ms(secs: f32) -> u64 {
    if secs <= 0.0 {
        return 0;
    }
    libm::roundf(secs * MS_PER_SECOND as f32) as u64
}

/// Fires when more than `period_ms` has elapsed since it last fired
///
/// ```rust
/// use triax_core::time::IntervalTimer;
///
/// let mut save = IntervalTimer::new(1000, 0);
/// assert!(!save.fire(1000)); // exactly one period is not enough
/// assert!(save.fire(1001));
/// assert!(!save.fire(1500));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct IntervalTimer {
    period_ms: u64,
    last_fired: Timestamp,
}

impl IntervalTimer {
    /// Create a timer whose first period starts at `start`
    pub const fn new(period_ms: u64, start: Timestamp) -> Self {
        Self { period_ms, last_fired: start }
    }

    /// Current period
    pub fn period_ms(&self) -> u64 {
        self.period_ms
    }

    /// Change the period without restarting the current one
    pub fn set_period_ms(&mut self, period_ms: u64) {
        self.period_ms = period_ms;
    }

    /// Whether the period has elapsed, without consuming it
    pub fn is_due(&self, now: Timestamp) -> bool {
        now.saturating_sub(self.last_fired) > self.period_ms
    }

    /// Restart the period at `now`
    pub fn restart(&mut self, now: Timestamp) {
        self.last_fired = now;
    }

    /// Returns true and restarts the period if it has elapsed
    pub fn fire(&mut self, now: Timestamp) -> bool {
        if self.is_due(now) {
            self.last_fired = now;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_time_advances() {
        let mut time = FixedTime::new(1000);
        assert_eq!(time.now(), 1000);

        time.advance(500);
        assert_eq!(time.now(), 1500);
    }

    #[test]
    fn interval_fires_once_per_period() {
        let mut timer = IntervalTimer::new(500, 0);
        assert!(!timer.fire(200));
        assert!(timer.fire(501));
        assert!(!timer.fire(900));
        assert!(timer.fire(1002));
    }

    #[test]
    fn interval_period_change_keeps_origin() {
        let mut timer = IntervalTimer::new(1000, 0);
        timer.set_period_ms(100);
        assert!(timer.is_due(101));
    }

    #[test]
    fn long_spans_keep_milliseconds() {
        const DAY_MS: Timestamp = 86_400_000;
        assert_eq!(elapsed_secs_f64(0, DAY_MS + 1), 86_400.001);
        assert_eq!(elapsed_secs_f64(0, DAY_MS + 3), 86_400.003);
        assert_eq!(elapsed_secs_f64(500, 10 * DAY_MS + 540), 864_000.04);
        assert_eq!(elapsed_secs_f64(10, 5), 0.0);
    }

    #[test]
    fn elapsed_handles_backwards_clock() {
        assert_eq!(elapsed_secs(2000, 1000), 0.0);
        assert_eq!(elapsed_secs(1000, 3500), 2.5);
    }

    #[test]
    fn seconds_round_to_ms() {
        assert_eq!(secs_to_ms(0.5), 500);
        assert_eq!(secs_to_ms(-1.0), 0);
    }
}
