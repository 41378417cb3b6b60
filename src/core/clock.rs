//! Time sources for calibrated, blocking actuation steps.
//!
//! Every move and every profile step holds for a fixed duration. Nothing is
//! measured; the clock only decides whether that duration is spent on the
//! wall clock ([`SystemClock`]) or on a virtual timeline ([`SimClock`]).

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Blocking time source
pub trait Clock: Send + Sync {
    /// Block for `duration`
    fn sleep(&self, duration: Duration);

    /// Time since the clock was created
    fn elapsed(&self) -> Duration;
}

/// Wall clock backed by `std::thread::sleep`
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }

    fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

/// Virtual clock for dry runs and tests.
///
/// Sleeping advances a shared virtual timeline. With a positive
/// `speed_factor` the calling thread additionally sleeps
/// `duration / speed_factor` of real time (2.0 = twice as fast as hardware);
/// a zero factor never blocks.
#[derive(Clone)]
pub struct SimClock {
    now: Arc<Mutex<Duration>>,
    speed_factor: f32,
}

impl SimClock {
    /// Create a clock that also spends scaled real time
    pub fn new(speed_factor: f32) -> Self {
        Self {
            now: Arc::new(Mutex::new(Duration::ZERO)),
            speed_factor: speed_factor.max(0.0),
        }
    }

    /// Create a clock that never blocks
    pub fn instant() -> Self {
        Self::new(0.0)
    }
}

impl Clock for SimClock {
    fn sleep(&self, duration: Duration) {
        *self.now.lock() += duration;
        if self.speed_factor > 0.0 && !duration.is_zero() {
            std::thread::sleep(duration.div_f32(self.speed_factor));
        }
    }

    fn elapsed(&self) -> Duration {
        *self.now.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sim_clock_accumulates_virtual_time() {
        let clock = SimClock::instant();
        let shared = clock.clone();
        clock.sleep(Duration::from_millis(1500));
        shared.sleep(Duration::from_millis(500));
        assert_eq!(clock.elapsed(), Duration::from_secs(2));
    }

    #[test]
    fn test_negative_speed_factor_is_clamped() {
        let clock = SimClock::new(-3.0);
        let start = Instant::now();
        clock.sleep(Duration::from_secs(60));
        assert!(start.elapsed() < Duration::from_secs(1));
        assert_eq!(clock.elapsed(), Duration::from_secs(60));
    }
}
