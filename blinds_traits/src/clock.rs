use std::thread;
use std::time::{Duration, Instant};

/// Monotonic time source for travel estimation and the poll loop.
///
/// - now(): current monotonic instant
/// - sleep(): block for the given duration (test clocks just advance)
/// - secs_since(): elapsed seconds from an anchor instant
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, d: Duration);

    /// Seconds elapsed since `anchor`, saturating at 0 if `anchor` lies in the future.
    fn secs_since(&self, anchor: Instant) -> f64 {
        self.now().saturating_duration_since(anchor).as_secs_f64()
    }
}

/// Wall clock backed by `std::time::Instant`.
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotonicClock;

impl MonotonicClock {
    #[inline]
    pub fn new() -> Self {
        Self
    }
}

impl Clock for MonotonicClock {
    #[inline]
    fn now(&self) -> Instant {
        Instant::now()
    }

    #[inline]
    fn sleep(&self, d: Duration) {
        if d.is_zero() {
            return;
        }
        thread::sleep(d);
    }
}

#[cfg(any(test, feature = "test-clock"))]
pub mod test_clock {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Deterministic clock for tests; time only moves when told to.
    ///
    /// Clones share the same timeline, so a test can keep one handle and
    /// hand another to the controller.
    #[derive(Debug, Clone)]
    pub struct TestClock {
        origin: Instant,
        offset: Arc<Mutex<Duration>>,
    }

    impl Default for TestClock {
        fn default() -> Self {
            Self::new()
        }
    }

    impl TestClock {
        pub fn new() -> Self {
            Self {
                origin: Instant::now(),
                offset: Arc::new(Mutex::new(Duration::ZERO)),
            }
        }

        pub fn advance(&self, d: Duration) {
            if let Ok(mut off) = self.offset.lock() {
                *off = off.saturating_add(d);
            }
        }

        /// Convenience for fractional seconds; negative or NaN input is ignored.
        pub fn advance_secs(&self, secs: f64) {
            if secs.is_finite() && secs > 0.0 {
                self.advance(Duration::from_secs_f64(secs));
            }
        }

        /// Total simulated time since the clock was created.
        pub fn elapsed(&self) -> Duration {
            self.offset.lock().map(|g| *g).unwrap_or(Duration::ZERO)
        }
    }

    impl Clock for TestClock {
        fn now(&self) -> Instant {
            self.origin + self.elapsed()
        }

        fn sleep(&self, d: Duration) {
            self.advance(d);
        }
    }

}
