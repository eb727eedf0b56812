// clock.rs

use std::time::{Duration, Instant};

/// Monotonic clock reporting seconds since its origin as `f64`.
///
/// Every timestamp in a run (dispatch, echo, note-off due time) comes from
/// one shared clock so deltas are comparable.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        MonotonicClock {
            origin: Instant::now(),
        }
    }

    pub fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }

    pub fn elapsed(&self) -> Duration {
        self.origin.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_is_monotonic() {
        let clock = MonotonicClock::new();
        let a = clock.now();
        std::thread::sleep(Duration::from_millis(2));
        let b = clock.now();
        assert!(a >= 0.0);
        assert!(b > a);
    }

    #[test]
    fn test_copies_share_origin() {
        let clock = MonotonicClock::new();
        let copy = clock;
        std::thread::sleep(Duration::from_millis(1));
        assert!((clock.now() - copy.now()).abs() < 0.001);
    }
}
