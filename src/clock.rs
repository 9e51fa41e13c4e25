//! Injectable time source for duration accounting
//!
//! Every component that attributes wall-clock duration to an atom takes a
//! `Clock` at construction instead of reading `SystemTime` directly. Duration
//! correctness is entirely a function of controllable time in tests, so the
//! seam is part of the design, not a testing convenience.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Millisecond wall-clock source
///
/// # Thread Safety
///
/// Implementations must be shareable across phone trackers and the store;
/// all in-crate implementations are lock-free.
pub trait Clock: Send + Sync {
    /// Current time in milliseconds since the Unix epoch
    fn now_millis(&self) -> u64;
}

/// Production clock backed by `SystemTime`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

/// Manually advanced clock for deterministic tests
///
/// # Example
///
/// ```
/// use radiometrics::clock::{Clock, ManualClock};
///
/// let clock = ManualClock::new(2000);
/// assert_eq!(clock.now_millis(), 2000);
/// clock.advance(500);
/// assert_eq!(clock.now_millis(), 2500);
/// ```
#[derive(Debug, Default)]
pub struct ManualClock {
    now_millis: AtomicU64,
}

impl ManualClock {
    /// Create a clock frozen at `start_millis`
    pub fn new(start_millis: u64) -> Self {
        Self {
            now_millis: AtomicU64::new(start_millis),
        }
    }

    /// Advance the clock by `delta_millis`
    pub fn advance(&self, delta_millis: u64) {
        self.now_millis.fetch_add(delta_millis, Ordering::SeqCst);
    }

    /// Jump the clock to an absolute time
    pub fn set(&self, now_millis: u64) {
        self.now_millis.store(now_millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.now_millis.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_is_nonzero() {
        let clock = SystemClock;
        assert!(clock.now_millis() > 0);
    }

    #[test]
    fn test_manual_clock_starts_at_given_time() {
        let clock = ManualClock::new(1234);
        assert_eq!(clock.now_millis(), 1234);
    }

    #[test]
    fn test_manual_clock_advances() {
        let clock = ManualClock::new(100);
        clock.advance(50);
        clock.advance(50);
        assert_eq!(clock.now_millis(), 200);
    }

    #[test]
    fn test_manual_clock_set_jumps() {
        let clock = ManualClock::new(100);
        clock.set(99_999);
        assert_eq!(clock.now_millis(), 99_999);
    }

    #[test]
    fn test_manual_clock_shared_across_threads() {
        use std::sync::Arc;

        let clock = Arc::new(ManualClock::new(0));
        let c2 = clock.clone();
        let handle = std::thread::spawn(move || {
            c2.advance(10);
        });
        handle.join().unwrap();
        assert_eq!(clock.now_millis(), 10);
    }
}
