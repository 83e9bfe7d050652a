//! Clock abstraction and interval waiting.
//!
//! Wait loops depend on an injected [`Clock`] rather than calling
//! `std::thread::sleep` directly, so polling logic can be exercised in
//! tests without real delays.

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Source of time and sleeping for wait loops.
pub trait Clock: Send + Sync {
    /// Current monotonic instant.
    fn now(&self) -> Instant;

    /// Block the calling thread for the given duration.
    fn sleep(&self, duration: Duration);
}

/// The real wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Deterministic clock whose sleeps advance a virtual instant.
///
/// Intended for tests of polling logic; also usable by downstream crates
/// testing their own automation flows.
#[derive(Debug)]
pub struct ManualClock {
    start: Instant,
    elapsed: Mutex<Duration>,
}

impl ManualClock {
    /// Create a clock at virtual time zero.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            elapsed: Mutex::new(Duration::ZERO),
        }
    }

    /// Advance the virtual time.
    pub fn advance(&self, duration: Duration) {
        let mut elapsed = self.elapsed.lock().expect("clock lock poisoned");
        *elapsed += duration;
    }

    /// Total virtual time elapsed since creation.
    pub fn elapsed(&self) -> Duration {
        *self.elapsed.lock().expect("clock lock poisoned")
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.start + self.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}

/// Returned by [`Wait::tick`] once the timeout budget is exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitExpired {
    /// Total time slept before expiry
    pub waited: Duration,
}

/// Interval sleeper with a timeout budget.
///
/// `tick()` sleeps one polling interval per call, never past the deadline:
/// the final sleep is truncated to the remaining budget, and the call after
/// the budget is used up fails instead of sleeping. A poll loop of the form
/// `loop { check; wait.tick()?; }` therefore observes a condition that
/// becomes true during interval k after exactly k ticks, and expires after
/// at most `timeout` of total sleeping.
pub struct Wait<'a> {
    clock: &'a dyn Clock,
    timeout: Duration,
    interval: Duration,
    waited: Duration,
}

impl<'a> Wait<'a> {
    /// Create a new wait with the given budget and polling interval.
    pub fn new(clock: &'a dyn Clock, timeout: Duration, interval: Duration) -> Self {
        Self {
            clock,
            timeout,
            interval,
            waited: Duration::ZERO,
        }
    }

    /// Sleep for one interval, truncated to the remaining budget.
    ///
    /// Fails with [`WaitExpired`] when the budget was already exhausted
    /// before sleeping.
    pub fn tick(&mut self) -> std::result::Result<(), WaitExpired> {
        if self.waited >= self.timeout {
            return Err(WaitExpired {
                waited: self.waited,
            });
        }
        let nap = self.interval.min(self.timeout - self.waited);
        self.clock.sleep(nap);
        self.waited += nap;
        Ok(())
    }

    /// Total time slept so far.
    pub fn waited(&self) -> Duration {
        self.waited
    }

    /// Total time slept so far, in milliseconds.
    pub fn waited_ms(&self) -> u64 {
        self.waited.as_millis() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_monotonic() {
        let clock = SystemClock;
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }

    #[test]
    fn test_manual_clock_advance() {
        let clock = ManualClock::new();
        let start = clock.now();

        clock.sleep(Duration::from_secs(2));
        assert_eq!(clock.now() - start, Duration::from_secs(2));
        assert_eq!(clock.elapsed(), Duration::from_secs(2));

        clock.advance(Duration::from_secs(1));
        assert_eq!(clock.elapsed(), Duration::from_secs(3));
    }

    #[test]
    fn test_wait_tick_counts() {
        let clock = ManualClock::new();
        let mut wait = Wait::new(&clock, Duration::from_secs(5), Duration::from_secs(1));

        for _ in 0..5 {
            wait.tick().unwrap();
        }
        let expired = wait.tick().unwrap_err();
        assert_eq!(expired.waited, Duration::from_secs(5));
        assert_eq!(clock.elapsed(), Duration::from_secs(5));
    }

    #[test]
    fn test_wait_final_sleep_truncated() {
        let clock = ManualClock::new();
        let mut wait = Wait::new(&clock, Duration::from_millis(2500), Duration::from_secs(1));

        wait.tick().unwrap();
        wait.tick().unwrap();
        wait.tick().unwrap(); // truncated to 500ms
        assert_eq!(clock.elapsed(), Duration::from_millis(2500));
        assert!(wait.tick().is_err());
    }

    #[test]
    fn test_wait_never_sleeps_past_deadline() {
        let clock = ManualClock::new();
        let mut wait = Wait::new(&clock, Duration::from_secs(3), Duration::from_secs(2));

        while wait.tick().is_ok() {}
        assert_eq!(clock.elapsed(), Duration::from_secs(3));
    }

    #[test]
    fn test_waited_ms() {
        let clock = ManualClock::new();
        let mut wait = Wait::new(&clock, Duration::from_secs(5), Duration::from_millis(1500));
        wait.tick().unwrap();
        assert_eq!(wait.waited_ms(), 1500);
    }
}
