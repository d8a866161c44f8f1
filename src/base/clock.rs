//! Injectable clock, so retention windows and keystroke timeouts are
//! testable without sleeping or touching the system time.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

pub trait Clock: Send + Sync {
    /// Seconds since the Unix epoch.
    fn now_secs(&self) -> u64;

    /// Milliseconds since the Unix epoch.
    fn now_msecs(&self) -> u64 {
        self.now_secs() * 1000
    }
}

/// Wall clock. The only implementation used outside tests.
#[derive(Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_secs(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }

    fn now_msecs(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

/// Settable clock for deterministic tests. Supports forward and backward
/// jumps; there is no special-cased production code path behind it.
pub struct ClockMock {
    msecs: AtomicU64,
}

impl ClockMock {
    pub fn new(secs: u64) -> Self {
        Self {
            msecs: AtomicU64::new(secs * 1000),
        }
    }

    pub fn set_secs(&self, secs: u64) {
        self.msecs.store(secs * 1000, Ordering::SeqCst);
    }

    pub fn put_forward(&self, secs: u64, msecs: u64) {
        self.msecs.fetch_add(secs * 1000 + msecs, Ordering::SeqCst);
    }

    pub fn put_backward(&self, secs: u64, msecs: u64) {
        self.msecs.fetch_sub(secs * 1000 + msecs, Ordering::SeqCst);
    }
}

impl Clock for ClockMock {
    fn now_secs(&self) -> u64 {
        self.msecs.load(Ordering::SeqCst) / 1000
    }

    fn now_msecs(&self) -> u64 {
        self.msecs.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_forward_and_backward() {
        let clock = ClockMock::new(86400);
        assert_eq!(clock.now_secs(), 86400);
        assert_eq!(clock.now_msecs(), 86400 * 1000);

        clock.put_forward(3, 500);
        assert_eq!(clock.now_msecs(), 86400 * 1000 + 3500);
        assert_eq!(clock.now_secs(), 86403);

        clock.put_backward(1, 0);
        assert_eq!(clock.now_secs(), 86402);
    }

    #[test]
    fn system_clock_is_monotonic_enough() {
        let clock = SystemClock;
        let a = clock.now_secs();
        let b = clock.now_secs();
        assert!(b >= a);
    }
}
