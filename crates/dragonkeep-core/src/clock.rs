//! Wall-clock source for timer and offline-time math.
//!
//! All timestamps are whole seconds: timers are persisted as Unix seconds,
//! so the in-memory value must match what a reload would produce.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, SubsecRound, Utc};

/// A source of the current time.
pub trait Clock: Send + Sync + 'static {
    /// The current instant, truncated to whole seconds.
    fn now(&self) -> DateTime<Utc>;
}

/// The system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now().trunc_subsecs(0)
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    secs: Arc<AtomicI64>,
}

impl ManualClock {
    /// Start the clock at `unix_secs`.
    pub fn at(unix_secs: i64) -> Self {
        Self {
            secs: Arc::new(AtomicI64::new(unix_secs)),
        }
    }

    /// Jump to `unix_secs`.
    pub fn set(&self, unix_secs: i64) {
        self.secs.store(unix_secs, Ordering::SeqCst);
    }

    /// Move forward by `secs` (saturating).
    pub fn advance(&self, secs: i64) {
        let current = self.secs.load(Ordering::SeqCst);
        self.secs
            .store(current.saturating_add(secs), Ordering::SeqCst);
    }

    /// Current time as Unix seconds.
    pub fn unix_secs(&self) -> i64 {
        self.secs.load(Ordering::SeqCst)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.unix_secs(), 0).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_has_no_subseconds() {
        assert_eq!(SystemClock.now().timestamp_subsec_nanos(), 0);
    }

    #[test]
    fn manual_clock_moves_only_when_told() {
        let clock = ManualClock::at(1_000);
        assert_eq!(clock.now().timestamp(), 1_000);

        clock.advance(600);
        assert_eq!(clock.now().timestamp(), 1_600);

        let shared = clock.clone();
        shared.set(5);
        assert_eq!(clock.now().timestamp(), 5);
    }
}
