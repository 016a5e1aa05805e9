//! Clock abstraction for testable ingestion timestamps.
//!
//! The store stamps `created_at` at the moment of a winning insert. Routing
//! that read through a [`Clock`] lets production code use the system clock
//! while tests pin time to a known value.

use std::{
    fmt,
    sync::{Arc, Mutex},
};

use chrono::{DateTime, Duration, Utc};

/// Source of the current UTC wall-clock time.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Returns the current time in UTC.
    fn now_utc(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealClock;

impl RealClock {
    /// Creates a new real clock instance.
    pub fn new() -> Self {
        Self
    }
}

impl Clock for RealClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Test clock pinned to a controllable instant.
#[derive(Debug, Clone)]
pub struct TestClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl TestClock {
    /// Creates a test clock starting at the current system time.
    pub fn new() -> Self {
        Self::at(Utc::now())
    }

    /// Creates a test clock pinned to the given instant.
    pub fn at(start: DateTime<Utc>) -> Self {
        Self { now: Arc::new(Mutex::new(start)) }
    }

    /// Jumps the clock to a specific instant.
    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock().expect("test clock lock poisoned") = to;
    }

    /// Advances the clock by the given duration.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().expect("test clock lock poisoned");
        *now = *now + by;
    }
}

impl Default for TestClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TestClock {
    fn now_utc(&self) -> DateTime<Utc> {
        *self.now.lock().expect("test clock lock poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instant(rfc3339: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(rfc3339).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_clock_holds_pinned_time() {
        let start = instant("2025-01-01T00:00:00Z");
        let clock = TestClock::at(start);

        assert_eq!(clock.now_utc(), start);
        assert_eq!(clock.now_utc(), start);
    }

    #[test]
    fn test_clock_advances() {
        let clock = TestClock::at(instant("2025-01-01T00:00:00Z"));

        clock.advance(Duration::seconds(90));

        assert_eq!(clock.now_utc(), instant("2025-01-01T00:01:30Z"));
    }

    #[test]
    fn test_clock_jumps() {
        let clock = TestClock::at(instant("2025-01-01T00:00:00Z"));
        let target = instant("2024-06-01T12:00:00Z");

        clock.set(target);

        assert_eq!(clock.now_utc(), target);
    }
}
