//! Time-related utilities with clock abstraction for testability.

use chrono::{DateTime, TimeZone, Utc};

/// Clock trait for dependency injection and testing
pub trait Clock: Send + Sync {
    /// Get the current instant in UTC
    fn now_utc(&self) -> DateTime<Utc>;
}

/// System clock implementation (uses actual system time)
#[derive(Debug, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Fixed clock implementation for testing (returns a fixed time)
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    fixed_time: DateTime<Utc>,
}

impl FixedClock {
    /// Create a new fixed clock with the given instant
    pub fn new(fixed_time: DateTime<Utc>) -> Self {
        Self { fixed_time }
    }

    /// Create a new fixed clock from a Unix timestamp in milliseconds
    pub fn from_millis(millis: i64) -> Self {
        Self {
            fixed_time: Utc
                .timestamp_millis_opt(millis)
                .single()
                .unwrap_or_default(),
        }
    }
}

impl Clock for FixedClock {
    fn now_utc(&self) -> DateTime<Utc> {
        self.fixed_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_returns_current_time() {
        // given:
        let clock = SystemClock;

        // when:
        let now = clock.now_utc();

        // then:
        assert!(now.timestamp_millis() > 0);
    }

    #[test]
    fn test_system_clock_returns_increasing_timestamps() {
        // given:
        let clock = SystemClock;

        // when:
        let first = clock.now_utc();
        std::thread::sleep(std::time::Duration::from_millis(10));
        let second = clock.now_utc();

        // then:
        assert!(second >= first);
    }

    #[test]
    fn test_fixed_clock_returns_fixed_timestamp() {
        // given:
        let clock = FixedClock::from_millis(1234567890123);

        // when:
        let now = clock.now_utc();

        // then:
        assert_eq!(now.timestamp_millis(), 1234567890123);
    }

    #[test]
    fn test_fixed_clock_returns_consistent_timestamp() {
        // given:
        let clock = FixedClock::from_millis(9876543210987);

        // when:
        let first = clock.now_utc();
        let second = clock.now_utc();

        // then:
        assert_eq!(first, second);
        assert_eq!(first.timestamp_millis(), 9876543210987);
    }

    #[test]
    fn test_fixed_clock_rfc3339_rendering() {
        // given: 2023-01-01 00:00:00 UTC
        let clock = FixedClock::from_millis(1672531200000);

        // when:
        let rendered = clock.now_utc().to_rfc3339();

        // then:
        assert!(rendered.starts_with("2023-01-01T00:00:00"));
    }
}
