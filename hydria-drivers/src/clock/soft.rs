//! Software wall clock
//!
//! Keeps calendar time by adding a monotonic uptime to the last time it
//! was set. Loses the time on every reset, so it reports halted until it
//! has been written once.

use hydria_core::time::DateTime;
use hydria_core::traits::{ClockError, ClockSource};

/// Monotonic seconds since boot
pub trait Uptime {
    fn uptime_secs(&self) -> u64;
}

impl<U: Uptime> Uptime for &U {
    fn uptime_secs(&self) -> u64 {
        (**self).uptime_secs()
    }
}

/// Clock source backed by an uptime counter
pub struct SoftClock<U> {
    uptime: U,
    /// Unix time and the uptime at which it was set
    base: Option<(u64, u64)>,
}

impl<U: Uptime> SoftClock<U> {
    /// Create a clock that has not been set
    pub fn new(uptime: U) -> Self {
        Self { uptime, base: None }
    }

    /// Current Unix time, if set
    pub fn unix_time(&self) -> Option<u64> {
        let (epoch, at) = self.base?;
        let now = self.uptime.uptime_secs();
        Some(epoch + now.saturating_sub(at))
    }
}

impl<U: Uptime> ClockSource for SoftClock<U> {
    fn read(&mut self) -> Option<DateTime> {
        self.unix_time().map(DateTime::from_unix)
    }

    fn write(&mut self, time: DateTime) -> Result<(), ClockError> {
        if !time.is_valid() {
            return Err(ClockError::InvalidTimestamp);
        }
        let epoch = time.to_unix().ok_or(ClockError::InvalidTimestamp)?;
        self.base = Some((epoch, self.uptime.uptime_secs()));
        Ok(())
    }

    fn is_halted(&mut self) -> bool {
        self.base.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    struct FakeUptime(Cell<u64>);

    impl Uptime for FakeUptime {
        fn uptime_secs(&self) -> u64 {
            self.0.get()
        }
    }

    #[test]
    fn test_halted_until_written() {
        let uptime = FakeUptime(Cell::new(10));
        let mut clock = SoftClock::new(&uptime);
        assert!(clock.is_halted());
        assert_eq!(clock.read(), None);
        assert_eq!(clock.start(), Err(ClockError::Unsupported));

        clock.write(DateTime::new(2025, 3, 30, 23, 59, 0)).unwrap();
        assert!(!clock.is_halted());
        assert_eq!(clock.read(), Some(DateTime::new(2025, 3, 30, 23, 59, 0)));
    }

    #[test]
    fn test_advances_with_uptime() {
        let uptime = FakeUptime(Cell::new(100));
        let mut clock = SoftClock::new(&uptime);
        clock.write(DateTime::new(2024, 2, 28, 23, 59, 30)).unwrap();

        uptime.0.set(100 + 24 * 3600 + 30);
        assert_eq!(clock.read(), Some(DateTime::new(2024, 3, 1, 0, 0, 0)));
    }

    #[test]
    fn test_rejects_invalid_time() {
        let uptime = FakeUptime(Cell::new(0));
        let mut clock = SoftClock::new(&uptime);
        let bad = DateTime {
            day: 30,
            ..DateTime::new(2025, 2, 1, 0, 0, 0)
        };
        assert_eq!(clock.write(bad), Err(ClockError::InvalidTimestamp));
        assert!(clock.is_halted());
    }
}
