//! Wall clock trait

use crate::time::DateTime;

/// Errors that can occur with clock operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockError {
    /// Oscillator is stopped
    Halted,
    /// Timestamp failed calendar validation
    InvalidTimestamp,
    /// Communication with the clock chip failed
    Bus,
    /// Operation not supported by this clock
    Unsupported,
}

/// Real-time clock capability
///
/// The supervisor never touches RTC registers; it only reads, writes
/// and asks whether the oscillator is running.
pub trait ClockSource {
    /// Read the current time, or `None` if the clock cannot be read
    fn read(&mut self) -> Option<DateTime>;

    /// Set the clock
    ///
    /// Implementations must reject timestamps that fail
    /// [`DateTime::is_valid`] with [`ClockError::InvalidTimestamp`].
    fn write(&mut self, time: DateTime) -> Result<(), ClockError>;

    /// Check if the oscillator is stopped
    fn is_halted(&mut self) -> bool;

    /// Try to restart a halted oscillator without changing the time
    fn start(&mut self) -> Result<(), ClockError> {
        Err(ClockError::Unsupported)
    }
}

impl<T: ClockSource + ?Sized> ClockSource for &mut T {
    fn read(&mut self) -> Option<DateTime> {
        (**self).read()
    }

    fn write(&mut self, time: DateTime) -> Result<(), ClockError> {
        (**self).write(time)
    }

    fn is_halted(&mut self) -> bool {
        (**self).is_halted()
    }

    fn start(&mut self) -> Result<(), ClockError> {
        (**self).start()
    }
}
