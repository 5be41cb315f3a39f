//! Angle to pulse-width conversion
//!
//! Hobby servos position themselves from the width of a repeating pulse.
//! The mapping is linear between the pulse widths at 0° and 180°, clamped
//! at both ends so an out-of-range angle can never overdrive the horn.

use crate::config::ConfigError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Largest commandable angle in degrees
pub const MAX_SERVO_ANGLE: u8 = 180;

/// Angle at which every valve is closed
pub const SERVO_CLOSED_ANGLE: u8 = 0;

/// Pulse widths for the servo travel, in microseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PulseRange {
    /// Pulse width at 0°
    pub min_us: u16,
    /// Pulse width at 180°
    pub max_us: u16,
    /// PWM period (20 ms for standard 50 Hz servos)
    pub period_us: u16,
}

impl Default for PulseRange {
    fn default() -> Self {
        Self {
            min_us: 500,
            max_us: 2500,
            period_us: 20_000,
        }
    }
}

impl PulseRange {
    /// Check that the widths are ordered and fit inside the period
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_us >= self.max_us || self.max_us > self.period_us {
            return Err(ConfigError::InvalidPulseRange);
        }
        Ok(())
    }

    /// Pulse width for `angle`, see [`angle_to_pulse`]
    pub fn pulse_for(&self, angle: u8) -> u16 {
        angle_to_pulse(angle, self)
    }
}

/// Convert an angle in degrees to a pulse width in microseconds
///
/// Angles above [`MAX_SERVO_ANGLE`] clamp to the maximum pulse.
pub fn angle_to_pulse(angle: u8, range: &PulseRange) -> u16 {
    let angle = angle.min(MAX_SERVO_ANGLE) as u32;
    let span = range.max_us.saturating_sub(range.min_us) as u32;
    let offset = span * angle / MAX_SERVO_ANGLE as u32;
    range.min_us.saturating_add(offset as u16)
}
