//! Valve actuator trait
//!
//! One PWM channel per zone. The port converts angles to pulse widths
//! itself; the sequencer only ever thinks in degrees.

use crate::config::ZoneId;

/// Errors that can occur when driving an actuator channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ActuatorError {
    /// No channel is wired for this zone
    InvalidChannel,
    /// The PWM peripheral rejected the command
    Hardware,
}

/// Servo channel bank, one channel per zone
///
/// Commands are fire-and-forget: `drive` returns as soon as the new
/// pulse width is latched. Completion is inferred from elapsed time,
/// or from [`ActuatorPort::position`] when the hardware has feedback.
pub trait ActuatorPort {
    /// Drive the zone's channel to `angle_deg` (0-180)
    fn drive(&mut self, zone: ZoneId, angle_deg: u8) -> Result<(), ActuatorError>;

    /// Check if the channel is currently producing pulses
    fn is_energized(&self, zone: ZoneId) -> bool;

    /// Measured servo angle, if the hardware reports one
    ///
    /// Without feedback, movements are assumed complete once the
    /// configured movement time has elapsed.
    fn position(&self, _zone: ZoneId) -> Option<u8> {
        None
    }
}

impl<T: ActuatorPort + ?Sized> ActuatorPort for &mut T {
    fn drive(&mut self, zone: ZoneId, angle_deg: u8) -> Result<(), ActuatorError> {
        (**self).drive(zone, angle_deg)
    }

    fn is_energized(&self, zone: ZoneId) -> bool {
        (**self).is_energized(zone)
    }

    fn position(&self, zone: ZoneId) -> Option<u8> {
        (**self).position(zone)
    }
}
