//! Servo bank on PWM outputs
//!
//! One hobby servo per zone, each on its own PWM output running at the
//! servo frame rate (normally 50 Hz). The bank converts angles to pulse
//! widths and writes them as a duty-cycle fraction of the frame period,
//! so it works with any `SetDutyCycle` implementation regardless of the
//! timer's counter resolution.
//!
//! There is no position feedback: a channel counts as energized once a
//! pulse has been written to it.
//!
//! ```ignore
//! let bank = PwmServoBank::new([ch_a, ch_b, ch_c, ch_d], config.pulse);
//! let mut sequencer = Sequencer::new(bank);
//! ```

use embedded_hal::pwm::SetDutyCycle;
use hydria_core::config::ZoneId;
use hydria_core::servo::PulseRange;
use hydria_core::traits::{ActuatorError, ActuatorPort};

/// Servo bank over `N` PWM channels
pub struct PwmServoBank<P, const N: usize> {
    channels: [P; N],
    range: PulseRange,
    /// Last angle written per channel; None until first driven
    angles: [Option<u8>; N],
}

impl<P: SetDutyCycle, const N: usize> PwmServoBank<P, N> {
    /// Create a bank; zone `i` drives `channels[i]`
    ///
    /// Outputs are left untouched until the first command.
    pub fn new(channels: [P; N], range: PulseRange) -> Self {
        Self {
            channels,
            range,
            angles: [None; N],
        }
    }

    /// Pulse range in use
    pub fn range(&self) -> &PulseRange {
        &self.range
    }

    /// Last commanded angle for a zone
    pub fn angle(&self, zone: ZoneId) -> Option<u8> {
        self.angles.get(zone.index()).copied().flatten()
    }

    /// Give back the PWM channels
    pub fn into_channels(self) -> [P; N] {
        self.channels
    }
}

impl<P: SetDutyCycle, const N: usize> ActuatorPort for PwmServoBank<P, N> {
    fn drive(&mut self, zone: ZoneId, angle_deg: u8) -> Result<(), ActuatorError> {
        let idx = zone.index();
        let channel = self
            .channels
            .get_mut(idx)
            .ok_or(ActuatorError::InvalidChannel)?;

        let pulse_us = self.range.pulse_for(angle_deg);
        channel
            .set_duty_cycle_fraction(pulse_us, self.range.period_us)
            .map_err(|_| ActuatorError::Hardware)?;

        self.angles[idx] = Some(angle_deg);
        Ok(())
    }

    fn is_energized(&self, zone: ZoneId) -> bool {
        self.angle(zone).is_some()
    }
}
