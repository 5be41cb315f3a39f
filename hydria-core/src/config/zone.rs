//! Per-zone configuration
//!
//! A zone is one independently valved irrigation area driven by one servo
//! channel. Its policy (how far to open, how long to water, how long to
//! wait before the next zone) is fixed at provisioning time and only
//! changes through validated setters.

use heapless::String;

use crate::servo::MAX_SERVO_ANGLE;
use crate::time::Seconds;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum number of zones (one actuator channel each)
pub const MAX_ZONES: usize = 8;

/// Maximum zone name length in bytes
pub const MAX_ZONE_NAME_LEN: usize = 32;

/// Shortest irrigation run per zone
pub const MIN_IRRIGATION_TIME_S: Seconds = 60;

/// Longest irrigation run per zone, also the manual override cap
pub const MAX_IRRIGATION_TIME_S: Seconds = 1800;

/// Longest pause between two zones
pub const MAX_TRANSITION_DELAY_S: Seconds = 600;

/// Configuration validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Zone list is empty
    NoZones,
    /// More zones than actuator channels
    TooManyZones,
    /// Open angle beyond servo travel
    AngleOutOfRange,
    /// Irrigation time outside [MIN, MAX]
    IrrigationTimeOutOfRange,
    /// Transition delay above the maximum
    TransitionDelayOutOfRange,
    /// Safety limits are unusable (e.g. zero error ceiling)
    InvalidLimits,
    /// Timing parameters are unusable (e.g. zero movement time)
    InvalidTiming,
    /// Servo pulse range is empty or longer than the period
    InvalidPulseRange,
}

/// Zone identifier (0-based index into the zone list)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ZoneId(pub u8);

impl ZoneId {
    /// Create from a 0-based index
    pub const fn new(index: u8) -> Self {
        Self(index)
    }

    /// Create from the 1-based number shown to operators
    pub const fn from_number(number: u8) -> Option<Self> {
        if number == 0 {
            None
        } else {
            Some(Self(number - 1))
        }
    }

    /// 0-based index
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// 1-based number shown to operators
    pub const fn number(self) -> u8 {
        self.0.saturating_add(1)
    }
}

/// Zone policy
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ZoneConfig {
    /// Display name
    pub name: String<MAX_ZONE_NAME_LEN>,
    /// Servo angle that fully opens the valve (0-180°)
    pub open_angle: u8,
    /// Watering time per cycle
    pub irrigation_time_s: Seconds,
    /// Pause after this zone closes, before the next one opens
    pub transition_delay_s: Seconds,
    /// Whether the zone takes part in cycles after provisioning
    pub enabled: bool,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            open_angle: 90,
            irrigation_time_s: 300,
            transition_delay_s: 30,
            enabled: true,
        }
    }
}

impl ZoneConfig {
    /// Create an enabled zone
    ///
    /// Names longer than [`MAX_ZONE_NAME_LEN`] are truncated at a
    /// character boundary.
    pub fn new(
        name: &str,
        open_angle: u8,
        irrigation_time_s: Seconds,
        transition_delay_s: Seconds,
    ) -> Self {
        Self {
            name: truncated(name),
            open_angle,
            irrigation_time_s,
            transition_delay_s,
            enabled: true,
        }
    }

    /// Check angle and time bounds
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_angle(self.open_angle)?;
        validate_irrigation_time(self.irrigation_time_s)?;
        if self.transition_delay_s > MAX_TRANSITION_DELAY_S {
            return Err(ConfigError::TransitionDelayOutOfRange);
        }
        Ok(())
    }
}

/// Check an open angle against servo travel
pub fn validate_angle(angle: u8) -> Result<(), ConfigError> {
    if angle > MAX_SERVO_ANGLE {
        return Err(ConfigError::AngleOutOfRange);
    }
    Ok(())
}

/// Check an irrigation time against [MIN, MAX]
pub fn validate_irrigation_time(secs: Seconds) -> Result<(), ConfigError> {
    if !(MIN_IRRIGATION_TIME_S..=MAX_IRRIGATION_TIME_S).contains(&secs) {
        return Err(ConfigError::IrrigationTimeOutOfRange);
    }
    Ok(())
}

/// Check a zone list: count within [1, MAX_ZONES] and every zone in bounds
pub fn validate_zones(zones: &[ZoneConfig]) -> Result<(), ConfigError> {
    if zones.is_empty() {
        return Err(ConfigError::NoZones);
    }
    if zones.len() > MAX_ZONES {
        return Err(ConfigError::TooManyZones);
    }
    zones.iter().try_for_each(ZoneConfig::validate)
}

fn truncated<const N: usize>(s: &str) -> String<N> {
    let mut out = String::new();
    for c in s.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zone_id_numbering() {
        let id = ZoneId::new(0);
        assert_eq!(id.number(), 1);
        assert_eq!(ZoneId::from_number(3), Some(ZoneId(2)));
        assert_eq!(ZoneId::from_number(0), None);
    }

    #[test]
    fn test_zone_bounds() {
        assert!(ZoneConfig::new("Lawn", 85, 300, 30).validate().is_ok());
        assert!(ZoneConfig::new("Edge", 180, 60, 0).validate().is_ok());
        assert!(ZoneConfig::new("Edge", 0, 1800, 600).validate().is_ok());

        assert_eq!(
            ZoneConfig::new("Lawn", 181, 300, 30).validate(),
            Err(ConfigError::AngleOutOfRange)
        );
        assert_eq!(
            ZoneConfig::new("Lawn", 85, 59, 30).validate(),
            Err(ConfigError::IrrigationTimeOutOfRange)
        );
        assert_eq!(
            ZoneConfig::new("Lawn", 85, 1801, 30).validate(),
            Err(ConfigError::IrrigationTimeOutOfRange)
        );
        assert_eq!(
            ZoneConfig::new("Lawn", 85, 300, 601).validate(),
            Err(ConfigError::TransitionDelayOutOfRange)
        );
    }

    #[test]
    fn test_zone_list_bounds() {
        assert_eq!(validate_zones(&[]), Err(ConfigError::NoZones));

        let zone = ZoneConfig::new("Bed", 80, 120, 10);
        let too_many: [ZoneConfig; MAX_ZONES + 1] = core::array::from_fn(|_| zone.clone());
        assert_eq!(validate_zones(&too_many), Err(ConfigError::TooManyZones));
        assert!(validate_zones(&too_many[..MAX_ZONES]).is_ok());
    }

    #[test]
    fn test_long_name_truncated() {
        let zone = ZoneConfig::new("Jardín frontal junto al camino de entrada", 85, 300, 30);
        assert!(zone.name.len() <= MAX_ZONE_NAME_LEN);
        assert!(zone.name.starts_with("Jardín"));
    }
}
