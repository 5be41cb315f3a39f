//! Zone runtime state

use crate::config::ZoneConfig;
use crate::servo::SERVO_CLOSED_ANGLE;
use crate::time::Seconds;

/// Servo (valve) state for one zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ServoState {
    /// Never driven since power-up
    #[default]
    Uninitialized,
    /// Valve confirmed closed
    Closed,
    /// Moving towards the open angle
    Opening,
    /// Valve confirmed open
    Open,
    /// Moving back to the closed angle
    Closing,
    /// Exhausted its retries; position unknown
    Error,
}

impl ServoState {
    /// Check if the valve is away from closed (water may flow)
    pub fn is_active(self) -> bool {
        matches!(
            self,
            ServoState::Opening | ServoState::Open | ServoState::Closing
        )
    }

    /// Check if a movement is in flight
    pub fn is_moving(self) -> bool {
        matches!(self, ServoState::Opening | ServoState::Closing)
    }
}

/// Mutable per-zone state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ZoneRuntime {
    /// Zone takes part in cycles
    pub enabled: bool,
    /// Valve state
    pub servo_state: ServoState,
    /// When the last servo command was issued (ms)
    pub last_action_ms: u32,
    /// Watering time accumulated since the sequencer was initialized
    pub session_irrigation_s: Seconds,
    /// Re-issued commands for the current movement
    pub retry_count: u8,
}

impl ZoneRuntime {
    fn new(enabled: bool) -> Self {
        Self {
            enabled,
            servo_state: ServoState::Uninitialized,
            last_action_ms: 0,
            session_irrigation_s: 0,
            retry_count: 0,
        }
    }
}

/// A configured zone and its runtime state
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Zone {
    pub(crate) config: ZoneConfig,
    pub(crate) runtime: ZoneRuntime,
    /// Angle of the pending (or last) movement
    pub(crate) target_angle: u8,
    /// Last drive command was accepted by the actuator
    pub(crate) command_ok: bool,
}

impl Zone {
    pub(crate) fn new(config: ZoneConfig) -> Self {
        let runtime = ZoneRuntime::new(config.enabled);
        Self {
            config,
            runtime,
            target_angle: SERVO_CLOSED_ANGLE,
            command_ok: false,
        }
    }

    /// Zone policy
    pub fn config(&self) -> &ZoneConfig {
        &self.config
    }

    /// Runtime state
    pub fn runtime(&self) -> &ZoneRuntime {
        &self.runtime
    }

    /// Current valve state
    pub fn servo_state(&self) -> ServoState {
        self.runtime.servo_state
    }

    /// Check if the zone takes part in cycles
    pub fn is_enabled(&self) -> bool {
        self.runtime.enabled
    }

    /// Check if the zone can be selected for watering
    pub fn is_available(&self) -> bool {
        self.runtime.enabled && self.runtime.servo_state != ServoState::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_states() {
        assert!(ServoState::Opening.is_active());
        assert!(ServoState::Open.is_active());
        assert!(ServoState::Closing.is_active());
        assert!(!ServoState::Closed.is_active());
        assert!(!ServoState::Error.is_active());
        assert!(!ServoState::Open.is_moving());
    }

    #[test]
    fn test_new_zone_starts_uninitialized() {
        let mut config = ZoneConfig::new("Lawn", 85, 300, 30);
        config.enabled = false;
        let zone = Zone::new(config);
        assert_eq!(zone.servo_state(), ServoState::Uninitialized);
        assert!(!zone.is_enabled());
        assert!(!zone.is_available());
    }
}
