//! Sequencer states, errors and reports

use crate::config::{ConfigError, ZoneId};
use crate::time::Seconds;

/// Sequencer state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IrrigationState {
    /// No cycle running
    #[default]
    Idle,
    /// Making sure every valve is closed before the first zone opens
    Initializing,
    /// Current zone's valve is moving to its open angle
    OpeningValve,
    /// Current zone is watering
    Irrigating,
    /// Current zone's valve is moving back to closed
    ClosingValve,
    /// Waiting out the transition delay before the next zone
    Transitioning,
    /// All enabled zones watered; waiting for cooldown or stop
    Completed,
    /// Actuator fault or emergency stop
    Error,
}

impl IrrigationState {
    /// Check if a new cycle (or a manual override) may start
    pub fn accepts_start(self) -> bool {
        matches!(self, IrrigationState::Idle | IrrigationState::Completed)
    }

    /// Check if a cycle is in progress
    pub fn is_cycle_active(self) -> bool {
        matches!(
            self,
            IrrigationState::Initializing
                | IrrigationState::OpeningValve
                | IrrigationState::Irrigating
                | IrrigationState::ClosingValve
                | IrrigationState::Transitioning
        )
    }

    /// Check if the current zone's valve is away from closed
    pub fn is_valve_phase(self) -> bool {
        matches!(
            self,
            IrrigationState::OpeningValve
                | IrrigationState::Irrigating
                | IrrigationState::ClosingValve
        )
    }
}

/// Errors returned by sequencer operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SequencerError {
    /// Zone list or a zone setting is out of bounds
    InvalidConfiguration(ConfigError),
    /// An actuator channel could not be driven
    ActuatorFault,
    /// A cycle or another valve is already active
    Busy,
    /// Emergency stop is latched
    EmergencyActive,
    /// No zone is enabled
    NoEnabledZones,
    /// Zone index beyond the configured zones
    InvalidZone,
    /// Zone is in the error state
    ZoneFault,
    /// Manual run duration is zero or above the maximum
    InvalidDuration,
}

impl From<ConfigError> for SequencerError {
    fn from(e: ConfigError) -> Self {
        SequencerError::InvalidConfiguration(e)
    }
}

/// Snapshot returned from every tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SequencerReport {
    /// State after the tick
    pub state: IrrigationState,
    /// Zone whose valve is currently away from closed
    pub active_zone: Option<ZoneId>,
    /// Watering time left for the active zone
    pub remaining_s: Seconds,
    /// Sequencer is in the error state
    pub fault: bool,
}

/// Cumulative counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SequencerStats {
    /// Cycles that watered every enabled zone
    pub cycles_completed: u32,
    /// Total watering time across all zones, cycles and manual runs
    pub total_watering_s: Seconds,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_states() {
        assert!(IrrigationState::Idle.accepts_start());
        assert!(IrrigationState::Completed.accepts_start());
        assert!(!IrrigationState::Irrigating.accepts_start());
        assert!(!IrrigationState::Error.accepts_start());
    }

    #[test]
    fn test_cycle_activity() {
        assert!(IrrigationState::Transitioning.is_cycle_active());
        assert!(!IrrigationState::Transitioning.is_valve_phase());
        assert!(IrrigationState::ClosingValve.is_valve_phase());
        assert!(!IrrigationState::Completed.is_cycle_active());
        assert!(!IrrigationState::Error.is_cycle_active());
    }
}
