//! System-wide configuration
//!
//! Collapses everything the controller needs at startup into one
//! structure: the ordered zone list, the auto-cycle flag, global safety
//! limits, state machine timing and the servo pulse range.

use heapless::Vec;

use super::zone::{validate_zones, ConfigError, ZoneConfig, MAX_ZONES};
use crate::servo::PulseRange;
use crate::time::Seconds;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Global safety limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SafetyLimits {
    /// Failed health checks tolerated before an emergency stop
    pub max_consecutive_errors: u8,
    /// Free memory below this fails the health check
    pub memory_floor_bytes: u32,
    /// Free memory below this raises a low-memory warning
    pub low_memory_bytes: u32,
    /// Hardware watchdog period the host loop must feed within
    pub watchdog_timeout_ms: u32,
}

impl Default for SafetyLimits {
    fn default() -> Self {
        Self {
            max_consecutive_errors: 5,
            memory_floor_bytes: 8_000,
            low_memory_bytes: 10_000,
            watchdog_timeout_ms: 30_000,
        }
    }
}

impl SafetyLimits {
    /// Check the limits are usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_consecutive_errors == 0 || self.watchdog_timeout_ms == 0 {
            return Err(ConfigError::InvalidLimits);
        }
        if self.low_memory_bytes < self.memory_floor_bytes {
            return Err(ConfigError::InvalidLimits);
        }
        Ok(())
    }
}

/// State machine timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TimingConfig {
    /// Time a servo needs for a full movement; timeout is twice this
    pub servo_movement_ms: u32,
    /// Re-issued commands per movement before the zone is disabled
    pub max_servo_retries: u8,
    /// Pause between a completed cycle and an automatic restart
    pub cycle_cooldown_s: Seconds,
    /// Interval between recovery attempts in error states
    pub error_recovery_interval_ms: u32,
    /// Interval between clock plausibility checks in normal operation
    pub clock_check_interval_ms: u32,
    /// Consecutive bad clock checks tolerated before error recovery
    pub max_clock_faults: u8,
    /// Interval between free-memory samples
    pub memory_check_interval_ms: u32,
    /// Interval between "clock needs setting" reminders
    pub config_reminder_interval_ms: u32,
    /// Minimum time in emergency stop before a reset is accepted
    pub emergency_cooldown_ms: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            servo_movement_ms: 1_000,
            max_servo_retries: 3,
            cycle_cooldown_s: 300,
            error_recovery_interval_ms: 10_000,
            clock_check_interval_ms: 5_000,
            max_clock_faults: 5,
            memory_check_interval_ms: 30_000,
            config_reminder_interval_ms: 5_000,
            emergency_cooldown_ms: 30_000,
        }
    }
}

impl TimingConfig {
    /// Check the timing is usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.servo_movement_ms == 0
            || self.error_recovery_interval_ms == 0
            || self.clock_check_interval_ms == 0
            || self.memory_check_interval_ms == 0
        {
            return Err(ConfigError::InvalidTiming);
        }
        // Timeout is computed as 2x movement time
        if self.servo_movement_ms > u32::MAX / 2 {
            return Err(ConfigError::InvalidTiming);
        }
        Ok(())
    }

    /// Movement timeout (twice the nominal movement time)
    pub fn servo_timeout_ms(&self) -> u32 {
        self.servo_movement_ms.saturating_mul(2)
    }
}

/// Complete controller configuration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SystemConfig {
    /// Zones in watering order
    pub zones: Vec<ZoneConfig, MAX_ZONES>,
    /// Restart the cycle after the cooldown when it completes
    pub auto_cycle: bool,
    /// Global safety limits
    pub limits: SafetyLimits,
    /// State machine timing
    pub timing: TimingConfig,
    /// Servo pulse widths
    pub pulse: PulseRange,
}

impl Default for SystemConfig {
    fn default() -> Self {
        let mut zones = Vec::new();
        for zone in [
            ZoneConfig::new("Front garden", 85, 300, 30),
            ZoneConfig::new("Back garden", 90, 450, 30),
            ZoneConfig::new("Vegetable beds", 80, 600, 45),
            ZoneConfig::new("Flower pots", 75, 180, 20),
        ] {
            let _ = zones.push(zone);
        }

        Self {
            zones,
            auto_cycle: true,
            limits: SafetyLimits::default(),
            timing: TimingConfig::default(),
            pulse: PulseRange::default(),
        }
    }
}

impl SystemConfig {
    /// Validate zones, limits, timing and pulse range
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_zones(&self.zones)?;
        self.limits.validate()?;
        self.timing.validate()?;
        self.pulse.validate()
    }

    /// Find a zone by name
    pub fn find_zone(&self, name: &str) -> Option<&ZoneConfig> {
        self.zones.iter().find(|z| z.name.as_str() == name)
    }
}
