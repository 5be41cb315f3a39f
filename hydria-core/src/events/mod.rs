//! Notifications emitted to the status notifier
//!
//! Every mode change, sequencer state change and escalation produces
//! exactly one event, so LED, log and broadcast layers can mirror the
//! controller without polling it.

use crate::config::ZoneId;
use crate::sequencer::{IrrigationState, ServoState};
use crate::supervisor::{HealthFault, SystemMode};

/// Why an emergency stop was triggered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EmergencyCause {
    /// Operator requested it
    Operator,
    /// Every enabled zone failed its retries
    AllZonesFailed,
    /// Too many consecutive failed health checks
    HealthCheck,
    /// Sequencer or configuration failed at startup
    InitializationFailed,
}

/// State-change notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SystemEvent {
    // Supervisor events
    /// Operating mode changed
    ModeChanged { from: SystemMode, to: SystemMode },
    /// A health check failed
    HealthCheckFailed { fault: HealthFault, consecutive: u8 },
    /// Free memory dropped below the warning threshold
    LowMemory { free_bytes: u32 },
    /// The clock must be set before irrigation can run
    ClockConfigurationRequired,
    /// The clock returned an unreadable or implausible timestamp
    ClockFault { consecutive: u8 },
    /// The clock was set successfully
    ClockSet,
    /// A network reconnect was requested
    NetworkReconnectAttempt { next_delay_ms: u32 },

    // Sequencer events
    /// Sequencer state changed
    IrrigationStateChanged {
        from: IrrigationState,
        to: IrrigationState,
    },
    /// A zone's servo changed state
    ZoneStateChanged { zone: ZoneId, state: ServoState },
    /// A timed-out servo command is being re-issued (retry is 1-based)
    ServoRetry { zone: ZoneId, retry: u8 },
    /// A zone exhausted its retries and was taken out of rotation
    ZoneDisabled { zone: ZoneId },
    /// A cycle started with the given first zone
    CycleStarted { first_zone: ZoneId },
    /// A cycle finished; carries the running total
    CycleCompleted { cycles_completed: u32 },
    /// All valves were commanded closed and actuation halted
    EmergencyStop { cause: EmergencyCause },
    /// Emergency stop was cleared by the operator
    EmergencyCleared,
}

impl SystemEvent {
    /// Check if this event reports a fault or escalation
    pub fn is_fault(&self) -> bool {
        matches!(
            self,
            SystemEvent::HealthCheckFailed { .. }
                | SystemEvent::LowMemory { .. }
                | SystemEvent::ClockFault { .. }
                | SystemEvent::ZoneDisabled { .. }
                | SystemEvent::EmergencyStop { .. }
        )
    }
}
