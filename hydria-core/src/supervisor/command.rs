//! Remote control requests
//!
//! Every outer surface (button, web handler, serial console) translates
//! its input into a [`Command`] and queues it for the tick context.

use crate::config::ZoneId;
use crate::time::{DateTime, Seconds};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A control request applied by [`super::Supervisor::handle`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Command {
    /// Start a cycle (auto-repeat follows the configuration)
    StartCycle,
    /// Stop the cycle after the active valve closes
    StopCycle,
    /// Close everything and halt
    EmergencyStop,
    /// Leave emergency stop and re-initialize
    Reset,
    /// Open one zone manually, optionally for a fixed time
    OpenZone {
        zone: ZoneId,
        duration_s: Option<Seconds>,
    },
    /// Close a manually opened zone
    CloseZone { zone: ZoneId },
    SetZoneEnabled { zone: ZoneId, enabled: bool },
    SetIrrigationTime { zone: ZoneId, seconds: Seconds },
    /// Set the wall clock
    SetClock(DateTime),
}

impl Command {
    /// Check if the command can move a valve
    pub fn actuates(&self) -> bool {
        matches!(
            self,
            Command::StartCycle | Command::OpenZone { .. } | Command::Reset
        )
    }
}
