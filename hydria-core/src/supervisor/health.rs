//! Health monitoring
//!
//! Tracks free memory, the sequencer fault flag and the consecutive
//! failure counter that escalates to an emergency stop.

use crate::config::SafetyLimits;

/// Health check failure reason
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HealthFault {
    /// Free memory below the configured floor
    LowMemory,
    /// Sequencer reported a fault
    SequencerFault,
}

/// Result of a health check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HealthStatus {
    /// All conditions normal
    Ok,
    /// Check failed
    Fault(HealthFault),
}

/// Health monitor
///
/// Readings are pushed in with the `update_*` methods; [`HealthMonitor::check`]
/// evaluates them against the safety limits.
#[derive(Debug, Clone)]
pub struct HealthMonitor {
    limits: SafetyLimits,
    /// Latest free-memory sample (None if the platform can't measure)
    free_memory: Option<u32>,
    /// Lowest free memory seen
    min_free_memory: Option<u32>,
    sequencer_fault: bool,
    consecutive_errors: u8,
    clock_faults: u8,
}

impl Default for HealthMonitor {
    fn default() -> Self {
        Self::new(SafetyLimits::default())
    }
}

impl HealthMonitor {
    /// Create a monitor with the given limits
    pub fn new(limits: SafetyLimits) -> Self {
        Self {
            limits,
            free_memory: None,
            min_free_memory: None,
            sequencer_fault: false,
            consecutive_errors: 0,
            clock_faults: 0,
        }
    }

    /// Replace the limits (counters are kept)
    pub fn set_limits(&mut self, limits: SafetyLimits) {
        self.limits = limits;
    }

    /// Current limits
    pub fn limits(&self) -> &SafetyLimits {
        &self.limits
    }

    /// Record a free-memory sample
    ///
    /// Returns the reading if it is below the low-memory warning threshold.
    pub fn update_memory(&mut self, free_bytes: Option<u32>) -> Option<u32> {
        self.free_memory = free_bytes;
        let free = free_bytes?;
        self.min_free_memory = Some(self.min_free_memory.map_or(free, |min| min.min(free)));
        (free < self.limits.low_memory_bytes).then_some(free)
    }

    /// Update the sequencer fault flag
    pub fn update_sequencer_fault(&mut self, fault: bool) {
        self.sequencer_fault = fault;
    }

    /// Check all conditions
    ///
    /// Returns the first fault detected, or Ok if all conditions are normal.
    pub fn check(&self) -> HealthStatus {
        if let Some(free) = self.free_memory {
            if free < self.limits.memory_floor_bytes {
                return HealthStatus::Fault(HealthFault::LowMemory);
            }
        }

        if self.sequencer_fault {
            return HealthStatus::Fault(HealthFault::SequencerFault);
        }

        HealthStatus::Ok
    }

    /// Count a failed check
    ///
    /// Returns true when the counter was already at the ceiling, meaning
    /// the caller must escalate.
    pub fn record_failure(&mut self) -> bool {
        if self.consecutive_errors >= self.limits.max_consecutive_errors {
            return true;
        }
        self.consecutive_errors += 1;
        false
    }

    /// Count a passed check
    pub fn record_success(&mut self) {
        self.consecutive_errors = 0;
    }

    /// Count a failure that is fatal on its own
    pub fn record_fatal(&mut self) {
        self.consecutive_errors = self.consecutive_errors.saturating_add(1);
    }

    /// Clear the failure counters
    pub fn clear_errors(&mut self) {
        self.consecutive_errors = 0;
        self.clock_faults = 0;
    }

    /// Count an unreadable or implausible clock reading
    pub fn record_clock_fault(&mut self) -> u8 {
        self.clock_faults = self.clock_faults.saturating_add(1);
        self.clock_faults
    }

    /// Reset the clock fault counter after a good reading
    pub fn clear_clock_faults(&mut self) {
        self.clock_faults = 0;
    }

    pub fn consecutive_errors(&self) -> u8 {
        self.consecutive_errors
    }

    pub fn clock_faults(&self) -> u8 {
        self.clock_faults
    }

    pub fn free_memory(&self) -> Option<u32> {
        self.free_memory
    }

    pub fn min_free_memory(&self) -> Option<u32> {
        self.min_free_memory
    }
}
