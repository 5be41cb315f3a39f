//! Operating modes

/// Supervisor operating mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SystemMode {
    /// Loading configuration and bringing up the sequencer
    #[default]
    Initializing,
    /// Running, but the clock must be set before irrigation is allowed
    ConfigurationMode,
    /// Fully operational
    NormalOperation,
    /// Clock kept failing; waiting for it to be reconfigured
    ErrorRecovery,
    /// All actuation halted until an operator reset
    EmergencyStop,
}

impl SystemMode {
    /// Status indication for this mode
    pub fn blink_pattern(self) -> BlinkPattern {
        match self {
            SystemMode::NormalOperation => BlinkPattern::Slow,
            SystemMode::EmergencyStop => BlinkPattern::VeryFast,
            SystemMode::Initializing
            | SystemMode::ConfigurationMode
            | SystemMode::ErrorRecovery => BlinkPattern::Fast,
        }
    }

    /// Check if the health check runs in this mode
    ///
    /// Conditions already being handled by a degraded mode are not
    /// counted again.
    pub fn runs_health_checks(self) -> bool {
        matches!(self, SystemMode::Initializing | SystemMode::NormalOperation)
    }

    /// Check if waiting on the operator to set the clock
    pub fn awaits_clock(self) -> bool {
        matches!(
            self,
            SystemMode::ConfigurationMode | SystemMode::ErrorRecovery
        )
    }
}

/// Status LED blink rate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BlinkPattern {
    /// Healthy
    Slow,
    /// Starting up or recovering
    Fast,
    /// Emergency stop
    VeryFast,
}

impl BlinkPattern {
    /// Time between LED toggles
    pub fn interval_ms(self) -> u32 {
        match self {
            BlinkPattern::Slow => 1_000,
            BlinkPattern::Fast => 250,
            BlinkPattern::VeryFast => 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patterns_follow_mode() {
        assert_eq!(SystemMode::NormalOperation.blink_pattern(), BlinkPattern::Slow);
        assert_eq!(SystemMode::ErrorRecovery.blink_pattern(), BlinkPattern::Fast);
        assert_eq!(SystemMode::ConfigurationMode.blink_pattern(), BlinkPattern::Fast);
        assert_eq!(SystemMode::EmergencyStop.blink_pattern(), BlinkPattern::VeryFast);
        assert!(BlinkPattern::VeryFast.interval_ms() < BlinkPattern::Fast.interval_ms());
        assert!(BlinkPattern::Fast.interval_ms() < BlinkPattern::Slow.interval_ms());
    }

    #[test]
    fn test_health_checks_skipped_in_degraded_modes() {
        assert!(SystemMode::NormalOperation.runs_health_checks());
        assert!(!SystemMode::EmergencyStop.runs_health_checks());
        assert!(!SystemMode::ErrorRecovery.runs_health_checks());
        assert!(!SystemMode::ConfigurationMode.runs_health_checks());
    }
}
