//! Supervisor implementation
//!
//! Mode machine:
//!
//! ```text
//! Initializing --ok, clock valid-------> NormalOperation
//! Initializing --ok, clock not valid---> ConfigurationMode
//! Initializing --failure---------------> EmergencyStop
//! ConfigurationMode --clock set--------> NormalOperation
//! NormalOperation --clock halted-------> ConfigurationMode
//! NormalOperation --clock faults-------> ErrorRecovery
//! NormalOperation --health ceiling-----> EmergencyStop
//! ErrorRecovery --clock set------------> NormalOperation
//! EmergencyStop --reset after cooldown-> Initializing
//! ```

use super::command::Command;
use super::health::{HealthMonitor, HealthStatus};
use super::mode::SystemMode;
use super::network::ReconnectBackoff;
use crate::config::{ConfigError, SystemConfig};
use crate::events::{EmergencyCause, SystemEvent};
use crate::sequencer::{Sequencer, SequencerError, SequencerReport};
use crate::time::{elapsed_ms, DateTime};
use crate::traits::{
    ActuatorPort, ClockError, ClockSource, ConfigSource, MemoryProbe, NetworkLink, StatusNotifier,
};

/// Supervisor error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SupervisorError {
    /// Loaded configuration failed validation
    Config(ConfigError),
    /// The configuration source could not supply a configuration
    ConfigUnavailable,
    /// Sequencer rejected the request
    Sequencer(SequencerError),
    /// Clock rejected the request
    Clock(ClockError),
    /// Irrigation is only allowed in normal operation
    NotOperational,
    /// Emergency stop was entered too recently to reset
    CooldownActive,
}

impl From<ConfigError> for SupervisorError {
    fn from(e: ConfigError) -> Self {
        SupervisorError::Config(e)
    }
}

impl From<SequencerError> for SupervisorError {
    fn from(e: SequencerError) -> Self {
        SupervisorError::Sequencer(e)
    }
}

impl From<ClockError> for SupervisorError {
    fn from(e: ClockError) -> Self {
        SupervisorError::Clock(e)
    }
}

/// System supervisor
///
/// Generic over every platform collaborator so the same code runs on
/// hardware and against test doubles.
pub struct Supervisor<A, C, N, M, L> {
    sequencer: Sequencer<A>,
    clock: C,
    notifier: N,
    memory: M,
    link: L,
    /// Configuration retained for re-initialization after a reset
    config: Option<SystemConfig>,
    mode: SystemMode,
    mode_entered_ms: u32,
    health: HealthMonitor,
    backoff: ReconnectBackoff,
    last_clock_check_ms: u32,
    last_memory_check_ms: u32,
    last_reminder_ms: u32,
    started_ms: Option<u32>,
    last_tick_ms: u32,
    last_report: SequencerReport,
}

impl<A, C, N, M, L> Supervisor<A, C, N, M, L>
where
    A: ActuatorPort,
    C: ClockSource,
    N: StatusNotifier,
    M: MemoryProbe,
    L: NetworkLink,
{
    /// Create a supervisor; nothing runs until [`Supervisor::initialize`]
    pub fn new(actuator: A, clock: C, notifier: N, memory: M, link: L) -> Self {
        Self {
            sequencer: Sequencer::new(actuator),
            clock,
            notifier,
            memory,
            link,
            config: None,
            mode: SystemMode::Initializing,
            mode_entered_ms: 0,
            health: HealthMonitor::default(),
            backoff: ReconnectBackoff::new(),
            last_clock_check_ms: 0,
            last_memory_check_ms: 0,
            last_reminder_ms: 0,
            started_ms: None,
            last_tick_ms: 0,
            last_report: SequencerReport::default(),
        }
    }

    /// Load configuration and bring the system up
    ///
    /// A halted or implausible clock is not an error: the system comes up
    /// in configuration mode and refuses to irrigate until the clock is
    /// set. Configuration and sequencer failures are fatal and leave the
    /// system in emergency stop.
    pub fn initialize(
        &mut self,
        source: &mut impl ConfigSource,
        now_ms: u32,
    ) -> Result<(), SupervisorError> {
        self.last_tick_ms = now_ms;
        self.started_ms = Some(now_ms);
        self.mode_entered_ms = now_ms;
        self.last_clock_check_ms = now_ms;
        self.last_memory_check_ms = now_ms;
        self.last_reminder_ms = now_ms;

        let config = match source.load() {
            Ok(config) => config,
            Err(_) => {
                self.health.record_fatal();
                self.enter_emergency(EmergencyCause::InitializationFailed);
                return Err(SupervisorError::ConfigUnavailable);
            }
        };
        if let Err(e) = config.validate() {
            self.health.record_fatal();
            self.enter_emergency(EmergencyCause::InitializationFailed);
            return Err(SupervisorError::Config(e));
        }

        self.config = Some(config);
        self.sample_memory();
        self.bring_up()
    }

    /// Advance the supervisor and the sequencer
    ///
    /// Network housekeeping runs first, then the mode-specific step, the
    /// sequencer tick (unless halted), memory sampling and the health
    /// check. Never blocks.
    pub fn tick(&mut self, now_ms: u32) {
        self.last_tick_ms = now_ms;

        self.network_housekeeping(now_ms);

        match self.mode {
            SystemMode::Initializing => {
                if self.config.is_some() {
                    let _ = self.bring_up();
                }
            }
            SystemMode::ConfigurationMode => {
                let interval = self.sequencer.timing().config_reminder_interval_ms;
                self.remind_clock(now_ms, interval);
            }
            SystemMode::NormalOperation => self.check_clock(now_ms),
            SystemMode::ErrorRecovery => {
                let interval = self.sequencer.timing().error_recovery_interval_ms;
                self.remind_clock(now_ms, interval);
            }
            SystemMode::EmergencyStop => {}
        }

        if self.mode != SystemMode::EmergencyStop {
            self.last_report = self.sequencer.tick(now_ms);
        }
        self.drain_events();

        let interval = self.sequencer.timing().memory_check_interval_ms;
        if elapsed_ms(self.last_memory_check_ms, now_ms) >= interval {
            self.last_memory_check_ms = now_ms;
            self.sample_memory();
        }

        self.validate_health();
    }

    /// Start an irrigation cycle
    ///
    /// Only allowed in normal operation. Returns false if refused.
    pub fn start_irrigation_cycle(&mut self) -> bool {
        self.try_start_cycle().is_ok()
    }

    /// Stop the running cycle gracefully
    pub fn stop_irrigation_cycle(&mut self) {
        self.sequencer.stop_cycle();
        self.drain_events();
    }

    /// Halt all actuation until [`Supervisor::reset`]
    pub fn emergency_stop(&mut self) {
        self.enter_emergency(EmergencyCause::Operator);
    }

    /// Re-initialize the system
    ///
    /// From emergency stop this is refused until the cooldown has passed.
    /// Without a loaded configuration there is nothing to re-initialize
    /// from, so the system stays where it is.
    pub fn reset(&mut self) -> Result<(), SupervisorError> {
        if self.mode == SystemMode::EmergencyStop {
            let cooldown = self.sequencer.timing().emergency_cooldown_ms;
            if elapsed_ms(self.mode_entered_ms, self.last_tick_ms) < cooldown {
                return Err(SupervisorError::CooldownActive);
            }
        }
        if self.config.is_none() {
            return Err(SupervisorError::ConfigUnavailable);
        }

        self.health.clear_errors();
        self.sequencer.reset_emergency_stop();
        self.drain_events();
        self.set_mode(SystemMode::Initializing);
        Ok(())
    }

    /// Set the wall clock
    ///
    /// Leaves configuration mode or error recovery on success.
    pub fn set_clock_datetime(&mut self, datetime: DateTime) -> Result<(), SupervisorError> {
        if !datetime.is_valid() {
            return Err(SupervisorError::Clock(ClockError::InvalidTimestamp));
        }
        self.clock.write(datetime)?;
        self.health.clear_clock_faults();
        self.notifier.notify(SystemEvent::ClockSet);

        if self.mode.awaits_clock() {
            self.health.clear_errors();
            self.last_clock_check_ms = self.last_tick_ms;
            self.set_mode(SystemMode::NormalOperation);
        }
        Ok(())
    }

    /// Apply one queued control request
    pub fn handle(&mut self, command: Command) -> Result<(), SupervisorError> {
        let result = match command {
            Command::StartCycle => self.try_start_cycle(),
            Command::StopCycle => {
                self.stop_irrigation_cycle();
                Ok(())
            }
            Command::EmergencyStop => {
                self.emergency_stop();
                Ok(())
            }
            Command::Reset => self.reset(),
            Command::OpenZone { zone, duration_s } => {
                if self.is_operational() {
                    self.sequencer
                        .open_zone_valve(zone, duration_s)
                        .map_err(SupervisorError::from)
                } else {
                    Err(SupervisorError::NotOperational)
                }
            }
            Command::CloseZone { zone } => self
                .sequencer
                .close_zone_valve(zone)
                .map_err(SupervisorError::from),
            Command::SetZoneEnabled { zone, enabled } => {
                self.sequencer.set_zone_enabled(zone, enabled)?;
                if let Some(z) = self.retained_zone(zone.index()) {
                    z.enabled = enabled;
                }
                Ok(())
            }
            Command::SetIrrigationTime { zone, seconds } => {
                self.sequencer.set_zone_irrigation_time(zone, seconds)?;
                if let Some(z) = self.retained_zone(zone.index()) {
                    z.irrigation_time_s = seconds;
                }
                Ok(())
            }
            Command::SetClock(datetime) => self.set_clock_datetime(datetime),
        };
        self.drain_events();
        result
    }

    fn try_start_cycle(&mut self) -> Result<(), SupervisorError> {
        if !self.is_operational() {
            return Err(SupervisorError::NotOperational);
        }
        let auto = self.config.as_ref().is_some_and(|c| c.auto_cycle);
        self.sequencer.start_cycle(auto)?;
        self.drain_events();
        Ok(())
    }

    /// Apply the retained configuration and initialize the sequencer
    fn bring_up(&mut self) -> Result<(), SupervisorError> {
        let Some(config) = self.config.as_ref() else {
            return Err(SupervisorError::ConfigUnavailable);
        };
        self.sequencer.set_timing(config.timing);
        self.health.set_limits(config.limits);

        if let Err(e) = self.sequencer.init(&config.zones) {
            self.health.record_fatal();
            self.enter_emergency(EmergencyCause::InitializationFailed);
            return Err(SupervisorError::Sequencer(e));
        }
        self.drain_events();
        self.last_report = self.sequencer.report();
        self.last_clock_check_ms = self.last_tick_ms;

        if self.clock_is_valid() {
            self.set_mode(SystemMode::NormalOperation);
        } else {
            self.enter_configuration_mode();
        }
        Ok(())
    }

    /// Check the clock, starting its oscillator once if halted
    fn clock_is_valid(&mut self) -> bool {
        if self.clock.is_halted() && self.clock.start().is_err() {
            return false;
        }
        matches!(self.clock.read(), Some(dt) if dt.is_valid())
    }

    fn check_clock(&mut self, now_ms: u32) {
        let timing = *self.sequencer.timing();
        if elapsed_ms(self.last_clock_check_ms, now_ms) < timing.clock_check_interval_ms {
            return;
        }
        self.last_clock_check_ms = now_ms;

        match self.clock.read() {
            Some(dt) if dt.is_valid() => self.health.clear_clock_faults(),
            _ => {
                let consecutive = self.health.record_clock_fault();
                self.notifier
                    .notify(SystemEvent::ClockFault { consecutive });
                if consecutive > timing.max_clock_faults {
                    self.sequencer.stop_cycle();
                    self.drain_events();
                    self.last_reminder_ms = now_ms;
                    self.set_mode(SystemMode::ErrorRecovery);
                }
            }
        }
    }

    fn remind_clock(&mut self, now_ms: u32, interval_ms: u32) {
        if elapsed_ms(self.last_reminder_ms, now_ms) >= interval_ms {
            self.last_reminder_ms = now_ms;
            self.notifier.notify(SystemEvent::ClockConfigurationRequired);
        }
    }

    fn enter_configuration_mode(&mut self) {
        self.last_reminder_ms = self.last_tick_ms;
        self.set_mode(SystemMode::ConfigurationMode);
        self.notifier.notify(SystemEvent::ClockConfigurationRequired);
    }

    fn network_housekeeping(&mut self, now_ms: u32) {
        let connected = self.link.is_connected();
        if self.backoff.poll(now_ms, connected) {
            self.link.request_reconnect();
            self.notifier.notify(SystemEvent::NetworkReconnectAttempt {
                next_delay_ms: self.backoff.delay_ms(),
            });
        }
    }

    fn sample_memory(&mut self) {
        let free = self.memory.free_bytes();
        if let Some(free_bytes) = self.health.update_memory(free) {
            self.notifier.notify(SystemEvent::LowMemory { free_bytes });
        }
    }

    fn validate_health(&mut self) {
        if !self.mode.runs_health_checks() {
            return;
        }

        // A stopped clock is handled by asking for it to be set, not counted
        if self.mode == SystemMode::NormalOperation && self.clock.is_halted() {
            self.enter_configuration_mode();
            return;
        }

        self.health.update_sequencer_fault(self.last_report.fault);
        match self.health.check() {
            HealthStatus::Ok => self.health.record_success(),
            HealthStatus::Fault(fault) => {
                let escalate = self.health.record_failure();
                self.notifier.notify(SystemEvent::HealthCheckFailed {
                    fault,
                    consecutive: self.health.consecutive_errors(),
                });
                if escalate {
                    self.enter_emergency(EmergencyCause::HealthCheck);
                }
            }
        }
    }

    fn enter_emergency(&mut self, cause: EmergencyCause) {
        self.sequencer.halt(cause);
        self.last_report = self.sequencer.report();
        self.drain_events();
        self.set_mode(SystemMode::EmergencyStop);
    }

    fn set_mode(&mut self, mode: SystemMode) {
        if mode != self.mode {
            let from = self.mode;
            self.mode = mode;
            self.mode_entered_ms = self.last_tick_ms;
            self.notifier
                .notify(SystemEvent::ModeChanged { from, to: mode });
        }
    }

    fn drain_events(&mut self) {
        while let Some(event) = self.sequencer.pop_event() {
            self.notifier.notify(event);
        }
    }

    fn retained_zone(&mut self, idx: usize) -> Option<&mut crate::config::ZoneConfig> {
        self.config.as_mut()?.zones.get_mut(idx)
    }
}

impl<A, C, N, M, L> Supervisor<A, C, N, M, L> {
    /// Check if irrigation is allowed
    pub fn is_operational(&self) -> bool {
        self.mode == SystemMode::NormalOperation
    }

    /// Check for counted failures or clock recovery
    pub fn has_errors(&self) -> bool {
        self.health.consecutive_errors() > 0 || self.mode == SystemMode::ErrorRecovery
    }

    pub fn mode(&self) -> SystemMode {
        self.mode
    }

    pub fn consecutive_errors(&self) -> u8 {
        self.health.consecutive_errors()
    }

    /// Lowest free memory seen since startup
    pub fn min_free_memory(&self) -> Option<u32> {
        self.health.min_free_memory()
    }

    pub fn sequencer(&self) -> &Sequencer<A> {
        &self.sequencer
    }

    /// Sequencer report from the latest tick
    pub fn last_report(&self) -> SequencerReport {
        self.last_report
    }

    /// Time since [`Supervisor::initialize`]
    pub fn uptime_ms(&self) -> u32 {
        self.started_ms
            .map_or(0, |started| elapsed_ms(started, self.last_tick_ms))
    }

    /// Retained configuration
    pub fn config(&self) -> Option<&SystemConfig> {
        self.config.as_ref()
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn memory_mut(&mut self) -> &mut M {
        &mut self.memory
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ZoneId, MAX_ZONES};
    use crate::mock::{
        make_config, make_zone, MockActuator, MockClock, MockLink, MockMemory, MockSource,
        RecordingNotifier,
    };
    use crate::sequencer::{IrrigationState, ServoState};
    use crate::supervisor::HealthFault;
    use crate::traits::SourceError;

    type TestSupervisor =
        Supervisor<MockActuator, MockClock, RecordingNotifier, MockMemory, MockLink>;

    fn make_supervisor(clock: MockClock) -> TestSupervisor {
        Supervisor::new(
            MockActuator::new(),
            clock,
            RecordingNotifier::default(),
            MockMemory::plenty(),
            MockLink {
                connected: true,
                reconnects: 0,
            },
        )
    }

    fn make_source() -> MockSource {
        MockSource(Ok(make_config(&[
            make_zone("Lawn", 60, 5),
            make_zone("Beds", 60, 5),
        ])))
    }

    fn started(clock: MockClock) -> TestSupervisor {
        let mut sup = make_supervisor(clock);
        sup.initialize(&mut make_source(), 0).unwrap();
        sup
    }

    fn mode_changes_to(sup: &TestSupervisor, mode: SystemMode) -> usize {
        sup.notifier()
            .count(|e| matches!(e, SystemEvent::ModeChanged { to, .. } if *to == mode))
    }

    #[test]
    fn test_initialize_with_valid_clock() {
        let sup = started(MockClock::running());
        assert_eq!(sup.mode(), SystemMode::NormalOperation);
        assert!(sup.is_operational());
        assert!(!sup.has_errors());
        assert_eq!(sup.sequencer().state(), IrrigationState::Idle);
        assert_eq!(
            mode_changes_to(&sup, SystemMode::NormalOperation),
            1
        );
    }

    #[test]
    fn test_halted_clock_requires_configuration() {
        let mut sup = started(MockClock::halted());
        assert_eq!(sup.mode(), SystemMode::ConfigurationMode);
        assert!(!sup.start_irrigation_cycle());
        assert_eq!(
            sup.handle(Command::OpenZone {
                zone: ZoneId(0),
                duration_s: None
            }),
            Err(SupervisorError::NotOperational)
        );

        sup.tick(1_000);
        assert!(!sup.start_irrigation_cycle());

        sup.set_clock_datetime(DateTime::new(2025, 4, 12, 7, 30, 0))
            .unwrap();
        assert_eq!(sup.mode(), SystemMode::NormalOperation);
        assert_eq!(sup.clock().writes, 1);
        assert!(sup.start_irrigation_cycle());
    }

    #[test]
    fn test_halted_clock_is_started_once() {
        let mut clock = MockClock::halted();
        clock.startable = true;
        let sup = started(clock);
        assert_eq!(sup.mode(), SystemMode::NormalOperation);
    }

    #[test]
    fn test_invalid_clock_time_rejected() {
        let mut sup = started(MockClock::halted());
        let bad = DateTime {
            month: 13,
            ..DateTime::new(2025, 1, 1, 0, 0, 0)
        };
        assert_eq!(
            sup.set_clock_datetime(bad),
            Err(SupervisorError::Clock(ClockError::InvalidTimestamp))
        );
        assert_eq!(sup.mode(), SystemMode::ConfigurationMode);
        assert_eq!(sup.clock().writes, 0);
    }

    #[test]
    fn test_configuration_reminders() {
        let mut sup = started(MockClock::halted());
        for t in 1..=20 {
            sup.tick(t * 1_000);
        }
        // One on entry, then one per reminder interval
        let reminders = sup
            .notifier()
            .count(|e| *e == SystemEvent::ClockConfigurationRequired);
        assert_eq!(reminders, 5);
        assert_eq!(sup.consecutive_errors(), 0);
    }

    #[test]
    fn test_config_unavailable_is_fatal() {
        let mut sup = make_supervisor(MockClock::running());
        let result = sup.initialize(&mut MockSource(Err(SourceError::Corrupted)), 0);
        assert_eq!(result, Err(SupervisorError::ConfigUnavailable));
        assert_eq!(sup.mode(), SystemMode::EmergencyStop);
        assert!(sup.sequencer().is_emergency_stopped());
    }

    #[test]
    fn test_reset_without_config_stays_stopped() {
        let mut sup = make_supervisor(MockClock::running());
        let mut source = MockSource(Err(SourceError::Storage));
        assert!(sup.initialize(&mut source, 0).is_err());

        sup.tick(40_000);
        assert_eq!(sup.reset(), Err(SupervisorError::ConfigUnavailable));
        assert_eq!(sup.mode(), SystemMode::EmergencyStop);

        for t in 1..=1_000u32 {
            sup.tick(40_000 + t * 100);
        }
        assert_eq!(sup.mode(), SystemMode::EmergencyStop);
        assert!(sup.has_errors());
        assert!(!sup.is_operational());
        assert!(sup.sequencer().is_emergency_stopped());
    }

    #[test]
    fn test_invalid_config_is_fatal() {
        let mut sup = make_supervisor(MockClock::running());
        let mut source = MockSource(Ok(make_config(&[])));
        assert_eq!(
            sup.initialize(&mut source, 0),
            Err(SupervisorError::Config(ConfigError::NoZones))
        );
        assert_eq!(sup.mode(), SystemMode::EmergencyStop);
        assert!(sup.has_errors());
    }

    #[test]
    fn test_sequencer_failure_is_fatal() {
        let mut sup = make_supervisor(MockClock::running());
        sup.sequencer.actuator_mut().failing[1] = true;
        assert_eq!(
            sup.initialize(&mut make_source(), 0),
            Err(SupervisorError::Sequencer(SequencerError::ActuatorFault))
        );
        assert_eq!(sup.mode(), SystemMode::EmergencyStop);
        assert!(sup.notifier().events.contains(&SystemEvent::EmergencyStop {
            cause: EmergencyCause::InitializationFailed
        }));
    }

    #[test]
    fn test_start_cycle_uses_auto_cycle_setting() {
        let mut sup = started(MockClock::running());
        assert!(sup.start_irrigation_cycle());
        assert!(sup.sequencer().auto_cycle());
        assert!(!sup.start_irrigation_cycle());
    }

    #[test]
    fn test_cycle_runs_through_ticks() {
        let mut sup = started(MockClock::running());
        assert!(sup.start_irrigation_cycle());

        let mut now = 0;
        while sup.sequencer().stats().cycles_completed == 0 {
            now += 100;
            sup.tick(now);
            assert!(now < 300_000, "cycle never completed");
        }
        assert_eq!(sup.mode(), SystemMode::NormalOperation);
        assert_eq!(
            sup.notifier()
                .count(|e| matches!(e, SystemEvent::CycleCompleted { .. })),
            1
        );
    }

    #[test]
    fn test_emergency_stop_cascades() {
        let mut sup = started(MockClock::running());
        assert!(sup.start_irrigation_cycle());
        sup.tick(100);
        sup.tick(1_100);
        assert_eq!(sup.last_report().state, IrrigationState::Irrigating);

        sup.emergency_stop();
        assert_eq!(sup.mode(), SystemMode::EmergencyStop);
        assert!(sup.sequencer().is_emergency_stopped());
        assert_eq!(sup.sequencer().active_valves(), 0);
        assert!(!sup.start_irrigation_cycle());

        // Nothing moves while halted
        let commands = sup.sequencer().actuator().log.len();
        sup.tick(60_000);
        assert_eq!(sup.sequencer().actuator().log.len(), commands);
    }

    #[test]
    fn test_reset_waits_for_cooldown() {
        let mut sup = started(MockClock::running());
        sup.tick(1_000);
        sup.emergency_stop();

        sup.tick(20_000);
        assert_eq!(sup.reset(), Err(SupervisorError::CooldownActive));
        assert_eq!(sup.mode(), SystemMode::EmergencyStop);

        sup.tick(31_000);
        assert_eq!(sup.reset(), Ok(()));
        assert_eq!(sup.mode(), SystemMode::Initializing);
        assert!(!sup.sequencer().is_emergency_stopped());

        sup.tick(31_100);
        assert_eq!(sup.mode(), SystemMode::NormalOperation);
        assert!(sup.start_irrigation_cycle());
    }

    #[test]
    fn test_health_failures_escalate_exactly_once() {
        let mut sup = make_supervisor(MockClock::running());
        sup.memory_mut().free = Some(4_000);
        sup.initialize(&mut make_source(), 0).unwrap();
        assert_eq!(sup.mode(), SystemMode::NormalOperation);

        let max = SystemConfig::default().limits.max_consecutive_errors as u32;
        for t in 1..=max {
            sup.tick(t * 100);
            assert_eq!(sup.mode(), SystemMode::NormalOperation);
            assert!(sup.has_errors());
        }
        for t in max + 1..max + 50 {
            sup.tick(t * 100);
            assert_eq!(sup.mode(), SystemMode::EmergencyStop);
        }

        assert_eq!(mode_changes_to(&sup, SystemMode::EmergencyStop), 1);
        assert_eq!(
            sup.notifier().count(|e| matches!(
                e,
                SystemEvent::HealthCheckFailed {
                    fault: HealthFault::LowMemory,
                    ..
                }
            )),
            max as usize + 1
        );
        assert!(sup.notifier().events.contains(&SystemEvent::EmergencyStop {
            cause: EmergencyCause::HealthCheck
        }));
    }

    #[test]
    fn test_healthy_check_resets_counter() {
        let mut sup = make_supervisor(MockClock::running());
        sup.memory_mut().free = Some(4_000);
        sup.initialize(&mut make_source(), 0).unwrap();
        sup.tick(100);
        sup.tick(200);
        assert_eq!(sup.consecutive_errors(), 2);

        sup.memory_mut().free = Some(50_000);
        sup.tick(30_000);
        assert_eq!(sup.consecutive_errors(), 0);
        assert!(!sup.has_errors());
        assert_eq!(sup.min_free_memory(), Some(4_000));
    }

    #[test]
    fn test_halted_clock_demotes_without_counting() {
        let mut sup = started(MockClock::running());
        sup.clock_mut().halted = true;
        sup.tick(100);
        assert_eq!(sup.mode(), SystemMode::ConfigurationMode);
        assert_eq!(sup.consecutive_errors(), 0);
        assert!(!sup.has_errors());
    }

    #[test]
    fn test_unreadable_clock_enters_error_recovery() {
        let mut sup = started(MockClock::running());
        assert!(sup.start_irrigation_cycle());
        sup.clock_mut().time = None;

        let max = SystemConfig::default().timing.max_clock_faults as u32;
        let interval = SystemConfig::default().timing.clock_check_interval_ms;
        for n in 1..=max {
            sup.tick(n * interval);
            assert_eq!(sup.mode(), SystemMode::NormalOperation);
        }
        sup.tick((max + 1) * interval);
        assert_eq!(sup.mode(), SystemMode::ErrorRecovery);
        assert!(sup.has_errors());
        assert!(!sup.sequencer().auto_cycle());
        assert!(!sup.start_irrigation_cycle());

        sup.set_clock_datetime(DateTime::new(2025, 6, 2, 6, 0, 0))
            .unwrap();
        assert_eq!(sup.mode(), SystemMode::NormalOperation);
        assert!(!sup.has_errors());
    }

    #[test]
    fn test_low_memory_warning() {
        let mut sup = started(MockClock::running());
        sup.memory_mut().free = Some(9_000);
        sup.tick(29_900);
        assert_eq!(
            sup.notifier()
                .count(|e| matches!(e, SystemEvent::LowMemory { .. })),
            0
        );
        sup.tick(30_000);
        assert!(sup
            .notifier()
            .events
            .contains(&SystemEvent::LowMemory { free_bytes: 9_000 }));
        // Warning only; above the floor
        assert_eq!(sup.consecutive_errors(), 0);
        assert_eq!(sup.min_free_memory(), Some(9_000));
    }

    #[test]
    fn test_network_reconnect_backoff() {
        let mut sup = started(MockClock::running());
        sup.link_mut().connected = false;

        for t in 0..=70 {
            sup.tick(t * 1_000);
        }
        // Link lost at 0; attempts at 1, 3, 7, 15, 31 and 63 s
        assert_eq!(sup.link_mut().reconnects, 6);

        sup.link_mut().connected = true;
        sup.tick(71_000);
        sup.link_mut().connected = false;
        sup.tick(72_000);
        sup.tick(73_000);
        assert_eq!(sup.link_mut().reconnects, 7);
    }

    #[test]
    fn test_all_zones_failing_surfaces_errors() {
        let mut sup = started(MockClock::running());
        sup.sequencer.actuator_mut().unresponsive = [true; MAX_ZONES];
        assert!(sup.start_irrigation_cycle());

        let mut now = 0;
        while !sup.sequencer().is_emergency_stopped() {
            now += 100;
            sup.tick(now);
            assert!(now < 60_000);
        }
        assert!(sup.has_errors());
        assert!(sup.notifier().events.contains(&SystemEvent::EmergencyStop {
            cause: EmergencyCause::AllZonesFailed
        }));
    }

    #[test]
    fn test_commands() {
        let mut sup = started(MockClock::running());

        sup.handle(Command::SetIrrigationTime {
            zone: ZoneId(1),
            seconds: 120,
        })
        .unwrap();
        assert_eq!(sup.sequencer().zones()[1].config().irrigation_time_s, 120);
        assert_eq!(
            sup.config().map(|c| c.zones[1].irrigation_time_s),
            Some(120)
        );

        assert_eq!(
            sup.handle(Command::SetIrrigationTime {
                zone: ZoneId(1),
                seconds: 5,
            }),
            Err(SupervisorError::Sequencer(
                SequencerError::InvalidConfiguration(ConfigError::IrrigationTimeOutOfRange)
            ))
        );

        sup.handle(Command::OpenZone {
            zone: ZoneId(0),
            duration_s: Some(60),
        })
        .unwrap();
        assert_eq!(
            sup.handle(Command::StartCycle),
            Err(SupervisorError::Sequencer(SequencerError::Busy))
        );
        sup.tick(1_000);
        assert_eq!(
            sup.sequencer().zones()[0].servo_state(),
            ServoState::Open
        );
        sup.handle(Command::CloseZone { zone: ZoneId(0) }).unwrap();
        sup.tick(2_000);
        assert_eq!(sup.sequencer().active_valves(), 0);

        sup.handle(Command::SetZoneEnabled {
            zone: ZoneId(0),
            enabled: false,
        })
        .unwrap();
        assert_eq!(sup.config().map(|c| c.zones[0].enabled), Some(false));

        sup.handle(Command::EmergencyStop).unwrap();
        assert_eq!(sup.mode(), SystemMode::EmergencyStop);
        assert_eq!(
            sup.handle(Command::Reset),
            Err(SupervisorError::CooldownActive)
        );
    }

    #[test]
    fn test_reset_keeps_runtime_changes() {
        let mut sup = started(MockClock::running());
        sup.handle(Command::SetZoneEnabled {
            zone: ZoneId(1),
            enabled: false,
        })
        .unwrap();
        sup.tick(1_000);
        sup.handle(Command::Reset).unwrap();
        sup.tick(1_100);
        assert_eq!(sup.mode(), SystemMode::NormalOperation);
        assert!(!sup.sequencer().zones()[1].is_enabled());
    }

    #[test]
    fn test_every_mode_change_is_notified() {
        let mut sup = started(MockClock::halted());
        sup.set_clock_datetime(DateTime::new(2025, 6, 1, 6, 0, 0))
            .unwrap();
        sup.emergency_stop();
        sup.tick(40_000);
        sup.reset().unwrap();
        sup.tick(40_100);

        let modes: std::vec::Vec<_> = sup
            .notifier()
            .events
            .iter()
            .filter_map(|e| match e {
                SystemEvent::ModeChanged { to, .. } => Some(*to),
                _ => None,
            })
            .collect();
        assert_eq!(
            modes,
            [
                SystemMode::ConfigurationMode,
                SystemMode::NormalOperation,
                SystemMode::EmergencyStop,
                SystemMode::Initializing,
                SystemMode::NormalOperation,
            ]
        );
    }

    #[test]
    fn test_uptime() {
        let mut sup = make_supervisor(MockClock::running());
        sup.initialize(&mut make_source(), 5_000).unwrap();
        sup.tick(12_000);
        assert_eq!(sup.uptime_ms(), 7_000);
    }
}
