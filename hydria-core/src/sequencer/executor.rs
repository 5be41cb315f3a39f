//! Irrigation sequencer
//!
//! Non-blocking state machine advanced by [`Sequencer::tick`]. Each tick
//! performs at most one state transition and never waits on hardware:
//! servo commands are fire-and-forget and their completion is inferred
//! from elapsed time (or polled position feedback).
//!
//! Exactly one valve is ever away from closed. Cycles walk the enabled
//! zones in order through `current`, and manual overrides are refused
//! while anything else is moving.

use heapless::{Deque, Vec};

use super::state::{IrrigationState, SequencerError, SequencerReport, SequencerStats};
use super::zone::{ServoState, Zone};
use crate::config::{
    validate_angle, validate_irrigation_time, validate_zones, TimingConfig, ZoneConfig, ZoneId,
    MAX_IRRIGATION_TIME_S, MAX_ZONES,
};
use crate::events::{EmergencyCause, SystemEvent};
use crate::servo::SERVO_CLOSED_ANGLE;
use crate::time::{elapsed_ms, secs_to_ms, Seconds};
use crate::traits::ActuatorPort;

/// Pending events kept between drains; the oldest is dropped on overflow
pub const EVENT_QUEUE_SIZE: usize = 16;

/// Progress of an in-flight servo movement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Movement {
    Pending,
    Done,
    TimedOut,
}

/// Operator-requested single-zone run outside any cycle
#[derive(Debug, Clone, Copy)]
struct ManualRun {
    zone: usize,
    limit_ms: u32,
    /// Set once the valve is confirmed open
    opened_ms: Option<u32>,
}

/// Irrigation sequencer
///
/// Owns the zone list and the actuator. All mutation happens through
/// `&mut self` from the single tick-calling context.
#[derive(Debug)]
pub struct Sequencer<A> {
    actuator: A,
    timing: TimingConfig,
    zones: Vec<Zone, MAX_ZONES>,
    /// Zone the cycle is working on
    current: usize,
    state: IrrigationState,
    state_entered_ms: u32,
    auto_cycle: bool,
    emergency_stop: bool,
    /// Settle in IDLE once the active valve has closed
    stop_requested: bool,
    /// Wait applied in TRANSITIONING before the next zone opens
    transition_delay_ms: u32,
    manual: Option<ManualRun>,
    stats: SequencerStats,
    /// Timestamp of the latest tick; stamps transitions made between ticks
    last_tick_ms: u32,
    events: Deque<SystemEvent, EVENT_QUEUE_SIZE>,
}

impl<A: ActuatorPort> Sequencer<A> {
    /// Create a sequencer with default timing
    ///
    /// No zones are configured until [`Sequencer::init`] succeeds.
    pub fn new(actuator: A) -> Self {
        Self::with_timing(actuator, TimingConfig::default())
    }

    /// Create a sequencer with explicit timing
    pub fn with_timing(actuator: A, timing: TimingConfig) -> Self {
        Self {
            actuator,
            timing,
            zones: Vec::new(),
            current: 0,
            state: IrrigationState::Idle,
            state_entered_ms: 0,
            auto_cycle: false,
            emergency_stop: false,
            stop_requested: false,
            transition_delay_ms: 0,
            manual: None,
            stats: SequencerStats::default(),
            last_tick_ms: 0,
            events: Deque::new(),
        }
    }

    /// Replace the timing parameters
    pub fn set_timing(&mut self, timing: TimingConfig) {
        self.timing = timing;
    }

    /// Current timing parameters
    pub fn timing(&self) -> &TimingConfig {
        &self.timing
    }

    /// Borrow the actuator
    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    /// Mutably borrow the actuator
    pub fn actuator_mut(&mut self) -> &mut A {
        &mut self.actuator
    }

    /// Load zones and drive every valve closed
    ///
    /// Replaces any previous zone list, clears a latched emergency stop
    /// and returns to IDLE. Cumulative statistics are kept.
    pub fn init(&mut self, zone_configs: &[ZoneConfig]) -> Result<(), SequencerError> {
        validate_zones(zone_configs)?;

        self.zones.clear();
        for config in zone_configs {
            let _ = self.zones.push(Zone::new(config.clone()));
        }
        self.current = 0;
        self.manual = None;
        self.auto_cycle = false;
        self.stop_requested = false;
        self.emergency_stop = false;

        if self.close_all_zones() {
            self.set_state(IrrigationState::Idle);
            Ok(())
        } else {
            self.set_state(IrrigationState::Error);
            Err(SequencerError::ActuatorFault)
        }
    }

    /// Start a cycle over the enabled zones
    ///
    /// With `auto_repeat`, the cycle restarts after the cooldown each
    /// time it completes.
    pub fn start_cycle(&mut self, auto_repeat: bool) -> Result<(), SequencerError> {
        if self.emergency_stop {
            return Err(SequencerError::EmergencyActive);
        }
        if !self.state.accepts_start() || self.manual.is_some() {
            return Err(SequencerError::Busy);
        }
        let first = self
            .first_available()
            .ok_or(SequencerError::NoEnabledZones)?;

        self.current = first;
        self.auto_cycle = auto_repeat;
        self.stop_requested = false;
        self.set_state(IrrigationState::Initializing);
        self.push_event(SystemEvent::CycleStarted {
            first_zone: zone_id(first),
        });
        Ok(())
    }

    /// Stop the cycle gracefully
    ///
    /// An open or opening valve is closed first; the sequencer settles in
    /// IDLE once it is confirmed closed. A manual run is closed too.
    pub fn stop_cycle(&mut self) {
        if self.emergency_stop {
            return;
        }
        self.auto_cycle = false;

        match self.state {
            IrrigationState::OpeningValve | IrrigationState::Irrigating => {
                let idx = self.current;
                if self.state == IrrigationState::Irrigating {
                    let watered = elapsed_ms(self.state_entered_ms, self.last_tick_ms);
                    self.record_watering(idx, watered);
                }
                self.command(idx, SERVO_CLOSED_ANGLE, ServoState::Closing);
                self.stop_requested = true;
                self.set_state(IrrigationState::ClosingValve);
            }
            IrrigationState::ClosingValve => {
                self.stop_requested = true;
            }
            IrrigationState::Initializing
            | IrrigationState::Transitioning
            | IrrigationState::Completed => {
                self.set_state(IrrigationState::Idle);
            }
            IrrigationState::Idle | IrrigationState::Error => {}
        }

        if self.manual.is_some() {
            self.close_manual();
        }
    }

    /// Immediately command every valve closed and latch the emergency stop
    ///
    /// Idempotent. Only [`Sequencer::reset_emergency_stop`] clears it.
    pub fn emergency_stop_all(&mut self) {
        self.halt(EmergencyCause::Operator);
    }

    /// Clear a latched emergency stop
    ///
    /// Every zone returns to CLOSED with its retries cleared and the
    /// sequencer returns to IDLE. Zones disabled by failures stay disabled.
    pub fn reset_emergency_stop(&mut self) {
        if !self.emergency_stop {
            return;
        }
        for idx in 0..self.zones.len() {
            let _ = self.actuator.drive(zone_id(idx), SERVO_CLOSED_ANGLE);
            let zone = &mut self.zones[idx];
            zone.target_angle = SERVO_CLOSED_ANGLE;
            zone.runtime.retry_count = 0;
            self.set_servo_state(idx, ServoState::Closed);
        }
        self.emergency_stop = false;
        self.set_state(IrrigationState::Idle);
        self.push_event(SystemEvent::EmergencyCleared);
    }

    /// Open one zone outside of a cycle
    ///
    /// The valve closes by itself after `duration` (or after
    /// [`MAX_IRRIGATION_TIME_S`] when `None`).
    pub fn open_zone_valve(
        &mut self,
        zone: ZoneId,
        duration: Option<Seconds>,
    ) -> Result<(), SequencerError> {
        if self.emergency_stop {
            return Err(SequencerError::EmergencyActive);
        }
        let idx = self.zone_index(zone)?;
        let limit_s = match duration {
            None => MAX_IRRIGATION_TIME_S,
            Some(d) if (1..=MAX_IRRIGATION_TIME_S).contains(&d) => d,
            Some(_) => return Err(SequencerError::InvalidDuration),
        };
        if !self.state.accepts_start() || self.manual.is_some() || self.active_valves() > 0 {
            return Err(SequencerError::Busy);
        }
        if self.zones[idx].servo_state() == ServoState::Error {
            return Err(SequencerError::ZoneFault);
        }

        let angle = self.zones[idx].config.open_angle;
        self.command(idx, angle, ServoState::Opening);
        self.manual = Some(ManualRun {
            zone: idx,
            limit_ms: secs_to_ms(limit_s),
            opened_ms: None,
        });
        Ok(())
    }

    /// Close one zone outside of a cycle
    ///
    /// The cycle's own valve cannot be closed this way; use
    /// [`Sequencer::stop_cycle`].
    pub fn close_zone_valve(&mut self, zone: ZoneId) -> Result<(), SequencerError> {
        if self.emergency_stop {
            return Err(SequencerError::EmergencyActive);
        }
        let idx = self.zone_index(zone)?;

        if let Some(run) = self.manual {
            if run.zone == idx {
                self.close_manual();
                return Ok(());
            }
        }
        if self.state.is_valve_phase() && self.current == idx {
            return Err(SequencerError::Busy);
        }

        match self.zones[idx].servo_state() {
            ServoState::Error => Err(SequencerError::ZoneFault),
            _ => {
                self.actuator
                    .drive(zone, SERVO_CLOSED_ANGLE)
                    .map_err(|_| SequencerError::ActuatorFault)?;
                self.zones[idx].target_angle = SERVO_CLOSED_ANGLE;
                self.set_servo_state(idx, ServoState::Closed);
                Ok(())
            }
        }
    }

    /// Enable or disable a zone for future cycles
    ///
    /// Re-enabling a zone in ERROR drives it closed and clears its
    /// retries; that is only allowed while no cycle is running.
    pub fn set_zone_enabled(&mut self, zone: ZoneId, enabled: bool) -> Result<(), SequencerError> {
        let idx = self.zone_index(zone)?;

        if enabled && self.zones[idx].servo_state() == ServoState::Error {
            if self.emergency_stop {
                return Err(SequencerError::EmergencyActive);
            }
            if self.state.is_cycle_active() || self.manual.is_some() {
                return Err(SequencerError::Busy);
            }
            self.actuator
                .drive(zone, SERVO_CLOSED_ANGLE)
                .map_err(|_| SequencerError::ActuatorFault)?;
            let z = &mut self.zones[idx];
            z.target_angle = SERVO_CLOSED_ANGLE;
            z.runtime.retry_count = 0;
            self.set_servo_state(idx, ServoState::Closed);
        }

        self.zones[idx].runtime.enabled = enabled;
        Ok(())
    }

    /// Change a zone's watering time
    pub fn set_zone_irrigation_time(
        &mut self,
        zone: ZoneId,
        secs: Seconds,
    ) -> Result<(), SequencerError> {
        validate_irrigation_time(secs)?;
        let idx = self.zone_index(zone)?;
        self.zones[idx].config.irrigation_time_s = secs;
        Ok(())
    }

    /// Change a zone's open angle (applies from the next opening)
    pub fn set_zone_open_angle(&mut self, zone: ZoneId, angle: u8) -> Result<(), SequencerError> {
        validate_angle(angle)?;
        let idx = self.zone_index(zone)?;
        self.zones[idx].config.open_angle = angle;
        Ok(())
    }

    /// Advance the state machine
    ///
    /// Call regularly from the host loop with a monotonic millisecond
    /// timestamp. Performs at most one transition.
    pub fn tick(&mut self, now_ms: u32) -> SequencerReport {
        self.last_tick_ms = now_ms;

        if !self.emergency_stop && !self.zones.is_empty() {
            match self.state {
                IrrigationState::Idle => self.tick_manual(now_ms),
                IrrigationState::Initializing => self.tick_initializing(),
                IrrigationState::OpeningValve => self.tick_opening(now_ms),
                IrrigationState::Irrigating => self.tick_irrigating(now_ms),
                IrrigationState::ClosingValve => self.tick_closing(now_ms),
                IrrigationState::Transitioning => self.tick_transitioning(now_ms),
                IrrigationState::Completed => self.tick_completed(now_ms),
                IrrigationState::Error => self.tick_error(now_ms),
            }
        }

        self.report()
    }

    fn tick_initializing(&mut self) {
        if !self.close_all_zones() {
            self.set_state(IrrigationState::Error);
            return;
        }
        if !self.zones[self.current].is_available() {
            match self.first_available() {
                Some(idx) => self.current = idx,
                None => {
                    self.auto_cycle = false;
                    self.set_state(IrrigationState::Idle);
                    return;
                }
            }
        }
        self.begin_opening(self.current);
    }

    fn tick_opening(&mut self, now_ms: u32) {
        let idx = self.current;
        match self.movement(idx, now_ms) {
            Movement::Done => {
                self.confirm(idx, ServoState::Open);
                self.set_state(IrrigationState::Irrigating);
            }
            Movement::TimedOut => self.servo_timeout(idx),
            Movement::Pending => {}
        }
    }

    fn tick_irrigating(&mut self, now_ms: u32) {
        let idx = self.current;
        let run_ms = secs_to_ms(self.zones[idx].config.irrigation_time_s);
        let watered = elapsed_ms(self.state_entered_ms, now_ms);
        if watered >= run_ms {
            self.record_watering(idx, watered);
            self.command(idx, SERVO_CLOSED_ANGLE, ServoState::Closing);
            self.set_state(IrrigationState::ClosingValve);
        }
    }

    fn tick_closing(&mut self, now_ms: u32) {
        let idx = self.current;
        match self.movement(idx, now_ms) {
            Movement::Done => {
                self.confirm(idx, ServoState::Closed);
                let delay_ms = secs_to_ms(self.zones[idx].config.transition_delay_s);
                self.advance_after(idx, delay_ms);
            }
            Movement::TimedOut => self.servo_timeout(idx),
            Movement::Pending => {}
        }
    }

    fn tick_transitioning(&mut self, now_ms: u32) {
        if elapsed_ms(self.state_entered_ms, now_ms) < self.transition_delay_ms {
            return;
        }
        // Zone may have been disabled while we waited
        if !self.zones[self.current].is_available() {
            match self.next_available_after(self.current) {
                Some(idx) => self.current = idx,
                None => {
                    self.complete_cycle();
                    return;
                }
            }
        }
        self.begin_opening(self.current);
    }

    fn tick_completed(&mut self, now_ms: u32) {
        if self.manual.is_some() {
            self.tick_manual(now_ms);
            return;
        }
        if !self.auto_cycle {
            self.set_state(IrrigationState::Idle);
            return;
        }
        let cooldown_ms = secs_to_ms(self.timing.cycle_cooldown_s);
        if elapsed_ms(self.state_entered_ms, now_ms) < cooldown_ms {
            return;
        }
        match self.first_available() {
            Some(idx) => {
                self.current = idx;
                self.set_state(IrrigationState::Initializing);
                self.push_event(SystemEvent::CycleStarted {
                    first_zone: zone_id(idx),
                });
            }
            None => {
                self.auto_cycle = false;
                self.set_state(IrrigationState::Idle);
            }
        }
    }

    fn tick_error(&mut self, now_ms: u32) {
        if elapsed_ms(self.state_entered_ms, now_ms) < self.timing.error_recovery_interval_ms {
            return;
        }
        if self.close_all_zones() {
            self.set_state(IrrigationState::Idle);
        } else {
            // Try again after another interval
            self.state_entered_ms = now_ms;
        }
    }

    fn tick_manual(&mut self, now_ms: u32) {
        let Some(run) = self.manual else {
            return;
        };
        let idx = run.zone;

        match self.zones[idx].servo_state() {
            ServoState::Opening => match self.movement(idx, now_ms) {
                Movement::Done => {
                    self.confirm(idx, ServoState::Open);
                    self.manual = Some(ManualRun {
                        opened_ms: Some(now_ms),
                        ..run
                    });
                }
                Movement::TimedOut => self.servo_timeout(idx),
                Movement::Pending => {}
            },
            ServoState::Open => {
                let opened = run.opened_ms.unwrap_or(now_ms);
                if elapsed_ms(opened, now_ms) >= run.limit_ms {
                    self.close_manual();
                }
            }
            ServoState::Closing => match self.movement(idx, now_ms) {
                Movement::Done => {
                    self.confirm(idx, ServoState::Closed);
                    self.manual = None;
                }
                Movement::TimedOut => self.servo_timeout(idx),
                Movement::Pending => {}
            },
            _ => self.manual = None,
        }
    }

    /// Close the manually opened valve, recording its watering time
    fn close_manual(&mut self) {
        let Some(run) = self.manual else {
            return;
        };
        let idx = run.zone;
        match self.zones[idx].servo_state() {
            ServoState::Open => {
                if let Some(opened) = run.opened_ms {
                    self.record_watering(idx, elapsed_ms(opened, self.last_tick_ms));
                }
                self.command(idx, SERVO_CLOSED_ANGLE, ServoState::Closing);
            }
            ServoState::Opening => {
                self.command(idx, SERVO_CLOSED_ANGLE, ServoState::Closing);
            }
            ServoState::Closing => {}
            _ => self.manual = None,
        }
    }

    fn begin_opening(&mut self, idx: usize) {
        let angle = self.zones[idx].config.open_angle;
        self.command(idx, angle, ServoState::Opening);
        self.set_state(IrrigationState::OpeningValve);
    }

    /// Move on after `idx` finished (or failed)
    fn advance_after(&mut self, idx: usize, delay_ms: u32) {
        if self.stop_requested {
            self.stop_requested = false;
            self.set_state(IrrigationState::Idle);
            return;
        }
        match self.next_available_after(idx) {
            Some(next) => {
                self.current = next;
                self.transition_delay_ms = delay_ms;
                self.set_state(IrrigationState::Transitioning);
            }
            None => self.complete_cycle(),
        }
    }

    fn complete_cycle(&mut self) {
        self.stats.cycles_completed = self.stats.cycles_completed.saturating_add(1);
        self.set_state(IrrigationState::Completed);
        self.push_event(SystemEvent::CycleCompleted {
            cycles_completed: self.stats.cycles_completed,
        });
    }

    /// Handle a movement that did not complete within the timeout
    ///
    /// Re-issues the same command while retries remain, otherwise takes
    /// the zone out of rotation.
    fn servo_timeout(&mut self, idx: usize) {
        let zone = &mut self.zones[idx];
        zone.runtime.retry_count = zone.runtime.retry_count.saturating_add(1);
        let retry = zone.runtime.retry_count;

        if retry <= self.timing.max_servo_retries {
            let angle = zone.target_angle;
            let state = zone.runtime.servo_state;
            self.push_event(SystemEvent::ServoRetry {
                zone: zone_id(idx),
                retry,
            });
            self.command(idx, angle, state);
            return;
        }

        self.disable_faulted(idx);
    }

    /// Mark a zone ERROR, disable it and decide how the run continues
    fn disable_faulted(&mut self, idx: usize) {
        // Best effort; the valve position is unknown from here on
        let _ = self.actuator.drive(zone_id(idx), SERVO_CLOSED_ANGLE);
        self.zones[idx].runtime.enabled = false;
        self.set_servo_state(idx, ServoState::Error);
        self.push_event(SystemEvent::ZoneDisabled { zone: zone_id(idx) });

        let was_manual = matches!(self.manual, Some(run) if run.zone == idx);
        if was_manual {
            self.manual = None;
        }

        if self.first_available().is_none() {
            self.halt(EmergencyCause::AllZonesFailed);
            return;
        }

        if !was_manual && self.state.is_cycle_active() {
            self.advance_after(idx, 0);
        }
    }

    /// Latch the emergency stop with every valve commanded closed
    pub(crate) fn halt(&mut self, cause: EmergencyCause) {
        if self.state == IrrigationState::Irrigating && !self.emergency_stop {
            let watered = elapsed_ms(self.state_entered_ms, self.last_tick_ms);
            self.record_watering(self.current, watered);
        }
        if let Some(ManualRun {
            zone,
            opened_ms: Some(opened),
            ..
        }) = self.manual
        {
            if self.zones[zone].servo_state() == ServoState::Open {
                self.record_watering(zone, elapsed_ms(opened, self.last_tick_ms));
            }
        }

        for idx in 0..self.zones.len() {
            let _ = self.actuator.drive(zone_id(idx), SERVO_CLOSED_ANGLE);
            let zone = &mut self.zones[idx];
            zone.target_angle = SERVO_CLOSED_ANGLE;
            if zone.servo_state() != ServoState::Error {
                zone.runtime.retry_count = 0;
                self.set_servo_state(idx, ServoState::Closed);
            }
        }

        self.manual = None;
        self.stop_requested = false;
        self.auto_cycle = false;

        let first_time = !self.emergency_stop;
        self.emergency_stop = true;
        self.set_state(IrrigationState::Error);
        if first_time {
            self.push_event(SystemEvent::EmergencyStop { cause });
        }
    }

    /// Drive every non-faulted zone closed, marking accepted ones CLOSED
    ///
    /// Returns false if any channel rejected the command.
    fn close_all_zones(&mut self) -> bool {
        let mut all_ok = true;
        for idx in 0..self.zones.len() {
            if self.zones[idx].servo_state() == ServoState::Error {
                continue;
            }
            match self.actuator.drive(zone_id(idx), SERVO_CLOSED_ANGLE) {
                Ok(()) => {
                    let zone = &mut self.zones[idx];
                    zone.target_angle = SERVO_CLOSED_ANGLE;
                    zone.command_ok = true;
                    zone.runtime.retry_count = 0;
                    zone.runtime.last_action_ms = self.last_tick_ms;
                    self.set_servo_state(idx, ServoState::Closed);
                }
                Err(_) => all_ok = false,
            }
        }
        all_ok
    }

    /// Issue a servo command and enter the given moving state
    fn command(&mut self, idx: usize, angle: u8, moving: ServoState) {
        let accepted = self.actuator.drive(zone_id(idx), angle).is_ok();
        let zone = &mut self.zones[idx];
        zone.target_angle = angle;
        zone.command_ok = accepted;
        zone.runtime.last_action_ms = self.last_tick_ms;
        self.set_servo_state(idx, moving);
    }

    fn movement(&self, idx: usize, now_ms: u32) -> Movement {
        let zone = &self.zones[idx];
        let id = zone_id(idx);
        let elapsed = elapsed_ms(zone.runtime.last_action_ms, now_ms);

        let reached = zone.command_ok
            && self.actuator.is_energized(id)
            && match self.actuator.position(id) {
                Some(angle) => angle == zone.target_angle,
                None => elapsed >= self.timing.servo_movement_ms,
            };

        if reached {
            Movement::Done
        } else if elapsed >= self.timing.servo_timeout_ms() {
            Movement::TimedOut
        } else {
            Movement::Pending
        }
    }

    fn confirm(&mut self, idx: usize, state: ServoState) {
        self.zones[idx].runtime.retry_count = 0;
        self.set_servo_state(idx, state);
    }

    fn record_watering(&mut self, idx: usize, watered_ms: u32) {
        let secs = watered_ms / 1000;
        let zone = &mut self.zones[idx];
        zone.runtime.session_irrigation_s = zone.runtime.session_irrigation_s.saturating_add(secs);
        self.stats.total_watering_s = self.stats.total_watering_s.saturating_add(secs);
    }

    fn set_state(&mut self, state: IrrigationState) {
        self.state_entered_ms = self.last_tick_ms;
        if state != self.state {
            let from = self.state;
            self.state = state;
            self.push_event(SystemEvent::IrrigationStateChanged { from, to: state });
        }
    }

    fn set_servo_state(&mut self, idx: usize, state: ServoState) {
        let zone = &mut self.zones[idx];
        if zone.runtime.servo_state != state {
            zone.runtime.servo_state = state;
            self.push_event(SystemEvent::ZoneStateChanged {
                zone: zone_id(idx),
                state,
            });
        }
    }

    fn push_event(&mut self, event: SystemEvent) {
        if self.events.is_full() {
            let _ = self.events.pop_front();
        }
        let _ = self.events.push_back(event);
    }

    fn zone_index(&self, zone: ZoneId) -> Result<usize, SequencerError> {
        let idx = zone.index();
        if idx < self.zones.len() {
            Ok(idx)
        } else {
            Err(SequencerError::InvalidZone)
        }
    }

    fn first_available(&self) -> Option<usize> {
        self.zones.iter().position(Zone::is_available)
    }

    fn next_available_after(&self, idx: usize) -> Option<usize> {
        let start = idx + 1;
        self.zones
            .get(start..)?
            .iter()
            .position(Zone::is_available)
            .map(|offset| start + offset)
    }
}

impl<A> Sequencer<A> {
    /// Current state
    pub fn state(&self) -> IrrigationState {
        self.state
    }

    /// All configured zones
    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    /// Look up one zone
    pub fn zone(&self, zone: ZoneId) -> Option<&Zone> {
        self.zones.get(zone.index())
    }

    /// Zone whose valve is away from closed, if any
    pub fn active_zone(&self) -> Option<ZoneId> {
        if let Some(run) = self.manual {
            return Some(zone_id(run.zone));
        }
        if self.state.is_valve_phase() {
            Some(zone_id(self.current))
        } else {
            None
        }
    }

    /// Watering time left for the active zone
    pub fn remaining_irrigation_s(&self) -> Seconds {
        if let Some(run) = self.manual {
            return match run.opened_ms {
                Some(opened) => {
                    run.limit_ms.saturating_sub(elapsed_ms(opened, self.last_tick_ms)) / 1000
                }
                None => run.limit_ms / 1000,
            };
        }
        match self.state {
            IrrigationState::OpeningValve => self.zones[self.current].config.irrigation_time_s,
            IrrigationState::Irrigating => {
                let run_ms = secs_to_ms(self.zones[self.current].config.irrigation_time_s);
                run_ms.saturating_sub(elapsed_ms(self.state_entered_ms, self.last_tick_ms)) / 1000
            }
            _ => 0,
        }
    }

    /// Number of zones whose valve is away from closed
    pub fn active_valves(&self) -> usize {
        self.zones
            .iter()
            .filter(|z| z.servo_state().is_active())
            .count()
    }

    /// Check for emergency stop, sequencer fault, or a failed zone
    pub fn has_errors(&self) -> bool {
        self.emergency_stop
            || self.state == IrrigationState::Error
            || self
                .zones
                .iter()
                .any(|z| z.servo_state() == ServoState::Error)
    }

    /// Check if the emergency stop is latched
    pub fn is_emergency_stopped(&self) -> bool {
        self.emergency_stop
    }

    /// Check if cycles restart automatically
    pub fn auto_cycle(&self) -> bool {
        self.auto_cycle
    }

    /// Cumulative counters
    pub fn stats(&self) -> SequencerStats {
        self.stats
    }

    /// Snapshot of the current state
    pub fn report(&self) -> SequencerReport {
        SequencerReport {
            state: self.state,
            active_zone: self.active_zone(),
            remaining_s: self.remaining_irrigation_s(),
            fault: self.state == IrrigationState::Error,
        }
    }

    /// Take the oldest pending event
    pub fn pop_event(&mut self) -> Option<SystemEvent> {
        self.events.pop_front()
    }
}

fn zone_id(idx: usize) -> ZoneId {
    ZoneId(idx as u8)
}
