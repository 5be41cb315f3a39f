//! Deterministic collaborator fakes for unit tests

use std::vec::Vec;

use crate::config::{SystemConfig, ZoneConfig, ZoneId, MAX_ZONES};
use crate::events::SystemEvent;
use crate::time::DateTime;
use crate::traits::{
    ActuatorError, ActuatorPort, ClockError, ClockSource, ConfigSource, MemoryProbe, NetworkLink,
    SourceError, StatusNotifier,
};

/// Scriptable servo bank
#[derive(Debug, Default)]
pub struct MockActuator {
    /// Last angle written per channel
    pub angles: [Option<u8>; MAX_ZONES],
    /// `drive` returns an error for these channels
    pub failing: [bool; MAX_ZONES],
    /// These channels accept commands but never energize
    pub unresponsive: [bool; MAX_ZONES],
    /// Report commanded angles as position feedback
    pub feedback: bool,
    /// Every accepted or rejected command, in order
    pub log: Vec<(ZoneId, u8)>,
}

impl MockActuator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count commands that tried to move `zone` to `angle`
    pub fn commands_to(&self, zone: ZoneId, angle: u8) -> usize {
        self.log
            .iter()
            .filter(|(z, a)| *z == zone && *a == angle)
            .count()
    }
}

impl ActuatorPort for MockActuator {
    fn drive(&mut self, zone: ZoneId, angle_deg: u8) -> Result<(), ActuatorError> {
        self.log.push((zone, angle_deg));
        let idx = zone.index();
        if idx >= MAX_ZONES {
            return Err(ActuatorError::InvalidChannel);
        }
        if self.failing[idx] {
            return Err(ActuatorError::Hardware);
        }
        self.angles[idx] = Some(angle_deg);
        Ok(())
    }

    fn is_energized(&self, zone: ZoneId) -> bool {
        let idx = zone.index();
        idx < MAX_ZONES && self.angles[idx].is_some() && !self.unresponsive[idx]
    }

    fn position(&self, zone: ZoneId) -> Option<u8> {
        if self.feedback {
            self.angles.get(zone.index()).copied().flatten()
        } else {
            None
        }
    }
}

/// Clock with settable halted/unreadable behavior
#[derive(Debug)]
pub struct MockClock {
    pub time: Option<DateTime>,
    pub halted: bool,
    /// `start()` restarts the oscillator
    pub startable: bool,
    pub writes: usize,
}

impl MockClock {
    pub fn running() -> Self {
        Self {
            time: Some(DateTime::new(2025, 6, 1, 6, 0, 0)),
            halted: false,
            startable: false,
            writes: 0,
        }
    }

    pub fn halted() -> Self {
        Self {
            time: None,
            halted: true,
            startable: false,
            writes: 0,
        }
    }
}

impl ClockSource for MockClock {
    fn read(&mut self) -> Option<DateTime> {
        if self.halted {
            None
        } else {
            self.time
        }
    }

    fn write(&mut self, time: DateTime) -> Result<(), ClockError> {
        if !time.is_valid() {
            return Err(ClockError::InvalidTimestamp);
        }
        self.time = Some(time);
        self.halted = false;
        self.writes += 1;
        Ok(())
    }

    fn is_halted(&mut self) -> bool {
        self.halted
    }

    fn start(&mut self) -> Result<(), ClockError> {
        if self.startable {
            self.halted = false;
            if self.time.is_none() {
                self.time = Some(DateTime::new(2025, 1, 1, 0, 0, 0));
            }
            Ok(())
        } else {
            Err(ClockError::Unsupported)
        }
    }
}

/// Records every event it receives
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub events: Vec<SystemEvent>,
}

impl RecordingNotifier {
    pub fn count(&self, pred: impl Fn(&SystemEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl StatusNotifier for RecordingNotifier {
    fn notify(&mut self, event: SystemEvent) {
        self.events.push(event);
    }
}

/// Fixed free-memory reading
#[derive(Debug)]
pub struct MockMemory {
    pub free: Option<u32>,
}

impl MockMemory {
    pub fn plenty() -> Self {
        Self { free: Some(64_000) }
    }
}

impl MemoryProbe for MockMemory {
    fn free_bytes(&self) -> Option<u32> {
        self.free
    }
}

/// Link that counts reconnect requests
#[derive(Debug, Default)]
pub struct MockLink {
    pub connected: bool,
    pub reconnects: usize,
}

impl NetworkLink for MockLink {
    fn is_connected(&self) -> bool {
        self.connected
    }

    fn request_reconnect(&mut self) {
        self.reconnects += 1;
    }
}

/// Config source returning a fixed result
pub struct MockSource(pub Result<SystemConfig, SourceError>);

impl ConfigSource for MockSource {
    fn load(&mut self) -> Result<SystemConfig, SourceError> {
        self.0.clone()
    }
}

pub fn make_zone(name: &str, irrigation_time_s: u32, transition_delay_s: u32) -> ZoneConfig {
    ZoneConfig::new(name, 90, irrigation_time_s, transition_delay_s)
}

pub fn make_config(zones: &[ZoneConfig]) -> SystemConfig {
    let mut config = SystemConfig::default();
    config.zones.clear();
    for zone in zones {
        let _ = config.zones.push(zone.clone());
    }
    config
}
