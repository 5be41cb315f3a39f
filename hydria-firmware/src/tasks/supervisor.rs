//! Supervisor task
//!
//! Owns the supervisor and everything it drives. Applies queued commands
//! and advances the controller once per tick, feeding the watchdog as
//! long as the loop keeps running.

use defmt::*;
use embassy_rp::pwm::PwmOutput;
use embassy_rp::watchdog::Watchdog;
use embassy_time::Duration;
use portable_atomic::Ordering;

use hydria_core::config::{SafetyLimits, SystemConfig};
use hydria_core::supervisor::Supervisor;
use hydria_core::traits::{NoNetwork, SourceError};
use hydria_drivers::clock::SoftClock;
use hydria_drivers::servo::PwmServoBank;

use crate::channels::{COMMAND_CHANNEL, IRRIGATION_ACTIVE};
use crate::clock::EmbassyUptime;
use crate::memory::HeapProbe;
use crate::notifier::LogNotifier;
use crate::tasks::tick::TICK_SIGNAL;

/// Servo outputs fitted on the board
pub const SERVO_CHANNELS: usize = 4;

/// Longest period the RP2040 watchdog counter can hold
const WATCHDOG_MAX_MS: u32 = 8_000;

pub type ServoBank = PwmServoBank<PwmOutput<'static>, SERVO_CHANNELS>;

pub type FirmwareSupervisor =
    Supervisor<ServoBank, SoftClock<EmbassyUptime>, LogNotifier, HeapProbe, NoNetwork>;

#[embassy_executor::task]
pub async fn supervisor_task(
    mut supervisor: FirmwareSupervisor,
    mut config: Result<SystemConfig, SourceError>,
    mut watchdog: Watchdog,
) {
    info!("Supervisor task started");

    let timeout_ms = config
        .as_ref()
        .map_or(SafetyLimits::default().watchdog_timeout_ms, |c| {
            c.limits.watchdog_timeout_ms
        })
        .min(WATCHDOG_MAX_MS);
    watchdog.start(Duration::from_millis(timeout_ms as u64));
    debug!("Watchdog armed: {} ms", timeout_ms);

    let now_ms = TICK_SIGNAL.wait().await;
    match supervisor.initialize(&mut config, now_ms) {
        Ok(()) => info!("Supervisor up in {:?}", supervisor.mode()),
        Err(e) => error!("Initialization failed: {:?}", e),
    }

    loop {
        let now_ms = TICK_SIGNAL.wait().await;

        while let Ok(command) = COMMAND_CHANNEL.try_receive() {
            if command.actuates() {
                info!("Command: {:?}", command);
            } else {
                debug!("Command: {:?}", command);
            }
            if let Err(e) = supervisor.handle(command) {
                warn!("Command {:?} rejected: {:?}", command, e);
            }
        }

        supervisor.tick(now_ms);

        let report = supervisor.last_report();
        IRRIGATION_ACTIVE.store(
            report.state.is_cycle_active() || report.active_zone.is_some(),
            Ordering::Relaxed,
        );

        watchdog.feed();
    }
}
