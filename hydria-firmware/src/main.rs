//! Hydria - Irrigation Controller Firmware
//!
//! Main firmware binary for RP2040-based irrigation controllers.
//! Up to four servo-driven valves are watered one zone at a time,
//! supervised for clock, memory and sequencer health.
//!
//! Board wiring (Raspberry Pi Pico):
//! - Zone servos 1-4: GPIO2..GPIO5 (PWM slices 1 and 2)
//! - Status LED: GPIO25 (on-board)
//! - Control button: GPIO15 to ground

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::pwm::{Config as PwmConfig, Pwm};
use embassy_rp::watchdog::Watchdog;
use embedded_alloc::LlffHeap as Heap;
use {defmt_rtt as _, panic_probe as _};

use hydria_core::servo::PulseRange;
use hydria_core::supervisor::{Command, Supervisor};
use hydria_core::time::DateTime;
use hydria_core::traits::NoNetwork;
use hydria_drivers::clock::SoftClock;
use hydria_drivers::servo::PwmServoBank;

use crate::channels::COMMAND_CHANNEL;
use crate::clock::EmbassyUptime;
use crate::memory::HeapProbe;
use crate::notifier::LogNotifier;
use crate::tasks::supervisor::SERVO_CHANNELS;

#[global_allocator]
static HEAP: Heap = Heap::empty();

// Heap size: 16KB
const HEAP_SIZE: usize = 16 * 1024;

/// 125 MHz / 64 / 39063 = 50 Hz servo frame
const PWM_DIVIDER: u8 = 64;
const PWM_TOP: u16 = 39_062;

mod channels;
mod clock;
mod memory;
mod notifier;
mod storage;
mod tasks;

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Hydria firmware starting...");

    init_heap();

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let config = storage::load_config(p.FLASH, p.DMA_CH0).await;
    let pulse = match &config {
        Ok(config) => {
            if config.zones.len() > SERVO_CHANNELS {
                warn!(
                    "{} zones configured but only {} servo outputs fitted",
                    config.zones.len(),
                    SERVO_CHANNELS
                );
            }
            config.pulse
        }
        Err(_) => PulseRange::default(),
    };

    let mut pwm_config = PwmConfig::default();
    pwm_config.divider = PWM_DIVIDER.into();
    pwm_config.top = PWM_TOP;

    let (zone1, zone2) =
        Pwm::new_output_ab(p.PWM_SLICE1, p.PIN_2, p.PIN_3, pwm_config.clone()).split();
    let (zone3, zone4) = Pwm::new_output_ab(p.PWM_SLICE2, p.PIN_4, p.PIN_5, pwm_config).split();
    let servos = PwmServoBank::new(
        [unwrap!(zone1), unwrap!(zone2), unwrap!(zone3), unwrap!(zone4)],
        pulse,
    );
    info!("Servo PWM initialized ({}-{} us)", pulse.min_us, pulse.max_us);

    let supervisor = Supervisor::new(
        servos,
        SoftClock::new(EmbassyUptime),
        LogNotifier,
        HeapProbe,
        NoNetwork,
    );
    let watchdog = Watchdog::new(p.WATCHDOG);

    let led = Output::new(p.PIN_25, Level::Low);
    let button = Input::new(p.PIN_15, Pull::Up);

    // Without a battery-backed RTC the build time is the best initial guess
    match build_time() {
        Some(time) => {
            info!("Seeding clock from build time");
            if COMMAND_CHANNEL.try_send(Command::SetClock(time)).is_err() {
                warn!("Command queue full, clock left unset");
            }
        }
        None => info!("No build time available, waiting for clock to be set"),
    }

    unwrap!(spawner.spawn(tasks::tick_task()));
    unwrap!(spawner.spawn(tasks::supervisor_task(supervisor, config, watchdog)));
    unwrap!(spawner.spawn(tasks::led_task(led)));
    unwrap!(spawner.spawn(tasks::button_task(button)));

    info!("All tasks spawned, firmware running");

    loop {
        embassy_time::Timer::after_secs(60).await;
        trace!("Main loop heartbeat");
    }
}

/// Initialize the heap allocator
fn init_heap() {
    use core::mem::MaybeUninit;
    static mut HEAP_MEM: [MaybeUninit<u8>; HEAP_SIZE] = [MaybeUninit::uninit(); HEAP_SIZE];
    #[allow(static_mut_refs)]
    unsafe {
        HEAP.init(HEAP_MEM.as_ptr() as usize, HEAP_SIZE)
    }
}

/// Build timestamp stamped in by build.rs
fn build_time() -> Option<DateTime> {
    let secs = option_env!("HYDRIA_BUILD_EPOCH")?.parse::<u64>().ok()?;
    Some(DateTime::from_unix(secs))
}
