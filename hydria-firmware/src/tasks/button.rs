//! Push-button task
//!
//! A single front-panel button controls the system:
//!
//! | Press            | Command                              |
//! |------------------|--------------------------------------|
//! | short            | start a cycle, or stop the running one |
//! | held ≥ 2 s       | emergency stop                       |
//! | held ≥ 5 s       | reset (sent without waiting for release) |

use defmt::*;
use embassy_futures::select::{select, Either};
use embassy_rp::gpio::Input;
use embassy_time::{Instant, Timer};
use portable_atomic::Ordering;

use hydria_core::supervisor::Command;

use crate::channels::{COMMAND_CHANNEL, IRRIGATION_ACTIVE};

const DEBOUNCE_MS: u64 = 20;
pub const LONG_PRESS_MS: u64 = 2_000;
pub const VERY_LONG_PRESS_MS: u64 = 5_000;

#[embassy_executor::task]
pub async fn button_task(mut button: Input<'static>) {
    info!("Button task started");

    loop {
        // Active low with pull-up
        button.wait_for_low().await;
        Timer::after_millis(DEBOUNCE_MS).await;
        if button.is_high() {
            continue;
        }

        let pressed_at = Instant::now();
        let held = select(
            button.wait_for_high(),
            Timer::after_millis(VERY_LONG_PRESS_MS),
        )
        .await;

        let held_ms = match held {
            Either::First(()) => pressed_at.elapsed().as_millis(),
            Either::Second(()) => VERY_LONG_PRESS_MS,
        };
        let command = press_command(held_ms, IRRIGATION_ACTIVE.load(Ordering::Relaxed));

        debug!("Button held {} ms", held_ms);
        if COMMAND_CHANNEL.try_send(command).is_err() {
            warn!("Command queue full, dropping {:?}", command);
        }

        if button.is_low() {
            button.wait_for_high().await;
        }
        Timer::after_millis(DEBOUNCE_MS).await;
    }
}

fn press_command(held_ms: u64, irrigating: bool) -> Command {
    if held_ms >= VERY_LONG_PRESS_MS {
        Command::Reset
    } else if held_ms >= LONG_PRESS_MS {
        Command::EmergencyStop
    } else if irrigating {
        Command::StopCycle
    } else {
        Command::StartCycle
    }
}
