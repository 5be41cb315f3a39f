//! Status LED task

use defmt::*;
use embassy_rp::gpio::Output;
use embassy_time::{Duration, Instant, Ticker};

use hydria_drivers::led::StatusLed;

use crate::channels::LED_PATTERN;

/// Finer than the fastest blink interval
const LED_UPDATE_MS: u64 = 50;

#[embassy_executor::task]
pub async fn led_task(pin: Output<'static>) {
    info!("LED task started");

    let mut led = StatusLed::new(pin, false);
    let mut ticker = Ticker::every(Duration::from_millis(LED_UPDATE_MS));
    let start = Instant::now();

    loop {
        ticker.next().await;

        if let Some(pattern) = LED_PATTERN.try_take() {
            led.set_pattern(pattern);
        }

        // GPIO output is infallible
        let _ = led.update(start.elapsed().as_millis() as u32);
    }
}
