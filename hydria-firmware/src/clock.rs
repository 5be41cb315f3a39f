//! Uptime source for the software clock

use embassy_time::Instant;

use hydria_drivers::clock::Uptime;

/// Seconds since boot from the embassy time driver
pub struct EmbassyUptime;

impl Uptime for EmbassyUptime {
    fn uptime_secs(&self) -> u64 {
        Instant::now().as_secs()
    }
}
