//! Time handling
//!
//! The core never reads a clock on its own. Monotonic time arrives as a
//! `now_ms: u32` argument to every tick, and wall-clock time is a
//! [`DateTime`] exchanged with the clock source.

pub mod datetime;

pub use datetime::DateTime;

/// Duration in whole seconds
pub type Seconds = u32;

/// Milliseconds elapsed between two monotonic timestamps
///
/// Uses wrapping arithmetic so the ~49.7 day rollover of a `u32`
/// millisecond counter does not produce bogus durations.
#[inline]
pub fn elapsed_ms(since_ms: u32, now_ms: u32) -> u32 {
    now_ms.wrapping_sub(since_ms)
}

/// Convert seconds to milliseconds, saturating on overflow
#[inline]
pub const fn secs_to_ms(secs: Seconds) -> u32 {
    secs.saturating_mul(1000)
}
