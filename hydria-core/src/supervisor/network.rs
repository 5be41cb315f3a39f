//! Network reconnect backoff

use crate::time::elapsed_ms;

/// First reconnect delay
pub const BACKOFF_INITIAL_MS: u32 = 1_000;
/// Reconnect delay ceiling
pub const BACKOFF_MAX_MS: u32 = 60_000;

/// Exponential reconnect backoff
///
/// Polled every tick; decides when the next reconnect request is due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReconnectBackoff {
    delay_ms: u32,
    /// When the link was first seen down or the last attempt was made
    last_attempt_ms: Option<u32>,
}

impl Default for ReconnectBackoff {
    fn default() -> Self {
        Self::new()
    }
}

impl ReconnectBackoff {
    pub const fn new() -> Self {
        Self {
            delay_ms: BACKOFF_INITIAL_MS,
            last_attempt_ms: None,
        }
    }

    /// Advance with the current link state
    ///
    /// Returns true if a reconnect should be requested now. The delay
    /// doubles after every request up to [`BACKOFF_MAX_MS`] and resets
    /// once the link is back.
    pub fn poll(&mut self, now_ms: u32, connected: bool) -> bool {
        if connected {
            self.reset();
            return false;
        }

        match self.last_attempt_ms {
            None => {
                self.last_attempt_ms = Some(now_ms);
                false
            }
            Some(last) if elapsed_ms(last, now_ms) >= self.delay_ms => {
                self.last_attempt_ms = Some(now_ms);
                self.delay_ms = self.delay_ms.saturating_mul(2).min(BACKOFF_MAX_MS);
                true
            }
            Some(_) => false,
        }
    }

    /// Delay before the next reconnect request
    pub fn delay_ms(&self) -> u32 {
        self.delay_ms
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connected_never_requests() {
        let mut backoff = ReconnectBackoff::new();
        for t in 0..100 {
            assert!(!backoff.poll(t * 1_000, true));
        }
    }

    #[test]
    fn test_delay_doubles_and_caps() {
        let mut backoff = ReconnectBackoff::new();
        let mut now = 0;
        assert!(!backoff.poll(now, false));

        let mut delays = std::vec::Vec::new();
        for _ in 0..10 {
            let delay = backoff.delay_ms();
            assert!(!backoff.poll(now + delay - 1, false));
            now += delay;
            assert!(backoff.poll(now, false));
            delays.push(delay);
        }
        assert_eq!(&delays[..7], &[1_000, 2_000, 4_000, 8_000, 16_000, 32_000, 60_000]);
        assert_eq!(backoff.delay_ms(), BACKOFF_MAX_MS);
    }

    #[test]
    fn test_reconnect_resets_delay() {
        let mut backoff = ReconnectBackoff::new();
        backoff.poll(0, false);
        backoff.poll(1_000, false);
        backoff.poll(3_000, false);
        assert_eq!(backoff.delay_ms(), 4_000);

        backoff.poll(3_500, true);
        assert_eq!(backoff.delay_ms(), BACKOFF_INITIAL_MS);
    }

    #[test]
    fn test_survives_timer_wrap() {
        let mut backoff = ReconnectBackoff::new();
        backoff.poll(u32::MAX - 500, false);
        assert!(backoff.poll(499, false));
    }
}
