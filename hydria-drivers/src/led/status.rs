//! Status LED
//!
//! Blinks a single GPIO LED at the rate of the current [`BlinkPattern`].
//! Registered as a status notifier it follows mode changes by itself;
//! `update()` must be called periodically to toggle the pin.

use embedded_hal::digital::OutputPin;
use hydria_core::events::SystemEvent;
use hydria_core::supervisor::{BlinkPattern, SystemMode};
use hydria_core::time::elapsed_ms;
use hydria_core::traits::StatusNotifier;

/// Blinking status LED
pub struct StatusLed<P> {
    pin: P,
    pattern: BlinkPattern,
    /// LED lights when the pin is driven low
    active_low: bool,
    lit: bool,
    last_toggle_ms: u32,
}

impl<P: OutputPin> StatusLed<P> {
    /// Create an LED showing the start-up pattern
    pub fn new(pin: P, active_low: bool) -> Self {
        Self {
            pin,
            pattern: SystemMode::Initializing.blink_pattern(),
            active_low,
            lit: false,
            last_toggle_ms: 0,
        }
    }

    /// Change the blink rate
    pub fn set_pattern(&mut self, pattern: BlinkPattern) {
        self.pattern = pattern;
    }

    pub fn pattern(&self) -> BlinkPattern {
        self.pattern
    }

    pub fn is_lit(&self) -> bool {
        self.lit
    }

    /// Toggle the LED if the pattern interval has elapsed
    pub fn update(&mut self, now_ms: u32) -> Result<(), P::Error> {
        if elapsed_ms(self.last_toggle_ms, now_ms) < self.pattern.interval_ms() {
            return Ok(());
        }
        self.last_toggle_ms = now_ms;
        self.lit = !self.lit;
        self.write()
    }

    /// Turn the LED off
    pub fn off(&mut self) -> Result<(), P::Error> {
        self.lit = false;
        self.write()
    }

    fn write(&mut self) -> Result<(), P::Error> {
        if self.lit != self.active_low {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        }
    }
}

impl<P: OutputPin> StatusNotifier for StatusLed<P> {
    fn notify(&mut self, event: SystemEvent) {
        if let SystemEvent::ModeChanged { to, .. } = event {
            self.set_pattern(to.blink_pattern());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embedded_hal::digital::ErrorType;

    #[derive(Debug, Default)]
    struct MockPin {
        high: bool,
        writes: usize,
    }

    impl ErrorType for MockPin {
        type Error = Infallible;
    }

    impl OutputPin for MockPin {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            self.high = false;
            self.writes += 1;
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            self.high = true;
            self.writes += 1;
            Ok(())
        }
    }

    #[test]
    fn test_toggles_at_pattern_rate() {
        let mut led = StatusLed::new(MockPin::default(), false);
        assert_eq!(led.pattern(), BlinkPattern::Fast);

        led.update(100).unwrap();
        assert!(!led.is_lit());
        led.update(250).unwrap();
        assert!(led.is_lit());
        assert!(led.pin.high);
        led.update(400).unwrap();
        assert!(led.is_lit());
        led.update(500).unwrap();
        assert!(!led.is_lit());
        assert!(!led.pin.high);
        assert_eq!(led.pin.writes, 2);
    }

    #[test]
    fn test_follows_mode_changes() {
        let mut led = StatusLed::new(MockPin::default(), false);
        led.notify(SystemEvent::ModeChanged {
            from: SystemMode::Initializing,
            to: SystemMode::NormalOperation,
        });
        assert_eq!(led.pattern(), BlinkPattern::Slow);

        led.notify(SystemEvent::ClockSet);
        assert_eq!(led.pattern(), BlinkPattern::Slow);

        led.notify(SystemEvent::ModeChanged {
            from: SystemMode::NormalOperation,
            to: SystemMode::EmergencyStop,
        });
        assert_eq!(led.pattern(), BlinkPattern::VeryFast);
    }

    #[test]
    fn test_active_low() {
        let mut led = StatusLed::new(MockPin::default(), true);
        led.update(250).unwrap();
        assert!(led.is_lit());
        assert!(!led.pin.high);
        led.off().unwrap();
        assert!(led.pin.high);
    }
}
