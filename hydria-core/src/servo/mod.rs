//! Servo positioning
//!
//! Pure angle to pulse-width math shared by every actuator implementation.

pub mod pulse;

pub use pulse::{angle_to_pulse, PulseRange, MAX_SERVO_ANGLE, SERVO_CLOSED_ANGLE};
