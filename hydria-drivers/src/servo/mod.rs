//! Servo valve drivers

pub mod pwm;

pub use pwm::PwmServoBank;
