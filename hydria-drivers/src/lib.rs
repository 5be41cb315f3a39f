//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the collaborator
//! traits defined in hydria-core over `embedded-hal` 1.0:
//!
//! - Servo valves on PWM channels ([`servo::PwmServoBank`])
//! - Status LED blinker ([`led::StatusLed`])
//! - Uptime-backed wall clock ([`clock::SoftClock`])

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod clock;
pub mod led;
pub mod servo;
