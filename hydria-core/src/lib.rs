//! Board-agnostic core logic for the irrigation controller firmware
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Collaborator traits (actuator, clock, notifier, config source)
//! - Zone and system configuration with bounds validation
//! - Servo angle to pulse-width mapping
//! - Irrigation sequencer (one valve at a time, bounded retries)
//! - System supervisor (operating modes, health checks, commands)
//! - Calendar timestamps for the clock source

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod config;
pub mod events;
pub mod sequencer;
pub mod servo;
pub mod supervisor;
pub mod time;
pub mod traits;

#[cfg(test)]
mod mock;
