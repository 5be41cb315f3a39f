//! Clock sources

pub mod soft;

pub use soft::{SoftClock, Uptime};
