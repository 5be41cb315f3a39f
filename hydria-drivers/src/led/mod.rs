//! Status indication

pub mod status;

pub use status::StatusLed;
