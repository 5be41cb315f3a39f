//! System supervisor
//!
//! Owns the sequencer and the platform collaborators, runs the operating
//! mode machine, and applies health, clock and network housekeeping on
//! every tick.

pub mod command;
pub mod health;
pub mod mode;
pub mod network;
pub mod system;

pub use command::Command;
pub use health::{HealthFault, HealthMonitor, HealthStatus};
pub use mode::{BlinkPattern, SystemMode};
pub use network::{ReconnectBackoff, BACKOFF_INITIAL_MS, BACKOFF_MAX_MS};
pub use system::{Supervisor, SupervisorError};
