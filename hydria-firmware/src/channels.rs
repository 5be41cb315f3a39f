//! Inter-task communication channels
//!
//! Every request that changes controller state travels through
//! [`COMMAND_CHANNEL`] and is applied by the supervisor task at the top of
//! its next tick; no other task touches the supervisor.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use portable_atomic::AtomicBool;

use hydria_core::supervisor::{BlinkPattern, Command};

/// Pending control requests
const COMMAND_CHANNEL_SIZE: usize = 8;

/// Control requests from the button (and any future remote surface)
pub static COMMAND_CHANNEL: Channel<CriticalSectionRawMutex, Command, COMMAND_CHANNEL_SIZE> =
    Channel::new();

/// Blink pattern for the status LED (updated on mode changes)
pub static LED_PATTERN: Signal<CriticalSectionRawMutex, BlinkPattern> = Signal::new();

/// A cycle or manual run is in progress (read by the button task)
pub static IRRIGATION_ACTIVE: AtomicBool = AtomicBool::new(false);
