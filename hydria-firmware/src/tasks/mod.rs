//! Embassy async tasks
//!
//! Each task runs independently and communicates via channels/signals.

pub mod button;
pub mod led;
pub mod supervisor;
pub mod tick;

pub use button::button_task;
pub use led::led_task;
pub use supervisor::{supervisor_task, FirmwareSupervisor};
pub use tick::tick_task;
