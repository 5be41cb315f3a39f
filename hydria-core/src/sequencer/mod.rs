//! Irrigation sequencer
//!
//! Drives one servo-actuated valve at a time through
//! open → water → close → transition across the configured zones, with
//! bounded retries, per-zone disablement and an emergency stop.

pub mod executor;
pub mod state;
pub mod zone;

pub use executor::{Sequencer, EVENT_QUEUE_SIZE};
pub use state::{IrrigationState, SequencerError, SequencerReport, SequencerStats};
pub use zone::{ServoState, Zone, ZoneRuntime};
