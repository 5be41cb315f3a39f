//! Collaborator traits
//!
//! These traits define the boundary between the irrigation logic and
//! the platform: actuator channels, the wall clock, status reporting,
//! configuration storage and housekeeping probes.
//!
//! Every trait is also implemented for `&mut T`, so the supervisor can
//! hold a borrowed handle instead of owning the collaborator.

pub mod actuator;
pub mod clock;
pub mod notifier;
pub mod platform;

pub use actuator::{ActuatorError, ActuatorPort};
pub use clock::{ClockError, ClockSource};
pub use notifier::StatusNotifier;
pub use platform::{ConfigSource, MemoryProbe, NetworkLink, NoNetwork, SourceError};
