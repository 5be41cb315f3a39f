//! Platform housekeeping traits
//!
//! Configuration storage, memory accounting and network links. None of
//! these carry irrigation logic; the supervisor polls them.

use crate::config::SystemConfig;

/// Errors from a configuration source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SourceError {
    /// Nothing stored
    NotFound,
    /// Storage operation failed
    Storage,
    /// Stored data could not be decoded
    Corrupted,
    /// Stored data has an unsupported layout version
    VersionMismatch,
}

/// Supplies the system configuration
///
/// Consumed once by `Supervisor::initialize`. The persistence format is
/// up to the implementation.
pub trait ConfigSource {
    /// Load the configuration
    fn load(&mut self) -> Result<SystemConfig, SourceError>;
}

impl<T: ConfigSource + ?Sized> ConfigSource for &mut T {
    fn load(&mut self) -> Result<SystemConfig, SourceError> {
        (**self).load()
    }
}

/// Already-loaded configuration, or the error from loading it
impl ConfigSource for Result<SystemConfig, SourceError> {
    fn load(&mut self) -> Result<SystemConfig, SourceError> {
        self.clone()
    }
}

/// Reports free heap/stack memory
pub trait MemoryProbe {
    /// Free bytes, or `None` if the platform cannot tell
    fn free_bytes(&self) -> Option<u32>;
}

impl<T: MemoryProbe + ?Sized> MemoryProbe for &mut T {
    fn free_bytes(&self) -> Option<u32> {
        (**self).free_bytes()
    }
}

/// Network link that the supervisor keeps alive
pub trait NetworkLink {
    /// Check if the link is up
    fn is_connected(&self) -> bool;

    /// Kick off a reconnect attempt
    ///
    /// Must return immediately; the outcome is observed through
    /// [`NetworkLink::is_connected`] on later ticks.
    fn request_reconnect(&mut self);
}

impl<T: NetworkLink + ?Sized> NetworkLink for &mut T {
    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    fn request_reconnect(&mut self) {
        (**self).request_reconnect()
    }
}

/// Link for builds without a network transport
///
/// Always reports connected, so no reconnects are ever requested.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoNetwork;

impl NetworkLink for NoNetwork {
    fn is_connected(&self) -> bool {
        true
    }

    fn request_reconnect(&mut self) {}
}
