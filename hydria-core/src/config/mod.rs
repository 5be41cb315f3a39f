//! Configuration types
//!
//! Board-agnostic configuration structures, persisted by the firmware as
//! postcard binary data. Every structure validates its own bounds.

pub mod system;
pub mod zone;

pub use system::*;
pub use zone::*;
