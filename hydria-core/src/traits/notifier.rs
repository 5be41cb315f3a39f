//! Status notification trait

use crate::events::SystemEvent;

/// Receiver for state-change notifications
///
/// Drives LED patterns, log output or remote broadcasts. Delivery is
/// fire-and-forget: implementations must not block, and the core never
/// waits on them.
pub trait StatusNotifier {
    /// Deliver one event
    fn notify(&mut self, event: SystemEvent);
}

impl<T: StatusNotifier + ?Sized> StatusNotifier for &mut T {
    fn notify(&mut self, event: SystemEvent) {
        (**self).notify(event)
    }
}

/// Discards every event
impl StatusNotifier for () {
    fn notify(&mut self, _event: SystemEvent) {}
}
