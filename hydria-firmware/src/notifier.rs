//! Event sink for the supervisor
//!
//! Logs every event over RTT and forwards mode changes to the LED task.

use defmt::*;

use hydria_core::events::SystemEvent;
use hydria_core::traits::StatusNotifier;

use crate::channels::LED_PATTERN;

pub struct LogNotifier;

impl StatusNotifier for LogNotifier {
    fn notify(&mut self, event: SystemEvent) {
        match event {
            SystemEvent::ModeChanged { from, to } => {
                info!("Mode {:?} -> {:?}", from, to);
                LED_PATTERN.signal(to.blink_pattern());
            }
            SystemEvent::EmergencyStop { cause } => {
                error!("EMERGENCY STOP ({:?})", cause);
            }
            SystemEvent::ServoRetry { .. } | SystemEvent::NetworkReconnectAttempt { .. } => {
                debug!("{:?}", event);
            }
            e if e.is_fault() => warn!("{:?}", e),
            e => info!("{:?}", e),
        }
    }
}
