use std::collections::BTreeSet;

use crate::api::peripheral_event::PeripheralEvent;
use crate::api::radio::CentralId;
use crate::peripheral::event_bridge::EventBridge;

/// Centrals known to be connected.
///
/// A subscription implies a connection, so backends without connection
/// callbacks still drive this through subscribe events.
#[derive(Debug, Default)]
pub struct ConnectionTracker {
    connected: BTreeSet<CentralId>,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.connected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connected.is_empty()
    }

    pub fn connect(&mut self, central: CentralId, events: &mut EventBridge) {
        if !self.connected.insert(central) {
            return;
        }
        if self.connected.len() == 1 {
            events.emit(PeripheralEvent::ConnectionChanged { connected: true });
        }
    }

    pub fn disconnect(&mut self, central: &str, events: &mut EventBridge) {
        if !self.connected.remove(central) {
            return;
        }
        log::debug!("Central {central} disconnected");
        if self.connected.is_empty() {
            events.emit(PeripheralEvent::ConnectionChanged { connected: false });
        }
    }

    /// The radio dropped every link.
    pub fn clear(&mut self, events: &mut EventBridge) {
        if self.connected.is_empty() {
            return;
        }
        self.connected.clear();
        events.emit(PeripheralEvent::ConnectionChanged { connected: false });
    }
}
