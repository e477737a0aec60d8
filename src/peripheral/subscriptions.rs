use std::collections::BTreeSet;

use crate::api::peripheral_event::PeripheralEvent;
use crate::api::radio::CentralId;
use crate::peripheral::event_bridge::EventBridge;

/// Centrals subscribed to the characteristic.
///
/// Only the aggregate "anyone listening" signal is reported, on transitions
/// between zero and non-zero subscribers.
#[derive(Debug, Default)]
pub struct SubscriptionTracker {
    subscribers: BTreeSet<CentralId>,
}

impl SubscriptionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_subscribers(&self) -> bool {
        !self.is_empty()
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    pub fn centrals(&self) -> Vec<CentralId> {
        self.subscribers.iter().cloned().collect()
    }

    pub fn subscribe(&mut self, central: CentralId, events: &mut EventBridge) {
        log::debug!("Central {central} subscribed");
        if self.subscribers.insert(central) && self.subscribers.len() == 1 {
            events.emit(PeripheralEvent::SubscriptionChanged { subscribed: true });
        }
    }

    pub fn unsubscribe(&mut self, central: &str, events: &mut EventBridge) {
        if !self.subscribers.remove(central) {
            return;
        }
        log::debug!("Central {central} unsubscribed");
        if self.subscribers.is_empty() {
            events.emit(PeripheralEvent::SubscriptionChanged { subscribed: false });
        }
    }

    pub fn clear(&mut self, events: &mut EventBridge) {
        if self.subscribers.is_empty() {
            return;
        }
        self.subscribers.clear();
        events.emit(PeripheralEvent::SubscriptionChanged { subscribed: false });
    }
}
