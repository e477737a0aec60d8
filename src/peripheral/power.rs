use crate::api::peripheral_event::{PeripheralEvent, RadioState};
use crate::peripheral::event_bridge::EventBridge;

/// Tracks the radio's power state. Only radio callbacks mutate it.
#[derive(Debug, Default)]
pub struct PowerMonitor {
    state: RadioState,
}

impl PowerMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RadioState {
        self.state
    }

    pub fn is_powered_on(&self) -> bool {
        self.state.is_powered_on()
    }

    /// Apply a reported state. Returns the previous state when it changed.
    pub fn update(&mut self, state: RadioState, events: &mut EventBridge) -> Option<RadioState> {
        if state == self.state {
            return None;
        }
        let previous = std::mem::replace(&mut self.state, state);
        log::info!("Radio state {previous:?} -> {state:?}");
        events.emit(PeripheralEvent::PowerChanged { state });
        Some(previous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_state_emits_once() {
        let mut events = EventBridge::new();
        let mut stream = events.attach();
        let mut power = PowerMonitor::new();

        assert_eq!(power.update(RadioState::PoweredOn, &mut events), Some(RadioState::Unknown));
        assert_eq!(power.update(RadioState::PoweredOn, &mut events), None);
        assert!(power.is_powered_on());

        assert_eq!(
            stream.drain(),
            vec![PeripheralEvent::PowerChanged { state: RadioState::PoweredOn }]
        );
    }
}
