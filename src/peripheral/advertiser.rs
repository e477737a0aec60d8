use crate::api::peripheral_event::{AdvertisingState, PeripheralEvent, RadioState};
use crate::api::radio::{Advertisement, Radio};
use crate::peripheral::event_bridge::EventBridge;
use crate::peripheral::registry::ServiceRegistry;
use crate::{Error, Result};

/// Advertising state machine:
/// `Idle -> Starting -> Advertising -> Stopping -> Idle`, with
/// `Starting -> Failed` when the radio refuses.
#[derive(Debug, Default)]
pub struct Advertiser {
    state: AdvertisingState,
    advertisement: Option<Advertisement>,
}

impl Advertiser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &AdvertisingState {
        &self.state
    }

    pub fn advertisement(&self) -> Option<&Advertisement> {
        self.advertisement.as_ref()
    }

    pub fn is_idle(&self) -> bool {
        self.state == AdvertisingState::Idle
    }

    pub fn start<R: Radio + ?Sized>(
        &mut self,
        local_name: &str,
        power: RadioState,
        registry: &ServiceRegistry,
        radio: &mut R,
        events: &mut EventBridge,
    ) -> Result<()> {
        let service = match (power.is_powered_on(), registry.descriptor()) {
            (false, _) => Err("bluetooth not powered on"),
            (true, Some(descriptor)) if registry.is_registered() => Ok(descriptor.uuid()),
            (true, _) => Err("service not registered"),
        };
        let service = match service {
            Ok(service) => service,
            Err(reason) => {
                log::warn!("Cannot start advertising: {reason}");
                events.emit(PeripheralEvent::AdvertisingChanged {
                    state: AdvertisingState::Failed(reason.to_string()),
                });
                return Err(Error::PreconditionNotMet(reason.to_string()));
            }
        };

        if matches!(self.state, AdvertisingState::Starting | AdvertisingState::Advertising) {
            log::debug!("Already {:?}, ignoring start", self.state);
            return Ok(());
        }

        let advertisement = Advertisement {
            local_name: local_name.to_string(),
            service_uuids: vec![service],
        };
        log::info!("Starting advertising as {local_name:?}");
        self.set_state(AdvertisingState::Starting, events);
        radio.start_advertising(&advertisement);
        self.advertisement = Some(advertisement);
        Ok(())
    }

    /// Apply the radio's start confirmation. Ignored unless a start is in
    /// flight, so a confirmation arriving after `stop` cannot resurrect the
    /// session.
    pub fn on_started(&mut self, error: Option<String>, events: &mut EventBridge) {
        if self.state != AdvertisingState::Starting {
            log::debug!("Dropping stale advertising confirmation in {:?}", self.state);
            return;
        }
        match error {
            None => {
                log::info!("Advertising started");
                self.set_state(AdvertisingState::Advertising, events)
            }
            Some(reason) => {
                log::error!("Failed to start advertising: {reason}");
                self.set_state(AdvertisingState::Failed(reason), events)
            }
        }
    }

    /// Always ends `Idle` and always reports it, even when already idle.
    pub fn stop<R: Radio + ?Sized>(&mut self, radio: &mut R, events: &mut EventBridge) {
        if self.is_idle() {
            events.emit(PeripheralEvent::AdvertisingChanged {
                state: AdvertisingState::Idle,
            });
            return;
        }
        self.set_state(AdvertisingState::Stopping, events);
        radio.stop_advertising();
        self.advertisement = None;
        log::info!("Advertising stopped");
        self.set_state(AdvertisingState::Idle, events);
    }

    /// The radio stopped advertising on its own, e.g. after powering off.
    pub fn reset(&mut self, events: &mut EventBridge) {
        self.advertisement = None;
        self.set_state(AdvertisingState::Idle, events);
    }

    fn set_state(&mut self, state: AdvertisingState, events: &mut EventBridge) {
        if self.state == state {
            return;
        }
        log::debug!("Advertising {:?} -> {state:?}", self.state);
        self.state = state.clone();
        events.emit(PeripheralEvent::AdvertisingChanged { state });
    }
}
