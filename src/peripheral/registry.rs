use uuid::Uuid;

use crate::api::peripheral_event::{PeripheralEvent, RadioState, RegistrationState};
use crate::api::radio::Radio;
use crate::api::service::ServiceDescriptor;
use crate::peripheral::event_bridge::EventBridge;
use crate::{Error, Result};

pub const REGISTRATION_IN_PROGRESS: &str = "service registration in progress";

/// Owns the service descriptor and its registration with the radio.
#[derive(Debug, Default)]
pub struct ServiceRegistry {
    descriptor: Option<ServiceDescriptor>,
    state: RegistrationState,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &RegistrationState {
        &self.state
    }

    pub fn descriptor(&self) -> Option<&ServiceDescriptor> {
        self.descriptor.as_ref()
    }

    pub fn is_registered(&self) -> bool {
        self.state == RegistrationState::Registered
    }

    pub fn is_registering(&self) -> bool {
        self.state == RegistrationState::Registering
    }

    /// The registered service's characteristic, if any.
    pub fn registered_characteristic(&self) -> Option<Uuid> {
        match (&self.state, &self.descriptor) {
            (RegistrationState::Registered, Some(descriptor)) => {
                Some(descriptor.characteristic_uuid())
            }
            _ => None,
        }
    }

    /// Submit `descriptor` to the radio, replacing the current one.
    ///
    /// Fails with `PreconditionNotMet` while a registration is in flight;
    /// the in-flight descriptor is kept.
    pub fn register<R: Radio + ?Sized>(
        &mut self,
        descriptor: ServiceDescriptor,
        power: RadioState,
        radio: &mut R,
        events: &mut EventBridge,
    ) -> Result<()> {
        if !power.is_powered_on() {
            return Err(Error::NotPoweredOn);
        }
        if self.is_registering() {
            return Err(Error::PreconditionNotMet(REGISTRATION_IN_PROGRESS.to_string()));
        }
        if let (RegistrationState::Registered, Some(previous)) = (&self.state, &self.descriptor) {
            log::debug!("Removing previous service {}", previous.uuid());
            radio.remove_service(previous);
        }

        log::info!("Registering service {}", descriptor.uuid());
        radio.add_service(&descriptor);
        self.descriptor = Some(descriptor);
        self.set_state(RegistrationState::Registering, events);
        Ok(())
    }

    /// Apply the radio's completion for `service`. Completions that do not
    /// match the in-flight registration are dropped.
    pub fn on_service_added(
        &mut self,
        service: Uuid,
        error: Option<String>,
        events: &mut EventBridge,
    ) {
        let expected = self.descriptor.as_ref().map(ServiceDescriptor::uuid);
        if !self.is_registering() || expected != Some(service) {
            log::debug!("Dropping stale service confirmation for {service}");
            return;
        }
        match error {
            None => self.set_state(RegistrationState::Registered, events),
            Some(reason) => {
                log::error!("Failed to register service {service}: {reason}");
                self.set_state(RegistrationState::Failed(reason), events)
            }
        }
    }

    /// Remove the service from the radio and forget the descriptor.
    pub fn unregister<R: Radio + ?Sized>(&mut self, radio: &mut R, events: &mut EventBridge) {
        let Some(descriptor) = self.descriptor.take() else {
            return;
        };
        if matches!(
            self.state,
            RegistrationState::Registering | RegistrationState::Registered
        ) {
            radio.remove_service(&descriptor);
        }
        self.set_state(RegistrationState::Unregistered, events);
    }

    /// The radio dropped every service, e.g. after powering off. The
    /// descriptor is kept so it can be registered again.
    pub fn reset(&mut self, events: &mut EventBridge) {
        self.set_state(RegistrationState::Unregistered, events);
    }

    fn set_state(&mut self, state: RegistrationState, events: &mut EventBridge) {
        if self.state == state {
            return;
        }
        log::debug!("Registration {:?} -> {state:?}", self.state);
        self.state = state.clone();
        events.emit(PeripheralEvent::RegistrationChanged { state });
    }
}
