//! The peripheral lifecycle state machine.
//!
//! [`PeripheralCore`] is synchronous and owns every component. It must be
//! driven from one execution context: commands and radio callbacks are
//! applied one at a time, in the order they arrive. [`Peripheral`] provides
//! that context as a tokio task.
//!
//! [`Peripheral`]: crate::peripheral::Peripheral

use crate::api::peripheral::PeripheralStatus;
use crate::api::peripheral_event::{CommandKind, PeripheralEvent, RadioState, RegistrationState};
use crate::api::radio::{Radio, RadioEvent, ReadRequestResponse, RequestResponse};
use crate::api::service::build_service;
use crate::peripheral::advertiser::Advertiser;
use crate::peripheral::connections::ConnectionTracker;
use crate::peripheral::dispatcher::ValueUpdateDispatcher;
use crate::peripheral::event_bridge::{EventBridge, EventStream};
use crate::peripheral::power::PowerMonitor;
use crate::peripheral::registry::{REGISTRATION_IN_PROGRESS, ServiceRegistry};
use crate::peripheral::subscriptions::SubscriptionTracker;
use crate::{Error, Result};

pub struct PeripheralCore<R> {
    radio: R,
    initialized: bool,
    default_device_name: String,
    power: PowerMonitor,
    registry: ServiceRegistry,
    advertiser: Advertiser,
    subscriptions: SubscriptionTracker,
    connections: ConnectionTracker,
    dispatcher: ValueUpdateDispatcher,
    events: EventBridge,
}

impl<R: Radio> PeripheralCore<R> {
    pub fn new(radio: R) -> Self {
        Self {
            radio,
            initialized: false,
            default_device_name: String::new(),
            power: PowerMonitor::new(),
            registry: ServiceRegistry::new(),
            advertiser: Advertiser::new(),
            subscriptions: SubscriptionTracker::new(),
            connections: ConnectionTracker::new(),
            dispatcher: ValueUpdateDispatcher::new(),
            events: EventBridge::new(),
        }
    }

    /// Name advertised when `start_advertising` is given an empty one.
    pub fn with_default_device_name(mut self, name: impl Into<String>) -> Self {
        self.default_device_name = name.into();
        self
    }

    pub fn radio(&self) -> &R {
        &self.radio
    }

    pub fn attach_listener(&mut self) -> EventStream {
        self.events.attach()
    }

    pub fn detach_listener(&mut self) {
        self.events.detach();
    }

    pub fn status(&self) -> PeripheralStatus {
        PeripheralStatus {
            initialized: self.initialized,
            radio: self.power.state(),
            registration: self.registry.state().clone(),
            advertising: self.advertiser.state().clone(),
            subscribers: self.subscriptions.len(),
            connected: self.connections.len(),
            pending_value: self.dispatcher.pending().is_some(),
        }
    }

    pub fn initialize(&mut self) -> Result<()> {
        if self.initialized {
            log::debug!("Already initialized");
            return Ok(());
        }
        if let Err(e) = self.radio.initialize() {
            return self.reject(CommandKind::Initialize, e);
        }
        self.initialized = true;
        log::info!("Peripheral initialized");
        Ok(())
    }

    /// Build a descriptor and register it, replacing the current service.
    pub fn define_service(&mut self, service_id: &str, characteristic_id: &str) -> Result<()> {
        let descriptor = match build_service(service_id, characteristic_id) {
            Ok(descriptor) => descriptor,
            Err(e) => return self.reject(CommandKind::DefineService, e),
        };
        if self.registry.is_registering() {
            let error = Error::PreconditionNotMet(REGISTRATION_IN_PROGRESS.to_string());
            return self.reject(CommandKind::DefineService, error);
        }
        if !self.power.is_powered_on() {
            return self.reject(CommandKind::DefineService, Error::NotPoweredOn);
        }

        self.end_session();
        self.registry.register(
            descriptor,
            self.power.state(),
            &mut self.radio,
            &mut self.events,
        )
    }

    pub fn remove_service(&mut self) -> Result<()> {
        if self.registry.descriptor().is_none() {
            return Ok(());
        }
        self.end_session();
        self.registry.unregister(&mut self.radio, &mut self.events);
        Ok(())
    }

    pub fn start_advertising(&mut self, device_name: &str) -> Result<()> {
        let name = if device_name.is_empty() {
            self.default_device_name.as_str()
        } else {
            device_name
        };
        self.advertiser.start(
            name,
            self.power.state(),
            &self.registry,
            &mut self.radio,
            &mut self.events,
        )
    }

    pub fn stop_advertising(&mut self) -> Result<()> {
        self.advertiser.stop(&mut self.radio, &mut self.events);
        Ok(())
    }

    pub fn push_value(&mut self, value: Vec<u8>) -> Result<()> {
        self.dispatcher.push(
            value,
            self.registry.registered_characteristic(),
            &self.subscriptions,
            &mut self.radio,
            &mut self.events,
        )
    }

    pub fn handle_radio_event(&mut self, event: RadioEvent) {
        match event {
            RadioEvent::StateUpdate { state } => self.on_power_changed(state),
            RadioEvent::DidAddService { service, error } => {
                self.registry.on_service_added(service, error, &mut self.events)
            }
            RadioEvent::DidStartAdvertising { error } => {
                self.advertiser.on_started(error, &mut self.events)
            }
            RadioEvent::DidSubscribe {
                central,
                characteristic,
            } => {
                self.connections.connect(central.clone(), &mut self.events);
                if self.is_our_characteristic(characteristic) {
                    self.subscriptions.subscribe(central, &mut self.events);
                } else {
                    log::debug!("Ignoring subscription to foreign characteristic {characteristic}");
                }
            }
            RadioEvent::DidUnsubscribe {
                central,
                characteristic,
            } => {
                if self.is_our_characteristic(characteristic) {
                    self.subscriptions.unsubscribe(&central, &mut self.events);
                }
            }
            RadioEvent::CentralConnected { central } => {
                self.connections.connect(central, &mut self.events)
            }
            RadioEvent::CentralDisconnected { central } => {
                self.subscriptions.unsubscribe(&central, &mut self.events);
                self.connections.disconnect(&central, &mut self.events);
            }
            RadioEvent::ReadyToUpdateSubscribers => self.dispatcher.on_ready(
                self.registry.registered_characteristic(),
                &self.subscriptions,
                &mut self.radio,
                &mut self.events,
            ),
            RadioEvent::ReadRequest {
                central,
                characteristic,
                offset,
                responder,
            } => {
                let ours = self.registry.registered_characteristic() == Some(characteristic);
                let response = if ours {
                    self.dispatcher.read(offset)
                } else {
                    ReadRequestResponse::error(RequestResponse::InvalidHandle)
                };
                log::trace!("Read request from {central} at {offset}: {:?}", response.response);
                if responder.send(response).is_err() {
                    log::debug!("Read request from {central} was abandoned");
                }
            }
        }
    }

    fn on_power_changed(&mut self, state: RadioState) {
        let Some(previous) = self.power.update(state, &mut self.events) else {
            return;
        };

        if previous.is_powered_on() {
            log::warn!("Radio left PoweredOn ({state:?}), resetting session");
            self.advertiser.reset(&mut self.events);
            self.subscriptions.clear(&mut self.events);
            self.connections.clear(&mut self.events);
            self.dispatcher.reset();
            self.registry.reset(&mut self.events);
        }

        if !state.is_powered_on() || *self.registry.state() != RegistrationState::Unregistered {
            return;
        }
        if let Some(descriptor) = self.registry.descriptor().cloned() {
            log::info!("Radio powered on, restoring service {}", descriptor.uuid());
            if let Err(e) = self
                .registry
                .register(descriptor, state, &mut self.radio, &mut self.events)
            {
                log::error!("Could not restore service: {e}");
            }
        }
    }

    /// Tear down everything tied to the current service before it changes.
    fn end_session(&mut self) {
        if !self.advertiser.is_idle() {
            self.advertiser.stop(&mut self.radio, &mut self.events);
        }
        self.subscriptions.clear(&mut self.events);
        self.dispatcher.clear();
    }

    fn is_our_characteristic(&self, characteristic: uuid::Uuid) -> bool {
        self.registry
            .descriptor()
            .is_some_and(|descriptor| descriptor.characteristic_uuid() == characteristic)
    }

    fn reject(&mut self, command: CommandKind, error: Error) -> Result<()> {
        log::warn!("{command:?} rejected: {error}");
        self.events.emit(PeripheralEvent::CommandRejected {
            command,
            error: error.clone(),
        });
        Err(error)
    }
}
