//! In-process radio.
//!
//! [`MemoryRadio::new`] only records what it is asked to do, so tests can
//! inject every callback themselves. [`MemoryRadio::simulated`] additionally
//! answers like a healthy adapter: it reports `PoweredOn` on initialize and
//! confirms service registration and advertising straight away.

use std::sync::{Arc, Mutex, MutexGuard};

use uuid::Uuid;

use crate::Result;
use crate::api::peripheral_event::RadioState;
use crate::api::radio::{
    Advertisement, CentralId, NotifyOutcome, Radio, RadioEvent, RadioEventSender,
};
use crate::api::service::ServiceDescriptor;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RadioCall {
    Initialize,
    AddService(Uuid),
    RemoveService(Uuid),
    StartAdvertising(Advertisement),
    StopAdvertising,
    Notify {
        characteristic: Uuid,
        value: Vec<u8>,
        centrals: Vec<CentralId>,
    },
}

#[derive(Debug, Default)]
struct Shared {
    calls: Vec<RadioCall>,
    delivered: Vec<Vec<u8>>,
    queue_full: bool,
    notify_failure: Option<String>,
}

#[derive(Debug)]
pub struct MemoryRadio {
    shared: Arc<Mutex<Shared>>,
    responder: Option<RadioEventSender>,
}

/// Inspection and control side of a [`MemoryRadio`].
#[derive(Debug, Clone)]
pub struct MemoryRadioHandle {
    shared: Arc<Mutex<Shared>>,
    responder: Option<RadioEventSender>,
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MemoryRadio {
    pub fn new() -> Self {
        Self {
            shared: Arc::default(),
            responder: None,
        }
    }

    pub fn simulated(events: RadioEventSender) -> Self {
        Self {
            shared: Arc::default(),
            responder: Some(events),
        }
    }

    pub fn handle(&self) -> MemoryRadioHandle {
        MemoryRadioHandle {
            shared: self.shared.clone(),
            responder: self.responder.clone(),
        }
    }

    fn record(&self, call: RadioCall) {
        log::trace!("MemoryRadio: {call:?}");
        lock(&self.shared).calls.push(call);
    }

    fn respond(&self, event: RadioEvent) {
        if let Some(responder) = &self.responder {
            if let Err(e) = responder.try_send(event) {
                log::warn!("MemoryRadio could not deliver callback: {e}");
            }
        }
    }
}

impl Default for MemoryRadio {
    fn default() -> Self {
        Self::new()
    }
}

impl Radio for MemoryRadio {
    fn initialize(&mut self) -> Result<()> {
        self.record(RadioCall::Initialize);
        self.respond(RadioEvent::StateUpdate {
            state: RadioState::PoweredOn,
        });
        Ok(())
    }

    fn add_service(&mut self, service: &ServiceDescriptor) {
        self.record(RadioCall::AddService(service.uuid()));
        self.respond(RadioEvent::DidAddService {
            service: service.uuid(),
            error: None,
        });
    }

    fn remove_service(&mut self, service: &ServiceDescriptor) {
        self.record(RadioCall::RemoveService(service.uuid()));
    }

    fn start_advertising(&mut self, advertisement: &Advertisement) {
        self.record(RadioCall::StartAdvertising(advertisement.clone()));
        self.respond(RadioEvent::DidStartAdvertising { error: None });
    }

    fn stop_advertising(&mut self) {
        self.record(RadioCall::StopAdvertising);
    }

    fn notify(
        &mut self,
        characteristic: Uuid,
        value: &[u8],
        centrals: &[CentralId],
    ) -> NotifyOutcome {
        self.record(RadioCall::Notify {
            characteristic,
            value: value.to_vec(),
            centrals: centrals.to_vec(),
        });
        let mut shared = lock(&self.shared);
        if let Some(reason) = &shared.notify_failure {
            return NotifyOutcome::Failed(reason.clone());
        }
        if shared.queue_full {
            return NotifyOutcome::QueueFull;
        }
        shared.delivered.push(value.to_vec());
        NotifyOutcome::Sent
    }
}

impl MemoryRadioHandle {
    pub fn calls(&self) -> Vec<RadioCall> {
        lock(&self.shared).calls.clone()
    }

    /// Payloads the radio accepted, in order.
    pub fn delivered(&self) -> Vec<Vec<u8>> {
        lock(&self.shared).delivered.clone()
    }

    pub fn set_queue_full(&self, full: bool) {
        lock(&self.shared).queue_full = full;
    }

    /// Drain the outbound queue. A simulated radio also signals
    /// [`RadioEvent::ReadyToUpdateSubscribers`].
    pub fn drain_queue(&self) {
        self.set_queue_full(false);
        if let Some(responder) = &self.responder {
            if let Err(e) = responder.try_send(RadioEvent::ReadyToUpdateSubscribers) {
                log::warn!("MemoryRadio could not deliver callback: {e}");
            }
        }
    }

    pub fn set_notify_failure(&self, reason: Option<&str>) {
        lock(&self.shared).notify_failure = reason.map(str::to_string);
    }
}
