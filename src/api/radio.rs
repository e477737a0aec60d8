//! The seam between the lifecycle state machine and a platform Bluetooth stack.
//!
//! A [`Radio`] only submits requests; it never blocks waiting for the stack.
//! Completions come back later as [`RadioEvent`]s on the channel the backend
//! was built with, and the peripheral task applies them in arrival order.

use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use crate::Result;
use crate::api::peripheral_event::RadioState;
use crate::api::service::ServiceDescriptor;

/// Opaque identifier of a remote central.
pub type CentralId = String;

pub type RadioEventSender = mpsc::Sender<RadioEvent>;
pub type RadioEventReceiver = mpsc::Receiver<RadioEvent>;

pub fn channel(capacity: usize) -> (RadioEventSender, RadioEventReceiver) {
    mpsc::channel(capacity)
}

/// Advertisement payload: service UUIDs and local name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advertisement {
    pub local_name: String,
    pub service_uuids: Vec<Uuid>,
}

/// Synchronous result of handing a notification to the stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyOutcome {
    Sent,
    /// Outbound queue is full; the stack will send
    /// [`RadioEvent::ReadyToUpdateSubscribers`] once it drains.
    QueueFull,
    Failed(String),
}

pub trait Radio {
    /// Bring up the platform manager. Power state arrives later as
    /// [`RadioEvent::StateUpdate`].
    fn initialize(&mut self) -> Result<()>;

    fn add_service(&mut self, service: &ServiceDescriptor);

    fn remove_service(&mut self, service: &ServiceDescriptor);

    fn start_advertising(&mut self, advertisement: &Advertisement);

    fn stop_advertising(&mut self);

    fn notify(
        &mut self,
        characteristic: Uuid,
        value: &[u8],
        centrals: &[CentralId],
    ) -> NotifyOutcome;
}

impl<R: Radio + ?Sized> Radio for Box<R> {
    fn initialize(&mut self) -> Result<()> {
        (**self).initialize()
    }

    fn add_service(&mut self, service: &ServiceDescriptor) {
        (**self).add_service(service)
    }

    fn remove_service(&mut self, service: &ServiceDescriptor) {
        (**self).remove_service(service)
    }

    fn start_advertising(&mut self, advertisement: &Advertisement) {
        (**self).start_advertising(advertisement)
    }

    fn stop_advertising(&mut self) {
        (**self).stop_advertising()
    }

    fn notify(
        &mut self,
        characteristic: Uuid,
        value: &[u8],
        centrals: &[CentralId],
    ) -> NotifyOutcome {
        (**self).notify(characteristic, value, centrals)
    }
}

/// Callbacks from the platform stack.
#[derive(Debug)]
pub enum RadioEvent {
    StateUpdate {
        state: RadioState,
    },
    DidAddService {
        service: Uuid,
        error: Option<String>,
    },
    DidStartAdvertising {
        error: Option<String>,
    },
    DidSubscribe {
        central: CentralId,
        characteristic: Uuid,
    },
    DidUnsubscribe {
        central: CentralId,
        characteristic: Uuid,
    },
    CentralConnected {
        central: CentralId,
    },
    CentralDisconnected {
        central: CentralId,
    },
    ReadyToUpdateSubscribers,
    ReadRequest {
        central: CentralId,
        characteristic: Uuid,
        offset: usize,
        responder: oneshot::Sender<ReadRequestResponse>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadRequestResponse {
    pub value: Vec<u8>,
    pub response: RequestResponse,
}

impl ReadRequestResponse {
    pub fn error(response: RequestResponse) -> Self {
        Self {
            value: Vec::new(),
            response,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestResponse {
    Success,
    InvalidHandle,
    RequestNotSupported,
    InvalidOffset,
    UnlikelyError,
}
