use uuid::Uuid;

use crate::api::peripheral_event::PeripheralEvent;
use crate::api::radio::{NotifyOutcome, Radio, ReadRequestResponse, RequestResponse};
use crate::peripheral::event_bridge::EventBridge;
use crate::peripheral::subscriptions::SubscriptionTracker;
use crate::{Error, Result};

const QUEUE_FULL: &str = "notification queue full";

/// Pushes characteristic values to subscribers.
///
/// When the radio's outbound queue is full the newest value is parked and
/// sent once the radio reports it is ready again. Later pushes overwrite
/// the parked value.
#[derive(Debug, Default)]
pub struct ValueUpdateDispatcher {
    pending: Option<Vec<u8>>,
    value: Vec<u8>,
}

impl ValueUpdateDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> Option<&[u8]> {
        self.pending.as_deref()
    }

    /// `characteristic` is the registered characteristic, `None` when no
    /// service is registered.
    pub fn push<R: Radio + ?Sized>(
        &mut self,
        value: Vec<u8>,
        characteristic: Option<Uuid>,
        subscribers: &SubscriptionTracker,
        radio: &mut R,
        events: &mut EventBridge,
    ) -> Result<()> {
        let Some(characteristic) = characteristic else {
            log::warn!("Push rejected, no registered service");
            events.emit(PeripheralEvent::PushFailed {
                retry_scheduled: false,
                reason: Some(Error::NotAdvertising.to_string()),
            });
            return Err(Error::NotAdvertising);
        };

        self.value = value.clone();

        if !subscribers.has_subscribers() {
            events.emit(PeripheralEvent::PushDelivered { subscribers: 0 });
            return Ok(());
        }

        if self.pending.is_some() {
            log::debug!("Still backpressured, replacing pending value");
            self.pending = Some(value);
            events.emit(PeripheralEvent::PushFailed {
                retry_scheduled: true,
                reason: Some(QUEUE_FULL.to_string()),
            });
            return Ok(());
        }

        self.deliver(value, characteristic, subscribers, radio, events)
    }

    /// The radio drained its queue; retry the pending value once.
    pub fn on_ready<R: Radio + ?Sized>(
        &mut self,
        characteristic: Option<Uuid>,
        subscribers: &SubscriptionTracker,
        radio: &mut R,
        events: &mut EventBridge,
    ) {
        let Some(value) = self.pending.take() else {
            return;
        };
        let Some(characteristic) = characteristic else {
            log::debug!("Service gone, dropping pending value");
            return;
        };
        if !subscribers.has_subscribers() {
            log::debug!("No subscribers left, dropping pending value");
            return;
        }
        if let Err(e) = self.deliver(value, characteristic, subscribers, radio, events) {
            log::error!("Retry of pending value failed: {e}");
        }
    }

    pub fn read(&self, offset: usize) -> ReadRequestResponse {
        match self.value.get(offset..) {
            Some(rest) => ReadRequestResponse {
                value: rest.to_vec(),
                response: RequestResponse::Success,
            },
            None => ReadRequestResponse::error(RequestResponse::InvalidOffset),
        }
    }

    /// Forget the pending value.
    pub fn reset(&mut self) {
        self.pending = None;
    }

    /// Forget both the pending and the last pushed value.
    pub fn clear(&mut self) {
        self.pending = None;
        self.value.clear();
    }

    fn deliver<R: Radio + ?Sized>(
        &mut self,
        value: Vec<u8>,
        characteristic: Uuid,
        subscribers: &SubscriptionTracker,
        radio: &mut R,
        events: &mut EventBridge,
    ) -> Result<()> {
        match radio.notify(characteristic, &value, &subscribers.centrals()) {
            NotifyOutcome::Sent => {
                events.emit(PeripheralEvent::PushDelivered {
                    subscribers: subscribers.len(),
                });
                Ok(())
            }
            NotifyOutcome::QueueFull => {
                log::debug!("Notification queue full, retrying when ready");
                self.pending = Some(value);
                events.emit(PeripheralEvent::PushFailed {
                    retry_scheduled: true,
                    reason: Some(QUEUE_FULL.to_string()),
                });
                Ok(())
            }
            NotifyOutcome::Failed(reason) => {
                log::error!("Notification failed: {reason}");
                events.emit(PeripheralEvent::PushFailed {
                    retry_scheduled: false,
                    reason: Some(reason.clone()),
                });
                Err(Error::RadioRejected(reason))
            }
        }
    }
}
