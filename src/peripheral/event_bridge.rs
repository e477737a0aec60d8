use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::api::peripheral_event::PeripheralEvent;

/// Single-listener outbound event channel.
///
/// Events emitted while nobody is attached are discarded. Attaching a new
/// listener ends the previous [`EventStream`].
#[derive(Debug, Default)]
pub struct EventBridge {
    listener: Option<UnboundedSender<PeripheralEvent>>,
}

impl EventBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&mut self) -> EventStream {
        let (tx, rx) = mpsc::unbounded_channel();
        if self.listener.replace(tx).is_some() {
            log::debug!("Replacing event listener");
        }
        EventStream { rx }
    }

    pub fn detach(&mut self) {
        self.listener = None;
    }

    pub fn has_listener(&self) -> bool {
        self.listener.as_ref().is_some_and(|tx| !tx.is_closed())
    }

    pub fn emit(&mut self, event: PeripheralEvent) {
        log::debug!("Event: {event:?}");
        let Some(listener) = &self.listener else {
            log::trace!("No listener attached, dropping event");
            return;
        };
        if listener.send(event).is_err() {
            log::debug!("Listener dropped its stream, detaching");
            self.listener = None;
        }
    }
}

/// Receiving end handed to the listener.
///
/// The channel is unbounded so emitting never stalls the state machine.
/// A listener that stays attached must keep reading, or detach; unread
/// events are held until the stream is dropped.
#[derive(Debug)]
pub struct EventStream {
    rx: UnboundedReceiver<PeripheralEvent>,
}

impl EventStream {
    /// Next event, or `None` once the listener was replaced or the
    /// peripheral shut down.
    pub async fn recv(&mut self) -> Option<PeripheralEvent> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<PeripheralEvent> {
        self.rx.try_recv().ok()
    }

    /// Every event currently buffered.
    pub fn drain(&mut self) -> Vec<PeripheralEvent> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}

impl Stream for EventStream {
    type Item = PeripheralEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}
