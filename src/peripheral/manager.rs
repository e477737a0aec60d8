use std::thread;

use async_trait::async_trait;
use tokio::runtime;
use tokio::sync::{mpsc, oneshot};

use crate::api::peripheral::{PeripheralManager, PeripheralStatus};
use crate::api::radio::{self, Radio, RadioEventReceiver, RadioEventSender};
use crate::config::PeripheralConfig;
use crate::peripheral::lifecycle::PeripheralCore;
use crate::peripheral::event_bridge::EventStream;
use crate::{Error, Result};

type Responder<T> = oneshot::Sender<Result<T>>;

#[derive(Debug)]
pub(crate) enum PeripheralCommand {
    Initialize {
        responder: Responder<()>,
    },
    DefineService {
        service_id: String,
        characteristic_id: String,
        responder: Responder<()>,
    },
    RemoveService {
        responder: Responder<()>,
    },
    StartAdvertising {
        device_name: String,
        responder: Responder<()>,
    },
    StopAdvertising {
        responder: Responder<()>,
    },
    PushValue {
        value: Vec<u8>,
        responder: Responder<()>,
    },
    AttachListener {
        responder: Responder<EventStream>,
    },
    DetachListener {
        responder: Responder<()>,
    },
    Status {
        responder: Responder<PeripheralStatus>,
    },
}

/// Handle to a peripheral running on its own task.
///
/// Commands and radio callbacks are applied by that task one at a time, so
/// no state is shared between callers. Clones talk to the same peripheral;
/// the task exits when the last handle is dropped.
#[derive(Debug, Clone)]
pub struct Peripheral {
    manager_tx: mpsc::Sender<PeripheralCommand>,
}

impl Peripheral {
    /// Run `radio` on the current tokio runtime. `radio_events` must be the
    /// receiving end of the channel the radio reports on.
    pub fn spawn<R>(
        radio: R,
        radio_events: RadioEventReceiver,
        config: &PeripheralConfig,
    ) -> Result<Self>
    where
        R: Radio + Send + 'static,
    {
        config.validate()?;
        let (manager_tx, manager_rx) = mpsc::channel(config.command_capacity);
        let core = PeripheralCore::new(radio).with_default_device_name(&config.default_device_name);
        tokio::spawn(PeripheralTask::new(core, manager_rx, radio_events).run());
        Ok(Self { manager_tx })
    }

    /// Run the peripheral on a dedicated thread with its own runtime.
    ///
    /// The radio is built on that thread, so it does not need to be `Send`.
    pub fn spawn_on_thread<R, F>(config: &PeripheralConfig, make_radio: F) -> Result<Self>
    where
        R: Radio + 'static,
        F: FnOnce(RadioEventSender) -> R + Send + 'static,
    {
        config.validate()?;
        let (manager_tx, manager_rx) = mpsc::channel(config.command_capacity);
        let (radio_tx, radio_rx) = radio::channel(config.radio_event_capacity);
        let default_name = config.default_device_name.clone();

        thread::Builder::new()
            .name("blecast-peripheral".to_string())
            .spawn(move || {
                let runtime = match runtime::Builder::new_current_thread().enable_time().build() {
                    Ok(runtime) => runtime,
                    Err(e) => {
                        log::error!("Failed to create runtime: {e}");
                        return;
                    }
                };
                runtime.block_on(async move {
                    let core = PeripheralCore::new(make_radio(radio_tx))
                        .with_default_device_name(default_name);
                    PeripheralTask::new(core, manager_rx, radio_rx).run().await;
                })
            })
            .map_err(|e| Error::Backend(format!("failed to spawn peripheral thread: {e}")))?;

        Ok(Self { manager_tx })
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(Responder<T>) -> PeripheralCommand,
    ) -> Result<T> {
        let (responder, response) = oneshot::channel();
        self.manager_tx.send(command(responder)).await?;
        response.await?
    }
}

#[async_trait]
impl PeripheralManager for Peripheral {
    async fn initialize(&self) -> Result<()> {
        self.request(|responder| PeripheralCommand::Initialize { responder }).await
    }

    async fn define_service(&self, service_id: &str, characteristic_id: &str) -> Result<()> {
        let service_id = service_id.to_string();
        let characteristic_id = characteristic_id.to_string();
        self.request(|responder| PeripheralCommand::DefineService {
            service_id,
            characteristic_id,
            responder,
        })
        .await
    }

    async fn remove_service(&self) -> Result<()> {
        self.request(|responder| PeripheralCommand::RemoveService { responder }).await
    }

    async fn start_advertising(&self, device_name: &str) -> Result<()> {
        let device_name = device_name.to_string();
        self.request(|responder| PeripheralCommand::StartAdvertising {
            device_name,
            responder,
        })
        .await
    }

    async fn stop_advertising(&self) -> Result<()> {
        self.request(|responder| PeripheralCommand::StopAdvertising { responder }).await
    }

    async fn push_value(&self, value: Vec<u8>) -> Result<()> {
        self.request(|responder| PeripheralCommand::PushValue { value, responder }).await
    }

    async fn attach_listener(&self) -> Result<EventStream> {
        self.request(|responder| PeripheralCommand::AttachListener { responder }).await
    }

    async fn detach_listener(&self) -> Result<()> {
        self.request(|responder| PeripheralCommand::DetachListener { responder }).await
    }

    async fn status(&self) -> Result<PeripheralStatus> {
        self.request(|responder| PeripheralCommand::Status { responder }).await
    }
}

struct PeripheralTask<R> {
    core: PeripheralCore<R>,
    manager_command_rx: mpsc::Receiver<PeripheralCommand>,
    radio_event_rx: RadioEventReceiver,
}

impl<R: Radio> PeripheralTask<R> {
    fn new(
        core: PeripheralCore<R>,
        manager_command_rx: mpsc::Receiver<PeripheralCommand>,
        radio_event_rx: RadioEventReceiver,
    ) -> Self {
        Self {
            core,
            manager_command_rx,
            radio_event_rx,
        }
    }

    async fn run(mut self) {
        let mut radio_open = true;
        loop {
            // Radio callbacks first, so a callback queued before a command is
            // applied before it.
            tokio::select! {
                biased;
                event = self.radio_event_rx.recv(), if radio_open => match event {
                    Some(event) => self.core.handle_radio_event(event),
                    None => {
                        log::warn!("Radio event channel closed");
                        radio_open = false;
                    }
                },
                command = self.manager_command_rx.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
            }
        }
        log::debug!("All peripheral handles dropped, stopping");
    }

    fn handle_command(&mut self, command: PeripheralCommand) {
        match command {
            PeripheralCommand::Initialize { responder } => {
                let _ = responder.send(self.core.initialize());
            }
            PeripheralCommand::DefineService {
                service_id,
                characteristic_id,
                responder,
            } => {
                let _ = responder.send(self.core.define_service(&service_id, &characteristic_id));
            }
            PeripheralCommand::RemoveService { responder } => {
                let _ = responder.send(self.core.remove_service());
            }
            PeripheralCommand::StartAdvertising {
                device_name,
                responder,
            } => {
                let _ = responder.send(self.core.start_advertising(&device_name));
            }
            PeripheralCommand::StopAdvertising { responder } => {
                let _ = responder.send(self.core.stop_advertising());
            }
            PeripheralCommand::PushValue { value, responder } => {
                let _ = responder.send(self.core.push_value(value));
            }
            PeripheralCommand::AttachListener { responder } => {
                let _ = responder.send(Ok(self.core.attach_listener()));
            }
            PeripheralCommand::DetachListener { responder } => {
                self.core.detach_listener();
                let _ = responder.send(Ok(()));
            }
            PeripheralCommand::Status { responder } => {
                let _ = responder.send(Ok(self.core.status()));
            }
        }
    }
}
