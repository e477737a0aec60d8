use uuid::Uuid;

use crate::Result;
use crate::api::radio::{Advertisement, CentralId, NotifyOutcome, Radio, RadioEventSender};
use crate::api::service::ServiceDescriptor;
use crate::config::PeripheralConfig;
use crate::corebluetooth::objc_bindings::peripheral_manager_cb::{
    CbPeripheralManager, is_authorized,
};
use crate::peripheral::Peripheral;

/// [`Radio`] backed by `CBPeripheralManager`.
///
/// The manager is created lazily by [`Radio::initialize`]; until then every
/// call is dropped with a warning.
#[derive(Debug)]
pub struct CoreBluetoothRadio {
    sender: RadioEventSender,
    manager: Option<CbPeripheralManager>,
}

impl CoreBluetoothRadio {
    pub fn new(sender: RadioEventSender) -> Self {
        Self { sender, manager: None }
    }

    fn manager(&mut self) -> Option<&mut CbPeripheralManager> {
        if self.manager.is_none() {
            log::warn!("CoreBluetooth manager not initialized");
        }
        self.manager.as_mut()
    }
}

impl Radio for CoreBluetoothRadio {
    fn initialize(&mut self) -> Result<()> {
        if self.manager.is_some() {
            return Ok(());
        }
        if !is_authorized() {
            log::warn!("Bluetooth access is restricted or denied");
        }
        self.manager = Some(CbPeripheralManager::new(self.sender.clone())?);
        Ok(())
    }

    fn add_service(&mut self, service: &ServiceDescriptor) {
        if let Some(manager) = self.manager() {
            manager.add_service(service);
        }
    }

    fn remove_service(&mut self, service: &ServiceDescriptor) {
        if let Some(manager) = self.manager() {
            manager.remove_service(service);
        }
    }

    fn start_advertising(&mut self, advertisement: &Advertisement) {
        if let Some(manager) = self.manager() {
            manager.start_advertising(advertisement);
        }
    }

    fn stop_advertising(&mut self) {
        if let Some(manager) = self.manager() {
            manager.stop_advertising();
        }
    }

    // CoreBluetooth always notifies every subscribed central.
    fn notify(
        &mut self,
        characteristic: Uuid,
        value: &[u8],
        _centrals: &[CentralId],
    ) -> NotifyOutcome {
        let Some(manager) = self.manager() else {
            return NotifyOutcome::Failed("bluetooth manager not initialized".to_string());
        };
        match manager.update_value(characteristic, value) {
            Some(true) => NotifyOutcome::Sent,
            Some(false) => NotifyOutcome::QueueFull,
            None => NotifyOutcome::Failed(format!("characteristic {characteristic} not published")),
        }
    }
}

impl Peripheral {
    /// Start a peripheral on the system Bluetooth stack. CoreBluetooth
    /// objects live on a dedicated thread owned by the returned handle.
    pub fn core_bluetooth(config: &PeripheralConfig) -> Result<Self> {
        Peripheral::spawn_on_thread(config, CoreBluetoothRadio::new)
    }
}
