use async_trait::async_trait;

use crate::Result;
use crate::api::peripheral_event::{AdvertisingState, RadioState, RegistrationState};
use crate::peripheral::event_bridge::EventStream;

/// Command interface of a single-service BLE peripheral.
///
/// Every call returns once the command has been validated and submitted;
/// radio confirmations arrive later on the attached [`EventStream`].
#[async_trait]
pub trait PeripheralManager: Send + Sync {
    /// Bring up the radio. No-op if already initialized.
    async fn initialize(&self) -> Result<()>;

    /// Build and register the service, replacing any prior one.
    async fn define_service(&self, service_id: &str, characteristic_id: &str) -> Result<()>;

    async fn remove_service(&self) -> Result<()>;

    /// No-op if already advertising.
    async fn start_advertising(&self, device_name: &str) -> Result<()>;

    /// No-op if already idle.
    async fn stop_advertising(&self) -> Result<()>;

    async fn push_value(&self, value: Vec<u8>) -> Result<()>;

    /// Replace the current listener. Only events produced after this call
    /// are delivered.
    async fn attach_listener(&self) -> Result<EventStream>;

    async fn detach_listener(&self) -> Result<()>;

    async fn status(&self) -> Result<PeripheralStatus>;

    async fn is_powered(&self) -> Result<bool> {
        Ok(self.status().await?.radio.is_powered_on())
    }

    async fn is_advertising(&self) -> Result<bool> {
        Ok(self.status().await?.advertising == AdvertisingState::Advertising)
    }
}

/// Point-in-time snapshot of every component's state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeripheralStatus {
    pub initialized: bool,
    pub radio: RadioState,
    pub registration: RegistrationState,
    pub advertising: AdvertisingState,
    pub subscribers: usize,
    pub connected: usize,
    pub pending_value: bool,
}
