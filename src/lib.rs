//! Single-service BLE peripheral.
//!
//! Advertises one GATT service with one readable, notifiable characteristic
//! and streams value updates to subscribed centrals. See
//! [`PeripheralManager`](api::peripheral::PeripheralManager) for the command
//! interface and [`PeripheralEvent`](api::peripheral_event::PeripheralEvent)
//! for what comes back.

pub mod api;
pub mod config;
#[cfg(any(target_os = "macos", target_os = "ios"))]
pub mod corebluetooth;
mod error;
pub mod logging;
pub mod peripheral;
pub mod radio;
pub mod uuid;

pub use error::{Error, ErrorKind, Result};
