//! CoreBluetooth radio for macOS and iOS.

mod objc_bindings;
pub mod peripheral_manager;

pub use peripheral_manager::CoreBluetoothRadio;
