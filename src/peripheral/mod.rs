pub mod advertiser;
pub mod connections;
pub mod dispatcher;
pub mod event_bridge;
pub mod lifecycle;
mod manager;
pub mod power;
pub mod registry;
pub mod subscriptions;

pub use event_bridge::EventStream;
pub use lifecycle::PeripheralCore;
pub use manager::Peripheral;
