pub mod characteristic;
pub mod descriptor;
pub mod peripheral;
pub mod peripheral_event;
pub mod radio;
pub mod service;
