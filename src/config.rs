use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Runtime settings for a [`Peripheral`](crate::peripheral::Peripheral).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeripheralConfig {
    /// Capacity of the command channel feeding the peripheral task.
    pub command_capacity: usize,

    /// Capacity of the channel the radio backend delivers callbacks on.
    pub radio_event_capacity: usize,

    /// Local name advertised when `start_advertising` is given an empty name.
    pub default_device_name: String,

    /// Filter passed to the logger, e.g. `"info"` or `"blecast=debug"`.
    pub log_level: String,
}

impl Default for PeripheralConfig {
    fn default() -> Self {
        Self {
            command_capacity: 64,
            radio_event_capacity: 256,
            default_device_name: "blecast".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl PeripheralConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: PeripheralConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file, falling back to defaults if it does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        if self.command_capacity == 0 {
            return Err(Error::Config("command_capacity must be non-zero".to_string()));
        }
        if self.radio_event_capacity == 0 {
            return Err(Error::Config(
                "radio_event_capacity must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}
