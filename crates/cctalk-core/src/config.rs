//! Bus configuration.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::protocol::constants::{
    COIN_ACCEPTOR_ADDRESS, DEFAULT_BAUD_RATE, DEFAULT_TIMEOUT_MS, HOST_ADDRESS,
};

/// Configuration for one ccTalk bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Serial port path.
    pub port: String,
    /// Baud rate.
    pub baud_rate: u32,
    /// Our own address on the bus.
    pub host_address: u8,
    /// Read timeout in milliseconds.
    pub timeout_ms: u64,
    /// Whether transmitted bytes are echoed back (single-wire interfaces).
    pub local_echo: bool,
    /// Devices expected on the bus.
    pub devices: Vec<DeviceConfig>,
}

/// Per-device settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub address: u8,
    /// Coin mask applied after scan. Leave unset to keep every coin enabled.
    #[serde(default)]
    pub coin_mask: Option<u16>,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyUSB0".to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            host_address: HOST_ADDRESS,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            local_echo: true,
            devices: vec![DeviceConfig {
                address: COIN_ACCEPTOR_ADDRESS,
                coin_mask: None,
            }],
        }
    }
}

impl BusConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}
