//! Link Configuration
//!
//! Loaded from an optional file layered under `CHARGER_*` environment
//! variables.

use charger_codec::{Protocol, ADDRESS_MASK};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::error::LinkError;

/// Prefix of environment overrides, e.g. `CHARGER_ADDRESS=3`
pub const ENV_PREFIX: &str = "CHARGER";

/// Connection settings for one module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Vendor protocol spoken by the module
    pub protocol: Protocol,
    /// Module address (0-127)
    pub address: u8,
    /// CAN interface name (e.g., "can0", "vcan0")
    pub interface: String,
    /// How long to wait for a response
    pub response_timeout_ms: u64,
    /// Use the in-memory simulator instead of a real bus
    pub simulate: bool,
    /// Log level for the probe
    pub log_level: String,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            protocol: Protocol::UUgreen,
            address: 1,
            interface: "can0".to_string(),
            response_timeout_ms: 1000,
            simulate: true,
            log_level: "info".to_string(),
        }
    }
}

impl LinkConfig {
    /// Load from `path` (if given) and the environment
    pub fn load(path: Option<&Path>) -> Result<Self, LinkError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            info!("Loading link configuration from {}", path.display());
            builder = builder.add_source(File::from(path).required(true));
        }
        let settings = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;
        let config: LinkConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), LinkError> {
        if self.address > ADDRESS_MASK {
            return Err(LinkError::Config(format!(
                "address {} is out of range [0, {}]",
                self.address, ADDRESS_MASK
            )));
        }
        if self.response_timeout_ms == 0 {
            return Err(LinkError::Config("response_timeout_ms must be positive".to_string()));
        }
        Ok(())
    }

    /// Response timeout as a duration
    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }
}
