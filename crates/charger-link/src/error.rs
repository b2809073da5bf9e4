//! Link Error Types

use charger_codec::{CodecError, Protocol};
use thiserror::Error;

/// Errors that can occur while talking to a module
#[derive(Debug, Error)]
pub enum LinkError {
    /// No matching response before the deadline
    #[error("Timeout waiting for module response after {0}ms")]
    Timeout(u64),

    /// Transport failure
    #[error("CAN bus error: {0}")]
    Bus(String),

    /// Operation not available in the selected protocol
    #[error("{operation} is not supported by {protocol}")]
    Unsupported {
        operation: &'static str,
        protocol: Protocol,
    },

    /// Protocol selection failed
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Configuration could not be loaded or is out of range
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<std::io::Error> for LinkError {
    fn from(err: std::io::Error) -> Self {
        LinkError::Bus(err.to_string())
    }
}

impl From<config::ConfigError> for LinkError {
    fn from(err: config::ConfigError) -> Self {
        LinkError::Config(err.to_string())
    }
}
