//! Codec Error Types

use thiserror::Error;

/// Errors raised while selecting a protocol or decoding a stored frame.
///
/// Frame generation and parsing never fail; they report their outcomes as
/// data (see [`crate::ParseOutcome`] and the `Option` returned by
/// auto-mode generation).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Protocol name not recognised
    #[error("Unknown protocol: {0}")]
    UnknownProtocol(String),

    /// Numeric protocol tag not recognised
    #[error("Unknown protocol id: {0}")]
    UnknownProtocolId(u8),

    /// Serialized frame declares more than 8 data bytes
    #[error("Invalid frame length: {0}")]
    InvalidLength(u8),
}
