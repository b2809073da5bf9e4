//! Inbound Frame Parsing
//!
//! Validates a frame against a protocol's identifier pattern, classifies the
//! embedded command and scales the 32-bit payload into a [`Measurement`].

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::frame::CanFrame;
use crate::generator::{mmeet, uugreen};
use crate::measurement::Measurement;
use crate::protocol::{Protocol, Quantity};

/// Offset of the big-endian value in every protocol
pub const VALUE_OFFSET: usize = 4;

/// Result kind of a parse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParseStatus {
    /// Measurement decoded
    Ok,
    /// Frame belongs to the protocol but the command is not decoded
    UnknownCmd,
    /// Wrong identifier pattern or length
    InvalidFrame,
}

/// Outcome of parsing one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParseOutcome {
    /// Measurement decoded
    Ok(Measurement),
    /// Frame accepted but the command code has no mapping
    UnknownCommand {
        /// Command code found in the payload
        code: u16,
    },
    /// Frame rejected
    InvalidFrame,
}

impl ParseOutcome {
    /// Result kind
    pub fn status(&self) -> ParseStatus {
        match self {
            ParseOutcome::Ok(_) => ParseStatus::Ok,
            ParseOutcome::UnknownCommand { .. } => ParseStatus::UnknownCmd,
            ParseOutcome::InvalidFrame => ParseStatus::InvalidFrame,
        }
    }

    /// Decoded measurement, if any
    pub fn measurement(&self) -> Option<&Measurement> {
        match self {
            ParseOutcome::Ok(m) => Some(m),
            _ => None,
        }
    }

    /// Take the decoded measurement, if any
    pub fn into_measurement(self) -> Option<Measurement> {
        match self {
            ParseOutcome::Ok(m) => Some(m),
            _ => None,
        }
    }

    /// Whether a measurement was decoded
    pub fn is_ok(&self) -> bool {
        matches!(self, ParseOutcome::Ok(_))
    }
}

/// Parse `frame` as a `protocol` response
pub fn parse(frame: &CanFrame, protocol: Protocol) -> ParseOutcome {
    if !protocol.matches(frame) {
        trace!("Rejected frame for {}: {}", protocol, frame);
        return ParseOutcome::InvalidFrame;
    }

    let address = protocol.address_of(frame.raw_id());
    let (code, quantity, frame) = match protocol {
        Protocol::UUgreen => {
            let code = frame.data()[1];
            (u16::from(code), uugreen_quantity(code), sanitize_uugreen(frame))
        }
        Protocol::MMeet => {
            let code = frame.read_u16(2).unwrap_or_default();
            (code, mmeet_quantity(code), *frame)
        }
    };

    match quantity {
        Some(quantity) => {
            let raw = frame.read_u32(VALUE_OFFSET).unwrap_or_default();
            ParseOutcome::Ok(scale_into(Measurement::new(address), protocol, quantity, raw))
        }
        None => ParseOutcome::UnknownCommand { code },
    }
}

/// UUgreen reuses bytes 2..4 for other purposes; they must not leak into the value
fn sanitize_uugreen(frame: &CanFrame) -> CanFrame {
    let mut data = *frame.data();
    data[2] = 0;
    data[3] = 0;
    CanFrame::with_dlc(frame.can_id(), frame.dlc(), &data)
}

fn uugreen_quantity(code: u8) -> Option<Quantity> {
    use uugreen::cmd;
    match code {
        cmd::VOLTAGE | cmd::VOLTAGE_ALT => Some(Quantity::Voltage),
        cmd::CURRENT | cmd::CURRENT_ALT => Some(Quantity::Current),
        cmd::FLAGS => Some(Quantity::Status),
        cmd::TEMPERATURE => Some(Quantity::Temperature),
        cmd::CURRENT_CAPABILITY => Some(Quantity::CurrentCapability),
        _ => None,
    }
}

fn mmeet_quantity(code: u16) -> Option<Quantity> {
    use mmeet::cmd;
    match code {
        cmd::VOLTAGE => Some(Quantity::Voltage),
        cmd::CURRENT => Some(Quantity::Current),
        cmd::FLAGS => Some(Quantity::Status),
        cmd::TEMPERATURE => Some(Quantity::Temperature),
        cmd::CURRENT_CAPABILITY => Some(Quantity::CurrentCapability),
        _ => None,
    }
}

fn scale_into(m: Measurement, protocol: Protocol, quantity: Quantity, raw: u32) -> Measurement {
    let scale = protocol.scale();
    match quantity {
        Quantity::Voltage => m.with_voltage(raw as f32 / scale.voltage_read),
        Quantity::Current => m.with_current(raw as f32 / scale.current_read),
        Quantity::Temperature => m.with_temperature(((raw as i32) / scale.temperature_read) as i16),
        Quantity::Status => m.with_status(raw),
        Quantity::CurrentCapability => m.with_current_capability(raw as f32 / scale.capability_read),
    }
}
