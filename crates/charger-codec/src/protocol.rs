//! Protocol Definitions
//!
//! Identifier layouts and fixed-point scale factors for each supported
//! vendor protocol. These constants are the wire contract with the hardware.

use crate::error::CodecError;
use crate::frame::{CanFrame, FRAME_DLC};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Width mask applied to module addresses before they are packed
pub const ADDRESS_MASK: u8 = 0x7F;

/// Supported vendor protocols
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// UUgreen charger modules
    #[default]
    #[serde(alias = "UUgreen")]
    UUgreen,
    /// MMeet charger modules
    #[serde(alias = "MMeet")]
    MMeet,
}

/// Identifier bit layout of a protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdLayout {
    /// Bits compared when recognising a frame
    pub mask: u32,
    /// Value the masked bits must equal
    pub expected: u32,
    /// Bits holding the module address
    pub address_mask: u32,
    /// Position of the lowest address bit
    pub address_shift: u32,
}

/// Fixed-point factors per quantity and direction.
///
/// Write and read factors are independent: MMeet writes setpoints in 1/100
/// units but reports readings in 1/1000 units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WireScale {
    /// Multiplier for voltage setpoints
    pub voltage_write: f32,
    /// Multiplier for current setpoints
    pub current_write: f32,
    /// Divisor for voltage readings
    pub voltage_read: f32,
    /// Divisor for current readings
    pub current_read: f32,
    /// Integer divisor for temperature readings
    pub temperature_read: i32,
    /// Divisor for current capability readings
    pub capability_read: f32,
}

const UUGREEN_LAYOUT: IdLayout = IdLayout {
    mask: 0x0200_0000,
    expected: 0x0200_0000,
    address_mask: 0x001F_C000,
    address_shift: 14,
};

const MMEET_LAYOUT: IdLayout = IdLayout {
    mask: 0xFFFF_0000,
    expected: 0x060F_0000,
    address_mask: 0x0000_07F8,
    address_shift: 3,
};

const UUGREEN_SCALE: WireScale = WireScale {
    voltage_write: 1000.0,
    current_write: 1000.0,
    voltage_read: 1000.0,
    current_read: 1000.0,
    temperature_read: 1000,
    capability_read: 1000.0,
};

const MMEET_SCALE: WireScale = WireScale {
    voltage_write: 100.0,
    current_write: 100.0,
    voltage_read: 1000.0,
    current_read: 1000.0,
    temperature_read: 10,
    capability_read: 10.0,
};

impl Protocol {
    /// Every supported protocol, in tag order
    pub const ALL: [Protocol; 2] = [Protocol::UUgreen, Protocol::MMeet];

    /// Numeric tag of this protocol
    pub fn id(&self) -> u8 {
        match self {
            Protocol::UUgreen => 0,
            Protocol::MMeet => 1,
        }
    }

    /// Identifier layout
    pub fn layout(&self) -> &'static IdLayout {
        match self {
            Protocol::UUgreen => &UUGREEN_LAYOUT,
            Protocol::MMeet => &MMEET_LAYOUT,
        }
    }

    /// Scale factors
    pub fn scale(&self) -> &'static WireScale {
        match self {
            Protocol::UUgreen => &UUGREEN_SCALE,
            Protocol::MMeet => &MMEET_SCALE,
        }
    }

    /// Whether the protocol has an automatic power mode
    pub fn supports_auto_mode(&self) -> bool {
        matches!(self, Protocol::MMeet)
    }

    /// Check the identifier pattern and length of a frame.
    ///
    /// The mask is applied to the arbitration id, so the SocketCAN flag bits
    /// do not take part in the comparison.
    pub fn matches(&self, frame: &CanFrame) -> bool {
        let layout = self.layout();
        frame.raw_id() & layout.mask == layout.expected && frame.dlc() == FRAME_DLC
    }

    /// Extract the module address from an identifier
    pub fn address_of(&self, can_id: u32) -> u8 {
        let layout = self.layout();
        ((can_id & layout.address_mask) >> layout.address_shift) as u8
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::UUgreen => f.write_str("UUgreen"),
            Protocol::MMeet => f.write_str("MMeet"),
        }
    }
}

impl FromStr for Protocol {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "uugreen" => Ok(Protocol::UUgreen),
            "mmeet" => Ok(Protocol::MMeet),
            _ => Err(CodecError::UnknownProtocol(s.to_string())),
        }
    }
}

impl TryFrom<u8> for Protocol {
    type Error = CodecError;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        Protocol::ALL
            .into_iter()
            .find(|p| p.id() == id)
            .ok_or(CodecError::UnknownProtocolId(id))
    }
}

/// Measured quantities a module can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quantity {
    /// Output voltage (V)
    Voltage,
    /// Output current (A)
    Current,
    /// Module temperature (°C)
    Temperature,
    /// Status flag bitmap
    Status,
    /// Current the module can deliver (A)
    CurrentCapability,
}

impl Quantity {
    /// Every quantity
    pub const ALL: [Quantity; 5] = [
        Quantity::Voltage,
        Quantity::Current,
        Quantity::Temperature,
        Quantity::Status,
        Quantity::CurrentCapability,
    ];
}

/// Power modes a module can be switched to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Low voltage range
    Low,
    /// High voltage range
    High,
    /// Range chosen by the module
    Auto,
}
