//! UUgreen Frame Layout
//!
//! Identifier: protocol bit 25, peer-to-peer bit 21, address in bits 14..=20.
//! Payload: byte 0 selects read (`0x12`) or control (`0x10`), byte 1 is the
//! command, bytes 4..8 carry a big-endian value.

use super::{address_bits, to_fixed, FrameGenerator};
use crate::frame::{CanFrame, EFF_FLAG};
use crate::protocol::{Protocol, Quantity};

/// UUgreen command bytes
pub mod cmd {
    /// Byte 0 of read requests
    pub const READ_PREFIX: u8 = 0x12;
    /// Byte 0 of control frames
    pub const CONTROL_PREFIX: u8 = 0x10;

    pub const VOLTAGE: u8 = 0x62;
    pub const CURRENT: u8 = 0x30;
    pub const TEMPERATURE: u8 = 0x1E;
    pub const FLAGS: u8 = 0x08;
    pub const CURRENT_CAPABILITY: u8 = 0x68;
    /// Voltage code used by older firmware responses
    pub const VOLTAGE_ALT: u8 = 0x00;
    /// Current code used by older firmware responses
    pub const CURRENT_ALT: u8 = 0x01;

    pub const SET_VOLTAGE: u8 = 0x02;
    pub const SET_CURRENT: u8 = 0x03;
    pub const SET_MODE: u8 = 0x5F;
    pub const POWER: u8 = 0x04;

    pub const MODE_LOW: u8 = 0x00;
    pub const MODE_HIGH: u8 = 0x01;
    pub const POWER_ON: u8 = 0x00;
    pub const POWER_OFF: u8 = 0x01;
}

const PROTOCOL_BIT: u32 = 1 << 25;
const PEER_TO_PEER_BIT: u32 = 1 << 21;

/// UUgreen generator
#[derive(Debug, Clone, Copy, Default)]
pub struct UUgreen;

impl UUgreen {
    /// Identifier for a module
    pub fn can_id(address: u8) -> u32 {
        PROTOCOL_BIT | PEER_TO_PEER_BIT | address_bits(Protocol::UUgreen, address) | EFF_FLAG
    }

    /// Read command byte for a quantity
    pub fn read_code(quantity: Quantity) -> u8 {
        match quantity {
            Quantity::Voltage => cmd::VOLTAGE,
            Quantity::Current => cmd::CURRENT,
            Quantity::Temperature => cmd::TEMPERATURE,
            Quantity::Status => cmd::FLAGS,
            Quantity::CurrentCapability => cmd::CURRENT_CAPABILITY,
        }
    }

    fn frame(address: u8, prefix: u8, command: u8, value: u32) -> CanFrame {
        let [b4, b5, b6, b7] = value.to_be_bytes();
        CanFrame::new(
            Self::can_id(address),
            [prefix, command, 0, 0, b4, b5, b6, b7],
        )
    }

    fn control(address: u8, command: u8, value: u32) -> CanFrame {
        Self::frame(address, cmd::CONTROL_PREFIX, command, value)
    }
}

impl FrameGenerator for UUgreen {
    fn protocol(&self) -> Protocol {
        Protocol::UUgreen
    }

    fn request(&self, address: u8, quantity: Quantity) -> CanFrame {
        Self::frame(address, cmd::READ_PREFIX, Self::read_code(quantity), 0)
    }

    fn set_voltage(&self, address: u8, volts: f32) -> CanFrame {
        let raw = to_fixed(volts, Protocol::UUgreen.scale().voltage_write);
        Self::control(address, cmd::SET_VOLTAGE, raw)
    }

    fn set_current(&self, address: u8, amps: f32) -> CanFrame {
        let raw = to_fixed(amps, Protocol::UUgreen.scale().current_write);
        Self::control(address, cmd::SET_CURRENT, raw)
    }

    fn set_low_mode(&self, address: u8) -> CanFrame {
        Self::control(address, cmd::SET_MODE, u32::from(cmd::MODE_LOW))
    }

    fn set_high_mode(&self, address: u8) -> CanFrame {
        Self::control(address, cmd::SET_MODE, u32::from(cmd::MODE_HIGH))
    }

    fn set_auto_mode(&self, _address: u8) -> Option<CanFrame> {
        None
    }

    fn enable(&self, address: u8) -> CanFrame {
        Self::control(address, cmd::POWER, u32::from(cmd::POWER_ON))
    }

    fn disable(&self, address: u8) -> CanFrame {
        Self::control(address, cmd::POWER, u32::from(cmd::POWER_OFF))
    }
}
