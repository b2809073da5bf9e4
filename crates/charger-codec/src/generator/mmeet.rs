//! MMeet Frame Layout
//!
//! Identifier: fixed pattern `0x060F` in the upper half, address in bits
//! 3..=10. Payload: bytes 0..2 are the `01 F0` marker, bytes 2..4 a
//! big-endian command code, bytes 4..8 a big-endian value.

use super::{address_bits, to_fixed, FrameGenerator};
use crate::frame::{CanFrame, EFF_FLAG};
use crate::protocol::{Protocol, Quantity};

/// MMeet command codes
pub mod cmd {
    /// Bytes 0..2 of every frame
    pub const MARKER: [u8; 2] = [0x01, 0xF0];

    pub const VOLTAGE: u16 = 0x0231;
    pub const CURRENT: u16 = 0x0232;
    pub const TEMPERATURE: u16 = 0x020B;
    pub const FLAGS: u16 = 0x0218;
    pub const CURRENT_CAPABILITY: u16 = 0x0235;

    pub const SET_VOLTAGE: u16 = 0x022C;
    pub const SET_CURRENT: u16 = 0x022D;
    pub const SET_MODE: u16 = 0x025D;
    pub const POWER: u16 = 0x0201;

    /// Mode codes occupy bytes 6..8
    pub const MODE_LOW: u16 = 0x1111;
    pub const MODE_HIGH: u16 = 0x2222;
    pub const MODE_AUTO: u16 = 0x0000;
    /// Power sentinels occupy byte 7
    pub const POWER_ON: u8 = 0xAA;
    pub const POWER_OFF: u8 = 0x55;
}

const ID_PATTERN: u32 = 0x060F_0000;

/// MMeet generator
#[derive(Debug, Clone, Copy, Default)]
pub struct MMeet;

impl MMeet {
    /// Identifier for a module
    pub fn can_id(address: u8) -> u32 {
        ID_PATTERN | address_bits(Protocol::MMeet, address) | EFF_FLAG
    }

    /// Read command code for a quantity
    pub fn read_code(quantity: Quantity) -> u16 {
        match quantity {
            Quantity::Voltage => cmd::VOLTAGE,
            Quantity::Current => cmd::CURRENT,
            Quantity::Temperature => cmd::TEMPERATURE,
            Quantity::Status => cmd::FLAGS,
            Quantity::CurrentCapability => cmd::CURRENT_CAPABILITY,
        }
    }

    fn frame(address: u8, command: u16, value: u32) -> CanFrame {
        let [c0, c1] = command.to_be_bytes();
        let [b4, b5, b6, b7] = value.to_be_bytes();
        CanFrame::new(
            Self::can_id(address),
            [cmd::MARKER[0], cmd::MARKER[1], c0, c1, b4, b5, b6, b7],
        )
    }
}

impl FrameGenerator for MMeet {
    fn protocol(&self) -> Protocol {
        Protocol::MMeet
    }

    fn request(&self, address: u8, quantity: Quantity) -> CanFrame {
        Self::frame(address, Self::read_code(quantity), 0)
    }

    fn set_voltage(&self, address: u8, volts: f32) -> CanFrame {
        let raw = to_fixed(volts, Protocol::MMeet.scale().voltage_write);
        Self::frame(address, cmd::SET_VOLTAGE, raw)
    }

    fn set_current(&self, address: u8, amps: f32) -> CanFrame {
        let raw = to_fixed(amps, Protocol::MMeet.scale().current_write);
        Self::frame(address, cmd::SET_CURRENT, raw)
    }

    fn set_low_mode(&self, address: u8) -> CanFrame {
        Self::frame(address, cmd::SET_MODE, u32::from(cmd::MODE_LOW))
    }

    fn set_high_mode(&self, address: u8) -> CanFrame {
        Self::frame(address, cmd::SET_MODE, u32::from(cmd::MODE_HIGH))
    }

    fn set_auto_mode(&self, address: u8) -> Option<CanFrame> {
        Some(Self::frame(address, cmd::SET_MODE, u32::from(cmd::MODE_AUTO)))
    }

    fn enable(&self, address: u8) -> CanFrame {
        Self::frame(address, cmd::POWER, u32::from(cmd::POWER_ON))
    }

    fn disable(&self, address: u8) -> CanFrame {
        Self::frame(address, cmd::POWER, u32::from(cmd::POWER_OFF))
    }
}
