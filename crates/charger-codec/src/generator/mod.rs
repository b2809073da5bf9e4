//! Outbound Frame Generation
//!
//! One [`FrameGenerator`] per protocol. Generators are pure: every call
//! assembles a fresh 8-byte frame and never fails for in-range input.

pub mod mmeet;
pub mod uugreen;

pub use mmeet::MMeet;
pub use uugreen::UUgreen;

use crate::frame::CanFrame;
use crate::protocol::{Mode, Protocol, Quantity, ADDRESS_MASK};

/// Builds request and control frames for one protocol
pub trait FrameGenerator {
    /// Protocol produced by this generator
    fn protocol(&self) -> Protocol;

    /// Read request for a measured quantity
    fn request(&self, address: u8, quantity: Quantity) -> CanFrame;

    /// Voltage setpoint (V)
    fn set_voltage(&self, address: u8, volts: f32) -> CanFrame;

    /// Current setpoint (A)
    fn set_current(&self, address: u8, amps: f32) -> CanFrame;

    /// Low range
    fn set_low_mode(&self, address: u8) -> CanFrame;

    /// High range
    fn set_high_mode(&self, address: u8) -> CanFrame;

    /// Automatic mode, `None` when the protocol has no such mode
    fn set_auto_mode(&self, address: u8) -> Option<CanFrame>;

    /// Power on
    fn enable(&self, address: u8) -> CanFrame;

    /// Power off
    fn disable(&self, address: u8) -> CanFrame;

    /// Output voltage request
    fn request_voltage(&self, address: u8) -> CanFrame {
        self.request(address, Quantity::Voltage)
    }

    /// Output current request
    fn request_current(&self, address: u8) -> CanFrame {
        self.request(address, Quantity::Current)
    }

    /// Temperature request
    fn request_temperature(&self, address: u8) -> CanFrame {
        self.request(address, Quantity::Temperature)
    }

    /// Status flags request
    fn request_flags(&self, address: u8) -> CanFrame {
        self.request(address, Quantity::Status)
    }

    /// Current capability request
    fn request_current_capability(&self, address: u8) -> CanFrame {
        self.request(address, Quantity::CurrentCapability)
    }

    /// Mode change, `None` when the protocol lacks `mode`
    fn set_mode(&self, address: u8, mode: Mode) -> Option<CanFrame> {
        match mode {
            Mode::Low => Some(self.set_low_mode(address)),
            Mode::High => Some(self.set_high_mode(address)),
            Mode::Auto => self.set_auto_mode(address),
        }
    }
}

/// Generator for `protocol`
pub fn generator_for(protocol: Protocol) -> &'static dyn FrameGenerator {
    match protocol {
        Protocol::UUgreen => &UUgreen,
        Protocol::MMeet => &MMeet,
    }
}

/// Address bits positioned for `protocol`'s identifier.
///
/// High bits beyond the 7-bit address width are discarded.
pub(crate) fn address_bits(protocol: Protocol, address: u8) -> u32 {
    u32::from(address & ADDRESS_MASK) << protocol.layout().address_shift
}

/// Physical value to fixed point, truncated toward zero.
///
/// Negative and NaN inputs saturate to zero.
pub(crate) fn to_fixed(value: f32, multiplier: f32) -> u32 {
    (value * multiplier) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_fixed_truncates() {
        assert_eq!(to_fixed(1.2349, 1000.0), 1234);
        assert_eq!(to_fixed(350.0, 100.0), 35000);
        assert_eq!(to_fixed(-1.0, 1000.0), 0);
        assert_eq!(to_fixed(f32::NAN, 1000.0), 0);
    }

    #[test]
    fn test_address_bits_masks_high_bit() {
        assert_eq!(address_bits(Protocol::UUgreen, 0xFF), 0x7F << 14);
        assert_eq!(address_bits(Protocol::MMeet, 0x80), 0);
    }

    #[test]
    fn test_generator_for_protocol() {
        for protocol in Protocol::ALL {
            assert_eq!(generator_for(protocol).protocol(), protocol);
        }
    }

    #[test]
    fn test_set_mode_delegates() {
        let generator = generator_for(Protocol::MMeet);
        assert_eq!(
            generator.set_mode(5, Mode::High),
            Some(generator.set_high_mode(5))
        );
        assert!(generator_for(Protocol::UUgreen).set_mode(5, Mode::Auto).is_none());
    }
}
