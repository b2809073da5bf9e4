//! Protocol Dispatcher
//!
//! Owns the selected protocol and forwards every generator operation and
//! `parse` to the matching implementation.

use tracing::{info, trace, warn};

use crate::error::CodecError;
use crate::frame::CanFrame;
use crate::generator::{generator_for, FrameGenerator};
use crate::parser::{self, ParseOutcome};
use crate::protocol::{Mode, Protocol, Quantity};

/// Routes codec operations to the selected protocol.
///
/// Reselection takes `&mut self`; share one dispatcher across threads only
/// behind external synchronisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolDispatcher {
    protocol: Protocol,
}

impl ProtocolDispatcher {
    /// Create a dispatcher for `protocol`
    pub fn new(protocol: Protocol) -> Self {
        info!("Codec protocol selected: {}", protocol);
        Self { protocol }
    }

    /// Create a dispatcher from a protocol name
    pub fn from_name(name: &str) -> Result<Self, CodecError> {
        Ok(Self::new(name.parse()?))
    }

    /// Currently selected protocol
    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    /// Replace the selected protocol
    pub fn set_protocol(&mut self, protocol: Protocol) {
        if protocol != self.protocol {
            info!("Codec protocol changed: {} -> {}", self.protocol, protocol);
        }
        self.protocol = protocol;
    }

    /// Select a protocol by name, leaving the current one in place on error
    pub fn select(&mut self, name: &str) -> Result<(), CodecError> {
        let protocol = name.parse::<Protocol>().inspect_err(|e| {
            warn!("Protocol selection rejected: {}", e);
        })?;
        self.set_protocol(protocol);
        Ok(())
    }

    /// Select a protocol by numeric tag, leaving the current one in place on error
    pub fn select_id(&mut self, id: u8) -> Result<(), CodecError> {
        let protocol = Protocol::try_from(id).inspect_err(|e| {
            warn!("Protocol selection rejected: {}", e);
        })?;
        self.set_protocol(protocol);
        Ok(())
    }

    fn generator(&self) -> &'static dyn FrameGenerator {
        generator_for(self.protocol)
    }

    fn emit(&self, op: &str, frame: CanFrame) -> CanFrame {
        trace!("{} {}: {}", self.protocol, op, frame);
        frame
    }

    /// Read request for `quantity`
    pub fn request(&self, address: u8, quantity: Quantity) -> CanFrame {
        self.emit("request", self.generator().request(address, quantity))
    }

    /// Output voltage request
    pub fn request_voltage(&self, address: u8) -> CanFrame {
        self.request(address, Quantity::Voltage)
    }

    /// Output current request
    pub fn request_current(&self, address: u8) -> CanFrame {
        self.request(address, Quantity::Current)
    }

    /// Temperature request
    pub fn request_temperature(&self, address: u8) -> CanFrame {
        self.request(address, Quantity::Temperature)
    }

    /// Status flags request
    pub fn request_flags(&self, address: u8) -> CanFrame {
        self.request(address, Quantity::Status)
    }

    /// Current capability request
    pub fn request_current_capability(&self, address: u8) -> CanFrame {
        self.request(address, Quantity::CurrentCapability)
    }

    /// Voltage setpoint (V)
    pub fn set_voltage(&self, address: u8, volts: f32) -> CanFrame {
        self.emit("set_voltage", self.generator().set_voltage(address, volts))
    }

    /// Current setpoint (A)
    pub fn set_current(&self, address: u8, amps: f32) -> CanFrame {
        self.emit("set_current", self.generator().set_current(address, amps))
    }

    /// Low range
    pub fn set_low_mode(&self, address: u8) -> CanFrame {
        self.emit("set_low_mode", self.generator().set_low_mode(address))
    }

    /// High range
    pub fn set_high_mode(&self, address: u8) -> CanFrame {
        self.emit("set_high_mode", self.generator().set_high_mode(address))
    }

    /// Auto mode frame, `None` when the protocol lacks auto mode
    pub fn set_auto_mode(&self, address: u8) -> Option<CanFrame> {
        self.set_mode(address, Mode::Auto)
    }

    /// Mode frame, `None` when the protocol lacks `mode`
    pub fn set_mode(&self, address: u8, mode: Mode) -> Option<CanFrame> {
        match self.generator().set_mode(address, mode) {
            Some(frame) => Some(self.emit("set_mode", frame)),
            None => {
                warn!("{} does not support {:?} mode", self.protocol, mode);
                None
            }
        }
    }

    /// Power on
    pub fn enable(&self, address: u8) -> CanFrame {
        self.emit("enable", self.generator().enable(address))
    }

    /// Power off
    pub fn disable(&self, address: u8) -> CanFrame {
        self.emit("disable", self.generator().disable(address))
    }

    /// Parse an inbound frame with the selected protocol
    pub fn parse(&self, frame: &CanFrame) -> ParseOutcome {
        parser::parse(frame, self.protocol)
    }
}

impl Default for ProtocolDispatcher {
    fn default() -> Self {
        Self::new(Protocol::default())
    }
}
