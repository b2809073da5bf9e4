//! Parsed Measurements
//!
//! A measurement carries the module address plus exactly one decoded
//! quantity. The presence set is authoritative: a zero reading and an absent
//! reading share the same stored value.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::protocol::Quantity;

bitflags! {
    /// Fields populated in a [`Measurement`]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct Fields: u8 {
        /// Module address
        const ADDRESS = 1 << 0;
        /// Voltage reading
        const VOLTAGE = 1 << 1;
        /// Current reading
        const CURRENT = 1 << 2;
        /// Temperature reading
        const TEMPERATURE = 1 << 3;
        /// Status bitmap
        const STATUS = 1 << 4;
        /// Current capability reading
        const CAPABILITY = 1 << 5;
    }
}

impl From<Quantity> for Fields {
    fn from(quantity: Quantity) -> Self {
        match quantity {
            Quantity::Voltage => Fields::VOLTAGE,
            Quantity::Current => Fields::CURRENT,
            Quantity::Temperature => Fields::TEMPERATURE,
            Quantity::Status => Fields::STATUS,
            Quantity::CurrentCapability => Fields::CAPABILITY,
        }
    }
}

/// Measurement decoded from one inbound frame
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Measurement {
    address: u8,
    voltage: f32,
    current: f32,
    temperature: i16,
    status: u32,
    current_capability: f32,
    fields: Fields,
}

impl Measurement {
    /// Create a measurement holding only an address
    pub fn new(address: u8) -> Self {
        Self {
            address,
            fields: Fields::ADDRESS,
            ..Default::default()
        }
    }

    /// Set the voltage reading (V)
    pub fn with_voltage(mut self, volts: f32) -> Self {
        self.voltage = volts;
        self.fields |= Fields::VOLTAGE;
        self
    }

    /// Set the current reading (A)
    pub fn with_current(mut self, amps: f32) -> Self {
        self.current = amps;
        self.fields |= Fields::CURRENT;
        self
    }

    /// Set the temperature reading (°C)
    pub fn with_temperature(mut self, degrees: i16) -> Self {
        self.temperature = degrees;
        self.fields |= Fields::TEMPERATURE;
        self
    }

    /// Set the status bitmap
    pub fn with_status(mut self, status: u32) -> Self {
        self.status = status;
        self.fields |= Fields::STATUS;
        self
    }

    /// Set the current capability reading (A)
    pub fn with_current_capability(mut self, amps: f32) -> Self {
        self.current_capability = amps;
        self.fields |= Fields::CAPABILITY;
        self
    }

    /// Presence set
    pub fn fields(&self) -> Fields {
        self.fields
    }

    /// Whether every field in `fields` is present
    pub fn has(&self, fields: Fields) -> bool {
        self.fields.contains(fields)
    }

    /// Whether the reading for `quantity` is present
    pub fn carries(&self, quantity: Quantity) -> bool {
        self.has(quantity.into())
    }

    /// Module address
    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn voltage(&self) -> Option<f32> {
        self.has(Fields::VOLTAGE).then_some(self.voltage)
    }

    pub fn current(&self) -> Option<f32> {
        self.has(Fields::CURRENT).then_some(self.current)
    }

    pub fn temperature(&self) -> Option<i16> {
        self.has(Fields::TEMPERATURE).then_some(self.temperature)
    }

    pub fn status(&self) -> Option<u32> {
        self.has(Fields::STATUS).then_some(self.status)
    }

    pub fn current_capability(&self) -> Option<f32> {
        self.has(Fields::CAPABILITY).then_some(self.current_capability)
    }
}
