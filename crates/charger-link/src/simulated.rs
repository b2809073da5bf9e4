//! Simulated Charger Modules
//!
//! In-memory [`CanBus`] that answers requests the way a charger module
//! would. Used by tests and by the probe when no hardware is attached.

use async_trait::async_trait;
use charger_codec::generator::{mmeet, uugreen};
use charger_codec::{CanFrame, MMeet, Mode, Protocol, Quantity, UUgreen, VALUE_OFFSET};
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tracing::{debug, info, trace};

use crate::bus::CanBus;
use crate::error::LinkError;

/// Status bit reported while the module output is off
pub const STATUS_OUTPUT_OFF: u32 = 1 << 0;

/// Filler written to UUgreen bytes 2..4 of responses
const UUGREEN_FILLER: [u8; 2] = [0x5A, 0xA5];

/// State of one simulated module
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleState {
    /// Voltage setpoint (V)
    pub voltage_setpoint: f32,
    /// Current limit setpoint (A)
    pub current_setpoint: f32,
    /// Heatsink temperature (°C)
    pub temperature: i16,
    /// Extra status bits reported alongside the output flag
    pub status: u32,
    /// Maximum deliverable current (A)
    pub current_capability: f32,
    /// Output enabled
    pub enabled: bool,
    /// Active range
    pub mode: Mode,
}

impl Default for ModuleState {
    fn default() -> Self {
        Self {
            voltage_setpoint: 0.0,
            current_setpoint: 0.0,
            temperature: 25,
            status: 0,
            current_capability: 100.0,
            enabled: false,
            mode: Mode::Low,
        }
    }
}

impl ModuleState {
    /// Output voltage as reported on the bus
    pub fn output_voltage(&self) -> f32 {
        if self.enabled {
            self.voltage_setpoint
        } else {
            0.0
        }
    }

    /// Output current as reported on the bus
    pub fn output_current(&self) -> f32 {
        if self.enabled {
            self.current_setpoint
        } else {
            0.0
        }
    }

    /// Status bitmap as reported on the bus
    pub fn status_flags(&self) -> u32 {
        if self.enabled {
            self.status
        } else {
            self.status | STATUS_OUTPUT_OFF
        }
    }
}

/// Bus populated by simulated modules of one protocol
#[derive(Debug)]
pub struct SimulatedModule {
    protocol: Protocol,
    modules: HashMap<u8, ModuleState>,
    pending: VecDeque<CanFrame>,
    sent: Vec<CanFrame>,
}

impl SimulatedModule {
    /// Create an empty bus
    pub fn new(protocol: Protocol) -> Self {
        info!("Creating simulated {} bus", protocol);
        Self {
            protocol,
            modules: HashMap::new(),
            pending: VecDeque::new(),
            sent: Vec::new(),
        }
    }

    /// Add a module at `address` with default state
    pub fn with_module(mut self, address: u8) -> Self {
        self.insert(address, ModuleState::default());
        self
    }

    /// Add or replace a module
    pub fn insert(&mut self, address: u8, state: ModuleState) {
        self.modules.insert(address, state);
    }

    /// State of the module at `address`
    pub fn state(&self, address: u8) -> Option<&ModuleState> {
        self.modules.get(&address)
    }

    /// Every frame sent to the bus so far
    pub fn sent(&self) -> &[CanFrame] {
        &self.sent
    }

    /// Queue a frame as if another node had transmitted it
    pub fn inject(&mut self, frame: CanFrame) {
        self.pending.push_back(frame);
    }

    fn handle(&mut self, frame: &CanFrame) {
        if !self.protocol.matches(frame) {
            debug!("Simulator ignoring foreign frame: {}", frame);
            return;
        }
        let protocol = self.protocol;
        let address = protocol.address_of(frame.raw_id());
        let Some(state) = self.modules.get_mut(&address) else {
            debug!("No simulated module at address {}", address);
            return;
        };

        let response = match protocol {
            Protocol::UUgreen => handle_uugreen(state, address, frame),
            Protocol::MMeet => handle_mmeet(state, address, frame),
        };
        if let Some(response) = response {
            trace!("Simulator response: {}", response);
            self.pending.push_back(response);
        }
    }
}

fn handle_uugreen(state: &mut ModuleState, address: u8, frame: &CanFrame) -> Option<CanFrame> {
    let data = frame.data();
    let value = frame.read_u32(VALUE_OFFSET)?;
    let scale = Protocol::UUgreen.scale();

    match (data[0], data[1]) {
        (uugreen::cmd::READ_PREFIX, code) => {
            let quantity = Quantity::ALL
                .into_iter()
                .find(|q| UUgreen::read_code(*q) == code)?;
            let [b4, b5, b6, b7] = raw_reading(Protocol::UUgreen, state, quantity).to_be_bytes();
            let [f0, f1] = UUGREEN_FILLER;
            Some(CanFrame::new(
                UUgreen::can_id(address),
                [uugreen::cmd::READ_PREFIX, code, f0, f1, b4, b5, b6, b7],
            ))
        }
        (uugreen::cmd::CONTROL_PREFIX, uugreen::cmd::SET_VOLTAGE) => {
            state.voltage_setpoint = value as f32 / scale.voltage_write;
            debug!("Module {} voltage setpoint {} V", address, state.voltage_setpoint);
            None
        }
        (uugreen::cmd::CONTROL_PREFIX, uugreen::cmd::SET_CURRENT) => {
            state.current_setpoint = value as f32 / scale.current_write;
            debug!("Module {} current setpoint {} A", address, state.current_setpoint);
            None
        }
        (uugreen::cmd::CONTROL_PREFIX, uugreen::cmd::SET_MODE) => {
            match data[7] {
                uugreen::cmd::MODE_LOW => state.mode = Mode::Low,
                uugreen::cmd::MODE_HIGH => state.mode = Mode::High,
                other => debug!("Module {} ignoring mode 0x{:02X}", address, other),
            }
            None
        }
        (uugreen::cmd::CONTROL_PREFIX, uugreen::cmd::POWER) => {
            state.enabled = data[7] == uugreen::cmd::POWER_ON;
            debug!("Module {} output enabled: {}", address, state.enabled);
            None
        }
        (prefix, code) => {
            debug!("Module {} ignoring command {:02X} {:02X}", address, prefix, code);
            None
        }
    }
}

fn handle_mmeet(state: &mut ModuleState, address: u8, frame: &CanFrame) -> Option<CanFrame> {
    let code = frame.read_u16(2)?;
    let value = frame.read_u32(VALUE_OFFSET)?;
    let scale = Protocol::MMeet.scale();

    if let Some(quantity) = Quantity::ALL
        .into_iter()
        .find(|q| MMeet::read_code(*q) == code)
    {
        let [c0, c1] = code.to_be_bytes();
        let [b4, b5, b6, b7] = raw_reading(Protocol::MMeet, state, quantity).to_be_bytes();
        let [m0, m1] = mmeet::cmd::MARKER;
        return Some(CanFrame::new(
            MMeet::can_id(address),
            [m0, m1, c0, c1, b4, b5, b6, b7],
        ));
    }

    match code {
        mmeet::cmd::SET_VOLTAGE => {
            state.voltage_setpoint = value as f32 / scale.voltage_write;
            debug!("Module {} voltage setpoint {} V", address, state.voltage_setpoint);
        }
        mmeet::cmd::SET_CURRENT => {
            state.current_setpoint = value as f32 / scale.current_write;
            debug!("Module {} current setpoint {} A", address, state.current_setpoint);
        }
        mmeet::cmd::SET_MODE => match frame.read_u16(6).unwrap_or_default() {
            mmeet::cmd::MODE_LOW => state.mode = Mode::Low,
            mmeet::cmd::MODE_HIGH => state.mode = Mode::High,
            mmeet::cmd::MODE_AUTO => state.mode = Mode::Auto,
            other => debug!("Module {} ignoring mode 0x{:04X}", address, other),
        },
        mmeet::cmd::POWER => match frame.data()[7] {
            mmeet::cmd::POWER_ON => state.enabled = true,
            mmeet::cmd::POWER_OFF => state.enabled = false,
            other => debug!("Module {} ignoring power sentinel 0x{:02X}", address, other),
        },
        other => debug!("Module {} ignoring command 0x{:04X}", address, other),
    }
    None
}

/// Reading encoded with the protocol's read-side scale
fn raw_reading(protocol: Protocol, state: &ModuleState, quantity: Quantity) -> u32 {
    let scale = protocol.scale();
    match quantity {
        Quantity::Voltage => (state.output_voltage() * scale.voltage_read).round() as u32,
        Quantity::Current => (state.output_current() * scale.current_read).round() as u32,
        Quantity::Temperature => (i32::from(state.temperature) * scale.temperature_read) as u32,
        Quantity::Status => state.status_flags(),
        Quantity::CurrentCapability => {
            (state.current_capability * scale.capability_read).round() as u32
        }
    }
}

#[async_trait]
impl CanBus for SimulatedModule {
    async fn send(&mut self, frame: &CanFrame) -> Result<(), LinkError> {
        self.sent.push(*frame);
        self.handle(frame);
        Ok(())
    }

    async fn receive(&mut self, timeout: Duration) -> Result<Option<CanFrame>, LinkError> {
        match self.pending.pop_front() {
            Some(frame) => Ok(Some(frame)),
            None => {
                tokio::time::sleep(timeout).await;
                Ok(None)
            }
        }
    }
}
