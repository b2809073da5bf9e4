//! Module Client
//!
//! Drives request/response exchanges with one module over a [`CanBus`].

use charger_codec::{CanFrame, Measurement, Mode, ParseOutcome, Protocol, ProtocolDispatcher, Quantity};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use crate::bus::CanBus;
use crate::config::LinkConfig;
use crate::error::LinkError;

/// Client for one charger module
pub struct ModuleClient<B> {
    /// Transport
    bus: B,
    /// Frame codec for the selected protocol
    codec: ProtocolDispatcher,
    /// Target module address
    address: u8,
    /// Response deadline per request
    timeout: Duration,
}

impl<B: CanBus> ModuleClient<B> {
    /// Create a client for `address` speaking `protocol`
    pub fn new(bus: B, protocol: Protocol, address: u8) -> Self {
        info!("Creating {} client for module {}", protocol, address);
        Self {
            bus,
            codec: ProtocolDispatcher::new(protocol),
            address,
            timeout: Duration::from_millis(LinkConfig::default().response_timeout_ms),
        }
    }

    /// Create a client from configuration
    pub fn from_config(bus: B, config: &LinkConfig) -> Self {
        let mut client = Self::new(bus, config.protocol, config.address);
        client.set_timeout(config.response_timeout());
        client
    }

    /// Set response timeout
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Switch protocol
    pub fn set_protocol(&mut self, protocol: Protocol) {
        self.codec.set_protocol(protocol);
    }

    /// Get current protocol
    pub fn protocol(&self) -> Protocol {
        self.codec.protocol()
    }

    /// Target module address
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Borrow the underlying bus
    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Mutably borrow the underlying bus
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Request `quantity` and wait for the module's answer.
    ///
    /// Frames from other protocols, other addresses or carrying another
    /// quantity are skipped until the deadline passes.
    pub async fn read(&mut self, quantity: Quantity) -> Result<Measurement, LinkError> {
        let request = self.codec.request(self.address, quantity);
        self.send(&request).await?;

        let deadline = Instant::now() + self.timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            let Some(frame) = self.bus.receive(remaining).await? else {
                break;
            };
            trace!("Received {}", frame);

            match self.codec.parse(&frame) {
                ParseOutcome::Ok(m) if m.address() == self.address && m.carries(quantity) => {
                    return Ok(m);
                }
                ParseOutcome::Ok(m) => {
                    debug!("Skipping measurement {:?} while waiting for {:?}", m, quantity);
                }
                ParseOutcome::UnknownCommand { code } => {
                    debug!("Skipping frame with unknown command 0x{:04X}", code);
                }
                ParseOutcome::InvalidFrame => {
                    debug!("Skipping foreign frame {}", frame);
                }
            }
        }

        warn!(
            "No {:?} response from module {} within {:?}",
            quantity, self.address, self.timeout
        );
        Err(LinkError::Timeout(self.timeout.as_millis() as u64))
    }

    /// Output voltage (V)
    pub async fn read_voltage(&mut self) -> Result<f32, LinkError> {
        let m = self.read(Quantity::Voltage).await?;
        Ok(m.voltage().unwrap_or_default())
    }

    /// Output current (A)
    pub async fn read_current(&mut self) -> Result<f32, LinkError> {
        let m = self.read(Quantity::Current).await?;
        Ok(m.current().unwrap_or_default())
    }

    /// Module temperature (°C)
    pub async fn read_temperature(&mut self) -> Result<i16, LinkError> {
        let m = self.read(Quantity::Temperature).await?;
        Ok(m.temperature().unwrap_or_default())
    }

    /// Status flag bitmap
    pub async fn read_flags(&mut self) -> Result<u32, LinkError> {
        let m = self.read(Quantity::Status).await?;
        Ok(m.status().unwrap_or_default())
    }

    /// Maximum deliverable current (A)
    pub async fn read_current_capability(&mut self) -> Result<f32, LinkError> {
        let m = self.read(Quantity::CurrentCapability).await?;
        Ok(m.current_capability().unwrap_or_default())
    }

    /// Send a voltage setpoint (V)
    pub async fn set_voltage(&mut self, volts: f32) -> Result<(), LinkError> {
        let frame = self.codec.set_voltage(self.address, volts);
        self.send(&frame).await
    }

    /// Send a current setpoint (A)
    pub async fn set_current(&mut self, amps: f32) -> Result<(), LinkError> {
        let frame = self.codec.set_current(self.address, amps);
        self.send(&frame).await
    }

    /// Switch range; nothing is sent when the protocol lacks `mode`
    pub async fn set_mode(&mut self, mode: Mode) -> Result<(), LinkError> {
        match self.codec.set_mode(self.address, mode) {
            Some(frame) => self.send(&frame).await,
            None => Err(LinkError::Unsupported {
                operation: mode_operation(mode),
                protocol: self.protocol(),
            }),
        }
    }

    /// Power the output on
    pub async fn enable(&mut self) -> Result<(), LinkError> {
        let frame = self.codec.enable(self.address);
        self.send(&frame).await
    }

    /// Power the output off
    pub async fn disable(&mut self) -> Result<(), LinkError> {
        let frame = self.codec.disable(self.address);
        self.send(&frame).await
    }

    async fn send(&mut self, frame: &CanFrame) -> Result<(), LinkError> {
        trace!("Sending {}", frame);
        self.bus.send(frame).await
    }
}

fn mode_operation(mode: Mode) -> &'static str {
    match mode {
        Mode::Low => "low mode",
        Mode::High => "high mode",
        Mode::Auto => "auto mode",
    }
}
