//! Charger Module Probe
//!
//! Walks one module through every command of its protocol: the five reads,
//! both setpoints, the range switches and output power. Each response is
//! logged as it arrives.

use charger_codec::{Measurement, Mode, Quantity};
use charger_link::{CanBus, LinkConfig, LinkError, ModuleClient, ENV_PREFIX};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Probe failures
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Bus, timeout or configuration failure from the link layer
    #[error(transparent)]
    Link(#[from] LinkError),

    /// Subscriber could not be installed
    #[error("Logging error: {0}")]
    Logging(String),
}

impl From<config::ConfigError> for ProbeError {
    fn from(err: config::ConfigError) -> Self {
        ProbeError::Link(err.into())
    }
}

/// Probe settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Module connection
    pub link: LinkConfig,
    /// Voltage setpoint sent in step 6 (V)
    pub test_voltage: f32,
    /// Current setpoint sent in step 7 (A)
    pub test_current: f32,
    /// Pause after each mode and power command
    pub settle_ms: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            link: LinkConfig::default(),
            test_voltage: 350.0,
            test_current: 10.5,
            settle_ms: 1000,
        }
    }
}

impl ProbeConfig {
    /// Load from `path` (if given) and `CHARGER_*` variables;
    /// link keys use a double underscore, e.g. `CHARGER_LINK__ADDRESS=3`
    pub fn load(path: Option<&Path>) -> Result<Self, ProbeError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        let settings = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        let config: ProbeConfig = settings.try_deserialize()?;
        config.link.validate()?;
        Ok(config)
    }

    fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

/// Readings collected during a probe run; `None` where the module stayed silent
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProbeReport {
    /// Output voltage (V)
    pub voltage: Option<f32>,
    /// Output current (A)
    pub current: Option<f32>,
    /// Module temperature (°C)
    pub temperature: Option<i16>,
    /// Status flag bitmap
    pub status: Option<u32>,
    /// Maximum deliverable current (A)
    pub current_capability: Option<f32>,
    /// Auto mode frame was sent
    pub auto_mode: bool,
}

impl ProbeReport {
    fn record(&mut self, m: &Measurement) {
        self.voltage = m.voltage().or(self.voltage);
        self.current = m.current().or(self.current);
        self.temperature = m.temperature().or(self.temperature);
        self.status = m.status().or(self.status);
        self.current_capability = m.current_capability().or(self.current_capability);
    }
}

/// Initialize logging at `level` ("trace" through "error")
pub fn init_logging(level: &str) -> Result<(), ProbeError> {
    let level: Level = level
        .parse()
        .map_err(|_| ProbeError::Logging(format!("unknown log level '{}'", level)))?;
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| ProbeError::Logging(e.to_string()))
}

/// Run the full command sequence against `client`
pub async fn run_probe<B: CanBus>(
    client: &mut ModuleClient<B>,
    config: &ProbeConfig,
) -> Result<ProbeReport, ProbeError> {
    info!(
        "=== Probing {} module at address {} ===",
        client.protocol(),
        client.address()
    );
    let mut report = ProbeReport::default();

    let reads = [
        (1, Quantity::Voltage),
        (2, Quantity::Current),
        (3, Quantity::Temperature),
        (4, Quantity::Status),
        (5, Quantity::CurrentCapability),
    ];
    for (step, quantity) in reads {
        info!("[{}] Requesting {:?}", step, quantity);
        match client.read(quantity).await {
            Ok(m) => {
                log_measurement(&m);
                report.record(&m);
            }
            Err(LinkError::Timeout(ms)) => warn!("[{}] No response within {}ms", step, ms),
            Err(e) => return Err(e.into()),
        }
    }

    info!("[6] Setting voltage to {} V", config.test_voltage);
    client.set_voltage(config.test_voltage).await?;

    info!("[7] Setting current to {} A", config.test_current);
    client.set_current(config.test_current).await?;

    info!("[8] Switching modes");
    for mode in [Mode::Low, Mode::High, Mode::Auto] {
        match client.set_mode(mode).await {
            Ok(()) => {
                info!("Mode set to {:?}", mode);
                report.auto_mode |= mode == Mode::Auto;
            }
            Err(LinkError::Unsupported { .. }) => {
                warn!("{:?} mode not supported by {}", mode, client.protocol());
            }
            Err(e) => return Err(e.into()),
        }
        tokio::time::sleep(config.settle()).await;
    }

    info!("[9] Cycling output power");
    client.enable().await?;
    info!("Output enabled");
    tokio::time::sleep(config.settle()).await;
    client.disable().await?;
    info!("Output disabled");
    tokio::time::sleep(config.settle()).await;

    Ok(report)
}

fn log_measurement(m: &Measurement) {
    info!("  Address: {}", m.address());
    if let Some(v) = m.voltage() {
        info!("  Voltage: {} V", v);
    }
    if let Some(a) = m.current() {
        info!("  Current: {} A", a);
    }
    if let Some(t) = m.temperature() {
        info!("  Temperature: {} °C", t);
    }
    if let Some(s) = m.status() {
        info!("  Status: 0x{:X}", s);
    }
    if let Some(c) = m.current_capability() {
        info!("  Current capability: {} A", c);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use charger_codec::Protocol;
    use charger_link::{SimulatedModule, STATUS_OUTPUT_OFF};

    fn probe_config(protocol: Protocol) -> ProbeConfig {
        ProbeConfig {
            link: LinkConfig {
                protocol,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn client(config: &ProbeConfig) -> ModuleClient<SimulatedModule> {
        let bus = SimulatedModule::new(config.link.protocol).with_module(config.link.address);
        ModuleClient::from_config(bus, &config.link)
    }

    #[tokio::test(start_paused = true)]
    async fn test_uugreen_probe() {
        let config = probe_config(Protocol::UUgreen);
        let mut client = client(&config);
        let report = run_probe(&mut client, &config).await.unwrap();

        assert_eq!(report.voltage, Some(0.0));
        assert_eq!(report.temperature, Some(25));
        assert_eq!(report.status, Some(STATUS_OUTPUT_OFF));
        assert_eq!(report.current_capability, Some(100.0));
        assert!(!report.auto_mode);

        let state = client.bus().state(1).unwrap();
        assert_eq!(state.voltage_setpoint, 350.0);
        assert_eq!(state.current_setpoint, 10.5);
        assert_eq!(state.mode, Mode::High);
        assert!(!state.enabled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mmeet_probe_reaches_auto_mode() {
        let config = probe_config(Protocol::MMeet);
        let mut client = client(&config);
        let report = run_probe(&mut client, &config).await.unwrap();

        assert!(report.auto_mode);
        assert_eq!(client.bus().state(1).unwrap().mode, Mode::Auto);
        // 5 reads, 2 setpoints, 3 modes, enable, disable
        assert_eq!(client.bus().sent().len(), 12);
    }

    #[tokio::test(start_paused = true)]
    async fn test_silent_module_still_completes() {
        let config = probe_config(Protocol::MMeet);
        let mut client = ModuleClient::from_config(SimulatedModule::new(Protocol::MMeet), &config.link);
        let report = run_probe(&mut client, &config).await.unwrap();
        assert_eq!(report.voltage, None);
        assert_eq!(report.status, None);
    }

    #[test]
    fn test_default_probe_config() {
        let config = ProbeConfig::default();
        assert_eq!(config.test_voltage, 350.0);
        assert_eq!(config.test_current, 10.5);
        assert_eq!(config.link.address, 1);
    }

    #[test]
    fn test_nested_link_section() {
        let toml = "test_voltage = 400.0\n[link]\nprotocol = \"mmeet\"\naddress = 7\n";
        let config: ProbeConfig = Config::builder()
            .add_source(File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(config.test_voltage, 400.0);
        assert_eq!(config.test_current, 10.5);
        assert_eq!(config.link.protocol, Protocol::MMeet);
        assert_eq!(config.link.address, 7);
    }

    #[test]
    fn test_bad_log_level() {
        assert!(matches!(init_logging("loud"), Err(ProbeError::Logging(_))));
    }
}
