//! Charger Probe - Main Entry Point
//!
//! Usage: `charger-probe [config-file]`

use charger_link::{CanBus, LinkConfig, ModuleClient, SimulatedModule};
use charger_probe::{init_logging, run_probe, ProbeConfig};
use std::path::PathBuf;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args().nth(1).map(PathBuf::from);
    let config = ProbeConfig::load(path.as_deref())?;
    init_logging(&config.link.log_level)?;

    info!("=== Charger Probe v{} ===", env!("CARGO_PKG_VERSION"));
    info!("Protocol: {}", config.link.protocol);
    info!("Module address: {}", config.link.address);

    let bus = open_bus(&config.link)?;
    let mut client = ModuleClient::from_config(bus, &config.link);
    let report = run_probe(&mut client, &config).await?;

    info!("Report: {}", serde_json::to_string(&report)?);
    info!("Probe completed successfully");
    Ok(())
}

fn open_bus(link: &LinkConfig) -> Result<Box<dyn CanBus>, Box<dyn std::error::Error>> {
    if link.simulate {
        info!("Using simulated module");
        return Ok(Box::new(
            SimulatedModule::new(link.protocol).with_module(link.address),
        ));
    }

    open_socket(&link.interface)
}

#[cfg(all(target_os = "linux", feature = "socketcan"))]
fn open_socket(interface: &str) -> Result<Box<dyn CanBus>, Box<dyn std::error::Error>> {
    let bus = charger_link::SocketCanBus::open(interface)?;
    info!("CAN interface opened: {}", bus.interface());
    Ok(Box::new(bus))
}

#[cfg(not(all(target_os = "linux", feature = "socketcan")))]
fn open_socket(interface: &str) -> Result<Box<dyn CanBus>, Box<dyn std::error::Error>> {
    Err(format!(
        "cannot open {}: built without SocketCAN support, set simulate = true",
        interface
    )
    .into())
}
