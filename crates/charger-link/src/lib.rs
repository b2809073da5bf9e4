//! Charger Module Link
//!
//! Async request/response driver for charger power modules. A
//! [`ModuleClient`] pairs the frame codec with any [`CanBus`]: the
//! in-memory [`SimulatedModule`], or SocketCAN on Linux behind the
//! `socketcan` feature.

mod bus;
mod client;
mod config;
mod error;
mod simulated;

#[cfg(all(target_os = "linux", feature = "socketcan"))]
mod can_socket;

pub use bus::CanBus;
pub use client::ModuleClient;
pub use error::LinkError;
pub use self::config::{LinkConfig, ENV_PREFIX};
pub use simulated::{ModuleState, SimulatedModule, STATUS_OUTPUT_OFF};

#[cfg(all(target_os = "linux", feature = "socketcan"))]
pub use can_socket::SocketCanBus;
