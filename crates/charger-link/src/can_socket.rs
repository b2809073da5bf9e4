//! Linux SocketCAN transport

use async_trait::async_trait;
use charger_codec::{CanFrame, EFF_FLAG};
use socketcan::{EmbeddedFrame, ExtendedId, Id, StandardId};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, trace};

use crate::bus::CanBus;
use crate::error::LinkError;

/// [`CanBus`] over a raw SocketCAN interface
pub struct SocketCanBus {
    interface: String,
    socket: socketcan::tokio::CanSocket,
}

impl SocketCanBus {
    /// Open `interface` (e.g., "can0")
    pub fn open(interface: &str) -> Result<Self, LinkError> {
        info!("Opening CAN interface: {}", interface);
        let socket = socketcan::tokio::CanSocket::open(interface)?;
        Ok(Self {
            interface: interface.to_string(),
            socket,
        })
    }

    /// Interface name
    pub fn interface(&self) -> &str {
        &self.interface
    }
}

fn to_socketcan(frame: &CanFrame) -> Result<socketcan::CanFrame, LinkError> {
    let id: Id = if frame.is_extended() {
        ExtendedId::new(frame.raw_id())
            .map(Id::Extended)
            .ok_or_else(|| LinkError::Bus(format!("invalid extended id 0x{:08X}", frame.raw_id())))?
    } else {
        u16::try_from(frame.raw_id())
            .ok()
            .and_then(StandardId::new)
            .map(Id::Standard)
            .ok_or_else(|| LinkError::Bus(format!("invalid standard id 0x{:X}", frame.raw_id())))?
    };
    let len = usize::from(frame.dlc());
    <socketcan::CanFrame as EmbeddedFrame>::new(id, &frame.data()[..len])
        .ok_or_else(|| LinkError::Bus("frame payload too long".to_string()))
}

fn from_socketcan(frame: &socketcan::CanDataFrame) -> CanFrame {
    let raw = socketcan::Frame::raw_id(frame);
    let can_id = if EmbeddedFrame::is_extended(frame) {
        raw | EFF_FLAG
    } else {
        raw
    };
    let data = EmbeddedFrame::data(frame);
    CanFrame::with_dlc(can_id, data.len() as u8, data)
}

#[async_trait]
impl CanBus for SocketCanBus {
    async fn send(&mut self, frame: &CanFrame) -> Result<(), LinkError> {
        trace!("TX {}: {}", self.interface, frame);
        let out = to_socketcan(frame)?;
        self.socket.write_frame(out).await?;
        Ok(())
    }

    async fn receive(&mut self, wait: Duration) -> Result<Option<CanFrame>, LinkError> {
        let read = async {
            loop {
                match self.socket.read_frame().await? {
                    socketcan::CanFrame::Data(frame) => return Ok::<_, LinkError>(from_socketcan(&frame)),
                    other => debug!("Dropping non-data frame on {}: {:?}", self.interface, other),
                }
            }
        };
        match timeout(wait, read).await {
            Ok(frame) => {
                let frame = frame?;
                trace!("RX {}: {}", self.interface, frame);
                Ok(Some(frame))
            }
            Err(_) => Ok(None),
        }
    }
}
