//! CAN Bus Abstraction
//!
//! Transport seam consumed by [`crate::ModuleClient`]. Implementations own
//! the physical (or simulated) bus; the codec never touches it.

use async_trait::async_trait;
use charger_codec::CanFrame;
use std::time::Duration;

use crate::error::LinkError;

/// Frame transport
#[async_trait]
pub trait CanBus: Send {
    /// Queue one frame for transmission
    async fn send(&mut self, frame: &CanFrame) -> Result<(), LinkError>;

    /// Wait up to `timeout` for the next frame, `None` when nothing arrives
    async fn receive(&mut self, timeout: Duration) -> Result<Option<CanFrame>, LinkError>;
}

#[async_trait]
impl<B: CanBus + ?Sized> CanBus for Box<B> {
    async fn send(&mut self, frame: &CanFrame) -> Result<(), LinkError> {
        (**self).send(frame).await
    }

    async fn receive(&mut self, timeout: Duration) -> Result<Option<CanFrame>, LinkError> {
        (**self).receive(timeout).await
    }
}
