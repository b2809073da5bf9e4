//! Charger CAN Codec
//!
//! Encodes request and control frames for power conversion modules and
//! decodes their responses. Supports the UUgreen and MMeet vendor protocols.
//! The codec performs no I/O; frames are handed to an external transport.

mod dispatcher;
mod error;
mod frame;
pub mod generator;
mod measurement;
mod parser;
mod protocol;

pub use dispatcher::ProtocolDispatcher;
pub use error::CodecError;
pub use frame::{CanFrame, EFF_FLAG, EFF_MASK, FRAME_DLC};
pub use generator::{generator_for, FrameGenerator, MMeet, UUgreen};
pub use measurement::{Fields, Measurement};
pub use parser::{parse, ParseOutcome, ParseStatus, VALUE_OFFSET};
pub use protocol::{IdLayout, Mode, Protocol, Quantity, WireScale, ADDRESS_MASK};
