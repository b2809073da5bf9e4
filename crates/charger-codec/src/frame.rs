//! CAN Frame Definition
//!
//! Fixed-layout transport unit shared by every protocol: a 32-bit identifier
//! in SocketCAN format, a length code and 8 data bytes.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CodecError;

/// Data length used by every frame of this codec family
pub const FRAME_DLC: u8 = 8;

/// Extended frame format flag (SocketCAN `CAN_EFF_FLAG`)
pub const EFF_FLAG: u32 = 0x8000_0000;

/// Mask selecting the 29-bit arbitration id
pub const EFF_MASK: u32 = 0x1FFF_FFFF;

/// Raw CAN frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "RawFrame")]
pub struct CanFrame {
    can_id: u32,
    dlc: u8,
    data: [u8; 8],
}

/// Unchecked serialized form of [`CanFrame`]
#[derive(Deserialize)]
struct RawFrame {
    can_id: u32,
    dlc: u8,
    data: [u8; 8],
}

impl TryFrom<RawFrame> for CanFrame {
    type Error = CodecError;

    fn try_from(raw: RawFrame) -> Result<Self, Self::Error> {
        if raw.dlc > FRAME_DLC {
            return Err(CodecError::InvalidLength(raw.dlc));
        }
        Ok(Self::with_dlc(raw.can_id, raw.dlc, &raw.data))
    }
}

impl CanFrame {
    /// Create a full-length frame
    pub fn new(can_id: u32, data: [u8; 8]) -> Self {
        Self {
            can_id,
            dlc: FRAME_DLC,
            data,
        }
    }

    /// Create a frame with an explicit length code, as delivered by a transport.
    ///
    /// Bytes past `dlc` are zeroed; `dlc` itself is clamped to 8.
    pub fn with_dlc(can_id: u32, dlc: u8, data: &[u8]) -> Self {
        let dlc = dlc.min(FRAME_DLC);
        let mut payload = [0u8; 8];
        let len = data.len().min(dlc as usize);
        payload[..len].copy_from_slice(&data[..len]);
        Self {
            can_id,
            dlc,
            data: payload,
        }
    }

    /// Identifier including SocketCAN flag bits
    pub fn can_id(&self) -> u32 {
        self.can_id
    }

    /// Arbitration id with the flag bits stripped
    pub fn raw_id(&self) -> u32 {
        self.can_id & EFF_MASK
    }

    /// Whether the extended format flag is set
    pub fn is_extended(&self) -> bool {
        self.can_id & EFF_FLAG != 0
    }

    /// Data length code
    pub fn dlc(&self) -> u8 {
        self.dlc
    }

    /// All 8 payload bytes
    pub fn data(&self) -> &[u8; 8] {
        &self.data
    }

    /// Big-endian `u32` starting at `offset`, `None` past byte 4
    pub fn read_u32(&self, offset: usize) -> Option<u32> {
        let bytes = self.data.get(offset..offset.checked_add(4)?)?;
        Some(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Big-endian `u16` starting at `offset`, `None` past byte 6
    pub fn read_u16(&self, offset: usize) -> Option<u16> {
        let bytes = self.data.get(offset..offset.checked_add(2)?)?;
        Some(u16::from_be_bytes([bytes[0], bytes[1]]))
    }
}

impl fmt::Display for CanFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ID=0x{:08X}, DLC={}, DATA=[", self.can_id, self.dlc)?;
        let len = usize::from(self.dlc.min(FRAME_DLC));
        for (i, byte) in self.data[..len].iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{:02X}", byte)?;
        }
        f.write_str("]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_frame_is_full_length() {
        let frame = CanFrame::new(0x8220_4000, [0x12, 0x62, 0, 0, 0, 0, 0, 0]);
        assert_eq!(frame.dlc(), FRAME_DLC);
        assert!(frame.is_extended());
        assert_eq!(frame.raw_id(), 0x0220_4000);
    }

    #[test]
    fn test_with_dlc_truncates_payload() {
        let frame = CanFrame::with_dlc(0x123, 3, &[1, 2, 3, 4, 5]);
        assert_eq!(frame.dlc(), 3);
        assert_eq!(frame.data(), &[1, 2, 3, 0, 0, 0, 0, 0]);
        assert!(!frame.is_extended());
    }

    #[test]
    fn test_with_dlc_clamps_length() {
        let frame = CanFrame::with_dlc(0x123, 15, &[0xFF; 8]);
        assert_eq!(frame.dlc(), 8);
    }

    #[test]
    fn test_read_big_endian() {
        let frame = CanFrame::new(0, [0x01, 0xF0, 0x02, 0x31, 0x00, 0x01, 0xE2, 0x40]);
        assert_eq!(frame.read_u16(2), Some(0x0231));
        assert_eq!(frame.read_u32(4), Some(123_456));
    }

    #[test]
    fn test_read_past_end() {
        let frame = CanFrame::new(0, [0xFF; 8]);
        assert_eq!(frame.read_u32(5), None);
        assert_eq!(frame.read_u16(7), None);
        assert_eq!(frame.read_u32(usize::MAX), None);
        assert_eq!(frame.read_u16(6), Some(0xFFFF));
    }

    #[test]
    fn test_deserialize_rejects_long_dlc() {
        let json = r#"{"can_id":0,"dlc":12,"data":[0,0,0,0,0,0,0,0]}"#;
        let err = serde_json::from_str::<CanFrame>(json).unwrap_err();
        assert!(err.to_string().contains("Invalid frame length: 12"));
    }

    #[test]
    fn test_deserialize_zeroes_bytes_past_dlc() {
        let json = r#"{"can_id":2147483649,"dlc":2,"data":[171,1,9,9,9,9,9,9]}"#;
        let frame: CanFrame = serde_json::from_str(json).unwrap();
        assert_eq!(frame, CanFrame::with_dlc(0x8000_0001, 2, &[0xAB, 0x01]));
        assert_eq!(frame.to_string(), "ID=0x80000001, DLC=2, DATA=[AB 01]");
    }

    #[test]
    fn test_serde_round_trip() {
        let frame = CanFrame::new(0x8220_4000, [0x12, 0x62, 0, 0, 0, 0, 0x03, 0xE8]);
        let json = serde_json::to_string(&frame).unwrap();
        assert_eq!(serde_json::from_str::<CanFrame>(&json).unwrap(), frame);
    }

    #[test]
    fn test_display() {
        let frame = CanFrame::with_dlc(0x8000_0001, 2, &[0xAB, 0x01]);
        assert_eq!(frame.to_string(), "ID=0x80000001, DLC=2, DATA=[AB 01]");
    }
}
