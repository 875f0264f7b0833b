//! Mail message envelope and its mailbox wire format
//!
//! Layout inside a mailbox:
//!
//! | offset | size | field                        |
//! |--------|------|------------------------------|
//! | 0      | 1    | flags (type tag, ack bit)    |
//! | 1      | 2    | sender task ID, LE           |
//! | 3      | 1    | payload length               |
//! | 4      | 4    | postmark tick, LE            |
//! | 8      | len  | payload, elements LE         |

use crate::config::{CFG_MAIL_HEADER_LEN, CFG_MAIL_MSG_MAX_LEN};
use crate::error::{OsError, OsResult};
use crate::ipc::cbuf::OsCbuf;
use crate::types::{OsTaskId, OsTick};

/// Message flag bits
pub mod msg_flag {
    /// Bits holding the [`OsMsgType`](super::OsMsgType) tag
    pub const TYPE_MASK: u8 = 0x03;
    /// Sender waits for the receiver to read this message
    pub const REQUEST_ACK: u8 = 0x80;
}

/// Payload element type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum OsMsgType {
    String = 0,
    Uint8 = 1,
    Uint16 = 2,
    Uint32 = 3,
}

impl OsMsgType {
    /// Width of one payload element in bytes
    #[inline]
    pub const fn width(self) -> usize {
        match self {
            OsMsgType::String | OsMsgType::Uint8 => 1,
            OsMsgType::Uint16 => 2,
            OsMsgType::Uint32 => 4,
        }
    }

    #[inline]
    fn from_flags(flags: u8) -> Self {
        match flags & msg_flag::TYPE_MASK {
            0 => OsMsgType::String,
            1 => OsMsgType::Uint8,
            2 => OsMsgType::Uint16,
            _ => OsMsgType::Uint32,
        }
    }
}

/// A mail message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OsMsg {
    flags: u8,
    from: OsTaskId,
    len: u8,
    postmark: OsTick,
    data: [u8; CFG_MAIL_MSG_MAX_LEN],
}

impl OsMsg {
    /// Empty string message
    pub const fn empty() -> Self {
        OsMsg {
            flags: OsMsgType::String as u8,
            from: 0,
            len: 0,
            postmark: 0,
            data: [0; CFG_MAIL_MSG_MAX_LEN],
        }
    }

    fn with_bytes(kind: OsMsgType, bytes: &[u8]) -> OsResult<Self> {
        if bytes.len() > CFG_MAIL_MSG_MAX_LEN {
            return Err(OsError::MsgTooLong);
        }
        let mut msg = Self::empty();
        msg.flags = kind as u8;
        msg.len = bytes.len() as u8;
        msg.data[..bytes.len()].copy_from_slice(bytes);
        Ok(msg)
    }

    /// Text payload (raw bytes, no terminator)
    pub fn string(text: &[u8]) -> OsResult<Self> {
        Self::with_bytes(OsMsgType::String, text)
    }

    /// Array of u8 values
    pub fn uint8(values: &[u8]) -> OsResult<Self> {
        Self::with_bytes(OsMsgType::Uint8, values)
    }

    /// Array of u16 values
    pub fn uint16(values: &[u16]) -> OsResult<Self> {
        if values.len() * 2 > CFG_MAIL_MSG_MAX_LEN {
            return Err(OsError::MsgTooLong);
        }
        let mut msg = Self::empty();
        msg.flags = OsMsgType::Uint16 as u8;
        for (i, v) in values.iter().enumerate() {
            msg.data[i * 2..i * 2 + 2].copy_from_slice(&v.to_le_bytes());
        }
        msg.len = (values.len() * 2) as u8;
        Ok(msg)
    }

    /// Array of u32 values
    pub fn uint32(values: &[u32]) -> OsResult<Self> {
        if values.len() * 4 > CFG_MAIL_MSG_MAX_LEN {
            return Err(OsError::MsgTooLong);
        }
        let mut msg = Self::empty();
        msg.flags = OsMsgType::Uint32 as u8;
        for (i, v) in values.iter().enumerate() {
            msg.data[i * 4..i * 4 + 4].copy_from_slice(&v.to_le_bytes());
        }
        msg.len = (values.len() * 4) as u8;
        Ok(msg)
    }

    /// Same message with the delivery confirmation bit set
    #[must_use]
    pub fn with_ack(mut self) -> Self {
        self.flags |= msg_flag::REQUEST_ACK;
        self
    }

    #[inline]
    pub fn requests_ack(&self) -> bool {
        self.flags & msg_flag::REQUEST_ACK != 0
    }

    #[inline]
    pub fn msg_type(&self) -> OsMsgType {
        OsMsgType::from_flags(self.flags)
    }

    #[inline]
    pub fn flags(&self) -> u8 {
        self.flags
    }

    /// ID of the sending task
    #[inline]
    pub fn from(&self) -> OsTaskId {
        self.from
    }

    /// Tick at which the message was sent
    #[inline]
    pub fn postmark(&self) -> OsTick {
        self.postmark
    }

    /// Payload length in bytes
    #[inline]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of payload elements of the declared type
    #[inline]
    pub fn count(&self) -> usize {
        self.len() / self.msg_type().width()
    }

    /// Raw payload bytes
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.data[..self.len()]
    }

    pub fn u8_at(&self, index: usize) -> Option<u8> {
        self.payload().get(index).copied()
    }

    pub fn u16_at(&self, index: usize) -> Option<u16> {
        let raw = self.payload().get(index * 2..index * 2 + 2)?;
        Some(u16::from_le_bytes([raw[0], raw[1]]))
    }

    pub fn u32_at(&self, index: usize) -> Option<u32> {
        let raw = self.payload().get(index * 4..index * 4 + 4)?;
        Some(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
    }

    /// Bytes this message occupies inside a mailbox
    #[inline]
    pub fn wire_len(&self) -> usize {
        CFG_MAIL_HEADER_LEN + self.len()
    }

    pub(crate) fn stamp(&mut self, from: OsTaskId, postmark: OsTick) {
        self.from = from;
        self.postmark = postmark;
    }

    /// Serialize into `cb`; writes the whole message or nothing
    pub fn encode_into<const N: usize>(&self, cb: &mut OsCbuf<N>) -> OsResult<()> {
        let mut wire = [0u8; CFG_MAIL_HEADER_LEN + CFG_MAIL_MSG_MAX_LEN];
        wire[0] = self.flags;
        wire[1..3].copy_from_slice(&self.from.to_le_bytes());
        wire[3] = self.len;
        wire[4..8].copy_from_slice(&self.postmark.to_le_bytes());
        wire[CFG_MAIL_HEADER_LEN..self.wire_len()].copy_from_slice(self.payload());

        cb.write(&wire[..self.wire_len()])
            .map_err(|_| OsError::MailboxFull)
    }

    /// Deserialize the oldest message in `cb`
    pub fn decode_from<const N: usize>(cb: &mut OsCbuf<N>) -> OsResult<Self> {
        let len = cb.peek_u8(3).ok_or(OsError::CommEmpty)? as usize;
        if len > CFG_MAIL_MSG_MAX_LEN {
            return Err(OsError::MsgTooLong);
        }
        if !cb.has_at_least(CFG_MAIL_HEADER_LEN + len) {
            return Err(OsError::CommEmpty);
        }

        let mut msg = Self::empty();
        msg.flags = cb.read_u8()?;
        msg.from = cb.read_u16()?;
        msg.len = cb.read_u8()?;
        msg.postmark = cb.read_u32()?;
        cb.read(&mut msg.data[..len])?;

        if len % msg.msg_type().width() != 0 {
            return Err(OsError::MsgType);
        }
        Ok(msg)
    }
}

impl Default for OsMsg {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_constructors() {
        let m = OsMsg::uint16(&[0x1234, 0xBEEF]).unwrap();
        assert_eq!(m.msg_type(), OsMsgType::Uint16);
        assert_eq!(m.len(), 4);
        assert_eq!(m.count(), 2);
        assert_eq!(m.u16_at(1), Some(0xBEEF));
        assert_eq!(m.u16_at(2), None);

        let m = OsMsg::uint32(&[1, 2, 3, 4]).unwrap();
        assert_eq!(m.count(), 4);
        assert_eq!(m.u32_at(3), Some(4));
    }

    #[test]
    fn test_payload_limit() {
        assert_eq!(OsMsg::string(&[b'x'; 17]), Err(OsError::MsgTooLong));
        assert_eq!(OsMsg::uint32(&[0; 5]), Err(OsError::MsgTooLong));
        assert!(OsMsg::uint8(&[0; 16]).is_ok());
    }

    #[test]
    fn test_wire_layout() {
        let mut m = OsMsg::uint8(&[5]).unwrap().with_ack();
        m.stamp(0x0102, 0xAABB_CCDD);

        let mut cb = OsCbuf::<32>::new();
        m.encode_into(&mut cb).unwrap();
        assert_eq!(cb.len(), 9);

        let expect = [0x81, 0x02, 0x01, 0x01, 0xDD, 0xCC, 0xBB, 0xAA, 0x05];
        for (i, b) in expect.iter().enumerate() {
            assert_eq!(cb.peek_u8(i), Some(*b));
        }

        let back = OsMsg::decode_from(&mut cb).unwrap();
        assert_eq!(back, m);
        assert!(back.requests_ack());
        assert!(cb.is_empty());
    }

    #[test]
    fn test_encode_refuses_partial_write() {
        let m = OsMsg::string(b"hello world").unwrap();
        let mut cb = OsCbuf::<16>::new();
        assert_eq!(m.encode_into(&mut cb), Err(OsError::MailboxFull));
        assert!(cb.is_empty());
    }

    #[test]
    fn test_decode_empty() {
        let mut cb = OsCbuf::<16>::new();
        assert_eq!(OsMsg::decode_from(&mut cb), Err(OsError::CommEmpty));
    }
}
