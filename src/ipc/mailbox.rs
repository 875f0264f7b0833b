//! Per-task mailbox

use crate::config::CFG_MAILBOX_SIZE;
use crate::error::OsResult;
use crate::ipc::cbuf::OsCbuf;
use crate::ipc::msg::OsMsg;

/// Fixed-capacity message queue owned by one TCB
#[derive(Clone, Copy)]
pub struct OsMailbox {
    buf: OsCbuf<CFG_MAILBOX_SIZE>,
}

impl OsMailbox {
    pub const fn new() -> Self {
        Self { buf: OsCbuf::new() }
    }

    /// Drop every pending message
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    #[inline]
    pub fn has_mail(&self) -> bool {
        !self.buf.is_empty()
    }

    /// Free bytes
    #[inline]
    pub fn available(&self) -> usize {
        self.buf.available()
    }

    /// Occupied bytes
    #[inline]
    pub fn occupied(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    /// Check whether at least `n` bytes are free
    #[inline]
    pub fn has_room(&self, n: usize) -> bool {
        self.buf.available() >= n
    }

    /// Check whether `msg` fits as a whole
    #[inline]
    pub fn has_room_for(&self, msg: &OsMsg) -> bool {
        self.has_room(msg.wire_len())
    }

    /// Enqueue a stamped message
    pub fn post(&mut self, msg: &OsMsg) -> OsResult<()> {
        msg.encode_into(&mut self.buf)
    }

    /// Dequeue the oldest message
    pub fn take(&mut self) -> Option<OsMsg> {
        if self.buf.is_empty() {
            return None;
        }
        match OsMsg::decode_from(&mut self.buf) {
            Ok(msg) => Some(msg),
            Err(_) => {
                crate::error!("mailbox corrupt, cleared");
                self.buf.clear();
                None
            }
        }
    }
}

impl Default for OsMailbox {
    fn default() -> Self {
        Self::new()
    }
}
