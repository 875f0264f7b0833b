//! Fixed-capacity byte ring buffer
//!
//! Backs both the task mailboxes and the comm byte streams. The buffer
//! keeps an explicit occupancy count so the full capacity is usable.

use crate::error::{OsError, OsResult};

/// Byte ring buffer with `N` bytes of storage
#[derive(Clone, Copy)]
pub struct OsCbuf<const N: usize> {
    buf: [u8; N],
    /// Read cursor
    head: usize,
    /// Write cursor
    tail: usize,
    /// Occupied bytes
    len: usize,
}

impl<const N: usize> OsCbuf<N> {
    /// Create an empty buffer
    pub const fn new() -> Self {
        Self {
            buf: [0; N],
            head: 0,
            tail: 0,
            len: 0,
        }
    }

    /// Total capacity in bytes
    #[inline(always)]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Number of occupied bytes
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Number of free bytes
    #[inline(always)]
    pub fn available(&self) -> usize {
        N - self.len
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline(always)]
    pub fn is_full(&self) -> bool {
        self.len == N
    }

    /// Check whether at least `n` bytes can be read
    #[inline]
    pub fn has_at_least(&self, n: usize) -> bool {
        self.len >= n
    }

    /// Discard all contents
    pub fn clear(&mut self) {
        self.head = 0;
        self.tail = 0;
        self.len = 0;
    }

    /// Append one byte
    pub fn write_u8(&mut self, byte: u8) -> OsResult<()> {
        if self.is_full() {
            return Err(OsError::CommFull);
        }
        self.buf[self.tail] = byte;
        self.tail = (self.tail + 1) % N;
        self.len += 1;
        Ok(())
    }

    /// Append `bytes` entirely, or nothing at all
    pub fn write(&mut self, bytes: &[u8]) -> OsResult<()> {
        if bytes.len() > self.available() {
            return Err(OsError::CommFull);
        }
        for &b in bytes {
            self.buf[self.tail] = b;
            self.tail = (self.tail + 1) % N;
        }
        self.len += bytes.len();
        Ok(())
    }

    /// Append a little-endian u16
    pub fn write_u16(&mut self, value: u16) -> OsResult<()> {
        self.write(&value.to_le_bytes())
    }

    /// Append a little-endian u32
    pub fn write_u32(&mut self, value: u32) -> OsResult<()> {
        self.write(&value.to_le_bytes())
    }

    /// Remove and return the oldest byte
    pub fn read_u8(&mut self) -> OsResult<u8> {
        if self.is_empty() {
            return Err(OsError::CommEmpty);
        }
        let byte = self.buf[self.head];
        self.head = (self.head + 1) % N;
        self.len -= 1;
        Ok(byte)
    }

    /// Fill `out` entirely, or consume nothing
    pub fn read(&mut self, out: &mut [u8]) -> OsResult<()> {
        if out.len() > self.len {
            return Err(OsError::CommEmpty);
        }
        for slot in out.iter_mut() {
            *slot = self.buf[self.head];
            self.head = (self.head + 1) % N;
        }
        self.len -= out.len();
        Ok(())
    }

    /// Remove a little-endian u16
    pub fn read_u16(&mut self) -> OsResult<u16> {
        let mut raw = [0u8; 2];
        self.read(&mut raw)?;
        Ok(u16::from_le_bytes(raw))
    }

    /// Remove a little-endian u32
    pub fn read_u32(&mut self) -> OsResult<u32> {
        let mut raw = [0u8; 4];
        self.read(&mut raw)?;
        Ok(u32::from_le_bytes(raw))
    }

    /// Look at the byte `offset` positions past the read cursor
    pub fn peek_u8(&self, offset: usize) -> Option<u8> {
        if offset >= self.len {
            return None;
        }
        Some(self.buf[(self.head + offset) % N])
    }
}

impl<const N: usize> Default for OsCbuf<N> {
    fn default() -> Self {
        Self::new()
    }
}
