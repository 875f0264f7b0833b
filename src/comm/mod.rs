//! Byte stream communication
//!
//! An [`OsComm`] pairs an input and an output byte stream. Interrupt
//! handlers (or host code) fill the input and drain the output; tasks do
//! the reverse. Every buffer access runs inside a critical section.
//!
//! A stream also carries a busy flag. Whoever moves a batch of bytes
//! claims it first, so batches from different producers or consumers
//! never interleave. The child task helpers below claim a stream only once
//! the whole batch fits (output) or has arrived (input), and release it
//! before they next suspend.

use core::cell::{Cell, RefCell};

use critical_section::Mutex;
use portable_atomic::{AtomicBool, Ordering};

use crate::config::CFG_COMM_BUF_SIZE;
use crate::error::OsResult;
use crate::ipc::OsCbuf;
use crate::pt::OsTaskContext;
use crate::task::child::OsChildCx;
use crate::types::{OsFlow, OsResume, OS_CONTINUE, OS_RESUME_BEGIN};

/// Destination of [`os_comm_get_u8`]
pub type OsCommByte = Mutex<Cell<u8>>;

/// Destination of [`os_comm_get_bytes`], filled completely
pub type OsCommBuf<const N: usize> = Mutex<RefCell<[u8; N]>>;

/// Interrupt-safe byte ring with a claim flag
pub struct OsCommStream {
    buf: Mutex<RefCell<OsCbuf<CFG_COMM_BUF_SIZE>>>,
    busy: AtomicBool,
}

impl OsCommStream {
    pub const fn new() -> Self {
        OsCommStream {
            buf: Mutex::new(RefCell::new(OsCbuf::new())),
            busy: AtomicBool::new(false),
        }
    }

    // ============ Claim protocol ============

    /// Claim the stream; `false` if someone else holds it
    #[inline]
    pub fn try_claim(&self) -> bool {
        self.busy
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    #[inline]
    pub fn release(&self) {
        self.busy.store(false, Ordering::Release);
    }

    #[inline]
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Relaxed)
    }

    // ============ Data ============

    pub fn push(&self, byte: u8) -> OsResult<()> {
        critical_section::with(|cs| self.buf.borrow_ref_mut(cs).write_u8(byte))
    }

    /// Write all of `bytes` or nothing
    pub fn push_bytes(&self, bytes: &[u8]) -> OsResult<()> {
        critical_section::with(|cs| self.buf.borrow_ref_mut(cs).write(bytes))
    }

    pub fn pop(&self) -> Option<u8> {
        critical_section::with(|cs| self.buf.borrow_ref_mut(cs).read_u8().ok())
    }

    /// Move up to `out.len()` bytes into `out`, returning the count moved
    pub fn drain_into(&self, out: &mut [u8]) -> usize {
        critical_section::with(|cs| {
            let mut buf = self.buf.borrow_ref_mut(cs);
            let n = out.len().min(buf.len());
            match buf.read(&mut out[..n]) {
                Ok(()) => n,
                Err(_) => 0,
            }
        })
    }

    pub fn len(&self) -> usize {
        critical_section::with(|cs| self.buf.borrow_ref(cs).len())
    }

    /// Free space in bytes
    pub fn available(&self) -> usize {
        critical_section::with(|cs| self.buf.borrow_ref(cs).available())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.available() == 0
    }

    pub fn clear(&self) {
        critical_section::with(|cs| self.buf.borrow_ref_mut(cs).clear());
    }
}

impl Default for OsCommStream {
    fn default() -> Self {
        Self::new()
    }
}

/// Input and output streams of one communication channel
pub struct OsComm {
    pub input: OsCommStream,
    pub output: OsCommStream,
}

impl OsComm {
    pub const fn new() -> Self {
        OsComm {
            input: OsCommStream::new(),
            output: OsCommStream::new(),
        }
    }
}

impl Default for OsComm {
    fn default() -> Self {
        Self::new()
    }
}

// ============ Child task helpers ============

const SEND: OsResume = 1;
const RECV: OsResume = 1;

/// Longest rendering produced by the hex helpers ("0x" + 8 digits)
const HEX_MAX: usize = 10;

fn hex_digits(value: u32, digits: usize, out: &mut [u8; HEX_MAX]) -> &[u8] {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    out[0] = b'0';
    out[1] = b'x';
    for i in 0..digits {
        let shift = 4 * (digits - 1 - i);
        out[2 + i] = HEX[((value >> shift) & 0xF) as usize];
    }
    &out[..2 + digits]
}

/// Claim `stream` once `bytes` fit, write them and release it
fn put_batch(cx: &mut OsChildCx<'_>, stream: &OsCommStream, bytes: &[u8]) -> OsFlow {
    let ready = !cx.is_killed() && stream.available() >= bytes.len() && stream.try_claim();
    cx.wait_until(ready)?;
    let written = stream.push_bytes(bytes);
    stream.release();
    if written.is_err() {
        crate::warn!("comm output overrun");
    }
    OS_CONTINUE
}

/// Claim `stream` once `out.len()` bytes are pending, read them and release it
fn get_batch(cx: &mut OsChildCx<'_>, stream: &OsCommStream, out: &mut [u8]) -> OsFlow {
    let ready = !cx.is_killed() && stream.len() >= out.len() && stream.try_claim();
    cx.wait_until(ready)?;
    let read = stream.drain_into(out);
    stream.release();
    if read != out.len() {
        crate::warn!("comm input underrun");
    }
    OS_CONTINUE
}

/// Child task: write one byte to `stream`
pub fn os_comm_put_u8(cx: &mut OsChildCx<'_>, (stream, byte): (&'static OsCommStream, u8)) -> OsFlow {
    put_batch(cx, stream, &[byte])
}

/// Child task: write `bytes` to `stream`.
///
/// Slices longer than the stream capacity go out in capacity-sized
/// batches; `locals()[0]` tracks how much was sent.
pub fn os_comm_put_bytes(
    cx: &mut OsChildCx<'_>,
    (stream, bytes): (&'static OsCommStream, &'static [u8]),
) -> OsFlow {
    loop {
        match cx.resume_point() {
            OS_RESUME_BEGIN => {
                cx.locals()[0] = 0;
                cx.goto(SEND);
            }
            SEND => {
                let sent = cx.locals()[0] as usize;
                if sent >= bytes.len() {
                    return OS_CONTINUE;
                }
                let end = bytes.len().min(sent + CFG_COMM_BUF_SIZE);
                put_batch(cx, stream, &bytes[sent..end])?;
                cx.locals()[0] = end as u32;
            }
            _ => return OS_CONTINUE,
        }
    }
}

/// Child task: write `value` as "0xHH"
pub fn os_comm_put_hex_u8(
    cx: &mut OsChildCx<'_>,
    (stream, value): (&'static OsCommStream, u8),
) -> OsFlow {
    let mut text = [0; HEX_MAX];
    put_batch(cx, stream, hex_digits(value as u32, 2, &mut text))
}

/// Child task: write `value` as "0xHHHHHHHH"
pub fn os_comm_put_hex_u32(
    cx: &mut OsChildCx<'_>,
    (stream, value): (&'static OsCommStream, u32),
) -> OsFlow {
    let mut text = [0; HEX_MAX];
    put_batch(cx, stream, hex_digits(value, 8, &mut text))
}

/// Child task: read one byte from `stream` into `out`
pub fn os_comm_get_u8(
    cx: &mut OsChildCx<'_>,
    (stream, out): (&'static OsCommStream, &'static OsCommByte),
) -> OsFlow {
    let mut byte = [0u8; 1];
    get_batch(cx, stream, &mut byte)?;
    critical_section::with(|cs| out.borrow(cs).set(byte[0]));
    OS_CONTINUE
}

/// Child task: read exactly `N` bytes from `stream` into `out`.
///
/// Buffers longer than the stream capacity are filled in capacity-sized
/// batches; `locals()[0]` tracks how much was received.
pub fn os_comm_get_bytes<const N: usize>(
    cx: &mut OsChildCx<'_>,
    (stream, out): (&'static OsCommStream, &'static OsCommBuf<N>),
) -> OsFlow {
    loop {
        match cx.resume_point() {
            OS_RESUME_BEGIN => {
                cx.locals()[0] = 0;
                cx.goto(RECV);
            }
            RECV => {
                let got = cx.locals()[0] as usize;
                if got >= N {
                    return OS_CONTINUE;
                }
                let end = N.min(got + CFG_COMM_BUF_SIZE);
                let mut chunk = [0u8; CFG_COMM_BUF_SIZE];
                let chunk = &mut chunk[..end - got];
                get_batch(cx, stream, chunk)?;
                critical_section::with(|cs| {
                    out.borrow_ref_mut(cs)[got..end].copy_from_slice(&*chunk);
                });
                cx.locals()[0] = end as u32;
            }
            _ => return OS_CONTINUE,
        }
    }
}

/// Child task: discard input from `stream` up to and including `byte`
pub fn os_comm_wait_byte(
    cx: &mut OsChildCx<'_>,
    (stream, byte): (&'static OsCommStream, u8),
) -> OsFlow {
    loop {
        let mut next = [0u8; 1];
        get_batch(cx, stream, &mut next)?;
        if next[0] == byte {
            return OS_CONTINUE;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_digits() {
        let mut out = [0; HEX_MAX];
        assert_eq!(hex_digits(0x3C, 2, &mut out), b"0x3C");
        assert_eq!(hex_digits(0xDEAD_BEEF, 8, &mut out), b"0xDEADBEEF");
    }

    #[test]
    fn test_claim_protocol() {
        let stream = OsCommStream::new();
        assert!(stream.try_claim());
        assert!(stream.is_busy());
        assert!(!stream.try_claim());
        stream.release();
        assert!(stream.try_claim());
    }

    #[test]
    fn test_stream_fifo() {
        let stream = OsCommStream::new();
        stream.push_bytes(b"abc").unwrap();
        stream.push(b'd').unwrap();
        assert_eq!(stream.len(), 4);
        assert_eq!(stream.pop(), Some(b'a'));

        let mut out = [0u8; 8];
        assert_eq!(stream.drain_into(&mut out), 3);
        assert_eq!(&out[..3], b"bcd");
        assert!(stream.is_empty());
        assert_eq!(stream.available(), CFG_COMM_BUF_SIZE);
    }
}
