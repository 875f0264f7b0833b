//! Error types for ESOS
//!
//! Every recoverable condition is reported as a value; the kernel never
//! panics on pool exhaustion.

/// Kernel error type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u16)]
pub enum OsError {
    /// No error
    None = 0,

    // ============ Kernel state errors ============
    /// Kernel not initialized
    OsNotInit = 24203,
    /// Kernel is already running
    OsRunning = 24202,
    /// User init registered no task
    OsNoAppTask = 24204,

    // ============ Task errors ============
    /// No more TCBs available
    TaskNoMoreTcb = 29008,
    /// Task does not exist
    TaskNotExist = 29010,
    /// All 16-bit task IDs have been handed out
    TaskIdExhausted = 29013,

    // ============ Child task errors ============
    /// No free child task slot
    ChildNoMoreTcb = 29050,
    /// Child handle does not refer to an allocated slot
    ChildInvalid = 29051,

    // ============ Mail errors ============
    /// Target mailbox lacks room for the whole message
    MailboxFull = 26001,
    /// Payload exceeds the maximum message length
    MsgTooLong = 26005,
    /// Payload length does not match the message type
    MsgType = 26006,

    // ============ Semaphore errors ============
    /// Semaphore overflow
    SemOvf = 28101,

    // ============ Time errors ============
    /// Time component out of range
    TimeInvalid = 29311,

    // ============ Timer errors ============
    /// Timer is inactive
    TmrInactive = 29501,
    /// Invalid timer handle
    TmrInvalid = 29502,
    /// Invalid timer period
    TmrInvalidPeriod = 29504,
    /// Timer table full
    TmrNoMoreTimers = 29509,

    // ============ Comm errors ============
    /// Stream buffer full
    CommFull = 30001,
    /// Stream buffer empty
    CommEmpty = 30002,
}

/// Result type alias for kernel operations
pub type OsResult<T> = Result<T, OsError>;

impl OsError {
    #[inline]
    pub fn is_ok(self) -> bool {
        self == OsError::None
    }

    #[inline]
    pub fn is_err(self) -> bool {
        self != OsError::None
    }

    /// Numeric error code
    #[inline]
    pub fn code(self) -> u16 {
        self as u16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_is_ok() {
        assert!(OsError::None.is_ok());
        assert!(!OsError::None.is_err());
        assert!(OsError::MailboxFull.is_err());
    }

    #[test]
    fn test_codes_grouped() {
        assert_eq!(OsError::TaskNoMoreTcb.code(), 29008);
        assert!(OsError::TmrInactive.code() / 100 == OsError::TmrNoMoreTimers.code() / 100);
    }
}
