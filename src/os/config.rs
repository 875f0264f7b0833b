//! Compile-time configuration for ESOS
//!
//! These constants control the resource limits of the kernel. Every pool
//! is sized here; nothing is allocated at runtime.

/// System tick rate in Hz
pub const CFG_TICK_RATE_HZ: u32 = 1000;

/// Maximum number of user tasks (TCB pool size)
pub const CFG_MAX_USER_TASKS: usize = 16;

/// Maximum number of child tasks that may be running at once
pub const CFG_MAX_CHILD_TASKS: usize = 8;

/// Number of software timer slots (bounded by the width of the active mask)
pub const CFG_MAX_TIMERS: usize = 16;

/// Words of persistent local storage per task and child task
pub const CFG_TASK_LOCALS: usize = 4;

/// Maximum payload length of a mail message in bytes
pub const CFG_MAIL_MSG_MAX_LEN: usize = 16;

/// Length of the serialized mail message header in bytes
pub const CFG_MAIL_HEADER_LEN: usize = 8;

/// Number of maximum-size messages a mailbox can hold
pub const CFG_MAILBOX_MSGS: usize = 4;

/// Mailbox capacity in bytes
pub const CFG_MAILBOX_SIZE: usize = CFG_MAILBOX_MSGS * (CFG_MAIL_HEADER_LEN + CFG_MAIL_MSG_MAX_LEN);

/// Capacity of each comm byte stream
pub const CFG_COMM_BUF_SIZE: usize = 64;

/// Initial seed of the kernel pseudo-random generator (must be non-zero)
pub const CFG_RAND_SEED: u32 = 0x1234_5678;

const _: () = assert!(CFG_MAX_TIMERS <= 32, "timer active mask is a u32");
const _: () = assert!(CFG_MAX_USER_TASKS <= u8::MAX as usize);
const _: () = assert!(CFG_MAX_CHILD_TASKS <= u8::MAX as usize);
const _: () = assert!(CFG_RAND_SEED != 0);
