//! ESOS cooperative kernel in Rust
//!
//! A small run-to-suspension kernel for microcontrollers providing:
//! - Stackless tasks that resume where they last suspended
//! - Round-robin cooperative scheduling with deferred pool compaction
//! - Per-task mailboxes with delivery confirmation
//! - Software timers, counting semaphores and child tasks
//! - Interrupt-safe byte streams for serial style I/O

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(unsafe_op_in_unsafe_fn)]

// ============ Critical Section ============

#[cfg(all(target_arch = "arm", not(feature = "std")))]
mod cs_impl {
    use cortex_m::interrupt;
    use cortex_m::register::primask;
    use critical_section::{set_impl, Impl, RawRestoreState};

    struct SingleCoreCriticalSection;
    set_impl!(SingleCoreCriticalSection);

    unsafe impl Impl for SingleCoreCriticalSection {
        unsafe fn acquire() -> RawRestoreState {
            let was_active = primask::read().is_active();
            interrupt::disable();
            was_active
        }

        unsafe fn release(was_active: RawRestoreState) {
            if was_active {
                unsafe { interrupt::enable() }
            }
        }
    }
}

// ============ Modules ============

pub mod log;
mod lang_items;

pub mod ipc;
pub mod os;
pub mod port;
pub mod sync;

#[cfg(feature = "comm")]
pub mod comm;

// ============ Re-exports ============

pub use os::config;
pub use os::config::*;
pub use os::error;
pub use os::error::{OsError, OsResult};
pub use os::kernel;
pub use os::kernel::{Kernel, OsUserInit};
pub use os::pt;
pub use os::pt::{OsPt, OsTaskContext};
pub use os::sched;
pub use os::task;
pub use os::task::child::{OsChildCx, OsChildFn, OsChildHandle};
pub use os::task::{OsTaskCx, OsTaskFn, OsTaskHandle};
pub use os::time;
pub use os::types;
pub use os::types::*;

pub use ipc::{OsMailbox, OsMsg, OsMsgType};
pub use port::{OsManualTick, OsTickSource};

#[cfg(feature = "sem")]
pub use sync::sem;
#[cfg(feature = "sem")]
pub use sync::sem::OsSem;

#[cfg(feature = "timer")]
pub use time::{OsTimerCx, OsTimerFn, OsTimerHandle};

#[cfg(feature = "comm")]
pub use comm::{OsComm, OsCommBuf, OsCommByte, OsCommStream};
