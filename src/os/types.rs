//! Core type definitions for ESOS
//!
//! These types provide strong typing for kernel primitives.

use core::ops::ControlFlow;

use crate::config::CFG_TASK_LOCALS;

/// Tick counter type (1 tick = 1 ms, wraps after ~49.7 days)
pub type OsTick = u32;

/// Task identifier, unique for the lifetime of a kernel
pub type OsTaskId = u16;

/// Resume token recording where a suspended task continues
pub type OsResume = u16;

/// Task flag bits, see [`flag`]
pub type OsTaskFlags = u16;

/// Semaphore counter type
pub type OsSemCtr = i16;

/// Application flag word
pub type OsUserFlags = u16;

/// Persistent per-task scratch words
pub type OsTaskLocals = [u32; CFG_TASK_LOCALS];

/// Resume token of a task that has not run yet
pub const OS_RESUME_BEGIN: OsResume = 0;

/// Value reported by a task body to the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum OsTaskStatus {
    /// Task is blocked on a condition
    Waiting = 0,
    /// Task gave up the CPU voluntarily and runs again next round
    Yielded = 1,
    /// Task left early via `exit`
    Exited = 2,
    /// Task reached its end
    Ended = 3,
}

impl OsTaskStatus {
    /// Whether the scheduler must retire the task
    #[inline]
    pub fn is_finished(self) -> bool {
        matches!(self, OsTaskStatus::Exited | OsTaskStatus::Ended)
    }
}

/// Result of a task body or of a suspension primitive.
///
/// `Continue(())` from a primitive means "proceed past this point";
/// `Continue(())` from a task body means the body ran off its end.
pub type OsFlow = ControlFlow<OsTaskStatus>;

/// Proceed past a suspension point
pub const OS_CONTINUE: OsFlow = ControlFlow::Continue(());

/// Kernel lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum OsKernelState {
    /// Constructed, user init not run yet
    Initializing = 0,
    /// Scheduler rounds are executing
    Running = 1,
    /// Removing retired tasks after a round
    Compacting = 2,
}

// ============ Flag bits ============

/// Task flag bits
pub mod flag {
    use super::OsTaskFlags;

    /// Task is blocked in a wait primitive
    pub const WAITING: OsTaskFlags = 0x0001;
    /// Task sleeps until woken by another task
    pub const SLEEPING: OsTaskFlags = 0x0002;
    /// Task has finished
    pub const ENDED: OsTaskFlags = 0x0004;
    /// Task must end at its next suspension check
    pub const KILLED: OsTaskFlags = 0x0008;
    /// Task was invoked during the current round
    pub const CALLED: OsTaskFlags = 0x0010;
    /// Task mailbox holds at least one message
    pub const HAS_MAIL: OsTaskFlags = 0x0020;
    /// Task awaits delivery confirmation of a sent message
    pub const MAIL_NACK: OsTaskFlags = 0x0040;
    /// Slot is retired and removed at the end of the round
    pub const REMOVE: OsTaskFlags = 0x0080;
    /// Current suspension point has been entered and initialized
    pub const ARMED: OsTaskFlags = 0x0100;
    /// Child slot is owned by a parent
    pub const ALLOCATED: OsTaskFlags = 0x0200;
}
