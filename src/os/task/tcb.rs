//! Task Control Block (TCB) definition
//!
//! The TCB holds everything the scheduler knows about a task. A child task
//! slot holds only the suspension state.

use crate::ipc::OsMailbox;
use crate::pt::OsPt;
use crate::task::OsTaskFn;
use crate::types::{flag, OsTaskId};

/// Task Control Block
#[derive(Clone, Copy)]
pub struct OsTcb {
    // ============ Identity ============
    /// Task entry point, also the name used for lookups
    pub(crate) entry: Option<OsTaskFn>,
    /// ID handed out at first registration
    pub(crate) id: OsTaskId,

    // ============ Execution state ============
    pub(crate) pt: OsPt,

    // ============ Mail ============
    pub(crate) mailbox: OsMailbox,
}

impl OsTcb {
    /// Create an unused TCB
    pub const fn new() -> Self {
        OsTcb {
            entry: None,
            id: 0,
            pt: OsPt::new(),
            mailbox: OsMailbox::new(),
        }
    }

    /// Check whether this TCB runs `entry`
    #[inline]
    pub(crate) fn runs(&self, entry: OsTaskFn) -> bool {
        match self.entry {
            Some(own) => own as usize == entry as usize,
            None => false,
        }
    }

    #[inline]
    pub fn id(&self) -> OsTaskId {
        self.id
    }

    #[inline]
    pub fn pt(&self) -> &OsPt {
        &self.pt
    }

    #[inline]
    pub fn mailbox(&self) -> &OsMailbox {
        &self.mailbox
    }

    /// Check if task is blocked in a wait primitive
    #[inline]
    pub fn is_waiting(&self) -> bool {
        self.pt.has(flag::WAITING)
    }

    #[inline]
    pub fn is_sleeping(&self) -> bool {
        self.pt.has(flag::SLEEPING)
    }

    #[inline]
    pub fn is_ended(&self) -> bool {
        self.pt.has(flag::ENDED)
    }

    /// Check if the slot is retired and awaiting compaction
    #[inline]
    pub fn is_removed(&self) -> bool {
        self.pt.has(flag::REMOVE)
    }
}

impl Default for OsTcb {
    fn default() -> Self {
        Self::new()
    }
}

/// Child task slot
#[derive(Debug, Clone, Copy)]
pub struct OsChildTcb {
    pub(crate) pt: OsPt,
}

impl OsChildTcb {
    pub const fn new() -> Self {
        OsChildTcb { pt: OsPt::new() }
    }

    /// Check if a parent currently owns this slot
    #[inline]
    pub fn is_allocated(&self) -> bool {
        self.pt.has(flag::ALLOCATED)
    }
}

impl Default for OsChildTcb {
    fn default() -> Self {
        Self::new()
    }
}
