//! Suspend/resume primitive
//!
//! A task is a plain function called again and again by the scheduler.
//! It carries no stack of its own; instead its [`OsPt`] records a resume
//! point, and the body dispatches on that point at entry:
//!
//! ```ignore
//! const SEND: OsResume = 1;
//! const PAUSE: OsResume = 2;
//!
//! fn pinger(cx: &mut OsTaskCx<'_>) -> OsFlow {
//!     loop {
//!         match cx.resume_point() {
//!             OS_RESUME_BEGIN => cx.goto(SEND),
//!             SEND => {
//!                 cx.wait_on_available_mailbox(peer, msg.len())?;
//!                 cx.send_mail(peer, &msg).ok();
//!                 cx.goto(PAUSE);
//!             }
//!             PAUSE => {
//!                 cx.wait_ticks(100)?;
//!                 cx.goto(SEND);
//!             }
//!             _ => return OS_CONTINUE,
//!         }
//!     }
//! }
//! ```
//!
//! Each match arm starts with at most one suspension primitive and ends by
//! moving to the next point with [`goto`](OsTaskContext::goto). A primitive
//! that cannot proceed returns `Break`, which `?` hands back to the
//! scheduler; on the next call the same arm runs again and re-evaluates
//! the primitive. Returning `Continue(())` from the body ends the task.

use core::ops::ControlFlow;

use crate::kernel::Kernel;
use crate::task::child::{OsChildCx, OsChildFn};
use crate::time::os_ticks_elapsed;
use crate::types::{
    flag, OsFlow, OsResume, OsTaskFlags, OsTaskLocals, OsTaskStatus, OsTick, OS_CONTINUE,
    OS_RESUME_BEGIN,
};

#[cfg(feature = "sem")]
use crate::sem::OsSem;
#[cfg(feature = "sem")]
use crate::types::OsSemCtr;

/// Suspension state shared by tasks and child tasks
#[derive(Debug, Clone, Copy)]
pub struct OsPt {
    pub(crate) resume: OsResume,
    pub(crate) flags: OsTaskFlags,
    /// Tick at which the current timed wait started
    pub(crate) wait_start: OsTick,
    /// Length of the current timed wait
    pub(crate) wait_ticks: OsTick,
    /// Child slot currently driven by this task
    pub(crate) child: Option<u8>,
    pub(crate) locals: OsTaskLocals,
}

impl OsPt {
    pub const fn new() -> Self {
        OsPt {
            resume: OS_RESUME_BEGIN,
            flags: 0,
            wait_start: 0,
            wait_ticks: 0,
            child: None,
            locals: [0; crate::config::CFG_TASK_LOCALS],
        }
    }

    #[inline(always)]
    pub fn has(&self, bits: OsTaskFlags) -> bool {
        self.flags & bits != 0
    }

    #[inline(always)]
    pub(crate) fn set(&mut self, bits: OsTaskFlags) {
        self.flags |= bits;
    }

    #[inline(always)]
    pub(crate) fn clear(&mut self, bits: OsTaskFlags) {
        self.flags &= !bits;
    }

    /// Current resume point
    #[inline(always)]
    pub fn resume(&self) -> OsResume {
        self.resume
    }

    #[inline(always)]
    pub fn flags(&self) -> OsTaskFlags {
        self.flags
    }

    /// Report "blocked" to the caller
    #[inline]
    pub(crate) fn block(&mut self) -> OsFlow {
        self.set(flag::WAITING);
        ControlFlow::Break(OsTaskStatus::Waiting)
    }

    /// Leave the current suspension point
    #[inline]
    pub(crate) fn pass(&mut self) -> OsFlow {
        self.clear(flag::WAITING | flag::ARMED);
        OS_CONTINUE
    }
}

impl Default for OsPt {
    fn default() -> Self {
        Self::new()
    }
}

/// Operations available to a running task or child task body.
///
/// Every waiting primitive first honours a pending kill: a killed task
/// ends at its next suspension check, whatever it was waiting for.
pub trait OsTaskContext {
    /// Suspension state of the running body
    fn pt(&self) -> &OsPt;
    fn pt_mut(&mut self) -> &mut OsPt;
    fn kernel(&self) -> &Kernel;
    fn kernel_mut(&mut self) -> &mut Kernel;

    /// Current system tick
    #[inline]
    fn now(&self) -> OsTick {
        self.kernel().tick()
    }

    #[inline]
    fn resume_point(&self) -> OsResume {
        self.pt().resume
    }

    /// Move to suspension point `point` without suspending
    #[inline]
    fn goto(&mut self, point: OsResume) {
        let pt = self.pt_mut();
        pt.resume = point;
        pt.clear(flag::ARMED | flag::WAITING);
    }

    /// Words preserved across suspensions
    #[inline]
    fn locals(&mut self) -> &mut OsTaskLocals {
        &mut self.pt_mut().locals
    }

    #[inline]
    fn is_killed(&self) -> bool {
        self.pt().has(flag::KILLED)
    }

    /// Proceed once `cond` holds
    fn wait_until(&mut self, cond: bool) -> OsFlow {
        if self.is_killed() {
            return ControlFlow::Break(OsTaskStatus::Ended);
        }
        if cond {
            self.pt_mut().pass()
        } else {
            self.pt_mut().block()
        }
    }

    /// Proceed once `cond` no longer holds
    #[inline]
    fn wait_while(&mut self, cond: bool) -> OsFlow {
        self.wait_until(!cond)
    }

    /// Give up the CPU for the rest of this round
    fn yield_now(&mut self) -> OsFlow {
        if self.is_killed() {
            return ControlFlow::Break(OsTaskStatus::Ended);
        }
        let pt = self.pt_mut();
        if pt.has(flag::ARMED) {
            pt.pass()
        } else {
            pt.set(flag::ARMED);
            ControlFlow::Break(OsTaskStatus::Yielded)
        }
    }

    /// Proceed after `ticks` system ticks, counted from the first arrival
    fn wait_ticks(&mut self, ticks: OsTick) -> OsFlow {
        if self.is_killed() {
            return ControlFlow::Break(OsTaskStatus::Ended);
        }
        let now = self.now();
        let pt = self.pt_mut();
        if !pt.has(flag::ARMED) {
            pt.wait_start = now;
            pt.wait_ticks = ticks;
            pt.set(flag::ARMED);
        }
        if os_ticks_elapsed(pt.wait_start, now) >= pt.wait_ticks {
            pt.pass()
        } else {
            pt.block()
        }
    }

    /// Proceed after taking `n` units from `sem`
    #[cfg(feature = "sem")]
    fn wait_on_sem(&mut self, sem: &OsSem, n: OsSemCtr) -> OsFlow {
        if self.is_killed() {
            return ControlFlow::Break(OsTaskStatus::Ended);
        }
        if sem.try_take(n) {
            self.pt_mut().pass()
        } else {
            self.pt_mut().block()
        }
    }

    /// Drive `child` with `args` until it ends.
    ///
    /// On first arrival a free child slot is claimed and initialized; if
    /// none is free the caller waits for one. The child runs only while
    /// this body calls here, once per scheduler pass.
    fn spawn_and_wait<A: Copy>(&mut self, child: OsChildFn<A>, args: A) -> OsFlow {
        if self.is_killed() {
            return ControlFlow::Break(OsTaskStatus::Ended);
        }

        let current = self.pt().child;
        let slot = match current {
            Some(slot) => slot as usize,
            None => match self.kernel_mut().alloc_child() {
                Ok(handle) => {
                    self.pt_mut().child = Some(handle.index() as u8);
                    handle.index()
                }
                Err(_) => return self.pt_mut().block(),
            },
        };

        let flow = {
            let mut ccx = OsChildCx::new(self.kernel_mut(), slot);
            child(&mut ccx, args)
        };

        let status = match flow {
            ControlFlow::Continue(()) => OsTaskStatus::Ended,
            ControlFlow::Break(status) => status,
        };

        if status.is_finished() {
            self.kernel_mut().free_child(slot);
            self.pt_mut().child = None;
            self.pt_mut().pass()
        } else {
            self.pt_mut().block()
        }
    }

    /// Leave the body early; the task is retired like an ended one
    #[inline]
    fn exit(&mut self) -> OsFlow {
        ControlFlow::Break(OsTaskStatus::Exited)
    }

    /// Start over from the beginning on the next round
    fn restart(&mut self) -> OsFlow {
        if let Some(slot) = self.pt_mut().child.take() {
            self.kernel_mut().free_child(slot as usize);
        }
        let pt = self.pt_mut();
        pt.resume = OS_RESUME_BEGIN;
        pt.clear(flag::ARMED | flag::WAITING);
        pt.locals = [0; crate::config::CFG_TASK_LOCALS];
        ControlFlow::Break(OsTaskStatus::Yielded)
    }
}
