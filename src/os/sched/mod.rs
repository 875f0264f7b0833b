//! Scheduler module
//!
//! Cooperative round-robin: every round calls each live task once, in
//! slot order. A task that never suspends starves all others; nothing
//! polices that.

use core::ops::ControlFlow;

use crate::error::{OsError, OsResult};
use crate::kernel::Kernel;
use crate::task::OsTaskCx;
use crate::types::{flag, OsKernelState, OsTaskStatus};

impl Kernel {
    /// Run one scheduler round
    ///
    /// Services the timers, invokes every task registered before the round
    /// started, retires tasks that ended, then compacts the pool if any
    /// task was retired.
    ///
    /// # Returns
    /// * `Err(OsError::OsNotInit)` - `os_init` has not succeeded yet
    pub fn run_round(&mut self) -> OsResult<()> {
        if self.state() == OsKernelState::Initializing {
            return Err(OsError::OsNotInit);
        }

        #[cfg(feature = "timer")]
        self.service_timers();

        // Tasks registered during the round first run in the next one
        let count = self.num_tasks;
        for tcb in &mut self.tasks[..count] {
            tcb.pt.clear(flag::CALLED);
        }

        for slot in 0..count {
            let tcb = &mut self.tasks[slot];
            let entry = match tcb.entry {
                Some(entry) if !tcb.is_removed() => entry,
                _ => continue,
            };
            tcb.pt.set(flag::CALLED);

            let status = match entry(&mut OsTaskCx::new(self, slot)) {
                ControlFlow::Continue(()) => OsTaskStatus::Ended,
                ControlFlow::Break(status) => status,
            };

            if status.is_finished() && !self.tasks[slot].is_removed() {
                crate::debug!("task {} finished", self.tasks[slot].id);
                self.end_task(slot);
            }
        }

        if self.remove_pending {
            self.compact();
        }
        self.count_round();
        Ok(())
    }

    /// Drop retired tasks from the live range.
    ///
    /// Scans backwards, rotating each retired slot to the end of the live
    /// range, where it stays for a later re-registration.
    pub(crate) fn compact(&mut self) {
        self.set_state(OsKernelState::Compacting);

        let mut slot = self.num_tasks;
        while slot > 0 {
            slot -= 1;
            if !self.tasks[slot].is_removed() {
                continue;
            }
            self.tasks[slot..self.num_tasks].rotate_left(1);
            self.num_tasks -= 1;
            self.tasks[self.num_tasks].pt.clear(flag::REMOVE);
        }

        self.remove_pending = false;
        self.set_state(OsKernelState::Running);
        crate::debug!("pool compacted, {} tasks live", self.num_tasks);
    }
}
