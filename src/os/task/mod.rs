//! Task management module
//!
//! Provides task registration, lookup, control and the per-call task
//! context handed to every task body.

pub mod child;
mod tcb;

pub use tcb::{OsChildTcb, OsTcb};

use core::ops::ControlFlow;

use crate::config::CFG_MAX_USER_TASKS;
use crate::error::{OsError, OsResult};
use crate::ipc::OsMsg;
use crate::kernel::Kernel;
use crate::pt::{OsPt, OsTaskContext};
use crate::types::{flag, OsFlow, OsTaskFlags, OsTaskId, OsTaskStatus};

/// Task entry point function type
pub type OsTaskFn = fn(&mut OsTaskCx<'_>) -> OsFlow;

/// Handle to a registered task.
///
/// Handles carry the task ID, so they stay valid when the scheduler
/// compacts the task pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OsTaskHandle(OsTaskId);

impl OsTaskHandle {
    #[inline]
    pub fn id(self) -> OsTaskId {
        self.0
    }
}

// ============ Registry ============

impl Kernel {
    /// Register a task.
    ///
    /// A function already running keeps its slot. A function that ran
    /// before and has ended is reset and reactivated with its original ID.
    /// Any other function claims a free slot and gets a fresh ID. When only
    /// retired slots are left, the one in the last slot is evicted, and that
    /// function gets a new ID if it is ever registered again.
    ///
    /// # Returns
    /// * `Ok(handle)` - Task is scheduled from the next round on
    /// * `Err(OsError::TaskNoMoreTcb)` - Pool is full
    /// * `Err(OsError::TaskIdExhausted)` - No unused ID is left
    pub fn register_task(&mut self, entry: OsTaskFn) -> OsResult<OsTaskHandle> {
        if let Some(slot) = self.tasks.iter().position(|t| t.runs(entry)) {
            if slot < self.num_tasks {
                if self.tasks[slot].is_removed() {
                    self.reset_task(slot);
                    crate::debug!("task {} reactivated in round", self.tasks[slot].id);
                }
                return Ok(OsTaskHandle(self.tasks[slot].id));
            }

            // Retired slot: bring it back to the end of the live range
            let dst = self.num_tasks;
            self.tasks.swap(slot, dst);
            self.num_tasks += 1;
            self.reset_task(dst);
            crate::info!("task {} re-registered", self.tasks[dst].id);
            return Ok(OsTaskHandle(self.tasks[dst].id));
        }

        if self.num_tasks >= CFG_MAX_USER_TASKS {
            crate::warn!("task pool full");
            return Err(OsError::TaskNoMoreTcb);
        }
        if self.next_task_id > OsTaskId::MAX as u32 {
            return Err(OsError::TaskIdExhausted);
        }

        // Prefer a never-used slot; otherwise evict a retired task
        let dst = self.num_tasks;
        let src = (dst..CFG_MAX_USER_TASKS)
            .find(|&i| self.tasks[i].entry.is_none())
            .unwrap_or(CFG_MAX_USER_TASKS - 1);
        if self.tasks[src].entry.is_some() {
            crate::debug!("evicting retired task {}", self.tasks[src].id);
        }
        self.tasks.swap(src, dst);

        let id = self.next_task_id as OsTaskId;
        self.next_task_id += 1;

        let tcb = &mut self.tasks[dst];
        tcb.entry = Some(entry);
        tcb.id = id;
        self.num_tasks += 1;
        self.reset_task(dst);

        crate::info!("task {} registered in slot {}", id, dst);
        Ok(OsTaskHandle(id))
    }

    /// Unregister a task; it is removed after the current round
    ///
    /// # Returns
    /// `true` if a live task running `entry` was found
    pub fn unregister_task(&mut self, entry: OsTaskFn) -> bool {
        let found = self.live_slots().find(|&i| self.tasks[i].runs(entry));
        match found {
            Some(slot) => {
                self.retire_task(slot);
                true
            }
            None => false,
        }
    }

    /// Look up a live task by entry point
    pub fn task_handle(&self, entry: OsTaskFn) -> Option<OsTaskHandle> {
        self.live_slots()
            .find(|&i| self.tasks[i].runs(entry))
            .map(|i| OsTaskHandle(self.tasks[i].id))
    }

    /// Look up a live task by ID
    pub fn task_handle_by_id(&self, id: OsTaskId) -> Option<OsTaskHandle> {
        self.slot_of_id(id).map(|_| OsTaskHandle(id))
    }

    /// Number of occupied task slots, including tasks retired this round
    #[inline]
    pub fn task_count(&self) -> usize {
        self.num_tasks
    }

    /// Flags of a live task
    pub fn task_flags(&self, task: OsTaskHandle) -> Option<OsTaskFlags> {
        self.slot_of_id(task.0).map(|i| self.tasks[i].pt.flags)
    }

    /// TCB of a live task
    pub fn tcb(&self, task: OsTaskHandle) -> Option<&OsTcb> {
        self.slot_of_id(task.0).map(|i| &self.tasks[i])
    }

    pub fn is_task_sleeping(&self, task: OsTaskHandle) -> bool {
        self.task_flags(task)
            .is_some_and(|f| f & flag::SLEEPING != 0)
    }

    /// Wake a sleeping task
    pub fn wake_task(&mut self, task: OsTaskHandle) -> OsResult<()> {
        let slot = self.slot_of_id(task.0).ok_or(OsError::TaskNotExist)?;
        self.tasks[slot].pt.clear(flag::SLEEPING);
        Ok(())
    }

    /// Ask a task to end at its next suspension check
    pub fn kill_task(&mut self, task: OsTaskHandle) -> OsResult<()> {
        let slot = self.slot_of_id(task.0).ok_or(OsError::TaskNotExist)?;
        self.tasks[slot].pt.set(flag::KILLED);
        crate::debug!("task {} killed", task.0);
        Ok(())
    }

    // ============ Internal helpers ============

    /// Indices of live, not retired slots
    pub(crate) fn live_slots(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.num_tasks).filter(move |&i| !self.tasks[i].is_removed())
    }

    pub(crate) fn slot_of_id(&self, id: OsTaskId) -> Option<usize> {
        if id == 0 {
            return None;
        }
        self.live_slots().find(|&i| self.tasks[i].id == id)
    }

    /// Fresh execution state for a (re)activated slot
    pub(crate) fn reset_task(&mut self, slot: usize) {
        self.release_child_of_task(slot);
        self.drain_mailbox(slot);
        self.tasks[slot].pt = OsPt::new();
    }

    /// Flag a slot for removal at the end of the round
    pub(crate) fn retire_task(&mut self, slot: usize) {
        self.release_child_of_task(slot);
        self.drain_mailbox(slot);
        let pt = &mut self.tasks[slot].pt;
        pt.set(flag::REMOVE);
        pt.clear(flag::WAITING | flag::ARMED | flag::HAS_MAIL | flag::MAIL_NACK);
        self.remove_pending = true;
        crate::debug!("task {} retired", self.tasks[slot].id);
    }

    /// Retire a task whose body reported ended or exited
    pub(crate) fn end_task(&mut self, slot: usize) {
        self.tasks[slot].pt.resume = crate::types::OS_RESUME_BEGIN;
        self.tasks[slot].pt.set(flag::ENDED);
        self.retire_task(slot);
    }

    fn release_child_of_task(&mut self, slot: usize) {
        if let Some(child) = self.tasks[slot].pt.child.take() {
            self.free_child(child as usize);
        }
    }

    /// Discard pending mail, releasing senders that wait for delivery
    fn drain_mailbox(&mut self, slot: usize) {
        while let Some(msg) = self.tasks[slot].mailbox.take() {
            self.release_sender(&msg);
        }
        self.tasks[slot].pt.clear(flag::HAS_MAIL);
    }

    fn release_sender(&mut self, msg: &OsMsg) {
        if !msg.requests_ack() {
            return;
        }
        if let Some(sender) = self.slot_of_id(msg.from()) {
            self.tasks[sender].pt.clear(flag::MAIL_NACK);
        }
    }

    // ============ Mail ============

    /// Check whether `task`'s mailbox has `len` free bytes
    pub fn mailbox_has_room(&self, task: OsTaskHandle, len: usize) -> bool {
        self.slot_of_id(task.0)
            .is_some_and(|i| self.tasks[i].mailbox.has_room(len))
    }

    /// Post `msg` to `to`, stamping it with sender `from` and the current tick.
    ///
    /// The whole message is written or nothing is.
    ///
    /// # Returns
    /// * `Err(OsError::TaskNotExist)` - No live task has that handle
    /// * `Err(OsError::MailboxFull)` - Not enough room for the message
    pub fn send_mail(&mut self, from: OsTaskId, to: OsTaskHandle, msg: &OsMsg) -> OsResult<()> {
        let slot = self.slot_of_id(to.0).ok_or(OsError::TaskNotExist)?;
        let mut stamped = *msg;
        stamped.stamp(from, self.tick());

        let tcb = &mut self.tasks[slot];
        if let Err(e) = tcb.mailbox.post(&stamped) {
            crate::warn!("mail from {} to {} dropped", from, to.0);
            return Err(e);
        }
        tcb.pt.set(flag::HAS_MAIL);
        Ok(())
    }

    /// Dequeue the oldest message of the task in `slot`
    pub(crate) fn read_mail(&mut self, slot: usize) -> Option<OsMsg> {
        let tcb = &mut self.tasks[slot];
        let msg = tcb.mailbox.take()?;
        if !tcb.mailbox.has_mail() {
            tcb.pt.clear(flag::HAS_MAIL);
        }
        self.release_sender(&msg);
        Some(msg)
    }
}

// ============ Task context ============

/// Context of the task currently invoked by the scheduler
pub struct OsTaskCx<'k> {
    kernel: &'k mut Kernel,
    slot: usize,
}

impl<'k> OsTaskCx<'k> {
    pub(crate) fn new(kernel: &'k mut Kernel, slot: usize) -> Self {
        OsTaskCx { kernel, slot }
    }

    #[inline]
    fn tcb(&self) -> &OsTcb {
        &self.kernel.tasks[self.slot]
    }

    /// ID of the running task
    #[inline]
    pub fn id(&self) -> OsTaskId {
        self.tcb().id
    }

    #[inline]
    pub fn handle(&self) -> OsTaskHandle {
        OsTaskHandle(self.id())
    }

    /// Sleep until another task calls [`Kernel::wake_task`]
    pub fn sleep(&mut self) -> OsFlow {
        if self.is_killed() {
            return ControlFlow::Break(OsTaskStatus::Ended);
        }
        let pt = self.pt_mut();
        if !pt.has(flag::ARMED) {
            pt.set(flag::SLEEPING | flag::ARMED);
        }
        if pt.has(flag::SLEEPING) {
            pt.block()
        } else {
            pt.pass()
        }
    }

    // ============ Mail ============

    #[inline]
    pub fn has_mail(&self) -> bool {
        self.tcb().mailbox.has_mail()
    }

    /// Free bytes in the own mailbox
    #[inline]
    pub fn mailbox_available(&self) -> usize {
        self.tcb().mailbox.available()
    }

    /// Check whether at least `n` bytes of mail are pending
    #[inline]
    pub fn mailbox_has_at_least(&self, n: usize) -> bool {
        self.tcb().mailbox.occupied() >= n
    }

    /// Proceed once the own mailbox holds a message
    pub fn wait_for_mail(&mut self) -> OsFlow {
        let ready = self.has_mail();
        self.wait_until(ready)
    }

    /// Proceed once `to`'s mailbox has room for a message of `payload_len` bytes.
    ///
    /// A target that no longer exists does not block; the send that
    /// follows reports `TaskNotExist`.
    pub fn wait_on_available_mailbox(&mut self, to: OsTaskHandle, payload_len: usize) -> OsFlow {
        let gone = self.kernel.slot_of_id(to.id()).is_none();
        let room = gone
            || self
                .kernel
                .mailbox_has_room(to, crate::config::CFG_MAIL_HEADER_LEN + payload_len);
        self.wait_until(room)
    }

    /// Send `msg` to `to` without waiting
    pub fn send_mail(&mut self, to: OsTaskHandle, msg: &OsMsg) -> OsResult<()> {
        let from = self.id();
        self.kernel.send_mail(from, to, msg)
    }

    /// Send `msg` to `to` and wait until the receiver has read it.
    ///
    /// Waits first for room in the target mailbox. A target that no
    /// longer exists counts as delivered.
    pub fn send_mail_wait_delivery(&mut self, to: OsTaskHandle, msg: &OsMsg) -> OsFlow {
        if self.is_killed() {
            return ControlFlow::Break(OsTaskStatus::Ended);
        }

        if self.kernel.slot_of_id(to.id()).is_none() {
            crate::warn!("task {} gone, delivery abandoned", to.id());
            self.pt_mut().clear(flag::MAIL_NACK);
            return self.pt_mut().pass();
        }

        if !self.pt().has(flag::ARMED) {
            if !self.kernel.mailbox_has_room(to, msg.wire_len()) {
                return self.pt_mut().block();
            }
            let from = self.id();
            if self.kernel.send_mail(from, to, &msg.with_ack()).is_err() {
                return self.pt_mut().block();
            }
            self.pt_mut().set(flag::MAIL_NACK | flag::ARMED);
        }

        if self.pt().has(flag::MAIL_NACK) {
            self.pt_mut().block()
        } else {
            self.pt_mut().pass()
        }
    }

    /// Dequeue the oldest message of the own mailbox.
    ///
    /// Reading a message that requests confirmation releases its sender.
    pub fn read_mail(&mut self) -> Option<OsMsg> {
        self.kernel.read_mail(self.slot)
    }
}

impl OsTaskContext for OsTaskCx<'_> {
    #[inline]
    fn pt(&self) -> &OsPt {
        &self.kernel.tasks[self.slot].pt
    }

    #[inline]
    fn pt_mut(&mut self) -> &mut OsPt {
        &mut self.kernel.tasks[self.slot].pt
    }

    #[inline]
    fn kernel(&self) -> &Kernel {
        self.kernel
    }

    #[inline]
    fn kernel_mut(&mut self) -> &mut Kernel {
        self.kernel
    }
}
