//! Child tasks
//!
//! A child task is a reusable routine written with the same suspension
//! primitives as a task. It is never scheduled on its own: a parent drives
//! it through [`OsTaskContext::spawn_and_wait`], which records the child
//! slot in the parent's own state until the child ends.

use crate::error::{OsError, OsResult};
use crate::kernel::Kernel;
use crate::pt::{OsPt, OsTaskContext};
use crate::types::{flag, OsFlow, OsTaskFlags};

/// Child task entry point, called with the child's context and the
/// arguments given to `spawn_and_wait`
pub type OsChildFn<A> = fn(&mut OsChildCx<'_>, A) -> OsFlow;

/// Handle to a child task slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OsChildHandle(u8);

impl OsChildHandle {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl Kernel {
    /// Find a child slot that is not owned and has a fresh resume token
    pub fn free_child_task(&self) -> Option<OsChildHandle> {
        self.children
            .iter()
            .position(|c| !c.is_allocated() && c.pt.resume() == crate::types::OS_RESUME_BEGIN)
            .map(|i| OsChildHandle(i as u8))
    }

    /// Number of child slots owned by a parent
    pub fn children_in_use(&self) -> usize {
        self.children.iter().filter(|c| c.is_allocated()).count()
    }

    /// Flags of an allocated child slot
    ///
    /// # Returns
    /// * `Err(OsError::ChildInvalid)` - No parent owns this slot
    pub fn child_flags(&self, child: OsChildHandle) -> OsResult<OsTaskFlags> {
        match self.children.get(child.index()) {
            Some(c) if c.is_allocated() => Ok(c.pt.flags()),
            _ => Err(OsError::ChildInvalid),
        }
    }

    /// Claim and initialize a free child slot
    ///
    /// # Returns
    /// * `Err(OsError::ChildNoMoreTcb)` - Every slot is in use
    pub(crate) fn alloc_child(&mut self) -> OsResult<OsChildHandle> {
        let Some(handle) = self.free_child_task() else {
            crate::debug!("child task pool exhausted");
            return Err(OsError::ChildNoMoreTcb);
        };
        let pt = &mut self.children[handle.index()].pt;
        *pt = OsPt::new();
        pt.set(flag::ALLOCATED);
        Ok(handle)
    }

    /// Return a child slot and every grandchild it drives to the pool
    pub(crate) fn free_child(&mut self, mut slot: usize) {
        loop {
            let pt = &mut self.children[slot].pt;
            let next = pt.child.take();
            *pt = OsPt::new();
            match next {
                Some(grandchild) => slot = grandchild as usize,
                None => break,
            }
        }
    }
}

/// Context of a child task driven by its parent
pub struct OsChildCx<'k> {
    kernel: &'k mut Kernel,
    slot: usize,
}

impl<'k> OsChildCx<'k> {
    pub(crate) fn new(kernel: &'k mut Kernel, slot: usize) -> Self {
        OsChildCx { kernel, slot }
    }

    #[inline]
    pub fn handle(&self) -> OsChildHandle {
        OsChildHandle(self.slot as u8)
    }
}

impl OsTaskContext for OsChildCx<'_> {
    #[inline]
    fn pt(&self) -> &OsPt {
        &self.kernel.children[self.slot].pt
    }

    #[inline]
    fn pt_mut(&mut self) -> &mut OsPt {
        &mut self.kernel.children[self.slot].pt
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
