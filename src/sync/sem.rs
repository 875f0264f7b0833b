//! Semaphore implementation
//!
//! Counting semaphores for task synchronization and resource counting.
//! A semaphore is a plain shared counter; tasks wait on it with
//! [`OsTaskContext::wait_on_sem`](crate::pt::OsTaskContext::wait_on_sem),
//! and may share it with interrupt handlers through a `static`.

use portable_atomic::{AtomicI16, Ordering};

use crate::error::{OsError, OsResult};
use crate::types::OsSemCtr;

/// Counting semaphore
#[derive(Debug)]
pub struct OsSem {
    count: AtomicI16,
}

impl OsSem {
    /// Create a semaphore with an initial count
    pub const fn new(count: OsSemCtr) -> Self {
        OsSem {
            count: AtomicI16::new(count),
        }
    }

    /// Get current count
    #[inline]
    pub fn count(&self) -> OsSemCtr {
        self.count.load(Ordering::Acquire)
    }

    /// Set the count directly
    #[inline]
    pub fn set(&self, count: OsSemCtr) {
        self.count.store(count, Ordering::Release);
    }

    /// Add `n` units
    ///
    /// # Returns
    /// * `Ok(count)` - New count
    /// * `Err(OsError::SemOvf)` - Count would overflow; nothing is added
    pub fn signal(&self, n: OsSemCtr) -> OsResult<OsSemCtr> {
        self.count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |c| c.checked_add(n))
            .map(|prev| prev + n)
            .map_err(|_| OsError::SemOvf)
    }

    /// Take `n` units if at least `n` are available
    pub fn try_take(&self, n: OsSemCtr) -> bool {
        self.count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |c| {
                if c >= n {
                    Some(c - n)
                } else {
                    None
                }
            })
            .is_ok()
    }
}

impl Default for OsSem {
    fn default() -> Self {
        Self::new(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_and_take() {
        let sem = OsSem::new(1);
        assert_eq!(sem.signal(2), Ok(3));
        assert!(sem.try_take(3));
        assert_eq!(sem.count(), 0);
        assert!(!sem.try_take(1));
        assert_eq!(sem.count(), 0);
    }

    #[test]
    fn test_partial_take_refused() {
        let sem = OsSem::new(2);
        assert!(!sem.try_take(3));
        assert_eq!(sem.count(), 2);
    }

    #[test]
    fn test_overflow() {
        let sem = OsSem::new(OsSemCtr::MAX - 1);
        assert_eq!(sem.signal(1), Ok(OsSemCtr::MAX));
        assert_eq!(sem.signal(1), Err(OsError::SemOvf));
        assert_eq!(sem.count(), OsSemCtr::MAX);
    }
}
