//! Port layer - tick sources and target-specific hooks
//!
//! The kernel consumes time through [`OsTickSource`]. A Cortex-M target
//! drives the tick from SysTick; hosted builds read a monotonic clock, and
//! tests advance a manual counter.

use portable_atomic::{AtomicU32, Ordering};

use crate::types::OsTick;

#[cfg(target_arch = "arm")]
pub mod arm;

#[cfg(target_arch = "arm")]
pub use arm::*;

#[cfg(feature = "std")]
pub mod host;

#[cfg(feature = "std")]
pub use host::*;

/// Source of the 1 ms system tick.
///
/// `now` wraps at `OsTick::MAX`; every consumer uses wrapping arithmetic.
pub trait OsTickSource {
    /// Start the tick hardware, called once by `os_init`
    fn init(&self) {}

    /// Current tick count
    fn now(&self) -> OsTick;
}

/// Tick counter advanced explicitly, for tests and simulation
pub struct OsManualTick {
    ticks: AtomicU32,
}

impl OsManualTick {
    pub const fn new(start: OsTick) -> Self {
        OsManualTick {
            ticks: AtomicU32::new(start),
        }
    }

    /// Advance by `ticks`, wrapping at the counter width
    #[inline]
    pub fn advance(&self, ticks: OsTick) {
        self.ticks.fetch_add(ticks, Ordering::Relaxed);
    }

    #[inline]
    pub fn set(&self, tick: OsTick) {
        self.ticks.store(tick, Ordering::Relaxed);
    }
}

impl OsTickSource for OsManualTick {
    #[inline]
    fn now(&self) -> OsTick {
        self.ticks.load(Ordering::Relaxed)
    }
}

/// Called by the scheduler between rounds
#[inline(always)]
pub fn os_idle() {
    #[cfg(feature = "std")]
    std::thread::yield_now();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_tick_wraps() {
        let tick = OsManualTick::new(OsTick::MAX);
        tick.advance(2);
        assert_eq!(tick.now(), 1);
        tick.set(42);
        assert_eq!(tick.now(), 42);
    }
}
