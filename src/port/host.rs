//! Hosted port
//!
//! Runs the kernel as an ordinary process, with the tick derived from the
//! monotonic clock.

use std::sync::OnceLock;
use std::time::Instant;

use super::OsTickSource;
use crate::config::CFG_TICK_RATE_HZ;
use crate::types::OsTick;

/// System tick derived from [`Instant`], starting at zero on `init`
pub struct OsHostTick {
    epoch: OnceLock<Instant>,
}

impl OsHostTick {
    pub const fn new() -> Self {
        OsHostTick {
            epoch: OnceLock::new(),
        }
    }
}

impl Default for OsHostTick {
    fn default() -> Self {
        Self::new()
    }
}

impl OsTickSource for OsHostTick {
    fn init(&self) {
        self.epoch.get_or_init(Instant::now);
    }

    fn now(&self) -> OsTick {
        let epoch = self.epoch.get_or_init(Instant::now);
        let ms = epoch.elapsed().as_millis() as u64;
        (ms * CFG_TICK_RATE_HZ as u64 / 1000) as OsTick
    }
}
