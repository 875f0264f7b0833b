//! Cortex-M port implementation
//!
//! Provides the SysTick driven system tick.

use cortex_m::peripheral::syst::SystClkSource;
use portable_atomic::{AtomicU32, Ordering};

use super::OsTickSource;
use crate::config::CFG_TICK_RATE_HZ;
use crate::types::OsTick;

/// Tick counter incremented by the SysTick exception
static SYS_TICK: AtomicU32 = AtomicU32::new(0);

/// System tick driven by the core SysTick timer
pub struct OsSysTick {
    core_clock_hz: u32,
}

impl OsSysTick {
    /// # Arguments
    /// * `core_clock_hz` - Frequency of the core clock feeding SysTick
    pub const fn new(core_clock_hz: u32) -> Self {
        OsSysTick { core_clock_hz }
    }
}

impl OsTickSource for OsSysTick {
    fn init(&self) {
        os_cpu_systick_init(self.core_clock_hz / CFG_TICK_RATE_HZ);
    }

    #[inline]
    fn now(&self) -> OsTick {
        SYS_TICK.load(Ordering::Relaxed)
    }
}

/// Initialize SysTick timer for system tick generation
///
/// # Arguments
/// * `cnts` - Reload value
///
/// # Example
/// For 16MHz clock with 1000Hz tick rate: cnts = 16_000_000 / 1000 = 16_000
pub fn os_cpu_systick_init(cnts: u32) {
    // SYST is owned by the kernel once the scheduler starts
    let mut p = unsafe { cortex_m::Peripherals::steal() };

    p.SYST.set_reload(cnts - 1);
    p.SYST.clear_current();
    p.SYST.set_clock_source(SystClkSource::Core);
    p.SYST.enable_interrupt();
    p.SYST.enable_counter();
}

/// Current value of the SysTick counter
#[inline(always)]
pub fn os_systick_now() -> OsTick {
    SYS_TICK.load(Ordering::Relaxed)
}

/// SysTick interrupt handler
#[cortex_m_rt::exception]
fn SysTick() {
    SYS_TICK.fetch_add(1, Ordering::Relaxed);
}
