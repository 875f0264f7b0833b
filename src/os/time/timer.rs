//! Software timers
//!
//! A fixed table of periodic callbacks. The scheduler services the table
//! at the start of every round, once per system tick elapsed since the
//! previous service, so callbacks run in task context and never overlap
//! with a task body.

use crate::config::CFG_MAX_TIMERS;
use crate::error::{OsError, OsResult};
use crate::kernel::Kernel;
use crate::types::OsTick;

/// Timer callback. Callbacks must be short and cannot suspend.
pub type OsTimerFn = fn(&mut OsTimerCx<'_>);

/// Handle to a timer slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OsTimerHandle(u8);

impl OsTimerHandle {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One timer slot
#[derive(Clone, Copy)]
pub struct OsTimer {
    callback: Option<OsTimerFn>,
    period: OsTick,
    countdown: OsTick,
}

impl OsTimer {
    const fn new() -> Self {
        OsTimer {
            callback: None,
            period: 0,
            countdown: 0,
        }
    }

    #[inline]
    pub fn period(&self) -> OsTick {
        self.period
    }

    /// Ticks left until the next expiry
    #[inline]
    pub fn countdown(&self) -> OsTick {
        self.countdown
    }

    fn runs(&self, callback: OsTimerFn) -> bool {
        self.callback.is_some_and(|own| own as usize == callback as usize)
    }
}

/// Timer table with its active bitmask
pub struct OsTimerTable {
    slots: [OsTimer; CFG_MAX_TIMERS],
    active: u32,
    /// Slots (re)registered since the last countdown step
    fresh: u32,
}

impl OsTimerTable {
    pub const fn new() -> Self {
        OsTimerTable {
            slots: [OsTimer::new(); CFG_MAX_TIMERS],
            active: 0,
            fresh: 0,
        }
    }

    #[inline(always)]
    fn is_active(&self, index: usize) -> bool {
        self.active & (1 << index) != 0
    }

    /// Number of running timers
    #[inline]
    pub fn active_count(&self) -> u32 {
        self.active.count_ones()
    }

    fn find(&self, callback: OsTimerFn) -> Option<usize> {
        (0..CFG_MAX_TIMERS).find(|&i| self.is_active(i) && self.slots[i].runs(callback))
    }

    fn slot(&self, handle: OsTimerHandle) -> OsResult<usize> {
        let index = handle.index();
        if index >= CFG_MAX_TIMERS {
            return Err(OsError::TmrInvalid);
        }
        if !self.is_active(index) {
            return Err(OsError::TmrInactive);
        }
        Ok(index)
    }

    /// Count one tick down on every active timer, returning the set of
    /// timers that expired
    fn tick(&mut self) -> u32 {
        self.fresh = 0;
        let mut expired = 0;
        for i in 0..CFG_MAX_TIMERS {
            if !self.is_active(i) {
                continue;
            }
            let tmr = &mut self.slots[i];
            tmr.countdown = tmr.countdown.saturating_sub(1);
            if tmr.countdown == 0 {
                tmr.countdown = tmr.period;
                expired |= 1 << i;
            }
        }
        expired
    }
}

impl Default for OsTimerTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Context handed to a firing timer callback
pub struct OsTimerCx<'k> {
    kernel: &'k mut Kernel,
    handle: OsTimerHandle,
    now: OsTick,
}

impl OsTimerCx<'_> {
    /// Timer that fired
    #[inline]
    pub fn handle(&self) -> OsTimerHandle {
        self.handle
    }

    /// Tick at which the timer expired
    #[inline]
    pub fn now(&self) -> OsTick {
        self.now
    }

    #[inline]
    pub fn kernel(&self) -> &Kernel {
        self.kernel
    }

    #[inline]
    pub fn kernel_mut(&mut self) -> &mut Kernel {
        self.kernel
    }
}

impl Kernel {
    /// Start a periodic timer.
    ///
    /// A callback that is already running keeps its slot and period.
    ///
    /// # Returns
    /// * `Err(OsError::TmrInvalidPeriod)` - `period` is zero
    /// * `Err(OsError::TmrNoMoreTimers)` - Table is full
    pub fn register_timer(&mut self, callback: OsTimerFn, period: OsTick) -> OsResult<OsTimerHandle> {
        if period == 0 {
            return Err(OsError::TmrInvalidPeriod);
        }
        if let Some(i) = self.timers.find(callback) {
            return Ok(OsTimerHandle(i as u8));
        }

        let index = (0..CFG_MAX_TIMERS)
            .find(|&i| !self.timers.is_active(i))
            .ok_or(OsError::TmrNoMoreTimers)?;

        self.timers.slots[index] = OsTimer {
            callback: Some(callback),
            period,
            countdown: period,
        };
        self.timers.active |= 1 << index;
        self.timers.fresh |= 1 << index;

        crate::info!("timer {} registered, period {}", index, period);
        Ok(OsTimerHandle(index as u8))
    }

    /// Stop a timer and free its slot
    pub fn unregister_timer(&mut self, handle: OsTimerHandle) -> OsResult<()> {
        let index = self.timers.slot(handle)?;
        self.timers.active &= !(1 << index);
        self.timers.slots[index] = OsTimer::new();
        crate::debug!("timer {} unregistered", index);
        Ok(())
    }

    /// Look up a running timer by callback
    pub fn timer_handle(&self, callback: OsTimerFn) -> Option<OsTimerHandle> {
        self.timers.find(callback).map(|i| OsTimerHandle(i as u8))
    }

    /// Change the period of a running timer.
    ///
    /// The countdown already in progress is kept; the new period applies
    /// from the next expiry on.
    pub fn change_timer_period(&mut self, handle: OsTimerHandle, period: OsTick) -> OsResult<()> {
        if period == 0 {
            return Err(OsError::TmrInvalidPeriod);
        }
        let index = self.timers.slot(handle)?;
        self.timers.slots[index].period = period;
        Ok(())
    }

    pub fn is_timer_running(&self, handle: OsTimerHandle) -> bool {
        self.timers.slot(handle).is_ok()
    }

    /// Timer slot state, if `handle` is running
    pub fn timer(&self, handle: OsTimerHandle) -> Option<&OsTimer> {
        self.timers.slot(handle).ok().map(|i| &self.timers.slots[i])
    }

    /// Catch up with the ticks elapsed since the previous service
    pub(crate) fn service_timers(&mut self) {
        let now = self.tick();
        if self.timers.active == 0 {
            self.timer_tick = now;
            return;
        }

        while self.timer_tick != now {
            self.timer_tick = self.timer_tick.wrapping_add(1);
            let expired = self.timers.tick();
            if expired == 0 {
                continue;
            }
            let at = self.timer_tick;
            for i in 0..CFG_MAX_TIMERS {
                // An earlier callback may have stopped or replaced this one
                let bit = 1 << i;
                if expired & bit == 0
                    || self.timers.fresh & bit != 0
                    || !self.timers.is_active(i)
                {
                    continue;
                }
                if let Some(callback) = self.timers.slots[i].callback {
                    let mut cx = OsTimerCx {
                        kernel: &mut *self,
                        handle: OsTimerHandle(i as u8),
                        now: at,
                    };
                    callback(&mut cx);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: &mut OsTimerCx<'_>) {}

    #[test]
    fn test_table_countdown() {
        let mut table = OsTimerTable::new();
        table.slots[3] = OsTimer {
            callback: Some(noop),
            period: 3,
            countdown: 3,
        };
        table.active = 1 << 3;

        assert_eq!(table.tick(), 0);
        assert_eq!(table.tick(), 0);
        assert_eq!(table.tick(), 1 << 3);
        assert_eq!(table.slots[3].countdown(), 3);
    }

    #[test]
    fn test_inactive_slots_ignored() {
        let mut table = OsTimerTable::new();
        table.slots[0] = OsTimer {
            callback: Some(noop),
            period: 1,
            countdown: 1,
        };
        assert_eq!(table.tick(), 0);
        assert_eq!(table.active_count(), 0);
    }

    #[test]
    fn test_slot_errors() {
        let table = OsTimerTable::new();
        assert_eq!(table.slot(OsTimerHandle(0)), Err(OsError::TmrInactive));
        assert_eq!(
            table.slot(OsTimerHandle(CFG_MAX_TIMERS as u8)),
            Err(OsError::TmrInvalid)
        );
    }
}
