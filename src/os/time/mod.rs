//! Time management module
//!
//! Tick arithmetic helpers and the software timer service. Tick waits
//! themselves are suspension primitives, see
//! [`OsTaskContext::wait_ticks`](crate::pt::OsTaskContext::wait_ticks).

#[cfg(feature = "timer")]
pub mod timer;

#[cfg(feature = "timer")]
pub use timer::{OsTimer, OsTimerCx, OsTimerFn, OsTimerHandle, OsTimerTable};

use crate::config::CFG_TICK_RATE_HZ;
use crate::error::{OsError, OsResult};
use crate::types::OsTick;

/// Ticks elapsed from `since` to `now`, correct across the 32-bit rollover
#[inline(always)]
pub fn os_ticks_elapsed(since: OsTick, now: OsTick) -> OsTick {
    now.wrapping_sub(since)
}

/// Convert milliseconds to ticks, rounding down
#[inline]
pub const fn os_ms_to_ticks(ms: u32) -> OsTick {
    ((ms as u64 * CFG_TICK_RATE_HZ as u64) / 1000) as OsTick
}

/// Convert a duration in hours, minutes, seconds, milliseconds to ticks
///
/// # Arguments
/// * `hours` - Hours (0-999)
/// * `minutes` - Minutes (0-59)
/// * `seconds` - Seconds (0-59)
/// * `milliseconds` - Milliseconds (0-999)
///
/// # Returns
/// * `Err(OsError::TimeInvalid)` - A field is out of range
pub fn os_time_to_ticks(
    hours: u16,
    minutes: u8,
    seconds: u8,
    milliseconds: u16,
) -> OsResult<OsTick> {
    if hours > 999 || minutes > 59 || seconds > 59 || milliseconds > 999 {
        return Err(OsError::TimeInvalid);
    }

    let total_ms = (hours as u64) * 3_600_000
        + (minutes as u64) * 60_000
        + (seconds as u64) * 1000
        + (milliseconds as u64);

    let ticks = (total_ms * CFG_TICK_RATE_HZ as u64) / 1000;
    OsTick::try_from(ticks).map_err(|_| OsError::TimeInvalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elapsed_across_rollover() {
        assert_eq!(os_ticks_elapsed(10, 15), 5);
        assert_eq!(os_ticks_elapsed(OsTick::MAX - 2, 3), 6);
    }

    #[test]
    fn test_time_to_ticks() {
        assert_eq!(os_time_to_ticks(0, 0, 1, 500), Ok(1500));
        assert_eq!(os_time_to_ticks(1, 0, 0, 0), Ok(3_600_000));
        assert_eq!(os_time_to_ticks(0, 60, 0, 0), Err(OsError::TimeInvalid));
        assert_eq!(os_time_to_ticks(0, 0, 0, 1000), Err(OsError::TimeInvalid));
    }

    #[test]
    fn test_ms_to_ticks() {
        assert_eq!(os_ms_to_ticks(250), 250);
    }
}
