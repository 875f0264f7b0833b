//! Kernel state and initialization
//!
//! All pools live in one [`Kernel`] value: the task pool, the child task
//! pool, the timer table and the small amount of global state the
//! application shares with its tasks. Several kernels may coexist, each
//! fed by its own tick source.

use crate::config::{CFG_MAX_CHILD_TASKS, CFG_MAX_USER_TASKS, CFG_RAND_SEED};
use crate::error::{OsError, OsResult};
use crate::port::{os_idle, OsTickSource};
use crate::task::{OsChildTcb, OsTcb};
use crate::types::{OsKernelState, OsTick, OsUserFlags};

#[cfg(feature = "timer")]
use crate::time::OsTimerTable;

/// Application setup hook, run once by `os_init`
pub type OsUserInit = fn(&mut Kernel);

/// Cooperative kernel instance
pub struct Kernel {
    // ============ Tasks ============
    /// Live tasks occupy `0..num_tasks`; slots past it keep retired tasks
    pub(crate) tasks: [OsTcb; CFG_MAX_USER_TASKS],
    pub(crate) num_tasks: usize,
    pub(crate) next_task_id: u32,
    pub(crate) remove_pending: bool,

    pub(crate) children: [OsChildTcb; CFG_MAX_CHILD_TASKS],

    // ============ Timers ============
    #[cfg(feature = "timer")]
    pub(crate) timers: OsTimerTable,
    /// Last tick the timer table was serviced for
    #[cfg(feature = "timer")]
    pub(crate) timer_tick: OsTick,

    // ============ Application state ============
    user_flags: OsUserFlags,
    rand: u32,

    // ============ Kernel state ============
    state: OsKernelState,
    rounds: u32,
    tick_src: &'static dyn OsTickSource,
}

impl Kernel {
    /// Create a kernel driven by `tick_src`
    pub const fn new(tick_src: &'static dyn OsTickSource) -> Self {
        Kernel {
            tasks: [OsTcb::new(); CFG_MAX_USER_TASKS],
            num_tasks: 0,
            next_task_id: 1,
            remove_pending: false,
            children: [OsChildTcb::new(); CFG_MAX_CHILD_TASKS],
            #[cfg(feature = "timer")]
            timers: OsTimerTable::new(),
            #[cfg(feature = "timer")]
            timer_tick: 0,
            user_flags: 0,
            rand: CFG_RAND_SEED,
            state: OsKernelState::Initializing,
            rounds: 0,
            tick_src,
        }
    }

    /// Initialize the kernel
    ///
    /// Starts the tick source and runs `user_init`, which must register at
    /// least one task.
    ///
    /// # Returns
    /// * `Ok(())` - Kernel is ready to run rounds
    /// * `Err(OsError::OsRunning)` - Kernel was already initialized
    /// * `Err(OsError::OsNoAppTask)` - `user_init` registered no task
    pub fn os_init(&mut self, user_init: OsUserInit) -> OsResult<()> {
        if self.state != OsKernelState::Initializing {
            return Err(OsError::OsRunning);
        }

        self.tick_src.init();
        #[cfg(feature = "timer")]
        {
            self.timer_tick = self.tick();
        }

        user_init(self);

        if self.num_tasks == 0 {
            crate::error!("user init registered no task");
            return Err(OsError::OsNoAppTask);
        }

        self.state = OsKernelState::Running;
        crate::info!("kernel initialized with {} tasks", self.num_tasks);
        Ok(())
    }

    /// Initialize the kernel and run the scheduler forever
    ///
    /// Returns only if initialization fails.
    pub fn os_start(&mut self, user_init: OsUserInit) -> OsResult<()> {
        self.os_init(user_init)?;
        crate::info!("scheduler started");

        loop {
            // Rounds cannot fail once initialized
            let _ = self.run_round();
            os_idle();
        }
    }

    // ============ Status ============

    /// Current system tick
    #[inline]
    pub fn tick(&self) -> OsTick {
        self.tick_src.now()
    }

    #[inline]
    pub fn state(&self) -> OsKernelState {
        self.state
    }

    #[inline]
    pub(crate) fn set_state(&mut self, state: OsKernelState) {
        self.state = state;
    }

    /// Number of completed scheduler rounds
    #[inline]
    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    #[inline]
    pub(crate) fn count_round(&mut self) {
        self.rounds = self.rounds.wrapping_add(1);
    }

    // ============ User flags ============

    #[inline]
    pub fn user_flags(&self) -> OsUserFlags {
        self.user_flags
    }

    #[inline]
    pub fn set_user_flag(&mut self, mask: OsUserFlags) {
        self.user_flags |= mask;
    }

    #[inline]
    pub fn clear_user_flag(&mut self, mask: OsUserFlags) {
        self.user_flags &= !mask;
    }

    #[inline]
    pub fn toggle_user_flag(&mut self, mask: OsUserFlags) {
        self.user_flags ^= mask;
    }

    /// Check whether any bit of `mask` is set
    #[inline]
    pub fn is_user_flag_set(&self, mask: OsUserFlags) -> bool {
        self.user_flags & mask != 0
    }

    // ============ Random numbers ============

    /// Next value of the kernel's xorshift generator
    pub fn random_u32(&mut self) -> u32 {
        let mut x = self.rand;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.rand = x;
        x
    }

    /// Reseed the generator; a zero seed selects the default seed
    pub fn seed_random(&mut self, seed: u32) {
        self.rand = if seed == 0 { CFG_RAND_SEED } else { seed };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::OsManualTick;

    static TICK: OsManualTick = OsManualTick::new(0);

    #[test]
    fn test_user_flags() {
        let mut k = Kernel::new(&TICK);
        k.set_user_flag(0x0005);
        assert!(k.is_user_flag_set(0x0001));
        k.toggle_user_flag(0x0003);
        assert_eq!(k.user_flags(), 0x0006);
        k.clear_user_flag(0x0002);
        assert_eq!(k.user_flags(), 0x0004);
        assert!(!k.is_user_flag_set(0x0001));
    }

    #[test]
    fn test_random_is_seeded() {
        let mut a = Kernel::new(&TICK);
        let mut b = Kernel::new(&TICK);
        let first = a.random_u32();
        assert_ne!(first, 0);
        assert_eq!(first, b.random_u32());

        b.seed_random(0);
        assert_eq!(b.random_u32(), first);
        b.seed_random(7);
        assert_ne!(b.random_u32(), a.random_u32());
    }

    #[test]
    fn test_init_requires_a_task() {
        let mut k = Kernel::new(&TICK);
        assert_eq!(k.os_init(|_| {}), Err(OsError::OsNoAppTask));
        assert_eq!(k.state(), OsKernelState::Initializing);
    }
}
