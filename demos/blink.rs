//! Blink Example - a task and a timer sharing a user flag on a Cortex-M board
//!
//! Board support is left to the application; the LED is reported over
//! defmt instead of driven.

#![no_std]
#![no_main]

use cortex_m_rt::entry;
use esos::port::OsSysTick;
use esos::*;

/// Core clock of the board after reset
const CORE_CLOCK_HZ: u32 = 16_000_000;

const LED: OsUserFlags = 0x0001;

static TICK: OsSysTick = OsSysTick::new(CORE_CLOCK_HZ);

// ============ Tasks ============

const ON: OsResume = 1;
const OFF: OsResume = 2;

fn blink_task(cx: &mut OsTaskCx<'_>) -> OsFlow {
    loop {
        match cx.resume_point() {
            OS_RESUME_BEGIN => {
                esos::info!("blink task started");
                cx.goto(ON);
            }
            ON => {
                cx.wait_ticks(500)?;
                cx.kernel_mut().set_user_flag(LED);
                esos::info!("LED ON");
                cx.goto(OFF);
            }
            OFF => {
                cx.wait_ticks(500)?;
                cx.kernel_mut().clear_user_flag(LED);
                esos::info!("LED OFF");
                cx.goto(ON);
            }
            _ => return OS_CONTINUE,
        }
    }
}

fn heartbeat(cx: &mut OsTimerCx<'_>) {
    let led = cx.kernel().is_user_flag_set(LED);
    esos::info!("heartbeat at {}, led {}", cx.now(), led);
}

fn user_init(k: &mut Kernel) {
    if k.register_task(blink_task).is_err() {
        esos::error!("blink task registration failed");
    }
    if k.register_timer(heartbeat, 2000).is_err() {
        esos::error!("heartbeat timer registration failed");
    }
}

#[entry]
fn main() -> ! {
    let mut kernel = Kernel::new(&TICK);
    if let Err(e) = kernel.os_start(user_init) {
        esos::error!("kernel start failed: {}", e.code());
    }
    loop {
        cortex_m::asm::wfi();
    }
}
