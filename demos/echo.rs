//! Comm Example - a line echo service fed from stdin on the host
//!
//! A reader thread plays the part of the UART receive interrupt and a
//! writer thread the transmit interrupt. Inside the kernel one task echoes
//! every byte in hex, another prints an uptime tick from a timer.
//!
//! Run with `cargo run --example echo --features std`.

use std::io::{Read, Write};
use std::thread;

use esos::comm::{os_comm_put_bytes, os_comm_put_hex_u32, os_comm_put_hex_u8};
use esos::port::OsHostTick;
use esos::*;

static TICK: OsHostTick = OsHostTick::new();
static CONSOLE: OsComm = OsComm::new();

const UPTIME: OsUserFlags = 0x0001;

// ============ Tasks ============

const ECHO: OsResume = 1;
const SPACE: OsResume = 2;
const NEWLINE: OsResume = 3;

const HEAD: OsResume = 1;
const VALUE: OsResume = 2;
const TAIL: OsResume = 3;

fn echo_task(cx: &mut OsTaskCx<'_>) -> OsFlow {
    loop {
        match cx.resume_point() {
            OS_RESUME_BEGIN => {
                let ready = !CONSOLE.input.is_empty();
                cx.wait_until(ready)?;
                match CONSOLE.input.pop() {
                    Some(b'\n') => cx.goto(NEWLINE),
                    Some(byte) => {
                        cx.locals()[0] = byte as u32;
                        cx.goto(ECHO);
                    }
                    None => {}
                }
            }
            ECHO => {
                let byte = cx.locals()[0] as u8;
                cx.spawn_and_wait(os_comm_put_hex_u8, (&CONSOLE.output, byte))?;
                cx.goto(SPACE);
            }
            SPACE => {
                cx.spawn_and_wait(os_comm_put_bytes, (&CONSOLE.output, &b" "[..]))?;
                cx.goto(OS_RESUME_BEGIN);
            }
            NEWLINE => {
                cx.spawn_and_wait(os_comm_put_bytes, (&CONSOLE.output, &b"\n"[..]))?;
                cx.goto(OS_RESUME_BEGIN);
            }
            _ => return OS_CONTINUE,
        }
    }
}

fn uptime_task(cx: &mut OsTaskCx<'_>) -> OsFlow {
    loop {
        match cx.resume_point() {
            OS_RESUME_BEGIN => {
                let due = cx.kernel().is_user_flag_set(UPTIME);
                cx.wait_until(due)?;
                cx.kernel_mut().clear_user_flag(UPTIME);
                cx.locals()[0] = cx.now();
                cx.goto(HEAD);
            }
            HEAD => {
                cx.spawn_and_wait(os_comm_put_bytes, (&CONSOLE.output, &b"[uptime "[..]))?;
                cx.goto(VALUE);
            }
            VALUE => {
                let now = cx.locals()[0];
                cx.spawn_and_wait(os_comm_put_hex_u32, (&CONSOLE.output, now))?;
                cx.goto(TAIL);
            }
            TAIL => {
                cx.spawn_and_wait(os_comm_put_bytes, (&CONSOLE.output, &b"]\n"[..]))?;
                cx.goto(OS_RESUME_BEGIN);
            }
            _ => return OS_CONTINUE,
        }
    }
}

fn uptime_timer(cx: &mut OsTimerCx<'_>) {
    cx.kernel_mut().set_user_flag(UPTIME);
}

fn user_init(k: &mut Kernel) {
    for task in [echo_task as OsTaskFn, uptime_task] {
        if let Err(e) = k.register_task(task) {
            eprintln!("registration failed: {:?}", e);
        }
    }
    if let Err(e) = k.register_timer(uptime_timer, 10_000) {
        eprintln!("timer registration failed: {:?}", e);
    }
}

fn main() {
    thread::spawn(|| {
        for byte in std::io::stdin().bytes().map_while(Result::ok) {
            while CONSOLE.input.push(byte).is_err() {
                thread::yield_now();
            }
        }
    });

    thread::spawn(|| {
        let mut out = [0u8; CFG_COMM_BUF_SIZE];
        let stdout = std::io::stdout();
        loop {
            let n = CONSOLE.output.drain_into(&mut out);
            if n == 0 {
                thread::sleep(std::time::Duration::from_millis(1));
                continue;
            }
            let mut lock = stdout.lock();
            let _ = lock.write_all(&out[..n]);
            let _ = lock.flush();
        }
    });

    let mut kernel = Kernel::new(&TICK);
    if let Err(e) = kernel.os_start(user_init) {
        eprintln!("kernel start failed: {:?}", e);
    }
}
