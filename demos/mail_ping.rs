//! Mail Example - two tasks exchanging confirmed mail on the host
//!
//! Run with `cargo run --example mail_ping --features std`.

use esos::port::{os_idle, OsHostTick};
use esos::*;

static TICK: OsHostTick = OsHostTick::new();

const DONE: OsUserFlags = 0x0001;
const PINGS: u32 = 5;

// ============ Tasks ============

const PING: OsResume = 1;
const PAUSE: OsResume = 2;

fn pinger(cx: &mut OsTaskCx<'_>) -> OsFlow {
    loop {
        match cx.resume_point() {
            OS_RESUME_BEGIN => cx.goto(PING),
            PING => {
                let peer = match cx.kernel().task_handle(ponger) {
                    Some(peer) => peer,
                    None => return cx.exit(),
                };
                let seq = cx.locals()[0];
                let msg = match OsMsg::uint32(&[seq]) {
                    Ok(msg) => msg,
                    Err(_) => return cx.exit(),
                };
                cx.send_mail_wait_delivery(peer, &msg)?;
                println!("[{:>5}] ping {} delivered", cx.now(), seq);
                cx.locals()[0] += 1;
                cx.goto(PAUSE);
            }
            PAUSE => {
                cx.wait_ticks(250)?;
                if cx.locals()[0] >= PINGS {
                    cx.kernel_mut().set_user_flag(DONE);
                    return cx.exit();
                }
                cx.goto(PING);
            }
            _ => return OS_CONTINUE,
        }
    }
}

fn ponger(cx: &mut OsTaskCx<'_>) -> OsFlow {
    loop {
        cx.wait_for_mail()?;
        while let Some(msg) = cx.read_mail() {
            println!(
                "[{:>5}] pong {:?} from task {}, posted at {}",
                cx.now(),
                msg.u32_at(0),
                msg.from(),
                msg.postmark()
            );
        }
    }
}

fn user_init(k: &mut Kernel) {
    for task in [pinger as OsTaskFn, ponger] {
        if let Err(e) = k.register_task(task) {
            eprintln!("registration failed: {:?}", e);
        }
    }
}

fn main() {
    let mut kernel = Kernel::new(&TICK);
    if let Err(e) = kernel.os_init(user_init) {
        eprintln!("init failed: {:?}", e);
        return;
    }

    while !kernel.is_user_flag_set(DONE) {
        if kernel.run_round().is_err() {
            break;
        }
        os_idle();
    }
    println!("{} rounds", kernel.rounds());
}
