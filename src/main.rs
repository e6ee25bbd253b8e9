//! lwsched demo
//!
//! Runs the sample task table on a hosted machine:
//! - `timer` keeps the tick (one tick per second of wall time)
//! - `burst` prints ten times as fast as it can, then blocks on a flag
//! - `paced` prints once per tick and releases the flag every ten ticks
//! - `keypad` watches a simulated switch ladder
//!
//! Nothing here returns; stop it with Ctrl-C.

use std::io::Write as _;
use std::time::{Duration, Instant};

use lazy_static::lazy_static;
use log::LevelFilter;
use lwsched::switch::SwitchInput;
use lwsched::{console, println, task_table, Context, ResumeHint, TaskResult, WaitFlag};

/// Wall time per tick.
const TICK_PERIOD: Duration = Duration::from_secs(1);

const LOG_LEVEL: LevelFilter = LevelFilter::Info;

lazy_static! {
    static ref EPOCH: Instant = Instant::now();
}

/// Held by `burst` after its tenth run, released by `paced`.
static BURST_LOCK: WaitFlag = WaitFlag::new();

struct Stdout;

impl core::fmt::Write for Stdout {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        std::io::stdout()
            .write_all(s.as_bytes())
            .map_err(|_| core::fmt::Error)
    }
}

fn periods_elapsed() -> u64 {
    (EPOCH.elapsed().as_nanos() / TICK_PERIOD.as_nanos()) as u64
}

/// The only task that advances the tick, so it can't sleep on it.
fn timer(ctx: &mut Context<'_, '_>) -> TaskResult {
    let now = periods_elapsed();
    let advanced = {
        let seen = ctx.storage::<u64>()?;
        let advanced = now != *seen;
        *seen = now;
        advanced
    };
    if advanced {
        ctx.add_tick(1);
    }
    Err(ctx.yield_next())
}

fn burst(ctx: &mut Context<'_, '_>) -> TaskResult {
    let runs = ctx.storage::<u32>()?;
    println!("burst");
    *runs += 1;
    if *runs >= 10 {
        *runs = 0;
        return Err(ctx.wait(&BURST_LOCK));
    }
    Ok(ResumeHint::TOP)
}

fn paced(ctx: &mut Context<'_, '_>) -> TaskResult {
    println!("paced {}", ctx.tick());
    let runs = ctx.storage::<u32>()?;
    *runs += 1;
    if *runs >= 10 {
        *runs = 0;
        ctx.release(&BURST_LOCK);
    }
    Err(ctx.sleep_for(1))
}

/// A ladder sample that walks through every band, one step per second.
fn simulated_ladder() -> u16 {
    const SAMPLES: [u16; 6] = [50, 150, 300, 450, 600, 1023];
    SAMPLES[(periods_elapsed() % SAMPLES.len() as u64) as usize]
}

#[derive(Default)]
struct Keypad {
    input: Option<SwitchInput<fn() -> u16>>,
}

fn keypad(ctx: &mut Context<'_, '_>) -> TaskResult {
    let keypad = ctx.storage::<Keypad>()?;
    let input = keypad
        .input
        .get_or_insert_with(|| SwitchInput::new(simulated_ladder as fn() -> u16));
    if let Some(switch) = input.poll() {
        println!("keypad {}", switch);
    }
    Err(ctx.sleep_for(1))
}

fn main() {
    console::init(Box::leak(Box::new(Stdout)));
    if let Err(e) = console::init_logger(LOG_LEVEL) {
        eprintln!("logger already installed: {}", e);
    }

    println!("lwsched demo");
    println!("============");
    lazy_static::initialize(&EPOCH);

    let table = task_table! {
        Ready => timer,
        Ready => burst,
        Ready => paced,
        Ready => keypad,
    };

    let mut sched = match table.build() {
        Ok(sched) => sched,
        Err(e) => {
            eprintln!("bad task table: {}", e);
            std::process::exit(1);
        }
    };
    sched.run()
}
