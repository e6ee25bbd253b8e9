//! Console output and the `log` backend.
//!
//! The console is whatever `fmt::Write` sink the board (or host) installs
//! with [`init`]. Until one is installed, output is dropped.

use core::fmt::{self, Write};

use lazy_static::lazy_static;
use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};
use spin::Mutex;

/// An installed output device.
pub type Sink = &'static mut (dyn Write + Send);

pub struct Console {
    sink: Option<Sink>,
}

impl Console {
    const fn new() -> Self {
        Console { sink: None }
    }

    /// Whether a sink has been installed.
    pub fn is_attached(&self) -> bool {
        self.sink.is_some()
    }
}

lazy_static! {
    pub static ref CONSOLE: Mutex<Console> = Mutex::new(Console::new());
}

/// Install the console sink, returning the previous one (if any).
pub fn init(sink: Sink) -> Option<Sink> {
    CONSOLE.lock().sink.replace(sink)
}

/// Remove the console sink.
pub fn detach() -> Option<Sink> {
    CONSOLE.lock().sink.take()
}

#[doc(hidden)]
pub fn _print(args: fmt::Arguments) {
    let mut console = CONSOLE.lock();
    if let Some(sink) = console.sink.as_mut() {
        // A failing sink has nowhere to report to.
        let _ = sink.write_fmt(args);
    }
}

/// Print to the console.
#[macro_export]
macro_rules! print {
    ($($arg:tt)*) => ($crate::console::_print(format_args!($($arg)*)));
}

/// Print to the console with newline.
#[macro_export]
macro_rules! println {
    () => ($crate::print!("\n"));
    ($($arg:tt)*) => ($crate::print!("{}\n", format_args!($($arg)*)));
}

// ─── log backend ────────────────────────────────────────────────

struct ConsoleLogger;

static LOGGER: ConsoleLogger = ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        _print(format_args!(
            "[{:<5}] {}: {}\n",
            record.level(),
            record.target(),
            record.args()
        ));
    }

    fn flush(&self) {}
}

/// Route `log` records to the console at `level` and below.
pub fn init_logger(level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_logger(&LOGGER)?;
    log::set_max_level(level);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::string::String;

    static CAPTURED: Mutex<String> = Mutex::new(String::new());

    struct Capture;

    impl Write for Capture {
        fn write_str(&mut self, s: &str) -> fmt::Result {
            CAPTURED.lock().push_str(s);
            Ok(())
        }
    }

    #[test]
    fn println_reaches_installed_sink() {
        init(std::boxed::Box::leak(std::boxed::Box::new(Capture)));
        assert!(CONSOLE.lock().is_attached());

        crate::println!("Task{}", 1);
        crate::print!("tick {}", 7);

        let previous = detach();
        assert!(previous.is_some());
        assert!(!CONSOLE.lock().is_attached());

        // Dropped while detached.
        crate::println!("lost");

        assert_eq!(CAPTURED.lock().as_str(), "Task1\ntick 7");
    }
}
