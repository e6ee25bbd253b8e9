//! Wait flags.
//!
//! A wait flag is a byte owned by application code. Zero means
//! "available"; any other value means "held" and blocks every task
//! waiting on it. Flags are usually `static`s shared by the tasks that
//! coordinate through them.

use core::fmt;
use core::sync::atomic::{AtomicU8, Ordering};

/// A byte-sized blocking condition.
///
/// Backed by an atomic only so it can live in a `static`; the scheduler
/// never runs two tasks at once, so relaxed ordering is all it needs.
pub struct WaitFlag(AtomicU8);

impl WaitFlag {
    /// A released flag.
    pub const fn new() -> Self {
        WaitFlag(AtomicU8::new(0))
    }

    pub fn get(&self) -> u8 {
        self.0.load(Ordering::Relaxed)
    }

    pub fn set(&self, value: u8) {
        self.0.store(value, Ordering::Relaxed);
    }

    pub fn is_held(&self) -> bool {
        self.get() != 0
    }

    /// Clear the flag. Waiters are promoted the next time the scheduler
    /// scans past them, not here.
    pub fn release(&self) {
        self.set(0);
    }

    /// Drop one hold. A waiter is promoted once the count reaches zero.
    /// Returns the remaining count; a released flag stays at zero.
    pub fn decrement(&self) -> u8 {
        let previous = self
            .0
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| {
                Some(n.saturating_sub(1))
            })
            .unwrap_or_else(|n| n);
        previous.saturating_sub(1)
    }
}

impl Default for WaitFlag {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for WaitFlag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("WaitFlag").field(&self.get()).finish()
    }
}
