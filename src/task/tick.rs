//! Logical time for sleeping tasks.
//!
//! The tick is a signed counter advanced by one designated task (or a
//! timer collaborator). Advancing it wraps at the ends of `i32`; deadlines
//! are plain signed comparisons, so a deadline computed across the wrap
//! is already due.

use core::fmt;

/// A point on the scheduler's tick line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Tick(i32);

impl Tick {
    pub const ZERO: Tick = Tick(0);

    pub const fn new(raw: i32) -> Self {
        Tick(raw)
    }

    pub const fn raw(self) -> i32 {
        self.0
    }

    /// `self + n`, wrapping at the ends of `i32`.
    #[must_use]
    pub const fn wrapping_add(self, n: i32) -> Self {
        Tick(self.0.wrapping_add(n))
    }

    /// Has this tick reached (or passed) `deadline`?
    pub const fn reached(self, deadline: Tick) -> bool {
        self.0 >= deadline.0
    }
}

impl From<i32> for Tick {
    fn from(raw: i32) -> Self {
        Tick(raw)
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reached_is_inclusive() {
        let deadline = Tick::new(5);
        assert!(!Tick::new(4).reached(deadline));
        assert!(Tick::new(5).reached(deadline));
        assert!(Tick::new(6).reached(deadline));
    }

    #[test]
    fn deadline_across_the_wrap_is_due() {
        let now = Tick::new(i32::MAX - 1);
        let deadline = now.wrapping_add(3);
        assert_eq!(deadline.raw(), i32::MIN + 1);
        assert!(now.reached(deadline));
        assert!(now.wrapping_add(3).reached(deadline));
    }

    #[test]
    fn far_negative_deadline_is_due() {
        let now = Tick::from(100);
        assert!(now.reached(Tick::new(i32::MIN + 50)));
        assert!(!Tick::new(i32::MIN + 50).reached(now));
    }
}
