//! Analog switch ladder decoding.
//!
//! A keypad shield wires its five switches to one analog pin through a
//! resistor ladder, so each switch pulls the reading into its own band.
//! Only one switch can be read at a time.

use core::fmt;

/// The switches on the ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Switch {
    Right,
    Up,
    Down,
    Left,
    Select,
}

impl Switch {
    pub const fn name(self) -> &'static str {
        match self {
            Switch::Right => "Right",
            Switch::Up => "Up",
            Switch::Down => "Down",
            Switch::Left => "Left",
            Switch::Select => "Select",
        }
    }
}

impl fmt::Display for Switch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// Upper bound (exclusive) of each band, lowest first, for a 10-bit ADC.
pub const LADDER: &[(u16, Switch)] = &[
    (100, Switch::Right),
    (200, Switch::Up),
    (400, Switch::Down),
    (500, Switch::Left),
    (800, Switch::Select),
];

/// Map a raw sample to the switch it selects, if any.
pub fn decode(raw: u16) -> Option<Switch> {
    LADDER
        .iter()
        .find(|&&(limit, _)| raw < limit)
        .map(|&(_, switch)| switch)
}

/// A switch input that reports changes.
pub struct SwitchInput<F> {
    sample: F,
    last: Option<Switch>,
}

impl<F: FnMut() -> u16> SwitchInput<F> {
    pub fn new(sample: F) -> Self {
        SwitchInput { sample, last: None }
    }

    /// The switch held right now.
    pub fn read(&mut self) -> Option<Switch> {
        decode((self.sample)())
    }

    /// A newly pressed switch, or `None` if nothing changed (or the
    /// ladder was released).
    pub fn poll(&mut self) -> Option<Switch> {
        let now = self.read();
        if now == self.last {
            return None;
        }
        self.last = now;
        now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_edges() {
        assert_eq!(decode(0), Some(Switch::Right));
        assert_eq!(decode(99), Some(Switch::Right));
        assert_eq!(decode(100), Some(Switch::Up));
        assert_eq!(decode(399), Some(Switch::Down));
        assert_eq!(decode(400), Some(Switch::Left));
        assert_eq!(decode(799), Some(Switch::Select));
        assert_eq!(decode(800), None);
        assert_eq!(decode(1023), None);
    }

    #[test]
    fn poll_reports_edges_only() {
        let mut samples = [1023, 50, 50, 1023, 450].into_iter();
        let mut input = SwitchInput::new(move || samples.next().unwrap_or(1023));
        assert_eq!(input.poll(), None);
        assert_eq!(input.poll(), Some(Switch::Right));
        assert_eq!(input.poll(), None);
        assert_eq!(input.poll(), None);
        assert_eq!(input.poll(), Some(Switch::Left));
    }
}
