//! Keyboard layout and the key latch.
//!
//! ```text
//! 1 2 3 C      1 2 3 4
//! 4 5 6 D      Q W E R
//! 7 8 9 E      A S D F
//! A 0 B F      Z X C V
//! ```

use crossterm::event::KeyCode;

/// Ticks a press stays latched when no release event follows
pub const DEFAULT_HOLD_TICKS: u8 = 6;

#[rustfmt::skip]
const LAYOUT: [(char, u8); 16] = [
    ('1', 0x1), ('2', 0x2), ('3', 0x3), ('4', 0xC),
    ('q', 0x4), ('w', 0x5), ('e', 0x6), ('r', 0xD),
    ('a', 0x7), ('s', 0x8), ('d', 0x9), ('f', 0xE),
    ('z', 0xA), ('x', 0x0), ('c', 0xB), ('v', 0xF),
];

/// Chip-8 key index for a terminal key, case insensitive
pub fn key_index(code: KeyCode) -> Option<u8> {
    match code {
        KeyCode::Char(c) => {
            let c = c.to_ascii_lowercase();
            LAYOUT
                .iter()
                .find(|(key, _)| *key == c)
                .map(|&(_, index)| index)
        }
        _ => None,
    }
}

/// Keeps every press alive for a number of ticks
///
/// Terminals report presses (and auto repeats), but not releases.
#[derive(Debug, Clone)]
pub struct KeyLatch {
    remaining: [u8; 16],
    hold_ticks: u8,
}

impl KeyLatch {
    pub fn new(hold_ticks: u8) -> Self {
        Self {
            remaining: [0; 16],
            hold_ticks: hold_ticks.max(1),
        }
    }

    pub fn press(&mut self, index: u8) {
        if let Some(ttl) = self.remaining.get_mut(index as usize) {
            *ttl = self.hold_ticks;
        }
    }

    /// Age every held key by one tick
    pub fn tick(&mut self) {
        self.remaining
            .iter_mut()
            .for_each(|ttl| *ttl = ttl.saturating_sub(1));
    }

    pub fn state(&self) -> [bool; 16] {
        let mut keys = [false; 16];
        keys.iter_mut()
            .zip(self.remaining.iter())
            .for_each(|(key, &ttl)| *key = ttl > 0);
        keys
    }
}

impl Default for KeyLatch {
    fn default() -> Self {
        Self::new(DEFAULT_HOLD_TICKS)
    }
}
