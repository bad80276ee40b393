use heapless::{consts::U16, Vec};

use crate::frame::Frame;
use crate::memory::{Memory, PROGRAM_START};
use crate::timer::TimerClock;

/// Maximal depth of nested subroutine calls
pub const STACK_DEPTH: usize = 16;

/// Index of the flag register
pub(crate) const VF: usize = 0xF;

/// Everything a chip-8 program can observe or mutate
///
/// Holds no behaviour of its own, `Ember8` is the only thing mutating it,
/// apart from the key latch which is written by the host.
#[derive(Debug, Clone)]
pub struct MachineState {
    pub(crate) v: [u8; 16],
    pub(crate) i: u16,
    pub(crate) pc: u16,
    pub(crate) memory: Memory,
    pub(crate) stack: Vec<u16, U16>,
    pub(crate) timers: TimerClock,
    pub(crate) frame: Frame,
    pub(crate) keys: [bool; 16],
}

impl MachineState {
    /// Zeroed machine with the font installed and pc at 0x200
    pub fn new() -> Self {
        Self {
            v: [0; 16],
            i: 0,
            pc: PROGRAM_START,
            memory: Memory::new(),
            stack: Vec::new(),
            timers: TimerClock::new(),
            frame: Frame::new(),
            keys: [false; 16],
        }
    }

    /// Lowest index of a currently held key
    pub(crate) fn first_pressed_key(&self) -> Option<u8> {
        self.keys.iter().position(|&k| k).map(|idx| idx as u8)
    }

    /// Keys above 0xF don't exist and are never pressed
    #[inline]
    pub(crate) fn is_pressed(&self, key: u8) -> bool {
        self.keys.get(key as usize).copied().unwrap_or(false)
    }
}

impl Default for MachineState {
    fn default() -> Self {
        Self::new()
    }
}
