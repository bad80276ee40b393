use core::fmt;

use log::trace;

/// Size of addressable memory
pub const MEM_LENGTH: usize = 4096;
/// Address at which programs are loaded and execution starts
pub const PROGRAM_START: u16 = 0x200;
/// Largest program image that fits between `PROGRAM_START` and the end of memory
pub const PROGRAM_CAPACITY: usize = MEM_LENGTH - PROGRAM_START as usize;
/// Bytes occupied by a single font glyph
pub const GLYPH_LENGTH: u16 = 5;

const ADDR_MASK: u16 = 0x0FFF;

#[rustfmt::skip]
const FONT: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

/// Program image rejected by `Memory::load_program`
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LoadError {
    /// Image doesn't fit between `PROGRAM_START` and the end of memory
    ProgramTooLarge { size: usize, capacity: usize },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::ProgramTooLarge { size, capacity } => write!(
                f,
                "program of {} bytes exceeds available memory of {} bytes",
                size, capacity
            ),
        }
    }
}

/// 4KiB of chip-8 memory
///
/// Every address is taken modulo 4096, so neither the program counter nor the
/// index register can reach outside of it. The font area is read-only for
/// programs.
#[derive(Clone)]
pub struct Memory([u8; MEM_LENGTH]);

impl Memory {
    /// Zeroed memory with the font installed at address 0
    pub fn new() -> Self {
        let mut memory = Self([0; MEM_LENGTH]);
        memory.0[..FONT.len()].copy_from_slice(&FONT);
        memory
    }

    #[inline]
    pub fn read(&self, addr: u16) -> u8 {
        self.0[(addr & ADDR_MASK) as usize]
    }

    /// Store `value`, writes landing in the font are dropped
    #[inline]
    pub fn write(&mut self, addr: u16, value: u8) {
        let addr = (addr & ADDR_MASK) as usize;
        if addr < FONT.len() {
            trace!("dropping write of {:#04X} to font at {:#05X}", value, addr);
            return;
        }
        self.0[addr] = value;
    }

    /// Address of the glyph for `digit`
    ///
    /// Not clamped to hex digits, values above 0xF point past the font.
    pub fn glyph_addr(digit: u8) -> u16 {
        digit as u16 * GLYPH_LENGTH
    }

    /// Copy program to memory from 0x200 (_start address)
    ///
    /// Memory is left untouched when the image doesn't fit.
    pub fn load_program(&mut self, prog: &[u8]) -> Result<(), LoadError> {
        if prog.len() > PROGRAM_CAPACITY {
            return Err(LoadError::ProgramTooLarge {
                size: prog.len(),
                capacity: PROGRAM_CAPACITY,
            });
        }
        let start = PROGRAM_START as usize;
        self.0[start..start + prog.len()].copy_from_slice(prog);
        Ok(())
    }

    pub fn as_raw(&self) -> &[u8] {
        &self.0
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Memory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memory").field("len", &self.0.len()).finish()
    }
}
