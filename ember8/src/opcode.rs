use core::convert::TryFrom;
use core::fmt;

use crate::memory::Memory;

/// An enum representing 34 supported opcodes of chip-8 architecture
///
/// Based on [chip8 mastering](http://mattmik.com/files/chip8/mastering/chip8.html)
///
/// Machine language subroutines (`0NNN`) are not supported and decode to
/// `UnknownOpCode`, same as any other unassigned word.
///
/// Examples:
/// ```
/// use core::convert::TryFrom;
/// use ember8::opcode::{OpCode, UnknownOpCode};
///
/// assert_eq!(
///     OpCode::try_from(0x8AB4u16),
///     Ok(OpCode::_8XY4 { x: 0xA, y: 0xB }),
/// );
/// assert_eq!(OpCode::try_from(0x8AB9u16), Err(UnknownOpCode(0x8AB9)));
/// ```
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum OpCode {
    /// Clear the screen
    _00E0,
    /// Return from a subroutine
    _00EE,
    /// Jump to address NNN
    _1NNN { nnn: u16 },
    /// Execute subroutine starting at address NNN
    _2NNN { nnn: u16 },
    /// Skip the following instruction if the value of register VX equals NN
    _3XNN { x: u8, nn: u8 },
    /// Skip the following instruction if the value of register VX is not equal to NN
    _4XNN { x: u8, nn: u8 },
    /// Skip the following instruction if the value of register VX is equal to the value of register VY
    _5XY0 { x: u8, y: u8 },
    /// Store number NN in register VX
    _6XNN { x: u8, nn: u8 },
    /// Add the value NN to register VX
    _7XNN { x: u8, nn: u8 },
    /// Store the value of register VY in register VX
    _8XY0 { x: u8, y: u8 },
    /// Set VX to VX OR VY
    _8XY1 { x: u8, y: u8 },
    /// Set VX to VX AND VY
    _8XY2 { x: u8, y: u8 },
    /// Set VX to VX XOR VY
    _8XY3 { x: u8, y: u8 },
    /// Add the value of register VY to register VX, Set VF to 01 if a carry occurs, Set VF to 00 if a carry does not occur
    _8XY4 { x: u8, y: u8 },
    /// Subtract the value of register VY from register VX, Set VF to 00 if a borrow occurs, Set VF to 01 if a borrow does not occur
    _8XY5 { x: u8, y: u8 },
    /// Shift register VX right by one bit, Set register VF to the least significant bit prior to the shift
    _8XY6 { x: u8, y: u8 },
    /// Set register VX to the value of VY minus VX, Set VF to 00 if a borrow occurs, Set VF to 01 if a borrow does not occur
    _8XY7 { x: u8, y: u8 },
    /// Shift register VX left by one bit, Set register VF to the most significant bit prior to the shift
    _8XYE { x: u8, y: u8 },
    /// Skip the following instruction if the value of register VX is not equal to the value of register VY
    _9XY0 { x: u8, y: u8 },
    /// Store memory address NNN in register I
    _ANNN { nnn: u16 },
    /// Jump to address NNN + V0
    _BNNN { nnn: u16 },
    /// Set VX to a random number with a mask of NN
    _CXNN { x: u8, nn: u8 },
    /// Draw a sprite at position VX, VY with N bytes of sprite data starting at the address stored in I, Set VF to 01 if any set pixels are changed to unset, and 00 otherwise
    _DXYN { x: u8, y: u8, n: u8 },
    /// Skip the following instruction if the key corresponding to the hex value currently stored in register VX is pressed
    _EX9E { x: u8 },
    /// Skip the following instruction if the key corresponding to the hex value currently stored in register VX is not pressed
    _EXA1 { x: u8 },
    /// Store the current value of the delay timer in register VX
    _FX07 { x: u8 },
    /// Wait for a keypress and store the result in register VX
    _FX0A { x: u8 },
    /// Set the delay timer to the value of register VX
    _FX15 { x: u8 },
    /// Set the sound timer to the value of register VX
    _FX18 { x: u8 },
    /// Add the value stored in register VX to register I
    _FX1E { x: u8 },
    /// Set I to the memory address of the sprite data corresponding to the hexadecimal digit stored in register VX
    _FX29 { x: u8 },
    /// Store the binary-coded decimal equivalent of the value stored in register VX at addresses I, I+1, and I+2
    _FX33 { x: u8 },
    /// Store the values of registers V0 to VX inclusive in memory starting at address I
    _FX55 { x: u8 },
    /// Fill registers V0 to VX inclusive with the values stored in memory starting at address I
    _FX65 { x: u8 },
}

/// Instruction word that doesn't match any operation of its group
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct UnknownOpCode(pub u16);

impl fmt::Display for UnknownOpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown operation code {:#06X}", self.0)
    }
}

/// Fetch the big-endian instruction word stored at `pc` and `pc + 1`
pub fn fetch(memory: &Memory, pc: u16) -> u16 {
    (memory.read(pc) as u16) << 8 | memory.read(pc.wrapping_add(1)) as u16
}

/// Primary group, bits 12..15
pub fn read_first(raw: u16) -> u8 {
    (raw >> 12 & 0x000Fu16) as u8
}

/// Sub-opcode nibble, bits 0..3
pub fn read_last(raw: u16) -> u8 {
    (raw & 0x000Fu16) as u8
}

/// Register index X, bits 8..11
pub fn read_x(raw: u16) -> u8 {
    (raw >> 8 & 0x000Fu16) as u8
}

/// Register index Y, bits 4..7
pub fn read_y(raw: u16) -> u8 {
    (raw >> 4 & 0x000Fu16) as u8
}

/// 8-bit immediate, bits 0..7
pub fn read_nn(raw: u16) -> u8 {
    (raw & 0x00FFu16) as u8
}

/// 12-bit address, bits 0..11
pub fn read_nnn(raw: u16) -> u16 {
    raw & 0x0FFFu16
}

impl TryFrom<u16> for OpCode {
    type Error = UnknownOpCode;

    fn try_from(raw: u16) -> Result<Self, Self::Error> {
        let (x, y) = (read_x(raw), read_y(raw));
        let (nn, nnn) = (read_nn(raw), read_nnn(raw));
        let decoded = match read_first(raw) {
            0x0 => decode_system(nnn),
            0x1 => Some(OpCode::_1NNN { nnn }),
            0x2 => Some(OpCode::_2NNN { nnn }),
            0x3 => Some(OpCode::_3XNN { x, nn }),
            0x4 => Some(OpCode::_4XNN { x, nn }),
            // low nibble of register compares is not checked
            0x5 => Some(OpCode::_5XY0 { x, y }),
            0x6 => Some(OpCode::_6XNN { x, nn }),
            0x7 => Some(OpCode::_7XNN { x, nn }),
            0x8 => decode_alu(x, y, read_last(raw)),
            0x9 => Some(OpCode::_9XY0 { x, y }),
            0xA => Some(OpCode::_ANNN { nnn }),
            0xB => Some(OpCode::_BNNN { nnn }),
            0xC => Some(OpCode::_CXNN { x, nn }),
            0xD => Some(OpCode::_DXYN { x, y, n: read_last(raw) }),
            0xE => decode_keys(x, nn),
            _ => decode_misc(x, nn),
        };
        decoded.ok_or(UnknownOpCode(raw))
    }
}

/// Group 0, only the display clear and return are supported
fn decode_system(nnn: u16) -> Option<OpCode> {
    match nnn {
        0x0E0 => Some(OpCode::_00E0),
        0x0EE => Some(OpCode::_00EE),
        _ => None,
    }
}

/// Group 8, selected by the lowest nibble
fn decode_alu(x: u8, y: u8, op: u8) -> Option<OpCode> {
    let opcode = match op {
        0x0 => OpCode::_8XY0 { x, y },
        0x1 => OpCode::_8XY1 { x, y },
        0x2 => OpCode::_8XY2 { x, y },
        0x3 => OpCode::_8XY3 { x, y },
        0x4 => OpCode::_8XY4 { x, y },
        0x5 => OpCode::_8XY5 { x, y },
        0x6 => OpCode::_8XY6 { x, y },
        0x7 => OpCode::_8XY7 { x, y },
        0xE => OpCode::_8XYE { x, y },
        _ => return None,
    };
    Some(opcode)
}

/// Group E, selected by the low byte
fn decode_keys(x: u8, op: u8) -> Option<OpCode> {
    match op {
        0x9E => Some(OpCode::_EX9E { x }),
        0xA1 => Some(OpCode::_EXA1 { x }),
        _ => None,
    }
}

/// Group F, selected by the low byte
fn decode_misc(x: u8, op: u8) -> Option<OpCode> {
    let opcode = match op {
        0x07 => OpCode::_FX07 { x },
        0x0A => OpCode::_FX0A { x },
        0x15 => OpCode::_FX15 { x },
        0x18 => OpCode::_FX18 { x },
        0x1E => OpCode::_FX1E { x },
        0x29 => OpCode::_FX29 { x },
        0x33 => OpCode::_FX33 { x },
        0x55 => OpCode::_FX55 { x },
        0x65 => OpCode::_FX65 { x },
        _ => return None,
    };
    Some(opcode)
}
