use core::convert::TryFrom;
use core::fmt;

use log::{debug, error, trace, warn};

use crate::frame::{FrameView, HEIGHT, WIDTH};
use crate::memory::{LoadError, Memory};
use crate::opcode::{self, OpCode};
use crate::rng::RandomSource;
use crate::state::{MachineState, VF};
use crate::timer::Beep;

const ADDR_MASK: u16 = 0x0FFF;

/// Execution state of the engine
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum EngineState {
    /// Fetching and executing instructions
    Running,
    /// Suspended on `FX0A` until any key is held, then stores it in VX
    WaitingForKey { x: u8 },
}

/// Result of a completed step
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct StepOutcome {
    /// Frame was cleared or drawn to and should be presented again
    pub display_changed: bool,
}

/// Fatal conditions raised by a program
///
/// The machine is left as it was before the faulting instruction.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Fault {
    /// `2NNN` with 16 return addresses already stored
    StackOverflow { pc: u16 },
    /// `00EE` outside of any subroutine
    StackUnderflow { pc: u16 },
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fault::StackOverflow { pc } => {
                write!(f, "cannot enter subroutine at pc={:#05X}, stack is full", pc)
            }
            Fault::StackUnderflow { pc } => {
                write!(f, "cannot return at pc={:#05X}, not in subroutine", pc)
            }
        }
    }
}

/// How the program counter moves after an instruction
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Flow {
    Next,
    /// Like `Next`, but the frame changed
    Redraw,
    Skip,
    Jump(u16),
    Wait { x: u8 },
}

/// Chip-8 interpreter
///
/// Owns the whole machine state and a source of randomness. It doesn't keep
/// time on its own: the host calls `step` at the instruction cadence and
/// `tick` at 60Hz, and is free to service input and redraw in between.
pub struct Ember8<R: RandomSource> {
    state: MachineState,
    engine: EngineState,
    rng: R,
}

impl<R: RandomSource> Ember8<R> {
    pub fn new(rng: R) -> Self {
        Self {
            state: MachineState::new(),
            engine: EngineState::Running,
            rng,
        }
    }

    /// Rebuild the machine from scratch, discarding the loaded program
    pub fn reset(&mut self) {
        debug!("reset");
        self.state = MachineState::new();
        self.engine = EngineState::Running;
    }

    /// Load program from slice of bytes to memory from 0x200 (_start address)
    pub fn load(&mut self, prog: &[u8]) -> Result<(), LoadError> {
        self.state.memory.load_program(prog)?;
        debug!("loaded program of {} bytes", prog.len());
        Ok(())
    }

    /// Fetch, decode and execute a single instruction
    ///
    /// Returns `WouldBlock` while waiting for a key press, the same
    /// instruction is then re-evaluated by the next call.
    pub fn step(&mut self) -> nb::Result<StepOutcome, Fault> {
        if let EngineState::WaitingForKey { x } = self.engine {
            return self.resume_on_key(x);
        }

        let pc = self.state.pc;
        let raw = opcode::fetch(&self.state.memory, pc);
        match OpCode::try_from(raw) {
            Ok(opcode) => {
                trace!("pc={:#05X} {:04X} {:?}", pc, raw, opcode);
                self.run(opcode)
            }
            Err(unknown) => {
                warn!("{} at pc={:#05X}, skipping", unknown, pc);
                self.pc_increment(2);
                Ok(StepOutcome::default())
            }
        }
    }

    /// Run up to `steps` instructions, stopping early when waiting for a key
    ///
    /// Reports whether any of executed instructions changed the display.
    pub fn run_steps(&mut self, steps: u32) -> Result<StepOutcome, Fault> {
        let mut outcome = StepOutcome::default();
        for _ in 0..steps {
            match self.step() {
                Ok(step) => outcome.display_changed |= step.display_changed,
                Err(nb::Error::WouldBlock) => break,
                Err(nb::Error::Other(fault)) => return Err(fault),
            }
        }
        Ok(outcome)
    }

    /// Advance delay and sound timers by one 60Hz tick
    pub fn tick(&mut self) -> Option<Beep> {
        let beep = self.state.timers.tick();
        if beep.is_some() {
            trace!("sound timer expired");
        }
        beep
    }

    /// Set state of a key on the 4x4 keyboard, indexes above 0xF are ignored
    pub fn set_key(&mut self, index: u8, pressed: bool) {
        match self.state.keys.get_mut(index as usize) {
            Some(key) => *key = pressed,
            None => warn!("ignoring state of nonexistent key {:#X}", index),
        }
    }

    pub fn framebuffer(&self) -> FrameView<'_> {
        self.state.frame.view()
    }

    pub fn engine_state(&self) -> EngineState {
        self.engine
    }

    pub fn registers(&self) -> &[u8; 16] {
        &self.state.v
    }

    pub fn index(&self) -> u16 {
        self.state.i
    }

    pub fn pc(&self) -> u16 {
        self.state.pc
    }

    pub fn stack_depth(&self) -> usize {
        self.state.stack.len()
    }

    pub fn delay_timer(&self) -> u8 {
        self.state.timers.delay.load()
    }

    pub fn sound_timer(&self) -> u8 {
        self.state.timers.sound.load()
    }

    /// Whether the sound timer is running
    pub fn is_sounding(&self) -> bool {
        self.state.timers.is_sounding()
    }

    pub fn memory(&self) -> &Memory {
        &self.state.memory
    }

    fn resume_on_key(&mut self, x: u8) -> nb::Result<StepOutcome, Fault> {
        match self.state.first_pressed_key() {
            Some(key) => {
                debug!("key {:#X} pressed, resuming", key);
                self.state.v[x as usize] = key;
                self.engine = EngineState::Running;
                self.pc_increment(2);
                Ok(StepOutcome::default())
            }
            None => Err(nb::Error::WouldBlock),
        }
    }

    fn run(&mut self, opcode: OpCode) -> nb::Result<StepOutcome, Fault> {
        let flow = self.execute(opcode).map_err(|fault| {
            error!("{}", fault);
            nb::Error::Other(fault)
        })?;
        let mut outcome = StepOutcome::default();
        match flow {
            Flow::Next => self.pc_increment(2),
            Flow::Redraw => {
                outcome.display_changed = true;
                self.pc_increment(2);
            }
            Flow::Skip => self.pc_increment(4),
            Flow::Jump(addr) => self.state.pc = addr & ADDR_MASK,
            Flow::Wait { x } => {
                debug!("waiting for key press into V{:X}", x);
                self.engine = EngineState::WaitingForKey { x };
                return Err(nb::Error::WouldBlock);
            }
        }
        Ok(outcome)
    }

    #[inline]
    fn pc_increment(&mut self, by: u16) {
        self.state.pc = self.state.pc.wrapping_add(by) & ADDR_MASK;
    }

    #[inline]
    fn skip_if(condition: bool) -> Result<Flow, Fault> {
        Ok(if condition { Flow::Skip } else { Flow::Next })
    }
}

// OpCodes impls
impl<R: RandomSource> Ember8<R> {
    #[rustfmt::skip]
    fn execute(&mut self, opcode: OpCode) -> Result<Flow, Fault> {
        match opcode {
            OpCode::_00E0             => self.clear_screen(),
            OpCode::_00EE             => self.subroutine_return(),
            OpCode::_1NNN { nnn }     => self.jump_to(nnn),
            OpCode::_2NNN { nnn }     => self.exec_subroutine_at(nnn),
            OpCode::_3XNN { x, nn }   => self.skip_if_vx_eq_nn(x, nn),
            OpCode::_4XNN { x, nn }   => self.skip_if_vx_ne_nn(x, nn),
            OpCode::_5XY0 { x, y }    => self.skip_if_vx_eq_vy(x, y),
            OpCode::_6XNN { x, nn }   => self.assign_vx_nn(x, nn),
            OpCode::_7XNN { x, nn }   => self.assign_add_vx_nn(x, nn),
            OpCode::_8XY0 { x, y }    => self.assign_vx_vy(x, y),
            OpCode::_8XY1 { x, y }    => self.assign_or_vx_vy(x, y),
            OpCode::_8XY2 { x, y }    => self.assign_and_vx_vy(x, y),
            OpCode::_8XY3 { x, y }    => self.assign_xor_vx_vy(x, y),
            OpCode::_8XY4 { x, y }    => self.assign_add_vx_vy(x, y),
            OpCode::_8XY5 { x, y }    => self.assign_sub_vx_vy(x, y),
            OpCode::_8XY6 { x, .. }   => self.assign_vx_shifted_r(x),
            OpCode::_8XY7 { x, y }    => self.assign_vx_vy_sub_vx(x, y),
            OpCode::_8XYE { x, .. }   => self.assign_vx_shifted_l(x),
            OpCode::_9XY0 { x, y }    => self.skip_if_vx_ne_vy(x, y),
            OpCode::_ANNN { nnn }     => self.assign_i_nnn(nnn),
            OpCode::_BNNN { nnn }     => self.jump_to_nnn_add_v0(nnn),
            OpCode::_CXNN { x, nn }   => self.assign_vx_random_and_nn(x, nn),
            OpCode::_DXYN { x, y, n } => self.draw_n_at_vx_vy(x, y, n),
            OpCode::_EX9E { x }       => self.skip_if_vx_in_keys(x),
            OpCode::_EXA1 { x }       => self.skip_if_vx_not_in_keys(x),
            OpCode::_FX07 { x }       => self.assign_vx_delay_t(x),
            OpCode::_FX0A { x }       => self.assign_vx_wait_for_key(x),
            OpCode::_FX15 { x }       => self.assign_delay_t_vx(x),
            OpCode::_FX18 { x }       => self.assign_sound_t_vx(x),
            OpCode::_FX1E { x }       => self.assign_add_i_vx(x),
            OpCode::_FX29 { x }       => self.assign_i_addr_of_sprite_vx(x),
            OpCode::_FX33 { x }       => self.assign_mem_at_i_bcd_of_vx(x),
            OpCode::_FX55 { x }       => self.assign_mem_at_i_v0_to_vx(x),
            OpCode::_FX65 { x }       => self.assign_v0_to_vx_mem_at_i(x),
        }
    }

    /// Clear the screen
    /// 00E0,
    fn clear_screen(&mut self) -> Result<Flow, Fault> {
        self.state.frame.clear();
        Ok(Flow::Redraw)
    }

    /// Return from a subroutine
    /// 00EE,
    fn subroutine_return(&mut self) -> Result<Flow, Fault> {
        let pc = self.state.pc;
        self.state
            .stack
            .pop()
            .ok_or(Fault::StackUnderflow { pc })
            // resume after the call instruction
            .map(|addr| Flow::Jump(addr.wrapping_add(2)))
    }

    /// Jump to address NNN
    /// 1NNN { nnn: u16 },
    fn jump_to(&mut self, nnn: u16) -> Result<Flow, Fault> {
        Ok(Flow::Jump(nnn))
    }

    /// Execute subroutine starting at address NNN
    /// 2NNN { nnn: u16 },
    fn exec_subroutine_at(&mut self, nnn: u16) -> Result<Flow, Fault> {
        let pc = self.state.pc;
        self.state
            .stack
            .push(pc)
            .map_err(|_| Fault::StackOverflow { pc })
            .map(|_| Flow::Jump(nnn))
    }

    /// Skip the following instruction if the value of register VX equals NN
    /// 3XNN { x: u8, nn: u8 },
    fn skip_if_vx_eq_nn(&mut self, x: u8, nn: u8) -> Result<Flow, Fault> {
        Self::skip_if(self.state.v[x as usize] == nn)
    }

    /// Skip the following instruction if the value of register VX is not equal to NN
    /// 4XNN { x: u8, nn: u8 },
    fn skip_if_vx_ne_nn(&mut self, x: u8, nn: u8) -> Result<Flow, Fault> {
        Self::skip_if(self.state.v[x as usize] != nn)
    }

    /// Skip the following instruction if the value of register VX is equal to the value of register VY
    /// 5XY0 { x: u8, y: u8 },
    fn skip_if_vx_eq_vy(&mut self, x: u8, y: u8) -> Result<Flow, Fault> {
        Self::skip_if(self.state.v[x as usize] == self.state.v[y as usize])
    }

    /// Store number NN in register VX
    /// 6XNN { x: u8, nn: u8 },
    fn assign_vx_nn(&mut self, x: u8, nn: u8) -> Result<Flow, Fault> {
        self.state.v[x as usize] = nn;
        Ok(Flow::Next)
    }

    /// Add the value NN to register VX
    /// 7XNN { x: u8, nn: u8 },
    fn assign_add_vx_nn(&mut self, x: u8, nn: u8) -> Result<Flow, Fault> {
        self.state.v[x as usize] = self.state.v[x as usize].wrapping_add(nn);
        Ok(Flow::Next)
    }

    /// Store the value of register VY in register VX
    /// 8XY0 { x: u8, y: u8 },
    fn assign_vx_vy(&mut self, x: u8, y: u8) -> Result<Flow, Fault> {
        self.state.v[x as usize] = self.state.v[y as usize];
        Ok(Flow::Next)
    }

    /// Set VX to VX OR VY
    /// 8XY1 { x: u8, y: u8 },
    fn assign_or_vx_vy(&mut self, x: u8, y: u8) -> Result<Flow, Fault> {
        self.state.v[x as usize] |= self.state.v[y as usize];
        Ok(Flow::Next)
    }

    /// Set VX to VX AND VY
    /// 8XY2 { x: u8, y: u8 },
    fn assign_and_vx_vy(&mut self, x: u8, y: u8) -> Result<Flow, Fault> {
        self.state.v[x as usize] &= self.state.v[y as usize];
        Ok(Flow::Next)
    }

    /// Set VX to VX XOR VY
    /// 8XY3 { x: u8, y: u8 },
    fn assign_xor_vx_vy(&mut self, x: u8, y: u8) -> Result<Flow, Fault> {
        self.state.v[x as usize] ^= self.state.v[y as usize];
        Ok(Flow::Next)
    }

    /// Add the value of register VY to register VX, Set VF to 01 if a carry occurs, Set VF to 00 if a carry does not occur
    /// 8XY4 { x: u8, y: u8 },
    fn assign_add_vx_vy(&mut self, x: u8, y: u8) -> Result<Flow, Fault> {
        let (value, carry) = self.state.v[x as usize].overflowing_add(self.state.v[y as usize]);
        self.state.v[x as usize] = value;
        self.state.v[VF] = carry as u8;
        Ok(Flow::Next)
    }

    /// Subtract the value of register VY from register VX, Set VF to 00 if a borrow occurs, Set VF to 01 if a borrow does not occur
    /// 8XY5 { x: u8, y: u8 },
    fn assign_sub_vx_vy(&mut self, x: u8, y: u8) -> Result<Flow, Fault> {
        let (value, borrow) = self.state.v[x as usize].overflowing_sub(self.state.v[y as usize]);
        self.state.v[x as usize] = value;
        self.state.v[VF] = !borrow as u8;
        Ok(Flow::Next)
    }

    /// Shift register VX right by one bit, Set register VF to the least significant bit prior to the shift
    /// 8XY6 { x: u8, y: u8 },
    fn assign_vx_shifted_r(&mut self, x: u8) -> Result<Flow, Fault> {
        let lsb = self.state.v[x as usize] & 1u8;
        self.state.v[x as usize] >>= 1;
        self.state.v[VF] = lsb;
        Ok(Flow::Next)
    }

    /// Set register VX to the value of VY minus VX, Set VF to 00 if a borrow occurs, Set VF to 01 if a borrow does not occur
    /// 8XY7 { x: u8, y: u8 },
    fn assign_vx_vy_sub_vx(&mut self, x: u8, y: u8) -> Result<Flow, Fault> {
        let (value, borrow) = self.state.v[y as usize].overflowing_sub(self.state.v[x as usize]);
        self.state.v[x as usize] = value;
        self.state.v[VF] = !borrow as u8;
        Ok(Flow::Next)
    }

    /// Shift register VX left by one bit, Set register VF to the most significant bit prior to the shift
    /// 8XYE { x: u8, y: u8 },
    fn assign_vx_shifted_l(&mut self, x: u8) -> Result<Flow, Fault> {
        let msb = self.state.v[x as usize] >> 7;
        self.state.v[x as usize] <<= 1;
        self.state.v[VF] = msb;
        Ok(Flow::Next)
    }

    /// Skip the following instruction if the value of register VX is not equal to the value of register VY
    /// 9XY0 { x: u8, y: u8 },
    fn skip_if_vx_ne_vy(&mut self, x: u8, y: u8) -> Result<Flow, Fault> {
        Self::skip_if(self.state.v[x as usize] != self.state.v[y as usize])
    }

    /// Store memory address NNN in register I
    /// ANNN { nnn: u16 },
    fn assign_i_nnn(&mut self, nnn: u16) -> Result<Flow, Fault> {
        self.state.i = nnn & ADDR_MASK;
        Ok(Flow::Next)
    }

    /// Jump to address NNN + V0
    /// BNNN { nnn: u16 },
    fn jump_to_nnn_add_v0(&mut self, nnn: u16) -> Result<Flow, Fault> {
        Ok(Flow::Jump(nnn + self.state.v[0] as u16))
    }

    /// Set VX to a random number with a mask of NN
    /// CXNN { x: u8, nn: u8 },
    fn assign_vx_random_and_nn(&mut self, x: u8, nn: u8) -> Result<Flow, Fault> {
        self.state.v[x as usize] = self.rng.gen_random() & nn;
        Ok(Flow::Next)
    }

    /// Draw a sprite at position VX, VY with N bytes of sprite data starting at the address stored in I, Set VF to 01 if any set pixels are changed to unset, and 00 otherwise
    /// DXYN { x: u8, y: u8, n: u8 },
    ///
    /// Each axis wraps around on its own, so a sprite crossing the right edge
    /// continues on the left side of the same rows.
    fn draw_n_at_vx_vy(&mut self, x: u8, y: u8, n: u8) -> Result<Flow, Fault> {
        let origin_x = self.state.v[x as usize] as usize;
        let origin_y = self.state.v[y as usize] as usize;
        let mut collision = false;
        for row in 0..n {
            let sprite = self.state.memory.read(self.state.i.wrapping_add(row as u16));
            let py = (origin_y + row as usize) % HEIGHT;
            for col in 0..8usize {
                if sprite & (0x80u8 >> col) == 0 {
                    continue;
                }
                let px = (origin_x + col) % WIDTH;
                collision |= matches!(self.state.frame.xor_bit(px, py, true), Ok(true));
            }
        }
        self.state.v[VF] = collision as u8;
        Ok(Flow::Redraw)
    }

    /// Skip the following instruction if the key corresponding to the hex value currently stored in register VX is pressed
    /// EX9E { x: u8 },
    fn skip_if_vx_in_keys(&mut self, x: u8) -> Result<Flow, Fault> {
        Self::skip_if(self.state.is_pressed(self.state.v[x as usize]))
    }

    /// Skip the following instruction if the key corresponding to the hex value currently stored in register VX is not pressed
    /// EXA1 { x: u8 },
    fn skip_if_vx_not_in_keys(&mut self, x: u8) -> Result<Flow, Fault> {
        Self::skip_if(!self.state.is_pressed(self.state.v[x as usize]))
    }

    /// Store the current value of the delay timer in register VX
    /// FX07 { x: u8 },
    fn assign_vx_delay_t(&mut self, x: u8) -> Result<Flow, Fault> {
        self.state.v[x as usize] = self.state.timers.delay.load();
        Ok(Flow::Next)
    }

    /// Wait for a keypress and store the result in register VX
    /// FX0A { x: u8 },
    fn assign_vx_wait_for_key(&mut self, x: u8) -> Result<Flow, Fault> {
        match self.state.first_pressed_key() {
            Some(key) => {
                self.state.v[x as usize] = key;
                Ok(Flow::Next)
            }
            None => Ok(Flow::Wait { x }),
        }
    }

    /// Set the delay timer to the value of register VX
    /// FX15 { x: u8 },
    fn assign_delay_t_vx(&mut self, x: u8) -> Result<Flow, Fault> {
        self.state.timers.delay.store(self.state.v[x as usize]);
        Ok(Flow::Next)
    }

    /// Set the sound timer to the value of register VX
    /// FX18 { x: u8 },
    fn assign_sound_t_vx(&mut self, x: u8) -> Result<Flow, Fault> {
        self.state.timers.sound.store(self.state.v[x as usize]);
        Ok(Flow::Next)
    }

    /// Add the value stored in register VX to register I
    /// FX1E { x: u8 },
    fn assign_add_i_vx(&mut self, x: u8) -> Result<Flow, Fault> {
        self.state.i = (self.state.i + self.state.v[x as usize] as u16) & ADDR_MASK;
        Ok(Flow::Next)
    }

    /// Set I to the memory address of the sprite data corresponding to the hexadecimal digit stored in register VX
    /// FX29 { x: u8 },
    fn assign_i_addr_of_sprite_vx(&mut self, x: u8) -> Result<Flow, Fault> {
        self.state.i = Memory::glyph_addr(self.state.v[x as usize]);
        Ok(Flow::Next)
    }

    /// Store the binary-coded decimal equivalent of the value stored in register VX at addresses I, I+1, and I+2
    /// FX33 { x: u8 },
    fn assign_mem_at_i_bcd_of_vx(&mut self, x: u8) -> Result<Flow, Fault> {
        let value = self.state.v[x as usize];
        let i = self.state.i;
        self.state.memory.write(i, value / 100u8);
        self.state.memory.write(i.wrapping_add(1), (value / 10u8) % 10u8);
        self.state.memory.write(i.wrapping_add(2), value % 10u8);
        Ok(Flow::Next)
    }

    /// Store the values of registers V0 to VX inclusive in memory starting at address I
    /// FX55 { x: u8 },
    fn assign_mem_at_i_v0_to_vx(&mut self, x: u8) -> Result<Flow, Fault> {
        for idx in 0..=x {
            let addr = self.state.i.wrapping_add(idx as u16);
            self.state.memory.write(addr, self.state.v[idx as usize]);
        }
        Ok(Flow::Next)
    }

    /// Fill registers V0 to VX inclusive with the values stored in memory starting at address I
    /// FX65 { x: u8 },
    fn assign_v0_to_vx_mem_at_i(&mut self, x: u8) -> Result<Flow, Fault> {
        for idx in 0..=x {
            let addr = self.state.i.wrapping_add(idx as u16);
            self.state.v[idx as usize] = self.state.memory.read(addr);
        }
        Ok(Flow::Next)
    }
}
