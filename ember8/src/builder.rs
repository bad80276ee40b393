use core::fmt;

use crate::ember::Ember8;
use crate::memory::LoadError;
use crate::rng::RandomSource;
use crate::timer::TIMER_HZ;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BuildError {
    MissingRng,
    MissingProgram,
    Load(LoadError),
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::MissingRng => f.write_str("random source not provided"),
            BuildError::MissingProgram => f.write_str("program not provided"),
            BuildError::Load(err) => write!(f, "cannot load program: {}", err),
        }
    }
}

impl From<LoadError> for BuildError {
    fn from(err: LoadError) -> Self {
        BuildError::Load(err)
    }
}

pub struct Builder<'a, R: RandomSource> {
    rng: Option<R>,
    program: Option<&'a [u8]>,
}

impl<'a, R: RandomSource> Builder<'a, R> {
    pub fn new() -> Self {
        Self {
            rng: None,
            program: None,
        }
    }

    pub fn with_rng(mut self, rng: R) -> Self {
        self.rng = Some(rng);
        self
    }

    pub fn with_program(mut self, prog: &'a [u8]) -> Self {
        self.program = Some(prog);
        self
    }

    pub fn build(self) -> Result<Ember8<R>, BuildError> {
        let rng = self.rng.ok_or(BuildError::MissingRng)?;
        let program = self.program.ok_or(BuildError::MissingProgram)?;
        let mut ember = Ember8::new(rng);
        ember.load(program)?;
        Ok(ember)
    }
}

impl<R: RandomSource> Default for Builder<'_, R> {
    fn default() -> Self {
        Self::new()
    }
}

/// Pacing of the two cadences a host drives the engine at
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Config {
    pub instructions_per_second: u32,
    pub timer_hz: u32,
}

impl Config {
    pub const DEFAULT_IPS: u32 = 700;

    /// Instructions to execute between two consecutive timer ticks, at least 1
    pub fn steps_per_tick(&self) -> u32 {
        let hz = self.timer_hz.max(1);
        (self.instructions_per_second.saturating_add(hz - 1) / hz).max(1)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            instructions_per_second: Self::DEFAULT_IPS,
            timer_hz: TIMER_HZ,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::PROGRAM_CAPACITY;
    use crate::rng::SeededRng;

    #[test]
    fn with_rng_and_prog() {
        let ember = Builder::new()
            .with_rng(SeededRng::new(0))
            .with_program(&[0x12, 0x00])
            .build()
            .unwrap();
        assert_eq!(ember.memory().read(0x200), 0x12);
        assert_eq!(ember.pc(), 0x200);
    }

    #[test]
    fn with_rng_only() {
        let result = Builder::new().with_rng(SeededRng::new(0)).build();
        assert_eq!(result.err(), Some(BuildError::MissingProgram));
    }

    #[test]
    fn with_program_only() {
        let result = Builder::<'_, SeededRng>::new().with_program(&[]).build();
        assert_eq!(result.err(), Some(BuildError::MissingRng));
    }

    #[test]
    fn oversized_program() {
        let program = [0u8; PROGRAM_CAPACITY + 1];
        let result = Builder::new()
            .with_rng(SeededRng::new(0))
            .with_program(&program)
            .build();
        assert!(matches!(result.err(), Some(BuildError::Load(_))));
    }

    #[test]
    fn steps_per_tick() {
        assert_eq!(Config::default().steps_per_tick(), 12);
        let exact = Config {
            instructions_per_second: 600,
            timer_hz: 60,
        };
        assert_eq!(exact.steps_per_tick(), 10);
        let slow = Config {
            instructions_per_second: 1,
            timer_hz: 60,
        };
        assert_eq!(slow.steps_per_tick(), 1);
        let stopped = Config {
            instructions_per_second: 0,
            timer_hz: 0,
        };
        assert_eq!(stopped.steps_per_tick(), 1);
    }
}
