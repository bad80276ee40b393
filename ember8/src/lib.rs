//! Chip-8 interpreter core.
//!
//! The crate is `no_std` and knows nothing about files, windows or clocks.
//! A host assembles an [`Ember8`] with the [`Builder`], then drives it:
//!
//! ```
//! use ember8::{Builder, Config, SeededRng};
//!
//! // 0x200: draw glyph of V0 at (V0, V0), then spin
//! let program = [0xF0, 0x29, 0xD0, 0x05, 0x12, 0x04];
//! let mut ember = Builder::new()
//!     .with_rng(SeededRng::new(7))
//!     .with_program(&program)
//!     .build()
//!     .unwrap();
//!
//! let config = Config::default();
//! let outcome = ember.run_steps(config.steps_per_tick()).unwrap();
//! assert!(outcome.display_changed);
//! assert_eq!(ember.framebuffer().lit_pixels(), 14);
//! assert_eq!(ember.tick(), None);
//! ```
#![no_std]

pub mod builder;
pub mod ember;
pub mod frame;
pub mod memory;
pub mod opcode;
pub mod rng;
pub mod state;
pub mod timer;
#[cfg(test)]
mod utils;

pub use builder::{BuildError, Builder, Config};
pub use ember::{Ember8, EngineState, Fault, StepOutcome};
pub use frame::{Frame, FrameView};
pub use memory::LoadError;
pub use opcode::{OpCode, UnknownOpCode};
pub use rng::{RandomSource, SeededRng};
pub use timer::Beep;

#[cfg(feature = "embedded-graphics")]
pub use embedded_graphics;
