//! Terminal host for the `ember8` interpreter.

pub mod frontend;
pub mod keymap;
pub mod rom;
pub mod runner;
pub mod terminal;

pub use frontend::Frontend;
pub use rom::{load_rom, RomError};
pub use runner::{Control, RunError, Runner};
pub use terminal::Terminal;
