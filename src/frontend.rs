//! Platform that an `Ember8` is presented on.
//!
//! The runner only talks to this trait, so the same loop drives the terminal
//! and the headless frontend used in tests.

use std::io;

use ember8::FrameView;

pub trait Frontend {
    /// Drain pending input and get state of each key on 4x4 keyboard
    ///
    /// Called by the runner once per timer tick, before stepping
    fn poll_keys(&mut self) -> io::Result<[bool; 16]>;
    /// Whether the user asked to leave
    fn quit_requested(&self) -> bool;
    /// Draw current frame to the screen
    ///
    /// Called only when some instruction changed the display
    fn on_frame(&mut self, frame: FrameView<'_>) -> io::Result<()>;
    /// Turn sound on
    fn sound_on(&mut self);
    /// Turn sound off
    fn sound_off(&mut self);
}
