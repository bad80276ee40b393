//! Frontend drawing into the terminal with `crossterm`.

use std::io::{self, Stdout, Write};
use std::time::Duration;

use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute, queue,
    style::Print,
    terminal::{self, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};
use ember8::FrameView;
use log::{debug, trace};

use crate::frontend::Frontend;
use crate::keymap::{self, KeyLatch};

const LIT: &str = "\u{2588}";
const DARK: &str = " ";

/// Raw mode terminal on an alternate screen, restored on drop
pub struct Terminal {
    out: Stdout,
    latch: KeyLatch,
    scale: usize,
    quit: bool,
}

impl Terminal {
    /// Each pixel is drawn as `2 * scale` columns by `scale` rows
    pub fn new(scale: usize, hold_ticks: u8) -> io::Result<Self> {
        let mut out = io::stdout();
        terminal::enable_raw_mode()?;
        execute!(
            out,
            EnterAlternateScreen,
            cursor::Hide,
            terminal::Clear(ClearType::All)
        )?;
        debug!("terminal in raw mode");
        Ok(Self {
            out,
            latch: KeyLatch::new(hold_ticks),
            scale: scale.max(1),
            quit: false,
        })
    }

    fn handle_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.quit = true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.quit = true
            }
            code => match keymap::key_index(code) {
                Some(index) => {
                    trace!("key {:?} -> {:#X}", code, index);
                    self.latch.press(index);
                }
                None => trace!("unmapped key {:?}", code),
            },
        }
    }
}

impl Frontend for Terminal {
    fn poll_keys(&mut self) -> io::Result<[bool; 16]> {
        self.latch.tick();
        while event::poll(Duration::from_millis(0))? {
            if let Event::Key(key) = event::read()? {
                self.handle_key(key);
            }
        }
        Ok(self.latch.state())
    }

    fn quit_requested(&self) -> bool {
        self.quit
    }

    fn on_frame(&mut self, frame: FrameView<'_>) -> io::Result<()> {
        for (y, row) in frame.iter_pixelwise_scaled(self.scale).enumerate() {
            queue!(self.out, cursor::MoveTo(0, y as u16))?;
            for &pixel in row {
                let cell = if pixel { LIT } else { DARK };
                // terminal cells are roughly twice as tall as wide
                queue!(self.out, Print(cell), Print(cell))?;
            }
        }
        self.out.flush()
    }

    fn sound_on(&mut self) {
        ring_bell(&mut self.out);
    }

    fn sound_off(&mut self) {}
}

/// BEL, the terminal decides whether it is audible
///
/// Failure is only logged, a silent beep doesn't stop the program.
fn ring_bell<W: Write>(out: &mut W) -> bool {
    match execute!(out, Print("\x07")) {
        Ok(()) => true,
        Err(err) => {
            debug!("cannot ring bell: {}", err);
            false
        }
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        let _ = execute!(self.out, cursor::Show, LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn bell_writes_bel() {
        let mut out: Vec<u8> = Vec::new();
        assert!(ring_bell(&mut out));
        assert_eq!(&out[..], b"\x07");
    }

    #[test]
    fn bell_failure_is_not_fatal() {
        let _ = env_logger::builder().is_test(true).try_init();
        assert!(!ring_bell(&mut Broken));
    }
}
