//! Host loop driving the two cadences of an `Ember8`.
//!
//! Every iteration represents one timer tick: input is collected, a batch of
//! `Config::steps_per_tick` instructions runs, the frame is presented when it
//! changed and timers are ticked once.

use std::io;
use std::thread;
use std::time::{Duration, Instant};

use ember8::{Config, Ember8, Fault, RandomSource};
use log::{debug, error, info};

use crate::frontend::Frontend;

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("program halted: {0}")]
    Fault(Fault),

    #[error("frontend failure")]
    Io(#[from] io::Error),
}

/// Whether the loop should go on
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Control {
    Continue,
    Quit,
}

pub struct Runner<R: RandomSource, F: Frontend> {
    ember: Ember8<R>,
    frontend: F,
    config: Config,
    sounding: bool,
    ticks: u64,
}

impl<R: RandomSource, F: Frontend> Runner<R, F> {
    pub fn new(ember: Ember8<R>, frontend: F, config: Config) -> Self {
        Self {
            ember,
            frontend,
            config,
            sounding: false,
            ticks: 0,
        }
    }

    /// Run until the user quits or the program faults, sleeping between ticks
    pub fn run(&mut self) -> Result<(), RunError> {
        info!(
            "running at {} instructions/s, {} per tick",
            self.config.instructions_per_second,
            self.config.steps_per_tick()
        );
        let period = Duration::from_secs(1) / self.config.timer_hz.max(1);
        let mut deadline = Instant::now();
        self.frontend.on_frame(self.ember.framebuffer())?;
        loop {
            if self.iterate()? == Control::Quit {
                info!("quit after {} ticks", self.ticks);
                return Ok(());
            }
            deadline += period;
            let now = Instant::now();
            if deadline > now {
                thread::sleep(deadline - now);
            } else {
                // fell behind, don't try to catch up
                deadline = now;
            }
        }
    }

    /// A single timer tick worth of work, without pacing
    pub fn iterate(&mut self) -> Result<Control, RunError> {
        let keys = self.frontend.poll_keys()?;
        if self.frontend.quit_requested() {
            return Ok(Control::Quit);
        }
        for (index, &pressed) in keys.iter().enumerate() {
            self.ember.set_key(index as u8, pressed);
        }

        let outcome = self
            .ember
            .run_steps(self.config.steps_per_tick())
            .map_err(|fault| {
                error!("{}", fault);
                RunError::Fault(fault)
            })?;
        if outcome.display_changed {
            self.frontend.on_frame(self.ember.framebuffer())?;
        }

        if self.ember.tick().is_some() {
            debug!("beep at tick {}", self.ticks);
        }
        self.ticks += 1;
        self.update_sound();
        Ok(Control::Continue)
    }

    pub fn ember(&self) -> &Ember8<R> {
        &self.ember
    }

    pub fn frontend(&self) -> &F {
        &self.frontend
    }

    fn update_sound(&mut self) {
        let sounding = self.ember.is_sounding();
        if sounding != self.sounding {
            if sounding {
                self.frontend.sound_on();
            } else {
                self.frontend.sound_off();
            }
            self.sounding = sounding;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::testing::Headless;
    use ember8::{Builder, SeededRng};

    fn runner(rom: &[u8], frontend: Headless) -> Runner<SeededRng, Headless> {
        let ember = Builder::new()
            .with_rng(SeededRng::new(1))
            .with_program(rom)
            .build()
            .unwrap();
        Runner::new(ember, frontend, Config::default())
    }

    #[test]
    fn presents_only_changed_frames() {
        // draw glyph 0 once, then spin
        let mut runner = runner(&[0xD0, 0x05, 0x12, 0x02], Headless::new());
        for _ in 0..3 {
            assert_eq!(runner.iterate().unwrap(), Control::Continue);
        }
        let frames = &runner.frontend().frames;
        assert_eq!(frames.len(), 1);
        assert!(frames[0].starts_with("####...."));
        assert_eq!(runner.ember().framebuffer().lit_pixels(), 14);
    }

    #[test]
    fn batches_steps_per_tick() {
        // V0 += 1 forever
        let mut runner = runner(&[0x70, 0x01, 0x12, 0x00], Headless::new());
        runner.iterate().unwrap();
        // 12 steps: 6 increments and 6 jumps
        assert_eq!(runner.ember().registers()[0], 6);
    }

    #[test]
    fn keys_reach_engine() {
        let mut frontend = Headless::new();
        let mut keys = [false; 16];
        keys[0x7] = true;
        frontend.script.push_back([false; 16]);
        frontend.script.push_back(keys);
        // V3 = wait for key, then spin
        let mut runner = runner(&[0xF3, 0x0A, 0x12, 0x02], frontend);

        runner.iterate().unwrap();
        assert_eq!(runner.ember().pc(), 0x200);
        runner.iterate().unwrap();
        assert_eq!(runner.ember().registers()[3], 0x7);
        assert_eq!(runner.ember().pc(), 0x202);
    }

    #[test]
    fn sound_follows_timer() {
        // V0 = 2, sound = V0, spin
        let mut runner = runner(&[0x60, 0x02, 0xF0, 0x18, 0x12, 0x04], Headless::new());
        runner.iterate().unwrap();
        assert!(runner.frontend().sound);
        runner.iterate().unwrap();
        assert!(!runner.frontend().sound);
        runner.iterate().unwrap();
        assert_eq!(runner.frontend().sound_changes, 2);
    }

    #[test]
    fn fault_stops_loop() {
        let mut runner = runner(&[0x00, 0xEE], Headless::new());
        match runner.iterate() {
            Err(RunError::Fault(fault)) => {
                assert_eq!(fault, Fault::StackUnderflow { pc: 0x200 })
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(runner.run().is_err());
    }

    #[test]
    fn quit_request() {
        let mut runner = runner(&[0x12, 0x00], Headless::new().quit_after(3));
        assert!(runner.run().is_ok());
        assert_eq!(runner.ticks, 2);
    }
}
