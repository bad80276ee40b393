//! Countdown timers and the 60Hz clock driving them.
//!
//! Timers are decoupled from instruction execution: `Ember8::step` never
//! touches them, the host calls `Ember8::tick` at its own cadence instead.

/// Frequency at which timers are expected to be ticked
pub const TIMER_HZ: u32 = 60;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TimerState {
    /// Counting down
    On,
    /// Already at zero, nothing changed
    Off,
    /// Reached zero on this decrement
    Finished,
}

/// Single-shot event raised when the sound timer runs out
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Beep;

#[derive(Debug, Default, Clone)]
pub struct Timer(u8);

impl Timer {
    pub fn new() -> Self {
        Self(0)
    }

    #[inline]
    pub fn store(&mut self, value: u8) {
        self.0 = value;
    }

    #[inline]
    pub fn load(&self) -> u8 {
        self.0
    }

    #[inline]
    pub fn decrement(&mut self) -> TimerState {
        if self.0 > 0 {
            self.0 -= 1;
            if self.0 == 0 {
                TimerState::Finished
            } else {
                TimerState::On
            }
        } else {
            TimerState::Off
        }
    }
}

/// Decrements delay and sound timers once per tick
#[derive(Debug, Default, Clone)]
pub struct TimerClock {
    pub delay: Timer,
    pub sound: Timer,
}

impl TimerClock {
    pub fn new() -> Self {
        Self {
            delay: Timer::new(),
            sound: Timer::new(),
        }
    }

    /// Advance both timers, yielding `Beep` when the sound timer has just expired
    pub fn tick(&mut self) -> Option<Beep> {
        self.delay.decrement();
        match self.sound.decrement() {
            TimerState::Finished => Some(Beep),
            TimerState::On | TimerState::Off => None,
        }
    }

    /// Whether the host should currently be producing sound
    pub fn is_sounding(&self) -> bool {
        self.sound.load() > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decrement_clamps_at_zero() {
        let mut timer = Timer::new();
        timer.store(2);
        assert_eq!(timer.decrement(), TimerState::On);
        assert_eq!(timer.decrement(), TimerState::Finished);
        assert_eq!(timer.load(), 0);
        assert_eq!(timer.decrement(), TimerState::Off);
        assert_eq!(timer.load(), 0);
    }

    #[test]
    fn delay_timer_never_beeps() {
        let mut clock = TimerClock::new();
        clock.delay.store(1);
        assert_eq!(clock.tick(), None);
        assert_eq!(clock.delay.load(), 0);
    }

    #[test]
    fn sound_timer_beeps_once() {
        let mut clock = TimerClock::new();
        clock.sound.store(2);
        assert!(clock.is_sounding());
        assert_eq!(clock.tick(), None);
        assert_eq!(clock.tick(), Some(Beep));
        assert!(!clock.is_sounding());
        assert_eq!(clock.tick(), None);
        assert_eq!(clock.tick(), None);
    }

    #[test]
    fn timers_are_independent() {
        let mut clock = TimerClock::new();
        clock.delay.store(3);
        clock.sound.store(1);
        assert_eq!(clock.tick(), Some(Beep));
        assert_eq!(clock.delay.load(), 2);
        assert_eq!(clock.sound.load(), 0);
    }
}
