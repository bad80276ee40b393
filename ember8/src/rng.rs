//! Source of random bytes for `CXNN`.
//!
//! Injected into the engine instead of reaching for global state, so runs can
//! be reproduced from a seed.

use nanorand::{rand::pcg64::Pcg64, RNG};

pub trait RandomSource {
    /// Generate random 8-bit number
    ///
    /// Called by `step` whenever requested by executing program
    fn gen_random(&mut self) -> u8;
}

/// Default generator: PCG64 from `nanorand`
pub struct SeededRng(Pcg64);

impl SeededRng {
    pub fn new(seed: u128) -> Self {
        Self(Pcg64::new_seed(seed))
    }
}

impl RandomSource for SeededRng {
    fn gen_random(&mut self) -> u8 {
        self.0.generate::<u8>()
    }
}

/// Replays a fixed sequence of bytes, cycling when exhausted
pub struct Sequence<'a> {
    bytes: &'a [u8],
    next: usize,
}

impl<'a> Sequence<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, next: 0 }
    }
}

impl RandomSource for Sequence<'_> {
    fn gen_random(&mut self) -> u8 {
        if self.bytes.is_empty() {
            return 0;
        }
        let value = self.bytes[self.next % self.bytes.len()];
        self.next = self.next.wrapping_add(1);
        value
    }
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn gen_random(&mut self) -> u8 {
        (**self).gen_random()
    }
}
