use std::collections::HashMap;

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Hands every system its own ChaCha stream, derived lazily from the
/// master seed in first-use order.
pub struct RngManager {
    master: ChaCha8Rng,
    streams: HashMap<String, ChaCha8Rng>,
}

impl RngManager {
    pub fn new(seed: u64) -> Self {
        Self {
            master: ChaCha8Rng::seed_from_u64(seed),
            streams: HashMap::new(),
        }
    }

    pub fn stream(&mut self, name: &str) -> SystemRng<'_> {
        let master = &mut self.master;
        let entry = self
            .streams
            .entry(name.to_string())
            .or_insert_with(|| ChaCha8Rng::seed_from_u64(master.next_u64()));
        SystemRng { inner: entry }
    }
}

pub struct SystemRng<'a> {
    inner: &'a mut ChaCha8Rng,
}

impl<'a> RngCore for SystemRng<'a> {
    fn next_u32(&mut self) -> u32 {
        self.inner.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.inner.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.inner.try_fill_bytes(dest)
    }
}

/// Small helpers used by wandering and scenario scattering.
pub trait RngExt {
    fn chance(&mut self, probability: f32) -> bool;
    /// Unit vector in a uniformly random direction.
    fn heading(&mut self) -> (f32, f32);
    fn jitter(&mut self, spread: i32) -> i32;
}

impl<R: Rng> RngExt for R {
    fn chance(&mut self, probability: f32) -> bool {
        self.gen::<f32>() < probability
    }

    fn heading(&mut self) -> (f32, f32) {
        let angle = self.gen_range(0.0..std::f32::consts::TAU);
        (angle.cos(), angle.sin())
    }

    fn jitter(&mut self, spread: i32) -> i32 {
        if spread <= 0 {
            return 0;
        }
        self.gen_range(-spread..=spread)
    }
}
