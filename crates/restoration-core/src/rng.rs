use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Single logical random source shared by the delay model, the repair
/// success trial and damage propagation.
pub trait RandomSource {
    /// Uniform draw in [0, 1)
    fn next_unit(&mut self) -> f64;

    /// Uniform draw in [low, high)
    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        low + (high - low) * self.next_unit()
    }

    /// Bernoulli trial: true with probability `p`
    fn chance(&mut self, p: f64) -> bool {
        self.next_unit() < p
    }
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn next_unit(&mut self) -> f64 {
        (**self).next_unit()
    }

    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        (**self).uniform(low, high)
    }

    fn chance(&mut self, p: f64) -> bool {
        (**self).chance(p)
    }
}

/// ChaCha20-backed source, reproducible from a `u64` seed
#[derive(Clone, Debug)]
pub struct SeededSource {
    rng: ChaCha20Rng,
}

impl SeededSource {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }

    /// Independent stream for one replication of an ensemble
    pub fn from_replication(global_seed: u64, replication: u64) -> Self {
        let seed = global_seed.wrapping_add(replication.wrapping_mul(0x9e3779b97f4a7c15));
        Self::new(seed)
    }
}

impl RandomSource for SeededSource {
    fn next_unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        self.rng.gen_range(low..high)
    }
}

/// Replays a fixed list of unit draws, cycling when exhausted.
///
/// `with_uniform` pins every `uniform` draw (e.g. a delay factor of exactly
/// 1.0) so outcomes can be forced draw by draw.
#[derive(Clone, Debug)]
pub struct ReplaySource {
    units: Vec<f64>,
    cursor: usize,
    fixed_uniform: Option<f64>,
}

impl ReplaySource {
    pub fn new(units: Vec<f64>) -> Self {
        Self {
            units,
            cursor: 0,
            fixed_uniform: None,
        }
    }

    /// Every unit draw returns `value`
    pub fn constant(value: f64) -> Self {
        Self::new(vec![value])
    }

    pub fn with_uniform(mut self, value: f64) -> Self {
        self.fixed_uniform = Some(value);
        self
    }

    /// Number of unit draws consumed so far
    pub fn draws(&self) -> usize {
        self.cursor
    }
}

impl RandomSource for ReplaySource {
    fn next_unit(&mut self) -> f64 {
        if self.units.is_empty() {
            return 0.0;
        }
        let value = self.units[self.cursor % self.units.len()];
        self.cursor += 1;
        value
    }

    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        match self.fixed_uniform {
            Some(value) => value,
            None => low + (high - low) * self.next_unit(),
        }
    }
}
