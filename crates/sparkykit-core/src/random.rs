//! Injectable uniform sampling for emission and path jitter.

use rand::{rngs::StdRng, Rng, SeedableRng};

/// Source of uniformly distributed values.
pub trait UniformSampler {
    /// Value in `[min, max]`. Reversed or empty ranges are accepted.
    fn uniform(&mut self, min: f32, max: f32) -> f32;

    /// Index in `0..len`. `len` must be non-zero.
    fn index(&mut self, len: usize) -> usize;
}

impl<S: UniformSampler + ?Sized> UniformSampler for &mut S {
    fn uniform(&mut self, min: f32, max: f32) -> f32 {
        (**self).uniform(min, max)
    }

    fn index(&mut self, len: usize) -> usize {
        (**self).index(len)
    }
}

impl<S: UniformSampler + ?Sized> UniformSampler for Box<S> {
    fn uniform(&mut self, min: f32, max: f32) -> f32 {
        (**self).uniform(min, max)
    }

    fn index(&mut self, len: usize) -> usize {
        (**self).index(len)
    }
}

/// Adapts any `rand` generator.
#[derive(Debug, Clone)]
pub struct RngSampler<R> {
    rng: R,
}

impl<R: Rng> RngSampler<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngSampler<StdRng> {
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_os_rng())
    }
}

impl<R: Rng> UniformSampler for RngSampler<R> {
    fn uniform(&mut self, min: f32, max: f32) -> f32 {
        if min == max {
            return min;
        }
        let f: f32 = self.rng.random();
        min + (max - min) * f
    }

    fn index(&mut self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        self.rng.random_range(0..len)
    }
}

/// Always picks the middle of the range. Deterministic stand-in for tests and previews.
#[derive(Debug, Clone, Copy, Default)]
pub struct MidpointSampler;

impl UniformSampler for MidpointSampler {
    fn uniform(&mut self, min: f32, max: f32) -> f32 {
        min + (max - min) * 0.5
    }

    fn index(&mut self, len: usize) -> usize {
        len / 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_sampler_stays_in_range() {
        let mut sampler = RngSampler::seeded(42);
        for _ in 0..1000 {
            let v = sampler.uniform(-2.0, 3.0);
            assert!((-2.0..=3.0).contains(&v));
        }
    }

    #[test]
    fn reversed_range_is_accepted() {
        let mut sampler = RngSampler::seeded(7);
        for _ in 0..100 {
            let v = sampler.uniform(5.0, 1.0);
            assert!((1.0..=5.0).contains(&v));
        }
    }

    #[test]
    fn degenerate_range_returns_bound() {
        let mut sampler = RngSampler::seeded(1);
        assert_eq!(sampler.uniform(2.0, 2.0), 2.0);
        assert_eq!(MidpointSampler.uniform(2.0, 2.0), 2.0);
    }

    #[test]
    fn index_is_below_len() {
        let mut sampler = RngSampler::seeded(9);
        for _ in 0..100 {
            assert!(sampler.index(4) < 4);
        }
        assert_eq!(sampler.index(1), 0);
        assert_eq!(MidpointSampler.index(3), 1);
    }
}
