//! Gaussian weight initialization.
//!
//! Weights start from a zero-mean normal with standard deviation
//! `sqrt(2 / fan_in)` (He initialization, suited to ReLU-family layers).
//! The samples come from a Box–Muller polar transform that produces two
//! independent normals per pair of uniform draws and caches the second for
//! the next call. The cache lives in an explicit sampler object rather than
//! global state, so seeding is reproducible and independent samplers do not
//! interleave.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// He initialization standard deviation: `sqrt(2 / fan_in)`.
#[inline]
pub fn he_std(fan_in: usize) -> f32 {
    debug_assert!(fan_in > 0, "fan_in must be > 0");
    (2.0 / fan_in as f32).sqrt()
}

/// Normal sampler over an owned uniform generator.
///
/// One sampler is typically shared across all layer initializations of a
/// process, the way a process-wide generator would be, but the state is
/// explicit and seedable.
#[derive(Debug, Clone)]
pub struct NormalSampler<R> {
    rng: R,
    spare: Option<f32>,
}

impl NormalSampler<StdRng> {
    /// Deterministic sampler from a seed.
    pub fn from_seed(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    /// Sampler seeded from operating system entropy.
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng> NormalSampler<R> {
    pub fn new(rng: R) -> Self {
        Self { rng, spare: None }
    }

    /// Draw one `N(mu, sigma²)` sample.
    ///
    /// Every other call performs the actual transform: two uniforms in
    /// `[-1, 1)` are rejected until they land strictly inside the unit
    /// circle (and away from the origin), then both Box–Muller outputs are
    /// computed and the second is cached for the next call.
    pub fn sample(&mut self, mu: f32, sigma: f32) -> f32 {
        if let Some(x2) = self.spare.take() {
            return mu + sigma * x2;
        }

        let (x1, x2) = loop {
            let u1 = self.rng.gen::<f32>() * 2.0 - 1.0;
            let u2 = self.rng.gen::<f32>() * 2.0 - 1.0;
            let w = u1 * u1 + u2 * u2;
            if w < 1.0 && w > 0.0 {
                let mult = (-2.0 * w.ln() / w).sqrt();
                break (u1 * mult, u2 * mult);
            }
        };

        self.spare = Some(x2);
        mu + sigma * x1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn he_std_matches_the_formula() {
        assert!((he_std(2) - 1.0).abs() < 1e-6);
        assert!((he_std(8) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn seeded_sampling_is_deterministic() {
        let mut a = NormalSampler::from_seed(42);
        let mut b = NormalSampler::from_seed(42);
        for _ in 0..100 {
            assert_eq!(a.sample(0.0, 1.0), b.sample(0.0, 1.0));
        }
    }

    #[test]
    fn the_cached_second_sample_differs_from_the_first() {
        let mut s = NormalSampler::from_seed(7);
        let x1 = s.sample(0.0, 1.0);
        let x2 = s.sample(0.0, 1.0);
        assert_ne!(x1, x2);
    }

    #[test]
    fn sample_moments_are_plausible() {
        let mut s = NormalSampler::from_seed(1);
        let n = 20_000;

        let mut sum = 0.0_f64;
        let mut sum_sq = 0.0_f64;
        for _ in 0..n {
            let x = s.sample(0.0, 2.0) as f64;
            sum += x;
            sum_sq += x * x;
        }

        let mean = sum / n as f64;
        let var = sum_sq / n as f64 - mean * mean;
        assert!(mean.abs() < 0.1, "mean={mean}");
        assert!((var - 4.0).abs() < 0.3, "var={var}");
    }

    #[test]
    fn mu_and_sigma_shift_and_scale() {
        let mut a = NormalSampler::from_seed(9);
        let mut b = NormalSampler::from_seed(9);
        for _ in 0..10 {
            let x = a.sample(0.0, 1.0);
            let y = b.sample(3.0, 2.0);
            assert!((y - (3.0 + 2.0 * x)).abs() < 1e-5);
        }
    }
}
