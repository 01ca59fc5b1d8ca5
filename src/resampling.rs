//! Random streams and row resampling for the residual bootstrap.
//!
//! All randomness flows through an explicitly owned [`BootstrapRng`]
//! (ChaCha20). There is no global generator: the caller creates one stream and
//! lends it to each replicate, or derives one stream per replicate with
//! [`mix_seed`].

use nalgebra::DMatrix;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Golden-ratio multiplier used to decorrelate derived seeds.
const GOLDEN_RATIO_SEED_MIX: u64 = 0x9E37_79B9_7F4A_7C15;

/// Derive the seed of replicate `index` from a base seed.
pub fn mix_seed(base_seed: u64, index: usize) -> u64 {
    base_seed
        .wrapping_mul(GOLDEN_RATIO_SEED_MIX)
        .wrapping_add(index as u64)
        .rotate_left(17)
}

/// Seeded ChaCha20 stream.
#[derive(Debug, Clone)]
pub struct BootstrapRng {
    rng: ChaCha20Rng,
}

impl BootstrapRng {
    /// Stream seeded from OS entropy.
    pub fn from_entropy() -> Self {
        Self {
            rng: ChaCha20Rng::from_entropy(),
        }
    }

    /// Reproducible stream. The u64 is expanded to a full 256-bit key.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }

    /// Uniform index in `range`.
    pub fn usize(&mut self, range: std::ops::Range<usize>) -> usize {
        self.rng.gen_range(range)
    }

    /// Uniform u64 over the full range.
    pub fn u64(&mut self) -> u64 {
        self.rng.gen()
    }
}

/// Draws a matrix of the same shape whose rows are sampled with replacement.
pub trait Resampler {
    /// Row-resample `m`; the result has exactly `m.nrows()` rows.
    fn resample(&mut self, m: &DMatrix<f64>) -> DMatrix<f64>;
}

/// i.i.d. row resampler over a [`BootstrapRng`].
#[derive(Debug)]
pub struct RowResampler<'a> {
    rng: &'a mut BootstrapRng,
}

impl<'a> RowResampler<'a> {
    /// Resample from the given stream.
    pub fn new(rng: &'a mut BootstrapRng) -> Self {
        Self { rng }
    }
}

impl Resampler for RowResampler<'_> {
    fn resample(&mut self, m: &DMatrix<f64>) -> DMatrix<f64> {
        let rows = m.nrows();
        if rows == 0 {
            return m.clone();
        }
        let picks: Vec<usize> = (0..rows).map(|_| self.rng.usize(0..rows)).collect();
        DMatrix::from_fn(rows, m.ncols(), |i, j| m[(picks[i], j)])
    }
}
