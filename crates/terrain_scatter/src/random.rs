//! Seedable random helpers shared by the samplers and the placement pipeline.
//!
//! Every helper draws exactly one value from the generator, even for empty
//! ranges, so that the draw sequence of a run depends only on the seed and the
//! configuration, never on the values drawn.
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

/// Creates the generator used for one placement run.
pub fn rng_for_seed(seed: i64) -> StdRng {
    StdRng::seed_from_u64(seed as u64)
}

/// Generate a random float in the range [0, 1].
///
/// Draws close to `u32::MAX` round up to exactly 1 in `f32`.
#[inline]
pub fn rand01(rng: &mut dyn RngCore) -> f32 {
    (rng.next_u32() as f32) / ((u32::MAX as f32) + 1.0)
}

/// Uniform float in `[min, max]`. Swapped bounds are accepted.
#[inline]
pub fn range_f32(rng: &mut dyn RngCore, min: f32, max: f32) -> f32 {
    min + rand01(rng) * (max - min)
}

/// Uniform index in `0..len`. Returns 0 for an empty range.
#[inline]
pub fn range_index(rng: &mut dyn RngCore, len: usize) -> usize {
    let roll = rand01(rng);
    if len == 0 {
        return 0;
    }
    ((roll * len as f32) as usize).min(len - 1)
}
