//! Noise fields used to thin candidate points and to modulate sampling radii.
//!
//! [`NoiseField`] is the boundary the pipeline samples through. [`NoiseSettings`]
//! is the serializable description of a coherent noise field; build it into a
//! [`NoiseSampler`] once per run and sample that. Hosts with their own field
//! wrap it in a [`SharedNoiseField`] and hand it to a volume.
use std::fmt;
use std::sync::Arc;

use glam::{Vec2, Vec3, Vec3Swizzles};
use ::noise::{NoiseFn, Perlin, Simplex, Value};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A scalar field sampled at lateral positions.
///
/// Returning `None` rejects the position.
pub trait NoiseField {
    fn sample(&self, position: Vec2, world_offset: Vec3) -> Option<f32>;
}

/// Space in which noise coordinates are interpreted.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NoiseSpace {
    /// Relative to the volume; moving the volume moves the pattern with it.
    #[default]
    Local,
    /// Absolute; the volume's world offset is added before sampling.
    World,
}

/// Noise generator backing a [`NoiseSettings`].
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NoiseAlgorithm {
    Perlin,
    Simplex,
    Value,
    /// Same value everywhere, already in [0, 1].
    Constant(f32),
}

/// Description of a fractal noise field remapped to [0, 1] with an acceptance range.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Clone, Debug, PartialEq)]
pub struct NoiseSettings {
    pub space: NoiseSpace,
    pub algorithm: NoiseAlgorithm,
    /// Inclusive acceptance interval `(min, max)` for sampled values.
    pub range: Vec2,
    /// Base frequency in cycles per world unit.
    pub frequency: f32,
    /// Number of fractal octaves, at least 1.
    pub octaves: u32,
    /// Seed of the permutation table.
    pub seed: u32,
}

impl Default for NoiseSettings {
    fn default() -> Self {
        Self {
            space: NoiseSpace::Local,
            algorithm: NoiseAlgorithm::Perlin,
            range: Vec2::new(0.0, 1.0),
            frequency: 0.2,
            octaves: 1,
            seed: 0,
        }
    }
}

impl NoiseSettings {
    pub fn new(algorithm: NoiseAlgorithm) -> Self {
        Self {
            algorithm,
            ..Default::default()
        }
    }

    /// Settings that accept every position with the given value.
    pub fn constant(value: f32) -> Self {
        Self::new(NoiseAlgorithm::Constant(value.clamp(0.0, 1.0)))
    }

    pub fn with_space(mut self, space: NoiseSpace) -> Self {
        self.space = space;
        self
    }

    pub fn with_range(mut self, min: f32, max: f32) -> Self {
        self.range = Vec2::new(min, max);
        self
    }

    pub fn with_frequency(mut self, frequency: f32) -> Self {
        self.frequency = frequency;
        self
    }

    pub fn with_octaves(mut self, octaves: u32) -> Self {
        self.octaves = octaves;
        self
    }

    pub fn with_seed(mut self, seed: u32) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.frequency.is_finite() || self.frequency <= 0.0 {
            return Err(Error::InvalidConfig("noise frequency must be > 0".into()));
        }
        if self.octaves == 0 {
            return Err(Error::InvalidConfig("noise octaves must be >= 1".into()));
        }
        if self.range.x > self.range.y {
            return Err(Error::InvalidConfig(
                "noise range min must not exceed max".into(),
            ));
        }
        Ok(())
    }

    /// Builds the generator for these settings.
    pub fn build(&self) -> NoiseSampler {
        let source = match self.algorithm {
            NoiseAlgorithm::Perlin => NoiseSource::Perlin(Perlin::new(self.seed)),
            NoiseAlgorithm::Simplex => NoiseSource::Simplex(Simplex::new(self.seed)),
            NoiseAlgorithm::Value => NoiseSource::Value(Value::new(self.seed)),
            NoiseAlgorithm::Constant(v) => NoiseSource::Constant(v),
        };
        NoiseSampler {
            settings: self.clone(),
            source,
        }
    }
}

enum NoiseSource {
    Perlin(Perlin),
    Simplex(Simplex),
    Value(Value),
    Constant(f32),
}

impl NoiseSource {
    fn get(&self, point: [f64; 2]) -> f64 {
        match self {
            NoiseSource::Perlin(n) => n.get(point),
            NoiseSource::Simplex(n) => n.get(point),
            NoiseSource::Value(n) => n.get(point),
            NoiseSource::Constant(v) => *v as f64 * 2.0 - 1.0,
        }
    }
}

/// Ready-to-sample noise field built from [`NoiseSettings`].
pub struct NoiseSampler {
    settings: NoiseSettings,
    source: NoiseSource,
}

impl NoiseSampler {
    pub fn settings(&self) -> &NoiseSettings {
        &self.settings
    }

    /// Unfiltered value in [0, 1] at a position already in noise space.
    pub fn value(&self, position: Vec2) -> f32 {
        let octaves = self.settings.octaves.max(1);
        let mut frequency = self.settings.frequency as f64;
        let mut amplitude = 1.0f64;
        let mut sum = 0.0f64;
        let mut norm = 0.0f64;
        for _ in 0..octaves {
            let p = [position.x as f64 * frequency, position.y as f64 * frequency];
            sum += self.source.get(p) * amplitude;
            norm += amplitude;
            amplitude *= 0.5;
            frequency *= 2.0;
        }
        let signed = sum / norm;
        ((signed as f32 + 1.0) * 0.5).clamp(0.0, 1.0)
    }
}

impl NoiseField for NoiseSampler {
    fn sample(&self, position: Vec2, world_offset: Vec3) -> Option<f32> {
        let p = match self.settings.space {
            NoiseSpace::Local => position,
            NoiseSpace::World => position + world_offset.xz(),
        };
        let v = self.value(p);
        let range = self.settings.range;
        (v >= range.x && v <= range.y).then_some(v)
    }
}

/// A [`NoiseField`] backed by a user-provided closure.
pub struct FnNoise<F>
where
    F: Fn(Vec2, Vec3) -> Option<f32>,
{
    f: F,
}

impl<F> FnNoise<F>
where
    F: Fn(Vec2, Vec3) -> Option<f32>,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> NoiseField for FnNoise<F>
where
    F: Fn(Vec2, Vec3) -> Option<f32>,
{
    #[inline]
    fn sample(&self, position: Vec2, world_offset: Vec3) -> Option<f32> {
        (self.f)(position, world_offset)
    }
}

/// Type-erased [`NoiseField`] that can be shared between volumes.
#[derive(Clone)]
pub struct SharedNoiseField(Arc<dyn NoiseField + Send + Sync>);

impl SharedNoiseField {
    pub fn new(field: impl NoiseField + Send + Sync + 'static) -> Self {
        Self(Arc::new(field))
    }
}

impl fmt::Debug for SharedNoiseField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedNoiseField(..)")
    }
}

impl NoiseField for SharedNoiseField {
    #[inline]
    fn sample(&self, position: Vec2, world_offset: Vec3) -> Option<f32> {
        self.0.sample(position, world_offset)
    }
}
