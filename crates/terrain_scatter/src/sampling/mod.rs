//! Sampling strategies for generating candidate points inside [`Bounds`].
//!
//! Samplers emit lateral (x, z) positions relative to the bounds' minimum
//! corner. They are deterministic for a given generator state; the volume
//! seeds that generator at the start of every run.
use glam::Vec2;
use rand::RngCore;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::bounds::Bounds;
use crate::error::Result;

pub mod grid;
pub mod poisson_disk;

pub use grid::GridSampling;
pub use poisson_disk::{PoissonDiskSampling, RadiusModulation};

/// Raw sampler output before it is projected onto the ground.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProceduralPoint {
    /// Lateral position relative to the bounds' minimum corner.
    pub position: Vec2,
}

impl ProceduralPoint {
    pub fn new(x: f32, z: f32) -> Self {
        Self {
            position: Vec2::new(x, z),
        }
    }
}

impl From<Vec2> for ProceduralPoint {
    fn from(position: Vec2) -> Self {
        Self { position }
    }
}

/// Trait for point sampling.
pub trait PointSampling: Send + Sync {
    fn generate(&self, bounds: &Bounds, rng: &mut dyn RngCore) -> Vec<ProceduralPoint>;
}

/// Compute the next smaller representable float value.
///
/// Returns a value that is strictly less than the input, useful for
/// keeping sampled coordinates inside a half-open domain.
#[inline]
pub(crate) fn next_down(val: f32) -> f32 {
    if val.is_nan() {
        return f32::NAN;
    }

    if val == f32::NEG_INFINITY {
        return f32::NEG_INFINITY;
    }

    if val == f32::INFINITY {
        return f32::MAX;
    }

    if val == 0.0 {
        return -f32::MIN_POSITIVE;
    }

    let bits = val.to_bits();
    if val > 0.0 {
        f32::from_bits(bits.saturating_sub(1))
    } else {
        f32::from_bits(bits.saturating_add(1))
    }
}

/// Sampler configured on a volume.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub enum SamplerSettings {
    Poisson(PoissonDiskSampling),
    Grid(GridSampling),
}

impl Default for SamplerSettings {
    fn default() -> Self {
        SamplerSettings::Poisson(PoissonDiskSampling::default())
    }
}

impl SamplerSettings {
    /// Returns an error for settings that would produce a degenerate run.
    pub fn validate(&self) -> Result<()> {
        match self {
            SamplerSettings::Poisson(p) => p.validate(),
            SamplerSettings::Grid(g) => g.validate(),
        }
    }
}

impl PointSampling for SamplerSettings {
    fn generate(&self, bounds: &Bounds, rng: &mut dyn RngCore) -> Vec<ProceduralPoint> {
        match self {
            SamplerSettings::Poisson(p) => p.generate(bounds, rng),
            SamplerSettings::Grid(g) => g.generate(bounds, rng),
        }
    }
}

impl From<PoissonDiskSampling> for SamplerSettings {
    fn from(value: PoissonDiskSampling) -> Self {
        SamplerSettings::Poisson(value)
    }
}

impl From<GridSampling> for SamplerSettings {
    fn from(value: GridSampling) -> Self {
        SamplerSettings::Grid(value)
    }
}
