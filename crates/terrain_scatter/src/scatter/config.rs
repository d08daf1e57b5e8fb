//! Serializable descriptions of volumes and biomes.
//!
//! Available with the `serde` feature; the `ron` feature adds loading from RON
//! text. Every field is optional and falls back to the builder defaults.
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::bounds::Bounds;
use crate::error::{Error, Result};
use crate::noise::NoiseSettings;
use crate::sampling::SamplerSettings;
use crate::scatter::biome::Biome;
use crate::scatter::template::EntityTemplate;
use crate::scatter::volume::Volume;
use crate::spatial::LayerMask;

/// Description of a [`Volume`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeConfig {
    pub id: String,
    pub position: Vec3,
    pub bounds: Bounds,
    pub seed: i64,
    pub ground_mask: LayerMask,
    pub sampler: SamplerSettings,
    pub threshold_noise: NoiseSettings,
    pub templates: Vec<EntityTemplate>,
}

impl Default for VolumeConfig {
    fn default() -> Self {
        Self {
            id: "volume".into(),
            position: Vec3::ZERO,
            bounds: Bounds::default(),
            seed: 0,
            ground_mask: LayerMask::ALL,
            sampler: SamplerSettings::default(),
            threshold_noise: NoiseSettings::default(),
            templates: Vec::new(),
        }
    }
}

impl VolumeConfig {
    #[cfg(feature = "ron")]
    pub fn from_ron_str(s: &str) -> Result<Self> {
        Ok(ron::from_str(s)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.id.is_empty() {
            return Err(Error::InvalidConfig("volume id must not be empty".into()));
        }
        self.bounds.validate()?;
        self.sampler.validate()?;
        self.threshold_noise.validate()?;
        for (index, template) in self.templates.iter().enumerate() {
            template
                .validate()
                .map_err(|e| Error::InvalidConfig(format!("template {index}: {e}")))?;
        }
        Ok(())
    }

    /// Validates and builds the volume.
    pub fn into_volume(self) -> Result<Volume> {
        self.validate()?;
        Ok(Volume::new(self.id)
            .with_position(self.position)
            .with_bounds(self.bounds)
            .with_seed(self.seed)
            .with_ground_mask(self.ground_mask)
            .with_sampler(self.sampler)
            .with_threshold_noise(self.threshold_noise)
            .with_templates(self.templates))
    }
}

/// Description of a [`Biome`] and its member volumes.
///
/// Member bounds, positions and seeds are overwritten by the biome.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BiomeConfig {
    pub id: String,
    pub position: Vec3,
    pub bounds: Bounds,
    pub seed: i64,
    pub volumes: Vec<VolumeConfig>,
}

impl Default for BiomeConfig {
    fn default() -> Self {
        Self {
            id: "biome".into(),
            position: Vec3::ZERO,
            bounds: Bounds::default(),
            seed: 0,
            volumes: Vec::new(),
        }
    }
}

impl BiomeConfig {
    #[cfg(feature = "ron")]
    pub fn from_ron_str(s: &str) -> Result<Self> {
        Ok(ron::from_str(s)?)
    }

    /// Validates and builds the biome. Member ids must be unique.
    pub fn into_biome(self) -> Result<Biome> {
        self.bounds.validate()?;
        let mut volumes = Vec::with_capacity(self.volumes.len());
        for config in self.volumes {
            if volumes.iter().any(|v: &Volume| v.id == config.id) {
                return Err(Error::InvalidConfig(format!(
                    "duplicate volume id '{}'",
                    config.id
                )));
            }
            volumes.push(config.into_volume()?);
        }
        Ok(Biome::new(self.id)
            .with_position(self.position)
            .with_bounds(self.bounds)
            .with_seed(self.seed)
            .with_volumes(volumes))
    }
}
