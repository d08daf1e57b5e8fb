//! Poisson disk point sampling strategy (Bridson).
use std::f32::consts::{PI, SQRT_2};

use glam::Vec2;
use rand::RngCore;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::bounds::Bounds;
use crate::error::{Error, Result};
use crate::noise::{NoiseSampler, NoiseSettings};
use crate::random::{rand01, range_index};
use crate::sampling::{next_down, PointSampling, ProceduralPoint};

/// Smallest usable radius. Settings at or below it produce no points.
pub const MIN_RADIUS: f32 = 0.1;

/// Default number of candidates tried around an active point.
pub const DEFAULT_SAMPLES_BEFORE_REJECTION: u32 = 30;

const MAX_MODULATION_STRENGTH: f32 = 0.75;

/// Scales the exclusion radius by a noise field sampled at each active point.
///
/// A noise value `v` gives `radius * (1 + strength * (2v - 1))`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct RadiusModulation {
    pub noise: NoiseSettings,
    /// Modulation strength, clamped to `[0, 0.75]`.
    pub strength: f32,
}

impl RadiusModulation {
    pub fn new(noise: NoiseSettings, strength: f32) -> Self {
        Self {
            noise,
            strength: strength.clamp(0.0, MAX_MODULATION_STRENGTH),
        }
    }
}

/// Poisson disk sampling strategy.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct PoissonDiskSampling {
    /// Minimum distance between samples in world units.
    pub radius: f32,
    /// Candidates tried around an active point before it is retired.
    pub samples_before_rejection: u32,
    /// Optional cap on the number of emitted points.
    pub point_limit: Option<usize>,
    /// Optional noise-driven radius modulation.
    pub radius_modulation: Option<RadiusModulation>,
}

impl Default for PoissonDiskSampling {
    fn default() -> Self {
        Self::new(2.0)
    }
}

impl PoissonDiskSampling {
    /// Create a new PoissonDiskSampling with specified radius.
    pub fn new(radius: f32) -> Self {
        Self {
            radius,
            samples_before_rejection: DEFAULT_SAMPLES_BEFORE_REJECTION,
            point_limit: None,
            radius_modulation: None,
        }
    }

    pub fn with_samples_before_rejection(mut self, samples: u32) -> Self {
        self.samples_before_rejection = samples;
        self
    }

    pub fn with_point_limit(mut self, limit: usize) -> Self {
        self.point_limit = Some(limit);
        self
    }

    pub fn with_radius_modulation(mut self, modulation: RadiusModulation) -> Self {
        self.radius_modulation = Some(modulation);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.radius.is_finite() || self.radius <= MIN_RADIUS {
            return Err(Error::InvalidConfig(format!(
                "poisson radius must be > {MIN_RADIUS}"
            )));
        }
        if self.samples_before_rejection == 0 {
            return Err(Error::InvalidConfig(
                "samples_before_rejection must be > 0".into(),
            ));
        }
        if let Some(m) = &self.radius_modulation {
            m.noise.validate()?;
        }
        Ok(())
    }
}

impl PointSampling for PoissonDiskSampling {
    fn generate(&self, bounds: &Bounds, rng: &mut dyn RngCore) -> Vec<ProceduralPoint> {
        let extent = bounds.lateral_extent();
        if self.validate().is_err() || extent.x <= 0.0 || extent.y <= 0.0 {
            return Vec::new();
        }
        if self.point_limit == Some(0) {
            return Vec::new();
        }

        let modulation = self.radius_modulation.as_ref().map(|m| RadiusField {
            noise: m.noise.build(),
            strength: m.strength.clamp(0.0, MAX_MODULATION_STRENGTH),
        });

        let mut sampler = PoissonDiskSampler::new(self.radius, modulation, extent);
        sampler
            .generate(rng, self.samples_before_rejection, self.point_limit)
            .into_iter()
            .map(ProceduralPoint::from)
            .collect()
    }
}

struct RadiusField {
    noise: NoiseSampler,
    strength: f32,
}

struct PoissonDiskSampler {
    radius: f32,
    modulation: Option<RadiusField>,
    cell_size: f32,
    grid_width: usize,
    grid_height: usize,
    grid: Vec<Option<Vec2>>,
    active_list: Vec<Vec2>,
    bounds: Vec2,
}

impl PoissonDiskSampler {
    fn new(radius: f32, modulation: Option<RadiusField>, bounds: Vec2) -> Self {
        debug_assert!(radius > 0.0);
        let strength = modulation.as_ref().map_or(0.0, |m| m.strength);
        let min_radius = (radius * (1.0 - strength)).max(MIN_RADIUS);
        let cell_size = min_radius / SQRT_2;
        let grid_width = (bounds.x / cell_size).ceil() as usize + 1;
        let grid_height = (bounds.y / cell_size).ceil() as usize + 1;

        Self {
            radius,
            modulation,
            cell_size,
            grid_width,
            grid_height,
            grid: vec![None; grid_width * grid_height],
            active_list: Vec::new(),
            bounds,
        }
    }

    #[inline]
    fn grid_index(&self, x: usize, y: usize) -> usize {
        y * self.grid_width + x
    }

    #[inline]
    fn point_to_grid(&self, point: Vec2) -> (usize, usize) {
        let x = ((point.x / self.cell_size).floor() as isize)
            .clamp(0, self.grid_width as isize - 1) as usize;
        let y = ((point.y / self.cell_size).floor() as isize)
            .clamp(0, self.grid_height as isize - 1) as usize;
        (x, y)
    }

    fn radius_at(&self, point: Vec2) -> f32 {
        match &self.modulation {
            Some(m) => {
                let v = m.noise.value(point);
                (self.radius * (1.0 + m.strength * (2.0 * v - 1.0))).max(MIN_RADIUS)
            }
            None => self.radius,
        }
    }

    fn is_valid_point(&self, point: Vec2, radius: f32) -> bool {
        if point.x < 0.0 || point.x >= self.bounds.x || point.y < 0.0 || point.y >= self.bounds.y
        {
            return false;
        }

        let reach = (radius / self.cell_size).ceil() as usize;
        let radius_squared = radius * radius;
        let (gx, gy) = self.point_to_grid(point);
        let start_x = gx.saturating_sub(reach);
        let end_x = (gx + reach + 1).min(self.grid_width);
        let start_y = gy.saturating_sub(reach);
        let end_y = (gy + reach + 1).min(self.grid_height);

        for y in start_y..end_y {
            for x in start_x..end_x {
                if let Some(existing) = self.grid[self.grid_index(x, y)] {
                    if point.distance_squared(existing) < radius_squared {
                        return false;
                    }
                }
            }
        }

        true
    }

    fn add_point(&mut self, point: Vec2) {
        let (gx, gy) = self.point_to_grid(point);
        let idx = self.grid_index(gx, gy);
        self.grid[idx] = Some(point);
        self.active_list.push(point);
    }

    fn generate_around_point(
        &self,
        rng: &mut dyn RngCore,
        point: Vec2,
        attempts: u32,
    ) -> Option<Vec2> {
        let radius = self.radius_at(point);

        for _ in 0..attempts {
            let angle = rand01(rng) * 2.0 * PI;
            // Uniform in area over the annulus [r, 2r].
            let distance = radius * (1.0 + 3.0 * rand01(rng)).sqrt();
            let candidate = point + Vec2::new(angle.cos(), angle.sin()) * distance;

            if self.is_valid_point(candidate, radius) {
                return Some(candidate);
            }
        }

        None
    }

    fn generate(
        &mut self,
        rng: &mut dyn RngCore,
        attempts: u32,
        point_limit: Option<usize>,
    ) -> Vec<Vec2> {
        let limit = point_limit.unwrap_or(usize::MAX);
        let initial = Vec2::new(
            (rand01(rng) * self.bounds.x).min(next_down(self.bounds.x)),
            (rand01(rng) * self.bounds.y).min(next_down(self.bounds.y)),
        );
        self.add_point(initial);

        let mut points = vec![initial];

        while !self.active_list.is_empty() && points.len() < limit {
            let idx = range_index(rng, self.active_list.len());
            let active = self.active_list[idx];

            match self.generate_around_point(rng, active, attempts) {
                Some(p) => {
                    self.add_point(p);
                    points.push(p);
                }
                None => {
                    self.active_list.swap_remove(idx);
                }
            }
        }

        points
    }
}
