//! Templates: what to place and under which terrain constraints.
use glam::{Vec2, Vec3};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::instancing::TemplateRef;
use crate::spatial::LayerMask;

/// A reusable object definition with its placement constraints.
///
/// Ranges are `(min, max)` pairs. Angles are in degrees.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Clone, Debug, PartialEq)]
pub struct EntityTemplate {
    /// Host template to instantiate. `None` is an unresolved reference.
    pub template: Option<TemplateRef>,
    /// Uniform scale range.
    pub scale_range: Vec2,
    /// Euler offset (x, y, z) added after slope alignment.
    pub rotation_offset: Vec3,
    pub random_rotation_x: bool,
    pub random_rotation_z: bool,
    /// Distance moved along the surface normal.
    pub surface_offset: f32,
    /// World altitude range; both ends exclusive.
    pub altitude_range: Vec2,
    pub altitude_jitter: f32,
    /// Surface angle range; min inclusive, max exclusive.
    pub slope_range: Vec2,
    pub slope_jitter: f32,
    /// 0 keeps the instance upright, 1 fully follows the terrain.
    pub slope_align: f32,
    /// Average the normal over the four corners of the footprint.
    pub multi_sample_align: bool,
    /// Half extents of the instance's visual bounds.
    pub footprint_extents: Vec3,
    pub use_proximity_mask: bool,
    /// Something in this mask must be within `near_radius`.
    pub near_mask: LayerMask,
    pub near_radius: f32,
    /// Nothing in this mask may be within `exclude_radius`.
    pub exclude_mask: LayerMask,
    pub exclude_radius: f32,
}

impl Default for EntityTemplate {
    fn default() -> Self {
        Self {
            template: None,
            scale_range: Vec2::new(0.05, 5.0),
            rotation_offset: Vec3::ZERO,
            random_rotation_x: false,
            random_rotation_z: false,
            surface_offset: 0.0,
            altitude_range: Vec2::new(-100.0, 1000.0),
            altitude_jitter: 0.0,
            slope_range: Vec2::new(0.0, 90.0),
            slope_jitter: 0.0,
            slope_align: 1.0,
            multi_sample_align: false,
            footprint_extents: Vec3::splat(0.5),
            use_proximity_mask: false,
            near_mask: LayerMask::NONE,
            near_radius: 0.1,
            exclude_mask: LayerMask::NONE,
            exclude_radius: 0.1,
        }
    }
}

impl EntityTemplate {
    pub fn new(template: impl Into<TemplateRef>) -> Self {
        Self {
            template: Some(template.into()),
            ..Default::default()
        }
    }

    /// A template whose reference could not be resolved.
    pub fn unresolved() -> Self {
        Self::default()
    }

    pub fn with_scale_range(mut self, min: f32, max: f32) -> Self {
        self.scale_range = Vec2::new(min, max);
        self
    }

    pub fn with_rotation_offset(mut self, degrees: Vec3) -> Self {
        self.rotation_offset = degrees;
        self
    }

    pub fn with_random_rotation(mut self, x: bool, z: bool) -> Self {
        self.random_rotation_x = x;
        self.random_rotation_z = z;
        self
    }

    pub fn with_surface_offset(mut self, offset: f32) -> Self {
        self.surface_offset = offset;
        self
    }

    pub fn with_altitude_range(mut self, min: f32, max: f32) -> Self {
        self.altitude_range = Vec2::new(min, max);
        self
    }

    pub fn with_altitude_jitter(mut self, jitter: f32) -> Self {
        self.altitude_jitter = jitter;
        self
    }

    pub fn with_slope_range(mut self, min: f32, max: f32) -> Self {
        self.slope_range = Vec2::new(min, max);
        self
    }

    pub fn with_slope_jitter(mut self, jitter: f32) -> Self {
        self.slope_jitter = jitter;
        self
    }

    /// Sets the slope alignment, clamped to [0, 1].
    pub fn with_slope_align(mut self, align: f32) -> Self {
        self.slope_align = align.clamp(0.0, 1.0);
        self
    }

    /// Enables multi-sample alignment over a footprint with the given half extents.
    pub fn with_multi_sample_align(mut self, footprint_extents: Vec3) -> Self {
        self.multi_sample_align = true;
        self.footprint_extents = footprint_extents;
        self
    }

    pub fn with_proximity_mask(
        mut self,
        near_mask: LayerMask,
        near_radius: f32,
        exclude_mask: LayerMask,
        exclude_radius: f32,
    ) -> Self {
        self.use_proximity_mask = true;
        self.near_mask = near_mask;
        self.near_radius = near_radius;
        self.exclude_mask = exclude_mask;
        self.exclude_radius = exclude_radius;
        self
    }

    /// Template identifier, if resolved.
    pub fn template_ref(&self) -> Option<&str> {
        self.template.as_deref()
    }

    pub fn validate(&self) -> Result<()> {
        let ordered = |r: Vec2| r.is_finite() && r.x <= r.y;
        if !ordered(self.scale_range) {
            return Err(Error::InvalidConfig("scale_range must be ordered".into()));
        }
        if !ordered(self.altitude_range) {
            return Err(Error::InvalidConfig(
                "altitude_range must be ordered".into(),
            ));
        }
        if !ordered(self.slope_range) {
            return Err(Error::InvalidConfig("slope_range must be ordered".into()));
        }
        let non_negative = |v: f32| v.is_finite() && v >= 0.0;
        if !non_negative(self.altitude_jitter) || !non_negative(self.slope_jitter) {
            return Err(Error::InvalidConfig("jitter must be >= 0".into()));
        }
        if !non_negative(self.near_radius) || !non_negative(self.exclude_radius) {
            return Err(Error::InvalidConfig(
                "proximity radii must be >= 0".into(),
            ));
        }
        Ok(())
    }
}
