//! Axis-aligned placement regions.
use glam::{Vec2, Vec3};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Where the owning volume's position sits inside its [`Bounds`].
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BoundsOrigin {
    /// The position is the center of the box.
    #[default]
    Center,
    /// The position is the center of the bottom face.
    BottomCenter,
    /// The position is the minimum corner.
    Corner,
}

/// Axis-aligned box describing a placement region relative to its owner.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    /// Extent along each axis. Components are never negative.
    pub size: Vec3,
    /// Placement of the owner's position within the box.
    pub origin: BoundsOrigin,
}

impl Default for Bounds {
    fn default() -> Self {
        Self::new(Vec3::splat(20.0))
    }
}

impl Bounds {
    /// Creates centered bounds; negative components are clamped to zero.
    pub fn new(size: Vec3) -> Self {
        Self {
            size: size.max(Vec3::ZERO),
            origin: BoundsOrigin::Center,
        }
    }

    pub fn with_origin(mut self, origin: BoundsOrigin) -> Self {
        self.origin = origin;
        self
    }

    /// Minimum corner relative to the owner position.
    pub fn local_min(&self) -> Vec3 {
        match self.origin {
            BoundsOrigin::Center => -self.size * 0.5,
            BoundsOrigin::BottomCenter => Vec3::new(-self.size.x * 0.5, 0.0, -self.size.z * 0.5),
            BoundsOrigin::Corner => Vec3::ZERO,
        }
    }

    /// Maximum corner relative to the owner position.
    pub fn local_max(&self) -> Vec3 {
        self.local_min() + self.size
    }

    /// World-space minimum corner for an owner placed at `position`.
    pub fn min_corner(&self, position: Vec3) -> Vec3 {
        position + self.local_min()
    }

    /// Lateral (x, z) extent used by the point samplers.
    pub fn lateral_extent(&self) -> Vec2 {
        Vec2::new(self.size.x, self.size.z)
    }

    /// Returns true if a height relative to the owner lies within the box.
    pub fn contains_vertical(&self, local_y: f32) -> bool {
        local_y >= self.local_min().y && local_y <= self.local_max().y
    }

    /// Validates that all size components are finite.
    pub fn validate(&self) -> Result<()> {
        if !self.size.is_finite() {
            return Err(Error::InvalidConfig("bounds size must be finite".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_size_is_clamped() {
        let bounds = Bounds::new(Vec3::new(-1.0, 4.0, 2.0));
        assert_eq!(bounds.size, Vec3::new(0.0, 4.0, 2.0));
    }

    #[test]
    fn centered_min_corner_is_half_size_below_position() {
        let bounds = Bounds::new(Vec3::new(10.0, 20.0, 6.0));
        let min = bounds.min_corner(Vec3::new(100.0, 0.0, -5.0));
        assert_eq!(min, Vec3::new(95.0, -10.0, -8.0));
    }

    #[test]
    fn vertical_containment_follows_origin() {
        let centered = Bounds::new(Vec3::splat(10.0));
        assert!(centered.contains_vertical(-5.0));
        assert!(centered.contains_vertical(5.0));
        assert!(!centered.contains_vertical(5.1));

        let bottom = centered.with_origin(BoundsOrigin::BottomCenter);
        assert!(!bottom.contains_vertical(-0.1));
        assert!(bottom.contains_vertical(10.0));
    }

    #[test]
    fn corner_origin_starts_at_owner() {
        let bounds = Bounds::new(Vec3::splat(4.0)).with_origin(BoundsOrigin::Corner);
        assert_eq!(bounds.local_min(), Vec3::ZERO);
        assert_eq!(bounds.local_max(), Vec3::splat(4.0));
    }

    #[test]
    fn non_finite_size_fails_validation() {
        let bounds = Bounds {
            size: Vec3::new(f32::INFINITY, 1.0, 1.0),
            origin: BoundsOrigin::Center,
        };
        assert!(matches!(bounds.validate(), Err(Error::InvalidConfig(_))));
    }
}
