//! Spatial queries against the world the volume scatters onto.
//!
//! [`SpatialQuery`] is the boundary to the host's physics. [`Heightfield`] is a
//! self-contained implementation over a regular height grid with optional
//! sphere colliders, used by the examples, benches and tests.
use std::ops::BitOr;

use glam::{Vec2, Vec3, Vec3Swizzles};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Bit set of collision layers a query is filtered to.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const NONE: LayerMask = LayerMask(0);
    pub const ALL: LayerMask = LayerMask(u32::MAX);

    /// Mask containing the single layer `index` (0..32).
    pub const fn layer(index: u32) -> Self {
        LayerMask(1 << (index & 31))
    }

    #[inline]
    pub fn intersects(self, other: LayerMask) -> bool {
        self.0 & other.0 != 0
    }
}

impl BitOr for LayerMask {
    type Output = LayerMask;

    fn bitor(self, rhs: LayerMask) -> LayerMask {
        LayerMask(self.0 | rhs.0)
    }
}

/// Closest surface hit by a downward ray.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GroundHit {
    pub point: Vec3,
    /// Unit surface normal at the hit.
    pub normal: Vec3,
    pub distance: f32,
}

/// Raycast and overlap queries used by ground projection, multi-sample
/// alignment and proximity masks.
pub trait SpatialQuery {
    /// Casts a ray straight down from `origin` and returns the closest hit on
    /// a collider in `mask` within `max_distance`.
    fn raycast_down_closest(
        &self,
        origin: Vec3,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<GroundHit>;

    /// Returns true if any collider in `mask` intersects the sphere.
    fn overlaps(&self, origin: Vec3, radius: f32, mask: LayerMask) -> bool;
}

/// Sphere collider placed on a [`Heightfield`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SphereCollider {
    pub center: Vec3,
    pub radius: f32,
    pub layers: LayerMask,
}

impl SphereCollider {
    pub fn new(center: Vec3, radius: f32, layers: LayerMask) -> Self {
        Self {
            center,
            radius: radius.max(0.0),
            layers,
        }
    }

    fn raycast_down(&self, origin: Vec3, max_distance: f32) -> Option<GroundHit> {
        let lateral = origin.xz().distance_squared(self.center.xz());
        let r2 = self.radius * self.radius;
        if lateral > r2 {
            return None;
        }
        let top = self.center.y + (r2 - lateral).sqrt();
        let distance = origin.y - top;
        if distance < 0.0 || distance > max_distance {
            return None;
        }
        let point = Vec3::new(origin.x, top, origin.z);
        let normal = (point - self.center).try_normalize().unwrap_or(Vec3::Y);
        Some(GroundHit {
            point,
            normal,
            distance,
        })
    }
}

/// Terrain described by heights on a regular lattice in the xz plane.
#[derive(Clone, Debug)]
pub struct Heightfield {
    origin: Vec2,
    cell_size: f32,
    width: usize,
    depth: usize,
    heights: Vec<f32>,
    layers: LayerMask,
    colliders: Vec<SphereCollider>,
}

impl Heightfield {
    /// Creates a heightfield with `width * depth` lattice nodes starting at
    /// `origin` (x, z), row-major along x.
    pub fn new(
        origin: Vec2,
        cell_size: f32,
        width: usize,
        depth: usize,
        heights: Vec<f32>,
    ) -> Result<Self> {
        if !cell_size.is_finite() || cell_size <= 0.0 {
            return Err(Error::InvalidConfig(
                "heightfield cell_size must be > 0".into(),
            ));
        }
        if width < 2 || depth < 2 {
            return Err(Error::InvalidConfig(
                "heightfield needs at least 2x2 nodes".into(),
            ));
        }
        if heights.len() != width * depth {
            return Err(Error::InvalidConfig(format!(
                "heightfield expects {} heights, got {}",
                width * depth,
                heights.len()
            )));
        }
        Ok(Self {
            origin,
            cell_size,
            width,
            depth,
            heights,
            layers: LayerMask::layer(0),
            colliders: Vec::new(),
        })
    }

    /// Samples `f(x, z)` on every lattice node.
    pub fn from_fn(
        origin: Vec2,
        cell_size: f32,
        width: usize,
        depth: usize,
        f: impl Fn(Vec2) -> f32,
    ) -> Result<Self> {
        let mut heights = Vec::with_capacity(width * depth);
        for j in 0..depth {
            for i in 0..width {
                heights.push(f(origin + Vec2::new(i as f32, j as f32) * cell_size));
            }
        }
        Self::new(origin, cell_size, width, depth, heights)
    }

    /// Flat ground at `height` covering `extent` starting at `origin`.
    pub fn flat(origin: Vec2, extent: Vec2, height: f32) -> Result<Self> {
        let cell_size = extent.max_element().max(1.0);
        let width = (extent.x / cell_size).ceil() as usize + 1;
        let depth = (extent.y / cell_size).ceil() as usize + 1;
        Self::from_fn(origin, cell_size, width.max(2), depth.max(2), |_| height)
    }

    /// Sets the layers the ground surface belongs to.
    pub fn with_layers(mut self, layers: LayerMask) -> Self {
        self.layers = layers;
        self
    }

    pub fn with_collider(mut self, collider: SphereCollider) -> Self {
        self.colliders.push(collider);
        self
    }

    pub fn add_collider(&mut self, collider: SphereCollider) {
        self.colliders.push(collider);
    }

    pub fn layers(&self) -> LayerMask {
        self.layers
    }

    /// Lateral extent covered by the lattice.
    pub fn extent(&self) -> Vec2 {
        Vec2::new(
            (self.width - 1) as f32 * self.cell_size,
            (self.depth - 1) as f32 * self.cell_size,
        )
    }

    #[inline]
    fn node(&self, i: usize, j: usize) -> f32 {
        self.heights[j * self.width + i]
    }

    /// Bilinearly interpolated height, `None` outside the lattice.
    pub fn height_at(&self, position: Vec2) -> Option<f32> {
        let local = (position - self.origin) / self.cell_size;
        let max = Vec2::new((self.width - 1) as f32, (self.depth - 1) as f32);
        if !local.is_finite() || local.x < 0.0 || local.y < 0.0 || local.x > max.x || local.y > max.y
        {
            return None;
        }
        let i0 = (local.x.floor() as usize).min(self.width - 2);
        let j0 = (local.y.floor() as usize).min(self.depth - 2);
        let tx = local.x - i0 as f32;
        let tz = local.y - j0 as f32;

        let h00 = self.node(i0, j0);
        let h10 = self.node(i0 + 1, j0);
        let h01 = self.node(i0, j0 + 1);
        let h11 = self.node(i0 + 1, j0 + 1);
        let a = h00 + (h10 - h00) * tx;
        let b = h01 + (h11 - h01) * tx;
        Some(a + (b - a) * tz)
    }

    /// Surface normal from central differences, `None` outside the lattice.
    pub fn normal_at(&self, position: Vec2) -> Option<Vec3> {
        let center = self.height_at(position)?;
        let step = self.cell_size * 0.5;
        let sample = |offset: Vec2| self.height_at(position + offset).unwrap_or(center);

        let dx = (sample(Vec2::new(step, 0.0)) - sample(Vec2::new(-step, 0.0))) / (2.0 * step);
        let dz = (sample(Vec2::new(0.0, step)) - sample(Vec2::new(0.0, -step))) / (2.0 * step);
        Some(Vec3::new(-dx, 1.0, -dz).normalize())
    }
}

impl SpatialQuery for Heightfield {
    fn raycast_down_closest(
        &self,
        origin: Vec3,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<GroundHit> {
        let mut closest: Option<GroundHit> = None;

        if mask.intersects(self.layers) {
            if let Some(height) = self.height_at(origin.xz()) {
                let distance = origin.y - height;
                if (0.0..=max_distance).contains(&distance) {
                    let normal = self.normal_at(origin.xz()).unwrap_or(Vec3::Y);
                    closest = Some(GroundHit {
                        point: Vec3::new(origin.x, height, origin.z),
                        normal,
                        distance,
                    });
                }
            }
        }

        for collider in self.colliders.iter().filter(|c| mask.intersects(c.layers)) {
            if let Some(hit) = collider.raycast_down(origin, max_distance) {
                if closest.is_none_or(|c| hit.distance < c.distance) {
                    closest = Some(hit);
                }
            }
        }

        closest
    }

    fn overlaps(&self, origin: Vec3, radius: f32, mask: LayerMask) -> bool {
        let hits_collider = self
            .colliders
            .iter()
            .filter(|c| mask.intersects(c.layers))
            .any(|c| c.center.distance(origin) < c.radius + radius);
        if hits_collider {
            return true;
        }

        mask.intersects(self.layers)
            && self
                .height_at(origin.xz())
                .is_some_and(|h| origin.y - radius <= h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slope() -> Heightfield {
        // Rises one unit per unit along x.
        Heightfield::from_fn(Vec2::ZERO, 1.0, 11, 11, |p| p.x).unwrap()
    }

    #[test]
    fn rejects_mismatched_height_count() {
        let err = Heightfield::new(Vec2::ZERO, 1.0, 3, 3, vec![0.0; 8]);
        assert!(matches!(err, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn height_is_bilinear() {
        let field = slope();
        assert_eq!(field.height_at(Vec2::new(2.5, 4.0)), Some(2.5));
        assert_eq!(field.height_at(Vec2::new(10.0, 10.0)), Some(10.0));
        assert_eq!(field.height_at(Vec2::new(10.5, 1.0)), None);
    }

    #[test]
    fn normal_tilts_against_gradient() {
        let n = slope().normal_at(Vec2::new(5.0, 5.0)).unwrap();
        let expected = Vec3::new(-1.0, 1.0, 0.0).normalize();
        assert!(n.abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn raycast_respects_mask_and_distance() {
        let field = Heightfield::flat(Vec2::ZERO, Vec2::splat(10.0), 2.0).unwrap();
        let origin = Vec3::new(5.0, 12.0, 5.0);

        let hit = field
            .raycast_down_closest(origin, 20.0, LayerMask::ALL)
            .unwrap();
        assert_eq!(hit.point, Vec3::new(5.0, 2.0, 5.0));
        assert_eq!(hit.distance, 10.0);
        assert!(hit.normal.abs_diff_eq(Vec3::Y, 1e-6));

        assert!(field
            .raycast_down_closest(origin, 5.0, LayerMask::ALL)
            .is_none());
        assert!(field
            .raycast_down_closest(origin, 20.0, LayerMask::layer(3))
            .is_none());
    }

    #[test]
    fn raycast_returns_closest_of_ground_and_colliders() {
        let rock = SphereCollider::new(Vec3::new(5.0, 2.0, 5.0), 1.0, LayerMask::layer(0));
        let field = Heightfield::flat(Vec2::ZERO, Vec2::splat(10.0), 2.0)
            .unwrap()
            .with_collider(rock);

        let hit = field
            .raycast_down_closest(Vec3::new(5.0, 10.0, 5.0), 20.0, LayerMask::ALL)
            .unwrap();
        assert!((hit.point.y - 3.0).abs() < 1e-6);
        assert!(hit.normal.abs_diff_eq(Vec3::Y, 1e-6));
    }

    #[test]
    fn overlaps_filters_by_layer() {
        let field = Heightfield::flat(Vec2::ZERO, Vec2::splat(10.0), 0.0)
            .unwrap()
            .with_collider(SphereCollider::new(
                Vec3::new(5.0, 5.0, 5.0),
                1.0,
                LayerMask::layer(4),
            ));

        assert!(field.overlaps(Vec3::new(5.0, 5.0, 6.5), 1.0, LayerMask::layer(4)));
        assert!(!field.overlaps(Vec3::new(5.0, 5.0, 6.5), 1.0, LayerMask::layer(5)));
        assert!(!field.overlaps(Vec3::new(5.0, 5.0, 8.5), 1.0, LayerMask::layer(4)));
        assert!(field.overlaps(Vec3::new(5.0, 0.5, 5.0), 1.0, LayerMask::layer(0)));
    }

    #[test]
    fn layer_mask_combines() {
        let mask = LayerMask::layer(1) | LayerMask::layer(2);
        assert!(mask.intersects(LayerMask::layer(2)));
        assert!(!mask.intersects(LayerMask::layer(0)));
        assert!(!LayerMask::NONE.intersects(LayerMask::ALL));
    }
}
