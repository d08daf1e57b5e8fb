//! Points flowing through the placement pipeline.
use glam::{Quat, Vec3};

pub use crate::sampling::ProceduralPoint;
use crate::scatter::transform::look_rotation;

/// A candidate grounded on the terrain, ready for template evaluation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlacementPoint {
    /// World-space hit position.
    pub position: Vec3,
    /// Unit surface normal at the hit.
    pub normal: Vec3,
    /// Threshold noise value in [0, 1] that let the candidate through.
    pub threshold_noise: f32,
}

impl PlacementPoint {
    /// Creates a point, normalizing `normal` (falling back to up) and clamping
    /// the noise value into [0, 1].
    pub fn new(position: Vec3, normal: Vec3, threshold_noise: f32) -> Self {
        Self {
            position,
            normal: normal.try_normalize().unwrap_or(Vec3::Y),
            threshold_noise: threshold_noise.clamp(0.0, 1.0),
        }
    }

    /// Rotation whose forward axis points along the surface normal.
    pub fn normal_rotation(&self) -> Quat {
        look_rotation(self.normal, Vec3::Y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_normalizes_and_clamps() {
        let p = PlacementPoint::new(Vec3::ZERO, Vec3::new(0.0, 3.0, 0.0), 1.5);
        assert_eq!(p.normal, Vec3::Y);
        assert_eq!(p.threshold_noise, 1.0);

        let degenerate = PlacementPoint::new(Vec3::ZERO, Vec3::ZERO, -1.0);
        assert_eq!(degenerate.normal, Vec3::Y);
        assert_eq!(degenerate.threshold_noise, 0.0);
    }

    #[test]
    fn normal_rotation_points_forward_along_normal() {
        let normal = Vec3::new(1.0, 1.0, 0.0).normalize();
        let p = PlacementPoint::new(Vec3::ZERO, normal, 1.0);
        assert!((p.normal_rotation() * Vec3::Z).abs_diff_eq(normal, 1e-5));
    }
}
