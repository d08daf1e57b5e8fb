//! Projection of accepted candidates onto the ground.
use glam::Vec3;

use crate::bounds::Bounds;
use crate::scatter::point::{PlacementPoint, ProceduralPoint};
use crate::spatial::{LayerMask, SpatialQuery};

/// Casts each candidate down from the top of the bounds onto the ground mask.
pub struct GroundProjector<'a, S: SpatialQuery + ?Sized> {
    world: &'a S,
    min_corner: Vec3,
    height: f32,
    mask: LayerMask,
}

impl<'a, S: SpatialQuery + ?Sized> GroundProjector<'a, S> {
    /// Creates a projector for bounds owned by something at `position`.
    pub fn new(world: &'a S, bounds: &Bounds, position: Vec3, mask: LayerMask) -> Self {
        Self {
            world,
            min_corner: bounds.min_corner(position),
            height: bounds.size.y,
            mask,
        }
    }

    /// Grounds a single candidate. A miss drops the candidate.
    pub fn project(&self, point: &ProceduralPoint, threshold_noise: f32) -> Option<PlacementPoint> {
        let origin = self.min_corner + Vec3::new(point.position.x, self.height, point.position.y);
        let hit = self
            .world
            .raycast_down_closest(origin, self.height, self.mask)?;
        Some(PlacementPoint::new(hit.point, hit.normal, threshold_noise))
    }

    pub fn project_all(&self, candidates: &[(ProceduralPoint, f32)]) -> Vec<PlacementPoint> {
        candidates
            .iter()
            .filter_map(|(p, noise)| self.project(p, *noise))
            .collect()
    }
}
