//! Snapping of already-placed instances onto the ground.
//!
//! A [`RaycastPlacer`] does not spawn anything. It casts a long ray down from
//! every instance under its id, moves the instance to the hit and optionally
//! blends its rotation towards the surface normal. The transforms it replaced
//! are kept so [`RaycastPlacer::reset_placed`] can put them back.
use glam::{EulerRot, Quat, Vec3};
use tracing::{debug, error, warn};

use crate::instancing::{InstanceHandle, InstanceTransform, Instantiator, ParentId};
use crate::random::{range_f32, rng_for_seed};
use crate::scatter::events::{EventSink, PlacementEvent, PlacementEventKind};
use crate::scatter::placer::Placer;
use crate::scatter::point::PlacementPoint;
use crate::scatter::transform::{add_euler_offset, look_rotation};
use crate::spatial::{LayerMask, SpatialQuery};

/// Height above an instance at which its snapping ray starts.
pub const SNAP_RAY_HEIGHT: f32 = 80.0;

/// Length of snapping rays.
pub const SNAP_RAY_LENGTH: f32 = 500.0;

/// Euler offset in degrees that stands a look rotation upright on flat ground.
pub const DEFAULT_SNAP_ROTATION_OFFSET: Vec3 = Vec3::new(90.0, 0.0, 0.0);

/// Moves the instances parented to `id` down onto the ground.
#[derive(Clone, Debug)]
pub struct RaycastPlacer {
    pub id: ParentId,
    pub ground_mask: LayerMask,
    /// Blend in [0, 1] from a yaw-only rotation to the terrain-aligned one.
    /// At 0 the rotation is left alone unless `random_rotation` is set.
    pub match_terrain_normal: f32,
    /// Replaces every instance's yaw with one drawn from `seed`.
    pub random_rotation: bool,
    /// Euler offset in degrees added to the terrain-aligned rotation.
    pub rotation_offset: Vec3,
    pub seed: i64,
    replaced: Vec<(InstanceHandle, InstanceTransform)>,
}

impl RaycastPlacer {
    pub fn new(id: impl Into<ParentId>) -> Self {
        Self {
            id: id.into(),
            ground_mask: LayerMask::ALL,
            match_terrain_normal: 0.0,
            random_rotation: false,
            rotation_offset: DEFAULT_SNAP_ROTATION_OFFSET,
            seed: 0,
            replaced: Vec::new(),
        }
    }

    pub fn with_ground_mask(mut self, mask: LayerMask) -> Self {
        self.ground_mask = mask;
        self
    }

    pub fn with_match_terrain_normal(mut self, amount: f32) -> Self {
        self.match_terrain_normal = amount.clamp(0.0, 1.0);
        self
    }

    pub fn with_random_rotation(mut self, seed: i64) -> Self {
        self.random_rotation = true;
        self.seed = seed;
        self
    }

    pub fn with_rotation_offset(mut self, degrees: Vec3) -> Self {
        self.rotation_offset = degrees;
        self
    }

    /// Transforms as they were before the first snap since the last reset.
    pub fn replaced(&self) -> &[(InstanceHandle, InstanceTransform)] {
        &self.replaced
    }

    /// Rotation for an instance resting on a surface with `normal`.
    ///
    /// `yaw` overrides the current yaw when set.
    pub fn snapped_rotation(&self, current: Quat, normal: Vec3, yaw: Option<f32>) -> Quat {
        let yaw = yaw.unwrap_or_else(|| current.to_euler(EulerRot::YXZ).0);
        let upright = Quat::from_rotation_y(yaw);
        if self.match_terrain_normal <= 0.0 {
            return if self.random_rotation { upright } else { current };
        }

        let mut aligned = add_euler_offset(look_rotation(normal, Vec3::Y), self.rotation_offset);
        if self.random_rotation {
            aligned *= upright;
        }
        upright.slerp(aligned, self.match_terrain_normal.min(1.0))
    }

    /// Snaps every child of `id` and returns the hit points.
    pub fn snap(
        &mut self,
        world: &dyn SpatialQuery,
        spawner: &mut dyn Instantiator,
        sink: &mut dyn EventSink,
    ) -> Vec<PlacementPoint> {
        let children = spawner.child_transforms(&self.id);
        let mut rng = rng_for_seed(self.seed);
        let mut points = Vec::with_capacity(children.len());

        for (handle, transform) in &children {
            let yaw = self
                .random_rotation
                .then(|| range_f32(&mut rng, 0.0, 360.0).to_radians());

            let origin = transform.position + Vec3::Y * SNAP_RAY_HEIGHT;
            let Some(hit) = world.raycast_down_closest(origin, SNAP_RAY_LENGTH, self.ground_mask)
            else {
                continue;
            };

            let snapped = InstanceTransform::new(
                hit.point,
                self.snapped_rotation(transform.rotation, hit.normal, yaw),
                transform.scale,
            );
            if let Err(e) = spawner.set_transform(*handle, &snapped) {
                error!("Raycast placer '{}': {}; skipping instance.", self.id, e);
                if sink.wants(PlacementEventKind::Error) {
                    sink.send(PlacementEvent::Error {
                        context: format!("placer:{}", self.id),
                        message: e.to_string(),
                    });
                }
                continue;
            }
            if !self.replaced.iter().any(|(h, _)| h == handle) {
                self.replaced.push((*handle, *transform));
            }
            points.push(PlacementPoint::new(hit.point, hit.normal, 1.0));
        }

        debug!(
            "Raycast placer '{}': {} of {} instances snapped.",
            self.id,
            points.len(),
            children.len()
        );
        if sink.wants(PlacementEventKind::PointsGrounded) {
            sink.send(PlacementEvent::PointsGrounded {
                volume: self.id.clone(),
                accepted: children.len(),
                grounded: points.len(),
            });
        }
        let missed = children.len() - points.len();
        if missed > 0 {
            warn!("Raycast placer '{}': {} instances left in place.", self.id, missed);
            if sink.wants(PlacementEventKind::Warning) {
                sink.send(PlacementEvent::Warning {
                    context: format!("placer:{}", self.id),
                    message: format!("{missed} instances were not snapped"),
                });
            }
        }
        points
    }

    /// Restores every transform replaced since the last reset.
    pub fn reset_placed(&mut self, spawner: &mut dyn Instantiator) {
        for (handle, transform) in self.replaced.drain(..) {
            // Instances destroyed by the host since the snap are gone for good.
            let _ = spawner.set_transform(handle, &transform);
        }
    }
}

impl Placer for RaycastPlacer {
    fn id(&self) -> &str {
        &self.id
    }

    fn run_placement(
        &mut self,
        world: &dyn SpatialQuery,
        spawner: &mut dyn Instantiator,
        sink: &mut dyn EventSink,
    ) -> Option<Vec<PlacementPoint>> {
        Some(self.snap(world, spawner, sink))
    }

    fn reset_placed(&mut self, spawner: &mut dyn Instantiator) {
        RaycastPlacer::reset_placed(self, spawner);
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::instancing::VecInstantiator;
    use crate::scatter::events::VecSink;
    use crate::spatial::Heightfield;

    fn ramp() -> Heightfield {
        Heightfield::from_fn(Vec2::splat(-20.0), 1.0, 41, 41, |p| p.x).unwrap()
    }

    fn spawn_at(
        spawner: &mut VecInstantiator,
        parent: &str,
        position: Vec3,
        yaw: f32,
    ) -> InstanceHandle {
        let t = InstanceTransform::new(position, Quat::from_rotation_y(yaw), Vec3::splat(2.0));
        spawner.spawn("post", &t, parent).unwrap()
    }

    #[test]
    fn snaps_children_onto_ground_keeping_rotation() {
        let world = ramp();
        let mut spawner = VecInstantiator::new();
        let a = spawn_at(&mut spawner, "fence", Vec3::new(3.0, 40.0, 1.0), 0.5);
        spawn_at(&mut spawner, "other", Vec3::new(3.0, 40.0, 1.0), 0.0);
        let mut placer = RaycastPlacer::new("fence");

        let points = placer.snap(&world, &mut spawner, &mut ());
        assert_eq!(points.len(), 1);
        assert!((points[0].position.y - 3.0).abs() < 1e-4);

        let (handle, t) = spawner.child_transforms("fence")[0];
        assert_eq!(handle, a);
        assert!(t.position.abs_diff_eq(Vec3::new(3.0, 3.0, 1.0), 1e-4));
        assert!(t.rotation.abs_diff_eq(Quat::from_rotation_y(0.5), 1e-6));
        assert_eq!(t.scale, Vec3::splat(2.0));
        assert_eq!(spawner.child_transforms("other")[0].1.position.y, 40.0);
    }

    #[test]
    fn missed_instances_stay_and_are_reported() {
        let world = ramp();
        let mut spawner = VecInstantiator::new();
        spawn_at(&mut spawner, "fence", Vec3::new(0.0, 10.0, 0.0), 0.0);
        spawn_at(&mut spawner, "fence", Vec3::new(500.0, 10.0, 0.0), 0.0);
        let mut placer = RaycastPlacer::new("fence");
        let mut sink = VecSink::new();

        let points = placer.snap(&world, &mut spawner, &mut sink);
        assert_eq!(points.len(), 1);
        assert_eq!(spawner.child_transforms("fence")[1].1.position.x, 500.0);
        assert_eq!(placer.replaced().len(), 1);
        assert_eq!(sink.count(PlacementEventKind::Warning), 1);
        assert!(matches!(
            sink.as_slice()[0],
            PlacementEvent::PointsGrounded {
                accepted: 2,
                grounded: 1,
                ..
            }
        ));
    }

    #[test]
    fn full_match_aligns_up_with_normal() {
        let world = ramp();
        let mut spawner = VecInstantiator::new();
        spawn_at(&mut spawner, "fence", Vec3::new(0.0, 10.0, 0.0), 1.0);
        let mut placer = RaycastPlacer::new("fence").with_match_terrain_normal(1.0);

        placer.snap(&world, &mut spawner, &mut ());
        let t = spawner.child_transforms("fence")[0].1;
        let normal = Vec3::new(-1.0, 1.0, 0.0).normalize();
        assert!((t.rotation * Vec3::Y).abs_diff_eq(normal, 1e-4));
    }

    #[test]
    fn default_offset_is_upright_on_flat_ground() {
        let placer = RaycastPlacer::new("fence").with_match_terrain_normal(1.0);
        let q = placer.snapped_rotation(Quat::IDENTITY, Vec3::Y, None);
        assert!((q * Vec3::Y).abs_diff_eq(Vec3::Y, 1e-5));
    }

    #[test]
    fn partial_match_blends_from_yaw_only() {
        let placer = RaycastPlacer::new("fence").with_match_terrain_normal(0.5);
        let normal = Vec3::new(1.0, 1.0, 0.0).normalize();
        let current = Quat::from_rotation_y(0.3) * Quat::from_rotation_x(0.4);

        let q = placer.snapped_rotation(current, normal, None);
        let full = RaycastPlacer::new("fence")
            .with_match_terrain_normal(1.0)
            .snapped_rotation(current, normal, None);
        let upright = Quat::from_rotation_y(0.3);
        assert!(q.abs_diff_eq(upright.slerp(full, 0.5), 1e-5));
    }

    #[test]
    fn random_rotation_is_seeded() {
        let world = ramp();
        let positions = [Vec3::new(-5.0, 10.0, 2.0), Vec3::new(5.0, 10.0, -2.0)];
        let run = |seed: i64| {
            let mut spawner = VecInstantiator::new();
            for p in positions {
                spawn_at(&mut spawner, "rocks", p, 0.0);
            }
            RaycastPlacer::new("rocks")
                .with_random_rotation(seed)
                .snap(&world, &mut spawner, &mut ());
            spawner
                .child_transforms("rocks")
                .into_iter()
                .map(|(_, t)| t.rotation)
                .collect::<Vec<_>>()
        };

        let a = run(7);
        assert_eq!(a, run(7));
        assert_ne!(a, run(8));
        for q in &a {
            assert!((*q * Vec3::Y).abs_diff_eq(Vec3::Y, 1e-5));
        }
    }

    #[test]
    fn reset_restores_replaced_transforms() {
        let world = ramp();
        let mut spawner = VecInstantiator::new();
        spawn_at(&mut spawner, "fence", Vec3::new(2.0, 25.0, 0.0), 0.0);
        let before = spawner.child_transforms("fence");
        let mut placer = RaycastPlacer::new("fence").with_match_terrain_normal(1.0);

        placer.snap(&world, &mut spawner, &mut ());
        placer.snap(&world, &mut spawner, &mut ());
        assert_eq!(placer.replaced().len(), 1);
        assert_ne!(spawner.child_transforms("fence"), before);

        placer.reset_placed(&mut spawner);
        placer.reset_placed(&mut spawner);
        assert_eq!(spawner.child_transforms("fence"), before);
        assert!(placer.replaced().is_empty());
    }
}
