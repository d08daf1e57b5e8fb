//! Template selection and instance transform composition.
//!
//! Draw order per placed point is fixed: template index, scale, yaw, then the
//! optional random X and Z angles. Keeping it fixed is what makes two runs
//! with the same seed identical.
use glam::{EulerRot, Mat3, Quat, Vec3};
use rand::RngCore;

use crate::instancing::InstanceTransform;
use crate::random::{range_f32, range_index};
use crate::scatter::point::PlacementPoint;
use crate::scatter::template::EntityTemplate;
use crate::spatial::{LayerMask, SpatialQuery};

/// Tilt applied after the look rotation so the template's up axis, rather
/// than its forward axis, follows the surface normal.
pub const TILT_CORRECTION_DEGREES: f32 = 90.0;

/// Height above the footprint corners at which multi-sample rays start.
pub const MULTI_SAMPLE_RAY_HEIGHT: f32 = 5.0;

/// Length of multi-sample rays.
pub const MULTI_SAMPLE_RAY_LENGTH: f32 = 50.0;

const FOOTPRINT_SAMPLE_FACTOR: f32 = 0.5;

/// Rotation mapping +Z onto `forward` with +Y as close to `up` as possible.
pub fn look_rotation(forward: Vec3, up: Vec3) -> Quat {
    let z = forward.try_normalize().unwrap_or(Vec3::Z);
    let x = up.cross(z).try_normalize().unwrap_or_else(|| {
        let fallback = if z.x.abs() < 0.9 { Vec3::X } else { Vec3::Z };
        fallback.reject_from(z).normalize()
    });
    let y = z.cross(x);
    Quat::from_mat3(&Mat3::from_cols(x, y, z))
}

/// Terrain-following rotation with a yaw around the template's up axis,
/// blended from upright by `slope_align`.
pub fn normal_to_rotation(normal: Vec3, slope_align: f32, yaw_degrees: f32) -> Quat {
    let follow = look_rotation(normal, Vec3::Y)
        * Quat::from_rotation_x(TILT_CORRECTION_DEGREES.to_radians())
        * Quat::from_rotation_y(yaw_degrees.to_radians());
    Quat::IDENTITY.slerp(follow, slope_align.clamp(0.0, 1.0))
}

/// Averages the ground normal under the four lateral corners of a footprint.
///
/// Returns `None` if no ray hits the ground.
pub fn multi_sample_normal<S: SpatialQuery + ?Sized>(
    world: &S,
    center: Vec3,
    extents: Vec3,
    mask: LayerMask,
) -> Option<Vec3> {
    let e = extents * FOOTPRINT_SAMPLE_FACTOR;
    let corners = [(-e.x, -e.z), (-e.x, e.z), (e.x, -e.z), (e.x, e.z)];

    let mut sum = Vec3::ZERO;
    let mut hits = 0;
    for (dx, dz) in corners {
        let origin = center + Vec3::new(dx, MULTI_SAMPLE_RAY_HEIGHT, dz);
        if let Some(hit) = world.raycast_down_closest(origin, MULTI_SAMPLE_RAY_LENGTH, mask) {
            sum += hit.normal;
            hits += 1;
        }
    }

    if hits == 0 {
        return None;
    }
    (sum / hits as f32).try_normalize()
}

/// Adds an offset in degrees to `rotation` in YXZ Euler space.
pub fn add_euler_offset(rotation: Quat, offset_degrees: Vec3) -> Quat {
    let (y, x, z) = rotation.to_euler(EulerRot::YXZ);
    Quat::from_euler(
        EulerRot::YXZ,
        y + offset_degrees.y.to_radians(),
        x + offset_degrees.x.to_radians(),
        z + offset_degrees.z.to_radians(),
    )
}

/// Adds the template's Euler offset and optional random X/Z angles.
pub fn apply_rotation_offset(
    aligned: Quat,
    template: &EntityTemplate,
    rng: &mut dyn RngCore,
) -> Quat {
    let mut offset = template.rotation_offset;
    if template.random_rotation_x {
        offset.x += range_f32(rng, 0.0, 360.0);
    }
    if template.random_rotation_z {
        offset.z += range_f32(rng, 0.0, 360.0);
    }
    add_euler_offset(aligned, offset)
}

/// Picks one of the valid template indices uniformly. No draw for an empty set.
pub fn select_template(valid: &[usize], rng: &mut dyn RngCore) -> Option<usize> {
    if valid.is_empty() {
        return None;
    }
    Some(valid[range_index(rng, valid.len())])
}

/// Result of composing a transform for a point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Composition {
    Placed(InstanceTransform),
    /// The proximity mask rejected the position.
    ProximityRejected,
}

/// Computes placed transforms against a world.
pub struct TransformComposer<'a, S: SpatialQuery + ?Sized> {
    world: &'a S,
    ground_mask: LayerMask,
}

impl<'a, S: SpatialQuery + ?Sized> TransformComposer<'a, S> {
    pub fn new(world: &'a S, ground_mask: LayerMask) -> Self {
        Self { world, ground_mask }
    }

    pub fn compose(
        &self,
        point: &PlacementPoint,
        template: &EntityTemplate,
        rng: &mut dyn RngCore,
    ) -> Composition {
        let scalar = range_f32(rng, template.scale_range.x, template.scale_range.y);
        let scale = Vec3::splat(scalar * point.threshold_noise);
        let position = point.position + point.normal * template.surface_offset;

        if !self.proximity_allows(position, scalar, template) {
            return Composition::ProximityRejected;
        }

        let normal = if template.multi_sample_align {
            multi_sample_normal(
                self.world,
                position,
                template.footprint_extents * scalar,
                self.ground_mask,
            )
            .unwrap_or(point.normal)
        } else {
            point.normal
        };

        let yaw = range_f32(rng, 0.0, 360.0);
        let aligned = normal_to_rotation(normal, template.slope_align, yaw);
        let rotation = apply_rotation_offset(aligned, template, rng);

        Composition::Placed(InstanceTransform::new(position, rotation, scale))
    }

    /// Requires something in the near mask and nothing in the exclude mask,
    /// with radii scaled by the drawn scale.
    pub fn proximity_allows(&self, position: Vec3, scalar: f32, template: &EntityTemplate) -> bool {
        if !template.use_proximity_mask {
            return true;
        }
        let near = self
            .world
            .overlaps(position, template.near_radius * scalar, template.near_mask);
        let excluded =
            self.world
                .overlaps(position, template.exclude_radius * scalar, template.exclude_mask);
        near && !excluded
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use glam::Vec2;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::random::tests::FixedRng;
    use crate::spatial::{GroundHit, Heightfield, SphereCollider};

    fn flat() -> Heightfield {
        Heightfield::flat(Vec2::splat(-50.0), Vec2::splat(100.0), 0.0).unwrap()
    }

    fn ramp() -> Heightfield {
        Heightfield::from_fn(Vec2::splat(-50.0), 1.0, 101, 101, |p| p.x).unwrap()
    }

    #[test]
    fn look_rotation_maps_z_to_forward() {
        for forward in [Vec3::X, Vec3::NEG_Z, Vec3::new(1.0, 2.0, 3.0).normalize()] {
            let q = look_rotation(forward, Vec3::Y);
            assert!((q * Vec3::Z).abs_diff_eq(forward, 1e-5));
        }
    }

    #[test]
    fn flat_normal_with_zero_yaw_is_identity() {
        let q = normal_to_rotation(Vec3::Y, 1.0, 0.0);
        assert!(q.abs_diff_eq(Quat::IDENTITY, 1e-5) || q.abs_diff_eq(-Quat::IDENTITY, 1e-5));
    }

    #[test]
    fn full_alignment_follows_normal() {
        let normal = Vec3::new(1.0, 1.0, 0.0).normalize();
        for yaw in [0.0, 45.0, 200.0] {
            let q = normal_to_rotation(normal, 1.0, yaw);
            assert!((q * Vec3::Y).abs_diff_eq(normal, 1e-5));
        }
    }

    #[test]
    fn zero_alignment_stays_upright() {
        let q = normal_to_rotation(Vec3::new(1.0, 1.0, 0.0).normalize(), 0.0, 123.0);
        assert!((q * Vec3::Y).abs_diff_eq(Vec3::Y, 1e-6));
    }

    #[test]
    fn rotation_offset_is_added_in_euler_space() {
        let template = EntityTemplate::new("a").with_rotation_offset(Vec3::new(0.0, 90.0, 0.0));
        let mut rng = FixedRng { value: 0 };
        let q = apply_rotation_offset(Quat::IDENTITY, &template, &mut rng);
        assert!((q * Vec3::Z).abs_diff_eq(Vec3::X, 1e-5));
    }

    #[test]
    fn select_template_picks_from_valid_set() {
        let mut rng = FixedRng { value: u32::MAX };
        assert_eq!(select_template(&[4, 7, 9], &mut rng), Some(9));
        assert_eq!(select_template(&[], &mut rng), None);
    }

    #[test]
    fn scale_is_multiplied_by_threshold_noise() {
        let world = flat();
        let composer = TransformComposer::new(&world, LayerMask::ALL);
        let template = EntityTemplate::new("a").with_scale_range(2.0, 2.0);
        let point = PlacementPoint::new(Vec3::ZERO, Vec3::Y, 0.5);
        let mut rng = StdRng::seed_from_u64(1);

        match composer.compose(&point, &template, &mut rng) {
            Composition::Placed(t) => assert_eq!(t.scale, Vec3::ONE),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn surface_offset_moves_along_normal() {
        let world = flat();
        let composer = TransformComposer::new(&world, LayerMask::ALL);
        let template = EntityTemplate::new("a").with_surface_offset(-0.5);
        let point = PlacementPoint::new(Vec3::new(1.0, 2.0, 3.0), Vec3::Y, 1.0);
        let mut rng = StdRng::seed_from_u64(1);

        match composer.compose(&point, &template, &mut rng) {
            Composition::Placed(t) => assert_eq!(t.position, Vec3::new(1.0, 1.5, 3.0)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn proximity_requires_near_and_no_exclude() {
        let near = LayerMask::layer(1);
        let exclude = LayerMask::layer(2);
        let world = flat()
            .with_collider(SphereCollider::new(Vec3::new(0.0, 0.0, 0.0), 0.5, near))
            .with_collider(SphereCollider::new(Vec3::new(10.0, 0.0, 0.0), 0.5, exclude))
            .with_collider(SphereCollider::new(Vec3::new(11.0, 0.0, 0.0), 0.5, near));
        let composer = TransformComposer::new(&world, LayerMask::layer(0));
        let template =
            EntityTemplate::new("a").with_proximity_mask(near, 1.0, exclude, 1.0);

        assert!(composer.proximity_allows(Vec3::new(1.0, 0.0, 0.0), 1.0, &template));
        assert!(!composer.proximity_allows(Vec3::new(5.0, 0.0, 0.0), 1.0, &template));
        assert!(!composer.proximity_allows(Vec3::new(10.8, 0.0, 0.0), 1.0, &template));
        // Radii scale with the drawn scale.
        assert!(composer.proximity_allows(Vec3::new(3.0, 0.0, 0.0), 3.0, &template));
    }

    #[test]
    fn proximity_rejection_is_reported() {
        let world = flat();
        let composer = TransformComposer::new(&world, LayerMask::ALL);
        let template = EntityTemplate::new("a").with_proximity_mask(
            LayerMask::layer(7),
            1.0,
            LayerMask::NONE,
            1.0,
        );
        let point = PlacementPoint::new(Vec3::ZERO, Vec3::Y, 1.0);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            composer.compose(&point, &template, &mut rng),
            Composition::ProximityRejected
        );
    }

    /// Records ray origins and reports flat ground below every ray.
    #[derive(Default)]
    struct RecordingWorld {
        origins: RefCell<Vec<Vec3>>,
    }

    impl SpatialQuery for RecordingWorld {
        fn raycast_down_closest(
            &self,
            origin: Vec3,
            max_distance: f32,
            _mask: LayerMask,
        ) -> Option<GroundHit> {
            self.origins.borrow_mut().push(origin);
            Some(GroundHit {
                point: origin - Vec3::Y * max_distance * 0.5,
                normal: Vec3::Y,
                distance: max_distance * 0.5,
            })
        }

        fn overlaps(&self, _origin: Vec3, _radius: f32, _mask: LayerMask) -> bool {
            false
        }
    }

    #[test]
    fn multi_sample_corners_follow_surface_offset() {
        let world = RecordingWorld::default();
        let composer = TransformComposer::new(&world, LayerMask::ALL);
        let template = EntityTemplate::new("a")
            .with_scale_range(1.0, 1.0)
            .with_surface_offset(3.0)
            .with_multi_sample_align(Vec3::new(4.0, 1.0, 2.0));
        let point = PlacementPoint::new(Vec3::new(10.0, 1.0, -5.0), Vec3::Y, 1.0);
        let mut rng = StdRng::seed_from_u64(1);

        let Composition::Placed(t) = composer.compose(&point, &template, &mut rng) else {
            panic!("expected a placement");
        };
        assert_eq!(t.position, Vec3::new(10.0, 4.0, -5.0));

        let origins = world.origins.borrow();
        assert_eq!(origins.len(), 4);
        let center = origins.iter().copied().sum::<Vec3>() / 4.0;
        assert!(center.abs_diff_eq(t.position + Vec3::Y * MULTI_SAMPLE_RAY_HEIGHT, 1e-5));
        for o in origins.iter() {
            assert_eq!((o.x - t.position.x).abs(), 2.0);
            assert_eq!((o.z - t.position.z).abs(), 1.0);
        }
    }

    #[test]
    fn multi_sample_averages_corner_normals() {
        let world = ramp();
        let n = multi_sample_normal(&world, Vec3::new(0.0, 0.0, 0.0), Vec3::splat(2.0), LayerMask::ALL)
            .unwrap();
        assert!(n.abs_diff_eq(Vec3::new(-1.0, 1.0, 0.0).normalize(), 1e-4));

        let missed = multi_sample_normal(&world, Vec3::new(0.0, -100.0, 0.0), Vec3::ONE, LayerMask::ALL);
        assert!(missed.is_none());
    }
}
