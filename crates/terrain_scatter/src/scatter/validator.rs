//! Per-template altitude and slope constraints, and the volume height gate.
//!
//! Checks return explicit outcomes; callers fold them into
//! [`crate::scatter::stats::DebugStats`].
use glam::Vec3;
use rand::RngCore;

use crate::bounds::Bounds;
use crate::random::range_f32;
use crate::scatter::point::PlacementPoint;
use crate::scatter::template::EntityTemplate;

/// Outcome of checking one point against one template.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TemplateCheck {
    pub altitude: bool,
    pub slope: bool,
}

impl TemplateCheck {
    #[inline]
    pub fn passed(&self) -> bool {
        self.altitude && self.slope
    }
}

/// Outcome of checking one point against every template of a volume.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationOutcome {
    /// Indices of templates that accept the point.
    pub valid: Vec<usize>,
    pub rejected_altitude: usize,
    pub rejected_slope: usize,
}

#[inline]
fn remap(value: f32, in_min: f32, in_max: f32, out_min: f32, out_max: f32) -> f32 {
    out_min + (value - in_min) * (out_max - out_min) / (in_max - in_min)
}

/// Angle in degrees between the surface and flat ground: 0 for an upward
/// normal, 180 for a downward one.
pub fn surface_angle(normal: Vec3) -> f32 {
    let d = normal.dot(Vec3::Y).clamp(-1.0, 1.0);
    180.0 * remap(d, -1.0, 1.0, 1.0, 0.0)
}

/// Checks altitude and slope. Both jitter values are always drawn.
pub fn check_template(
    point: &PlacementPoint,
    template: &EntityTemplate,
    rng: &mut dyn RngCore,
) -> TemplateCheck {
    let altitude = point.position.y
        + range_f32(rng, -template.altitude_jitter, template.altitude_jitter);
    let in_altitude =
        altitude > template.altitude_range.x && altitude < template.altitude_range.y;

    let angle =
        surface_angle(point.normal) + range_f32(rng, -template.slope_jitter, template.slope_jitter);
    let in_slope = angle >= template.slope_range.x && angle < template.slope_range.y;

    TemplateCheck {
        altitude: in_altitude,
        slope: in_slope,
    }
}

/// Checks the point against every template, counting each failing criterion.
pub fn valid_templates(
    point: &PlacementPoint,
    templates: &[EntityTemplate],
    rng: &mut dyn RngCore,
) -> ValidationOutcome {
    let mut outcome = ValidationOutcome::default();
    for (index, template) in templates.iter().enumerate() {
        let check = check_template(point, template, rng);
        if !check.altitude {
            outcome.rejected_altitude += 1;
        }
        if !check.slope {
            outcome.rejected_slope += 1;
        }
        if check.passed() {
            outcome.valid.push(index);
        }
    }
    outcome
}

/// Returns true if the point's height lies inside the volume's own bounds.
pub fn within_volume_height(point: &PlacementPoint, volume_position: Vec3, bounds: &Bounds) -> bool {
    bounds.contains_vertical(point.position.y - volume_position.y)
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::random::tests::FixedRng;

    fn point_at(y: f32, normal: Vec3) -> PlacementPoint {
        PlacementPoint::new(Vec3::new(0.0, y, 0.0), normal, 1.0)
    }

    #[test]
    fn surface_angle_spans_zero_to_180() {
        assert_eq!(surface_angle(Vec3::Y), 0.0);
        assert_eq!(surface_angle(Vec3::NEG_Y), 180.0);
        assert!((surface_angle(Vec3::X) - 90.0).abs() < 1e-4);
        // Linear in the cosine, not in the true angle.
        let diagonal = surface_angle(Vec3::new(1.0, 1.0, 0.0).normalize());
        assert!((diagonal - 90.0 * (1.0 - std::f32::consts::FRAC_1_SQRT_2)).abs() < 1e-3);
    }

    #[test]
    fn altitude_max_is_exclusive() {
        let template = EntityTemplate::new("a").with_altitude_range(0.0, 10.0);
        let mut rng = StdRng::seed_from_u64(0);

        assert!(!check_template(&point_at(10.0, Vec3::Y), &template, &mut rng).altitude);
        assert!(check_template(&point_at(9.999, Vec3::Y), &template, &mut rng).altitude);
        assert!(!check_template(&point_at(0.0, Vec3::Y), &template, &mut rng).altitude);
    }

    #[test]
    fn slope_min_is_inclusive() {
        let mut rng = StdRng::seed_from_u64(0);
        let includes_flat = EntityTemplate::new("a").with_slope_range(0.0, 30.0);
        let excludes_flat = EntityTemplate::new("a").with_slope_range(5.0, 30.0);

        assert!(check_template(&point_at(0.0, Vec3::Y), &includes_flat, &mut rng).slope);
        assert!(!check_template(&point_at(0.0, Vec3::Y), &excludes_flat, &mut rng).slope);
    }

    #[test]
    fn jitter_shifts_altitude() {
        let template = EntityTemplate::new("a")
            .with_altitude_range(0.0, 10.0)
            .with_altitude_jitter(2.0);
        // rand01 == 0 draws the lowest jitter, -2.
        let mut low = FixedRng { value: 0 };
        assert!(check_template(&point_at(11.0, Vec3::Y), &template, &mut low).altitude);
        let mut low = FixedRng { value: 0 };
        assert!(!check_template(&point_at(1.5, Vec3::Y), &template, &mut low).altitude);
    }

    #[test]
    fn both_failures_are_counted_without_short_circuit() {
        let templates = vec![
            EntityTemplate::new("high").with_altitude_range(100.0, 200.0),
            EntityTemplate::new("flat_only")
                .with_altitude_range(100.0, 200.0)
                .with_slope_range(10.0, 20.0),
            EntityTemplate::new("ok"),
        ];
        let mut rng = StdRng::seed_from_u64(0);
        let outcome = valid_templates(&point_at(0.0, Vec3::Y), &templates, &mut rng);

        assert_eq!(outcome.valid, vec![2]);
        assert_eq!(outcome.rejected_altitude, 2);
        assert_eq!(outcome.rejected_slope, 1);
    }

    #[test]
    fn every_template_draws_two_values() {
        let templates = vec![EntityTemplate::new("a"), EntityTemplate::new("b")];
        let mut rng = StdRng::seed_from_u64(11);
        valid_templates(&point_at(0.0, Vec3::Y), &templates, &mut rng);

        let mut expected = StdRng::seed_from_u64(11);
        for _ in 0..4 {
            expected.next_u32();
        }
        assert_eq!(rng.next_u32(), expected.next_u32());
    }

    #[test]
    fn volume_height_is_relative_to_position() {
        let bounds = Bounds::new(Vec3::splat(10.0));
        let p = point_at(104.0, Vec3::Y);
        assert!(within_volume_height(&p, Vec3::new(0.0, 100.0, 0.0), &bounds));
        assert!(!within_volume_height(&p, Vec3::ZERO, &bounds));
    }
}
