//! Noise-based thinning of candidate points before any ground query is issued.
use glam::{Vec2, Vec3};
use rand::RngCore;

use crate::noise::NoiseField;
use crate::random::rand01;
use crate::scatter::point::ProceduralPoint;

/// Per-run random offsets are drawn from `[0, NOISE_OFFSET_RANGE]` on each axis.
pub const NOISE_OFFSET_RANGE: f32 = 2000.0;

/// Draws the per-run noise offset so repeated volumes do not alias.
pub fn random_noise_offset(rng: &mut dyn RngCore) -> Vec2 {
    let x = rand01(rng);
    let y = rand01(rng);
    Vec2::new(x, y) * NOISE_OFFSET_RANGE
}

/// Accepts or rejects candidates by sampling a [`NoiseField`].
pub struct ThresholdFilter<'a, N: NoiseField + ?Sized> {
    noise: &'a N,
    offset: Vec2,
    world_offset: Vec3,
}

impl<'a, N: NoiseField + ?Sized> ThresholdFilter<'a, N> {
    pub fn new(noise: &'a N, offset: Vec2, world_offset: Vec3) -> Self {
        Self {
            noise,
            offset,
            world_offset,
        }
    }

    /// Returns the accepted noise value. Missing samples and samples outside
    /// [0, 1] reject the candidate.
    pub fn sample(&self, point: &ProceduralPoint) -> Option<f32> {
        self.noise
            .sample(point.position + self.offset, self.world_offset)
            .filter(|v| v.is_finite() && (0.0..=1.0).contains(v))
    }

    /// Keeps accepted candidates paired with their noise value.
    pub fn filter(&self, points: &[ProceduralPoint]) -> Vec<(ProceduralPoint, f32)> {
        points
            .iter()
            .filter_map(|p| self.sample(p).map(|v| (*p, v)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noise::FnNoise;
    use crate::random::tests::FixedRng;

    #[test]
    fn offset_spans_configured_range() {
        let mut rng = FixedRng {
            value: u32::MAX / 2,
        };
        let offset = random_noise_offset(&mut rng);
        assert!((offset.x - 1000.0).abs() < 0.1);
        assert_eq!(offset.x, offset.y);
    }

    #[test]
    fn rejects_none_and_non_finite_values() {
        let noise = FnNoise::new(|p: Vec2, _| {
            if p.x < 10.0 {
                None
            } else if p.x < 20.0 {
                Some(f32::NAN)
            } else {
                Some(0.25)
            }
        });
        let filter = ThresholdFilter::new(&noise, Vec2::ZERO, Vec3::ZERO);
        let points = [
            ProceduralPoint::new(5.0, 0.0),
            ProceduralPoint::new(15.0, 0.0),
            ProceduralPoint::new(25.0, 0.0),
        ];
        let kept = filter.filter(&points);
        assert_eq!(kept, vec![(points[2], 0.25)]);
    }

    #[test]
    fn rejects_values_outside_unit_interval() {
        let noise = FnNoise::new(|p: Vec2, _| match p.x as i32 {
            0 => Some(-0.5),
            1 => Some(1.7),
            2 => Some(0.0),
            _ => Some(1.0),
        });
        let filter = ThresholdFilter::new(&noise, Vec2::ZERO, Vec3::ZERO);
        let points = [
            ProceduralPoint::new(0.0, 0.0),
            ProceduralPoint::new(1.0, 0.0),
            ProceduralPoint::new(2.0, 0.0),
            ProceduralPoint::new(3.0, 0.0),
        ];
        let kept = filter.filter(&points);
        assert_eq!(kept, vec![(points[2], 0.0), (points[3], 1.0)]);
    }

    #[test]
    fn samples_at_offset_position() {
        let noise = FnNoise::new(|p: Vec2, world: Vec3| {
            assert_eq!(world, Vec3::new(1.0, 2.0, 3.0));
            Some(p.x / 100.0)
        });
        let filter = ThresholdFilter::new(&noise, Vec2::new(40.0, 0.0), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(filter.sample(&ProceduralPoint::new(10.0, 0.0)), Some(0.5));
    }
}
