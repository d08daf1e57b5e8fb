//! Regular lattice sampling strategy.
use glam::Vec2;
use rand::RngCore;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::bounds::Bounds;
use crate::error::{Error, Result};
use crate::sampling::{PointSampling, ProceduralPoint};

/// Largest lattice a single generation may produce.
pub const MAX_GRID_POINTS: usize = 1 << 22;

/// Number of lattice nodes along one axis, or `None` past [`MAX_GRID_POINTS`].
fn nodes_along(extent: f32, cell_size: f32) -> Option<usize> {
    let steps = (extent as f64 / cell_size as f64).floor();
    if !steps.is_finite() || steps >= MAX_GRID_POINTS as f64 {
        return None;
    }
    (steps as usize).checked_add(1)
}

/// Grid sampling: one point on every lattice node `(i * cell_size, j * cell_size)`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct GridSampling {
    /// Lattice spacing in world units.
    pub cell_size: f32,
}

impl Default for GridSampling {
    fn default() -> Self {
        Self { cell_size: 1.0 }
    }
}

impl GridSampling {
    pub fn new(cell_size: f32) -> Self {
        Self { cell_size }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.cell_size.is_finite() || self.cell_size <= 0.0 {
            return Err(Error::InvalidConfig("grid cell_size must be > 0".into()));
        }
        Ok(())
    }

    /// Lattice node count over `bounds`, or `None` if the settings are invalid
    /// or the lattice would exceed [`MAX_GRID_POINTS`].
    pub fn point_count(&self, bounds: &Bounds) -> Option<usize> {
        self.lattice(bounds.lateral_extent()).map(|(cols, rows)| cols * rows)
    }

    fn lattice(&self, extent: Vec2) -> Option<(usize, usize)> {
        self.validate().ok()?;
        let cols = nodes_along(extent.x, self.cell_size)?;
        let rows = nodes_along(extent.y, self.cell_size)?;
        cols.checked_mul(rows)
            .filter(|n| *n <= MAX_GRID_POINTS)
            .map(|_| (cols, rows))
    }
}

impl PointSampling for GridSampling {
    fn generate(&self, bounds: &Bounds, _rng: &mut dyn RngCore) -> Vec<ProceduralPoint> {
        let extent = bounds.lateral_extent();
        if self.validate().is_err() || extent.x <= 0.0 || extent.y <= 0.0 {
            return Vec::new();
        }

        let c = self.cell_size;
        let Some((cols, rows)) = self.lattice(extent) else {
            warn!(
                "Grid cell_size {} is too small for a {}x{} extent; no points generated.",
                c, extent.x, extent.y
            );
            return Vec::new();
        };

        let mut points = Vec::with_capacity(cols * rows);
        for j in 0..rows {
            let z = j as f32 * c;
            if z > extent.y {
                break;
            }
            for i in 0..cols {
                let x = i as f32 * c;
                if x > extent.x {
                    break;
                }
                points.push(ProceduralPoint::from(Vec2::new(x, z)));
            }
        }
        points
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn points_lie_on_multiples_of_cell_size() {
        let bounds = Bounds::new(Vec3::new(10.0, 5.0, 7.5));
        let mut rng = StdRng::seed_from_u64(0);
        let points = GridSampling::new(2.5).generate(&bounds, &mut rng);

        assert_eq!(points.len(), 5 * 4);
        for p in &points {
            let (ix, iz) = (p.position.x / 2.5, p.position.y / 2.5);
            assert_eq!(ix, ix.round());
            assert_eq!(iz, iz.round());
            assert!((0.0..=10.0).contains(&p.position.x));
            assert!((0.0..=7.5).contains(&p.position.y));
        }
    }

    #[test]
    fn output_does_not_depend_on_rng() {
        let bounds = Bounds::new(Vec3::new(6.0, 1.0, 6.0));
        let sampling = GridSampling::new(1.5);
        let a = sampling.generate(&bounds, &mut StdRng::seed_from_u64(1));
        let b = sampling.generate(&bounds, &mut StdRng::seed_from_u64(2));
        assert_eq!(a, b);
    }

    #[test]
    fn zero_cell_size_returns_no_points() {
        let bounds = Bounds::new(Vec3::splat(5.0));
        let mut rng = StdRng::seed_from_u64(0);
        assert!(GridSampling::new(0.0).generate(&bounds, &mut rng).is_empty());
        assert!(GridSampling::new(-1.0).generate(&bounds, &mut rng).is_empty());
    }

    #[test]
    fn oversized_lattice_returns_no_points() {
        let bounds = Bounds::new(Vec3::splat(20.0));
        let mut rng = StdRng::seed_from_u64(0);
        for cell_size in [f32::MIN_POSITIVE, 1e-6, 0.005] {
            let sampling = GridSampling::new(cell_size);
            assert!(sampling.validate().is_ok());
            assert_eq!(sampling.point_count(&bounds), None);
            assert!(sampling.generate(&bounds, &mut rng).is_empty());
        }
        assert_eq!(GridSampling::new(0.01).point_count(&bounds), Some(2001 * 2001));
    }

    #[test]
    fn point_count_matches_generated_points() {
        let bounds = Bounds::new(Vec3::new(10.0, 5.0, 7.5));
        let mut rng = StdRng::seed_from_u64(0);
        let sampling = GridSampling::new(2.5);
        assert_eq!(
            sampling.point_count(&bounds),
            Some(sampling.generate(&bounds, &mut rng).len())
        );
    }

    #[test]
    fn flat_bounds_return_no_points() {
        let bounds = Bounds::new(Vec3::new(0.0, 5.0, 5.0));
        let mut rng = StdRng::seed_from_u64(0);
        assert!(GridSampling::new(1.0).generate(&bounds, &mut rng).is_empty());
    }
}
