#![allow(dead_code)]
use std::time::Duration;

use criterion::{Criterion, Throughput};
use glam::Vec2;
use terrain_scatter::spatial::Heightfield;

pub const SAMPLE_SIZE: usize = 20;
pub const WARM_UP: Duration = Duration::from_secs(1);
pub const MEASUREMENT_TIME: Duration = Duration::from_secs(2);

pub fn default_criterion() -> Criterion {
    Criterion::default()
        .configure_from_args()
        .sample_size(SAMPLE_SIZE)
        .warm_up_time(WARM_UP)
        .measurement_time(MEASUREMENT_TIME)
}

pub fn elements_throughput(elements: usize) -> Throughput {
    Throughput::Elements(elements.max(1) as u64)
}

/// Rolling hills centered on the origin, `extent` units across.
pub fn rolling_hills(extent: f32) -> Heightfield {
    let nodes = extent as usize + 1;
    let origin = Vec2::splat(-extent * 0.5);
    Heightfield::from_fn(origin, 1.0, nodes, nodes, |p| {
        4.0 * (p.x * 0.05).sin() * (p.y * 0.07).cos() + 0.02 * p.x
    })
    .expect("valid heightfield")
}
