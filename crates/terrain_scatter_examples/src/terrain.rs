use glam::Vec2;
use terrain_scatter::prelude::*;

/// Parameters of the procedural hills used by the examples.
#[derive(Clone, Copy, Debug)]
pub struct TerrainConfig {
    /// Side length in world units; the terrain is centered on the origin.
    pub extent: f32,
    pub cell_size: f32,
    pub amplitude: f32,
    /// Seed of the height noise.
    pub seed: u32,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            extent: 120.0,
            cell_size: 1.0,
            amplitude: 18.0,
            seed: 11,
        }
    }
}

/// Builds a heightfield from fractal noise, with a flat lake bed below zero.
pub fn hills(config: TerrainConfig) -> Result<Heightfield> {
    let noise = NoiseSettings::new(NoiseAlgorithm::Perlin)
        .with_frequency(0.02)
        .with_octaves(4)
        .with_seed(config.seed)
        .build();
    let nodes = (config.extent / config.cell_size).ceil() as usize + 1;
    let origin = Vec2::splat(-config.extent * 0.5);

    Heightfield::from_fn(origin, config.cell_size, nodes, nodes, |p| {
        let h = (noise.value(p) - 0.45) * 2.0 * config.amplitude;
        h.max(-2.0)
    })
}

/// Prints the counters of a finished run.
pub fn print_stats(label: &str, stats: &DebugStats) {
    println!(
        "{label}: generated {}, spawned {} ({}%), rejected altitude {} / slope {} / height {} / proximity {}",
        stats.points_generated,
        stats.objects_spawned,
        stats.used_percentage,
        stats.rejected_altitude,
        stats.rejected_slope,
        stats.rejected_height,
        stats.rejected_proximity,
    );
    for warning in &stats.warnings {
        println!("  warning: {warning}");
    }
}
