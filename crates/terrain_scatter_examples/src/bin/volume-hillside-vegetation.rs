use glam::{Vec2, Vec3};
use terrain_scatter::prelude::*;
use terrain_scatter_examples::{hills, print_stats, render_to_png, MarkerStyle, RenderConfig, TerrainConfig};

fn main() -> anyhow::Result<()> {
    let terrain = TerrainConfig::default();
    let ground = hills(terrain)?;

    let mut volume = Volume::new("hillside")
        .with_seed(2024)
        .with_bounds(Bounds::new(Vec3::new(110.0, 60.0, 110.0)))
        .with_sampler(PoissonDiskSampling::new(2.5))
        .with_threshold_noise(
            NoiseSettings::new(NoiseAlgorithm::Simplex)
                .with_frequency(0.03)
                .with_range(0.3, 1.0),
        )
        .with_template(
            EntityTemplate::new("pine")
                .with_scale_range(0.8, 1.6)
                .with_altitude_range(2.0, 30.0)
                .with_altitude_jitter(2.0)
                .with_slope_range(0.0, 30.0)
                .with_slope_jitter(4.0)
                .with_slope_align(0.15)
                .with_multi_sample_align(Vec3::new(2.0, 8.0, 2.0)),
        )
        .with_template(
            EntityTemplate::new("grass")
                .with_scale_range(0.5, 1.0)
                .with_altitude_range(-1.5, 12.0)
                .with_slope_range(0.0, 45.0),
        )
        .with_template(
            EntityTemplate::new("rock")
                .with_scale_range(0.6, 2.0)
                .with_surface_offset(-0.2)
                .with_slope_range(25.0, 90.0)
                .with_random_rotation(true, true),
        );

    let mut spawner = VecInstantiator::new();
    let points = volume
        .place(&ground, &mut spawner, false)
        .unwrap_or_default();
    print_stats("hillside", volume.stats());

    let mut config = RenderConfig::new(
        (900, 900),
        Vec2::splat(-terrain.extent * 0.5),
        Vec2::splat(terrain.extent),
    )
    .with_height_range(-terrain.amplitude, terrain.amplitude)
    .with_water_level(-2.0);
    config
        .set_style(
            "pine",
            MarkerStyle {
                color: [20, 90, 40],
                radius: 5.0,
            },
        )
        .set_style(
            "grass",
            MarkerStyle {
                color: [120, 200, 70],
                radius: 2.0,
            },
        )
        .set_style(
            "rock",
            MarkerStyle {
                color: [130, 120, 115],
                radius: 4.0,
            },
        );

    render_to_png(
        &ground,
        spawner.instances(),
        &points,
        &config,
        "volume-hillside-vegetation.png",
    )
}
