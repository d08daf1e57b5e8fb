use glam::{Vec2, Vec3};
use terrain_scatter::prelude::*;
use terrain_scatter_examples::{hills, print_stats, render_to_png, MarkerStyle, RenderConfig, TerrainConfig};

fn layer(id: &str, radius: f32, template: EntityTemplate) -> Volume {
    Volume::new(id)
        .with_sampler(PoissonDiskSampling::new(radius))
        .with_threshold_noise(
            NoiseSettings::new(NoiseAlgorithm::Perlin)
                .with_frequency(0.04)
                .with_octaves(2)
                .with_range(0.2, 1.0),
        )
        .with_template(template)
}

fn main() -> anyhow::Result<()> {
    let terrain = TerrainConfig {
        seed: 3,
        ..Default::default()
    };
    let ground = hills(terrain)?;

    let mut biome = Biome::new("forest")
        .with_seed(77)
        .with_bounds(Bounds::new(Vec3::new(100.0, 60.0, 100.0)))
        .with_volumes([
            layer(
                "forest/canopy",
                6.0,
                EntityTemplate::new("oak")
                    .with_scale_range(1.0, 1.8)
                    .with_slope_range(0.0, 25.0)
                    .with_slope_align(0.0),
            ),
            layer(
                "forest/understory",
                2.0,
                EntityTemplate::new("fern")
                    .with_scale_range(0.4, 0.9)
                    .with_slope_range(0.0, 40.0),
            ),
            layer(
                "forest/boulders",
                8.0,
                EntityTemplate::new("boulder")
                    .with_scale_range(0.8, 2.5)
                    .with_random_rotation(true, true)
                    .with_surface_offset(-0.3),
            ),
        ]);

    let mut warnings = 0usize;
    let mut sink = FnSink::new(|event| {
        if let PlacementEvent::Warning { context, message } = event {
            println!("[{context}] {message}");
            warnings += 1;
        }
    });

    let mut spawner = VecInstantiator::new();
    biome.place_with_events(&ground, &mut spawner, &mut sink);
    println!("{warnings} warnings");

    for volume in biome.volumes() {
        print_stats(&volume.id, volume.stats());
    }

    let mut config = RenderConfig::new(
        (900, 900),
        Vec2::splat(-terrain.extent * 0.5),
        Vec2::splat(terrain.extent),
    )
    .with_height_range(-terrain.amplitude, terrain.amplitude)
    .with_water_level(-2.0);
    config
        .set_style(
            "oak",
            MarkerStyle {
                color: [30, 80, 30],
                radius: 7.0,
            },
        )
        .set_style(
            "fern",
            MarkerStyle {
                color: [90, 170, 60],
                radius: 2.0,
            },
        )
        .set_style(
            "boulder",
            MarkerStyle {
                color: [110, 105, 100],
                radius: 4.0,
            },
        );

    render_to_png(
        &ground,
        spawner.instances(),
        &[],
        &config,
        "biome-forest-layers.png",
    )
}
