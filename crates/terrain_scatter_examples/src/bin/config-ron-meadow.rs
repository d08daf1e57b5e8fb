use glam::Vec2;
use terrain_scatter::prelude::*;
use terrain_scatter_examples::{hills, print_stats, render_to_png, MarkerStyle, RenderConfig, TerrainConfig};

fn main() -> anyhow::Result<()> {
    let path = format!("{}/assets/meadow.ron", env!("CARGO_MANIFEST_DIR"));
    let text = std::fs::read_to_string(&path)?;
    let mut volume = VolumeConfig::from_ron_str(&text)?.into_volume()?;

    let terrain = TerrainConfig {
        amplitude: 10.0,
        ..Default::default()
    };
    let ground = hills(terrain)?;

    let mut sink = VecSink::only([PlacementEventKind::PointRejected]);
    let mut spawner = VecInstantiator::new();
    volume.place_with_events(&ground, &mut spawner, false, &mut sink);
    print_stats(&volume.id, volume.stats());

    let no_template = sink
        .as_slice()
        .iter()
        .filter(|e| {
            matches!(
                e,
                PlacementEvent::PointRejected {
                    reason: RejectionReason::NoValidTemplate,
                    ..
                }
            )
        })
        .count();
    println!("{no_template} points matched no template");

    let mut config = RenderConfig::new(
        (800, 800),
        Vec2::splat(-terrain.extent * 0.5),
        Vec2::splat(terrain.extent),
    )
    .with_height_range(-terrain.amplitude, terrain.amplitude)
    .with_water_level(-2.0);
    config
        .set_style(
            "flower",
            MarkerStyle {
                color: [230, 200, 40],
                radius: 2.0,
            },
        )
        .set_style(
            "tall_grass",
            MarkerStyle {
                color: [80, 150, 50],
                radius: 2.0,
            },
        );

    render_to_png(
        &ground,
        spawner.instances(),
        &[],
        &config,
        "config-ron-meadow.png",
    )
}
