use glam::{Vec2, Vec3};
use rand::rngs::StdRng;
use rand::SeedableRng;
use terrain_scatter::prelude::*;
use terrain_scatter_examples::{render_to_png, RenderConfig};

fn main() -> anyhow::Result<()> {
    let extent = 60.0;
    let ground = Heightfield::flat(Vec2::ZERO, Vec2::splat(extent), 0.0)?;
    let bounds = Bounds::new(Vec3::new(extent, 10.0, extent)).with_origin(BoundsOrigin::Corner);

    let samplers: [(&str, SamplerSettings); 3] = [
        ("poisson", PoissonDiskSampling::new(2.0).into()),
        (
            "poisson-modulated",
            PoissonDiskSampling::new(2.0)
                .with_radius_modulation(RadiusModulation::new(
                    NoiseSettings::default().with_frequency(0.05),
                    0.6,
                ))
                .into(),
        ),
        ("grid", GridSampling::new(2.0).into()),
    ];

    for (name, sampler) in samplers {
        let mut rng = StdRng::seed_from_u64(5);
        let raw = sampler.generate(&bounds, &mut rng);
        println!("{name}: {} raw points", raw.len());

        let mut volume = Volume::new(name)
            .with_seed(5)
            .with_bounds(bounds)
            .with_sampler(sampler)
            .with_threshold_noise(NoiseSettings::constant(1.0))
            .with_template(EntityTemplate::new("marker"));
        let mut spawner = VecInstantiator::new();
        let points = volume
            .place(&ground, &mut spawner, true)
            .unwrap_or_default();

        let config = RenderConfig::new((600, 600), Vec2::ZERO, Vec2::splat(extent));
        render_to_png(&ground, &[], &points, &config, format!("samplers-{name}.png"))?;
    }
    Ok(())
}
