//! Common interface of volumes, biomes and snapping placers.
//!
//! Hosts that keep heterogeneous placers in one list drive them through
//! [`Placer`] without knowing which kind each one is.
use crate::instancing::Instantiator;
use crate::scatter::biome::Biome;
use crate::scatter::events::EventSink;
use crate::scatter::point::PlacementPoint;
use crate::scatter::volume::Volume;
use crate::spatial::SpatialQuery;

/// Something that places instances into a world and can undo it.
pub trait Placer {
    /// Parent id instances are placed under.
    fn id(&self) -> &str;

    /// Runs a full placement and reports progress to `sink`.
    ///
    /// Returns the points placed onto, or `None` if the run was skipped.
    fn run_placement(
        &mut self,
        world: &dyn SpatialQuery,
        spawner: &mut dyn Instantiator,
        sink: &mut dyn EventSink,
    ) -> Option<Vec<PlacementPoint>>;

    /// Undoes what the placer did. Calling it twice is the same as calling it once.
    fn reset_placed(&mut self, spawner: &mut dyn Instantiator);
}

impl Placer for Volume {
    fn id(&self) -> &str {
        &self.id
    }

    fn run_placement(
        &mut self,
        world: &dyn SpatialQuery,
        spawner: &mut dyn Instantiator,
        sink: &mut dyn EventSink,
    ) -> Option<Vec<PlacementPoint>> {
        self.place_with_events(world, spawner, false, sink)
    }

    fn reset_placed(&mut self, spawner: &mut dyn Instantiator) {
        Volume::reset_placed(self, spawner);
    }
}

impl Placer for Biome {
    fn id(&self) -> &str {
        &self.id
    }

    fn run_placement(
        &mut self,
        world: &dyn SpatialQuery,
        spawner: &mut dyn Instantiator,
        sink: &mut dyn EventSink,
    ) -> Option<Vec<PlacementPoint>> {
        self.place_with_events(world, spawner, sink)
    }

    fn reset_placed(&mut self, spawner: &mut dyn Instantiator) {
        Biome::reset_placed(self, spawner);
    }
}

/// Runs every placer in order, returning how many produced points.
pub fn run_all(
    placers: &mut [&mut dyn Placer],
    world: &dyn SpatialQuery,
    spawner: &mut dyn Instantiator,
    sink: &mut dyn EventSink,
) -> usize {
    let mut produced = 0;
    for placer in placers.iter_mut() {
        if placer.run_placement(world, spawner, sink).is_some() {
            produced += 1;
        }
    }
    produced
}

#[cfg(test)]
mod tests {
    use glam::{Quat, Vec2, Vec3};

    use super::*;
    use crate::instancing::{InstanceTransform, VecInstantiator};
    use crate::noise::NoiseSettings;
    use crate::sampling::GridSampling;
    use crate::scatter::events::{PlacementEventKind, VecSink};
    use crate::scatter::raycast_placer::RaycastPlacer;
    use crate::scatter::template::EntityTemplate;
    use crate::spatial::Heightfield;

    fn ground() -> Heightfield {
        Heightfield::flat(Vec2::splat(-20.0), Vec2::splat(40.0), 2.0).unwrap()
    }

    fn volume(id: &str) -> Volume {
        Volume::new(id)
            .with_sampler(GridSampling::new(4.0))
            .with_threshold_noise(NoiseSettings::constant(1.0))
            .with_template(EntityTemplate::new("bush"))
    }

    #[test]
    fn placers_run_and_reset_through_one_interface() {
        let world = ground();
        let mut spawner = VecInstantiator::new();
        spawner
            .spawn(
                "post",
                &InstanceTransform::new(Vec3::new(1.0, 30.0, 1.0), Quat::IDENTITY, Vec3::ONE),
                "fence",
            )
            .unwrap();

        let mut single = volume("single");
        let mut biome = Biome::new("grove").with_volumes([volume("grove/a")]);
        let mut fence = RaycastPlacer::new("fence");
        let mut sink = VecSink::only([PlacementEventKind::RunFinished]);

        let mut placers: [&mut dyn Placer; 3] = [&mut single, &mut biome, &mut fence];
        assert_eq!(placers[1].id(), "grove");

        // Biomes report through their member volumes and return no points.
        let produced = run_all(&mut placers, &world, &mut spawner, &mut sink);
        assert_eq!(produced, 2);
        assert_eq!(sink.count(PlacementEventKind::RunFinished), 2);
        assert!(spawner.children_of("single").count() > 0);
        assert!(spawner.children_of("grove/a").count() > 0);
        assert_eq!(spawner.child_transforms("fence")[0].1.position.y, 2.0);

        for placer in placers.iter_mut() {
            placer.reset_placed(&mut spawner);
            placer.reset_placed(&mut spawner);
        }
        assert_eq!(spawner.len(), 1);
        assert_eq!(spawner.child_transforms("fence")[0].1.position.y, 30.0);
    }
}
