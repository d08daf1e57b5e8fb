//! Coordination of several volumes sharing one region.
use glam::Vec3;
use tracing::{info, warn};

use crate::bounds::Bounds;
use crate::instancing::{Instantiator, ParentId};
use crate::scatter::events::{EventSink, PlacementEvent, PlacementEventKind};
use crate::scatter::point::PlacementPoint;
use crate::scatter::volume::Volume;
use crate::spatial::SpatialQuery;

/// A group of volumes placed together over the same bounds.
///
/// Before every run each member receives the biome's bounds and position and a
/// seed of `seed + index`, so members produce distinct yet reproducible
/// layouts.
#[derive(Debug)]
pub struct Biome {
    pub id: ParentId,
    pub position: Vec3,
    pub bounds: Bounds,
    pub seed: i64,
    volumes: Vec<Volume>,
}

impl Biome {
    pub fn new(id: impl Into<ParentId>) -> Self {
        Self {
            id: id.into(),
            position: Vec3::ZERO,
            bounds: Bounds::default(),
            seed: 0,
            volumes: Vec::new(),
        }
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn with_bounds(mut self, bounds: Bounds) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn with_seed(mut self, seed: i64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_volumes(mut self, volumes: impl IntoIterator<Item = Volume>) -> Self {
        self.find_volumes(volumes);
        self
    }

    /// Replaces the member volumes and pushes the biome settings onto them.
    pub fn find_volumes(&mut self, volumes: impl IntoIterator<Item = Volume>) {
        self.volumes = volumes.into_iter().collect();
        self.update_volume_settings();
    }

    /// Copies bounds and position to every member and assigns `seed + index`.
    pub fn update_volume_settings(&mut self) {
        for (i, volume) in self.volumes.iter_mut().enumerate() {
            volume.bounds = self.bounds;
            volume.seed = self.seed.wrapping_add(i as i64);
            volume.position = self.position;
        }
    }

    pub fn has_volumes(&self) -> bool {
        !self.volumes.is_empty()
    }

    pub fn volumes(&self) -> &[Volume] {
        &self.volumes
    }

    pub fn volumes_mut(&mut self) -> &mut [Volume] {
        &mut self.volumes
    }

    /// Places every member in order. Always returns `None`; per-member results
    /// are available through [`Volume::stats`].
    pub fn place(
        &mut self,
        world: &dyn SpatialQuery,
        spawner: &mut dyn Instantiator,
    ) -> Option<Vec<PlacementPoint>> {
        self.place_with_events(world, spawner, &mut ())
    }

    pub fn place_with_events(
        &mut self,
        world: &dyn SpatialQuery,
        spawner: &mut dyn Instantiator,
        sink: &mut dyn EventSink,
    ) -> Option<Vec<PlacementPoint>> {
        if !self.has_volumes() {
            warn!("Biome '{}' has no volumes; skipping.", self.id);
            if sink.wants(PlacementEventKind::Warning) {
                sink.send(PlacementEvent::Warning {
                    context: format!("biome:{}", self.id),
                    message: "Biome has no volumes; skipping".into(),
                });
            }
            return None;
        }

        self.update_volume_settings();
        for volume in &mut self.volumes {
            volume.place_with_events(world, spawner, false, sink);
        }

        let spawned: usize = self.volumes.iter().map(|v| v.spawned().len()).sum();
        info!(
            "Biome '{}': {} volumes, {} objects spawned.",
            self.id,
            self.volumes.len(),
            spawned
        );
        None
    }

    /// Resets every member volume.
    pub fn reset_placed(&mut self, spawner: &mut dyn Instantiator) {
        for volume in &mut self.volumes {
            volume.reset_placed(spawner);
        }
    }
}
