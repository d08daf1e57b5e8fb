#![forbid(unsafe_code)]
//! terrain_scatter: Deterministic scattering of object templates over terrain.
//!
//! Modules:
//! - sampling: candidate generation in the lateral plane (Poisson disk, grid)
//! - noise: threshold noise fields
//! - spatial: raycast/overlap boundary and a heightfield reference world
//! - instancing: instantiation boundary and an in-memory instantiator
//! - scatter: threshold filter, ground projection, validation, transforms, volumes, biomes,
//!   placers, events
//!
//! For examples, see the README and the `terrain_scatter_examples` crate.
pub mod bounds;
pub mod error;
pub mod instancing;
pub mod noise;
pub mod random;
pub mod sampling;
pub mod scatter;
pub mod spatial;

/// Convenient re-exports for common types. Import with `use terrain_scatter::prelude::*;`.
pub mod prelude {
    pub use crate::bounds::{Bounds, BoundsOrigin};
    pub use crate::error::{Error, Result};
    pub use crate::instancing::{
        InstanceHandle, InstanceTransform, Instantiator, ParentId, SpawnedInstance, TemplateRef,
        VecInstantiator,
    };
    pub use crate::noise::{
        FnNoise, NoiseAlgorithm, NoiseField, NoiseSettings, NoiseSpace, SharedNoiseField,
    };
    pub use crate::random::{rand01, range_f32, range_index, rng_for_seed};
    pub use crate::sampling::{
        GridSampling, PoissonDiskSampling, PointSampling, ProceduralPoint, RadiusModulation,
        SamplerSettings,
    };
    pub use crate::scatter::biome::Biome;
    #[cfg(feature = "serde")]
    pub use crate::scatter::config::{BiomeConfig, VolumeConfig};
    pub use crate::scatter::events::{
        EventSink, FnSink, MultiSink, PlacementEvent, PlacementEventKind, RejectionReason,
        VecSink,
    };
    pub use crate::scatter::placer::{run_all, Placer};
    pub use crate::scatter::point::PlacementPoint;
    pub use crate::scatter::raycast_placer::RaycastPlacer;
    pub use crate::scatter::stats::DebugStats;
    pub use crate::scatter::template::EntityTemplate;
    pub use crate::scatter::volume::{CancelHandle, Volume, VolumeState};
    pub use crate::spatial::{GroundHit, Heightfield, LayerMask, SpatialQuery, SphereCollider};
}
