//! Placement pipeline: threshold filtering, ground projection, template
//! validation and transform composition, driven by volumes and biomes. Every
//! driver, including the ground-snapping [`raycast_placer::RaycastPlacer`],
//! implements [`placer::Placer`].
pub mod biome;
#[cfg(feature = "serde")]
pub mod config;
pub mod events;
pub mod ground;
pub mod placer;
pub mod point;
pub mod raycast_placer;
pub mod stats;
pub mod template;
pub mod threshold;
pub mod transform;
pub mod validator;
pub mod volume;
