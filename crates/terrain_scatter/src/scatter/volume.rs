//! The volume orchestrator: one bounded region that samples, filters, grounds,
//! validates and spawns instances of its templates.
//!
//! A run is started with [`Volume::place`] or [`Volume::place_with_events`].
//! Every run first destroys what the previous run spawned, so a volume either
//! fully regenerates or, while a run is already in flight, does nothing.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use glam::Vec3;
use rand::rngs::StdRng;
use rand::RngCore;
use tracing::{debug, error, info, warn};

use crate::bounds::Bounds;
use crate::error::Error;
use crate::instancing::{InstanceHandle, Instantiator, ParentId};
use crate::noise::{NoiseField, NoiseSettings, SharedNoiseField};
use crate::random::rng_for_seed;
use crate::sampling::{PointSampling, SamplerSettings};
use crate::scatter::events::{EventSink, PlacementEvent, PlacementEventKind, RejectionReason};
use crate::scatter::ground::GroundProjector;
use crate::scatter::point::PlacementPoint;
use crate::scatter::stats::DebugStats;
use crate::scatter::template::EntityTemplate;
use crate::scatter::threshold::{random_noise_offset, ThresholdFilter};
use crate::scatter::transform::{select_template, Composition, TransformComposer};
use crate::scatter::validator::{valid_templates, within_volume_height};
use crate::spatial::{LayerMask, SpatialQuery};

/// Shared flag a host can raise from any thread to stop a run between points.
#[derive(Clone, Debug, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn clear(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Lifecycle of a volume.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VolumeState {
    #[default]
    Idle,
    /// A run is in flight; further runs are ignored.
    Spawning,
}

/// A bounded region scattering instances of its templates onto the ground.
///
/// Spawned instances are parented to the volume's `id`, so ids must be unique
/// per instantiator.
#[derive(Debug)]
pub struct Volume {
    pub id: ParentId,
    /// World position of the bounds' origin.
    pub position: Vec3,
    pub bounds: Bounds,
    pub seed: i64,
    /// Layers ground rays and multi-sample rays are filtered to.
    pub ground_mask: LayerMask,
    pub sampler: SamplerSettings,
    pub threshold_noise: NoiseSettings,
    /// Host-provided field used instead of `threshold_noise` when set.
    pub threshold_field: Option<SharedNoiseField>,
    pub templates: Vec<EntityTemplate>,
    state: VolumeState,
    stats: DebugStats,
    spawned: Vec<InstanceHandle>,
    cancel: CancelHandle,
}

impl Volume {
    pub fn new(id: impl Into<ParentId>) -> Self {
        Self {
            id: id.into(),
            position: Vec3::ZERO,
            bounds: Bounds::default(),
            seed: 0,
            ground_mask: LayerMask::ALL,
            sampler: SamplerSettings::default(),
            threshold_noise: NoiseSettings::default(),
            threshold_field: None,
            templates: Vec::new(),
            state: VolumeState::Idle,
            stats: DebugStats::default(),
            spawned: Vec::new(),
            cancel: CancelHandle::default(),
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

    pub fn with_ground_mask(mut self, mask: LayerMask) -> Self {
        self.ground_mask = mask;
        self
    }

    pub fn with_sampler(mut self, sampler: impl Into<SamplerSettings>) -> Self {
        self.sampler = sampler.into();
        self
    }

    pub fn with_threshold_noise(mut self, noise: NoiseSettings) -> Self {
        self.threshold_noise = noise;
        self
    }

    /// Thins candidates with a host field instead of the built-in noise.
    pub fn with_threshold_field(mut self, field: impl NoiseField + Send + Sync + 'static) -> Self {
        self.threshold_field = Some(SharedNoiseField::new(field));
        self
    }

    pub fn with_template(mut self, template: EntityTemplate) -> Self {
        self.templates.push(template);
        self
    }

    pub fn with_templates(mut self, templates: impl IntoIterator<Item = EntityTemplate>) -> Self {
        self.templates.extend(templates);
        self
    }

    pub fn state(&self) -> VolumeState {
        self.state
    }

    pub fn is_spawning(&self) -> bool {
        self.state == VolumeState::Spawning
    }

    /// Counters of the last (or current) run.
    pub fn stats(&self) -> &DebugStats {
        &self.stats
    }

    /// Handles spawned since the last reset.
    pub fn spawned(&self) -> &[InstanceHandle] {
        &self.spawned
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Runs the placement pipeline. See [`Volume::place_with_events`].
    pub fn place(
        &mut self,
        world: &dyn SpatialQuery,
        spawner: &mut dyn Instantiator,
        just_return_points: bool,
    ) -> Option<Vec<PlacementPoint>> {
        self.place_with_events(world, spawner, just_return_points, &mut ())
    }

    /// Runs the placement pipeline and reports progress to `sink`.
    ///
    /// Returns `None` without side effects if a run is already in flight or
    /// the volume has no templates. Otherwise returns the grounded points; with
    /// `just_return_points` nothing is spawned.
    pub fn place_with_events(
        &mut self,
        world: &dyn SpatialQuery,
        spawner: &mut dyn Instantiator,
        just_return_points: bool,
        sink: &mut dyn EventSink,
    ) -> Option<Vec<PlacementPoint>> {
        if self.is_spawning() {
            debug!("Volume '{}' is already spawning; ignoring place.", self.id);
            return None;
        }
        if self.templates.is_empty() {
            warn!("Volume '{}' has no templates; skipping.", self.id);
            if sink.wants(PlacementEventKind::Warning) {
                sink.send(PlacementEvent::Warning {
                    context: format!("volume:{}", self.id),
                    message: "Volume has no templates; skipping".into(),
                });
            }
            return None;
        }

        let mut rng = self.begin_spawn(spawner)?;

        if sink.wants(PlacementEventKind::RunStarted) {
            sink.send(PlacementEvent::RunStarted {
                volume: self.id.clone(),
                seed: self.seed,
                template_count: self.templates.len(),
            });
        }

        if let Err(e) = self.sampler.validate().and_then(|_| match self.threshold_field {
            Some(_) => Ok(()),
            None => self.threshold_noise.validate(),
        }) {
            warn!("Volume '{}': {}.", self.id, e);
            self.record_warning(sink, e.to_string());
            self.finish_run(sink, false);
            return Some(Vec::new());
        }

        let points = self.generate_points(world, &mut rng, sink);

        if just_return_points {
            self.finish_run(sink, false);
            return Some(points);
        }

        let mut cancelled = false;
        for point in &points {
            if self.cancel.is_cancelled() {
                cancelled = true;
                break;
            }
            self.spawn_point(point, world, spawner, &mut rng, sink);
        }

        self.finish_run(sink, cancelled);
        Some(points)
    }

    /// Enters [`VolumeState::Spawning`], resets stats, destroys the previous
    /// instances and returns the run's generator. `None` if already spawning.
    ///
    /// Hosts driving spawning themselves pair this with [`Volume::spawn_at`]
    /// and [`Volume::finish_spawn`].
    pub fn begin_spawn(&mut self, spawner: &mut dyn Instantiator) -> Option<StdRng> {
        if self.is_spawning() {
            return None;
        }
        self.state = VolumeState::Spawning;
        self.stats.reset();
        spawner.destroy_all_children_of(&self.id);
        self.spawned.clear();
        self.cancel.clear();
        Some(rng_for_seed(self.seed))
    }

    /// Validates, composes and spawns a single grounded point.
    pub fn spawn_at(
        &mut self,
        point: &PlacementPoint,
        world: &dyn SpatialQuery,
        spawner: &mut dyn Instantiator,
        rng: &mut dyn RngCore,
    ) -> Option<InstanceHandle> {
        self.spawn_point(point, world, spawner, rng, &mut ())
    }

    /// Finalizes stats and returns to [`VolumeState::Idle`].
    pub fn finish_spawn(&mut self) {
        self.stats.finalize();
        self.state = VolumeState::Idle;
    }

    /// Stops a run in flight. Already spawned instances are kept.
    pub fn terminate_active_generation(&mut self) {
        self.cancel.cancel();
        if self.is_spawning() {
            info!("Volume '{}': generation terminated.", self.id);
        }
        self.state = VolumeState::Idle;
    }

    /// Terminates any run and destroys every instance the volume spawned.
    /// Calling it twice is the same as calling it once.
    pub fn reset_placed(&mut self, spawner: &mut dyn Instantiator) {
        self.terminate_active_generation();
        spawner.destroy_all_children_of(&self.id);
        self.spawned.clear();
    }

    fn generate_points(
        &mut self,
        world: &dyn SpatialQuery,
        rng: &mut dyn RngCore,
        sink: &mut dyn EventSink,
    ) -> Vec<PlacementPoint> {
        let candidates = self.sampler.generate(&self.bounds, rng);
        self.stats.on_points_generated(candidates.len());
        debug!(
            "Volume '{}': sampled {} candidates.",
            self.id,
            candidates.len()
        );
        if sink.wants(PlacementEventKind::PointsGenerated) {
            sink.send(PlacementEvent::PointsGenerated {
                volume: self.id.clone(),
                count: candidates.len(),
            });
        }
        if candidates.is_empty() {
            warn!("Volume '{}' generated no points.", self.id);
            self.record_warning(sink, "Volume generated no points".into());
            return Vec::new();
        }

        let min_corner = self.bounds.min_corner(self.position);
        let offset = random_noise_offset(rng);
        let built;
        let noise: &dyn NoiseField = match &self.threshold_field {
            Some(field) => field,
            None => {
                built = self.threshold_noise.build();
                &built
            }
        };
        let accepted = ThresholdFilter::new(noise, offset, min_corner).filter(&candidates);

        let grounded =
            GroundProjector::new(world, &self.bounds, self.position, self.ground_mask)
                .project_all(&accepted);
        debug!(
            "Volume '{}': {} passed threshold, {} grounded.",
            self.id,
            accepted.len(),
            grounded.len()
        );
        if sink.wants(PlacementEventKind::PointsGrounded) {
            sink.send(PlacementEvent::PointsGrounded {
                volume: self.id.clone(),
                accepted: accepted.len(),
                grounded: grounded.len(),
            });
        }
        grounded
    }

    fn spawn_point(
        &mut self,
        point: &PlacementPoint,
        world: &dyn SpatialQuery,
        spawner: &mut dyn Instantiator,
        rng: &mut dyn RngCore,
        sink: &mut dyn EventSink,
    ) -> Option<InstanceHandle> {
        if !within_volume_height(point, self.position, &self.bounds) {
            self.stats.on_height_rejected();
            self.reject(sink, point, RejectionReason::Height);
            return None;
        }

        let outcome = valid_templates(point, &self.templates, rng);
        self.stats.absorb(&outcome);
        let Some(index) = select_template(&outcome.valid, rng) else {
            self.reject(sink, point, RejectionReason::NoValidTemplate);
            return None;
        };

        let template = &self.templates[index];
        let Some(template_ref) = template.template_ref().map(str::to_owned) else {
            self.fail(sink, Error::MissingTemplate { index });
            return None;
        };
        if !spawner.is_spawnable(&template_ref) {
            self.fail(sink, Error::NotSpawnable { id: template_ref });
            return None;
        }

        let composition = TransformComposer::new(world, self.ground_mask).compose(point, template, rng);
        let transform = match composition {
            Composition::Placed(transform) => transform,
            Composition::ProximityRejected => {
                self.stats.on_proximity_rejected();
                self.reject(sink, point, RejectionReason::Proximity);
                return None;
            }
        };

        match spawner.spawn(&template_ref, &transform, &self.id) {
            Ok(handle) => {
                self.spawned.push(handle);
                self.stats.on_spawned();
                if sink.wants(PlacementEventKind::InstanceSpawned) {
                    sink.send(PlacementEvent::InstanceSpawned {
                        volume: self.id.clone(),
                        template: template_ref,
                        handle,
                        transform,
                    });
                }
                Some(handle)
            }
            Err(e) => {
                self.fail(sink, e);
                None
            }
        }
    }

    fn finish_run(&mut self, sink: &mut dyn EventSink, cancelled: bool) {
        let before = self.stats.warnings.len();
        self.finish_spawn();
        if sink.wants(PlacementEventKind::Warning) {
            for message in &self.stats.warnings[before..] {
                sink.send(PlacementEvent::Warning {
                    context: format!("volume:{}", self.id),
                    message: message.clone(),
                });
            }
        }

        info!(
            "Volume '{}': {} points generated, {} objects spawned ({}%){}.",
            self.id,
            self.stats.points_generated,
            self.stats.objects_spawned,
            self.stats.used_percentage,
            if cancelled { ", cancelled" } else { "" }
        );
        if sink.wants(PlacementEventKind::RunFinished) {
            sink.send(PlacementEvent::RunFinished {
                volume: self.id.clone(),
                stats: self.stats.clone(),
                cancelled,
            });
        }
    }

    fn record_warning(&mut self, sink: &mut dyn EventSink, message: String) {
        if sink.wants(PlacementEventKind::Warning) {
            sink.send(PlacementEvent::Warning {
                context: format!("volume:{}", self.id),
                message: message.clone(),
            });
        }
        self.stats.push_warning(message);
    }

    fn fail(&self, sink: &mut dyn EventSink, e: Error) {
        error!("Volume '{}': {}; skipping point.", self.id, e);
        if sink.wants(PlacementEventKind::Error) {
            sink.send(PlacementEvent::Error {
                context: format!("volume:{}", self.id),
                message: e.to_string(),
            });
        }
    }

    fn reject(&self, sink: &mut dyn EventSink, point: &PlacementPoint, reason: RejectionReason) {
        if sink.wants(PlacementEventKind::PointRejected) {
            sink.send(PlacementEvent::PointRejected {
                volume: self.id.clone(),
                position: point.position,
                reason,
            });
        }
    }
}
