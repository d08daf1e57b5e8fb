//! Event types and sinks for observing placement runs.
//!
//! This module defines [`PlacementEvent`] and a set of sinks to emit, collect,
//! or forward events while a [`crate::scatter::volume::Volume`] places
//! instances via [`crate::scatter::volume::Volume::place_with_events`].
use glam::Vec3;

use crate::instancing::{InstanceHandle, InstanceTransform, TemplateRef};
use crate::scatter::stats::DebugStats;

/// Why a grounded point did not produce an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectionReason {
    /// The point lies outside the volume's vertical bounds.
    Height,
    /// No template accepted the point's altitude and slope.
    NoValidTemplate,
    /// The selected template's proximity mask rejected the position.
    Proximity,
}

/// Describes events emitted by placement runs.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub enum PlacementEvent {
    /// Emitted when a volume starts a run.
    RunStarted {
        /// The volume id.
        volume: String,
        /// Seed the run's generator was created from.
        seed: i64,
        /// Number of templates on the volume.
        template_count: usize,
    },

    /// Emitted after point sampling, before threshold filtering.
    PointsGenerated { volume: String, count: usize },

    /// Emitted after threshold filtering and ground projection.
    PointsGrounded {
        volume: String,
        /// Candidates that passed the threshold filter.
        accepted: usize,
        /// Candidates that hit the ground.
        grounded: usize,
    },

    /// Emitted for each grounded point that did not produce an instance.
    PointRejected {
        volume: String,
        position: Vec3,
        reason: RejectionReason,
    },

    /// Emitted when an instance was spawned.
    InstanceSpawned {
        volume: String,
        template: TemplateRef,
        handle: InstanceHandle,
        transform: InstanceTransform,
    },

    /// Non-fatal configuration or utilization warning.
    Warning {
        /// Context string (e.g. volume id).
        context: String,
        /// Human-readable message.
        message: String,
    },

    /// A point was skipped because its template could not be instantiated.
    Error { context: String, message: String },

    /// Emitted when a run finishes, including cancelled runs.
    RunFinished {
        volume: String,
        stats: DebugStats,
        cancelled: bool,
    },
}

/// Discriminant of [`PlacementEvent`], used for sink filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlacementEventKind {
    RunStarted,
    PointsGenerated,
    PointsGrounded,
    PointRejected,
    InstanceSpawned,
    Warning,
    Error,
    RunFinished,
}

impl PlacementEvent {
    pub fn kind(&self) -> PlacementEventKind {
        match self {
            PlacementEvent::RunStarted { .. } => PlacementEventKind::RunStarted,
            PlacementEvent::PointsGenerated { .. } => PlacementEventKind::PointsGenerated,
            PlacementEvent::PointsGrounded { .. } => PlacementEventKind::PointsGrounded,
            PlacementEvent::PointRejected { .. } => PlacementEventKind::PointRejected,
            PlacementEvent::InstanceSpawned { .. } => PlacementEventKind::InstanceSpawned,
            PlacementEvent::Warning { .. } => PlacementEventKind::Warning,
            PlacementEvent::Error { .. } => PlacementEventKind::Error,
            PlacementEvent::RunFinished { .. } => PlacementEventKind::RunFinished,
        }
    }
}

/// A generic event sink that accepts [`PlacementEvent`]s.
pub trait EventSink {
    fn send(&mut self, event: PlacementEvent);

    /// Lets emitters skip building events nobody listens to.
    #[inline]
    fn wants(&self, _kind: PlacementEventKind) -> bool {
        true
    }

    fn send_many<I>(&mut self, events: I)
    where
        Self: Sized,
        I: IntoIterator<Item = PlacementEvent>,
    {
        for e in events {
            self.send(e);
        }
    }
}

/// A no-op event sink.
impl EventSink for () {
    #[inline]
    fn send(&mut self, _event: PlacementEvent) {}

    #[inline]
    fn wants(&self, _kind: PlacementEventKind) -> bool {
        false
    }
}

/// An event sink that forwards to a user-provided closure.
pub struct FnSink<F>
where
    F: FnMut(PlacementEvent),
{
    f: F,
}

impl<F> FnSink<F>
where
    F: FnMut(PlacementEvent),
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> EventSink for FnSink<F>
where
    F: FnMut(PlacementEvent),
{
    #[inline]
    fn send(&mut self, event: PlacementEvent) {
        (self.f)(event);
    }
}

/// An event sink that collects events in a `Vec`, optionally only some kinds.
#[derive(Default)]
pub struct VecSink {
    events: Vec<PlacementEvent>,
    only: Option<Vec<PlacementEventKind>>,
}

impl VecSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            events: Vec::with_capacity(cap),
            only: None,
        }
    }

    /// Collects only events of the given kinds.
    pub fn only(kinds: impl IntoIterator<Item = PlacementEventKind>) -> Self {
        Self {
            events: Vec::new(),
            only: Some(kinds.into_iter().collect()),
        }
    }

    pub fn into_inner(self) -> Vec<PlacementEvent> {
        self.events
    }

    pub fn as_slice(&self) -> &[PlacementEvent] {
        &self.events
    }

    pub fn count(&self, kind: PlacementEventKind) -> usize {
        self.events.iter().filter(|e| e.kind() == kind).count()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl EventSink for VecSink {
    #[inline]
    fn send(&mut self, event: PlacementEvent) {
        if self.wants(event.kind()) {
            self.events.push(event);
        }
    }

    fn wants(&self, kind: PlacementEventKind) -> bool {
        self.only.as_ref().is_none_or(|kinds| kinds.contains(&kind))
    }
}

/// Fan-out sink that forwards each event to all contained sinks.
pub struct MultiSink<S: EventSink> {
    pub(crate) sinks: Vec<S>,
}

impl<S: EventSink> MultiSink<S> {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    pub fn with_sinks(sinks: Vec<S>) -> Self {
        Self { sinks }
    }

    pub fn push(&mut self, sink: S) {
        self.sinks.push(sink);
    }

    pub fn sinks(&self) -> &[S] {
        &self.sinks
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }
}

impl<S: EventSink> Default for MultiSink<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: EventSink> EventSink for MultiSink<S> {
    fn send(&mut self, event: PlacementEvent) {
        let kind = event.kind();
        let targets: Vec<usize> = (0..self.sinks.len())
            .filter(|&i| self.sinks[i].wants(kind))
            .collect();
        let Some((&last, rest)) = targets.split_last() else {
            return;
        };
        for &i in rest {
            self.sinks[i].send(event.clone());
        }
        self.sinks[last].send(event);
    }

    fn wants(&self, kind: PlacementEventKind) -> bool {
        self.sinks.iter().any(|s| s.wants(kind))
    }
}
