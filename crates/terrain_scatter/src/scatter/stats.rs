//! Per-run counters and utilization diagnostics of a volume.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::scatter::validator::ValidationOutcome;

/// Utilization below this percentage produces a warning.
pub const LOW_UTILIZATION_PERCENT: u32 = 10;

/// Counters collected during one placement run. Reset at the start of every
/// run and finalized at its end.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DebugStats {
    /// Raw sampler output count, before threshold filtering and grounding.
    pub points_generated: usize,
    pub rejected_altitude: usize,
    pub rejected_slope: usize,
    /// Points whose height lies outside the volume bounds.
    pub rejected_height: usize,
    pub rejected_proximity: usize,
    pub objects_spawned: usize,
    /// `round(objects_spawned / points_generated * 100)`, 0 when nothing was generated.
    pub used_percentage: u32,
    pub warnings: Vec<String>,
}

impl DebugStats {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn on_points_generated(&mut self, count: usize) {
        self.points_generated = count;
    }

    pub fn on_height_rejected(&mut self) {
        self.rejected_height += 1;
    }

    pub fn on_proximity_rejected(&mut self) {
        self.rejected_proximity += 1;
    }

    pub fn on_spawned(&mut self) {
        self.objects_spawned += 1;
    }

    /// Folds the per-template rejection counts of one point.
    pub fn absorb(&mut self, outcome: &ValidationOutcome) {
        self.rejected_altitude += outcome.rejected_altitude;
        self.rejected_slope += outcome.rejected_slope;
    }

    pub fn push_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Computes the used percentage and appends the low-utilization warning.
    pub fn finalize(&mut self) {
        self.used_percentage = if self.points_generated == 0 {
            0
        } else {
            (self.objects_spawned as f64 / self.points_generated as f64 * 100.0).round() as u32
        };

        if self.used_percentage < LOW_UTILIZATION_PERCENT {
            let message = format!(
                "It is recommended not to use a volume with only {}% of points being used to spawn objects.",
                self.used_percentage
            );
            warn!("{message}");
            self.warnings.push(message);
        }
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}
