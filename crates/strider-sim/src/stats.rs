//! Run statistics tracking.
//!
//! [`RunStats`] accumulates what happened over a run of rig ticks: steps per
//! leg, gait overlap, distance covered and how often the IK had to fall back.

use nalgebra::Vector3;

use strider_core::types::LegId;

use crate::rig::{QuadrupedRig, TickReport};

// ---------------------------------------------------------------------------
// RunStats
// ---------------------------------------------------------------------------

/// Cumulative statistics over a run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "bevy", derive(bevy::prelude::Component))]
pub struct RunStats {
    /// Ticks recorded.
    pub ticks: u64,
    /// Steps started, indexed by [`LegId::index`].
    pub steps_started: [u64; 4],
    /// Gait pair hand-overs.
    pub pair_switches: u64,
    /// Most diagonal pairs seen mid-step at once. Stays at most 1.
    pub max_stepping_pairs: usize,
    /// Horizontal distance covered by the root.
    pub distance_travelled: f32,
    /// Horizontal distance to the target after the last tick.
    pub final_distance_to_target: Option<f32>,
    /// Ticks in which at least one leg skipped its knee bend.
    pub degenerate_ik_ticks: u64,
    /// Home probes that found no ground.
    pub placement_misses: u64,
}

impl Default for RunStats {
    fn default() -> Self {
        Self::new()
    }
}

impl RunStats {
    /// Create empty stats.
    pub const fn new() -> Self {
        Self {
            ticks: 0,
            steps_started: [0; 4],
            pair_switches: 0,
            max_stepping_pairs: 0,
            distance_travelled: 0.0,
            final_distance_to_target: None,
            degenerate_ik_ticks: 0,
            placement_misses: 0,
        }
    }

    /// Fold one tick into the totals.
    ///
    /// `previous_root` is the root position before the tick.
    pub fn record(&mut self, previous_root: &Vector3<f32>, rig: &QuadrupedRig, report: &TickReport) {
        self.ticks += 1;
        for leg in LegId::ALL {
            if report.gait.started(leg) {
                self.steps_started[leg.index()] += 1;
            }
        }
        if report.gait.switched {
            self.pair_switches += 1;
        }
        self.max_stepping_pairs = self.max_stepping_pairs.max(report.stepping_pairs);

        let moved = rig.root().position - previous_root;
        self.distance_travelled += moved.x.hypot(moved.z);
        self.final_distance_to_target = rig.distance_to_target();

        if report.degenerate_ik() {
            self.degenerate_ik_ticks += 1;
        }
        self.placement_misses += report.placement_misses() as u64;
    }

    /// Steps started by one leg.
    #[must_use]
    pub const fn steps(&self, leg: LegId) -> u64 {
        self.steps_started[leg.index()]
    }

    /// Steps started by all legs.
    #[must_use]
    pub fn total_steps(&self) -> u64 {
        self.steps_started.iter().sum()
    }

    /// Mean root speed over the run, given the tick length.
    #[must_use]
    pub fn mean_speed(&self, dt: f32) -> Option<f32> {
        if self.ticks == 0 {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        let elapsed = self.ticks as f32 * dt;
        Some(self.distance_travelled / elapsed)
    }

    /// Reset all statistics.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
