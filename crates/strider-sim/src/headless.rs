//! Headless fixed-step runner.
//!
//! [`HeadlessRunner`] drives a [`QuadrupedRig`] against a probe with a
//! [`TickClock`], collecting [`RunStats`] as it goes. No window and no engine:
//! this is what tests and the demo binaries use.

use nalgebra::Vector3;
use tracing::{debug, info};

use strider_core::time::{SimTime, TickClock};
use strider_core::traits::RayProbe;

use crate::rig::{QuadrupedRig, TickReport};
use crate::stats::RunStats;

/// Fixed-step driver for one rig.
pub struct HeadlessRunner<P> {
    rig: QuadrupedRig,
    probe: P,
    clock: TickClock,
    stats: RunStats,
}

impl<P: RayProbe> HeadlessRunner<P> {
    /// Runner stepping `rig` by `dt` seconds per tick against `probe`.
    pub fn new(rig: QuadrupedRig, probe: P, dt: f32) -> Self {
        Self {
            rig,
            probe,
            clock: TickClock::new(dt),
            stats: RunStats::new(),
        }
    }

    pub const fn rig(&self) -> &QuadrupedRig {
        &self.rig
    }

    /// Mutable access for steering the rig between ticks.
    pub const fn rig_mut(&mut self) -> &mut QuadrupedRig {
        &mut self.rig
    }

    pub const fn probe(&self) -> &P {
        &self.probe
    }

    pub const fn stats(&self) -> &RunStats {
        &self.stats
    }

    /// Simulated time elapsed.
    pub const fn time(&self) -> SimTime {
        self.clock.time()
    }

    pub const fn clock(&self) -> &TickClock {
        &self.clock
    }

    /// Point the rig at a new target.
    pub fn set_target(&mut self, target: Option<Vector3<f32>>) {
        self.rig.set_target(target);
    }

    /// Run one tick and record it.
    pub fn step(&mut self) -> TickReport {
        let dt = self.clock.tick();
        let before = self.rig.root().position;
        let report = self.rig.tick(dt, &self.probe);
        self.stats.record(&before, &self.rig, &report);
        if report.gait.switched {
            debug!(time = %self.clock.time(), pair = ?report.gait.active, "pair switch");
        }
        report
    }

    /// Run `ticks` ticks and return the accumulated stats.
    pub fn run(&mut self, ticks: u64) -> &RunStats {
        for _ in 0..ticks {
            self.step();
        }
        info!(
            ticks = self.stats.ticks,
            steps = self.stats.total_steps(),
            distance = self.stats.distance_travelled,
            "headless run finished"
        );
        &self.stats
    }

    /// Run until the rig is within `distance` of its target or `max_ticks`
    /// pass. Returns whether the target was reached.
    pub fn run_until_within(&mut self, distance: f32, max_ticks: u64) -> bool {
        for _ in 0..max_ticks {
            if self.rig.distance_to_target().is_some_and(|d| d <= distance) {
                return true;
            }
            self.step();
        }
        self.rig.distance_to_target().is_some_and(|d| d <= distance)
    }

    /// Split back into the rig, the probe and the stats.
    pub fn into_parts(self) -> (QuadrupedRig, P, RunStats) {
        (self.rig, self.probe, self.stats)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use strider_test_utils::mocks::FlatGround;

    use crate::builder::RigBuilder;

    fn runner() -> HeadlessRunner<FlatGround> {
        let ground = FlatGround::new(0.0);
        let rig = RigBuilder::new()
            .with_target(Vector3::new(0.0, 0.0, 12.0))
            .build(&ground)
            .unwrap();
        HeadlessRunner::new(rig, ground, 1.0 / 60.0)
    }

    #[test]
    fn run_advances_clock_and_stats() {
        let mut runner = runner();
        let stats = runner.run(60).clone();
        assert_eq!(stats.ticks, 60);
        assert_eq!(runner.clock().ticks(), 60);
        assert_eq!(runner.rig().ticks(), 60);
        assert!((runner.time().secs_f32() - 1.0).abs() < 1e-3);
    }

    #[test]
    fn run_until_within_reaches_the_band() {
        let mut runner = runner();
        assert!(runner.run_until_within(3.2, 2_000));
        assert!(runner.stats().total_steps() > 4);
        assert!(runner.stats().max_stepping_pairs <= 1);
    }

    #[test]
    fn without_target_never_reaches() {
        let mut runner = runner();
        runner.set_target(None);
        assert!(!runner.run_until_within(100.0, 10));
        let (rig, _, stats) = runner.into_parts();
        assert!(rig.target().is_none());
        assert_eq!(stats.ticks, 10);
    }
}
