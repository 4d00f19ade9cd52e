//! The assembled quadruped.
//!
//! [`QuadrupedRig`] owns every per-rig component and runs them in a fixed
//! order once per tick:
//!
//! ```text
//! home placement -> gait coordinator -> stepper advance -> IK per leg
//!                -> body stabilizer -> steering
//! ```
//!
//! Two poses describe the body. The *root* is yaw-only and is what steering
//! drives; the *body* follows the root horizontally and gets its height and
//! tilt from the stabilizer. Probes are cast from the body, so a tilted body
//! tilts its home probes with it.

use nalgebra::{Translation3, Vector3};
use tracing::{debug, trace};

use strider_body::{BodyStabilizer, BodyTarget, HomePlacement, SteeringController, SteeringOutput, SurfaceFollower};
use strider_core::config::{GroundMode, LayoutConfig};
use strider_core::traits::RayProbe;
use strider_core::types::{LegId, Pose};
use strider_gait::{GaitCoordinator, GaitTick, LegStepper, StepEvent, stepping_pairs};
use strider_ik::{AnalyticSolver, BoneChain, IkSolution};

// ---------------------------------------------------------------------------
// LegGeometry
// ---------------------------------------------------------------------------

/// Body-space attachment points of one leg.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegGeometry {
    /// Root of the bone chain.
    pub hip: Vector3<f32>,
    /// Origin of the home probe.
    pub mount: Vector3<f32>,
    /// Knee pole.
    pub pole: Vector3<f32>,
}

impl LegGeometry {
    /// Geometry of `leg` in a symmetric layout.
    ///
    /// The probe mount sits `foot_reach` outward from the hip and
    /// `probe_height` above it; the pole sits halfway out and `pole_height`
    /// up, so knees bend upward and outward.
    #[must_use]
    pub fn from_layout(leg: LegId, layout: &LayoutConfig) -> Self {
        let side = if leg.is_left() { -1.0 } else { 1.0 };
        let end = if leg.is_front() { 1.0 } else { -1.0 };
        let hip = Vector3::new(side * layout.hip_half_width, 0.0, end * layout.hip_half_length);
        Self {
            hip,
            mount: hip + Vector3::new(side * layout.foot_reach, layout.probe_height, 0.0),
            pole: hip + Vector3::new(side * layout.foot_reach * 0.5, layout.pole_height, 0.0),
        }
    }

    /// All four legs of `layout`, indexed by [`LegId::index`].
    #[must_use]
    pub fn symmetric(layout: &LayoutConfig) -> [Self; 4] {
        LegId::ALL.map(|leg| Self::from_layout(leg, layout))
    }
}

// ---------------------------------------------------------------------------
// Leg
// ---------------------------------------------------------------------------

/// Static parts of one leg: geometry, chain and home probe.
///
/// The leg's stepper lives in the rig so the coordinator can drive all four
/// at once.
#[derive(Debug, Clone)]
pub struct Leg {
    id: LegId,
    geometry: LegGeometry,
    chain: BoneChain,
    placement: HomePlacement,
}

impl Leg {
    pub(crate) const fn new(
        id: LegId,
        geometry: LegGeometry,
        chain: BoneChain,
        placement: HomePlacement,
    ) -> Self {
        Self {
            id,
            geometry,
            chain,
            placement,
        }
    }

    pub const fn id(&self) -> LegId {
        self.id
    }

    pub const fn geometry(&self) -> &LegGeometry {
        &self.geometry
    }

    /// The posed bone chain.
    pub const fn chain(&self) -> &BoneChain {
        &self.chain
    }

    pub const fn placement(&self) -> &HomePlacement {
        &self.placement
    }

    /// World-space knee pole for a body at `body`.
    #[must_use]
    pub fn pole(&self, body: &Pose) -> Vector3<f32> {
        body.transform_point(&self.geometry.pole)
    }

    fn attach(&mut self, body: &Pose) {
        self.chain
            .set_root(body.to_isometry() * Translation3::from(self.geometry.hip));
    }
}

// ---------------------------------------------------------------------------
// TickReport
// ---------------------------------------------------------------------------

/// Everything that happened during one [`QuadrupedRig::tick`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    pub gait: GaitTick,
    /// Number of diagonal pairs mid-step right after the trigger.
    pub stepping_pairs: usize,
    /// Stepper events, indexed by [`LegId::index`].
    pub events: [StepEvent; 4],
    /// Whether each leg's home probe hit ground.
    pub homes_placed: [bool; 4],
    pub ik: [IkSolution; 4],
    /// `None` when the surface probe found nothing below the body.
    pub body_target: Option<BodyTarget>,
    /// `None` while coasting without a target.
    pub steering: Option<SteeringOutput>,
}

impl TickReport {
    #[must_use]
    pub fn landed(&self, leg: LegId) -> bool {
        self.events[leg.index()] == StepEvent::Landed
    }

    #[must_use]
    pub fn placement_misses(&self) -> usize {
        self.homes_placed.iter().filter(|placed| !**placed).count()
    }

    /// Whether any leg had to skip its knee bend.
    ///
    /// A skipped end look is not counted: with the ankle on its target the
    /// foot bone has nothing to aim at, which is the normal planted case.
    #[must_use]
    pub fn degenerate_ik(&self) -> bool {
        self.ik.iter().any(|solution| solution.skipped_bend)
    }
}

// ---------------------------------------------------------------------------
// QuadrupedRig
// ---------------------------------------------------------------------------

/// A four-legged walker ready to tick.
///
/// Build one with [`RigBuilder`](crate::builder::RigBuilder).
#[derive(Debug, Clone)]
pub struct QuadrupedRig {
    root: Pose,
    body: Pose,
    legs: [Leg; 4],
    steppers: [LegStepper; 4],
    coordinator: GaitCoordinator,
    stabilizer: BodyStabilizer,
    follower: SurfaceFollower,
    steering: SteeringController,
    solver: AnalyticSolver,
    ground_mode: GroundMode,
    target: Option<Vector3<f32>>,
    ticks: u64,
}

/// Collaborators handed over by the builder.
pub(crate) struct RigParts {
    pub root: Pose,
    pub body: Pose,
    pub legs: [Leg; 4],
    pub steppers: [LegStepper; 4],
    pub stabilizer: BodyStabilizer,
    pub follower: SurfaceFollower,
    pub steering: SteeringController,
    pub solver: AnalyticSolver,
    pub ground_mode: GroundMode,
    pub target: Option<Vector3<f32>>,
}

impl QuadrupedRig {
    pub(crate) fn from_parts(parts: RigParts) -> Self {
        let mut rig = Self {
            root: parts.root,
            body: parts.body,
            legs: parts.legs,
            steppers: parts.steppers,
            coordinator: GaitCoordinator::new(),
            stabilizer: parts.stabilizer,
            follower: parts.follower,
            steering: parts.steering,
            solver: parts.solver,
            ground_mode: parts.ground_mode,
            target: parts.target,
            ticks: 0,
        };
        rig.solve_legs();
        rig
    }

    /// Yaw-only pose driven by steering.
    pub const fn root(&self) -> &Pose {
        &self.root
    }

    /// Stabilized body pose.
    pub const fn body(&self) -> &Pose {
        &self.body
    }

    pub const fn legs(&self) -> &[Leg; 4] {
        &self.legs
    }

    #[must_use]
    pub const fn leg(&self, id: LegId) -> &Leg {
        &self.legs[id.index()]
    }

    pub const fn steppers(&self) -> &[LegStepper; 4] {
        &self.steppers
    }

    #[must_use]
    pub const fn stepper(&self, id: LegId) -> &LegStepper {
        &self.steppers[id.index()]
    }

    pub const fn coordinator(&self) -> &GaitCoordinator {
        &self.coordinator
    }

    pub const fn stabilizer(&self) -> &BodyStabilizer {
        &self.stabilizer
    }

    pub const fn steering(&self) -> &SteeringController {
        &self.steering
    }

    pub const fn solver(&self) -> &AnalyticSolver {
        &self.solver
    }

    pub const fn ground_mode(&self) -> GroundMode {
        self.ground_mode
    }

    /// Pursuit target, if any.
    pub const fn target(&self) -> Option<&Vector3<f32>> {
        self.target.as_ref()
    }

    /// Set or clear the pursuit target. Without one the root coasts to rest.
    pub fn set_target(&mut self, target: Option<Vector3<f32>>) {
        self.target = target;
    }

    /// Ticks run since construction.
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Home anchor positions, indexed by [`LegId::index`].
    #[must_use]
    pub fn anchors(&self) -> [Vector3<f32>; 4] {
        std::array::from_fn(|i| self.steppers[i].home().position)
    }

    /// Foot target positions, indexed by [`LegId::index`].
    #[must_use]
    pub fn feet(&self) -> [Vector3<f32>; 4] {
        std::array::from_fn(|i| self.steppers[i].foot().position)
    }

    /// Horizontal distance from the root to the target.
    #[must_use]
    pub fn distance_to_target(&self) -> Option<f32> {
        self.target.map(|target| {
            let offset = target - self.root.position;
            offset.x.hypot(offset.z)
        })
    }

    /// Advance the whole rig by `dt` seconds against `probe`.
    pub fn tick<P: RayProbe + ?Sized>(&mut self, dt: f32, probe: &P) -> TickReport {
        let homes_placed = self.place_homes(probe);

        let gait = self.coordinator.tick(&mut self.steppers, &self.body.up());
        let stepping_pairs = stepping_pairs(&self.steppers);

        let events: [StepEvent; 4] = std::array::from_fn(|i| self.steppers[i].tick(dt));

        let ik = self.solve_legs();

        // The body rides above the root horizontally; a missed surface cast
        // leaves it where it was.
        let mut follow = self.body;
        follow.position.x = self.root.position.x;
        follow.position.z = self.root.position.z;
        let body_target = match self.ground_mode {
            GroundMode::AnchorPlane => {
                self.body = follow;
                let anchors = self.anchors();
                Some(
                    self.stabilizer
                        .target_from_anchors(&self.body, &self.root.orientation, &anchors),
                )
            }
            GroundMode::SurfaceProbe => {
                let hit = self.follower.probe(&follow, probe);
                let target = self
                    .stabilizer
                    .target_from_surface(&self.root.orientation, hit.as_ref());
                if target.is_some() {
                    self.body = follow;
                }
                target
            }
        };
        if let Some(target) = &body_target {
            self.stabilizer.apply(&mut self.body, target, dt);
        }

        self.root.position.y = self.body.position.y;
        let steering = match self.target {
            Some(target) => Some(self.steering.update(&mut self.root, &target, dt)),
            None => {
                self.steering.coast(&mut self.root, dt);
                None
            }
        };

        self.ticks += 1;
        trace!(
            tick = self.ticks,
            active = ?gait.active,
            stepping_pairs,
            body_y = self.body.position.y,
            "rig tick"
        );

        TickReport {
            gait,
            stepping_pairs,
            events,
            homes_placed,
            ik,
            body_target,
            steering,
        }
    }

    /// Re-attach every chain to the body and solve it toward its foot.
    pub fn solve_legs(&mut self) -> [IkSolution; 4] {
        std::array::from_fn(|i| {
            let leg = &mut self.legs[i];
            leg.attach(&self.body);
            let pole = leg.pole(&self.body);
            let solution =
                self.solver
                    .solve_in_place(&mut leg.chain, &self.steppers[i].foot().position, &pole);
            if solution.skipped_bend {
                trace!(leg = %leg.id, "leg IK kept its previous bend");
            }
            solution
        })
    }

    fn place_homes<P: RayProbe + ?Sized>(&mut self, probe: &P) -> [bool; 4] {
        std::array::from_fn(|i| {
            let leg = &self.legs[i];
            match leg.placement.place(&self.body, probe) {
                Some(home) => {
                    self.steppers[i].set_home(home);
                    true
                }
                None => {
                    debug!(leg = %leg.id, "no ground under leg; keeping previous home");
                    false
                }
            }
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use strider_core::config::{LocomotionConfig, StabilizerConfig};
    use strider_gait::DiagonalPair;
    use strider_test_utils::mocks::{CountingProbe, FlatGround, NoGround};

    use crate::builder::RigBuilder;

    fn rig() -> QuadrupedRig {
        RigBuilder::new().build(&FlatGround::new(0.0)).unwrap()
    }

    fn surface_rig() -> QuadrupedRig {
        let mut config = LocomotionConfig::default();
        config.stabilizer = StabilizerConfig {
            ground_mode: GroundMode::SurfaceProbe,
            surface_body_height: 0.5,
            surface_probe_distance: 3.0,
            ..StabilizerConfig::default()
        };
        RigBuilder::from_config(config)
            .with_position(Vector3::new(0.0, 1.0, 0.0))
            .with_target(Vector3::new(0.0, 0.0, 10.0))
            .build(&FlatGround::new(0.0))
            .unwrap()
    }

    #[test]
    fn layout_mirrors_left_and_right() {
        let layout = LayoutConfig::default();
        let [fl, fr, bl, br] = LegGeometry::symmetric(&layout);
        assert_relative_eq!(fl.hip.x, -fr.hip.x);
        assert_relative_eq!(bl.mount.x, -br.mount.x);
        assert!(fl.hip.z > 0.0 && bl.hip.z < 0.0);
        assert!(fl.mount.x < fl.hip.x);
        assert!(fr.pole.y > fr.hip.y);
    }

    #[test]
    fn built_rig_stands_at_clearance() {
        let rig = rig();
        let clearance = LocomotionConfig::default().stabilizer.clearance;
        assert_relative_eq!(rig.body().position.y, clearance, epsilon = 1e-5);
        for anchor in rig.anchors() {
            assert_relative_eq!(anchor.y, 0.0, epsilon = 1e-5);
        }
        assert_eq!(rig.feet(), rig.anchors());
    }

    #[test]
    fn built_rig_feet_are_on_their_targets() {
        let rig = rig();
        for leg in LegId::ALL {
            let ankle = rig.leg(leg).chain().joint_positions()[2];
            assert_relative_eq!(ankle, rig.stepper(leg).foot().position, epsilon = 1e-3);
        }
    }

    #[test]
    fn standing_still_on_flat_ground_does_not_step() {
        let mut rig = rig();
        let ground = FlatGround::new(0.0);
        for _ in 0..120 {
            let report = rig.tick(1.0 / 60.0, &ground);
            assert!(!report.gait.any_started());
            assert_eq!(report.placement_misses(), 0);
            assert!(report.steering.is_none());
        }
        assert_relative_eq!(rig.body().position.y, 0.35, epsilon = 1e-4);
    }

    #[test]
    fn missing_ground_keeps_previous_homes() {
        let mut rig = rig();
        let anchors = rig.anchors();
        let report = rig.tick(1.0 / 60.0, &NoGround);
        assert_eq!(report.placement_misses(), 4);
        assert_eq!(rig.anchors(), anchors);
    }

    #[test]
    fn target_ahead_walks_the_rig_forward() {
        let mut rig = rig();
        rig.set_target(Some(Vector3::new(0.0, 0.0, 10.0)));
        let ground = FlatGround::new(0.0);
        let mut started = [0_u32; 4];
        for _ in 0..600 {
            let report = rig.tick(1.0 / 60.0, &ground);
            assert!(report.stepping_pairs <= 1);
            for leg in LegId::ALL {
                if report.gait.started(leg) {
                    started[leg.index()] += 1;
                    assert_eq!(DiagonalPair::of(leg), report.gait.active);
                }
            }
        }
        assert!(rig.root().position.z > 3.0);
        assert!(started.iter().all(|n| *n > 0), "every leg should step: {started:?}");
        for anchor in rig.anchors() {
            assert!(anchor.z > 2.0);
        }
    }

    #[test]
    fn ticks_are_counted() {
        let mut rig = rig();
        let ground = FlatGround::new(0.0);
        rig.tick(0.01, &ground);
        rig.tick(0.01, &ground);
        assert_eq!(rig.ticks(), 2);
    }

    #[test]
    fn anchor_plane_tick_casts_once_per_leg() {
        let mut rig = rig();
        let ground = CountingProbe::new(FlatGround::new(0.0));
        rig.tick(1.0 / 60.0, &ground);
        assert_eq!(ground.casts(), 4);
        rig.tick(1.0 / 60.0, &ground);
        assert_eq!(ground.casts(), 8);
    }

    #[test]
    fn surface_mode_follows_the_ground_below_the_body() {
        let mut rig = surface_rig();
        let ground = CountingProbe::new(FlatGround::new(0.0));
        for _ in 0..59 {
            let report = rig.tick(1.0 / 60.0, &ground);
            assert!(report.body_target.is_some());
        }
        // The body takes the root's x/z from before steering moves it.
        let root = rig.root().position;
        assert!(rig.tick(1.0 / 60.0, &ground).body_target.is_some());
        // Four home casts plus one below the body per tick.
        assert_eq!(ground.casts(), 60 * 5);
        assert!(root.z > 0.0);
        assert_relative_eq!(rig.body().position.x, root.x);
        assert_relative_eq!(rig.body().position.z, root.z);
        assert_relative_eq!(rig.body().position.y, 0.5, epsilon = 1e-4);
        assert_relative_eq!(rig.body().up(), Vector3::y(), epsilon = 1e-4);
    }

    #[test]
    fn surface_mode_miss_leaves_the_body_in_place() {
        let mut rig = surface_rig();
        let ground = FlatGround::new(0.0);
        for _ in 0..60 {
            rig.tick(1.0 / 60.0, &ground);
        }
        let before = *rig.body();
        let root_before = rig.root().position;

        let report = rig.tick(1.0 / 60.0, &NoGround);
        assert!(report.body_target.is_none());
        assert_eq!(*rig.body(), before);
        assert!(rig.root().position.z > root_before.z);

        // The next hit catches the body up with the root again.
        let root = rig.root().position;
        rig.tick(1.0 / 60.0, &ground);
        assert_relative_eq!(rig.body().position.z, root.z);
    }
}
