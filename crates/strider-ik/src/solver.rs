//! Analytic three-bone IK solver.
//!
//! Closed-form: the first bone looks at the target, bends toward the pole by
//! the law-of-cosines angle, the second bone looks at the target from the
//! knee, and the third bone optionally aims straight at the target. No
//! iteration and no allocation, so it runs every tick for every leg.

use nalgebra::{Unit, UnitQuaternion, Vector3};
use tracing::trace;

use strider_core::config::IkConfig;
use strider_core::math::{DEGENERATE_EPSILON, look_rotation};

use crate::chain::{BONE_COUNT, BoneChain};

/// Outcome of one solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IkSolution {
    /// World-space rotation of each bone after the solve.
    pub rotations: [UnitQuaternion<f32>; BONE_COUNT],
    /// Bend applied at the first joint (radians), if any.
    pub bend_angle: Option<f32>,
    /// Whether the target was beyond reach and the distance was clamped.
    pub reach_clamped: bool,
    /// The bend was skipped (degenerate triangle or bend axis).
    pub skipped_bend: bool,
    /// The end bone look was skipped (target too close to the ankle).
    pub skipped_end_look: bool,
}

impl IkSolution {
    /// Whether any step fell back to keeping the previous orientation.
    #[must_use]
    pub const fn is_degenerate(&self) -> bool {
        self.skipped_bend || self.skipped_end_look
    }
}

/// Law-of-cosines solver for [`BoneChain`]s.
#[derive(Debug, Clone, Default)]
pub struct AnalyticSolver {
    config: IkConfig,
}

impl AnalyticSolver {
    /// Create a new solver with the given configuration.
    pub const fn new(config: IkConfig) -> Self {
        Self { config }
    }

    /// Create a solver with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(IkConfig::default())
    }

    pub const fn config(&self) -> &IkConfig {
        &self.config
    }

    /// Solve without touching `chain`.
    pub fn solve(
        &self,
        chain: &BoneChain,
        target: &Vector3<f32>,
        pole: &Vector3<f32>,
    ) -> IkSolution {
        let mut scratch = *chain;
        self.solve_in_place(&mut scratch, target, pole)
    }

    /// Solve and write the new bone rotations into `chain`.
    pub fn solve_in_place(
        &self,
        chain: &mut BoneChain,
        target: &Vector3<f32>,
        pole: &Vector3<f32>,
    ) -> IkSolution {
        let [l1, l2, _] = chain.bone_lengths();
        let total_length = chain.total_length();
        let hip = chain.joint_positions()[0];
        let toward_pole = pole - hip;
        let toward_target = target - hip;

        let mut solution = IkSolution {
            rotations: chain.world_rotations(),
            bend_angle: None,
            reach_clamped: false,
            skipped_bend: false,
            skipped_end_look: false,
        };

        // 1. First bone looks at the target, pole as up-reference.
        let bones = *chain.bones();
        if let Some(look) = look_rotation(&toward_target, &toward_pole, DEGENERATE_EPSILON) {
            chain.set_world_rotation(0, look * bones[0].angle_offset);
        }
        let toward_knee = chain.joint_positions()[1] - hip;

        // 2. Clamp reach.
        let max_reach = total_length * self.config.reach_fraction;
        let raw_distance = toward_target.norm();
        let target_distance = raw_distance.min(max_reach);
        solution.reach_clamped = raw_distance > max_reach;

        // 3-4. Bend toward the pole.
        let cos_bend = ((l1 * l1 + target_distance * target_distance - l2 * l2)
            / (2.0 * target_distance * l1))
            .clamp(-1.0, 1.0);
        let bend = cos_bend.acos();
        let bend_axis = toward_pole.cross(&toward_knee);
        match Unit::try_new(bend_axis, DEGENERATE_EPSILON) {
            Some(axis) if bend.is_finite() => {
                let current = chain.world_rotations()[0];
                chain.set_world_rotation(0, UnitQuaternion::from_axis_angle(&axis, -bend) * current);
                solution.bend_angle = Some(bend);
            }
            _ => {
                trace!(bend, "IK bend skipped: degenerate triangle or bend axis");
                solution.skipped_bend = true;
            }
        }

        // 5. Second bone looks at the target from the knee.
        let knee = chain.joint_positions()[1];
        if let Some(look) = look_rotation(&(target - knee), &bend_axis, DEGENERATE_EPSILON) {
            chain.set_world_rotation(1, look * bones[1].angle_offset);
        }

        // 6. Third bone aims at the target.
        if self.config.align_end_effector {
            let ankle = chain.joint_positions()[2];
            match look_rotation(&(target - ankle), &Vector3::y(), self.config.look_epsilon) {
                Some(look) => chain.set_world_rotation(2, look * bones[2].angle_offset),
                None => {
                    trace!("IK end look skipped: target on the ankle");
                    solution.skipped_end_look = true;
                }
            }
        }

        solution.rotations = chain.world_rotations();
        solution
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{Isometry3, Translation3};
    use rand::Rng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn leg(lengths: [f32; 3]) -> BoneChain {
        BoneChain::from_segments(
            Isometry3::from_parts(Translation3::new(0.0, 1.0, 0.0), UnitQuaternion::identity()),
            lengths,
        )
        .unwrap()
    }

    fn pole() -> Vector3<f32> {
        Vector3::new(0.0, 2.0, 0.5)
    }

    #[test]
    fn reachable_target_puts_ankle_on_target() {
        let solver = AnalyticSolver::with_defaults();
        let mut chain = leg([0.5, 0.5, 0.1]);
        let target = Vector3::new(0.2, 0.4, 0.5);
        let solution = solver.solve_in_place(&mut chain, &target, &pole());
        assert!(!solution.reach_clamped);
        assert!(solution.bend_angle.is_some());
        assert_relative_eq!(chain.joint_positions()[2], target, epsilon = 1e-4);
    }

    #[test]
    fn knee_bends_toward_pole() {
        let solver = AnalyticSolver::with_defaults();
        let mut chain = leg([0.5, 0.5, 0.0]);
        // Straight below the hip; pole is up and forward, so the knee goes forward.
        let target = Vector3::new(0.0, 0.3, 0.0);
        solver.solve_in_place(&mut chain, &target, &Vector3::new(0.0, 1.5, 1.0));
        let knee = chain.joint_positions()[1];
        assert!(knee.z > 0.1, "knee should bend forward, got {knee:?}");
    }

    #[test]
    fn bone_lengths_are_preserved() {
        let solver = AnalyticSolver::with_defaults();
        let mut chain = leg([0.4, 0.6, 0.15]);
        solver.solve_in_place(&mut chain, &Vector3::new(-0.3, 0.5, 0.6), &pole());
        let lengths = chain.bone_lengths();
        assert_relative_eq!(lengths[0], 0.4, epsilon = 1e-5);
        assert_relative_eq!(lengths[1], 0.6, epsilon = 1e-5);
        assert_relative_eq!(lengths[2], 0.15, epsilon = 1e-5);
    }

    #[test]
    fn out_of_reach_target_stretches_toward_it() {
        let solver = AnalyticSolver::with_defaults();
        let mut chain = leg([0.5, 0.5, 0.2]);
        let hip = chain.joint_positions()[0];
        let target = Vector3::new(3.0, 1.0, 4.0);
        let solution = solver.solve_in_place(&mut chain, &target, &pole());
        assert!(solution.reach_clamped);

        let dir = (target - hip).normalize();
        let reach_point = hip + dir * (1.2 * 0.9999);
        // Fully stretched along the target line.
        assert!((chain.end_effector() - reach_point).norm() < 1e-3);
    }

    #[test]
    fn solve_leaves_input_untouched() {
        let solver = AnalyticSolver::with_defaults();
        let chain = leg([0.5, 0.5, 0.1]);
        let before = chain;
        let solution = solver.solve(&chain, &Vector3::new(0.3, 0.5, 0.3), &pole());
        assert_eq!(chain, before);
        assert_ne!(solution.rotations, before.world_rotations());
    }

    #[test]
    fn target_at_hip_does_not_produce_nan() {
        let solver = AnalyticSolver::with_defaults();
        let mut chain = leg([0.5, 0.5, 0.1]);
        let hip = chain.joint_positions()[0];
        let solution = solver.solve_in_place(&mut chain, &hip, &pole());
        assert!(solution.skipped_bend);
        for q in chain.world_rotations() {
            assert!(q.coords.iter().all(|c| c.is_finite()));
        }
    }

    #[test]
    fn pole_collinear_with_target_skips_bend() {
        let solver = AnalyticSolver::with_defaults();
        let mut chain = leg([0.5, 0.5, 0.1]);
        // Pole directly behind the target as seen from the hip.
        let target = Vector3::new(0.0, 1.0, 0.6);
        let solution = solver.solve_in_place(&mut chain, &target, &Vector3::new(0.0, 1.0, 2.0));
        assert!(solution.skipped_bend);
        assert!(chain.end_effector().iter().all(|c| c.is_finite()));
    }

    #[test]
    fn end_look_skipped_when_ankle_on_target() {
        let solver = AnalyticSolver::with_defaults();
        let mut chain = leg([0.5, 0.5, 0.1]);
        let solution = solver.solve_in_place(&mut chain, &Vector3::new(0.0, 0.5, 0.5), &pole());
        assert!(solution.skipped_end_look);
        assert!(solution.is_degenerate());
    }

    #[test]
    fn unaligned_end_bone_keeps_local_rotation() {
        let solver = AnalyticSolver::new(IkConfig {
            align_end_effector: false,
            ..IkConfig::default()
        });
        let mut chain = leg([0.5, 0.5, 0.1]);
        let local_before = chain.bones()[2].local_rotation;
        let solution = solver.solve_in_place(&mut chain, &Vector3::new(0.1, 0.4, 0.6), &pole());
        assert!(!solution.skipped_end_look);
        assert_relative_eq!(chain.bones()[2].local_rotation, local_before);
    }

    #[test]
    fn angle_offsets_apply_on_top_of_look() {
        let offset = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 0.7);
        let mut plain = leg([0.5, 0.5, 0.0]);
        let mut corrected = plain.with_angle_offsets([UnitQuaternion::identity(), offset, UnitQuaternion::identity()]);
        let solver = AnalyticSolver::new(IkConfig {
            align_end_effector: false,
            ..IkConfig::default()
        });
        let target = Vector3::new(0.2, 0.3, 0.4);
        let a = solver.solve_in_place(&mut plain, &target, &pole());
        let b = solver.solve_in_place(&mut corrected, &target, &pole());
        // A roll about the bone's own axis does not move the ankle.
        assert_relative_eq!(b.rotations[1], a.rotations[1] * offset, epsilon = 1e-5);
        assert_relative_eq!(plain.joint_positions()[2], corrected.joint_positions()[2], epsilon = 1e-5);
    }

    #[test]
    fn randomized_reachable_targets_converge() {
        let solver = AnalyticSolver::with_defaults();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let hip = Vector3::new(0.0, 1.0, 0.0);
        for _ in 0..200 {
            let mut chain = leg([0.5, 0.4, 0.0]);
            // Reachable band, away from full stretch and full fold.
            let dir = Vector3::<f32>::new(
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..0.2),
                rng.gen_range(-1.0..1.0),
            );
            if dir.norm() < 0.1 {
                continue;
            }
            let distance: f32 = rng.gen_range(0.2..0.85);
            let target = hip + dir.normalize() * distance;
            let solution = solver.solve_in_place(&mut chain, &target, &Vector3::new(0.0, 3.0, 0.3));
            if solution.skipped_bend {
                continue;
            }
            assert_relative_eq!(chain.end_effector(), target, epsilon = 1e-3);
            assert!(chain.world_rotations().iter().all(|q| q.coords.iter().all(|c| c.is_finite())));
        }
    }
}
