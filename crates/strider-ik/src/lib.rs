//! Analytic inverse kinematics for three-bone legs.
//!
//! A [`BoneChain`] describes a hip → knee → ankle → foot limb as a small
//! transform hierarchy. The [`AnalyticSolver`] poses it in closed form each
//! tick so the ankle lands on a target point, with a pole point choosing the
//! side the knee bends toward.
//!
//! # Architecture
//!
//! ```text
//! foot target ──┐
//!               ├──► AnalyticSolver ──► bone rotations ──► BoneChain (FK)
//! pole point ───┘
//! ```

pub mod chain;
pub mod solver;

pub use chain::{BONE_COUNT, Bone, BoneChain};
pub use solver::{AnalyticSolver, IkSolution};
