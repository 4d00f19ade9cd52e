//! Procedural stepping for quadruped legs.
//!
//! This crate decides *when* each foot moves and *where* it is while moving:
//!
//! 1. **Leg Stepper**: per-leg state machine that triggers a step once the
//!    foot drifts too far from its home anchor (or has idled too long) and
//!    animates it along an eased, raised Bezier arc
//! 2. **Gait Coordinator**: lets only one diagonal pair step at a time,
//!    alternating between front-left/back-right and front-right/back-left
//!
//! # Tick order
//!
//! Call [`GaitCoordinator::tick`] first so newly triggered steps advance in
//! the same tick, then [`LegStepper::tick`] on every leg, then hand the foot
//! targets to the IK solver.

pub mod coordinator;
pub mod stepper;

pub use coordinator::{DiagonalPair, GaitCoordinator, GaitTick, stepping_pairs};
pub use stepper::{LegState, LegStepper, Step, StepEvent};
