//! Quadruped rig assembly and simulation drivers for Strider.
//!
//! Ties the leaf crates together into a walking rig:
//!
//! - [`RigBuilder`] validates a [`LocomotionConfig`](strider_core::LocomotionConfig),
//!   drops the four home anchors onto the ground and poses the legs
//! - [`QuadrupedRig`] runs placement, gait, stepping, IK, stabilization and
//!   steering once per tick
//! - [`HeadlessRunner`] drives a rig with a fixed-step clock and collects
//!   [`RunStats`]
//! - `StriderSimPlugin` (feature `bevy`) ticks rigs inside a Bevy app
//!
//! # Architecture
//!
//! ```text
//!            RayProbe (host)
//!                 |
//!   HomePlacement x4 --> LegStepper x4 <-- GaitCoordinator
//!                 |            |
//!                 |       foot targets
//!                 |            v
//!                 |     AnalyticSolver x4 --> BoneChain x4
//!                 v
//!         BodyStabilizer --> body pose
//!                 ^
//!   SteeringController --> root pose
//! ```

pub mod builder;
pub mod headless;
pub mod rig;
pub mod stats;

#[cfg(feature = "bevy")]
pub mod plugin;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use builder::RigBuilder;
pub use headless::HeadlessRunner;
pub use rig::{Leg, LegGeometry, QuadrupedRig, TickReport};
pub use stats::RunStats;

#[cfg(feature = "bevy")]
pub use plugin::{GroundProbe, StriderSet, StriderSimPlugin, Walker, WalkerBone, WalkerTarget};
