//! Body-level controllers: ground placement, pose stabilization and pursuit
//! steering.
//!
//! - [`HomePlacement`] probes the ground below each leg's mount and moves the
//!   leg's home anchor onto it; [`SurfaceFollower`] probes below the body.
//! - [`BodyStabilizer`] fits a plane through the four anchors and eases the
//!   body's height and tilt toward it.
//! - [`SteeringController`] turns and walks the body root toward a target,
//!   holding it inside a distance band.

pub mod placement;
pub mod stabilizer;
pub mod steering;

pub use placement::{HomePlacement, SurfaceFollower};
pub use stabilizer::{BodyStabilizer, BodyTarget, anchor_plane_normal, mean_anchor_height, quad_normal_sum};
pub use steering::{SteeringController, SteeringOutput};
