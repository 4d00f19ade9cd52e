//! Rig builder for assembling a ready-to-tick [`QuadrupedRig`].
//!
//! [`RigBuilder`] provides a fluent API over a [`LocomotionConfig`]: start
//! pose, pursuit target, per-leg geometry overrides and bone corrections.
//! [`build`](RigBuilder::build) validates the configuration, drops every
//! home anchor onto the ground through the supplied probe and poses the legs.
//!
//! # Example
//!
//! ```no_run
//! use nalgebra::{Unit, Vector3};
//! use strider_core::{RayHit, RayProbe};
//! use strider_sim::RigBuilder;
//!
//! struct Floor;
//!
//! impl RayProbe for Floor {
//!     fn cast(&self, origin: &Vector3<f32>, dir: &Unit<Vector3<f32>>, max: f32) -> Option<RayHit> {
//!         let distance = origin.y / -dir.y;
//!         (dir.y < 0.0 && distance <= max).then(|| RayHit {
//!             point: origin + dir.into_inner() * distance,
//!             normal: Vector3::y(),
//!             distance,
//!         })
//!     }
//! }
//!
//! let mut rig = RigBuilder::new()
//!     .with_target(Vector3::new(0.0, 0.0, 8.0))
//!     .build(&Floor)
//!     .unwrap();
//! rig.tick(1.0 / 60.0, &Floor);
//! ```

use nalgebra::{UnitQuaternion, Vector3};
use tracing::{debug, info};

use strider_body::{BodyStabilizer, HomePlacement, SteeringController, SurfaceFollower};
use strider_core::config::{GroundMode, LocomotionConfig};
use strider_core::error::{RigError, StriderError};
use strider_core::math::{euler_offset_degrees, yaw};
use strider_core::traits::RayProbe;
use strider_core::types::{LegId, Pose};
use strider_gait::LegStepper;
use strider_ik::{AnalyticSolver, BONE_COUNT, BoneChain};

use crate::rig::{Leg, LegGeometry, QuadrupedRig, RigParts};

// ---------------------------------------------------------------------------
// RigBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for a [`QuadrupedRig`].
#[derive(Debug, Clone)]
pub struct RigBuilder {
    config: LocomotionConfig,
    position: Vector3<f32>,
    heading: f32,
    target: Option<Vector3<f32>>,
    geometry: Option<[LegGeometry; 4]>,
    angle_offsets: Option<[UnitQuaternion<f32>; BONE_COUNT]>,
}

impl Default for RigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RigBuilder {
    /// Builder with the default configuration, at the origin, facing +Z.
    #[must_use]
    pub fn new() -> Self {
        Self::from_config(LocomotionConfig::default())
    }

    #[must_use]
    pub fn from_config(config: LocomotionConfig) -> Self {
        Self {
            config,
            position: Vector3::zeros(),
            heading: 0.0,
            target: None,
            geometry: None,
            angle_offsets: None,
        }
    }

    /// Replace the configuration.
    #[must_use]
    pub fn with_config(mut self, config: LocomotionConfig) -> Self {
        self.config = config;
        self
    }

    /// Start position of the body. Its height only matters for the initial
    /// home probes; the body is settled onto the ground during the build.
    #[must_use]
    pub const fn with_position(mut self, position: Vector3<f32>) -> Self {
        self.position = position;
        self
    }

    /// Initial heading in radians (positive turns +Z toward +X).
    #[must_use]
    pub const fn with_heading(mut self, heading: f32) -> Self {
        self.heading = heading;
        self
    }

    #[must_use]
    pub const fn with_target(mut self, target: Vector3<f32>) -> Self {
        self.target = Some(target);
        self
    }

    /// Override the leg geometry derived from `config.layout`.
    #[must_use]
    pub const fn with_leg_geometry(mut self, geometry: [LegGeometry; 4]) -> Self {
        self.geometry = Some(geometry);
        self
    }

    /// Fixed per-bone corrections applied after every IK orientation.
    ///
    /// Takes precedence over `layout.bone_angle_offsets`.
    #[must_use]
    pub const fn with_angle_offsets(mut self, offsets: [UnitQuaternion<f32>; BONE_COUNT]) -> Self {
        self.angle_offsets = Some(offsets);
        self
    }

    pub const fn config(&self) -> &LocomotionConfig {
        &self.config
    }

    /// Validate, place every leg on the ground and assemble the rig.
    ///
    /// # Errors
    ///
    /// Returns [`StriderError::Config`] for an invalid configuration and
    /// [`StriderError::Rig`] when a chain cannot be built or a leg finds no
    /// ground below its probe mount.
    pub fn build<P: RayProbe + ?Sized>(&self, probe: &P) -> Result<QuadrupedRig, StriderError> {
        let config = &self.config;
        config.validate()?;

        let geometry = self
            .geometry
            .unwrap_or_else(|| LegGeometry::symmetric(&config.layout));
        let mut root = Pose::new(self.position, yaw(self.heading));
        let mut body = root;

        let placements = geometry.map(|leg| HomePlacement::new(leg.mount, &config.placement));
        let mut homes = [Pose::identity(); 4];
        for leg in LegId::ALL {
            let placement = &placements[leg.index()];
            homes[leg.index()] =
                placement
                    .place(&body, probe)
                    .ok_or(RigError::NoGroundBelow {
                        leg,
                        max_distance: placement.max_distance(),
                    })?;
        }

        // Settle the body onto the ground before the first tick.
        let mut stabilizer = BodyStabilizer::new(config.stabilizer.clone());
        let follower = SurfaceFollower::new(&config.stabilizer);
        let anchors = homes.map(|home| home.position);
        let settled = match config.stabilizer.ground_mode {
            GroundMode::AnchorPlane => {
                Some(stabilizer.target_from_anchors(&body, &root.orientation, &anchors))
            }
            GroundMode::SurfaceProbe => {
                let hit = follower.probe(&body, probe);
                stabilizer.target_from_surface(&root.orientation, hit.as_ref())
            }
        };
        if let Some(target) = settled {
            body = Pose::new(target.position, target.orientation);
        } else {
            debug!("no surface below the body at build time; leaving it unsettled");
        }
        root.position.y = body.position.y;

        // Chains are re-rooted on the body every tick, so one prototype serves all four.
        let offsets = self.angle_offsets.unwrap_or_else(|| {
            config
                .layout
                .bone_angle_offsets
                .map(|[x, y, z]| euler_offset_degrees(x, y, z))
        });
        let chain = BoneChain::from_segments(body.to_isometry(), config.layout.segment_lengths)?
            .with_angle_offsets(offsets);
        let legs = LegId::ALL.map(|leg| {
            let index = leg.index();
            Leg::new(leg, geometry[index], chain, placements[index].clone())
        });
        let steppers = LegId::ALL.map(|leg| LegStepper::new(leg, config.step.clone(), homes[leg.index()]));

        info!(
            position = ?body.position,
            heading = self.heading,
            mode = ?config.stabilizer.ground_mode,
            "rig built"
        );

        Ok(QuadrupedRig::from_parts(RigParts {
            root,
            body,
            legs,
            steppers,
            stabilizer,
            follower,
            steering: SteeringController::new(config.steering.clone()),
            solver: AnalyticSolver::new(config.ik.clone()),
            ground_mode: config.stabilizer.ground_mode,
            target: self.target,
        }))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
