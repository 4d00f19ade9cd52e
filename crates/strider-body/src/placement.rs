//! Ground probing for home anchors and the body.
//!
//! [`HomePlacement`] keeps a leg's home anchor glued to the ground below a
//! mount point that rides with the body. [`SurfaceFollower`] probes straight
//! down from the body itself for the single-ray ground mode.

use nalgebra::{Unit, Vector3};
use tracing::trace;

use strider_core::config::{PlacementConfig, StabilizerConfig};
use strider_core::math::DEGENERATE_EPSILON;
use strider_core::traits::RayProbe;
use strider_core::types::{Pose, RayHit};

// ---------------------------------------------------------------------------
// HomePlacement
// ---------------------------------------------------------------------------

/// Projects one leg's home anchor onto the ground.
#[derive(Debug, Clone, PartialEq)]
pub struct HomePlacement {
    /// Probe origin in body space.
    mount: Vector3<f32>,
    max_distance: f32,
    direction_offset: Vector3<f32>,
}

impl HomePlacement {
    #[must_use]
    pub fn new(mount: Vector3<f32>, config: &PlacementConfig) -> Self {
        Self {
            mount,
            max_distance: config.max_distance,
            direction_offset: Vector3::from(config.direction_offset),
        }
    }

    /// Probe origin in body space.
    pub const fn mount(&self) -> &Vector3<f32> {
        &self.mount
    }

    pub const fn max_distance(&self) -> f32 {
        self.max_distance
    }

    /// World-space probe origin for a body at `body`.
    #[must_use]
    pub fn origin(&self, body: &Pose) -> Vector3<f32> {
        body.transform_point(&self.mount)
    }

    /// Cast direction: against the body's up axis, bent by the offset.
    #[must_use]
    pub fn direction(&self, body: &Pose) -> Unit<Vector3<f32>> {
        let up = body.up();
        Unit::try_new(-(up + self.direction_offset), DEGENERATE_EPSILON)
            .unwrap_or_else(|| Unit::new_normalize(-up))
    }

    /// Cast from the mount and return the ray hit, if any.
    pub fn probe<P: RayProbe + ?Sized>(&self, body: &Pose, probe: &P) -> Option<RayHit> {
        probe.cast(&self.origin(body), &self.direction(body), self.max_distance)
    }

    /// New home anchor pose: the hit point with the body's rotation.
    ///
    /// Returns `None` when the probe misses; callers keep the old anchor.
    pub fn place<P: RayProbe + ?Sized>(&self, body: &Pose, probe: &P) -> Option<Pose> {
        let Some(hit) = self.probe(body, probe) else {
            trace!(probe = probe.name(), "home probe missed");
            return None;
        };
        Some(Pose::new(hit.point, body.orientation))
    }
}

// ---------------------------------------------------------------------------
// SurfaceFollower
// ---------------------------------------------------------------------------

/// Single downward probe below the body.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceFollower {
    max_distance: f32,
}

impl SurfaceFollower {
    #[must_use]
    pub fn new(config: &StabilizerConfig) -> Self {
        Self {
            max_distance: config.surface_probe_distance,
        }
    }

    /// Cast world-down from the body position.
    pub fn probe<P: RayProbe + ?Sized>(&self, body: &Pose, probe: &P) -> Option<RayHit> {
        let down = Unit::new_unchecked(-Vector3::y());
        probe.cast(&body.position, &down, self.max_distance)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
