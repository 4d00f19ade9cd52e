use std::fmt;

use nalgebra::{Isometry3, Point3, Translation3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// LegId
// ---------------------------------------------------------------------------

/// Identifies one of the four legs of a quadruped.
///
/// The discriminant is the index used by every per-leg array in the
/// workspace: `[FL, FR, BL, BR]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegId {
    FrontLeft = 0,
    FrontRight = 1,
    BackLeft = 2,
    BackRight = 3,
}

impl LegId {
    /// All legs in index order.
    pub const ALL: [Self; 4] = [
        Self::FrontLeft,
        Self::FrontRight,
        Self::BackLeft,
        Self::BackRight,
    ];

    /// Array index of this leg.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// The leg diagonally opposite this one.
    #[must_use]
    pub const fn diagonal(self) -> Self {
        match self {
            Self::FrontLeft => Self::BackRight,
            Self::FrontRight => Self::BackLeft,
            Self::BackLeft => Self::FrontRight,
            Self::BackRight => Self::FrontLeft,
        }
    }

    #[must_use]
    pub const fn is_front(self) -> bool {
        matches!(self, Self::FrontLeft | Self::FrontRight)
    }

    #[must_use]
    pub const fn is_left(self) -> bool {
        matches!(self, Self::FrontLeft | Self::BackLeft)
    }
}

impl fmt::Display for LegId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::FrontLeft => "front-left",
            Self::FrontRight => "front-right",
            Self::BackLeft => "back-left",
            Self::BackRight => "back-right",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Pose
// ---------------------------------------------------------------------------

/// A world-space position and orientation.
///
/// Used for the body, the body root, leg anchors and foot targets. The
/// orientation is renormalized on every write through [`Pose::set_orientation`]
/// and [`Pose::new`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vector3<f32>,
    pub orientation: UnitQuaternion<f32>,
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

impl Pose {
    /// Pose at the origin with no rotation.
    #[must_use]
    pub fn identity() -> Self {
        Self::from_position(Vector3::zeros())
    }

    /// Create a pose, renormalizing the orientation.
    #[must_use]
    pub fn new(position: Vector3<f32>, orientation: UnitQuaternion<f32>) -> Self {
        let mut pose = Self {
            position,
            orientation,
        };
        pose.orientation.renormalize();
        pose
    }

    /// Pose at `position` with identity orientation.
    #[must_use]
    pub fn from_position(position: Vector3<f32>) -> Self {
        Self {
            position,
            orientation: UnitQuaternion::identity(),
        }
    }

    /// Replace the orientation, renormalizing it.
    pub fn set_orientation(&mut self, orientation: UnitQuaternion<f32>) {
        self.orientation = orientation;
        self.orientation.renormalize();
    }

    /// Local +Y axis in world space.
    #[must_use]
    pub fn up(&self) -> Vector3<f32> {
        self.orientation * Vector3::y()
    }

    /// Local +Z axis in world space.
    #[must_use]
    pub fn forward(&self) -> Vector3<f32> {
        self.orientation * Vector3::z()
    }

    /// Local +X axis in world space.
    #[must_use]
    pub fn right(&self) -> Vector3<f32> {
        self.orientation * Vector3::x()
    }

    /// Transform a point from this pose's local frame into world space.
    #[must_use]
    pub fn transform_point(&self, local: &Vector3<f32>) -> Vector3<f32> {
        self.position + self.orientation * local
    }

    /// As an isometry.
    #[must_use]
    pub fn to_isometry(&self) -> Isometry3<f32> {
        Isometry3::from_parts(Translation3::from(self.position), self.orientation)
    }

    /// From an isometry.
    #[must_use]
    pub fn from_isometry(iso: &Isometry3<f32>) -> Self {
        Self::new(iso.translation.vector, iso.rotation)
    }

    /// Position as a point.
    #[must_use]
    pub fn point(&self) -> Point3<f32> {
        Point3::from(self.position)
    }
}

// ---------------------------------------------------------------------------
// RayHit
// ---------------------------------------------------------------------------

/// Result of a successful ray probe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// World-space contact point.
    pub point: Vector3<f32>,
    /// Surface normal at the contact point (unit length).
    pub normal: Vector3<f32>,
    /// Distance from the ray origin to the contact point.
    pub distance: f32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn leg_indices_match_array_order() {
        for (i, leg) in LegId::ALL.iter().enumerate() {
            assert_eq!(leg.index(), i);
        }
    }

    #[test]
    fn diagonals_are_symmetric() {
        for leg in LegId::ALL {
            assert_eq!(leg.diagonal().diagonal(), leg);
            assert_ne!(leg.is_front(), leg.diagonal().is_front());
            assert_ne!(leg.is_left(), leg.diagonal().is_left());
        }
    }

    #[test]
    fn pose_axes_follow_orientation() {
        let yaw = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), std::f32::consts::FRAC_PI_2);
        let pose = Pose::new(Vector3::new(1.0, 2.0, 3.0), yaw);
        assert_relative_eq!(pose.forward(), Vector3::x(), epsilon = 1e-6);
        assert_relative_eq!(pose.up(), Vector3::y(), epsilon = 1e-6);
        assert_relative_eq!(
            pose.transform_point(&Vector3::z()),
            Vector3::new(2.0, 2.0, 3.0),
            epsilon = 1e-6
        );
    }

    #[test]
    fn default_pose_is_identity() {
        assert_relative_eq!(Pose::default().orientation, UnitQuaternion::identity());
        assert_eq!(Pose::default(), Pose::identity());
    }

    #[test]
    fn isometry_roundtrip_keeps_pose() {
        let pose = Pose::new(
            Vector3::new(0.5, -1.0, 2.0),
            UnitQuaternion::from_euler_angles(0.1, 0.2, 0.3),
        );
        let back = Pose::from_isometry(&pose.to_isometry());
        assert_relative_eq!(back.position, pose.position, epsilon = 1e-6);
        assert_relative_eq!(back.orientation, pose.orientation, epsilon = 1e-6);
    }
}
