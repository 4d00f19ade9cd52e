//! Body height and tilt from the ground under the feet.
//!
//! Each tick the stabilizer estimates the ground plane (from the four home
//! anchors, or from a single probe below the body), derives a target body
//! pose from it and eases the body toward that pose with frame-rate
//! independent exponential smoothing.

use nalgebra::{UnitQuaternion, Vector3};
use tracing::trace;

use strider_core::config::StabilizerConfig;
use strider_core::math::{DEGENERATE_EPSILON, shortest_arc, slerp_safe, smooth_vector, smoothing_factor};
use strider_core::types::{LegId, Pose, RayHit};

/// Un-normalized sum of the four triangle normals spanned by `a, b, c, d`.
///
/// The winding of the points decides the sign: feed them around the quad
/// (front-left, front-right, back-right, back-left) for an upward normal
/// under the +Y up, +Z forward, +X right convention.
#[must_use]
pub fn quad_normal_sum(
    a: &Vector3<f32>,
    b: &Vector3<f32>,
    c: &Vector3<f32>,
    d: &Vector3<f32>,
) -> Vector3<f32> {
    let abc = (b - a).cross(&(c - a));
    let abd = (b - a).cross(&(d - a));
    let acd = (c - a).cross(&(d - a));
    let bcd = (c - b).cross(&(d - b));
    abc + abd + acd + bcd
}

/// Unit ground normal through four anchors indexed by [`LegId`].
///
/// Returns `None` only when the normal sum vanishes (coincident or collinear
/// anchors); any non-zero sum is normalized, however small the footprint.
#[must_use]
pub fn anchor_plane_normal(anchors: &[Vector3<f32>; 4]) -> Option<Vector3<f32>> {
    let fl = &anchors[LegId::FrontLeft.index()];
    let fr = &anchors[LegId::FrontRight.index()];
    let bl = &anchors[LegId::BackLeft.index()];
    let br = &anchors[LegId::BackRight.index()];
    let sum = quad_normal_sum(fl, fr, br, bl);
    let norm = sum.norm();
    (norm.is_finite() && norm > f32::MIN_POSITIVE).then(|| sum / norm)
}

/// Mean height of the anchors.
#[must_use]
pub fn mean_anchor_height(anchors: &[Vector3<f32>; 4]) -> f32 {
    anchors.iter().map(|a| a.y).sum::<f32>() / 4.0
}

/// Where the body should be this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyTarget {
    pub position: Vector3<f32>,
    pub orientation: UnitQuaternion<f32>,
    /// Ground normal the orientation was aligned to.
    pub normal: Vector3<f32>,
    /// The estimate was degenerate and the previous normal was reused.
    pub reused_normal: bool,
}

/// Smooths the body toward the ground estimate.
#[derive(Debug, Clone)]
pub struct BodyStabilizer {
    config: StabilizerConfig,
    normal: Vector3<f32>,
}

impl BodyStabilizer {
    #[must_use]
    pub fn new(config: StabilizerConfig) -> Self {
        Self {
            config,
            normal: Vector3::y(),
        }
    }

    pub const fn config(&self) -> &StabilizerConfig {
        &self.config
    }

    /// Last ground normal used.
    pub const fn normal(&self) -> &Vector3<f32> {
        &self.normal
    }

    /// Target from the four home anchors.
    ///
    /// The body keeps its horizontal position and rises to the mean anchor
    /// height plus the configured clearance. Its orientation is `heading`
    /// tilted so local up matches the anchor-plane normal.
    pub fn target_from_anchors(
        &mut self,
        body: &Pose,
        heading: &UnitQuaternion<f32>,
        anchors: &[Vector3<f32>; 4],
    ) -> BodyTarget {
        let reused_normal = match anchor_plane_normal(anchors) {
            Some(normal) => {
                self.normal = normal;
                false
            }
            None => {
                trace!("anchor plane degenerate; keeping previous normal");
                true
            }
        };

        let mut position = body.position;
        position.y = mean_anchor_height(anchors) + self.config.clearance;

        BodyTarget {
            position,
            orientation: shortest_arc(&Vector3::y(), &self.normal) * heading,
            normal: self.normal,
            reused_normal,
        }
    }

    /// Target from a single ground probe below the body.
    ///
    /// Returns `None` without a hit; the body is then left alone this tick.
    pub fn target_from_surface(
        &mut self,
        heading: &UnitQuaternion<f32>,
        hit: Option<&RayHit>,
    ) -> Option<BodyTarget> {
        let Some(hit) = hit else {
            trace!("no surface below body; skipping alignment");
            return None;
        };
        let normal = hit.normal.try_normalize(DEGENERATE_EPSILON)?;
        self.normal = normal;
        Some(BodyTarget {
            position: hit.point + Vector3::y() * self.config.surface_body_height,
            orientation: shortest_arc(&Vector3::y(), &normal) * heading,
            normal,
            reused_normal: false,
        })
    }

    /// Ease `body` toward `target` over `dt` seconds.
    pub fn apply(&self, body: &mut Pose, target: &BodyTarget, dt: f32) {
        body.position = smooth_vector(&body.position, &target.position, self.config.position_rate, dt);
        let t = smoothing_factor(self.config.rotation_rate, dt);
        body.set_orientation(slerp_safe(&body.orientation, &target.orientation, t));
    }

    /// Anchor-plane target followed by [`apply`](Self::apply).
    pub fn stabilize(
        &mut self,
        body: &mut Pose,
        heading: &UnitQuaternion<f32>,
        anchors: &[Vector3<f32>; 4],
        dt: f32,
    ) -> BodyTarget {
        let target = self.target_from_anchors(body, heading, anchors);
        self.apply(body, &target, dt);
        target
    }

    /// Forget the remembered normal.
    pub fn reset(&mut self) {
        self.normal = Vector3::y();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use strider_core::math::yaw;
    use strider_test_utils::{level_anchors, square_anchors};


    #[test]
    fn level_anchors_give_up_normal() {
        let normal = anchor_plane_normal(&level_anchors(0.0)).unwrap();
        assert_relative_eq!(normal, Vector3::y(), epsilon = 1e-6);
    }

    #[test]
    fn quad_sum_matches_hand_computation() {
        let [fl, fr, bl, br] = level_anchors(0.0);
        // Every triangle of the 2x2 square has area-weighted normal (0, 4, 0).
        assert_relative_eq!(quad_normal_sum(&fl, &fr, &br, &bl), Vector3::new(0.0, 16.0, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn tiny_footprint_still_has_a_normal() {
        // A 0.2 mm square: the normal sum is about 1.6e-7.
        let normal = anchor_plane_normal(&square_anchors(1e-4, 3.0)).unwrap();
        assert_relative_eq!(normal, Vector3::y(), epsilon = 1e-5);
        assert!(anchor_plane_normal(&square_anchors(0.0, 3.0)).is_none());
    }

    #[test]
    fn raising_front_anchors_tilts_normal_backward() {
        let mut anchors = level_anchors(0.0);
        anchors[LegId::FrontLeft.index()].y = 0.5;
        anchors[LegId::FrontRight.index()].y = 0.5;
        let normal = anchor_plane_normal(&anchors).unwrap();
        assert!(normal.y > 0.0);
        assert!(normal.z < 0.0, "uphill ahead should tip the normal back, got {normal:?}");
        assert_relative_eq!(normal.x, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn raising_one_anchor_tilts_normal() {
        let mut anchors = level_anchors(0.0);
        anchors[LegId::BackRight.index()].y = 0.4;
        let normal = anchor_plane_normal(&anchors).unwrap();
        assert!(normal.angle(&Vector3::y()) > 0.05);
        // Higher on the right and at the back: normal leans left and forward.
        assert!(normal.x < 0.0);
        assert!(normal.z > 0.0);
    }

    #[test]
    fn coincident_anchors_keep_previous_normal() {
        let mut stabilizer = BodyStabilizer::new(StabilizerConfig::default());
        let mut tilted = level_anchors(0.0);
        tilted[LegId::FrontLeft.index()].y = 0.5;
        let first = stabilizer.target_from_anchors(&Pose::identity(), &UnitQuaternion::identity(), &tilted);
        assert!(!first.reused_normal);

        let collapsed = [Vector3::new(0.3, 0.0, 0.3); 4];
        let second = stabilizer.target_from_anchors(&Pose::identity(), &UnitQuaternion::identity(), &collapsed);
        assert!(second.reused_normal);
        assert_relative_eq!(second.normal, first.normal);
        assert!(second.normal.iter().all(|c| c.is_finite()));
    }

    #[test]
    fn target_height_is_mean_plus_clearance() {
        let mut stabilizer = BodyStabilizer::new(StabilizerConfig {
            clearance: 0.1,
            ..StabilizerConfig::default()
        });
        let mut anchors = level_anchors(1.0);
        anchors[0].y = 2.0;
        let body = Pose::from_position(Vector3::new(4.0, 9.0, -2.0));
        let target = stabilizer.target_from_anchors(&body, &UnitQuaternion::identity(), &anchors);
        assert_relative_eq!(target.position, Vector3::new(4.0, 1.35, -2.0), epsilon = 1e-6);
    }

    #[test]
    fn orientation_keeps_heading_on_level_ground() {
        let mut stabilizer = BodyStabilizer::new(StabilizerConfig::default());
        let heading = yaw(0.8);
        let target = stabilizer.target_from_anchors(&Pose::identity(), &heading, &level_anchors(0.0));
        assert_relative_eq!(target.orientation, heading, epsilon = 1e-6);
    }

    #[test]
    fn stabilize_converges_without_overshoot() {
        let mut stabilizer = BodyStabilizer::new(StabilizerConfig {
            clearance: 0.5,
            ..StabilizerConfig::default()
        });
        let anchors = level_anchors(0.0);
        let mut body = Pose::from_position(Vector3::new(0.0, 3.0, 0.0));
        let mut last_gap = f32::INFINITY;
        for _ in 0..600 {
            stabilizer.stabilize(&mut body, &UnitQuaternion::identity(), &anchors, 1.0 / 60.0);
            let gap = body.position.y - 0.5;
            assert!(gap > -1e-5, "body sank below target: {gap}");
            assert!(gap <= last_gap + 1e-6);
            last_gap = gap;
        }
        assert_relative_eq!(body.position.y, 0.5, epsilon = 1e-3);
    }

    #[test]
    fn orientation_eases_toward_slope() {
        let mut stabilizer = BodyStabilizer::new(StabilizerConfig::default());
        let mut anchors = level_anchors(0.0);
        anchors[LegId::FrontLeft.index()].y = 0.6;
        anchors[LegId::FrontRight.index()].y = 0.6;
        let mut body = Pose::identity();
        let target = stabilizer.stabilize(&mut body, &UnitQuaternion::identity(), &anchors, 0.02);
        let full = body.orientation.angle_to(&target.orientation);
        assert!(full > 0.0);
        for _ in 0..500 {
            stabilizer.stabilize(&mut body, &UnitQuaternion::identity(), &anchors, 0.02);
        }
        assert_relative_eq!(body.up(), target.normal, epsilon = 1e-3);
    }

    #[test]
    fn surface_target_sits_above_hit() {
        let mut stabilizer = BodyStabilizer::new(StabilizerConfig {
            surface_body_height: 0.8,
            ..StabilizerConfig::default()
        });
        let hit = RayHit {
            point: Vector3::new(1.0, 0.2, 3.0),
            normal: Vector3::y(),
            distance: 0.5,
        };
        let target = stabilizer.target_from_surface(&UnitQuaternion::identity(), Some(&hit)).unwrap();
        assert_relative_eq!(target.position, Vector3::new(1.0, 1.0, 3.0), epsilon = 1e-6);
        assert!(stabilizer.target_from_surface(&UnitQuaternion::identity(), None).is_none());
    }
}
