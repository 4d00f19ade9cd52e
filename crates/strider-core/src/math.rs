//! Small geometric helpers shared by the IK, gait and body crates.
//!
//! Conventions: +Y is up, +Z is forward and +X is right. Rotations use
//! nalgebra's right-hand rule, so a positive yaw turns +Z toward +X.

use nalgebra::{Unit, UnitQuaternion, Vector3};

/// Vectors shorter than this are treated as zero length.
pub const DEGENERATE_EPSILON: f32 = 1e-6;

/// Blend factor for frame-rate independent exponential smoothing.
///
/// `lerp(current, target, smoothing_factor(rate, dt))` converges toward the
/// target at the same speed regardless of tick size and never overshoots it.
#[must_use]
pub fn smoothing_factor(rate: f32, dt: f32) -> f32 {
    1.0 - (-rate * dt).exp()
}

/// Exponentially smooth a scalar toward `target`.
#[must_use]
pub fn smooth_scalar(current: f32, target: f32, rate: f32, dt: f32) -> f32 {
    current + (target - current) * smoothing_factor(rate, dt)
}

/// Exponentially smooth a vector toward `target`.
#[must_use]
pub fn smooth_vector(
    current: &Vector3<f32>,
    target: &Vector3<f32>,
    rate: f32,
    dt: f32,
) -> Vector3<f32> {
    current.lerp(target, smoothing_factor(rate, dt))
}

/// Spherical interpolation that never panics on antipodal inputs.
///
/// Falls back to normalized linear interpolation when the two rotations are
/// (nearly) opposite.
#[must_use]
pub fn slerp_safe(
    from: &UnitQuaternion<f32>,
    to: &UnitQuaternion<f32>,
    t: f32,
) -> UnitQuaternion<f32> {
    from.try_slerp(to, t, DEGENERATE_EPSILON)
        .unwrap_or_else(|| from.nlerp(to, t))
}

/// Cubic ease-in-out on `t`, clamped to `[0, 1]`.
///
/// Clamping means a tick that overshoots the step duration still lands on
/// exactly 1.0.
#[must_use]
pub fn ease_in_out_cubic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        let u = -2.0 * t + 2.0;
        1.0 - u * u * u / 2.0
    }
}

/// Quadratic Bezier as two nested linear interpolations.
#[must_use]
pub fn quadratic_bezier(
    start: &Vector3<f32>,
    control: &Vector3<f32>,
    end: &Vector3<f32>,
    t: f32,
) -> Vector3<f32> {
    let a = start.lerp(control, t);
    let b = control.lerp(end, t);
    a.lerp(&b, t)
}

/// Remove the component of `v` along `normal`.
///
/// A zero normal leaves `v` unchanged.
#[must_use]
pub fn project_on_plane(v: &Vector3<f32>, normal: &Vector3<f32>) -> Vector3<f32> {
    let norm_sq = normal.norm_squared();
    if norm_sq < DEGENERATE_EPSILON * DEGENERATE_EPSILON {
        return *v;
    }
    v - normal * (v.dot(normal) / norm_sq)
}

/// Signed angle in radians from `from` to `to` around `axis`.
///
/// The magnitude is the unsigned angle between the two vectors; the sign is
/// positive when the rotation from `from` to `to` is right-handed about
/// `axis`. Returns 0 if either vector is degenerate.
#[must_use]
pub fn signed_angle(from: &Vector3<f32>, to: &Vector3<f32>, axis: &Vector3<f32>) -> f32 {
    if from.norm() < DEGENERATE_EPSILON || to.norm() < DEGENERATE_EPSILON {
        return 0.0;
    }
    let unsigned = from.angle(to);
    if axis.dot(&from.cross(to)) < 0.0 {
        -unsigned
    } else {
        unsigned
    }
}

/// Rotation whose local +Z faces `forward` and whose local +Y leans toward `up`.
///
/// Returns `None` when `forward` is shorter than `min_length`. When `up` is
/// parallel to `forward` the up-reference is undefined and the shortest-arc
/// rotation from +Z is used instead.
#[must_use]
pub fn look_rotation(
    forward: &Vector3<f32>,
    up: &Vector3<f32>,
    min_length: f32,
) -> Option<UnitQuaternion<f32>> {
    if forward.norm() < min_length.max(DEGENERATE_EPSILON) {
        return None;
    }
    if up.cross(forward).norm() < DEGENERATE_EPSILON * forward.norm().max(1.0) {
        return Some(shortest_arc(&Vector3::z(), forward));
    }
    Some(UnitQuaternion::face_towards(forward, up))
}

/// Shortest-arc rotation taking `from` onto `to`, including the opposite case.
#[must_use]
pub fn shortest_arc(from: &Vector3<f32>, to: &Vector3<f32>) -> UnitQuaternion<f32> {
    UnitQuaternion::rotation_between(from, to).unwrap_or_else(|| {
        // Opposite vectors: any axis perpendicular to `from` works.
        let fallback = if from.x.abs() < 0.9 {
            Vector3::x()
        } else {
            Vector3::y()
        };
        let axis = Unit::new_normalize(from.cross(&fallback));
        UnitQuaternion::from_axis_angle(&axis, std::f32::consts::PI)
    })
}

/// Rotation from Euler angles in degrees, applied Z first, then X, then Y.
///
/// This is the convention modeling tools use for bone axis corrections.
#[must_use]
pub fn euler_offset_degrees(x: f32, y: f32, z: f32) -> UnitQuaternion<f32> {
    let rx = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), x.to_radians());
    let ry = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), y.to_radians());
    let rz = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), z.to_radians());
    ry * rx * rz
}

/// World-space yaw rotation (about +Y) by `angle` radians.
#[must_use]
pub fn yaw(angle: f32) -> UnitQuaternion<f32> {
    UnitQuaternion::from_axis_angle(&Vector3::y_axis(), angle)
}

/// Yaw angle of `rotation`'s forward axis projected on the ground plane.
#[must_use]
pub fn heading_of(rotation: &UnitQuaternion<f32>) -> f32 {
    let forward = rotation * Vector3::z();
    forward.x.atan2(forward.z)
}
