//! Pursuit steering for the body root.
//!
//! Turns the root to face a target and walks it into a comfortable distance
//! band: approach when too far, back off when too close, stand still in
//! between. Turn rate and ground velocity both ease toward their targets with
//! the exponential smoothing law, so starts and stops are gradual.

use std::f32::consts::FRAC_PI_2;

use nalgebra::Vector3;
use tracing::trace;

use strider_core::config::SteeringConfig;
use strider_core::math::{DEGENERATE_EPSILON, project_on_plane, signed_angle, smooth_scalar, smooth_vector, yaw};
use strider_core::types::Pose;

/// Per-tick steering diagnostics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SteeringOutput {
    /// Signed yaw from the root's forward axis to the target (radians).
    pub yaw_error: f32,
    /// Straight-line distance from root to target.
    pub distance: f32,
    /// Turn rate the controller is easing toward (radians per second).
    pub target_angular_velocity: f32,
    /// Ground velocity the controller is easing toward.
    pub target_velocity: Vector3<f32>,
}

/// Smoothed turn-and-walk controller.
#[derive(Debug, Clone)]
pub struct SteeringController {
    config: SteeringConfig,
    angular_velocity: f32,
    velocity: Vector3<f32>,
}

impl SteeringController {
    #[must_use]
    pub fn new(config: SteeringConfig) -> Self {
        Self {
            config,
            angular_velocity: 0.0,
            velocity: Vector3::zeros(),
        }
    }

    pub const fn config(&self) -> &SteeringConfig {
        &self.config
    }

    /// Current yaw rate (radians per second, positive turns right).
    pub const fn angular_velocity(&self) -> f32 {
        self.angular_velocity
    }

    /// Current world-space ground velocity.
    pub const fn velocity(&self) -> &Vector3<f32> {
        &self.velocity
    }

    /// Steer `root` toward `target` for one tick of `dt` seconds.
    pub fn update(&mut self, root: &mut Pose, target: &Vector3<f32>, dt: f32) -> SteeringOutput {
        let up = root.up();
        let toward = target - root.position;
        let toward_flat = project_on_plane(&toward, &up);
        let yaw_error = signed_angle(&root.forward(), &toward_flat, &up);

        let target_angular_velocity = if yaw_error.abs() > self.config.angle_deadband() {
            self.config.turn_speed().copysign(yaw_error)
        } else {
            0.0
        };
        self.angular_velocity = smooth_scalar(
            self.angular_velocity,
            target_angular_velocity,
            self.config.turn_acceleration,
            dt,
        );
        root.set_orientation(yaw(self.angular_velocity * dt) * root.orientation);

        let distance = toward.norm();
        let heading = toward_flat.try_normalize(DEGENERATE_EPSILON).unwrap_or_else(Vector3::zeros);
        let target_velocity = if yaw_error.abs() < FRAC_PI_2 {
            if distance > self.config.max_distance {
                heading * self.config.move_speed
            } else if distance < self.config.min_distance {
                -heading * self.config.move_speed
            } else {
                Vector3::zeros()
            }
        } else {
            Vector3::zeros()
        };
        self.velocity = smooth_vector(&self.velocity, &target_velocity, self.config.move_acceleration, dt);
        root.position += self.velocity * dt;

        trace!(yaw_error, distance, speed = self.velocity.norm(), "steering");

        SteeringOutput {
            yaw_error,
            distance,
            target_angular_velocity,
            target_velocity,
        }
    }

    /// Let both velocities decay toward zero without a target.
    pub fn coast(&mut self, root: &mut Pose, dt: f32) {
        self.angular_velocity =
            smooth_scalar(self.angular_velocity, 0.0, self.config.turn_acceleration, dt);
        root.set_orientation(yaw(self.angular_velocity * dt) * root.orientation);
        self.velocity = smooth_vector(&self.velocity, &Vector3::zeros(), self.config.move_acceleration, dt);
        root.position += self.velocity * dt;
    }

    /// Stop immediately.
    pub fn reset(&mut self) {
        self.angular_velocity = 0.0;
        self.velocity = Vector3::zeros();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
