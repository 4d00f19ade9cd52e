//! Canned anchors and configurations.

use nalgebra::Vector3;
use strider_core::config::{LocomotionConfig, StepConfig};

/// Four anchors on a level 2 x 2 square at height `y`, indexed FL, FR, BL, BR.
#[must_use]
pub fn level_anchors(y: f32) -> [Vector3<f32>; 4] {
    square_anchors(1.0, y)
}

/// Four anchors on a level square of half-size `half` at height `y`,
/// indexed FL, FR, BL, BR (left is -X, front is +Z).
#[must_use]
pub fn square_anchors(half: f32, y: f32) -> [Vector3<f32>; 4] {
    [
        Vector3::new(-half, y, half),
        Vector3::new(half, y, half),
        Vector3::new(-half, y, -half),
        Vector3::new(half, y, -half),
    ]
}

/// Default configuration with quick, flat steps and no idle re-placement.
///
/// Steps take exactly 0.25 s so tick counts at `dt = 0.05` are exact.
#[must_use]
pub fn fast_config() -> LocomotionConfig {
    LocomotionConfig {
        step: StepConfig {
            move_duration: 0.25,
            overshoot_fraction: 0.0,
            rest_timer: 1_000.0,
            ..StepConfig::default()
        },
        ..LocomotionConfig::default()
    }
}
