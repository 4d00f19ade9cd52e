//! Bevy ECS plugin for driving rigs inside an engine.
//!
//! Provides [`StriderSimPlugin`], which ticks every [`Walker`] once per frame
//! with the frame's delta time and mirrors the result into `Transform`s:
//! the walker entity takes the body pose and any [`WalkerBone`] entity takes
//! its bone's world pose. Ground queries go through the [`GroundProbe`]
//! resource, which the host fills with whatever collision backend it uses.
//!
//! The systems run in [`StriderSet::Tick`] then [`StriderSet::Sync`].

use bevy::prelude::*;
use nalgebra::{Quaternion, UnitQuaternion, Vector3};

use strider_core::traits::RayProbe;
use strider_core::types::{LegId, Pose};
use strider_ik::BONE_COUNT;

use crate::rig::QuadrupedRig;
use crate::stats::RunStats;

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

#[must_use]
pub fn to_vec3(v: &Vector3<f32>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

#[must_use]
pub fn from_vec3(v: Vec3) -> Vector3<f32> {
    Vector3::new(v.x, v.y, v.z)
}

#[must_use]
pub fn to_quat(q: &UnitQuaternion<f32>) -> Quat {
    Quat::from_xyzw(q.i, q.j, q.k, q.w)
}

#[must_use]
pub fn from_quat(q: Quat) -> UnitQuaternion<f32> {
    UnitQuaternion::new_normalize(Quaternion::new(q.w, q.x, q.y, q.z))
}

/// Pose as a unit-scale transform.
#[must_use]
pub fn pose_to_transform(pose: &Pose) -> Transform {
    Transform::from_translation(to_vec3(&pose.position)).with_rotation(to_quat(&pose.orientation))
}

/// Translation and rotation of `transform`; scale is dropped.
#[must_use]
pub fn transform_to_pose(transform: &Transform) -> Pose {
    Pose::new(from_vec3(transform.translation), from_quat(transform.rotation))
}

// ---------------------------------------------------------------------------
// Components and resources
// ---------------------------------------------------------------------------

/// Ray queries for every walker in the world.
#[derive(Resource)]
pub struct GroundProbe(pub Box<dyn RayProbe + Send + Sync>);

impl GroundProbe {
    pub fn new(probe: impl RayProbe + Send + Sync + 'static) -> Self {
        Self(Box::new(probe))
    }
}

/// A rig ticked by [`StriderSimPlugin`]. The entity's `Transform` follows
/// the body.
#[derive(Component, Debug)]
pub struct Walker {
    pub rig: QuadrupedRig,
}

/// Makes a walker pursue another entity's translation.
#[derive(Component, Debug, Clone, Copy)]
pub struct WalkerTarget(pub Entity);

/// A top-level entity whose `Transform` mirrors one bone of a walker.
#[derive(Component, Debug, Clone, Copy)]
pub struct WalkerBone {
    pub walker: Entity,
    pub leg: LegId,
    /// Bone index, `0..BONE_COUNT`.
    pub bone: usize,
}

/// System ordering for the plugin.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum StriderSet {
    /// Advance every walker.
    Tick,
    /// Copy poses into bone transforms.
    Sync,
}

// ---------------------------------------------------------------------------
// StriderSimPlugin
// ---------------------------------------------------------------------------

/// Bevy plugin for procedural walkers.
///
/// Insert a [`GroundProbe`] resource and spawn entities with a [`Walker`]
/// component. Without a probe the walkers stand still. Add a [`RunStats`]
/// component to a walker to collect its statistics.
pub struct StriderSimPlugin;

impl Plugin for StriderSimPlugin {
    fn build(&self, app: &mut App) {
        app.configure_sets(Update, (StriderSet::Tick, StriderSet::Sync).chain())
            .add_systems(Update, walker_tick_system.in_set(StriderSet::Tick))
            .add_systems(Update, bone_sync_system.in_set(StriderSet::Sync));
    }
}

/// Tick every walker with the frame delta.
#[allow(clippy::needless_pass_by_value, clippy::type_complexity)]
pub fn walker_tick_system(
    time: Res<Time>,
    probe: Option<Res<GroundProbe>>,
    targets: Query<&Transform, Without<Walker>>,
    mut walkers: Query<(
        &mut Walker,
        &mut Transform,
        Option<&WalkerTarget>,
        Option<&mut RunStats>,
    )>,
) {
    let Some(probe) = probe else {
        return;
    };
    let dt = time.delta_secs();
    if dt <= 0.0 {
        return;
    }

    for (mut walker, mut transform, target, stats) in &mut walkers {
        if let Some(target) = target {
            let goal = targets.get(target.0).ok().map(|t| from_vec3(t.translation));
            walker.rig.set_target(goal);
        }
        let before = walker.rig.root().position;
        let report = walker.rig.tick(dt, probe.0.as_ref());
        if let Some(mut stats) = stats {
            stats.record(&before, &walker.rig, &report);
        }
        *transform = pose_to_transform(walker.rig.body());
    }
}

/// Copy world-space bone poses into [`WalkerBone`] transforms.
#[allow(clippy::needless_pass_by_value)]
pub fn bone_sync_system(
    walkers: Query<&Walker>,
    mut bones: Query<(&WalkerBone, &mut Transform), Without<Walker>>,
) {
    for (bone, mut transform) in &mut bones {
        if bone.bone >= BONE_COUNT {
            continue;
        }
        let Ok(walker) = walkers.get(bone.walker) else {
            continue;
        };
        let chain = walker.rig.leg(bone.leg).chain();
        transform.translation = to_vec3(&chain.joint_positions()[bone.bone]);
        transform.rotation = to_quat(&chain.world_rotations()[bone.bone]);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use approx::assert_relative_eq;
    use strider_test_utils::mocks::FlatGround;

    use crate::builder::RigBuilder;

    fn app() -> App {
        let mut app = App::new();
        app.init_resource::<Time>();
        app.add_plugins(StriderSimPlugin);
        app.insert_resource(GroundProbe::new(FlatGround::new(0.0)));
        app
    }

    fn walker() -> Walker {
        Walker {
            rig: RigBuilder::new().build(&FlatGround::new(0.0)).unwrap(),
        }
    }

    fn frame(app: &mut App) {
        app.world_mut()
            .resource_mut::<Time>()
            .advance_by(Duration::from_millis(16));
        app.update();
    }

    #[test]
    fn pose_transform_conversion_is_lossless() {
        let pose = Pose::new(
            Vector3::new(1.0, -2.0, 3.5),
            UnitQuaternion::from_euler_angles(0.3, -0.2, 1.1),
        );
        let back = transform_to_pose(&pose_to_transform(&pose));
        assert_relative_eq!(back.position, pose.position);
        assert_relative_eq!(back.orientation, pose.orientation, epsilon = 1e-6);
    }

    #[test]
    fn plugin_ticks_walkers_and_records_stats() {
        let mut app = app();
        let entity = app
            .world_mut()
            .spawn((walker(), Transform::default(), RunStats::new()))
            .id();
        for _ in 0..5 {
            frame(&mut app);
        }
        let world = app.world();
        assert_eq!(world.get::<RunStats>(entity).unwrap().ticks, 5);
        let transform = world.get::<Transform>(entity).unwrap();
        assert!((transform.translation.y - 0.35).abs() < 1e-3);
    }

    #[test]
    fn walker_follows_target_entity() {
        let mut app = app();
        let target = app
            .world_mut()
            .spawn(Transform::from_xyz(0.0, 0.0, 10.0))
            .id();
        let entity = app
            .world_mut()
            .spawn((walker(), Transform::default(), WalkerTarget(target)))
            .id();
        for _ in 0..120 {
            frame(&mut app);
        }
        let walker = app.world().get::<Walker>(entity).unwrap();
        assert_eq!(walker.rig.target(), Some(&Vector3::new(0.0, 0.0, 10.0)));
        assert!(walker.rig.root().position.z > 0.5);
    }

    #[test]
    fn bones_mirror_the_chain() {
        let mut app = app();
        let entity = app
            .world_mut()
            .spawn((walker(), Transform::default()))
            .id();
        let bone = app
            .world_mut()
            .spawn((
                WalkerBone {
                    walker: entity,
                    leg: LegId::BackRight,
                    bone: 1,
                },
                Transform::default(),
            ))
            .id();
        frame(&mut app);
        let world = app.world();
        let knee = world.get::<Walker>(entity).unwrap().rig.leg(LegId::BackRight).chain().joint_positions()[1];
        let transform = world.get::<Transform>(bone).unwrap();
        assert_relative_eq!(from_vec3(transform.translation), knee);
    }

    #[test]
    fn missing_probe_leaves_walkers_alone() {
        let mut app = App::new();
        app.init_resource::<Time>();
        app.add_plugins(StriderSimPlugin);
        let entity = app
            .world_mut()
            .spawn((walker(), Transform::default(), RunStats::new()))
            .id();
        frame(&mut app);
        assert_eq!(app.world().get::<RunStats>(entity).unwrap().ticks, 0);
    }
}
