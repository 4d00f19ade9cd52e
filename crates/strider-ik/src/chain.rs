//! Three-bone leg chain.
//!
//! A [`BoneChain`] is a tiny transform hierarchy: a root frame (where the leg
//! mounts on the body) followed by three bones, each with a rotation relative
//! to its parent and a fixed offset to its child joint. World-space joint
//! positions and rotations come from forward kinematics, so rotating a
//! proximal bone carries every distal bone with it.

use nalgebra::{Isometry3, UnitQuaternion, Vector3};

use strider_core::error::RigError;

/// Number of bones in a leg chain.
pub const BONE_COUNT: usize = 3;

/// A single bone in the chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bone {
    /// Rotation relative to the parent frame (root for the first bone).
    pub local_rotation: UnitQuaternion<f32>,
    /// Position of the child joint in this bone's frame.
    pub offset: Vector3<f32>,
    /// Fixed correction applied after every analytic orientation.
    ///
    /// Compensates for meshes whose bone axis is not local +Z.
    pub angle_offset: UnitQuaternion<f32>,
}

impl Bone {
    /// Straight bone of `length` along local +Z with no correction.
    #[must_use]
    pub fn straight(length: f32) -> Self {
        Self {
            local_rotation: UnitQuaternion::identity(),
            offset: Vector3::new(0.0, 0.0, length),
            angle_offset: UnitQuaternion::identity(),
        }
    }
}

/// Ordered hip → knee → ankle → foot chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoneChain {
    root: Isometry3<f32>,
    bones: [Bone; BONE_COUNT],
}

impl BoneChain {
    /// Build a chain from explicit bones.
    ///
    /// # Errors
    ///
    /// Returns [`RigError::NonFiniteBone`] if any offset is not finite and
    /// [`RigError::ZeroLengthChain`] if all offsets are zero.
    pub fn new(root: Isometry3<f32>, bones: [Bone; BONE_COUNT]) -> Result<Self, RigError> {
        for (i, bone) in bones.iter().enumerate() {
            if !bone.offset.iter().all(|c| c.is_finite()) {
                return Err(RigError::NonFiniteBone { bone: i });
            }
        }
        let chain = Self { root, bones };
        if chain.total_length() <= 0.0 {
            return Err(RigError::ZeroLengthChain);
        }
        Ok(chain)
    }

    /// Build a straight chain of the given segment lengths along the root's +Z.
    pub fn from_segments(root: Isometry3<f32>, lengths: [f32; BONE_COUNT]) -> Result<Self, RigError> {
        Self::new(root, lengths.map(Bone::straight))
    }

    /// Replace the per-bone angular corrections.
    #[must_use]
    pub fn with_angle_offsets(mut self, offsets: [UnitQuaternion<f32>; BONE_COUNT]) -> Self {
        for (bone, offset) in self.bones.iter_mut().zip(offsets) {
            bone.angle_offset = offset;
        }
        self
    }

    /// The chain's root frame in world space.
    pub const fn root(&self) -> &Isometry3<f32> {
        &self.root
    }

    /// Move the chain's root. Local bone rotations are kept.
    pub fn set_root(&mut self, root: Isometry3<f32>) {
        self.root = root;
    }

    /// Bone definitions, proximal first.
    pub const fn bones(&self) -> &[Bone; BONE_COUNT] {
        &self.bones
    }

    /// World-space rotation of every bone.
    #[must_use]
    pub fn world_rotations(&self) -> [UnitQuaternion<f32>; BONE_COUNT] {
        let r0 = self.root.rotation * self.bones[0].local_rotation;
        let r1 = r0 * self.bones[1].local_rotation;
        let r2 = r1 * self.bones[2].local_rotation;
        [r0, r1, r2]
    }

    /// World-space joint positions: hip, knee, ankle, then the end effector.
    #[must_use]
    pub fn joint_positions(&self) -> [Vector3<f32>; BONE_COUNT + 1] {
        let rotations = self.world_rotations();
        let p0 = self.root.translation.vector;
        let p1 = p0 + rotations[0] * self.bones[0].offset;
        let p2 = p1 + rotations[1] * self.bones[1].offset;
        let p3 = p2 + rotations[2] * self.bones[2].offset;
        [p0, p1, p2, p3]
    }

    /// World-space end effector position.
    #[must_use]
    pub fn end_effector(&self) -> Vector3<f32> {
        self.joint_positions()[BONE_COUNT]
    }

    /// Segment lengths measured from the current joint positions.
    #[must_use]
    pub fn bone_lengths(&self) -> [f32; BONE_COUNT] {
        let p = self.joint_positions();
        [(p[1] - p[0]).norm(), (p[2] - p[1]).norm(), (p[3] - p[2]).norm()]
    }

    /// Sum of the segment lengths.
    #[must_use]
    pub fn total_length(&self) -> f32 {
        self.bone_lengths().iter().sum()
    }

    /// Set bone `index`'s world rotation, keeping its children attached.
    ///
    /// # Panics
    ///
    /// Panics if `index >= BONE_COUNT`.
    pub fn set_world_rotation(&mut self, index: usize, rotation: UnitQuaternion<f32>) {
        let parent = if index == 0 {
            self.root.rotation
        } else {
            self.world_rotations()[index - 1]
        };
        let mut local = parent.inverse() * rotation;
        local.renormalize();
        self.bones[index].local_rotation = local;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
