//! Pose and facial sample data model.
//!
//! Frames are plain values: `Clone` is a full deep copy and equality is
//! structural. `reset()` returns an instance to its zeroed state without
//! giving up its allocations so it can be reused through [`crate::pool::Pool`].

use serde::{Deserialize, Serialize};

use crate::host::HumanPose;
use crate::math::{Quat, Transform, Vec3, QUAT_IDENTITY, VEC3_ZERO};
use crate::pool::Poolable;

/// One humanoid bone's local transform at one frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoneSample {
    /// Slash-separated path relative to the avatar root (e.g. "Hips/Spine/Chest").
    pub name: String,
    pub local_position: Vec3,
    pub local_rotation: Quat,
}

impl BoneSample {
    pub fn new(name: impl Into<String>, local: Transform) -> Self {
        Self {
            name: name.into(),
            local_position: local.position,
            local_rotation: local.rotation,
        }
    }

    pub fn local(&self) -> Transform {
        Transform::new(self.local_position, self.local_rotation)
    }
}

/// One time-sampled full-body pose.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PoseFrame {
    pub frame_index: u32,
    /// Seconds since recording start (not wall clock).
    pub time: f32,
    pub body_root_position: Vec3,
    pub body_root_rotation: Quat,
    pub body_position: Vec3,
    pub body_rotation: Quat,
    pub left_foot_ik_position: Vec3,
    pub left_foot_ik_rotation: Quat,
    pub right_foot_ik_position: Vec3,
    pub right_foot_ik_rotation: Quat,
    /// Normalized muscle values in the host's canonical muscle order.
    pub muscles: Vec<f32>,
    /// Bone samples in skeleton walk order.
    pub bones: Vec<BoneSample>,
}

impl Default for PoseFrame {
    fn default() -> Self {
        Self {
            frame_index: 0,
            time: 0.0,
            body_root_position: VEC3_ZERO,
            body_root_rotation: QUAT_IDENTITY,
            body_position: VEC3_ZERO,
            body_rotation: QUAT_IDENTITY,
            left_foot_ik_position: VEC3_ZERO,
            left_foot_ik_rotation: QUAT_IDENTITY,
            right_foot_ik_position: VEC3_ZERO,
            right_foot_ik_rotation: QUAT_IDENTITY,
            muscles: Vec::new(),
            bones: Vec::new(),
        }
    }
}

impl PoseFrame {
    /// Zeroed frame with `count` muscle slots.
    pub fn with_muscle_count(count: usize) -> Self {
        Self {
            muscles: vec![0.0; count],
            ..Self::default()
        }
    }

    /// True for the "nothing captured" sentinel: no muscles and no bones.
    pub fn is_empty(&self) -> bool {
        self.muscles.is_empty() && self.bones.is_empty()
    }

    /// Zero every field in place; allocations are kept.
    pub fn reset(&mut self) {
        self.frame_index = 0;
        self.time = 0.0;
        self.body_root_position = VEC3_ZERO;
        self.body_root_rotation = QUAT_IDENTITY;
        self.body_position = VEC3_ZERO;
        self.body_rotation = QUAT_IDENTITY;
        self.left_foot_ik_position = VEC3_ZERO;
        self.left_foot_ik_rotation = QUAT_IDENTITY;
        self.right_foot_ik_position = VEC3_ZERO;
        self.right_foot_ik_rotation = QUAT_IDENTITY;
        self.muscles.clear();
        self.bones.clear();
    }

    pub fn body_root(&self) -> Transform {
        Transform::new(self.body_root_position, self.body_root_rotation)
    }

    pub fn set_body_root(&mut self, t: Transform) {
        self.body_root_position = t.position;
        self.body_root_rotation = t.rotation;
    }

    pub fn body(&self) -> Transform {
        Transform::new(self.body_position, self.body_rotation)
    }

    pub fn left_foot_ik(&self) -> Transform {
        Transform::new(self.left_foot_ik_position, self.left_foot_ik_rotation)
    }

    pub fn set_left_foot_ik(&mut self, t: Transform) {
        self.left_foot_ik_position = t.position;
        self.left_foot_ik_rotation = t.rotation;
    }

    pub fn right_foot_ik(&self) -> Transform {
        Transform::new(self.right_foot_ik_position, self.right_foot_ik_rotation)
    }

    pub fn set_right_foot_ik(&mut self, t: Transform) {
        self.right_foot_ik_position = t.position;
        self.right_foot_ik_rotation = t.rotation;
    }

    /// Copy a pose-handler sample into this frame (muscles are copied, not moved).
    pub fn set_human_pose(&mut self, pose: &HumanPose) {
        self.muscles.clear();
        self.muscles.extend_from_slice(&pose.muscles);
        self.body_position = pose.body_position;
        self.body_rotation = pose.body_rotation;
    }

    /// Payload pushed back into the pose handler during playback.
    pub fn human_pose(&self) -> HumanPose {
        HumanPose {
            muscles: self.muscles.clone(),
            body_position: self.body_position,
            body_rotation: self.body_rotation,
        }
    }
}

impl Poolable for PoseFrame {
    fn reset(&mut self) {
        PoseFrame::reset(self);
    }
}

/// Blend-shape weights of one skinned mesh (0..100 scale).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeshBlendShapes {
    pub mesh_path: String,
    pub weights: Vec<f32>,
}

impl MeshBlendShapes {
    pub fn new(mesh_path: impl Into<String>, weights: Vec<f32>) -> Self {
        Self {
            mesh_path: mesh_path.into(),
            weights,
        }
    }
}

/// One time-sampled set of facial blend-shape weights.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FacialFrame {
    pub frame_index: u32,
    pub time: f32,
    pub meshes: Vec<MeshBlendShapes>,
}

impl FacialFrame {
    pub fn reset(&mut self) {
        self.frame_index = 0;
        self.time = 0.0;
        self.meshes.clear();
    }

    /// True when both frames have the same meshes and every weight is within `tolerance`.
    pub fn approx_eq(&self, other: &FacialFrame, tolerance: f32) -> bool {
        self.meshes.len() == other.meshes.len()
            && self.meshes.iter().zip(&other.meshes).all(|(a, b)| {
                a.mesh_path == b.mesh_path
                    && a.weights.len() == b.weights.len()
                    && a
                        .weights
                        .iter()
                        .zip(&b.weights)
                        .all(|(x, y)| (x - y).abs() <= tolerance)
            })
    }
}

impl Poolable for FacialFrame {
    fn reset(&mut self) {
        FacialFrame::reset(self);
    }
}
