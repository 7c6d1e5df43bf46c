//! Host capability contracts.
//!
//! The host engine owns the avatar, the humanoid muscle solver and the IK
//! solver. The recorder and player only talk to it through these traits;
//! adapters implement them on top of the host's own types.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::error::PoseError;
use crate::math::{Quat, Transform, Vec3};

/// Opaque handle of one bone in the host skeleton.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct BoneId(pub u32);

/// Muscle-space pose as produced and consumed by the pose handler.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HumanPose {
    pub muscles: Vec<f32>,
    pub body_position: Vec3,
    pub body_rotation: Quat,
}

/// End effectors the recorder solves IK goals for.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum IkGoal {
    LeftFoot,
    RightFoot,
}

/// Humanoid muscle <-> transform solver.
pub trait PoseHandler {
    /// False when the host has no humanoid binding (the engines refuse to start).
    fn is_available(&self) -> bool;

    /// Size of the host's muscle taxonomy.
    fn muscle_count(&self) -> usize;

    fn current_pose(&mut self) -> Result<HumanPose, PoseError>;

    fn set_pose(&mut self, pose: &HumanPose) -> Result<(), PoseError>;
}

/// Host IK evaluation for one goal.
pub trait IkGoalSolver {
    fn solve_ik_goal(&self, goal: IkGoal, body: &Transform, foot: &Transform) -> Transform;
}

/// Skeleton walk and transform access.
pub trait Skeleton {
    fn is_humanoid(&self) -> bool;

    /// Every exposed bone, in walk order. The order must be stable for a given avatar.
    fn bones(&self) -> Vec<BoneId>;

    fn bone_name(&self, bone: BoneId) -> Option<&str>;

    /// Parent bone; `None` for children of the avatar root.
    fn bone_parent(&self, bone: BoneId) -> Option<BoneId>;

    /// Transform relative to the parent.
    fn local_transform(&self, bone: BoneId) -> Option<Transform>;

    fn world_transform(&self, bone: BoneId) -> Option<Transform>;

    fn set_world_transform(&mut self, bone: BoneId, transform: Transform)
        -> Result<(), PoseError>;

    /// Bone driven by the given IK goal.
    fn foot_bone(&self, goal: IkGoal) -> Option<BoneId>;

    /// Local transform of the freely animated root object.
    fn root_object_local(&self) -> Transform;
}

/// Everything the recorder and player need from a host.
pub trait HumanoidHost: PoseHandler + IkGoalSolver + Skeleton {}

impl<T: PoseHandler + IkGoalSolver + Skeleton> HumanoidHost for T {}

/// Bone -> "Parent/Child" path cache.
///
/// Paths need an ancestor walk, so they are computed once per bone. The cache
/// is only ever cleared as a whole (e.g. when the avatar changes).
#[derive(Debug, Default)]
pub struct BonePathCache {
    paths: HashMap<BoneId, String>,
}

impl BonePathCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Path of `bone` relative to the avatar root, computing it on first use.
    pub fn path_of<S: Skeleton + ?Sized>(&mut self, skeleton: &S, bone: BoneId) -> &str {
        self.paths
            .entry(bone)
            .or_insert_with(|| build_path(skeleton, bone))
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn clear(&mut self) {
        self.paths.clear();
    }
}

fn build_path<S: Skeleton + ?Sized>(skeleton: &S, bone: BoneId) -> String {
    let mut names: Vec<&str> = Vec::new();
    let mut cursor = Some(bone);
    while let Some(id) = cursor {
        // Guard against malformed hierarchies that loop back on themselves.
        if names.len() > 1024 {
            break;
        }
        names.push(skeleton.bone_name(id).unwrap_or(""));
        cursor = skeleton.bone_parent(id);
    }
    names.reverse();
    names.join("/")
}
