#![allow(dead_code)]

use motion_capture_core::{
    BoneId, HumanPose, IkGoal, IkGoalSolver, PoseError, PoseHandler, Skeleton, Transform,
};

pub const HIPS: BoneId = BoneId(0);
pub const SPINE: BoneId = BoneId(1);
pub const LEFT_FOOT: BoneId = BoneId(2);
pub const RIGHT_FOOT: BoneId = BoneId(3);

pub struct MockBone {
    pub name: &'static str,
    pub parent: Option<BoneId>,
    pub local: Transform,
    pub world: Transform,
}

/// Four-bone humanoid with scripted pose-handler behavior.
pub struct MockHumanoid {
    pub available: bool,
    pub humanoid: bool,
    pub muscles: Vec<f32>,
    pub body: Transform,
    pub root_object: Transform,
    pub bones: Vec<MockBone>,
    /// Number of upcoming `current_pose` calls that fail.
    pub fail_reads: usize,
    pub fail_writes: bool,
    pub pose_reads: usize,
    pub applied: Vec<HumanPose>,
    pub root_writes: Vec<(BoneId, Transform)>,
}

impl MockHumanoid {
    pub fn new(muscle_count: usize) -> Self {
        let t = |p: [f32; 3]| Transform::new(p, [0.0, 0.0, 0.0, 1.0]);
        Self {
            available: true,
            humanoid: true,
            muscles: vec![0.0; muscle_count],
            body: t([0.0, 1.0, 0.0]),
            root_object: t([0.0, 0.0, 0.0]),
            bones: vec![
                MockBone {
                    name: "Hips",
                    parent: None,
                    local: t([0.0, 1.0, 0.0]),
                    world: t([0.0, 1.0, 0.0]),
                },
                MockBone {
                    name: "Spine",
                    parent: Some(HIPS),
                    local: t([0.0, 0.1, 0.0]),
                    world: t([0.0, 1.1, 0.0]),
                },
                MockBone {
                    name: "LeftFoot",
                    parent: Some(HIPS),
                    local: t([-0.1, -0.9, 0.0]),
                    world: t([-0.1, 0.1, 0.0]),
                },
                MockBone {
                    name: "RightFoot",
                    parent: Some(HIPS),
                    local: t([0.1, -0.9, 0.0]),
                    world: t([0.1, 0.1, 0.0]),
                },
            ],
            fail_reads: 0,
            fail_writes: false,
            pose_reads: 0,
            applied: Vec::new(),
            root_writes: Vec::new(),
        }
    }

    fn bone(&self, id: BoneId) -> Option<&MockBone> {
        self.bones.get(id.0 as usize)
    }
}

impl PoseHandler for MockHumanoid {
    fn is_available(&self) -> bool {
        self.available
    }

    fn muscle_count(&self) -> usize {
        self.muscles.len()
    }

    fn current_pose(&mut self) -> Result<HumanPose, PoseError> {
        self.pose_reads += 1;
        if self.fail_reads > 0 {
            self.fail_reads -= 1;
            return Err(PoseError::host_unavailable("scripted read failure"));
        }
        Ok(HumanPose {
            muscles: self.muscles.clone(),
            body_position: self.body.position,
            body_rotation: self.body.rotation,
        })
    }

    fn set_pose(&mut self, pose: &HumanPose) -> Result<(), PoseError> {
        if self.fail_writes {
            return Err(PoseError::host_unavailable("scripted write failure"));
        }
        self.applied.push(pose.clone());
        Ok(())
    }
}

impl IkGoalSolver for MockHumanoid {
    /// Goal expressed relative to the body position.
    fn solve_ik_goal(&self, _goal: IkGoal, body: &Transform, foot: &Transform) -> Transform {
        Transform::new(
            [
                foot.position[0] - body.position[0],
                foot.position[1] - body.position[1],
                foot.position[2] - body.position[2],
            ],
            foot.rotation,
        )
    }
}

impl Skeleton for MockHumanoid {
    fn is_humanoid(&self) -> bool {
        self.humanoid
    }

    fn bones(&self) -> Vec<BoneId> {
        (0..self.bones.len() as u32).map(BoneId).collect()
    }

    fn bone_name(&self, bone: BoneId) -> Option<&str> {
        self.bone(bone).map(|b| b.name)
    }

    fn bone_parent(&self, bone: BoneId) -> Option<BoneId> {
        self.bone(bone).and_then(|b| b.parent)
    }

    fn local_transform(&self, bone: BoneId) -> Option<Transform> {
        self.bone(bone).map(|b| b.local)
    }

    fn world_transform(&self, bone: BoneId) -> Option<Transform> {
        self.bone(bone).map(|b| b.world)
    }

    fn set_world_transform(&mut self, bone: BoneId, transform: Transform) -> Result<(), PoseError> {
        let Some(b) = self.bones.get_mut(bone.0 as usize) else {
            return Err(PoseError::invalid_argument("unknown bone"));
        };
        b.world = transform;
        self.root_writes.push((bone, transform));
        Ok(())
    }

    fn foot_bone(&self, goal: IkGoal) -> Option<BoneId> {
        match goal {
            IkGoal::LeftFoot => Some(LEFT_FOOT),
            IkGoal::RightFoot => Some(RIGHT_FOOT),
        }
    }

    fn root_object_local(&self) -> Transform {
        self.root_object
    }
}
