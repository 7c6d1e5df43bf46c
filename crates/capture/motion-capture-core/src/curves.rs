//! Curve building: turns recorded frames into per-channel keyframe curves.
//!
//! Pose streams produce one key per frame on every channel. Facial streams go
//! through keyframe reduction: a blend-shape key is only emitted when the
//! weight moved by more than [`KEY_EMIT_THRESHOLD`] since the last emitted key.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::math::{align_hemisphere, lerp_f32, Quat};
use crate::stream::{FacialStream, PoseStream, DEFAULT_FRAME_RATE};

/// Per-channel emission threshold for blend-shape keys (0..100 weight scale).
pub const KEY_EMIT_THRESHOLD: f32 = 1.0;

const POSITION_AXES: [&str; 3] = ["x", "y", "z"];
const ROTATION_AXES: [&str; 4] = ["x", "y", "z", "w"];

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub time: f32,
    pub value: f32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AnimationCurve {
    pub keys: Vec<Keyframe>,
}

impl AnimationCurve {
    #[inline]
    pub fn add_key(&mut self, time: f32, value: f32) {
        self.keys.push(Keyframe { time, value });
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Linear evaluation, clamped to the first/last key outside the key range.
    pub fn evaluate(&self, time: f32) -> Option<f32> {
        let first = self.keys.first()?;
        let last = self.keys.last()?;
        if time <= first.time {
            return Some(first.value);
        }
        if time >= last.time {
            return Some(last.value);
        }
        let upper = self.keys.partition_point(|k| k.time <= time);
        let (a, b) = (self.keys[upper - 1], self.keys[upper]);
        let span = b.time - a.time;
        if span <= 0.0 {
            return Some(b.value);
        }
        Some(lerp_f32(a.value, b.value, (time - a.time) / span))
    }
}

/// Where a curve writes: an object path below the avatar root plus a property.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CurveBinding {
    /// Bone path; empty for avatar-level channels (root, body, IK, muscles).
    pub path: String,
    /// e.g. "localPosition.x", "RootQ.w", "blendShape.smile".
    pub property: String,
}

impl CurveBinding {
    pub fn new(path: impl Into<String>, property: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            property: property.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundCurve {
    pub binding: CurveBinding,
    pub curve: AnimationCurve,
}

/// Indices of the four curves (x, y, z, w) forming one quaternion channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuatChannel(pub [usize; 4]);

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AnimationClip {
    pub frame_rate: f32,
    pub looping: bool,
    pub curves: Vec<BoundCurve>,
    pub rotation_channels: Vec<QuatChannel>,
}

impl AnimationClip {
    pub fn curve(&self, path: &str, property: &str) -> Option<&AnimationCurve> {
        self.curves
            .iter()
            .find(|c| c.binding.path == path && c.binding.property == property)
            .map(|c| &c.curve)
    }

    /// Clip length in seconds (latest key over all curves).
    pub fn duration(&self) -> f32 {
        self.curves
            .iter()
            .filter_map(|c| c.curve.keys.last())
            .map(|k| k.time)
            .fold(0.0, f32::max)
    }

    fn push_curve(&mut self, binding: CurveBinding) -> usize {
        self.curves.push(BoundCurve {
            binding,
            curve: AnimationCurve::default(),
        });
        self.curves.len() - 1
    }

    fn push_vec3(&mut self, path: &str, prefix: &str) -> [usize; 3] {
        POSITION_AXES.map(|axis| self.push_curve(CurveBinding::new(path, format!("{prefix}.{axis}"))))
    }

    fn push_quat(&mut self, path: &str, prefix: &str) -> [usize; 4] {
        let idx = ROTATION_AXES
            .map(|axis| self.push_curve(CurveBinding::new(path, format!("{prefix}.{axis}"))));
        self.rotation_channels.push(QuatChannel(idx));
        idx
    }

    /// Make every quaternion channel continuous: a key whose quaternion lies in
    /// the opposite hemisphere from the previous key is negated.
    pub fn ensure_quaternion_continuity(&mut self) {
        for QuatChannel(idx) in self.rotation_channels.clone() {
            let count = idx
                .iter()
                .map(|&i| self.curves[i].curve.keys.len())
                .min()
                .unwrap_or(0);
            let mut prev: Option<Quat> = None;
            for k in 0..count {
                let q: Quat = idx.map(|i| self.curves[i].curve.keys[k].value);
                let aligned = match prev {
                    Some(p) => align_hemisphere(p, q),
                    None => q,
                };
                if aligned != q {
                    for (c, &i) in idx.iter().enumerate() {
                        self.curves[i].curve.keys[k].value = aligned[c];
                    }
                }
                prev = Some(aligned);
            }
        }
    }
}

/// Options for [`build_pose_clip`].
#[derive(Clone, Debug, Default)]
pub struct PoseCurveOptions {
    /// Host muscle names in canonical order; missing names fall back to `muscle[i]`.
    pub muscle_names: Vec<String>,
}

struct TransformCurves {
    position: [usize; 3],
    rotation: [usize; 4],
}

fn avatar_curves(clip: &mut AnimationClip, position: &str, rotation: &str) -> TransformCurves {
    TransformCurves {
        position: clip.push_vec3("", position),
        rotation: clip.push_quat("", rotation),
    }
}

/// One curve per channel, one key per recorded frame at the frame's time.
pub fn build_pose_clip(stream: &PoseStream, options: &PoseCurveOptions) -> AnimationClip {
    let mut clip = AnimationClip {
        frame_rate: stream.frame_rate(),
        looping: stream.looping,
        ..AnimationClip::default()
    };
    let Some(first) = stream.frames().first() else {
        return clip;
    };

    let root = avatar_curves(&mut clip, "RootT", "RootQ");
    let body = avatar_curves(&mut clip, "BodyT", "BodyQ");
    let left_foot = avatar_curves(&mut clip, "LeftFootT", "LeftFootQ");
    let right_foot = avatar_curves(&mut clip, "RightFootT", "RightFootQ");

    let muscles: Vec<usize> = (0..first.muscles.len())
        .map(|i| {
            let name = options
                .muscle_names
                .get(i)
                .cloned()
                .unwrap_or_else(|| format!("muscle[{i}]"));
            clip.push_curve(CurveBinding::new("", name))
        })
        .collect();

    let bones: Vec<TransformCurves> = first
        .bones
        .iter()
        .map(|b| TransformCurves {
            position: clip.push_vec3(&b.name, "localPosition"),
            rotation: clip.push_quat(&b.name, "localRotation"),
        })
        .collect();

    for frame in stream.frames() {
        let t = frame.time;
        let mut key_transform = |curves: &TransformCurves, p: [f32; 3], r: [f32; 4]| {
            for (i, v) in curves.position.iter().zip(p) {
                clip.curves[*i].curve.add_key(t, v);
            }
            for (i, v) in curves.rotation.iter().zip(r) {
                clip.curves[*i].curve.add_key(t, v);
            }
        };
        key_transform(&root, frame.body_root_position, frame.body_root_rotation);
        key_transform(&body, frame.body_position, frame.body_rotation);
        key_transform(&left_foot, frame.left_foot_ik_position, frame.left_foot_ik_rotation);
        key_transform(&right_foot, frame.right_foot_ik_position, frame.right_foot_ik_rotation);
        for (curves, bone) in bones.iter().zip(&frame.bones) {
            key_transform(curves, bone.local_position, bone.local_rotation);
        }
        for (&i, &v) in muscles.iter().zip(&frame.muscles) {
            clip.curves[i].curve.add_key(t, v);
        }
    }

    clip.ensure_quaternion_continuity();
    clip
}

/// Blend-shape names per mesh path; unnamed shapes are bound as `blendShape.{index}`.
pub type BlendShapeNames = HashMap<String, Vec<String>>;

/// Reduced blend-shape curves for a facial stream.
///
/// The first sample of every channel is always keyed; later samples only when
/// they differ from the last emitted key by more than [`KEY_EMIT_THRESHOLD`].
pub fn build_facial_clip(stream: &FacialStream, names: &BlendShapeNames) -> AnimationClip {
    let mut clip = AnimationClip {
        frame_rate: DEFAULT_FRAME_RATE,
        ..AnimationClip::default()
    };
    let mut channels: HashMap<(String, usize), usize> = HashMap::new();
    let mut last_emitted: Vec<Option<f32>> = Vec::new();

    for frame in stream.frames() {
        for mesh in &frame.meshes {
            for (shape, &weight) in mesh.weights.iter().enumerate() {
                let key = (mesh.mesh_path.clone(), shape);
                let idx = match channels.get(&key) {
                    Some(&idx) => idx,
                    None => {
                        let property = names
                            .get(&mesh.mesh_path)
                            .and_then(|n| n.get(shape))
                            .map(|n| format!("blendShape.{n}"))
                            .unwrap_or_else(|| format!("blendShape.{shape}"));
                        let idx = clip.push_curve(CurveBinding::new(mesh.mesh_path.clone(), property));
                        last_emitted.push(None);
                        channels.insert(key, idx);
                        idx
                    }
                };
                let emit = match last_emitted[idx] {
                    None => true,
                    Some(prev) => (weight - prev).abs() > KEY_EMIT_THRESHOLD,
                };
                if emit {
                    clip.curves[idx].curve.add_key(frame.time, weight);
                    last_emitted[idx] = Some(weight);
                }
            }
        }
    }
    clip
}

/// Export a clip as serde_json::Value (stable schema for tooling).
pub fn export_clip_json(clip: &AnimationClip) -> serde_json::Value {
    serde_json::to_value(clip).unwrap_or(serde_json::Value::Null)
}
