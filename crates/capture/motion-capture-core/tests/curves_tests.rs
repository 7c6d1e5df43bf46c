use motion_capture_core::curves::{export_clip_json, BlendShapeNames, KEY_EMIT_THRESHOLD};
use motion_capture_core::{
    build_facial_clip, build_pose_clip, BoneSample, FacialFrame, FacialStream, MeshBlendShapes,
    PoseCurveOptions, PoseFrame, PoseStream, Transform,
};

fn pose_stream() -> PoseStream {
    let rotations = [
        [0.0, 0.0, 0.0, 1.0],
        [0.0, 0.0, 0.0, -1.0],
        [0.0, 0.0, 0.6, 0.8],
    ];
    let mut stream = PoseStream::with_frame_rate(30.0);
    stream.looping = true;
    for (i, rotation) in rotations.into_iter().enumerate() {
        let mut frame = PoseFrame::with_muscle_count(2);
        frame.frame_index = i as u32;
        frame.time = i as f32 / 30.0;
        frame.muscles = vec![0.25 * i as f32, -1.0];
        frame.body_root_position = [i as f32, 0.0, 0.0];
        frame.bones.push(BoneSample::new(
            "Hips",
            Transform::new([0.0, 1.0, 0.0], rotation),
        ));
        stream.add_frame(frame).unwrap();
    }
    stream
}

#[test]
fn pose_clip_has_one_curve_per_channel() {
    let options = PoseCurveOptions {
        muscle_names: vec!["Spine Front-Back".to_string()],
    };
    let clip = build_pose_clip(&pose_stream(), &options);

    // Root, body, two IK goals and one bone (7 each) plus two muscles.
    assert_eq!(clip.curves.len(), 5 * 7 + 2);
    assert_eq!(clip.rotation_channels.len(), 5);
    assert_eq!(clip.frame_rate, 30.0);
    assert!(clip.looping);
    for bound in &clip.curves {
        assert_eq!(bound.curve.len(), 3, "{:?}", bound.binding);
    }

    let root_x = clip.curve("", "RootT.x").unwrap();
    let values: Vec<f32> = root_x.keys.iter().map(|k| k.value).collect();
    assert_eq!(values, vec![0.0, 1.0, 2.0]);
    assert_eq!(root_x.keys[2].time, 2.0 / 30.0);

    assert!(clip.curve("", "Spine Front-Back").is_some());
    let fallback = clip.curve("", "muscle[1]").unwrap();
    assert!(fallback.keys.iter().all(|k| k.value == -1.0));
    assert!(clip.curve("Hips", "localPosition.y").is_some());
    assert!(clip.curve("", "LeftFootQ.w").is_some());
    assert!((clip.duration() - 2.0 / 30.0).abs() < 1e-6);
}

#[test]
fn pose_clip_rotation_keys_are_continuous() {
    let clip = build_pose_clip(&pose_stream(), &PoseCurveOptions::default());
    let w = clip.curve("Hips", "localRotation.w").unwrap();
    let values: Vec<f32> = w.keys.iter().map(|k| k.value).collect();
    assert_eq!(values, vec![1.0, 1.0, 0.8]);
}

#[test]
fn empty_stream_yields_empty_clip() {
    let clip = build_pose_clip(&PoseStream::new(), &PoseCurveOptions::default());
    assert!(clip.curves.is_empty());
    assert_eq!(clip.duration(), 0.0);
}

fn facial_stream(smile: &[f32]) -> FacialStream {
    let mut stream = FacialStream::new();
    for (i, &w) in smile.iter().enumerate() {
        stream
            .add_frame(FacialFrame {
                frame_index: i as u32,
                time: i as f32,
                meshes: vec![MeshBlendShapes::new("Body/Face", vec![w, 50.0])],
            })
            .unwrap();
    }
    stream
}

#[test]
fn facial_clip_emits_keys_only_on_significant_change() {
    let mut names = BlendShapeNames::new();
    names.insert("Body/Face".to_string(), vec!["smile".to_string()]);
    let clip = build_facial_clip(&facial_stream(&[0.0, 0.5, 2.0, 2.5, 10.0]), &names);

    let smile = clip.curve("Body/Face", "blendShape.smile").unwrap();
    let times: Vec<f32> = smile.keys.iter().map(|k| k.time).collect();
    assert_eq!(times, vec![0.0, 2.0, 4.0]);

    // Unnamed shape falls back to its index; a constant channel keeps only its first key.
    let constant = clip.curve("Body/Face", "blendShape.1").unwrap();
    assert_eq!(constant.len(), 1);
    assert_eq!(constant.keys[0].value, 50.0);
}

#[test]
fn facial_change_equal_to_threshold_is_not_keyed() {
    let clip = build_facial_clip(
        &facial_stream(&[10.0, 10.0 + KEY_EMIT_THRESHOLD]),
        &BlendShapeNames::new(),
    );
    assert_eq!(clip.curve("Body/Face", "blendShape.0").unwrap().len(), 1);
}

#[test]
fn facial_push_if_changed_uses_frame_threshold() {
    let mut stream = FacialStream::new();
    let frame = |w: f32| FacialFrame {
        frame_index: 0,
        time: 0.0,
        meshes: vec![MeshBlendShapes::new("Face", vec![w])],
    };
    assert!(stream.push_if_changed(frame(1.0)).unwrap());
    assert!(!stream.push_if_changed(frame(1.05)).unwrap());
    assert!(stream.push_if_changed(frame(1.5)).unwrap());
    assert_eq!(stream.len(), 2);
}

#[test]
fn exported_json_has_bindings() {
    let clip = build_pose_clip(&pose_stream(), &PoseCurveOptions::default());
    let json = export_clip_json(&clip);
    assert_eq!(json["frame_rate"], 30.0);
    assert_eq!(json["curves"][0]["binding"]["property"], "RootT.x");
    assert_eq!(
        json["curves"].as_array().map(Vec::len),
        Some(clip.curves.len())
    );
}
