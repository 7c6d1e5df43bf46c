mod common;

use common::{MockHumanoid, HIPS};
use motion_capture_core::{
    MemoryStore, Player, PlayerConfig, PlayerEvent, PlayerState, PoseFrame, PoseStore,
    PoseStream, RootConvention,
};

fn approx(a: f32, b: f32, eps: f32) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}

/// Frames tagged by `muscles[0] == position`.
fn stream_at(times: &[f32]) -> PoseStream {
    let mut stream = PoseStream::new();
    for (i, &t) in times.iter().enumerate() {
        let mut frame = PoseFrame::with_muscle_count(2);
        frame.frame_index = i as u32;
        frame.time = t;
        frame.muscles[0] = i as f32;
        frame.body_root_position = [i as f32, 0.0, 0.0];
        stream.add_frame(frame).unwrap();
    }
    stream
}

fn player_with(times: &[f32]) -> Player {
    let mut player = Player::new(PlayerConfig::default()).unwrap();
    player.bind(stream_at(times)).unwrap();
    player
}

fn applied_tags(host: &MockHumanoid) -> Vec<f32> {
    host.applied.iter().map(|p| p.muscles[0]).collect()
}

#[test]
fn advances_one_frame_per_tick_and_never_applies_last_frame() {
    let mut host = MockHumanoid::new(2);
    let mut player = player_with(&[0.0, 0.5, 1.0, 1.5]);
    assert!(player.play());

    player.tick(&mut host, 0.6).unwrap();
    assert_eq!(player.frame_index(), 1);
    player.tick(&mut host, 0.6).unwrap();
    assert_eq!(player.frame_index(), 2);
    player.tick(&mut host, 0.6).unwrap();

    assert_eq!(player.state(), PlayerState::Idle);
    assert_eq!(applied_tags(&host), vec![1.0, 2.0]);
    let events: Vec<_> = player.drain_events().collect();
    assert_eq!(
        events,
        vec![
            PlayerEvent::Started { start_frame: 0 },
            PlayerEvent::PlaybackCompleted { frames: 4 },
        ]
    );
}

#[test]
fn three_frame_stream_completes_when_reaching_last_index() {
    let mut host = MockHumanoid::new(2);
    let mut player = player_with(&[0.0, 0.5, 1.0]);
    player.play();

    player.tick(&mut host, 0.6).unwrap();
    assert_eq!(player.frame_index(), 1);
    assert!(player.is_playing());

    player.tick(&mut host, 0.6).unwrap();
    assert!(!player.is_playing());
    assert_eq!(applied_tags(&host), vec![1.0]);
    assert!(player
        .drain_events()
        .any(|e| e == PlayerEvent::PlaybackCompleted { frames: 3 }));

    player.tick(&mut host, 0.6).unwrap();
    assert_eq!(host.applied.len(), 1);
}

#[test]
fn small_ticks_hold_the_current_frame() {
    let mut host = MockHumanoid::new(2);
    let mut player = player_with(&[0.0, 0.5, 1.0]);
    player.play();
    for _ in 0..4 {
        player.tick(&mut host, 0.1).unwrap();
    }
    assert_eq!(player.frame_index(), 1);
    assert_eq!(applied_tags(&host), vec![1.0; 4]);
}

#[test]
fn long_stall_does_not_skip_frames() {
    let mut host = MockHumanoid::new(2);
    let mut player = player_with(&[0.0, 0.1, 0.2, 0.3, 0.4]);
    player.play();
    player.tick(&mut host, 10.0).unwrap();
    assert_eq!(player.frame_index(), 1);
    player.tick(&mut host, 10.0).unwrap();
    assert_eq!(player.frame_index(), 2);
    assert_eq!(applied_tags(&host), vec![1.0, 2.0]);
}

#[test]
fn play_rejects_empty_or_out_of_range() {
    let mut player = Player::new(PlayerConfig::default()).unwrap();
    assert!(!player.play(), "nothing bound");
    player.bind(PoseStream::new()).unwrap();
    assert!(!player.play(), "empty stream");

    let mut player = player_with(&[0.0, 0.5, 1.0]);
    assert!(!player.play_from(3));
    assert!(!player.play_from(10));
    assert_eq!(player.state(), PlayerState::Idle);
    assert!(player.play_from(2));
    assert!(!player.play(), "already playing");
}

#[test]
fn single_frame_stream_completes_on_first_tick() {
    let mut host = MockHumanoid::new(2);
    let mut player = player_with(&[0.0]);
    assert!(player.play());
    player.tick(&mut host, 0.016).unwrap();
    assert!(!player.is_playing());
    assert!(host.applied.is_empty());
}

#[test]
fn play_from_seeds_elapsed_with_nominal_tick() {
    let mut player = player_with(&[0.0, 0.1, 0.2, 0.3, 0.4]);
    assert!(player.play_from(3));
    assert_eq!(player.frame_index(), 3);
    approx(player.elapsed(), 3.0 / 60.0, 1e-6);
}

#[test]
fn stop_rewinds_to_start_frame() {
    let mut host = MockHumanoid::new(2);
    let mut player = Player::new(PlayerConfig {
        start_frame: 1,
        ..PlayerConfig::default()
    })
    .unwrap();
    player.bind(stream_at(&[0.0, 0.1, 0.2, 0.3, 0.4])).unwrap();
    assert!(player.play());
    player.tick(&mut host, 0.2).unwrap();
    assert_eq!(player.frame_index(), 2);

    assert!(player.stop());
    assert!(!player.stop());
    assert_eq!(player.frame_index(), 1);
    assert_eq!(player.elapsed(), 0.0);
    assert!(player
        .drain_events()
        .any(|e| e == PlayerEvent::Stopped));

    // Ticks while idle leave the host alone.
    let applied = host.applied.len();
    player.tick(&mut host, 1.0).unwrap();
    assert_eq!(host.applied.len(), applied);
}

#[test]
fn hip_bone_convention_writes_root_bone() {
    let mut host = MockHumanoid::new(2);
    let mut player = Player::new(PlayerConfig {
        root_convention: RootConvention::HipBone,
        root_bone: Some(HIPS),
        ..PlayerConfig::default()
    })
    .unwrap();
    player.bind(stream_at(&[0.0, 0.5, 1.0])).unwrap();
    player.play();
    player.tick(&mut host, 0.1).unwrap();

    assert_eq!(host.root_writes.len(), 1);
    let (bone, transform) = host.root_writes[0];
    assert_eq!(bone, HIPS);
    assert_eq!(transform.position, [1.0, 0.0, 0.0]);
    assert_eq!(host.bones[0].world.position, [1.0, 0.0, 0.0]);
}

#[test]
fn object_root_convention_leaves_bones_alone() {
    let mut host = MockHumanoid::new(2);
    let mut player = player_with(&[0.0, 0.5, 1.0]);
    player.play();
    player.tick(&mut host, 0.1).unwrap();
    assert!(host.root_writes.is_empty());
    assert_eq!(host.applied.len(), 1);
}

#[test]
fn host_error_surfaces_but_playback_continues() {
    let mut host = MockHumanoid::new(2);
    let mut player = player_with(&[0.0, 0.5, 1.0, 1.5]);
    player.play();
    host.fail_writes = true;
    let err = player.tick(&mut host, 0.6).unwrap_err();
    assert_eq!(err.category(), "host");
    assert!(player.is_playing());
    assert_eq!(player.frame_index(), 1);

    host.fail_writes = false;
    player.tick(&mut host, 0.6).unwrap();
    assert_eq!(applied_tags(&host), vec![2.0]);
}

#[test]
fn rebinding_while_playing_is_rejected() {
    let mut player = player_with(&[0.0, 0.5, 1.0]);
    player.play();
    assert!(player.bind(stream_at(&[0.0, 1.0])).is_err());
    assert_eq!(player.stream().map(PoseStream::len), Some(3));

    let taken = player.unbind().unwrap();
    assert_eq!(taken.len(), 3);
    assert!(!player.is_playing());
}

#[test]
fn load_binds_from_store() {
    let mut store = MemoryStore::new();
    let mut player = Player::new(PlayerConfig::default()).unwrap();
    assert!(player.load(&mut store).is_err());

    store.save(&stream_at(&[0.0, 0.5])).unwrap();
    player.load(&mut store).unwrap();
    assert_eq!(player.current_frame().map(|f| f.frame_index), Some(0));
}
