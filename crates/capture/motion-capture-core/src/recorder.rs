//! Recorder engine: `Idle <-> Recording` state machine driven by `tick(dt)`.
//!
//! Each tick accumulates time, applies the cadence gate, pulls the live pose
//! from the host, solves foot IK goals, captures the root and every bone, and
//! appends one frame. On `stop` the recording is handed to the configured
//! [`PoseStore`].

use crate::config::{RecorderConfig, RootConvention};
use crate::error::PoseError;
use crate::events::{EventQueue, RecorderEvent, StreamEvent};
use crate::frame::{BoneSample, PoseFrame};
use crate::host::{BonePathCache, HumanoidHost, IkGoal};
use crate::math::Transform;
use crate::persistence::PoseStore;
use crate::pool::Pool;
use crate::stream::PoseStream;

/// Absorbs f64 accumulation error in the cadence gate (seconds).
const CADENCE_EPSILON: f64 = 1e-6;

#[derive(Copy, Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum RecorderState {
    Idle,
    Recording,
}

#[derive(Debug)]
pub struct Recorder<S: PoseStore> {
    config: RecorderConfig,
    store: S,
    state: RecorderState,
    stream: Option<PoseStream>,
    /// Finished recordings whose save failed, oldest first; kept for `retry_persist`.
    unsaved: Vec<PoseStream>,
    elapsed: f64,
    frame_counter: u32,
    paths: BonePathCache,
    pool: Pool<PoseFrame>,
    events: EventQueue<RecorderEvent>,
}

impl<S: PoseStore> Recorder<S> {
    /// Build a recorder; invalid configuration is rejected up front.
    pub fn new(config: RecorderConfig, store: S) -> Result<Self, PoseError> {
        config.validate()?;
        Ok(Self {
            config,
            store,
            state: RecorderState::Idle,
            stream: None,
            unsaved: Vec::new(),
            elapsed: 0.0,
            frame_counter: 0,
            paths: BonePathCache::new(),
            pool: Pool::default(),
            events: EventQueue::default(),
        })
    }

    #[inline]
    pub fn state(&self) -> RecorderState {
        self.state
    }

    #[inline]
    pub fn is_recording(&self) -> bool {
        self.state == RecorderState::Recording
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    /// Frames captured in the current session.
    pub fn frame_count(&self) -> u32 {
        self.frame_counter
    }

    /// Seconds accumulated in the current session.
    pub fn elapsed(&self) -> f32 {
        self.elapsed as f32
    }

    /// Recording in progress, if any.
    pub fn stream(&self) -> Option<&PoseStream> {
        self.stream.as_ref()
    }

    /// Recordings that could not be persisted at stop time, oldest first.
    pub fn pending_streams(&self) -> &[PoseStream] {
        &self.unsaved
    }

    /// Released frames waiting to be reused by the next captures.
    pub fn pooled_frames(&self) -> usize {
        self.pool.idle()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Forget cached bone paths (call after the avatar changes).
    pub fn clear_bone_paths(&mut self) {
        self.paths.clear();
    }

    pub fn drain_events(&mut self) -> std::vec::Drain<'_, RecorderEvent> {
        self.events.drain()
    }

    /// `Idle -> Recording`. Returns false (no-op) when already recording or
    /// when the host has no usable humanoid binding.
    pub fn start<H: HumanoidHost + ?Sized>(&mut self, host: &H) -> bool {
        if self.is_recording() {
            log::debug!("start ignored: already recording");
            return false;
        }
        if !host.is_available() {
            log::warn!("cannot record: humanoid pose handler unavailable");
            return false;
        }
        if !host.is_humanoid() {
            log::warn!("cannot record: avatar is not humanoid");
            return false;
        }
        let mut stream = PoseStream::new();
        if self.config.target_frame_rate > 0.0 {
            stream.set_frame_rate(self.config.target_frame_rate);
        }
        self.stream = Some(stream);
        self.elapsed = 0.0;
        self.frame_counter = 0;
        self.state = RecorderState::Recording;
        self.events.push(RecorderEvent::Started);
        log::debug!("recording started");
        true
    }

    /// `Recording -> Idle`, then persist the recording. Returns false when idle.
    ///
    /// A failed save is reported as [`RecorderEvent::PersistFailed`] and the
    /// recording is kept for [`Recorder::retry_persist`].
    pub fn stop(&mut self) -> bool {
        if !self.is_recording() {
            return false;
        }
        self.state = RecorderState::Idle;
        let stream = self.stream.take().unwrap_or_default();
        self.events.push(RecorderEvent::Stopped {
            frames: stream.len(),
        });
        log::debug!("recording stopped after {} frames", stream.len());
        self.persist(stream);
        true
    }

    /// Try again to save every recording whose save failed, oldest first.
    ///
    /// Recordings that fail again stay pending in their original order.
    pub fn retry_persist(&mut self) -> Result<(), PoseError> {
        if self.unsaved.is_empty() {
            return Err(PoseError::invalid_argument("no unsaved recording"));
        }
        for stream in std::mem::take(&mut self.unsaved) {
            self.persist(stream);
        }
        match self.unsaved.len() {
            0 => Ok(()),
            left => Err(PoseError::Io {
                reason: format!("{left} recording(s) still unsaved"),
            }),
        }
    }

    fn persist(&mut self, mut stream: PoseStream) {
        stream.drain_events().for_each(drop);
        match self.store.save(&stream) {
            Ok(()) => {
                log::info!("persisted recording of {} frames", stream.len());
                self.events.push(RecorderEvent::Persisted {
                    frames: stream.len(),
                });
                stream.recycle_into(&mut self.pool);
            }
            Err(err) => {
                log::error!("failed to persist recording: {err}");
                self.events.push(RecorderEvent::PersistFailed {
                    reason: err.to_string(),
                });
                self.unsaved.push(stream);
            }
        }
    }

    /// Advance the session by `dt` seconds, capturing at most one frame.
    pub fn tick<H: HumanoidHost + ?Sized>(&mut self, host: &mut H, dt: f32) {
        if !self.is_recording() {
            return;
        }
        self.elapsed += f64::from(dt);

        let rate = self.config.target_frame_rate;
        if rate > 0.0 {
            let next_sample = f64::from(self.frame_counter + 1) / f64::from(rate);
            if next_sample > self.elapsed + CADENCE_EPSILON {
                return;
            }
        }

        let mut frame = self.pool.acquire();
        if let Err(err) = self.capture(&mut *host, &mut frame) {
            self.pool.release(frame);
            self.drop_frame(err);
            return;
        }
        let Some(stream) = self.stream.as_mut() else {
            self.pool.release(frame);
            return;
        };
        if let Err(err) = stream.check_frame(&frame) {
            self.pool.release(frame);
            self.drop_frame(err);
            return;
        }
        if let Err(err) = stream.add_frame(frame) {
            self.drop_frame(err);
            return;
        }
        for event in stream.drain_events() {
            if let StreamEvent::FrameAdded {
                position,
                frame_index,
            } = event
            {
                self.events
                    .push(RecorderEvent::FrameAdded { position, frame_index });
            }
        }
        self.frame_counter += 1;

        if self.frame_counter % self.config.measure_interval() == 0 && self.elapsed > 0.0 {
            let fps = 1.0 / (self.elapsed / f64::from(self.frame_counter));
            self.events.push(RecorderEvent::MeasuredFrameRate { fps: fps as f32 });
        }
    }

    fn drop_frame(&mut self, err: PoseError) {
        log::warn!("dropping frame {}: {err}", self.frame_counter);
        self.events.push(RecorderEvent::FrameDropped {
            frame_index: self.frame_counter,
            reason: err.to_string(),
        });
    }

    /// Fill `frame` from the host. Leaves `frame` partially written on error;
    /// the caller discards it.
    fn capture<H: HumanoidHost + ?Sized>(
        &mut self,
        host: &mut H,
        frame: &mut PoseFrame,
    ) -> Result<(), PoseError> {
        let pose = host.current_pose()?;
        let expected = self
            .stream
            .as_ref()
            .and_then(|s| s.muscle_count())
            .unwrap_or_else(|| host.muscle_count());
        if pose.muscles.len() != expected {
            return Err(PoseError::host_unavailable(format!(
                "pose handler returned {} muscles, expected {expected}",
                pose.muscles.len()
            )));
        }
        frame.frame_index = self.frame_counter;
        frame.time = self.elapsed as f32;
        frame.set_human_pose(&pose);

        let body = frame.body();
        frame.set_left_foot_ik(solve_foot(&*host, IkGoal::LeftFoot, &body)?);
        frame.set_right_foot_ik(solve_foot(&*host, IkGoal::RightFoot, &body)?);

        let root = match self.config.root_convention {
            RootConvention::ObjectRoot => host.root_object_local(),
            RootConvention::HipBone => {
                let bone = self
                    .config
                    .root_bone
                    .ok_or_else(|| PoseError::configuration("root bone not configured"))?;
                host.world_transform(bone).ok_or_else(|| {
                    PoseError::host_unavailable(format!("root bone {bone:?} has no transform"))
                })?
            }
        };
        frame.set_body_root(root);

        for bone in host.bones() {
            let local = host.local_transform(bone).ok_or_else(|| {
                PoseError::host_unavailable(format!("bone {bone:?} has no transform"))
            })?;
            let name = self.paths.path_of(&*host, bone);
            frame.bones.push(BoneSample::new(name, local));
        }
        Ok(())
    }
}

fn solve_foot<H: HumanoidHost + ?Sized>(
    host: &H,
    goal: IkGoal,
    body: &Transform,
) -> Result<Transform, PoseError> {
    let foot = host
        .foot_bone(goal)
        .and_then(|bone| host.world_transform(bone))
        .ok_or_else(|| PoseError::host_unavailable(format!("no transform for {goal:?}")))?;
    Ok(host.solve_ik_goal(goal, body, &foot))
}
