//! Player engine: `Idle <-> Playing` state machine driven by `tick(dt)`.
//!
//! Playback advances at most one frame per tick. A long stall makes playback
//! fall behind wall-clock time instead of skipping recorded samples.

use crate::config::{PlayerConfig, RootConvention};
use crate::error::PoseError;
use crate::events::{EventQueue, PlayerEvent};
use crate::frame::PoseFrame;
use crate::host::HumanoidHost;
use crate::persistence::PoseStore;
use crate::stream::PoseStream;

#[derive(Copy, Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum PlayerState {
    Idle,
    Playing,
}

#[derive(Debug)]
pub struct Player {
    config: PlayerConfig,
    state: PlayerState,
    stream: Option<PoseStream>,
    frame_index: usize,
    elapsed: f32,
    events: EventQueue<PlayerEvent>,
}

impl Player {
    pub fn new(config: PlayerConfig) -> Result<Self, PoseError> {
        config.validate()?;
        Ok(Self {
            frame_index: config.start_frame,
            config,
            state: PlayerState::Idle,
            stream: None,
            elapsed: 0.0,
            events: EventQueue::default(),
        })
    }

    #[inline]
    pub fn state(&self) -> PlayerState {
        self.state
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.state == PlayerState::Playing
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    /// Position of the frame that is (or will next be) applied.
    #[inline]
    pub fn frame_index(&self) -> usize {
        self.frame_index
    }

    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn stream(&self) -> Option<&PoseStream> {
        self.stream.as_ref()
    }

    pub fn current_frame(&self) -> Option<&PoseFrame> {
        self.stream.as_ref()?.get(self.frame_index)
    }

    /// Bind a recording. Rejected while playing.
    pub fn bind(&mut self, stream: PoseStream) -> Result<(), PoseError> {
        if self.is_playing() {
            return Err(PoseError::invalid_argument(
                "cannot rebind while playing",
            ));
        }
        self.stream = Some(stream);
        self.frame_index = self.config.start_frame;
        Ok(())
    }

    /// Release the bound recording. Stops playback first.
    pub fn unbind(&mut self) -> Option<PoseStream> {
        self.stop();
        self.stream.take()
    }

    /// Bind whatever `store` loads.
    pub fn load<S: PoseStore + ?Sized>(&mut self, store: &mut S) -> Result<(), PoseError> {
        let stream = store.load()?;
        self.bind(stream)
    }

    pub fn drain_events(&mut self) -> std::vec::Drain<'_, PlayerEvent> {
        self.events.drain()
    }

    /// Start at the configured start frame.
    pub fn play(&mut self) -> bool {
        self.play_from(self.config.start_frame)
    }

    /// `Idle -> Playing` at `start_frame`. Returns false (no-op) when already
    /// playing, nothing is bound, the stream is empty, or `start_frame` is out
    /// of range.
    pub fn play_from(&mut self, start_frame: usize) -> bool {
        if self.is_playing() {
            log::debug!("play ignored: already playing");
            return false;
        }
        let len = self.stream.as_ref().map(PoseStream::len).unwrap_or(0);
        if len == 0 {
            log::warn!("cannot play: no recording bound");
            return false;
        }
        if start_frame >= len {
            log::warn!("cannot play from frame {start_frame}: stream has {len} frames");
            return false;
        }
        self.frame_index = start_frame;
        // Assumes every tick lasts `nominal_tick`; imprecise when tick length varies.
        self.elapsed = start_frame as f32 * self.config.nominal_tick;
        self.state = PlayerState::Playing;
        self.events.push(PlayerEvent::Started { start_frame });
        log::debug!("playback started at frame {start_frame}");
        true
    }

    /// `Playing -> Idle`; rewinds to the configured start frame. Returns false when idle.
    pub fn stop(&mut self) -> bool {
        if !self.is_playing() {
            return false;
        }
        self.reset_to_idle();
        self.events.push(PlayerEvent::Stopped);
        log::debug!("playback stopped");
        true
    }

    fn reset_to_idle(&mut self) {
        self.state = PlayerState::Idle;
        self.frame_index = self.config.start_frame;
        self.elapsed = 0.0;
    }

    /// Advance by `dt` seconds and apply the current frame to the host.
    ///
    /// Host errors are returned for this tick only; the player stays `Playing`.
    pub fn tick<H: HumanoidHost + ?Sized>(&mut self, host: &mut H, dt: f32) -> Result<(), PoseError> {
        if !self.is_playing() {
            return Ok(());
        }
        let Some(stream) = self.stream.as_ref() else {
            self.reset_to_idle();
            return Ok(());
        };
        self.elapsed += dt;

        let len = stream.len();
        if let Some(frame) = stream.get(self.frame_index) {
            if self.elapsed > frame.time {
                self.frame_index += 1;
            }
        }

        if self.frame_index + 1 >= len {
            self.reset_to_idle();
            self.events.push(PlayerEvent::PlaybackCompleted { frames: len });
            log::debug!("playback completed ({len} frames)");
            return Ok(());
        }

        let Some(frame) = stream.get(self.frame_index) else {
            return Ok(());
        };
        host.set_pose(&frame.human_pose())?;
        match self.config.root_convention {
            // Root motion for the object-root convention is applied by the host.
            RootConvention::ObjectRoot => {}
            RootConvention::HipBone => {
                let bone = self
                    .config
                    .root_bone
                    .ok_or_else(|| PoseError::configuration("root bone not configured"))?;
                host.set_world_transform(bone, frame.body_root())?;
            }
        }
        Ok(())
    }
}
