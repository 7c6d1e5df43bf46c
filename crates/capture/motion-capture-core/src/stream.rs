//! Append-only frame containers.
//!
//! A stream is written by exactly one recorder, one frame per tick, and read
//! many times afterwards. Frames are never reordered or removed individually;
//! position in `frames` (not `frame_index`) is what playback indexes by.

use serde::{Deserialize, Serialize};

use crate::error::PoseError;
use crate::events::{EventQueue, StreamEvent};
use crate::frame::{FacialFrame, PoseFrame};
use crate::pool::Pool;

pub const MIN_FRAME_RATE: f32 = 1.0;
pub const MAX_FRAME_RATE: f32 = 120.0;
pub const DEFAULT_FRAME_RATE: f32 = 60.0;

/// Whole-frame equality tolerance for facial frames (0..100 weight scale).
pub const FRAME_EQUALITY_THRESHOLD: f32 = 0.1;

/// A complete pose recording.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PoseStream {
    frames: Vec<PoseFrame>,
    frame_rate: f32,
    /// Consumed by exporters only.
    pub looping: bool,
    #[serde(skip)]
    events: EventQueue<StreamEvent>,
}

impl Default for PoseStream {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for PoseStream {
    fn eq(&self, other: &Self) -> bool {
        self.frames == other.frames
            && self.frame_rate == other.frame_rate
            && self.looping == other.looping
    }
}

impl PoseStream {
    pub fn new() -> Self {
        Self {
            frames: Vec::new(),
            frame_rate: DEFAULT_FRAME_RATE,
            looping: false,
            events: EventQueue::default(),
        }
    }

    pub fn with_frame_rate(frame_rate: f32) -> Self {
        let mut stream = Self::new();
        stream.set_frame_rate(frame_rate);
        stream
    }

    /// Append a frame.
    ///
    /// Rejects the empty sentinel and frames whose muscle or bone count differs
    /// from the frames already stored.
    pub fn add_frame(&mut self, frame: PoseFrame) -> Result<(), PoseError> {
        self.check_frame(&frame)?;
        let position = self.frames.len();
        let frame_index = frame.frame_index;
        self.frames.push(frame);
        self.events.push(StreamEvent::FrameAdded {
            position,
            frame_index,
        });
        Ok(())
    }

    /// The checks `add_frame` applies, without taking the frame.
    pub fn check_frame(&self, frame: &PoseFrame) -> Result<(), PoseError> {
        if frame.is_empty() {
            return Err(PoseError::invalid_argument(
                "cannot add an empty pose frame",
            ));
        }
        if let Some(first) = self.frames.first() {
            if first.muscles.len() != frame.muscles.len() {
                return Err(PoseError::invalid_argument(format!(
                    "frame {} has {} muscles, stream has {}",
                    frame.frame_index,
                    frame.muscles.len(),
                    first.muscles.len()
                )));
            }
            if first.bones.len() != frame.bones.len() {
                return Err(PoseError::invalid_argument(format!(
                    "frame {} has {} bones, stream has {}",
                    frame.frame_index,
                    frame.bones.len(),
                    first.bones.len()
                )));
            }
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.frames.clear();
        self.events.push(StreamEvent::Cleared);
    }

    /// Bulk clear that hands every frame back to `pool` for reuse.
    pub fn recycle_into(&mut self, pool: &mut Pool<PoseFrame>) {
        for frame in self.frames.drain(..) {
            pool.release(frame);
        }
        self.events.push(StreamEvent::Cleared);
    }

    /// Set the nominal rate, clamped to [1, 120]. Non-finite values are ignored.
    pub fn set_frame_rate(&mut self, frame_rate: f32) {
        if !frame_rate.is_finite() {
            log::warn!("ignoring non-finite frame rate {frame_rate}");
            return;
        }
        self.frame_rate = frame_rate.clamp(MIN_FRAME_RATE, MAX_FRAME_RATE);
    }

    #[inline]
    pub fn frame_rate(&self) -> f32 {
        self.frame_rate
    }

    #[inline]
    pub fn frames(&self) -> &[PoseFrame] {
        &self.frames
    }

    #[inline]
    pub fn get(&self, position: usize) -> Option<&PoseFrame> {
        self.frames.get(position)
    }

    #[inline]
    pub fn last(&self) -> Option<&PoseFrame> {
        self.frames.last()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Time stamp of the last frame (0 for an empty stream).
    pub fn duration(&self) -> f32 {
        self.frames.last().map(|f| f.time).unwrap_or(0.0)
    }

    /// Muscle count shared by every frame, if any frame is stored.
    pub fn muscle_count(&self) -> Option<usize> {
        self.frames.first().map(|f| f.muscles.len())
    }

    pub fn drain_events(&mut self) -> std::vec::Drain<'_, StreamEvent> {
        self.events.drain()
    }

    pub fn to_json(&self) -> Result<String, PoseError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a JSON stream, re-applying the frame-rate clamp and the
    /// per-frame structural checks of `add_frame`.
    pub fn from_json(s: &str) -> Result<Self, PoseError> {
        let raw: PoseStream = serde_json::from_str(s)?;
        let mut stream = PoseStream::with_frame_rate(raw.frame_rate);
        stream.looping = raw.looping;
        for frame in raw.frames {
            stream.add_frame(frame)?;
        }
        stream.events = EventQueue::default();
        Ok(stream)
    }
}

/// Append-only container of facial blend-shape frames.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FacialStream {
    frames: Vec<FacialFrame>,
    #[serde(skip)]
    events: EventQueue<StreamEvent>,
}

impl FacialStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append unconditionally.
    pub fn add_frame(&mut self, frame: FacialFrame) -> Result<(), PoseError> {
        if frame.meshes.is_empty() {
            return Err(PoseError::invalid_argument(
                "cannot add a facial frame without meshes",
            ));
        }
        let position = self.frames.len();
        let frame_index = frame.frame_index;
        self.frames.push(frame);
        self.events.push(StreamEvent::FrameAdded {
            position,
            frame_index,
        });
        Ok(())
    }

    /// Append only if some weight moved by more than [`FRAME_EQUALITY_THRESHOLD`]
    /// since the last stored frame. Returns whether the frame was stored.
    pub fn push_if_changed(&mut self, frame: FacialFrame) -> Result<bool, PoseError> {
        if let Some(last) = self.frames.last() {
            if last.approx_eq(&frame, FRAME_EQUALITY_THRESHOLD) {
                return Ok(false);
            }
        }
        self.add_frame(frame)?;
        Ok(true)
    }

    pub fn clear(&mut self) {
        self.frames.clear();
        self.events.push(StreamEvent::Cleared);
    }

    #[inline]
    pub fn frames(&self) -> &[FacialFrame] {
        &self.frames
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn drain_events(&mut self) -> std::vec::Drain<'_, StreamEvent> {
        self.events.drain()
    }
}
