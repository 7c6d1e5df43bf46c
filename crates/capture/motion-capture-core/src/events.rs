//! Discrete signals emitted by streams and engines.
//!
//! Components queue events as they happen; listeners (UI counters, save
//! dialogs, diagnostics) drain them after each tick.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum StreamEvent {
    FrameAdded { position: usize, frame_index: u32 },
    Cleared,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum RecorderEvent {
    Started,
    /// A captured frame was appended at `position` of the recording.
    FrameAdded {
        position: usize,
        frame_index: u32,
    },
    Stopped {
        frames: usize,
    },
    FrameDropped {
        frame_index: u32,
        reason: String,
    },
    /// Diagnostic only: `1 / (elapsed / frames)`.
    MeasuredFrameRate {
        fps: f32,
    },
    Persisted {
        frames: usize,
    },
    PersistFailed {
        reason: String,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum PlayerEvent {
    Started { start_frame: usize },
    Stopped,
    PlaybackCompleted { frames: usize },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum LoadEvent {
    /// Fraction of the file consumed, 0..=1.
    Progress { progress: f32 },
    Completed { frames: usize, skipped_lines: usize },
    Failed { reason: String },
}

/// FIFO of pending events with a drain-style reader.
#[derive(Clone, Debug)]
pub struct EventQueue<E> {
    pending: Vec<E>,
}

impl<E> Default for EventQueue<E> {
    fn default() -> Self {
        Self {
            pending: Vec::new(),
        }
    }
}

impl<E> EventQueue<E> {
    #[inline]
    pub fn push(&mut self, event: E) {
        self.pending.push(event);
    }

    /// Hand every queued event to the caller, oldest first.
    #[inline]
    pub fn drain(&mut self) -> std::vec::Drain<'_, E> {
        self.pending.drain(..)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.pending.len()
    }
}
