//! Motion Capture Core (engine-agnostic)
//!
//! Records humanoid poses from a host engine into an append-only
//! [`PoseStream`], plays them back with a tick-driven [`Player`], converts them
//! into keyframe curves, and reads/writes them as one CSV line per frame.
//!
//! The host (avatar, muscle solver, IK) is reached only through the traits in
//! [`host`]; nothing here renders, solves or touches a scene graph.

pub mod config;
pub mod csv;
pub mod curves;
pub mod error;
pub mod events;
pub mod frame;
pub mod host;
pub mod math;
pub mod persistence;
pub mod player;
pub mod pool;
pub mod recorder;
pub mod stream;

// Re-exports for consumers (adapters)
pub use config::{PlayerConfig, RecorderConfig, RootConvention};
pub use csv::CsvPoseCodec;
pub use curves::{
    build_facial_clip, build_pose_clip, AnimationClip, AnimationCurve, CurveBinding, Keyframe,
    PoseCurveOptions,
};
pub use error::{FormatError, PoseError};
pub use events::{LoadEvent, PlayerEvent, RecorderEvent, StreamEvent};
pub use frame::{BoneSample, FacialFrame, MeshBlendShapes, PoseFrame};
pub use host::{
    BoneId, BonePathCache, HumanPose, HumanoidHost, IkGoal, IkGoalSolver, PoseHandler, Skeleton,
};
pub use math::Transform;
pub use persistence::{BackgroundCsvLoader, CsvFileStore, LoadStatus, MemoryStore, PoseStore};
pub use player::{Player, PlayerState};
pub use pool::{Pool, Poolable};
pub use recorder::{Recorder, RecorderState};
pub use stream::{FacialStream, PoseStream};

/// Crate result type
pub type Result<T> = core::result::Result<T, PoseError>;
