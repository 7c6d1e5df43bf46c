//! Recorder and player configuration.

use serde::{Deserialize, Serialize};

use crate::error::PoseError;
use crate::host::BoneId;

/// How the character's overall placement is tracked.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RootConvention {
    /// The animated root object's local transform.
    #[default]
    ObjectRoot,
    /// A configured skeletal bone's world transform.
    HipBone,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// Target sample rate in Hz; `<= 0` records every tick.
    pub target_frame_rate: f32,
    pub root_convention: RootConvention,
    /// Required when `root_convention` is `HipBone`.
    pub root_bone: Option<BoneId>,
    /// Frames between measured-rate events when uncapped.
    pub uncapped_measure_interval: u32,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            target_frame_rate: 60.0,
            root_convention: RootConvention::ObjectRoot,
            root_bone: None,
            uncapped_measure_interval: 60,
        }
    }
}

impl RecorderConfig {
    pub fn validate(&self) -> Result<(), PoseError> {
        if !self.target_frame_rate.is_finite() {
            return Err(PoseError::configuration(
                "target_frame_rate must be finite",
            ));
        }
        validate_root(self.root_convention, self.root_bone)
    }

    /// Frames between two measured-rate events.
    pub fn measure_interval(&self) -> u32 {
        if self.target_frame_rate > 0.0 {
            (self.target_frame_rate.round() as u32).max(1)
        } else {
            self.uncapped_measure_interval.max(1)
        }
    }

    pub fn from_json_str(s: &str) -> Result<Self, PoseError> {
        let cfg: Self = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Frame position used by `play()` and restored by `stop()`.
    pub start_frame: usize,
    /// Assumed tick length (seconds) used to seed elapsed time when starting mid-stream.
    pub nominal_tick: f32,
    pub root_convention: RootConvention,
    pub root_bone: Option<BoneId>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            start_frame: 0,
            nominal_tick: 1.0 / 60.0,
            root_convention: RootConvention::ObjectRoot,
            root_bone: None,
        }
    }
}

impl PlayerConfig {
    pub fn validate(&self) -> Result<(), PoseError> {
        if !self.nominal_tick.is_finite() || self.nominal_tick < 0.0 {
            return Err(PoseError::configuration(
                "nominal_tick must be finite and non-negative",
            ));
        }
        validate_root(self.root_convention, self.root_bone)
    }

    pub fn from_json_str(s: &str) -> Result<Self, PoseError> {
        let cfg: Self = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }
}

fn validate_root(convention: RootConvention, bone: Option<BoneId>) -> Result<(), PoseError> {
    if convention == RootConvention::HipBone && bone.is_none() {
        return Err(PoseError::configuration(
            "HipBone root convention requires a root bone",
        ));
    }
    Ok(())
}
