//! Recorded CSV takes shared by the motion-capture test suites.
//!
//! Takes are listed in `fixtures/manifest.json` at the workspace root, keyed
//! by name, with the muscle count and rate of the host that wrote them.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use serde::Deserialize;

static TAKES: Lazy<TakeManifest> = Lazy::new(|| {
    serde_json::from_str(include_str!("../../../../fixtures/manifest.json"))
        .expect("fixtures manifest should parse")
});

#[derive(Debug, Deserialize)]
struct TakeManifest {
    poses: BTreeMap<String, PoseEntry>,
}

impl TakeManifest {
    fn pose(&self, name: &str) -> Result<&PoseEntry> {
        self.poses
            .get(name)
            .ok_or_else(|| anyhow!("no recorded take named '{name}' in the manifest"))
    }
}

/// A recorded CSV take plus the taxonomy it was written with.
#[derive(Debug, Clone, Deserialize)]
pub struct PoseEntry {
    /// Location relative to `fixtures/`.
    pub path: String,
    /// Muscle count of the host that wrote the file.
    pub muscles: usize,
    #[serde(default = "default_frame_rate")]
    pub frame_rate: f32,
}

fn default_frame_rate() -> f32 {
    60.0
}

impl PoseEntry {
    pub fn full_path(&self) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../../../fixtures")
            .join(&self.path)
    }

    pub fn read(&self) -> Result<String> {
        let path = self.full_path();
        fs::read_to_string(&path)
            .with_context(|| format!("reading recorded take {}", path.display()))
    }
}

pub mod poses {
    use super::*;

    /// Take names in sorted order.
    pub fn keys() -> Vec<String> {
        TAKES.poses.keys().cloned().collect()
    }

    pub fn entry(name: &str) -> Result<PoseEntry> {
        TAKES.pose(name).cloned()
    }

    pub fn csv(name: &str) -> Result<String> {
        TAKES.pose(name)?.read()
    }

    pub fn path(name: &str) -> Result<PathBuf> {
        Ok(TAKES.pose(name)?.full_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_pose_fixture_is_readable() {
        for key in poses::keys() {
            let text = poses::csv(&key).unwrap();
            assert!(!text.is_empty(), "fixture {key} is empty");
            assert!(poses::path(&key).unwrap().exists());
        }
    }

    #[test]
    fn takes_are_listed_in_name_order_with_their_taxonomy() {
        assert_eq!(
            poses::keys(),
            vec!["walk-forward".to_string(), "walk-forward-corrupt".to_string()]
        );
        let entry = poses::entry("walk-forward").unwrap();
        assert_eq!(entry.muscles, 4);
        assert_eq!(entry.frame_rate, 30.0);
        assert!(entry.full_path().ends_with("poses/walk_forward.csv"));
    }

    #[test]
    fn unknown_fixture_is_an_error() {
        let err = poses::entry("missing").unwrap_err();
        assert!(err.to_string().contains("missing"));
        assert!(poses::csv("missing").is_err());
    }
}
