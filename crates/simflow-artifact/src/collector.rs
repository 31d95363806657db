//! Harvest-and-compose front end used by the pipeline.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::compose::{Animation, compose};
use crate::error::Result;
use crate::harvest::{FramePattern, harvest};

/// Finds a run's frames and turns them into an animation.
#[derive(Debug, Clone)]
pub struct ArtifactCollector {
    pattern: FramePattern,
    frame_delay: Duration,
}

impl Default for ArtifactCollector {
    fn default() -> Self {
        Self::new(FramePattern::default(), Duration::from_millis(100))
    }
}

impl ArtifactCollector {
    pub fn new(pattern: FramePattern, frame_delay: Duration) -> Self {
        Self {
            pattern,
            frame_delay,
        }
    }

    pub fn pattern(&self) -> &FramePattern {
        &self.pattern
    }

    pub fn frame_delay(&self) -> Duration {
        self.frame_delay
    }

    /// Frames in `dir`, in encoding order.
    pub fn harvest(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        harvest(dir, &self.pattern)
    }

    /// Encode `frames` into `output` using the configured delay.
    pub fn compose(&self, frames: &[PathBuf], output: &Path) -> Result<Animation> {
        compose(frames, self.frame_delay, output)
    }
}
