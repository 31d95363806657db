//! Frame harvesting and animation assembly.
//!
//! A run's script writes numbered image frames into its working directory.
//! This crate finds them, brings them to a common canvas size, and encodes
//! them into a looping animated GIF.
//!
//! ```no_run
//! use simflow_artifact::{ArtifactCollector, FramePattern};
//! use std::path::Path;
//! use std::time::Duration;
//!
//! # fn main() -> Result<(), simflow_artifact::ArtifactError> {
//! let collector = ArtifactCollector::new(FramePattern::default(), Duration::from_millis(100));
//! let run_dir = Path::new("test_runs/3f2a");
//! let frames = collector.harvest(run_dir)?;
//! let animation = collector.compose(&frames, &run_dir.join("output.gif"))?;
//! println!("{} frames -> {}", animation.frame_count, animation.path.display());
//! # Ok(())
//! # }
//! ```

mod collector;
mod compose;
mod error;
mod harvest;

pub use collector::ArtifactCollector;
pub use compose::{Animation, compose, normalize};
pub use error::{ArtifactError, Result};
pub use harvest::{FramePattern, harvest};
