//! Sequential stage pipeline for simflow.
//!
//! A run threads one [`SharedState`] through an ordered list of stages:
//!
//! ```text
//! request ─▶ [chat] ─▶ interpret ─▶ codegen ─▶ execute ─▶ summarise ─▶ summary
//!                          │            │          │
//!                     TextTransform     │    SandboxExecutor
//!                                TextTransform  + ArtifactCollector
//! ```
//!
//! Each stage returns a [`StateUpdate`] that is merged before the next one
//! starts. [`StageGraph::execute`] streams a [`StageEvent`] per stage and
//! stops at the first failure, reporting a [`StageFailure`] with the state
//! accumulated so far.

pub mod builder;
pub mod error;
pub mod graph;
pub mod prompts;
pub mod spec;
pub mod stage;
pub mod stages;
pub mod state;

pub use builder::{build_pipeline, build_pipeline_with_prompts, executor_config};
pub use error::{ErrorKind, PipelineError, Result, StageFailure};
pub use graph::{StageEvent, StageGraph, StageStream};
pub use prompts::Prompts;
pub use spec::{PlotSignalParams, RunSimulationParams, StructuredSpec, Task};
pub use stage::{FnStage, Stage, StageFn};
pub use state::{Exchange, SharedState, StateUpdate};
