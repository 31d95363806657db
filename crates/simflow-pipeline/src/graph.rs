//! Sequential stage orchestration with streaming progress.

use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;

use futures::{FutureExt, Stream, StreamExt};

use crate::error::{PipelineError, Result, StageFailure};
use crate::stage::Stage;
use crate::state::{SharedState, StateUpdate};

/// Progress of a run, as seen by the consumer of [`StageGraph::execute`].
#[derive(Debug)]
pub enum StageEvent {
    /// A stage finished and its update has been merged.
    Completed { stage: String, update: StateUpdate },
    /// A stage failed. No further events follow.
    Failed(StageFailure),
    /// Every stage finished. No further events follow.
    Finished(SharedState),
}

/// Lazy, finite sequence of [`StageEvent`]s for one run.
pub type StageStream = Pin<Box<dyn Stream<Item = StageEvent> + Send>>;

/// An ordered list of named stages.
///
/// Stages run strictly one after another in registration order. The first
/// failure ends the run; nothing is retried.
#[derive(Clone, Default)]
pub struct StageGraph {
    stages: Vec<(String, Arc<dyn Stage>)>,
}

impl StageGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage under `name`. Names must be unique.
    pub fn register(&mut self, name: impl Into<String>, stage: impl Stage + 'static) -> Result<()> {
        let name = name.into();
        if self.stages.iter().any(|(existing, _)| *existing == name) {
            return Err(PipelineError::DuplicateStage(name));
        }
        tracing::debug!(stage = %name, position = self.stages.len(), "Registered stage");
        self.stages.push((name, Arc::new(stage)));
        Ok(())
    }

    /// Append a stage under its own name.
    pub fn push(&mut self, stage: impl Stage + 'static) -> Result<()> {
        let name = stage.name().to_string();
        self.register(name, stage)
    }

    /// Stage names in execution order.
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Start a run.
    ///
    /// Nothing happens until the stream is polled. Dropping the stream
    /// abandons the run after whatever stage is in flight.
    pub fn execute(&self, initial: SharedState) -> StageStream {
        let stages = self.stages.clone();

        Box::pin(async_stream::stream! {
            let mut state = initial;

            for (name, stage) in stages {
                tracing::info!(stage = %name, "Stage started");

                let outcome = AssertUnwindSafe(stage.run(&state)).catch_unwind().await;
                let result = match outcome {
                    Ok(result) => result,
                    Err(payload) => Err(PipelineError::Internal(format!(
                        "stage panicked: {}",
                        panic_message(payload.as_ref())
                    ))),
                };

                match result {
                    Ok(update) => {
                        tracing::info!(stage = %name, fields = ?update.fields(), "Stage completed");
                        state.merge(update.clone());
                        yield StageEvent::Completed { stage: name, update };
                    }
                    Err(error) => {
                        tracing::error!(stage = %name, kind = %error.kind(), error = %error, "Stage failed");
                        yield StageEvent::Failed(StageFailure { stage: name, error, state });
                        return;
                    }
                }
            }

            tracing::info!("Pipeline finished");
            yield StageEvent::Finished(state);
        })
    }

    /// Run to completion, discarding progress events.
    pub async fn run(&self, initial: SharedState) -> std::result::Result<SharedState, StageFailure> {
        let mut stream = self.execute(initial);
        while let Some(event) = stream.next().await {
            match event {
                StageEvent::Completed { .. } => {}
                StageEvent::Failed(failure) => return Err(failure),
                StageEvent::Finished(state) => return Ok(state),
            }
        }
        Err(StageFailure {
            stage: String::new(),
            error: PipelineError::Internal("event stream ended without a result".to_string()),
            state: SharedState::default(),
        })
    }
}

impl std::fmt::Debug for StageGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageGraph")
            .field("stages", &self.stage_names())
            .finish()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
