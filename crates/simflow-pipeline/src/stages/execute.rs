use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use simflow_artifact::{ArtifactCollector, ArtifactError};
use simflow_sandbox::{ExecutionStatus, RunDirectory, SandboxExecutor};

use crate::error::{PipelineError, Result};
use crate::stage::Stage;
use crate::state::{SharedState, StateUpdate};

use super::names;

/// Where and how long scripts run, and where the animation goes.
#[derive(Debug, Clone)]
pub struct ExecuteSettings {
    /// Parent of every run directory.
    pub runs_root: PathBuf,
    /// Wall-clock limit per script.
    pub timeout: Duration,
    /// Animation filename inside the run directory.
    pub animation_file: String,
}

impl Default for ExecuteSettings {
    fn default() -> Self {
        Self {
            runs_root: PathBuf::from("test_runs"),
            timeout: Duration::from_secs(300),
            animation_file: "output.gif".to_string(),
        }
    }
}

/// Runs the generated script in a fresh run directory and collects what it
/// produced.
pub struct ExecuteStage {
    executor: SandboxExecutor,
    collector: ArtifactCollector,
    settings: ExecuteSettings,
}

impl ExecuteStage {
    pub fn new(
        executor: SandboxExecutor,
        collector: ArtifactCollector,
        settings: ExecuteSettings,
    ) -> Self {
        Self {
            executor,
            collector,
            settings,
        }
    }
}

#[async_trait]
impl Stage for ExecuteStage {
    fn name(&self) -> &str {
        names::EXECUTE
    }

    async fn run(&self, state: &SharedState) -> Result<StateUpdate> {
        let spec = state.require_spec()?;
        let script = state.require_script()?;

        let run_dir = RunDirectory::create(&self.settings.runs_root)?;
        tracing::info!(run_id = run_dir.id(), path = %run_dir.path().display(), "Executing script");

        let output = self
            .executor
            .run(script, run_dir.path(), self.settings.timeout)
            .await?;

        match output.status {
            ExecutionStatus::LaunchFailed => {
                return Err(PipelineError::SandboxLaunch {
                    program: self.executor.config().program.clone(),
                    message: output.stderr,
                    run_dir: run_dir.into_path(),
                });
            }
            ExecutionStatus::TimedOut => {
                return Err(PipelineError::SandboxTimeout {
                    timeout: self.settings.timeout,
                    stdout: output.stdout,
                    stderr: output.stderr,
                    run_dir: run_dir.into_path(),
                });
            }
            ExecutionStatus::NonZeroExit(code) => {
                // Not fatal: the summariser reports stderr to the user.
                tracing::warn!(run_id = run_dir.id(), code, "Script exited with an error");
            }
            ExecutionStatus::Completed => {}
        }

        let located = |source: ArtifactError| PipelineError::Artifact {
            source,
            run_dir: Some(run_dir.path().to_path_buf()),
        };

        let frames = self.collector.harvest(run_dir.path()).map_err(located)?;
        let mut update = StateUpdate::new()
            .with_run_dir(run_dir.path())
            .with_output(output.stdout, output.stderr)
            .with_execution(output.status);

        if spec.want_animation {
            if frames.is_empty() {
                tracing::warn!(run_id = run_dir.id(), "Animation requested but no frames were produced");
            } else {
                let collector = self.collector.clone();
                let inputs = frames.clone();
                let target = run_dir.path().join(&self.settings.animation_file);
                let animation =
                    tokio::task::spawn_blocking(move || collector.compose(&inputs, &target))
                        .await
                        .map_err(|e| {
                            PipelineError::Internal(format!("animation task failed: {e}"))
                        })?
                        .map_err(located)?;
                update = update.with_animation(animation.path);
            }
        }

        Ok(update.with_frames(frames))
    }
}
