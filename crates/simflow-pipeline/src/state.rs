//! The record threaded through every stage of a run.
//!
//! Stages never mutate [`SharedState`] directly. They read it and return a
//! [`StateUpdate`]; the graph merges the update before the next stage runs.
//! Merging is additive: a field absent from the update keeps its value, a
//! present field replaces it.

use std::path::PathBuf;

use serde::Serialize;
use simflow_sandbox::ExecutionStatus;

use crate::error::{PipelineError, Result};
use crate::spec::StructuredSpec;

/// One request and the reply it got.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Exchange {
    pub request: String,
    pub reply: String,
}

impl Exchange {
    pub fn new(request: impl Into<String>, reply: impl Into<String>) -> Self {
        Self {
            request: request.into(),
            reply: reply.into(),
        }
    }
}

/// Cumulative state of one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SharedState {
    /// The user's free-text request.
    pub request: String,
    /// Acknowledgement produced by the chat stage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acknowledgement: Option<String>,
    /// Conversation so far, oldest first.
    pub history: Vec<Exchange>,
    /// Validated structured spec.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spec: Option<StructuredSpec>,
    /// Generated script, without the bootstrap preamble.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
    /// How the script run ended.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution: Option<ExecutionStatus>,
    /// Directory the script ran in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_dir: Option<PathBuf>,
    /// Frames found after the run, in encoding order.
    pub frames: Vec<PathBuf>,
    /// Composed animation, if one was requested and produced.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub animation: Option<PathBuf>,
    /// Final human-readable summary.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl SharedState {
    /// Fresh state for a request.
    pub fn new(request: impl Into<String>) -> Self {
        Self {
            request: request.into(),
            ..Default::default()
        }
    }

    /// Apply an update: present fields overwrite, absent fields are kept.
    pub fn merge(&mut self, update: StateUpdate) {
        let StateUpdate {
            request,
            acknowledgement,
            history,
            spec,
            script,
            stdout,
            stderr,
            execution,
            run_dir,
            frames,
            animation,
            summary,
        } = update;

        if let Some(v) = request {
            self.request = v;
        }
        if let Some(v) = acknowledgement {
            self.acknowledgement = Some(v);
        }
        if let Some(v) = history {
            self.history = v;
        }
        if let Some(v) = spec {
            self.spec = Some(v);
        }
        if let Some(v) = script {
            self.script = Some(v);
        }
        if let Some(v) = stdout {
            self.stdout = Some(v);
        }
        if let Some(v) = stderr {
            self.stderr = Some(v);
        }
        if let Some(v) = execution {
            self.execution = Some(v);
        }
        if let Some(v) = run_dir {
            self.run_dir = Some(v);
        }
        if let Some(v) = frames {
            self.frames = v;
        }
        if let Some(v) = animation {
            self.animation = Some(v);
        }
        if let Some(v) = summary {
            self.summary = Some(v);
        }
    }

    /// The validated spec, or `MissingField` if interpretation has not run.
    pub fn require_spec(&self) -> Result<&StructuredSpec> {
        self.spec.as_ref().ok_or(PipelineError::MissingField("spec"))
    }

    /// The generated script, or `MissingField` if codegen has not run.
    pub fn require_script(&self) -> Result<&str> {
        self.script
            .as_deref()
            .ok_or(PipelineError::MissingField("script"))
    }

    /// The request that started the current conversation turn.
    pub fn latest_request(&self) -> &str {
        self.history
            .last()
            .map(|e| e.request.as_str())
            .unwrap_or(&self.request)
    }
}

/// A stage's contribution to [`SharedState`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateUpdate {
    pub request: Option<String>,
    pub acknowledgement: Option<String>,
    pub history: Option<Vec<Exchange>>,
    pub spec: Option<StructuredSpec>,
    pub script: Option<String>,
    pub stdout: Option<String>,
    pub stderr: Option<String>,
    pub execution: Option<ExecutionStatus>,
    pub run_dir: Option<PathBuf>,
    pub frames: Option<Vec<PathBuf>>,
    pub animation: Option<PathBuf>,
    pub summary: Option<String>,
}

impl StateUpdate {
    /// An update that changes nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if no field is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Names of the fields this update sets.
    pub fn fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        let mut note = |set: bool, name: &'static str| {
            if set {
                fields.push(name);
            }
        };
        note(self.request.is_some(), "request");
        note(self.acknowledgement.is_some(), "acknowledgement");
        note(self.history.is_some(), "history");
        note(self.spec.is_some(), "spec");
        note(self.script.is_some(), "script");
        note(self.stdout.is_some(), "stdout");
        note(self.stderr.is_some(), "stderr");
        note(self.execution.is_some(), "execution");
        note(self.run_dir.is_some(), "run_dir");
        note(self.frames.is_some(), "frames");
        note(self.animation.is_some(), "animation");
        note(self.summary.is_some(), "summary");
        fields
    }

    pub fn with_acknowledgement(mut self, text: impl Into<String>) -> Self {
        self.acknowledgement = Some(text.into());
        self
    }

    pub fn with_history(mut self, history: Vec<Exchange>) -> Self {
        self.history = Some(history);
        self
    }

    pub fn with_spec(mut self, spec: StructuredSpec) -> Self {
        self.spec = Some(spec);
        self
    }

    pub fn with_script(mut self, script: impl Into<String>) -> Self {
        self.script = Some(script.into());
        self
    }

    pub fn with_output(mut self, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        self.stdout = Some(stdout.into());
        self.stderr = Some(stderr.into());
        self
    }

    pub fn with_execution(mut self, status: ExecutionStatus) -> Self {
        self.execution = Some(status);
        self
    }

    pub fn with_run_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.run_dir = Some(path.into());
        self
    }

    pub fn with_frames(mut self, frames: Vec<PathBuf>) -> Self {
        self.frames = Some(frames);
        self
    }

    pub fn with_animation(mut self, path: impl Into<PathBuf>) -> Self {
        self.animation = Some(path.into());
        self
    }

    pub fn with_summary(mut self, text: impl Into<String>) -> Self {
        self.summary = Some(text.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_update_changes_nothing() {
        let mut state = SharedState::new("plot a sine");
        state.script = Some("x = 1;".into());
        state.frames = vec![PathBuf::from("frame_1.png")];
        let before = state.clone();

        let update = StateUpdate::new();
        assert!(update.is_empty());
        state.merge(update);
        assert_eq!(state, before);
    }

    #[test]
    fn test_merge_is_last_write_wins() {
        let mut state = SharedState::new("req");
        state.merge(StateUpdate::new().with_script("a"));
        state.merge(StateUpdate::new().with_summary("done"));
        state.merge(StateUpdate::new().with_script("b"));

        assert_eq!(state.script.as_deref(), Some("b"));
        assert_eq!(state.summary.as_deref(), Some("done"));
        assert_eq!(state.request, "req");
    }

    #[test]
    fn test_require_fields() {
        let state = SharedState::new("req");
        assert!(matches!(
            state.require_spec(),
            Err(PipelineError::MissingField("spec"))
        ));
        assert!(matches!(
            state.require_script(),
            Err(PipelineError::MissingField("script"))
        ));
    }

    #[test]
    fn test_latest_request() {
        let mut state = SharedState::new("current");
        assert_eq!(state.latest_request(), "current");

        state.history.push(Exchange::new("from history", "ok"));
        assert_eq!(state.latest_request(), "from history");
    }

    #[test]
    fn test_update_fields() {
        let update = StateUpdate::new()
            .with_output("out", "err")
            .with_execution(ExecutionStatus::Completed);
        assert_eq!(update.fields(), vec!["stdout", "stderr", "execution"]);
    }

    #[test]
    fn test_state_serializes_without_empty_options() {
        let state = SharedState::new("req");
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["request"], "req");
        assert!(json.get("spec").is_none());
        assert_eq!(json["frames"], serde_json::json!([]));
    }
}
