use async_trait::async_trait;
use serde_json::json;
use simflow_llm::{SharedTransform, TransformRequest};

use crate::error::{PipelineError, Result};
use crate::stage::Stage;
use crate::state::{SharedState, StateUpdate};

use super::names;

/// Writes the human-readable summary of the run.
pub struct SummariseStage {
    transform: SharedTransform,
    template: String,
}

impl SummariseStage {
    pub fn new(transform: SharedTransform, template: impl Into<String>) -> Self {
        Self {
            transform,
            template: template.into(),
        }
    }
}

/// JSON context handed to the summariser template as `{context}`.
pub(crate) fn summary_context(state: &SharedState) -> serde_json::Value {
    json!({
        "spec": state.spec.as_ref().map(|s| s.to_value()),
        "user_query": state.latest_request(),
        "stdout": state.stdout.as_deref().unwrap_or_default(),
        "stderr": state.stderr.as_deref().unwrap_or_default(),
        "frames_generated": state.frames.len(),
        "animation_produced": state.animation.as_ref().is_some_and(|p| p.exists()),
    })
}

#[async_trait]
impl Stage for SummariseStage {
    fn name(&self) -> &str {
        names::SUMMARISE
    }

    async fn run(&self, state: &SharedState) -> Result<StateUpdate> {
        let context = summary_context(state);
        let summary = self
            .transform
            .transform(TransformRequest::new(self.template.as_str()).with("context", context.to_string()))
            .await?;

        let summary = summary.trim();
        if summary.is_empty() {
            return Err(PipelineError::MalformedOutput(
                "summariser returned no text".to_string(),
            ));
        }
        Ok(StateUpdate::new().with_summary(summary))
    }
}
