use async_trait::async_trait;
use simflow_llm::{SharedTransform, TransformRequest, strip_fences};

use crate::error::{PipelineError, Result};
use crate::spec::StructuredSpec;
use crate::stage::Stage;
use crate::state::{Exchange, SharedState, StateUpdate};

use super::names;

/// Turns the free-text request into a validated [`StructuredSpec`].
pub struct InterpretStage {
    transform: SharedTransform,
    template: String,
}

impl InterpretStage {
    pub fn new(transform: SharedTransform, template: impl Into<String>) -> Self {
        Self {
            transform,
            template: template.into(),
        }
    }
}

#[async_trait]
impl Stage for InterpretStage {
    fn name(&self) -> &str {
        names::INTERPRET
    }

    async fn run(&self, state: &SharedState) -> Result<StateUpdate> {
        // Requests pasted from chat sometimes arrive fenced too.
        let request = strip_fences(&state.request);
        if request.is_empty() {
            return Err(PipelineError::Validation("request is empty".to_string()));
        }

        let raw = self
            .transform
            .transform(TransformRequest::new(self.template.as_str()).with("user_input", request.as_str()))
            .await?;
        let spec = StructuredSpec::parse(&strip_fences(&raw))?;

        tracing::debug!(
            task = spec.task.name(),
            want_animation = spec.want_animation,
            "Interpreted request"
        );

        let mut update = StateUpdate::new();
        if state.acknowledgement.is_none() {
            let mut history = state.history.clone();
            history.push(Exchange::new(state.request.as_str(), spec.to_json()));
            update = update.with_history(history);
        }
        Ok(update.with_spec(spec))
    }
}
