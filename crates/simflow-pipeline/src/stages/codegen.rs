use async_trait::async_trait;
use simflow_llm::{SharedTransform, TransformRequest, strip_fences};

use crate::error::{PipelineError, Result};
use crate::stage::Stage;
use crate::state::{SharedState, StateUpdate};

use super::names;

/// Generates the script for the validated spec.
pub struct CodegenStage {
    transform: SharedTransform,
    template: String,
}

impl CodegenStage {
    pub fn new(transform: SharedTransform, template: impl Into<String>) -> Self {
        Self {
            transform,
            template: template.into(),
        }
    }
}

#[async_trait]
impl Stage for CodegenStage {
    fn name(&self) -> &str {
        names::CODEGEN
    }

    async fn run(&self, state: &SharedState) -> Result<StateUpdate> {
        let spec = state.require_spec()?;

        let raw = self
            .transform
            .transform(TransformRequest::new(self.template.as_str()).with("spec", spec.to_json()))
            .await?;
        let script = strip_fences(&raw);
        if script.is_empty() {
            return Err(PipelineError::MalformedOutput(
                "code generation returned an empty script".to_string(),
            ));
        }

        tracing::debug!(lines = script.lines().count(), "Generated script");
        Ok(StateUpdate::new().with_script(script))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use crate::spec::StructuredSpec;
    use simflow_llm::{FENCE, MockTransform};
    use std::sync::Arc;

    fn with_spec() -> SharedState {
        let mut state = SharedState::new("sine");
        state.spec = Some(
            StructuredSpec::parse(r#"{"task": "plot_signal", "params": {"freq": 2}}"#).unwrap(),
        );
        state
    }

    #[tokio::test]
    async fn test_script_has_no_fence_lines() {
        let mock = Arc::new(MockTransform::with_text(
            "```octave\nt = linspace(0, 1, 100);\nplot(t, sin(2*pi*2*t));\n```\n",
        ));
        let stage = CodegenStage::new(mock.clone(), "Spec: {spec}");

        let update = stage.run(&with_spec()).await.unwrap();
        let script = update.script.unwrap();
        assert_eq!(script, "t = linspace(0, 1, 100);\nplot(t, sin(2*pi*2*t));");
        assert!(!script.lines().next().unwrap().starts_with(FENCE));
        assert!(!script.lines().last().unwrap().starts_with(FENCE));

        let prompt = &mock.prompts()[0];
        assert!(prompt.starts_with("Spec: {"));
        assert!(prompt.contains("\"task\":\"plot_signal\""));
    }

    #[tokio::test]
    async fn test_missing_spec() {
        let stage = CodegenStage::new(Arc::new(MockTransform::with_text("x")), "{spec}");
        let err = stage.run(&SharedState::new("sine")).await.unwrap_err();
        assert!(matches!(err, PipelineError::MissingField("spec")));
    }

    #[tokio::test]
    async fn test_empty_script_is_service_error() {
        let stage = CodegenStage::new(
            Arc::new(MockTransform::with_text("```octave\n```")),
            "{spec}",
        );
        let err = stage.run(&with_spec()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Service);
    }
}
