use async_trait::async_trait;
use simflow_llm::{SharedTransform, TransformRequest};

use crate::error::{PipelineError, Result};
use crate::stage::Stage;
use crate::state::{Exchange, SharedState, StateUpdate};

use super::names;

/// Acknowledges the request and opens the conversation history.
pub struct ChatStage {
    transform: SharedTransform,
    template: String,
}

impl ChatStage {
    pub fn new(transform: SharedTransform, template: impl Into<String>) -> Self {
        Self {
            transform,
            template: template.into(),
        }
    }
}

#[async_trait]
impl Stage for ChatStage {
    fn name(&self) -> &str {
        names::CHAT
    }

    async fn run(&self, state: &SharedState) -> Result<StateUpdate> {
        let request =
            TransformRequest::new(self.template.as_str()).with("user_input", state.request.as_str());
        let reply = self.transform.transform(request).await?;
        let reply = reply.trim();
        if reply.is_empty() {
            return Err(PipelineError::MalformedOutput(
                "empty acknowledgement".to_string(),
            ));
        }

        let mut history = state.history.clone();
        history.push(Exchange::new(state.request.as_str(), reply));

        Ok(StateUpdate::new()
            .with_acknowledgement(reply)
            .with_history(history))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use simflow_llm::MockTransform;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_acknowledges_and_records_history() {
        let mock = Arc::new(MockTransform::with_text("  On it!  "));
        let stage = ChatStage::new(mock.clone(), "Ack: {user_input}");

        let update = stage.run(&SharedState::new("plot a sine")).await.unwrap();
        assert_eq!(update.acknowledgement.as_deref(), Some("On it!"));
        assert_eq!(
            update.history,
            Some(vec![Exchange::new("plot a sine", "On it!")])
        );
        assert_eq!(mock.prompts(), vec!["Ack: plot a sine"]);
    }

    #[tokio::test]
    async fn test_empty_reply_is_service_error() {
        let stage = ChatStage::new(Arc::new(MockTransform::with_text("   ")), "{user_input}");
        let err = stage.run(&SharedState::new("x")).await.unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Service);
    }
}
