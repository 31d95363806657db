//! Transform over an OpenAI-style `/chat/completions` endpoint.
//!
//! Gemini, OpenAI and Ollama all speak this dialect, so one client covers
//! every configured backend. Each call is a single user message; the reply's
//! first choice is the transform output.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};

use crate::backend::{TextTransform, with_retry};
use crate::error::{LlmError, Result};
use crate::request::TransformRequest;

const DEFAULT_TIMEOUT_SECS: u64 = 300;

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Endpoint, model and call policy for [`OpenAiTransform`].
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Sent as a bearer token; `None` for keyless local servers.
    pub api_key: Option<String>,
    /// Everything before `/chat/completions`.
    pub base_url: String,
    pub model: String,
    pub temperature: Option<f32>,
    /// Per-attempt HTTP timeout.
    pub timeout: Duration,
    /// Extra attempts after a transient failure.
    pub max_retries: u32,
    /// First backoff delay; doubles per attempt.
    pub retry_backoff: Duration,
    /// Label used in logs.
    pub name: String,
}

impl OpenAiConfig {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: None,
            base_url: base_url.into(),
            model: model.into(),
            temperature: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: 2,
            retry_backoff: Duration::from_millis(500),
            name: "openai".to_string(),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Transient failures are retried `max_retries` times, starting at `backoff`.
    pub fn with_retries(mut self, max_retries: u32, backoff: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_backoff = backoff;
        self
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// OpenAI Transform
// ─────────────────────────────────────────────────────────────────────────────

/// HTTP client for one configured backend.
pub struct OpenAiTransform {
    client: Client,
    config: OpenAiConfig,
}

impl OpenAiTransform {
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                LlmError::Config(format!("cannot build HTTP client for {}: {e}", config.name))
            })?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &OpenAiConfig {
        &self.config
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.config.api_key.as_deref() {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    fn chat_request<'a>(&'a self, prompt: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.config.temperature,
        }
    }

    async fn read_reply(response: Response) -> Result<String> {
        let status = response.status();
        let body = response.text().await?;
        if status.is_success() {
            parse_chat_body(&body)
        } else {
            Err(error_from_status(status.as_u16(), &body))
        }
    }
}

/// Extract the first choice's text from a chat completions body.
fn parse_chat_body(body: &str) -> Result<String> {
    let parsed: ChatResponse = serde_json::from_str(body)?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| LlmError::InvalidResponse("response contained no text".to_string()))
}

/// Classify a non-2xx reply, preferring the provider's own message.
fn error_from_status(status: u16, body: &str) -> LlmError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .map(|e| e.error.message)
        .or_else(|_| {
            // Gemini's compatibility endpoint wraps the error in an array.
            serde_json::from_str::<Vec<ErrorBody>>(body).map(|mut v| {
                v.pop()
                    .map(|e| e.error.message)
                    .unwrap_or_else(|| body.to_string())
            })
        })
        .unwrap_or_else(|_| format!("HTTP {status}: {body}"));

    match status {
        401 | 403 => LlmError::Auth(message),
        429 => LlmError::RateLimit(message),
        500..=599 => LlmError::Backend(format!("HTTP {status}: {message}")),
        _ => LlmError::Backend(message),
    }
}

#[async_trait]
impl TextTransform for OpenAiTransform {
    async fn transform(&self, request: TransformRequest) -> Result<String> {
        let prompt = request.render()?;
        let body = self.chat_request(&prompt);

        tracing::debug!(
            backend = %self.config.name,
            model = %self.config.model,
            prompt_chars = prompt.len(),
            "Sending chat completion request"
        );

        with_retry(
            self.config.max_retries,
            self.config.retry_backoff,
            &self.config.name,
            || async {
                let response = self
                    .authorize(self.client.post(self.completions_url()))
                    .json(&body)
                    .send()
                    .await?;
                Self::read_reply(response).await
            },
        )
        .await
    }

    fn name(&self) -> &str {
        &self.config.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completions_url_trims_slash() {
        let transform =
            OpenAiTransform::new(OpenAiConfig::new("http://localhost:11434/v1/", "m")).unwrap();
        assert_eq!(
            transform.completions_url(),
            "http://localhost:11434/v1/chat/completions"
        );
    }

    #[test]
    fn test_chat_request_shape() {
        let transform = OpenAiTransform::new(
            OpenAiConfig::new("http://x", "gemini-2.0-flash").with_temperature(Some(0.2)),
        )
        .unwrap();
        let json = serde_json::to_value(transform.chat_request("hello")).unwrap();
        assert_eq!(json["model"], "gemini-2.0-flash");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "hello");
        assert!((json["temperature"].as_f64().unwrap() - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_chat_request_omits_temperature() {
        let transform = OpenAiTransform::new(OpenAiConfig::new("http://x", "m")).unwrap();
        let json = serde_json::to_value(transform.chat_request("hi")).unwrap();
        assert!(json.get("temperature").is_none());
    }

    #[test]
    fn test_parse_chat_body() {
        let body = r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"ok"}}]}"#;
        assert_eq!(parse_chat_body(body).unwrap(), "ok");
    }

    #[test]
    fn test_parse_chat_body_empty_choices() {
        let err = parse_chat_body(r#"{"choices":[]}"#).unwrap_err();
        assert!(matches!(err, LlmError::InvalidResponse(_)));

        let err = parse_chat_body(r#"{"choices":[{"message":{"content":"  "}}]}"#).unwrap_err();
        assert!(matches!(err, LlmError::InvalidResponse(_)));
    }

    #[test]
    fn test_parse_chat_body_malformed() {
        let err = parse_chat_body("<html>").unwrap_err();
        assert!(matches!(err, LlmError::Serialization(_)));
    }

    #[test]
    fn test_error_from_status() {
        let body = r#"{"error":{"message":"bad key"}}"#;
        assert!(matches!(error_from_status(401, body), LlmError::Auth(m) if m == "bad key"));
        assert!(matches!(error_from_status(429, body), LlmError::RateLimit(_)));
        assert!(matches!(error_from_status(503, body), LlmError::Backend(_)));

        let wrapped = r#"[{"error":{"message":"quota exhausted"}}]"#;
        assert!(
            matches!(error_from_status(429, wrapped), LlmError::RateLimit(m) if m == "quota exhausted")
        );

        match error_from_status(400, "plain text") {
            LlmError::Backend(m) => assert!(m.contains("HTTP 400")),
            other => panic!("Expected Backend, got: {other:?}"),
        }
    }
}
