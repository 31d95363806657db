//! Text-transform trait and implementations.
//!
//! This module defines the abstraction over the external collaborator and
//! provides a mock implementation for testing.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{LlmError, Result};
use crate::request::TransformRequest;

// ─────────────────────────────────────────────────────────────────────────────
// Shared Retry Logic
// ─────────────────────────────────────────────────────────────────────────────

/// Execute an async operation with exponential backoff retry.
///
/// Retries only on transient errors (network failures, rate limits).
/// Non-retryable errors are returned immediately.
pub async fn with_retry<F, Fut, T>(
    max_retries: u32,
    initial_backoff: Duration,
    backend_name: &str,
    mut f: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut backoff = initial_backoff;
    let mut attempt = 0;

    loop {
        match f().await {
            Ok(result) => return Ok(result),
            Err(e) if !e.is_retryable() || attempt >= max_retries => return Err(e),
            Err(e) => {
                attempt += 1;
                tracing::warn!(
                    backend = backend_name,
                    attempt = attempt,
                    max_retries = max_retries,
                    backoff_ms = backoff.as_millis() as u64,
                    error = %e,
                    "Request failed, retrying"
                );
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// TextTransform Trait
// ─────────────────────────────────────────────────────────────────────────────

/// The external natural-language / code-generation collaborator.
///
/// Implementations turn a rendered prompt into free text. Calls block until
/// the service answers or fails; no local timeout is imposed here beyond
/// whatever the implementation's transport enforces.
#[async_trait]
pub trait TextTransform: Send + Sync {
    /// Render the request and return the service's free-text answer.
    async fn transform(&self, request: TransformRequest) -> Result<String>;

    /// Get the name of this backend.
    fn name(&self) -> &str;
}

/// A transform that can be shared across stages and runs.
pub type SharedTransform = Arc<dyn TextTransform>;

// ─────────────────────────────────────────────────────────────────────────────
// Mock Transform
// ─────────────────────────────────────────────────────────────────────────────

/// A canned answer for [`MockTransform`].
#[derive(Debug)]
pub enum MockResponse {
    /// Return this text.
    Text(String),
    /// Fail with this error.
    Error(LlmError),
}

impl From<&str> for MockResponse {
    fn from(text: &str) -> Self {
        MockResponse::Text(text.to_string())
    }
}

impl From<String> for MockResponse {
    fn from(text: String) -> Self {
        MockResponse::Text(text)
    }
}

impl From<LlmError> for MockResponse {
    fn from(err: LlmError) -> Self {
        MockResponse::Error(err)
    }
}

/// A mock transform for testing purposes.
///
/// Returns pre-configured responses in order. Requests are rendered first, so
/// a template/context mismatch surfaces exactly as it would in production.
#[derive(Debug)]
pub struct MockTransform {
    name: String,
    responses: Mutex<VecDeque<MockResponse>>,
    request_log: Mutex<Vec<TransformRequest>>,
    prompt_log: Mutex<Vec<String>>,
}

impl MockTransform {
    /// Create a new mock with the given responses.
    ///
    /// If more requests are made than responses available, an error is returned.
    pub fn new<I, R>(responses: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<MockResponse>,
    {
        Self {
            name: "mock".to_string(),
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
            request_log: Mutex::new(Vec::new()),
            prompt_log: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock with exactly one queued text; later calls fail like a
    /// drained queue.
    pub fn with_text(text: impl Into<String>) -> Self {
        Self::new([MockResponse::Text(text.into())])
    }

    /// Queue another response.
    pub fn push(&self, response: impl Into<MockResponse>) {
        self.responses.lock().push_back(response.into());
    }

    /// All requests that were made to this mock.
    pub fn requests(&self) -> Vec<TransformRequest> {
        self.request_log.lock().clone()
    }

    /// The rendered prompt of every request.
    pub fn prompts(&self) -> Vec<String> {
        self.prompt_log.lock().clone()
    }

    /// Get the number of requests made.
    pub fn request_count(&self) -> usize {
        self.request_log.lock().len()
    }
}

#[async_trait]
impl TextTransform for MockTransform {
    async fn transform(&self, request: TransformRequest) -> Result<String> {
        let prompt = request.render()?;
        self.request_log.lock().push(request);
        self.prompt_log.lock().push(prompt);

        match self.responses.lock().pop_front() {
            Some(MockResponse::Text(text)) => Ok(text),
            Some(MockResponse::Error(err)) => Err(err),
            None => Err(LlmError::Backend(
                "MockTransform: no more responses available".to_string(),
            )),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
