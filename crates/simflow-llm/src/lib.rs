//! Text-transform service boundary for simflow.
//!
//! Stages that need language understanding, code synthesis or summarization
//! hand a prompt template plus a structured context to a [`TextTransform`]
//! and get free text back. The service is opaque: this crate only defines
//! the boundary, renders templates, and cleans up what comes back.
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  TextTransform trait                    │
//! │  - transform(TransformRequest) -> text  │
//! └─────────────────────────────────────────┘
//!                    │
//!          ┌─────────┴─────────┐
//!          ▼                   ▼
//!   ┌──────────────┐    ┌──────────────┐
//!   │OpenAiTransform│    │MockTransform │
//!   └──────────────┘    └──────────────┘
//! ```

pub mod backend;
pub mod error;
pub mod fence;
pub mod openai;
pub mod request;

pub use backend::{MockResponse, MockTransform, SharedTransform, TextTransform, with_retry};
pub use error::{LlmError, Result};
pub use fence::{FENCE, strip_fences};
pub use openai::{OpenAiConfig, OpenAiTransform};
pub use request::TransformRequest;
