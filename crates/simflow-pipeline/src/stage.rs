//! The stage abstraction and a closure adapter.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::state::{SharedState, StateUpdate};

/// One step of the pipeline.
///
/// A stage reads the accumulated state and returns what it contributes.
/// Returning an empty [`StateUpdate`] is legal and leaves the state as is.
#[async_trait]
pub trait Stage: Send + Sync {
    /// Default registration name.
    fn name(&self) -> &str;

    /// Run against a read view of the state.
    async fn run(&self, state: &SharedState) -> Result<StateUpdate>;
}

/// Async function backing a [`FnStage`]. Receives its own copy of the state.
pub type StageFn = Arc<
    dyn Fn(SharedState) -> Pin<Box<dyn Future<Output = Result<StateUpdate>> + Send>>
        + Send
        + Sync,
>;

/// A stage built from a closure.
#[derive(Clone)]
pub struct FnStage {
    name: String,
    func: StageFn,
}

impl FnStage {
    /// Wrap an async closure.
    pub fn new<F, Fut>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(SharedState) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<StateUpdate>> + Send + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(move |state| Box::pin(func(state))),
        }
    }
}

impl std::fmt::Debug for FnStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnStage").field("name", &self.name).finish()
    }
}

#[async_trait]
impl Stage for FnStage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, state: &SharedState) -> Result<StateUpdate> {
        (self.func)(state.clone()).await
    }
}
