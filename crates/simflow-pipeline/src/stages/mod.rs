//! The concrete stages of a simulation run.
//!
//! Each stage receives everything it needs at construction; none of them
//! reach for process-wide state.

mod chat;
mod codegen;
mod execute;
mod interpret;
mod summarise;

pub use chat::ChatStage;
pub use codegen::CodegenStage;
pub use execute::{ExecuteSettings, ExecuteStage};
pub use interpret::InterpretStage;
pub use summarise::SummariseStage;

/// Registration names used by [`build_pipeline`](crate::build_pipeline).
pub mod names {
    pub const CHAT: &str = "chat";
    pub const INTERPRET: &str = "interpret";
    pub const CODEGEN: &str = "codegen";
    pub const EXECUTE: &str = "execute";
    pub const SUMMARISE: &str = "summarise";
}
