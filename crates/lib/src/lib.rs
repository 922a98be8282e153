//! # InsightQL
//!
//! This crate turns natural-language business questions into read-only SQL, runs
//! them against a warehouse and picks a presentation for the result. The work is
//! done by a [`Pipeline`] of prompt-driven stages backed by a configurable AI
//! provider and a storage provider.

pub mod constants;
pub mod decode;
pub mod errors;
pub mod guardrail;
pub mod pipeline;
pub mod prompts;
pub mod providers;
pub mod response;
pub mod schema;
pub mod types;

pub use errors::PromptError;
pub use pipeline::{
    Failure, FailureCode, Pipeline, PipelineBuilder, PipelineSettings, RequestState, Stage,
    StageTask, StatePatch, Task,
};
pub use response::ChatResponse;
pub use schema::{SchemaProvider, SchemaSnapshot, SchemaSource};
