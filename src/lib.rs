#![forbid(unsafe_code)]

//! # coach-harness
//!
//! Runs named career-coaching tasks against a single text-generation backend
//! and turns the model's free-form reply into a strictly shaped result.
//!
//! A task name resolves through [`TaskRegistry`] to a prompt builder and an
//! output kind. Free-text tasks return the model text unchanged. Structured
//! tasks go through [`normalize::extract_json`] (fence stripping + JSON parse)
//! and a schema coercer that clamps, truncates and defaults fields so the
//! returned value always satisfies its contract.

pub mod error;
pub mod gateway;
pub mod normalize;
pub mod prompts;
pub mod schema;
pub mod tasks;

pub use error::{ErrorBody, ErrorClass, TaskError};
pub use gateway::{
    Attribution, GenerateRequest, GenerationOutcome, NoopUsageSink, OllamaConfig,
    ProviderGateway, TextGenerator, TracingUsageSink, TransportError, UsageSink,
};
pub use prompts::TaskParams;
pub use schema::{Finding, ResumeScore};
pub use tasks::{
    Dispatcher, OutputKind, TaskKind, TaskOutput, TaskRegistry, TaskRequest, TaskStage,
};
