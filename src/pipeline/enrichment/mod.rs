//! Enrichment stages: raw profile → persona partials via the model caller.
//!
//! Every stage shares one shape (build messages, call, repair-parse,
//! interpret) and differs only in its failure policy:
//! - creative content re-raises every failure
//! - activity analysis and avatar style absorb failures into fixed fallbacks

pub mod activity;
pub mod avatar;
pub mod creative;
pub mod prompts;

pub use activity::{analyze_activity, ActivityAnalysis};
pub use avatar::{avatar_seed, avatar_url, choose_avatar_style};
pub use creative::{generate_creative_content, CreativeContent};

use serde_json::Value;
use thiserror::Error;

use crate::pipeline::llm::{CallOptions, ChatMessage, LlmError, ModelCaller, ResolvedModel};
use crate::pipeline::parser::{parse_model_json, ParseError};

#[derive(Error, Debug)]
pub enum EnrichmentError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Malformed(#[from] ParseError),

    #[error("Invalid {stage} response: {reason}")]
    Validation { stage: &'static str, reason: String },

    #[error("No {0} available for enrichment")]
    MissingInput(&'static str),
}

/// One prompt round-trip and the interpretation of its parsed reply.
pub trait EnrichmentStage: Send + Sync {
    type Output;

    /// Stage name for logs and validation errors.
    fn name(&self) -> &'static str;

    fn call_options(&self) -> CallOptions;

    fn build_messages(&self) -> Vec<ChatMessage>;

    /// Validate the repaired JSON and convert it to the stage output.
    fn interpret(&self, parsed: Value) -> Result<Self::Output, EnrichmentError>;
}

/// Drive one stage: call the model, repair-parse, interpret.
pub async fn run_stage<S: EnrichmentStage>(
    caller: &ModelCaller,
    model: &ResolvedModel,
    stage: &S,
) -> Result<S::Output, EnrichmentError> {
    let messages = stage.build_messages();
    let text = caller.call(model, &messages, stage.call_options()).await?;
    tracing::debug!(stage = stage.name(), chars = text.len(), "Model reply received");
    let parsed = parse_model_json(&text)?;
    stage.interpret(parsed)
}

pub(crate) fn invalid(stage: &'static str, reason: impl Into<String>) -> EnrichmentError {
    EnrichmentError::Validation {
        stage,
        reason: reason.into(),
    }
}
