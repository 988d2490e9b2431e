pub mod extraction;
pub mod llm;
pub mod parser;
pub mod enrichment;
pub mod orchestrator;

pub use orchestrator::{finalize_profile, PersonaPipeline, PipelineError, PipelineEvent, PipelineStage};
