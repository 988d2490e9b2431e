//! Model Caller: one prompt interface over the OpenAI and Anthropic APIs.

pub mod adapters;
pub mod caller;
pub mod transport;
pub mod types;

pub use adapters::{default_adapters, AnthropicAdapter, OpenAiAdapter, ProviderAdapter};
pub use caller::ModelCaller;
pub use transport::{HttpTransport, MockTransport, ReqwestTransport};
pub use types::*;

use thiserror::Error;

use crate::models::Provider;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("{provider} API key not found. Please save your API key in settings.")]
    MissingCredential { provider: &'static str },

    #[error("Unknown model: {0}")]
    UnknownModel(String),

    #[error("No adapter registered for provider {0}")]
    NoAdapter(Provider),

    /// Carries the provider's own error text when it sent one.
    #[error("{message}")]
    ProviderRequest {
        provider: &'static str,
        status: u16,
        message: String,
    },

    #[error("HTTP transport error: {0}")]
    Transport(String),

    #[error("Model call timed out after {0}s")]
    Timeout(u64),

    #[error("Unexpected model response: {0}")]
    ResponseParsing(String),
}
