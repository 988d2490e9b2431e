use std::path::PathBuf;

use crate::models::enums::Provider;

/// Application-level constants
pub const APP_NAME: &str = "ProfileRipper";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Exporting-agent tag stamped into every persona's metadata.
pub const EXPORTED_BY: &str = "Profile Ripper Extension";

/// Model used when the settings store has no `selectedModel`.
pub const DEFAULT_MODEL: &str = "o3-mini-2025-01-31";

/// Upper bound on a single provider round-trip. A hung call would otherwise
/// stall the whole pipeline.
pub const MODEL_CALL_TIMEOUT_SECS: u64 = 120;

/// Prefix of the page markup embedded in enrichment prompts (characters).
pub const HTML_PROMPT_CHAR_LIMIT: usize = 8000;

pub const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
pub const ANTHROPIC_API_VERSION: &str = "2023-06-01";

/// Static per-model defaults.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelSpec {
    pub id: &'static str,
    pub provider: Provider,
    pub max_tokens: u32,
    pub temperature: f64,
}

/// Known model identifiers across both providers.
pub const MODEL_CONFIGS: &[ModelSpec] = &[
    ModelSpec {
        id: "o3-mini-2025-01-31",
        provider: Provider::OpenAi,
        max_tokens: 4096,
        temperature: 0.5,
    },
    ModelSpec {
        id: "gpt-4o-2024-11-20",
        provider: Provider::OpenAi,
        max_tokens: 8192,
        temperature: 0.7,
    },
    ModelSpec {
        id: "claude-3-5-haiku-20241022",
        provider: Provider::Anthropic,
        max_tokens: 4096,
        temperature: 0.5,
    },
    ModelSpec {
        id: "claude-3-7-sonnet-20250219",
        provider: Provider::Anthropic,
        max_tokens: 8192,
        temperature: 0.7,
    },
];

/// Look up a model in the static table.
pub fn model_spec(id: &str) -> Option<&'static ModelSpec> {
    MODEL_CONFIGS.iter().find(|spec| spec.id == id)
}

/// Default tracing filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "profile_ripper=info,warn"
}

/// Get the application data directory (~/ProfileRipper/).
/// Falls back to the working directory when no home directory is known.
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Key-value settings file (model selection, credentials, profile list).
pub fn settings_path() -> PathBuf {
    app_data_dir().join("settings.json")
}

/// Default directory for exported persona files.
pub fn exports_dir() -> PathBuf {
    app_data_dir().join("exports")
}
