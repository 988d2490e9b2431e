use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::{Map, Value};

use super::LlmError;
use crate::config::{self, DEFAULT_MODEL};
use crate::models::Provider;

/// Settings key holding the active model identifier.
pub const SELECTED_MODEL_KEY: &str = "selectedModel";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// One role-tagged prompt message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Per-call overrides. `None` keeps the model default.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CallOptions {
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
}

impl CallOptions {
    pub fn new(temperature: f64, max_tokens: u32) -> Self {
        Self {
            temperature: Some(temperature),
            max_tokens: Some(max_tokens),
        }
    }
}

/// Active model with its provider, credential and default limits.
#[derive(Debug, Clone)]
pub struct ResolvedModel {
    pub model: String,
    pub provider: Provider,
    pub api_key: SecretString,
    pub max_tokens: u32,
    pub temperature: f64,
}

impl ResolvedModel {
    /// Settings keys `from_settings` reads.
    pub fn settings_keys() -> [&'static str; 3] {
        [
            SELECTED_MODEL_KEY,
            Provider::OpenAi.credential_key(),
            Provider::Anthropic.credential_key(),
        ]
    }

    /// Resolve the selected model (or the default) and its provider's
    /// credential. A blank credential counts as missing.
    pub fn from_settings(settings: &Map<String, Value>) -> Result<Self, LlmError> {
        let model = settings
            .get(SELECTED_MODEL_KEY)
            .and_then(Value::as_str)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(DEFAULT_MODEL);

        let spec =
            config::model_spec(model).ok_or_else(|| LlmError::UnknownModel(model.to_string()))?;

        let api_key = settings
            .get(spec.provider.credential_key())
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(LlmError::MissingCredential {
                provider: spec.provider.display_name(),
            })?;

        let resolved = Self {
            model: spec.id.to_string(),
            provider: spec.provider,
            api_key: SecretString::from(api_key.to_string()),
            max_tokens: spec.max_tokens,
            temperature: spec.temperature,
        };
        tracing::info!(
            model = %resolved.model,
            provider = %resolved.provider,
            key = %resolved.masked_key(),
            "Resolved model configuration"
        );
        Ok(resolved)
    }

    /// Loggable form of the credential: first 8 and last 4 characters.
    pub fn masked_key(&self) -> String {
        let key = self.api_key.expose_secret();
        let chars: Vec<char> = key.chars().collect();
        if chars.len() <= 12 {
            return "***".to_string();
        }
        let head: String = chars[..8].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    }
}

/// Provider-shaped POST ready for the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Value,
}

/// Raw transport result: status plus undecoded body text.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn settings(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn default_model_when_unselected() {
        let resolved =
            ResolvedModel::from_settings(&settings(json!({ "openaiKey": "sk-test-1234567890" })))
                .unwrap();
        assert_eq!(resolved.model, DEFAULT_MODEL);
        assert_eq!(resolved.provider, Provider::OpenAi);
        assert_eq!(resolved.max_tokens, 4096);
    }

    #[test]
    fn anthropic_model_needs_anthropic_key() {
        let err = ResolvedModel::from_settings(&settings(json!({
            "selectedModel": "claude-3-5-haiku-20241022",
            "openaiKey": "sk-test-1234567890"
        })))
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Anthropic API key not found. Please save your API key in settings."
        );
    }

    #[test]
    fn blank_key_is_missing() {
        let err = ResolvedModel::from_settings(&settings(json!({ "openaiKey": "   " }))).unwrap_err();
        assert!(matches!(err, LlmError::MissingCredential { provider: "OpenAI" }));
    }

    #[test]
    fn unknown_model_rejected() {
        let err = ResolvedModel::from_settings(&settings(json!({
            "selectedModel": "gpt-2",
            "openaiKey": "sk-test-1234567890"
        })))
        .unwrap_err();
        assert!(matches!(err, LlmError::UnknownModel(m) if m == "gpt-2"));
    }

    #[test]
    fn masked_key_hides_middle() {
        let resolved = ResolvedModel::from_settings(&settings(json!({
            "selectedModel": "claude-3-7-sonnet-20250219",
            "anthropicKey": "sk-ant-abcdefghijklmnop"
        })))
        .unwrap();
        assert_eq!(resolved.masked_key(), "sk-ant-a...mnop");
        assert!(!format!("{resolved:?}").contains("abcdefghijklmnop"));
    }

    #[test]
    fn short_key_fully_masked() {
        let resolved =
            ResolvedModel::from_settings(&settings(json!({ "openaiKey": "short" }))).unwrap();
        assert_eq!(resolved.masked_key(), "***");
    }
}
