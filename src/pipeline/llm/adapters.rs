//! Provider request/response shaping.
//!
//! Each provider is one `ProviderAdapter` variant. Adding a provider means
//! adding an adapter; the caller never branches on provider details.

use secrecy::ExposeSecret;
use serde_json::{json, Value};

use super::types::{ChatMessage, HttpRequest, ResolvedModel, Role};
use super::LlmError;
use crate::config::{ANTHROPIC_API_URL, ANTHROPIC_API_VERSION, OPENAI_API_URL};
use crate::models::Provider;

/// User turn synthesized when a request carries only system text.
pub const ANTHROPIC_PLACEHOLDER_PROMPT: &str = "Please analyze the data.";

pub trait ProviderAdapter: Send + Sync {
    fn provider(&self) -> Provider;

    fn build_request(
        &self,
        model: &ResolvedModel,
        messages: &[ChatMessage],
        max_tokens: u32,
        temperature: f64,
    ) -> HttpRequest;

    /// Completion text from a successful response body.
    fn extract_text(&self, body: &Value) -> Result<String, LlmError>;

    /// User-facing message for a non-success response.
    fn error_message(&self, status: u16, body: &Value) -> String;
}

/// Chat-completions API: messages pass through unchanged.
#[derive(Debug, Clone)]
pub struct OpenAiAdapter {
    endpoint: String,
}

impl OpenAiAdapter {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

impl Default for OpenAiAdapter {
    fn default() -> Self {
        Self::new(OPENAI_API_URL)
    }
}

impl ProviderAdapter for OpenAiAdapter {
    fn provider(&self) -> Provider {
        Provider::OpenAi
    }

    fn build_request(
        &self,
        model: &ResolvedModel,
        messages: &[ChatMessage],
        max_tokens: u32,
        temperature: f64,
    ) -> HttpRequest {
        HttpRequest {
            url: self.endpoint.clone(),
            headers: vec![
                ("Content-Type".into(), "application/json".into()),
                (
                    "Authorization".into(),
                    format!("Bearer {}", model.api_key.expose_secret()),
                ),
            ],
            body: json!({
                "model": model.model,
                "messages": messages,
                "max_tokens": max_tokens,
                "temperature": temperature,
            }),
        }
    }

    fn extract_text(&self, body: &Value) -> Result<String, LlmError> {
        body.pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                LlmError::ResponseParsing("missing choices[0].message.content".into())
            })
    }

    fn error_message(&self, status: u16, body: &Value) -> String {
        body.pointer("/error/message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("OpenAI API request failed with status {status}"))
    }
}

/// Messages API: system text is lifted into `system`, only user turns remain.
#[derive(Debug, Clone)]
pub struct AnthropicAdapter {
    endpoint: String,
}

impl AnthropicAdapter {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

impl Default for AnthropicAdapter {
    fn default() -> Self {
        Self::new(ANTHROPIC_API_URL)
    }
}

impl ProviderAdapter for AnthropicAdapter {
    fn provider(&self) -> Provider {
        Provider::Anthropic
    }

    fn build_request(
        &self,
        model: &ResolvedModel,
        messages: &[ChatMessage],
        max_tokens: u32,
        temperature: f64,
    ) -> HttpRequest {
        let system = messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        let mut turns: Vec<Value> = messages
            .iter()
            .filter(|m| m.role == Role::User)
            .map(|m| json!({ "role": "user", "content": m.content }))
            .collect();
        if turns.is_empty() {
            turns.push(json!({ "role": "user", "content": ANTHROPIC_PLACEHOLDER_PROMPT }));
        }

        HttpRequest {
            url: self.endpoint.clone(),
            headers: vec![
                ("Content-Type".into(), "application/json".into()),
                ("x-api-key".into(), model.api_key.expose_secret().to_string()),
                ("anthropic-version".into(), ANTHROPIC_API_VERSION.into()),
            ],
            body: json!({
                "model": model.model,
                "system": system.trim(),
                "messages": turns,
                "max_tokens": max_tokens,
                "temperature": temperature,
            }),
        }
    }

    fn extract_text(&self, body: &Value) -> Result<String, LlmError> {
        body.pointer("/content/0/text")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| LlmError::ResponseParsing("missing content[0].text".into()))
    }

    fn error_message(&self, status: u16, body: &Value) -> String {
        if let Some(message) = body.pointer("/error/message").and_then(Value::as_str) {
            return message.to_string();
        }
        match body.get("error") {
            Some(Value::String(text)) if !text.is_empty() => text.clone(),
            _ => format!("Anthropic API request failed with status {status}"),
        }
    }
}

/// One adapter per supported provider, on the public endpoints.
pub fn default_adapters() -> Vec<Box<dyn ProviderAdapter>> {
    vec![
        Box::new(OpenAiAdapter::default()),
        Box::new(AnthropicAdapter::default()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn model(provider: Provider) -> ResolvedModel {
        ResolvedModel {
            model: "test-model".into(),
            provider,
            api_key: SecretString::from("sk-secret-key-0000".to_string()),
            max_tokens: 4096,
            temperature: 0.5,
        }
    }

    fn header<'a>(request: &'a HttpRequest, name: &str) -> Option<&'a str> {
        request
            .headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn openai_passes_messages_through() {
        let messages = vec![ChatMessage::system("be terse"), ChatMessage::user("hello")];
        let request =
            OpenAiAdapter::default().build_request(&model(Provider::OpenAi), &messages, 100, 0.7);
        assert_eq!(request.url, OPENAI_API_URL);
        assert_eq!(header(&request, "Authorization"), Some("Bearer sk-secret-key-0000"));
        assert_eq!(request.body["messages"][0]["role"], "system");
        assert_eq!(request.body["messages"][1]["content"], "hello");
        assert_eq!(request.body["max_tokens"], 100);
        assert_eq!(request.body["model"], "test-model");
    }

    #[test]
    fn anthropic_joins_system_messages() {
        let messages = vec![
            ChatMessage::system("rule one"),
            ChatMessage::user("question"),
            ChatMessage::system("rule two"),
        ];
        let request = AnthropicAdapter::default().build_request(
            &model(Provider::Anthropic),
            &messages,
            50,
            0.5,
        );
        assert_eq!(request.body["system"], "rule one\nrule two");
        let turns = request.body["messages"].as_array().unwrap();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0]["content"], "question");
        assert_eq!(header(&request, "x-api-key"), Some("sk-secret-key-0000"));
        assert_eq!(header(&request, "anthropic-version"), Some("2023-06-01"));
    }

    #[test]
    fn anthropic_synthesizes_user_turn() {
        let messages = vec![ChatMessage::system("only system")];
        let request = AnthropicAdapter::default().build_request(
            &model(Provider::Anthropic),
            &messages,
            50,
            0.5,
        );
        assert_eq!(request.body["messages"][0]["role"], "user");
        assert_eq!(request.body["messages"][0]["content"], ANTHROPIC_PLACEHOLDER_PROMPT);
    }

    #[test]
    fn extract_text_paths() {
        let openai = json!({ "choices": [{ "message": { "content": "hi" } }] });
        assert_eq!(OpenAiAdapter::default().extract_text(&openai).unwrap(), "hi");

        let anthropic = json!({ "content": [{ "type": "text", "text": "yo" }] });
        assert_eq!(AnthropicAdapter::default().extract_text(&anthropic).unwrap(), "yo");

        assert!(matches!(
            OpenAiAdapter::default().extract_text(&json!({})),
            Err(LlmError::ResponseParsing(_))
        ));
    }

    #[test]
    fn error_message_prefers_provider_text() {
        let body = json!({ "error": { "message": "Rate limit exceeded" } });
        assert_eq!(OpenAiAdapter::default().error_message(429, &body), "Rate limit exceeded");
        assert_eq!(
            OpenAiAdapter::default().error_message(500, &json!({})),
            "OpenAI API request failed with status 500"
        );
    }

    #[test]
    fn anthropic_error_accepts_plain_string() {
        let adapter = AnthropicAdapter::default();
        assert_eq!(adapter.error_message(502, &json!({ "error": "Bad gateway" })), "Bad gateway");
        assert_eq!(
            adapter.error_message(401, &json!({})),
            "Anthropic API request failed with status 401"
        );
    }
}
