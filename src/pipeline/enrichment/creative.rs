//! Creative-content stage. Load-bearing: every failure propagates.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::prompts::{creative_user, CREATIVE_SYSTEM};
use super::{invalid, run_stage, EnrichmentError, EnrichmentStage};
use crate::models::{EnrichmentPartial, InteractionPreferences, RawProfileRecord};
use crate::pipeline::extraction::page_title_hint;
use crate::pipeline::llm::{CallOptions, ChatMessage, ModelCaller, ResolvedModel};

const STAGE: &str = "creative content";

/// Identity fields produced by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreativeContent {
    pub name: String,
    pub personality: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub communication_style: Option<String>,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub interaction_preferences: InteractionPreferences,
}

impl CreativeContent {
    /// Persona partial carrying only the creative fields.
    pub fn to_partial(&self) -> EnrichmentPartial {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => EnrichmentPartial::new(),
        }
    }
}

struct CreativeStage<'a> {
    record: &'a RawProfileRecord,
    html: &'a str,
}

impl EnrichmentStage for CreativeStage<'_> {
    type Output = CreativeContent;

    fn name(&self) -> &'static str {
        STAGE
    }

    fn call_options(&self) -> CallOptions {
        CallOptions::new(0.7, 1000)
    }

    fn build_messages(&self) -> Vec<ChatMessage> {
        let name_hint = if self.record.has_unknown_name() {
            let hint = page_title_hint(self.html);
            tracing::info!(found = hint.is_some(), "Extracted name is a placeholder, deriving hint");
            hint
        } else {
            None
        };

        vec![
            ChatMessage::system(CREATIVE_SYSTEM),
            ChatMessage::user(creative_user(
                self.record.platform().as_str(),
                &self.record.to_prompt_json(),
                self.html,
                name_hint.as_deref(),
            )),
        ]
    }

    fn interpret(&self, parsed: Value) -> Result<CreativeContent, EnrichmentError> {
        if !parsed.is_object() {
            return Err(invalid(STAGE, "expected a JSON object"));
        }
        let content: CreativeContent =
            serde_json::from_value(parsed).map_err(|e| invalid(STAGE, e.to_string()))?;

        if content.name.trim().is_empty() {
            return Err(invalid(STAGE, "name is empty"));
        }
        if content.personality.trim().is_empty() {
            return Err(invalid(STAGE, "personality is empty"));
        }
        Ok(content)
    }
}

/// Generate the persona's creative fields. Never substitutes defaults.
pub async fn generate_creative_content(
    caller: &ModelCaller,
    model: &ResolvedModel,
    record: &RawProfileRecord,
    html: &str,
) -> Result<CreativeContent, EnrichmentError> {
    let stage = CreativeStage { record, html };
    match run_stage(caller, model, &stage).await {
        Ok(content) => {
            tracing::info!(persona = %content.name, "Creative content generated");
            Ok(content)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Creative content generation failed");
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LinkedInProfile, Provider, UNKNOWN_NAME};
    use crate::pipeline::llm::{LlmError, MockTransport};
    use secrecy::SecretString;
    use serde_json::json;
    use std::sync::Arc;

    fn model() -> ResolvedModel {
        ResolvedModel {
            model: "gpt-4o-2024-11-20".into(),
            provider: Provider::OpenAi,
            api_key: SecretString::from("sk-test-0123456789".to_string()),
            max_tokens: 8192,
            temperature: 0.7,
        }
    }

    fn record(name: &str) -> RawProfileRecord {
        RawProfileRecord::Linkedin(LinkedInProfile {
            name: name.into(),
            headline: "Staff Engineer".into(),
            location: "Berlin".into(),
            photo_url: String::new(),
            about: String::new(),
            experience: vec![],
            education: vec![],
            skills: vec!["Rust".into()],
            profile_url: "https://www.linkedin.com/in/jane".into(),
        })
    }

    fn openai_reply(content: &str) -> String {
        json!({ "choices": [{ "message": { "content": content } }] }).to_string()
    }

    const CREATIVE: &str = r#"{
        "name": "The Systems Whisperer",
        "personality": "Calm, analytical mentor",
        "background": "Spent a decade taming distributed systems.",
        "communicationStyle": "Concise and kind",
        "interests": ["Rust", "Observability"],
        "interactionPreferences": { "likes": ["clear specs"], "dislikes": ["flaky tests"] }
    }"#;

    #[tokio::test]
    async fn valid_reply_becomes_content() {
        let mock = Arc::new(MockTransport::new().with_response(200, openai_reply(CREATIVE)));
        let caller = ModelCaller::new(mock.clone());
        let content = generate_creative_content(&caller, &model(), &record("Jane Doe"), "<html></html>")
            .await
            .unwrap();
        assert_eq!(content.name, "The Systems Whisperer");
        assert_eq!(content.interests, vec!["Rust", "Observability"]);
        assert_eq!(content.interaction_preferences.dislikes, vec!["flaky tests"]);

        let sent = &mock.requests()[0];
        assert_eq!(sent.body["temperature"], 0.7);
        assert_eq!(sent.body["max_tokens"], 1000);
    }

    #[tokio::test]
    async fn fenced_reply_is_repaired() {
        let fenced = format!("Here you go:\n```json\n{CREATIVE}\n```");
        let mock = Arc::new(MockTransport::new().with_response(200, openai_reply(&fenced)));
        let content = generate_creative_content(&ModelCaller::new(mock), &model(), &record("Jane"), "")
            .await
            .unwrap();
        assert_eq!(content.personality, "Calm, analytical mentor");
    }

    #[tokio::test]
    async fn malformed_reply_propagates() {
        let mock = Arc::new(MockTransport::new().with_response(200, openai_reply("I refuse.")));
        let err = generate_creative_content(&ModelCaller::new(mock), &model(), &record("Jane"), "")
            .await
            .unwrap_err();
        assert!(matches!(err, EnrichmentError::Malformed(_)));
    }

    #[tokio::test]
    async fn missing_personality_is_validation_error() {
        let mock = Arc::new(
            MockTransport::new().with_response(200, openai_reply(r#"{"name": "Someone"}"#)),
        );
        let err = generate_creative_content(&ModelCaller::new(mock), &model(), &record("Jane"), "")
            .await
            .unwrap_err();
        assert!(matches!(err, EnrichmentError::Validation { .. }));
    }

    #[tokio::test]
    async fn provider_error_propagates() {
        let mock = Arc::new(MockTransport::new().with_error(LlmError::Timeout(120)));
        let err = generate_creative_content(&ModelCaller::new(mock), &model(), &record("Jane"), "")
            .await
            .unwrap_err();
        assert!(matches!(err, EnrichmentError::Llm(LlmError::Timeout(_))));
    }

    #[tokio::test]
    async fn placeholder_name_sends_title_hint() {
        let mock = Arc::new(MockTransport::new().with_response(200, openai_reply(CREATIVE)));
        let html = "<html><head><title>Jane Doe | LinkedIn</title></head><body></body></html>";
        generate_creative_content(&ModelCaller::new(mock.clone()), &model(), &record(UNKNOWN_NAME), html)
            .await
            .unwrap();
        let prompt = mock.requests()[0].body["messages"][1]["content"]
            .as_str()
            .unwrap()
            .to_string();
        assert!(prompt.contains("Name hint from page title: Jane Doe"));
    }

    #[test]
    fn partial_holds_only_creative_keys() {
        let content: CreativeContent = serde_json::from_str(CREATIVE).unwrap();
        let partial = content.to_partial();
        assert_eq!(partial["communicationStyle"], "Concise and kind");
        assert!(!partial.contains_key("responsiveness"));
        assert!(!partial.contains_key("avatarUrl"));
    }
}
