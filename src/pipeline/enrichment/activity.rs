//! Activity-analysis stage. Non-essential: failures become the fallback triple.

use serde_json::{json, Value};

use super::prompts::{activity_user, ACTIVITY_SYSTEM};
use super::{invalid, run_stage, EnrichmentError, EnrichmentStage};
use crate::models::{DelayRange, EnrichmentPartial, Platform, Responsiveness};
use crate::pipeline::llm::{CallOptions, ChatMessage, ModelCaller, ResolvedModel};

const STAGE: &str = "activity analysis";
const FALLBACK_CHANCE: i64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityAnalysis {
    pub responsiveness: Responsiveness,
    pub response_delay: DelayRange,
    pub response_chance: i64,
}

impl ActivityAnalysis {
    /// `active`, its delay range, chance 50.
    pub fn fallback() -> Self {
        Self::from_estimate(Responsiveness::Active, FALLBACK_CHANCE as f64)
    }

    /// Delay range follows the category; chance is clamped to 0..=100 and rounded.
    pub fn from_estimate(responsiveness: Responsiveness, chance: f64) -> Self {
        Self {
            responsiveness,
            response_delay: responsiveness.delay_range(),
            response_chance: chance.clamp(0.0, 100.0).round() as i64,
        }
    }

    pub fn to_partial(&self) -> EnrichmentPartial {
        let mut partial = EnrichmentPartial::new();
        partial.insert("responsiveness".into(), json!(self.responsiveness));
        partial.insert("responseDelay".into(), json!(self.response_delay));
        partial.insert("responseChance".into(), json!(self.response_chance));
        partial
    }
}

struct ActivityStage<'a> {
    html: &'a str,
    platform: Platform,
}

impl EnrichmentStage for ActivityStage<'_> {
    type Output = ActivityAnalysis;

    fn name(&self) -> &'static str {
        STAGE
    }

    fn call_options(&self) -> CallOptions {
        CallOptions::new(0.5, 100)
    }

    fn build_messages(&self) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(ACTIVITY_SYSTEM),
            ChatMessage::user(activity_user(self.platform.as_str(), self.html)),
        ]
    }

    fn interpret(&self, parsed: Value) -> Result<ActivityAnalysis, EnrichmentError> {
        let label = parsed
            .get("estimatedResponsiveness")
            .and_then(Value::as_str)
            .ok_or_else(|| invalid(STAGE, "estimatedResponsiveness must be a string"))?;
        let chance = parsed
            .get("estimatedResponseChance")
            .and_then(Value::as_f64)
            .ok_or_else(|| invalid(STAGE, "estimatedResponseChance must be a number"))?;

        let responsiveness = Responsiveness::normalize(label);
        if responsiveness.as_str() != label.trim().to_lowercase() {
            tracing::warn!(label, "Unrecognised responsiveness category, using active");
        }
        Ok(ActivityAnalysis::from_estimate(responsiveness, chance))
    }
}

/// Estimate responsiveness from the page markup. Never fails.
pub async fn analyze_activity(
    caller: &ModelCaller,
    model: &ResolvedModel,
    html: &str,
    platform: Platform,
) -> ActivityAnalysis {
    if html.trim().is_empty() {
        tracing::warn!(error = %EnrichmentError::MissingInput("page markup"), "Using activity defaults");
        return ActivityAnalysis::fallback();
    }

    let stage = ActivityStage { html, platform };
    match run_stage(caller, model, &stage).await {
        Ok(analysis) => {
            tracing::info!(
                responsiveness = %analysis.responsiveness,
                chance = analysis.response_chance,
                "Activity analysed"
            );
            analysis
        }
        Err(e) => {
            tracing::warn!(error = %e, "Activity analysis failed, using defaults");
            ActivityAnalysis::fallback()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Provider, ResponsivenessDelayTable};
    use crate::pipeline::llm::{LlmError, MockTransport};
    use secrecy::SecretString;
    use std::sync::Arc;

    const HTML: &str = "<html><body><time>2h ago</time></body></html>";

    fn model() -> ResolvedModel {
        ResolvedModel {
            model: "claude-3-5-haiku-20241022".into(),
            provider: Provider::Anthropic,
            api_key: SecretString::from("sk-ant-test-0123456789".to_string()),
            max_tokens: 4096,
            temperature: 0.5,
        }
    }

    fn reply(text: &str) -> String {
        json!({ "content": [{ "type": "text", "text": text }] }).to_string()
    }

    async fn analyse_with(text: &str) -> ActivityAnalysis {
        let mock = Arc::new(MockTransport::new().with_response(200, reply(text)));
        analyze_activity(&ModelCaller::new(mock), &model(), HTML, Platform::Twitter).await
    }

    #[tokio::test]
    async fn valid_estimate_maps_to_table() {
        let analysis =
            analyse_with(r#"{"estimatedResponsiveness": "Zen", "estimatedResponseChance": 35}"#).await;
        assert_eq!(analysis.responsiveness, Responsiveness::Zen);
        assert_eq!(analysis.response_delay, ResponsivenessDelayTable::ZEN);
        assert_eq!(analysis.response_chance, 35);
    }

    #[tokio::test]
    async fn chance_is_clamped() {
        let low =
            analyse_with(r#"{"estimatedResponsiveness": "instant", "estimatedResponseChance": -10}"#).await;
        assert_eq!(low.response_chance, 0);
        let high =
            analyse_with(r#"{"estimatedResponsiveness": "instant", "estimatedResponseChance": 150}"#).await;
        assert_eq!(high.response_chance, 100);
    }

    #[tokio::test]
    async fn unknown_category_coerced_to_active() {
        let analysis =
            analyse_with(r#"{"estimatedResponsiveness": "unknown", "estimatedResponseChance": 70}"#).await;
        assert_eq!(analysis.responsiveness, Responsiveness::Active);
        assert_eq!(analysis.response_delay, ResponsivenessDelayTable::ACTIVE);
        assert_eq!(analysis.response_chance, 70);
    }

    #[tokio::test]
    async fn malformed_reply_falls_back() {
        assert_eq!(analyse_with("no idea, sorry").await, ActivityAnalysis::fallback());
    }

    #[tokio::test]
    async fn wrong_field_types_fall_back() {
        let analysis =
            analyse_with(r#"{"estimatedResponsiveness": "casual", "estimatedResponseChance": "high"}"#).await;
        assert_eq!(analysis, ActivityAnalysis::fallback());
    }

    #[tokio::test]
    async fn provider_error_falls_back() {
        let mock = Arc::new(
            MockTransport::new().with_error(LlmError::Transport("connection reset".into())),
        );
        let analysis =
            analyze_activity(&ModelCaller::new(mock), &model(), HTML, Platform::Linkedin).await;
        assert_eq!(analysis, ActivityAnalysis::fallback());
    }

    #[tokio::test]
    async fn empty_markup_skips_model_call() {
        let mock = Arc::new(MockTransport::new());
        let analysis =
            analyze_activity(&ModelCaller::new(mock.clone()), &model(), "  ", Platform::Twitter).await;
        assert_eq!(analysis, ActivityAnalysis::fallback());
        assert_eq!(mock.call_count(), 0);
    }

    #[test]
    fn fallback_triple() {
        let fallback = ActivityAnalysis::fallback();
        assert_eq!(fallback.responsiveness, Responsiveness::Active);
        assert_eq!(fallback.response_delay, DelayRange::new(301, 3600));
        assert_eq!(fallback.response_chance, 50);
    }

    #[test]
    fn fractional_chance_rounded() {
        assert_eq!(ActivityAnalysis::from_estimate(Responsiveness::Casual, 42.6).response_chance, 43);
    }

    #[test]
    fn partial_uses_wire_names() {
        let partial = ActivityAnalysis::fallback().to_partial();
        assert_eq!(partial["responsiveness"], "active");
        assert_eq!(partial["responseDelay"], json!({ "min": 301, "max": 3600 }));
        assert_eq!(partial["responseChance"], 50);
    }
}
