//! Avatar-style stage. Non-essential: failures become the default style.

use serde_json::Value;

use super::creative::CreativeContent;
use super::prompts::{avatar_system, avatar_user};
use super::{invalid, run_stage, EnrichmentError, EnrichmentStage};
use crate::models::AvatarStyle;
use crate::pipeline::llm::{CallOptions, ChatMessage, ModelCaller, ResolvedModel};

const STAGE: &str = "avatar style";
const AVATAR_BASE_URL: &str = "https://api.dicebear.com/9.x";

struct AvatarStage<'a> {
    creative: &'a CreativeContent,
}

impl EnrichmentStage for AvatarStage<'_> {
    type Output = AvatarStyle;

    fn name(&self) -> &'static str {
        STAGE
    }

    fn call_options(&self) -> CallOptions {
        CallOptions::new(0.5, 50)
    }

    fn build_messages(&self) -> Vec<ChatMessage> {
        let c = self.creative;
        vec![
            ChatMessage::system(avatar_system()),
            ChatMessage::user(avatar_user(
                &c.name,
                &c.personality,
                c.background.as_deref().unwrap_or_default(),
                &c.interests,
                c.communication_style.as_deref().unwrap_or_default(),
            )),
        ]
    }

    fn interpret(&self, parsed: Value) -> Result<AvatarStyle, EnrichmentError> {
        let name = parsed
            .get("styleName")
            .and_then(Value::as_str)
            .ok_or_else(|| invalid(STAGE, "styleName must be a string"))?;
        name.parse()
            .map_err(|_| invalid(STAGE, format!("\"{name}\" is not in the style catalog")))
    }
}

/// Pick a catalog style for the persona. Never fails.
pub async fn choose_avatar_style(
    caller: &ModelCaller,
    model: &ResolvedModel,
    creative: &CreativeContent,
) -> AvatarStyle {
    match run_stage(caller, model, &AvatarStage { creative }).await {
        Ok(style) => {
            tracing::info!(style = %style, "Avatar style chosen");
            style
        }
        Err(e) => {
            tracing::warn!(error = %e, default = %AvatarStyle::DEFAULT, "Avatar style fallback");
            AvatarStyle::DEFAULT
        }
    }
}

/// Deterministic seed: lower-cased name with non-alphanumerics removed.
pub fn avatar_seed(name: &str) -> String {
    let seed: String = name
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect();
    if seed.is_empty() {
        "default".to_string()
    } else {
        seed
    }
}

pub fn avatar_url(style: AvatarStyle, persona_name: &str) -> String {
    format!(
        "{AVATAR_BASE_URL}/{}/svg?seed={}",
        style.as_str(),
        avatar_seed(persona_name)
    )
}
