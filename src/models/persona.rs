//! Persisted AI follower persona schema (import/export boundary).
//!
//! Deserialisation applies the schema defaults for every optional field;
//! `validate` then enforces the range invariants serde cannot express.
//! A record produced by the pipeline must survive
//! serialise → `from_json_value` unchanged.

use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Map, Number, Value};
use thiserror::Error;

use super::enums::{DelayRange, Responsiveness, ResponsivenessDelayTable};

pub const SCHEMA_VERSION: &str = "1.0";

/// Sparse persona fields produced by one pipeline stage. Never persisted
/// directly, only merged.
pub type EnrichmentPartial = Map<String, Value>;

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Invalid persona JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Persona validation failed: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonaProfile {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    pub name: String,
    pub personality: String,
    pub avatar_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub communication_style: Option<String>,
    #[serde(default)]
    pub interaction_preferences: InteractionPreferences,

    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub responsiveness: Responsiveness,
    #[serde(default = "default_response_delay")]
    pub response_delay: ResponseDelay,
    #[serde(
        default = "default_response_chance",
        deserialize_with = "integral_number"
    )]
    pub response_chance: i64,

    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ExportMetadata>,
}

/// Persisted delay bounds in seconds. Any JSON number is accepted and kept
/// as written, so integral bounds stay integral on export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseDelay {
    pub min: Number,
    pub max: Number,
}

impl ResponseDelay {
    pub fn min_secs(&self) -> f64 {
        self.min.as_f64().unwrap_or_default()
    }

    pub fn max_secs(&self) -> f64 {
        self.max.as_f64().unwrap_or_default()
    }
}

impl From<DelayRange> for ResponseDelay {
    fn from(range: DelayRange) -> Self {
        Self {
            min: range.min.into(),
            max: range.max.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionPreferences {
    #[serde(default)]
    pub likes: Vec<String>,
    #[serde(default)]
    pub dislikes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolsConfig {
    #[serde(default)]
    pub equipped: Vec<EquippedTool>,
    #[serde(default)]
    pub custom_instructions: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquippedTool {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exported_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exported_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_username: Option<String>,
}

fn default_schema_version() -> String {
    SCHEMA_VERSION.to_string()
}

fn default_active() -> bool {
    true
}

fn default_response_delay() -> ResponseDelay {
    DelayRange::new(1, 1440).into()
}

fn default_response_chance() -> i64 {
    80
}

/// Integer field written by a JSON producer that may emit `50.0`.
fn integral_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let number = Number::deserialize(deserializer)?;
    if let Some(n) = number.as_i64() {
        return Ok(n);
    }
    match number.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() <= i64::MAX as f64 => Ok(f as i64),
        _ => Err(D::Error::custom(format!("expected an integer, got {number}"))),
    }
}

impl PersonaProfile {
    /// Parse and validate an imported persona, applying schema defaults.
    pub fn from_json_str(input: &str) -> Result<Self, SchemaError> {
        let value: Value = serde_json::from_str(input)?;
        Self::from_json_value(value)
    }

    /// Validate an already-parsed value, applying schema defaults.
    pub fn from_json_value(value: Value) -> Result<Self, SchemaError> {
        let profile: PersonaProfile = serde_json::from_value(value)?;
        profile.validate()?;
        Ok(profile)
    }

    /// Range and ordering checks serde cannot express.
    pub fn validate(&self) -> Result<(), SchemaError> {
        if !(0..=100).contains(&self.response_chance) {
            return Err(SchemaError::Validation(format!(
                "responseChance must be within 0..=100, got {}",
                self.response_chance
            )));
        }
        if self.response_delay.min_secs() > self.response_delay.max_secs() {
            return Err(SchemaError::Validation(format!(
                "responseDelay.min ({}) exceeds responseDelay.max ({})",
                self.response_delay.min, self.response_delay.max
            )));
        }
        Ok(())
    }

    /// Export timestamp, when the record carries one.
    pub fn exported_at(&self) -> Option<DateTime<Utc>> {
        self.metadata.as_ref().and_then(|m| m.exported_at)
    }

    /// File name for a single-profile export: lower-cased, anything outside
    /// `[a-z0-9]` replaced by `-`, at most 50 characters.
    pub fn export_file_name(&self) -> String {
        let sanitized: String = self
            .name
            .to_lowercase()
            .chars()
            .map(|c| if c.is_ascii_lowercase() || c.is_ascii_digit() { c } else { '-' })
            .take(50)
            .collect();
        format!("{sanitized}.json")
    }
}

/// Base record every persona is merged onto, lowest precedence.
/// The behaviour fields carry the activity fallback so category and delay
/// range agree even before analysis runs.
pub fn default_persona_record() -> EnrichmentPartial {
    let fallback = ResponsivenessDelayTable::ACTIVE;
    let value = json!({
        "schemaVersion": SCHEMA_VERSION,
        "avatarUrl": "",
        "interests": [],
        "interactionPreferences": { "likes": [], "dislikes": [] },
        "active": true,
        "responsiveness": Responsiveness::Active.as_str(),
        "responseDelay": { "min": fallback.min, "max": fallback.max },
        "responseChance": 50,
        "tools": { "equipped": [], "customInstructions": "" },
    });
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Overlay `partials` onto `base` in order; later keys win.
pub fn merge_partials(mut base: EnrichmentPartial, partials: &[EnrichmentPartial]) -> EnrichmentPartial {
    for partial in partials {
        for (key, value) in partial {
            base.insert(key.clone(), value.clone());
        }
    }
    base
}
