//! Persona pipeline: Scrape → Creative → Activity → Avatar → Finalize.
//!
//! Stages run strictly in sequence. Scrape, credential resolution and the
//! creative stage are fatal on failure; activity and avatar absorb their
//! own failures. A run ends with exactly one `Completed` or `Failed` event
//! and persists nothing unless it completes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::Instrument;

use super::enrichment::{
    analyze_activity, avatar_url, choose_avatar_style, generate_creative_content,
    ActivityAnalysis, CreativeContent, EnrichmentError,
};
use super::extraction::{ExtractionError, ProfileScraper};
use super::llm::{LlmError, ModelCaller, ResolvedModel};
use crate::config::EXPORTED_BY;
use crate::models::{
    default_persona_record, merge_partials, AvatarStyle, ExportMetadata, PersonaProfile,
    RawProfileRecord, SchemaError,
};
use crate::store::{append_profile, SettingsStore, StoreError};

const URL_NOT_AVAILABLE: &str = "Not Available";

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("A persona generation run is already in progress")]
    AlreadyRunning,

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Creative(#[from] EnrichmentError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineStage {
    Scrape,
    Creative,
    Activity,
    Avatar,
    Finalize,
}

impl PipelineStage {
    pub const ALL: [PipelineStage; 5] = [
        Self::Scrape,
        Self::Creative,
        Self::Activity,
        Self::Avatar,
        Self::Finalize,
    ];

    /// 1-based position in the run.
    pub fn index(&self) -> usize {
        *self as usize + 1
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Scrape => "Extracting profile data...",
            Self::Creative => "Generating persona...",
            Self::Activity => "Analyzing activity...",
            Self::Avatar => "Choosing avatar style...",
            Self::Finalize => "Finalizing...",
        }
    }

    /// "Step N/5: <label>"
    pub fn progress_message(&self) -> String {
        format!("Step {}/{}: {}", self.index(), Self::ALL.len(), self.label())
    }
}

/// Progress reported to the host while a run executes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum PipelineEvent {
    Stage {
        index: usize,
        total: usize,
        label: String,
    },
    Completed {
        persona: String,
    },
    Failed {
        message: String,
    },
}

impl PipelineEvent {
    fn stage(stage: PipelineStage) -> Self {
        Self::Stage {
            index: stage.index(),
            total: PipelineStage::ALL.len(),
            label: stage.progress_message(),
        }
    }
}

/// Clears the running flag when the run ends, whatever the outcome.
pub struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct PersonaPipeline {
    caller: ModelCaller,
    store: Arc<dyn SettingsStore>,
    running: AtomicBool,
}

impl PersonaPipeline {
    pub fn new(caller: ModelCaller, store: Arc<dyn SettingsStore>) -> Self {
        Self {
            caller,
            store,
            running: AtomicBool::new(false),
        }
    }

    /// Claim the single run slot.
    pub fn begin_run(&self) -> Result<RunGuard<'_>, PipelineError> {
        self.running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map(|_| RunGuard(&self.running))
            .map_err(|_| PipelineError::AlreadyRunning)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Run the full pipeline and persist the persona on success.
    pub async fn run(
        &self,
        scraper: &dyn ProfileScraper,
        progress_fn: Option<&dyn Fn(PipelineEvent)>,
    ) -> Result<PersonaProfile, PipelineError> {
        let _guard = self.begin_run()?;

        let span = tracing::info_span!(
            "persona_pipeline",
            platform = tracing::field::Empty,
            model = tracing::field::Empty
        );
        let result = self
            .execute(scraper, progress_fn)
            .instrument(span)
            .await;

        let event = match &result {
            Ok(profile) => {
                tracing::info!(persona = %profile.name, "Persona pipeline completed");
                PipelineEvent::Completed {
                    persona: profile.name.clone(),
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Persona pipeline failed");
                PipelineEvent::Failed {
                    message: e.to_string(),
                }
            }
        };
        if let Some(progress) = progress_fn {
            progress(event);
        }
        result
    }

    async fn execute(
        &self,
        scraper: &dyn ProfileScraper,
        progress_fn: Option<&dyn Fn(PipelineEvent)>,
    ) -> Result<PersonaProfile, PipelineError> {
        let report = |stage: PipelineStage| {
            tracing::info!(stage = stage.index(), "{}", stage.progress_message());
            if let Some(progress) = progress_fn {
                progress(PipelineEvent::stage(stage));
            }
        };

        report(PipelineStage::Scrape);
        let page = scraper.scrape()?;
        let platform = page.record.platform();
        tracing::Span::current().record("platform", platform.as_str());

        // Credential check precedes every network call.
        let settings = self.store.get(&ResolvedModel::settings_keys())?;
        let model = ResolvedModel::from_settings(&settings)?;
        tracing::Span::current().record("model", model.model.as_str());

        report(PipelineStage::Creative);
        let creative =
            generate_creative_content(&self.caller, &model, &page.record, &page.full_html).await?;

        report(PipelineStage::Activity);
        let activity = analyze_activity(&self.caller, &model, &page.full_html, platform).await;

        report(PipelineStage::Avatar);
        let style = choose_avatar_style(&self.caller, &model, &creative).await;

        report(PipelineStage::Finalize);
        let profile = finalize_profile(
            &page.record,
            &creative,
            &activity,
            style,
            &model.model,
            Utc::now(),
        )?;
        append_profile(self.store.as_ref(), &profile)?;
        Ok(profile)
    }
}

/// Merge default ← creative ← activity, stamp avatar and metadata, and
/// validate against the persisted schema.
pub fn finalize_profile(
    record: &RawProfileRecord,
    creative: &CreativeContent,
    activity: &ActivityAnalysis,
    style: AvatarStyle,
    model_id: &str,
    exported_at: DateTime<Utc>,
) -> Result<PersonaProfile, SchemaError> {
    let mut merged = merge_partials(
        default_persona_record(),
        &[creative.to_partial(), activity.to_partial()],
    );

    let persona_name = merged
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or(&creative.name)
        .to_string();
    merged.insert("avatarUrl".into(), json!(avatar_url(style, &persona_name)));

    let original_url = match record.profile_url() {
        "" => URL_NOT_AVAILABLE,
        url => url,
    };
    let metadata = ExportMetadata {
        exported_at: Some(exported_at),
        exported_by: Some(EXPORTED_BY.to_string()),
        source: Some(record.platform().as_str().to_string()),
        model: Some(model_id.to_string()),
        original_url: Some(original_url.to_string()),
        original_name: Some(record.name().to_string()),
        original_username: record.username().map(str::to_string),
    };
    merged.insert("metadata".into(), serde_json::to_value(metadata)?);

    PersonaProfile::from_json_value(Value::Object(merged))
}
