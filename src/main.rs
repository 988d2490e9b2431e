use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};

use profile_ripper::config::{self, MODEL_CONFIGS};
use profile_ripper::models::{PersonaProfile, Provider};
use profile_ripper::pipeline::extraction::HtmlProfileScraper;
use profile_ripper::pipeline::llm::{ModelCaller, SELECTED_MODEL_KEY};
use profile_ripper::pipeline::{PersonaPipeline, PipelineEvent};
use profile_ripper::store::{self, JsonFileStore, SettingsStore};

#[derive(Parser, Debug)]
#[command(name = "profile-ripper", version, about = "Turn a social profile page into an AI follower persona")]
struct Cli {
    /// Settings file (defaults to ~/ProfileRipper/settings.json)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a persona from a saved profile page
    Extract {
        /// Rendered page markup saved from the browser
        html_file: PathBuf,

        /// URL the page was captured from
        #[arg(long)]
        url: String,
    },

    /// List stored personas, newest first
    List,

    /// Export one stored persona as JSON
    Export {
        /// Position in `list` output
        index: usize,

        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Export every stored persona into all-profiles.json
    ExportAll {
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Delete one stored persona
    Delete { index: usize },

    /// Delete every stored persona
    Clear,

    /// Validate a persona JSON file against the persisted schema
    Validate { json_file: PathBuf },

    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Save an API key for a provider
    SetKey {
        /// openai or anthropic
        provider: Provider,
        key: String,
    },

    /// Choose the model used for generation
    SelectModel { model: String },

    /// Show the selected model and which keys are saved
    Show,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    profile_ripper::init_tracing();
    tracing::debug!("Profile Ripper v{}", config::APP_VERSION);

    let cli = Cli::parse();
    let store = Arc::new(JsonFileStore::new(
        cli.settings.unwrap_or_else(config::settings_path),
    ));

    match cli.command {
        Command::Extract { html_file, url } => extract(store, &html_file, &url).await,
        Command::List => list(store.as_ref()),
        Command::Export { index, out } => {
            let profiles = store::load_profiles(store.as_ref())?;
            let Some(profile) = profiles.get(index) else {
                bail!("No profile at index {index} ({} stored)", profiles.len());
            };
            let path = store::export_profile(profile, &out.unwrap_or_else(config::exports_dir))?;
            println!("Exported {}", path.display());
            Ok(())
        }
        Command::ExportAll { out } => {
            let profiles = store::load_profiles(store.as_ref())?;
            if profiles.is_empty() {
                bail!("No profiles to export");
            }
            let path = store::export_all(&profiles, &out.unwrap_or_else(config::exports_dir))?;
            println!("Exported {} profiles to {}", profiles.len(), path.display());
            Ok(())
        }
        Command::Delete { index } => {
            let removed = store::delete_profile(store.as_ref(), index)?;
            println!("Deleted {}", removed.name);
            Ok(())
        }
        Command::Clear => {
            store::clear_profiles(store.as_ref())?;
            println!("All profiles deleted");
            Ok(())
        }
        Command::Validate { json_file } => {
            let raw = std::fs::read_to_string(&json_file)
                .with_context(|| format!("reading {}", json_file.display()))?;
            let profile = PersonaProfile::from_json_str(&raw)?;
            println!("Valid persona: {}", profile.name);
            Ok(())
        }
        Command::Config(cmd) => run_config_command(store.as_ref(), cmd),
    }
}

async fn extract(store: Arc<JsonFileStore>, html_file: &Path, url: &str) -> anyhow::Result<()> {
    let markup = std::fs::read_to_string(html_file)
        .with_context(|| format!("reading {}", html_file.display()))?;
    let scraper = HtmlProfileScraper::new(markup, url);
    let pipeline = PersonaPipeline::new(ModelCaller::with_default_transport(), store);

    let progress_fn = |event: PipelineEvent| {
        if let Some(line) = progress_line(&event) {
            eprintln!("{line}");
        }
    };

    let profile = pipeline.run(&scraper, Some(&progress_fn)).await?;
    println!("{}", serde_json::to_string_pretty(&profile)?);
    Ok(())
}

/// Status line for a pipeline event. Failures are reported once, by the
/// error `main` returns.
fn progress_line(event: &PipelineEvent) -> Option<String> {
    match event {
        PipelineEvent::Stage { label, .. } => Some(label.clone()),
        PipelineEvent::Completed { persona } => Some(format!("Profile processed: {persona}")),
        PipelineEvent::Failed { .. } => None,
    }
}

fn list(store: &dyn SettingsStore) -> anyhow::Result<()> {
    let profiles = store::load_profiles(store)?;
    if profiles.is_empty() {
        println!("No saved profiles yet");
        return Ok(());
    }
    for (index, profile) in profiles.iter().enumerate() {
        let meta = profile.metadata.clone().unwrap_or_default();
        let date = profile
            .exported_at()
            .map(|at| at.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".into());
        println!(
            "{index:>3}  {}  [{}] {}  ({})",
            profile.name,
            meta.source.as_deref().unwrap_or("?"),
            date,
            meta.original_name.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

fn run_config_command(store: &dyn SettingsStore, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::SetKey { provider, key } => {
            let key = key.trim();
            if key.is_empty() {
                bail!("API key must not be empty");
            }
            store::set_value(store, provider.credential_key(), key)?;
            println!("{} API key saved", provider.display_name());
        }
        ConfigCommand::SelectModel { model } => {
            let Some(spec) = config::model_spec(&model) else {
                let known: Vec<&str> = MODEL_CONFIGS.iter().map(|m| m.id).collect();
                bail!("Unknown model {model}. Known models: {}", known.join(", "));
            };
            store::set_value(store, SELECTED_MODEL_KEY, spec.id)?;
            println!("Selected {} ({})", spec.id, spec.provider.display_name());
        }
        ConfigCommand::Show => {
            let values = store.get(&[
                SELECTED_MODEL_KEY,
                Provider::OpenAi.credential_key(),
                Provider::Anthropic.credential_key(),
            ])?;
            let model = values
                .get(SELECTED_MODEL_KEY)
                .and_then(|v| v.as_str())
                .unwrap_or(config::DEFAULT_MODEL);
            println!("Model: {model}");
            for provider in Provider::all() {
                let saved = values
                    .get(provider.credential_key())
                    .and_then(|v| v.as_str())
                    .is_some_and(|k| !k.trim().is_empty());
                println!(
                    "{} key: {}",
                    provider.display_name(),
                    if saved { "saved" } else { "not set" }
                );
            }
        }
    }
    Ok(())
}
