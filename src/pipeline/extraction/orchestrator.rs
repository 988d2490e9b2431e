use super::document::PageDocument;
use super::linkedin::extract_linkedin;
use super::twitter::extract_twitter;
use super::types::{ProfileScraper, ScrapedPage};
use super::ExtractionError;
use crate::models::{Platform, RawProfileRecord};

/// Extract a raw profile record from a parsed page.
///
/// `platform` is checked before any field is read; anything other than
/// `linkedin` or `twitter` fails with `UnsupportedPlatform`.
pub fn extract(
    document: &PageDocument,
    platform: &str,
    profile_url: &str,
) -> Result<ScrapedPage, ExtractionError> {
    let platform: Platform = platform
        .parse()
        .map_err(|_| ExtractionError::UnsupportedPlatform(platform.to_string()))?;

    let _span = tracing::info_span!("extract", platform = %platform).entered();

    let record = match platform {
        Platform::Linkedin => RawProfileRecord::Linkedin(extract_linkedin(document, profile_url)),
        Platform::Twitter => RawProfileRecord::Twitter(extract_twitter(document, profile_url)),
    };

    tracing::info!(name = record.name(), "Profile extracted");

    Ok(ScrapedPage {
        record,
        full_html: document.outer_html(),
    })
}

/// Resolve the platform from the profile URL's host.
pub fn detect_platform(profile_url: &str) -> Result<Platform, ExtractionError> {
    Platform::from_url(profile_url)
        .ok_or_else(|| ExtractionError::UnsupportedPlatform(profile_url.to_string()))
}

/// Scraper over captured page markup and the URL it was rendered from.
pub struct HtmlProfileScraper {
    markup: String,
    profile_url: String,
}

impl HtmlProfileScraper {
    pub fn new(markup: impl Into<String>, profile_url: impl Into<String>) -> Self {
        Self {
            markup: markup.into(),
            profile_url: profile_url.into(),
        }
    }
}

impl ProfileScraper for HtmlProfileScraper {
    fn scrape(&self) -> Result<ScrapedPage, ExtractionError> {
        let platform = detect_platform(&self.profile_url)?;
        if self.markup.trim().is_empty() {
            return Err(ExtractionError::EmptyDocument);
        }
        // The parsed tree is not Send; it lives only inside this call.
        let document = PageDocument::parse(&self.markup);
        extract(&document, platform.as_str(), &self.profile_url)
    }
}
