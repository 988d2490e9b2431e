use serde::Serialize;

use super::ExtractionError;
use crate::models::RawProfileRecord;

/// Output of the scrape stage: the structured record plus the full
/// serialized markup for stages that need broader context.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapedPage {
    pub record: RawProfileRecord,
    pub full_html: String,
}

/// Scrape stage abstraction (allows mocking for tests)
pub trait ProfileScraper: Send + Sync {
    fn scrape(&self) -> Result<ScrapedPage, ExtractionError>;
}
