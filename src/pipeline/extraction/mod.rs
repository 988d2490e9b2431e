//! Fallback extractor: rendered profile page → raw profile record.

pub mod document;
pub mod locators;
pub mod linkedin;
pub mod twitter;
pub mod types;
pub mod orchestrator;

pub use document::{page_title_hint, PageDocument};
pub use orchestrator::*;
pub use types::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Unsupported platform: {0}. Only LinkedIn and Twitter profiles are supported")]
    UnsupportedPlatform(String),

    #[error("Scraping returned an empty document")]
    EmptyDocument,

    #[error("Invalid locator `{locator}`: {reason}")]
    InvalidLocator { locator: String, reason: String },
}
