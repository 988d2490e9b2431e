//! Platform-specific profile data as scraped from a rendered page.
//!
//! Produced once per extraction and read-only afterwards: every enrichment
//! stage receives it by shared reference.

use serde::{Deserialize, Serialize};

use super::enums::Platform;

/// Sentinel used when no name locator matches.
pub const UNKNOWN_NAME: &str = "Unknown Name";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperienceEntry {
    pub title: String,
    pub company: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EducationEntry {
    pub school: String,
    pub degree: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedInProfile {
    pub name: String,
    pub headline: String,
    pub location: String,
    pub photo_url: String,
    pub about: String,
    pub experience: Vec<ExperienceEntry>,
    pub education: Vec<EducationEntry>,
    pub skills: Vec<String>,
    pub profile_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TwitterProfile {
    pub name: String,
    pub username: String,
    pub bio: String,
    pub location: String,
    pub photo_url: String,
    pub following_count: String,
    pub followers_count: String,
    pub tweets: Vec<String>,
    pub profile_url: String,
}

/// Raw profile record, tagged by source platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "platform", rename_all = "lowercase")]
pub enum RawProfileRecord {
    Linkedin(LinkedInProfile),
    Twitter(TwitterProfile),
}

impl RawProfileRecord {
    pub fn platform(&self) -> Platform {
        match self {
            Self::Linkedin(_) => Platform::Linkedin,
            Self::Twitter(_) => Platform::Twitter,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Linkedin(p) => &p.name,
            Self::Twitter(p) => &p.name,
        }
    }

    pub fn profile_url(&self) -> &str {
        match self {
            Self::Linkedin(p) => &p.profile_url,
            Self::Twitter(p) => &p.profile_url,
        }
    }

    /// Twitter handle, when one was scraped.
    pub fn username(&self) -> Option<&str> {
        match self {
            Self::Twitter(p) if !p.username.is_empty() => Some(&p.username),
            _ => None,
        }
    }

    /// True when the extractor fell back to the sentinel name.
    pub fn has_unknown_name(&self) -> bool {
        let name = self.name().trim();
        name.is_empty() || name == UNKNOWN_NAME
    }

    /// Pretty JSON for prompt embedding.
    pub fn to_prompt_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}
