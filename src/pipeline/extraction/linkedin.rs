//! LinkedIn profile locator chains.

use super::document::{text_of, PageDocument, Scope};
use super::locators::{first_attr, first_list, first_text, text_or};
use crate::models::{EducationEntry, ExperienceEntry, LinkedInProfile, UNKNOWN_NAME};

const MAX_EXPERIENCE: usize = 3;
const MAX_EDUCATION: usize = 2;
const MAX_SKILLS: usize = 10;

const NAME: &[&str] = &[
    ".pv-text-details__left-panel h1",
    "section.pv-top-card h1",
    ".pv-top-card-v2-ctas__info h1",
    ".pv-top-card__info h1",
    r#"[data-testid="profile-card-name"]"#,
    "h1.text-heading-xlarge",
    ".text-heading-xlarge",
    ".ph5.pb5 h1",
    r#"main[role="main"] h1"#,
];

const HEADLINE: &[&str] = &[
    ".text-body-medium",
    ".ph5.pb5 .text-body-small",
    ".pv-top-card__headline",
    r#"[data-test-id="profile-topcard-headline"]"#,
];

const LOCATION: &[&str] = &[
    ".pv-top-card--list-bullet > li:nth-child(2)",
    ".pb2 .text-body-small",
    ".pv-top-card__location",
    r#"[data-test-id="profile-topcard-location"]"#,
];

const ABOUT: &[&str] = &[
    ".pv-about-section .inline-show-more-text",
    ".pv-shared-text-with-see-more span",
    ".display-flex.ph5.pv3",
    ".pv-about__summary-text",
    r#"[data-test-id="about-section"]"#,
];

const PHOTO: &[&str] = &[
    ".pv-top-card-profile-picture__image",
    ".profile-photo-edit__preview",
    ".pv-top-card__photo img",
    ".presence-entity__image",
];

const EXPERIENCE_ITEMS: &[&str] = &[
    ".experience-section .pv-entity__summary-info",
    ".pvs-list__item--line-separated",
    ".pv-entity__position-group",
    ".pv-profile-section__list-item",
];

const EXPERIENCE_TITLE: &[&str] = &[
    ".pv-entity__secondary-title",
    ".t-bold",
    ".pv-entity__summary-info-headline",
];

const EXPERIENCE_COMPANY: &[&str] = &[
    ".pv-entity__secondary-title",
    ".t-normal.t-black--light",
    ".pv-entity__company-summary-info > span:nth-child(2)",
];

const EDUCATION_ITEMS: &[&str] = &[
    ".education-section .pv-entity__summary-info",
    ".education__list .pv-education-entity",
    ".pv-education-entity",
    ".pv-profile-section__list-item.education-item",
];

const EDUCATION_SCHOOL: &[&str] = &[
    ".pv-entity__school-name",
    ".t-bold",
    ".pv-entity__degree-info",
];

const EDUCATION_DEGREE: &[&str] = &[
    ".pv-entity__degree-name",
    ".pv-entity__secondary-title",
    ".pv-entity__degree-name .pv-entity__comma-item",
];

const SKILL_ITEMS: &[&str] = &[
    ".pv-skill-category-entity__name-text",
    ".pvs-list .pvs-entity--padded",
    ".pv-skill-category-entity",
    ".skill-category-entity__name",
];

pub fn extract_linkedin(doc: &PageDocument, profile_url: &str) -> LinkedInProfile {
    let root = doc.root();

    let name = first_text(root, "name", NAME);
    if name.is_none() {
        tracing::warn!("Could not find profile name with any locator");
    }

    let experience = first_list(root, "experience", EXPERIENCE_ITEMS)
        .into_iter()
        .take(MAX_EXPERIENCE)
        .map(|item| {
            let scope = Scope::Element(item);
            ExperienceEntry {
                title: text_or(scope, "experience.title", EXPERIENCE_TITLE, ""),
                company: text_or(scope, "experience.company", EXPERIENCE_COMPANY, ""),
            }
        })
        .collect();

    let education = first_list(root, "education", EDUCATION_ITEMS)
        .into_iter()
        .take(MAX_EDUCATION)
        .map(|item| {
            let scope = Scope::Element(item);
            EducationEntry {
                school: text_or(scope, "education.school", EDUCATION_SCHOOL, ""),
                degree: text_or(scope, "education.degree", EDUCATION_DEGREE, ""),
            }
        })
        .collect();

    let skills = first_list(root, "skills", SKILL_ITEMS)
        .into_iter()
        .map(text_of)
        .filter(|skill| !skill.is_empty())
        .take(MAX_SKILLS)
        .collect();

    LinkedInProfile {
        name: name.unwrap_or_else(|| UNKNOWN_NAME.to_string()),
        headline: text_or(root, "headline", HEADLINE, "No headline"),
        location: text_or(root, "location", LOCATION, "Unknown location"),
        photo_url: first_attr(root, "photo", PHOTO, "src").unwrap_or_default(),
        about: text_or(root, "about", ABOUT, ""),
        experience,
        education,
        skills,
        profile_url: profile_url.to_string(),
    }
}
