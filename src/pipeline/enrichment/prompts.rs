//! Prompt text for the three enrichment stages.

use crate::config::HTML_PROMPT_CHAR_LIMIT;
use crate::models::AvatarStyle;

pub const NO_HTML_PLACEHOLDER: &str = "No HTML provided";

/// Leading `HTML_PROMPT_CHAR_LIMIT` characters of the page markup.
pub fn truncate_html(html: &str) -> &str {
    match html.char_indices().nth(HTML_PROMPT_CHAR_LIMIT) {
        Some((idx, _)) => &html[..idx],
        None => html,
    }
}

pub const CREATIVE_SYSTEM: &str = r#"You are an expert AI persona creator. Analyze social media profile data and the accompanying HTML to generate the core creative elements of an engaging, archetype-based AI follower persona.

Input:
- profileData: pre-scraped data that may be incomplete (the name can be "Unknown Name").
- htmlSnippet: a portion of the profile page's HTML.

Process:
1. Verify the name. If profileData.name is "Unknown Name" or missing, determine the profile owner's full name from the htmlSnippet (and the name hint, when given) and use it for the following steps.
2. Generate these fields:
   - name: a descriptive persona title or role.
   - personality: a clear personality archetype.
   - background: a brief, engaging narrative background.
   - communicationStyle: how the persona communicates.
   - interests: a list of interests relevant to the persona's role.
   - interactionPreferences: an object with "likes" and "dislikes" lists reflecting the persona's mindset.

Respond ONLY with a valid JSON object containing only these generated fields. Do not include the original name if you extracted it. Escape all string values properly."#;

pub fn creative_user(
    platform: &str,
    profile_json: &str,
    html: &str,
    name_hint: Option<&str>,
) -> String {
    let snippet = if html.is_empty() {
        NO_HTML_PLACEHOLDER
    } else {
        truncate_html(html)
    };
    let hint = name_hint
        .map(|h| format!("\nName hint from page title: {h}\n"))
        .unwrap_or_default();
    format!(
        "Analyze this {platform} profile data and generate creative content:\n\n\
         Profile Data:\n{profile_json}\n{hint}\n\
         HTML Snippet:\n{snippet}"
    )
}

pub const ACTIVITY_SYSTEM: &str = r#"You are an expert social media activity analyst. Analyze the provided HTML of a social media profile page and estimate the user's responsiveness category and likelihood of responding.

Focus on:
- Timestamps of posts, comments, replies and likes.
- Density and recency of activity, especially engagement through replies.
- Bio phrases suggesting openness to interaction (for example "DMs open" or "Let's connect").

Output:
- estimatedResponsiveness: the best fit from ["instant", "active", "casual", "zen"].
- estimatedResponseChance: a number between 0 and 100, the likelihood the user would respond to a relevant interaction.

Respond ONLY with a valid JSON object containing exactly the fields "estimatedResponsiveness" and "estimatedResponseChance". No explanations or other text."#;

pub fn activity_user(platform: &str, html: &str) -> String {
    format!(
        "Analyze the following HTML snippet from a {platform} profile page and estimate the user's responsiveness.\n\n\
         HTML Snippet (truncated):\n{}\n\n\
         Estimate:\n\
         1. Responsiveness category (one of \"instant\", \"active\", \"casual\", \"zen\"): typical time to reply.\n\
         2. Response chance (0-100 likelihood).\n\n\
         Return ONLY a valid JSON object:\n\
         {{\n  \"estimatedResponsiveness\": \"<category>\",\n  \"estimatedResponseChance\": <number>\n}}",
        truncate_html(html)
    )
}

fn quoted_catalog() -> String {
    AvatarStyle::catalog()
        .iter()
        .map(|s| format!("\"{s}\""))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn avatar_system() -> String {
    format!(
        "You are an AI visual style consultant. Analyze the AI persona details (personality, background, interests) \
         and choose the single most appropriate DiceBear avatar style name from the list below.\n\n\
         Available style names: [{}]\n\n\
         Consider:\n\
         - 'micah', 'personas': human-like, suited to professional or relatable personas.\n\
         - 'pixel-art-neutral', 'adventurer-neutral': stylized, suited to creative or tech roles.\n\
         - 'bottts': robotic, best for explicitly tech or AI focused personas.\n\n\
         Respond ONLY with a valid JSON object with the single key \"styleName\". Example: {{ \"styleName\": \"micah\" }}",
        quoted_catalog()
    )
}

pub fn avatar_user(
    name: &str,
    personality: &str,
    background: &str,
    interests: &[String],
    communication_style: &str,
) -> String {
    format!(
        "Analyze this AI persona:\n\
         Name: {name}\n\
         Personality: {personality}\n\
         Background: {background}\n\
         Interests: {}\n\
         Communication Style: {communication_style}\n\n\
         Choose the best DiceBear style name from [{}] to represent this persona.\n\n\
         Return ONLY a valid JSON object with the key \"styleName\".",
        interests.join(", "),
        quoted_catalog()
    )
}
