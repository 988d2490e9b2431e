//! Response repair parser: free-form model output → JSON value.
//!
//! Two phases. A strict parse of the whole text first; on failure, one
//! bounded repair: the body of a ```json fenced block, else the span from
//! the first `{` to the last `}`. Repair failure is an error, never an
//! empty value.

use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Failed to parse response as JSON. API returned malformed data: {0}")]
    Malformed(String),
}

pub fn parse_model_json(text: &str) -> Result<Value, ParseError> {
    match serde_json::from_str(text) {
        Ok(value) => Ok(value),
        Err(strict) => {
            tracing::debug!(error = %strict, "Strict JSON parse failed, attempting repair");
            let candidate = repair_candidate(text).ok_or_else(|| {
                ParseError::Malformed("no JSON object found in response".into())
            })?;
            serde_json::from_str(candidate).map_err(|e| ParseError::Malformed(e.to_string()))
        }
    }
}

/// Substring most likely to hold the payload, if any.
fn repair_candidate(text: &str) -> Option<&str> {
    let trimmed = text.trim();

    if let Some(start) = trimmed.find("```json") {
        let after_fence = &trimmed[start + 7..];
        if let Some(end) = after_fence.find("```") {
            let block = after_fence[..end].trim();
            if block.starts_with('{') {
                return Some(block);
            }
        }
    }

    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => Some(&trimmed[start..=end]),
        _ => None,
    }
}
