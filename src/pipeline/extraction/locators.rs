//! Ordered locator fallback chains.
//!
//! Every logical field is read through a prioritized list of locators,
//! most specific first. Locators are evaluated left to right and the first
//! one that yields a present value wins. A locator that fails to evaluate
//! (unparsable selector, unexpected structure) is logged and treated as
//! "no match" so one bad heuristic never aborts the extraction.

use scraper::ElementRef;
use tracing::{debug, warn};

use super::document::{attr_of, text_of, Scope};
use super::ExtractionError;

/// Evaluate `strategy` for each locator in order and return the first
/// present value.
pub fn first_present<'l, T>(
    field: &str,
    locators: &[&'l str],
    mut strategy: impl FnMut(&'l str) -> Result<Option<T>, ExtractionError>,
) -> Option<T> {
    for &locator in locators {
        match strategy(locator) {
            Ok(Some(value)) => {
                debug!(field, locator, "Locator matched");
                return Some(value);
            }
            Ok(None) => {}
            Err(e) => {
                warn!(field, locator, error = %e, "Locator failed, trying next");
            }
        }
    }
    None
}

/// First non-empty trimmed text among `locators`.
pub fn first_text(scope: Scope<'_>, field: &str, locators: &[&str]) -> Option<String> {
    first_present(field, locators, |locator| {
        Ok(scope
            .query_first(locator)?
            .map(text_of)
            .filter(|text| !text.is_empty()))
    })
}

/// First non-empty text, or the field's documented default.
pub fn text_or(scope: Scope<'_>, field: &str, locators: &[&str], default: &str) -> String {
    first_text(scope, field, locators).unwrap_or_else(|| default.to_string())
}

/// First element among `locators` carrying a non-empty `attribute`.
pub fn first_attr(
    scope: Scope<'_>,
    field: &str,
    locators: &[&str],
    attribute: &str,
) -> Option<String> {
    first_present(field, locators, |locator| {
        Ok(scope
            .query_first(locator)?
            .and_then(|node| attr_of(node, attribute)))
    })
}

/// Elements of the first locator that matches at least one node.
pub fn first_list<'a>(scope: Scope<'a>, field: &str, locators: &[&str]) -> Vec<ElementRef<'a>> {
    first_present(field, locators, |locator| {
        let nodes = scope.query_all(locator)?;
        Ok((!nodes.is_empty()).then_some(nodes))
    })
    .unwrap_or_default()
}
