//! Tree-queryable view of a rendered profile page.
//!
//! Wraps `scraper::Html` behind the three operations the extractor needs:
//! `query_first`, `query_all` and `text_of`. Queries can run against the whole
//! document or inside a single element (sub-record fields).

use scraper::{ElementRef, Html, Selector};

use super::ExtractionError;

/// Parsed page markup.
pub struct PageDocument {
    html: Html,
}

impl PageDocument {
    pub fn parse(markup: &str) -> Self {
        Self {
            html: Html::parse_document(markup),
        }
    }

    /// Query scope covering the whole document.
    pub fn root(&self) -> Scope<'_> {
        Scope::Document(&self.html)
    }

    /// Full serialized markup of the document element.
    pub fn outer_html(&self) -> String {
        self.html.root_element().html()
    }
}

/// Where a locator is evaluated: the document or one element subtree.
#[derive(Clone, Copy)]
pub enum Scope<'a> {
    Document(&'a Html),
    Element(ElementRef<'a>),
}

impl<'a> Scope<'a> {
    pub fn query_first(&self, locator: &str) -> Result<Option<ElementRef<'a>>, ExtractionError> {
        let selector = parse_locator(locator)?;
        let found = match self {
            Scope::Document(html) => html.select(&selector).next(),
            Scope::Element(element) => element.select(&selector).next(),
        };
        Ok(found)
    }

    pub fn query_all(&self, locator: &str) -> Result<Vec<ElementRef<'a>>, ExtractionError> {
        let selector = parse_locator(locator)?;
        let found = match self {
            Scope::Document(html) => html.select(&selector).collect(),
            Scope::Element(element) => element.select(&selector).collect(),
        };
        Ok(found)
    }
}

fn parse_locator(locator: &str) -> Result<Selector, ExtractionError> {
    Selector::parse(locator).map_err(|e| ExtractionError::InvalidLocator {
        locator: locator.to_string(),
        reason: e.to_string(),
    })
}

/// Rendered text of a node with whitespace runs collapsed and trimmed.
pub fn text_of(node: ElementRef<'_>) -> String {
    let raw: String = node.text().collect();
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Trimmed attribute value, `None` when absent or blank.
pub fn attr_of(node: ElementRef<'_>, name: &str) -> Option<String> {
    node.value()
        .attr(name)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Best-effort name hint from page-level metadata (`og:title`, then `<title>`),
/// with platform suffixes such as " | LinkedIn" or " / X" removed.
pub fn page_title_hint(markup: &str) -> Option<String> {
    let doc = PageDocument::parse(markup);
    let root = doc.root();

    let og_title = root
        .query_first(r#"meta[property="og:title"]"#)
        .ok()
        .flatten()
        .and_then(|meta| attr_of(meta, "content"));
    let title = og_title.or_else(|| {
        root.query_first("title")
            .ok()
            .flatten()
            .map(text_of)
            .filter(|t| !t.is_empty())
    })?;

    let cleaned = strip_title_suffix(&title);
    (!cleaned.is_empty()).then_some(cleaned)
}

fn strip_title_suffix(title: &str) -> String {
    let mut head = title.trim();
    for separator in [" | ", " / ", " - "] {
        if let Some(idx) = head.find(separator) {
            head = &head[..idx];
        }
    }
    // Twitter titles read "Jane Doe (@jdoe)"
    if let Some(idx) = head.find(" (@") {
        head = &head[..idx];
    }
    head.trim().to_string()
}
