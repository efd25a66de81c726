//! Content extractors.
//!
//! Each heuristic sits behind [`Extractor::extract`] and produces zero or
//! more [`ExtractedArtifact`]s from one response body. Extractors are pure:
//! the same body always yields the same artifacts. [`payload`] folds the
//! artifacts of one response into a [`payload::DiscoveredPayload`].

pub mod embedded;
pub mod html;
pub mod json;
pub mod payload;
pub mod pdf_links;
pub mod portal;

use scraper::ElementRef;
use serde_json::Value;

pub use embedded::EmbeddedJsonExtractor;
pub use html::{extract_api_details, ApiDetails, HtmlStructureExtractor};
pub use json::JsonExtractor;
pub use payload::{
    discover_from_response, payload_from_artifacts, DiscoveredPayload, Discovery, LinkCandidate,
};
pub use pdf_links::PdfLinkExtractor;
pub use portal::{
    classify_api_type, detail_page_documents, extract_documentation_apis, fallback_portal_apis,
    PortalApi, PortalDocument,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Json,
    EmbeddedJson,
    HtmlTable,
    Link,
    PdfUrl,
}

/// One piece of evidence pulled from a response. Transient.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedArtifact {
    pub source_endpoint: String,
    pub content_kind: ContentKind,
    pub raw_payload: Value,
}

impl ExtractedArtifact {
    pub fn new(source_endpoint: &str, content_kind: ContentKind, raw_payload: Value) -> Self {
        Self {
            source_endpoint: source_endpoint.to_string(),
            content_kind,
            raw_payload,
        }
    }
}

pub trait Extractor {
    fn kind(&self) -> ContentKind;

    fn extract(&self, source: &str, body: &str) -> Vec<ExtractedArtifact>;
}

/// Text of an element with each text node trimmed and empty ones dropped.
pub(crate) fn stripped_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .concat()
}

/// First `char_limit` characters of `text`.
pub(crate) fn truncate_chars(text: &str, char_limit: usize) -> String {
    text.chars().take(char_limit).collect()
}
