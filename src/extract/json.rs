//! Whole-body JSON extraction.

use super::{ContentKind, ExtractedArtifact, Extractor};

#[derive(Debug, Default, Clone, Copy)]
pub struct JsonExtractor;

impl Extractor for JsonExtractor {
    fn kind(&self) -> ContentKind {
        ContentKind::Json
    }

    fn extract(&self, source: &str, body: &str) -> Vec<ExtractedArtifact> {
        match serde_json::from_str(body) {
            Ok(value) => vec![ExtractedArtifact::new(source, ContentKind::Json, value)],
            Err(_) => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_json_yields_one_artifact() {
        let artifacts = JsonExtractor.extract("http://x", r#"{"services": []}"#);
        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].content_kind, ContentKind::Json);
        assert_eq!(artifacts[0].source_endpoint, "http://x");
    }

    #[test]
    fn test_invalid_json_yields_nothing() {
        assert!(JsonExtractor.extract("http://x", "{oops").is_empty());
    }
}
