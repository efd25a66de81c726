//! JSON embedded in `<script>` blocks.

use std::sync::LazyLock;

use scraper::{Html, Selector};
use serde_json::Value;

use super::{ContentKind, ExtractedArtifact, Extractor};

static SCRIPT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("script").expect("script selector should compile"));

/// Finds the first script mentioning "api" or "service" whose outermost
/// brace span parses as JSON.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmbeddedJsonExtractor;

impl Extractor for EmbeddedJsonExtractor {
    fn kind(&self) -> ContentKind {
        ContentKind::EmbeddedJson
    }

    fn extract(&self, source: &str, body: &str) -> Vec<ExtractedArtifact> {
        let document = Html::parse_document(body);
        document
            .select(&SCRIPT)
            .map(|script| script.text().collect::<String>())
            .find_map(|text| parse_embedded(&text))
            .map(|value| vec![ExtractedArtifact::new(source, ContentKind::EmbeddedJson, value)])
            .unwrap_or_default()
    }
}

fn parse_embedded(script: &str) -> Option<Value> {
    let lowered = script.to_lowercase();
    if !lowered.contains("api") && !lowered.contains("service") {
        return None;
    }
    let start = script.find('{')?;
    let end = script.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&script[start..=end]).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extracts_assigned_object() {
        let html = r#"<html><script>window.__DATA__ = {"services":[{"name":"Foo"}]};</script></html>"#;
        let artifacts = EmbeddedJsonExtractor.extract("http://x", html);
        assert_eq!(artifacts.len(), 1);
        assert_eq!(
            artifacts[0].raw_payload,
            json!({"services": [{"name": "Foo"}]})
        );
    }

    #[test]
    fn test_skips_scripts_without_keywords() {
        let html = r#"<script>var cfg = {"a": 1};</script>"#;
        assert!(EmbeddedJsonExtractor.extract("http://x", html).is_empty());
    }

    #[test]
    fn test_first_parsing_script_wins() {
        let html = r#"
            <script>var api = {broken</script>
            <script>var api = {"routes": [{"id": "r1"}]};</script>
            <script>var api = {"services": []};</script>
        "#;
        let artifacts = EmbeddedJsonExtractor.extract("http://x", html);
        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].raw_payload, json!({"routes": [{"id": "r1"}]}));
    }
}
