//! HTML structure extraction: API-ish links, API tables and detail pages.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::{stripped_text, ContentKind, ExtractedArtifact, Extractor};

static ANCHOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("anchor selector should compile"));
static TABLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table").expect("table selector should compile"));
static TH: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("th").expect("th selector should compile"));
static TR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tr").expect("tr selector should compile"));
static TD: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td").expect("td selector should compile"));
static ENDPOINT: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("code.endpoint, code.url, pre.endpoint, pre.url")
        .expect("endpoint selector should compile")
});
static DATA_MODEL: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("div.data-model, div.schema, section.data-model, section.schema")
        .expect("data model selector should compile")
});

const LINK_KEYWORDS: &[&str] = &["api", "service", "endpoint", "data"];
const PARAMETER_HEADERS: &[&str] = &["パラメータ", "Parameter", "Name"];

/// Link type recorded for anchors found by structure scanning.
pub const LINK_DISCOVERY: &str = "link_discovery";

/// Collects API-looking anchors and rows of API/service tables.
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlStructureExtractor;

impl Extractor for HtmlStructureExtractor {
    fn kind(&self) -> ContentKind {
        ContentKind::Link
    }

    fn extract(&self, source: &str, body: &str) -> Vec<ExtractedArtifact> {
        let document = Html::parse_document(body);
        let mut artifacts = Vec::new();

        for anchor in document.select(&ANCHOR) {
            let href = anchor.value().attr("href").unwrap_or_default();
            let text = stripped_text(anchor);
            let href_lower = href.to_lowercase();
            let text_lower = text.to_lowercase();
            if LINK_KEYWORDS
                .iter()
                .any(|k| href_lower.contains(k) || text_lower.contains(k))
            {
                artifacts.push(ExtractedArtifact::new(
                    source,
                    ContentKind::Link,
                    json!({"name": text, "url": href, "type": LINK_DISCOVERY}),
                ));
            }
        }

        for table in document.select(&TABLE) {
            let headers = table_headers(table);
            let is_api_table = headers.iter().any(|h| {
                let h = h.to_lowercase();
                h.contains("api") || h.contains("service")
            });
            if !is_api_table {
                continue;
            }
            for row in table_rows(table, &headers) {
                artifacts.push(ExtractedArtifact::new(
                    source,
                    ContentKind::HtmlTable,
                    Value::Object(row),
                ));
            }
        }

        artifacts
    }
}

fn table_headers(table: ElementRef<'_>) -> Vec<String> {
    table.select(&TH).map(stripped_text).collect()
}

/// Body rows zipped with the headers. The first `tr` is the header row.
fn table_rows(table: ElementRef<'_>, headers: &[String]) -> Vec<Map<String, Value>> {
    table
        .select(&TR)
        .skip(1)
        .filter_map(|row| {
            let cells: Vec<String> = row.select(&TD).map(stripped_text).collect();
            if cells.is_empty() {
                return None;
            }
            Some(
                headers
                    .iter()
                    .zip(cells)
                    .map(|(h, c)| (h.clone(), Value::String(c)))
                    .collect(),
            )
        })
        .collect()
}

/// Structured fields scraped from an API detail page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiDetails {
    pub endpoints: Vec<String>,
    pub data_models: Vec<Value>,
    pub parameters: Vec<Map<String, Value>>,
}

impl ApiDetails {
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty() && self.data_models.is_empty() && self.parameters.is_empty()
    }
}

/// Pull endpoints, data models and parameter tables from a detail page.
pub fn extract_api_details(html: &str) -> ApiDetails {
    let document = Html::parse_document(html);

    let endpoints = document.select(&ENDPOINT).map(stripped_text).collect();

    let data_models = document
        .select(&DATA_MODEL)
        .map(|model| {
            let text = stripped_text(model);
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        })
        .collect();

    let mut parameters = Vec::new();
    for table in document.select(&TABLE) {
        let headers = table_headers(table);
        if headers
            .iter()
            .any(|h| PARAMETER_HEADERS.contains(&h.as_str()))
        {
            parameters.extend(table_rows(table, &headers));
        }
    }

    ApiDetails {
        endpoints,
        data_models,
        parameters,
    }
}
