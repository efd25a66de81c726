//! Documentation portal pages: the API listing and per-API detail pages.

use std::sync::LazyLock;

use scraper::{Html, Selector};
use serde::Serialize;
use serde_json::Value;

use super::pdf_links::{join_url, script_pdf_links};
use super::stripped_text;

static DATA_JSON: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("[data-json]").expect("data-json selector should compile"));
static ANCHOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("anchor selector should compile"));
static SPEC_CONTAINER: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div, section").expect("container selector should compile"));

const DOCUMENT_KEYWORDS: &[&str] = &["pdf", "download", "spec", "仕様書", "ダウンロード"];

/// An API listed on the documentation portal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortalApi {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub detail_url: String,
    pub data: Value,
}

/// A document candidate found on a detail page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortalDocument {
    pub url: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Map a portal API title onto its documentation category.
pub fn classify_api_type(title: &str) -> &'static str {
    let title = title.to_lowercase();
    if title.contains("観光") || title.contains("産業") {
        "tourism_industry"
    } else if title.contains("公共施設") {
        "public_facility"
    } else if title.contains("防災") {
        "disaster_info"
    } else {
        "unknown"
    }
}

fn slug(title: &str) -> String {
    title
        .to_lowercase()
        .replace(' ', "-")
        .replace(['（', '）'], "")
}

/// Read the `[data-json]` cards of the documentation listing.
pub fn extract_documentation_apis(html: &str, base_url: &str) -> Vec<PortalApi> {
    let base = base_url.trim_end_matches('/');
    let document = Html::parse_document(html);
    let mut apis = Vec::new();

    for item in document.select(&DATA_JSON) {
        let Some(raw) = item.value().attr("data-json") else {
            continue;
        };
        let Ok(data) = serde_json::from_str::<Value>(raw) else {
            continue;
        };
        let title = data
            .pointer("/info/title")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        if title.is_empty() {
            continue;
        }

        let detail_url = match item
            .select(&ANCHOR)
            .next()
            .and_then(|a| a.value().attr("href"))
        {
            Some(href) => join_url(&format!("{}/", base), href),
            None => {
                let service_id = match data.get("id") {
                    Some(Value::String(id)) => id.clone(),
                    Some(Value::Null) | None => slug(&title),
                    Some(other) => other.to_string(),
                };
                format!("{}/documentation/{}", base, service_id)
            }
        };

        apis.push(PortalApi {
            kind: classify_api_type(&title).to_string(),
            name: title,
            detail_url,
            data,
        });
    }

    apis
}

/// The three known portal APIs, used when the listing yields nothing.
pub fn fallback_portal_apis(base_url: &str) -> Vec<PortalApi> {
    let base = base_url.trim_end_matches('/');
    [
        ("観光・産業API（FIWARE NGSI v2）", "tourism_industry", "tourism-industry-api"),
        ("公共施設API（FIWARE NGSI v2）", "public_facility", "public-facility-api"),
        ("防災情報API（FIWARE NGSI v2）", "disaster_info", "disaster-info-api"),
    ]
    .into_iter()
    .map(|(name, kind, page)| PortalApi {
        name: name.to_string(),
        kind: kind.to_string(),
        detail_url: format!("{}/documentation/{}", base, page),
        data: Value::Object(Default::default()),
    })
    .collect()
}

/// PDF candidates on an API detail page, in discovery order.
pub fn detail_page_documents(html: &str, page_url: &str, api_type: &str) -> Vec<PortalDocument> {
    let document = Html::parse_document(html);
    let mut found = Vec::new();

    for anchor in document.select(&ANCHOR) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let text = stripped_text(anchor);
        let text_lower = text.to_lowercase();
        if href.to_lowercase().contains(".pdf")
            || DOCUMENT_KEYWORDS.iter().any(|k| text_lower.contains(k))
        {
            found.push(PortalDocument {
                url: join_url(page_url, href),
                name: if text.is_empty() {
                    "document".to_string()
                } else {
                    text
                },
                kind: "detail_page".to_string(),
            });
        }
    }

    for element in document.select(&SPEC_CONTAINER) {
        let is_spec_viewer = element
            .value()
            .classes()
            .any(|c| c.contains("swagger") || c.contains("openapi"));
        if !is_spec_viewer {
            continue;
        }
        let value = element.value();
        if let Some(spec_url) = value.attr("data-url").or_else(|| value.attr("data-spec-url")) {
            found.push(PortalDocument {
                url: join_url(page_url, spec_url),
                name: format!("{}_swagger_spec", api_type),
                kind: "swagger_spec".to_string(),
            });
        }
    }

    for url in script_pdf_links(html, page_url) {
        found.push(PortalDocument {
            url,
            name: format!("{}_embedded", api_type),
            kind: "javascript_embedded".to_string(),
        });
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://portal.example.jp/yaizu";

    #[test]
    fn test_classify_api_type() {
        assert_eq!(classify_api_type("観光・産業API"), "tourism_industry");
        assert_eq!(classify_api_type("公共施設API"), "public_facility");
        assert_eq!(classify_api_type("防災情報API"), "disaster_info");
        assert_eq!(classify_api_type("Weather"), "unknown");
    }

    #[test]
    fn test_documentation_listing() {
        let html = r#"
            <div data-json='{"id":"svc-1","info":{"title":"防災情報API"}}'>
              <a href="documentation/bousai">open</a>
            </div>
            <div data-json='{"id":"svc-2","info":{"title":"公共施設API"}}'></div>
            <div data-json='{"info":{"title":"Tourism API（v2）"}}'></div>
            <div data-json='not json'></div>
            <div data-json='{"info":{}}'></div>
        "#;
        let apis = extract_documentation_apis(html, BASE);
        assert_eq!(apis.len(), 3);
        assert_eq!(apis[0].detail_url, format!("{}/documentation/bousai", BASE));
        assert_eq!(apis[0].kind, "disaster_info");
        assert_eq!(apis[1].detail_url, format!("{}/documentation/svc-2", BASE));
        assert_eq!(apis[2].detail_url, format!("{}/documentation/tourism-apiv2", BASE));
        assert_eq!(apis[2].kind, "unknown");
    }

    #[test]
    fn test_fallback_urls() {
        let urls: Vec<String> = fallback_portal_apis(BASE)
            .into_iter()
            .map(|a| a.detail_url)
            .collect();
        assert_eq!(
            urls,
            vec![
                format!("{}/documentation/tourism-industry-api", BASE),
                format!("{}/documentation/public-facility-api", BASE),
                format!("{}/documentation/disaster-info-api", BASE),
            ]
        );
    }

    #[test]
    fn test_detail_page_documents() {
        let html = r#"
            <a href="/files/spec.pdf"></a>
            <a href="/get">仕様書ダウンロード</a>
            <a href="/home">Home</a>
            <div class="swagger-ui" data-url="/openapi.yaml"></div>
            <script>var doc = "files/embedded.pdf";</script>
        "#;
        let page = format!("{}/documentation/bousai", BASE);
        let docs = detail_page_documents(html, &page, "disaster_info");
        let names: Vec<&str> = docs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "document",
                "仕様書ダウンロード",
                "disaster_info_swagger_spec",
                "disaster_info_embedded"
            ]
        );
        assert_eq!(docs[0].url, "https://portal.example.jp/files/spec.pdf");
        assert_eq!(
            docs[3].url,
            "https://portal.example.jp/yaizu/documentation/files/embedded.pdf"
        );
    }
}
