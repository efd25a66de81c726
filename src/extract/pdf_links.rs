//! PDF link discovery in markdown-flavoured YAML, HTML anchors and scripts.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use serde_json::json;
use url::Url;

use super::{stripped_text, ContentKind, ExtractedArtifact, Extractor};

/// Documentation host used by the published OpenAPI files.
pub const YAIZU_DOCS_DOMAIN: &str = "smartcity-yaizu.jp";

static MARKDOWN_PDF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\* \[(.*?)\]\((https://docs\.[^/\s()]+/.*?\.pdf)\)")
        .expect("markdown pdf pattern should compile")
});

static QUOTED_PDF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)["']([^"']*\.pdf[^"']*)["']"#).expect("quoted pdf pattern should compile")
});

static ANCHOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("anchor selector should compile"));
static SCRIPT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("script").expect("script selector should compile"));

/// `* [name](https://docs.<host>/....pdf)` pairs in document order.
pub fn markdown_pdf_links(text: &str) -> Vec<(String, String)> {
    MARKDOWN_PDF
        .captures_iter(text)
        .map(|c| (c[1].to_string(), c[2].to_string()))
        .collect()
}

/// Same as [`markdown_pdf_links`] restricted to `docs.<domain>`.
pub fn markdown_pdf_links_for_domain(text: &str, domain: &str) -> Vec<(String, String)> {
    let pattern = format!(
        r"\* \[(.*?)\]\((https://docs\.{}/.*?\.pdf)\)",
        regex::escape(domain)
    );
    match Regex::new(&pattern) {
        Ok(re) => re
            .captures_iter(text)
            .map(|c| (c[1].to_string(), c[2].to_string()))
            .collect(),
        Err(_) => Vec::new(),
    }
}

/// Any single- or double-quoted string containing `.pdf`.
pub fn quoted_pdf_strings(text: &str) -> Vec<String> {
    QUOTED_PDF
        .captures_iter(text)
        .map(|c| c[1].to_string())
        .collect()
}

/// Join `href` against `base`, leaving it untouched when joining fails.
pub fn join_url(base: &str, href: &str) -> String {
    Url::parse(base)
        .and_then(|b| b.join(href))
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// `(text, absolute url)` for every anchor whose href mentions `.pdf`.
pub fn anchor_pdf_links(html: &str, page_url: &str) -> Vec<(String, String)> {
    let document = Html::parse_document(html);
    document
        .select(&ANCHOR)
        .filter_map(|a| {
            let href = a.value().attr("href")?;
            if !href.to_lowercase().contains(".pdf") {
                return None;
            }
            Some((stripped_text(a), join_url(page_url, href)))
        })
        .collect()
}

/// Quoted `.pdf` strings inside scripts, made absolute when relative.
pub fn script_pdf_links(html: &str, page_url: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    document
        .select(&SCRIPT)
        .flat_map(|s| quoted_pdf_strings(&s.text().collect::<String>()))
        .map(|found| {
            if found.starts_with("http") {
                found
            } else {
                join_url(page_url, &found)
            }
        })
        .collect()
}

/// Anchors and script strings pointing at PDFs.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfLinkExtractor;

impl Extractor for PdfLinkExtractor {
    fn kind(&self) -> ContentKind {
        ContentKind::PdfUrl
    }

    fn extract(&self, source: &str, body: &str) -> Vec<ExtractedArtifact> {
        let anchors = anchor_pdf_links(body, source)
            .into_iter()
            .map(|(name, url)| json!({"name": name, "url": url, "type": "direct_link"}));
        let scripts = script_pdf_links(body, source)
            .into_iter()
            .map(|url| json!({"name": "", "url": url, "type": "javascript_embedded"}));

        anchors
            .chain(scripts)
            .map(|payload| ExtractedArtifact::new(source, ContentKind::PdfUrl, payload))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markdown_link_any_docs_host() {
        let yaml = "description: |\n  * [避難所一覧](https://docs.example.jp/files/shelter.pdf)\n";
        assert_eq!(
            markdown_pdf_links(yaml),
            vec![(
                "避難所一覧".to_string(),
                "https://docs.example.jp/files/shelter.pdf".to_string()
            )]
        );
    }

    #[test]
    fn test_markdown_links_keep_order() {
        let text = "* [AED設置場所](https://docs.smartcity-yaizu.jp/a/Aed.pdf)\n\
                    * [雨量計](https://docs.smartcity-yaizu.jp/a/PrecipitationGauge.pdf)\n\
                    * [not a pdf](https://docs.smartcity-yaizu.jp/a/readme.html)\n";
        let links = markdown_pdf_links(text);
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].0, "AED設置場所");
        assert_eq!(links[1].0, "雨量計");
    }

    #[test]
    fn test_markdown_links_domain_restricted() {
        let text = "* [A](https://docs.smartcity-yaizu.jp/Aed.pdf)\n* [B](https://docs.example.jp/B.pdf)";
        let links = markdown_pdf_links_for_domain(text, YAIZU_DOCS_DOMAIN);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].1, "https://docs.smartcity-yaizu.jp/Aed.pdf");
    }

    #[test]
    fn test_quoted_pdf_strings_case_insensitive() {
        let js = r#"var a = "/files/Spec.PDF"; var b = 'x.pdf?v=2'; var c = "none";"#;
        assert_eq!(quoted_pdf_strings(js), vec!["/files/Spec.PDF", "x.pdf?v=2"]);
    }

    #[test]
    fn test_anchor_and_script_links_are_absolute() {
        let html = r#"
            <a href="docs/shelter.pdf">避難所</a>
            <a href="/about">About</a>
            <script>load("https://cdn.example.jp/x.pdf"); load('/rel/y.pdf');</script>
        "#;
        let anchors = anchor_pdf_links(html, "https://portal.example.jp/yaizu/page");
        assert_eq!(
            anchors,
            vec![(
                "避難所".to_string(),
                "https://portal.example.jp/yaizu/docs/shelter.pdf".to_string()
            )]
        );
        let scripts = script_pdf_links(html, "https://portal.example.jp/yaizu/page");
        assert_eq!(
            scripts,
            vec!["https://cdn.example.jp/x.pdf", "https://portal.example.jp/rel/y.pdf"]
        );

        let artifacts = PdfLinkExtractor.extract("https://portal.example.jp/yaizu/page", html);
        assert_eq!(artifacts.len(), 3);
        assert!(artifacts.iter().all(|a| a.content_kind == ContentKind::PdfUrl));
    }
}
