//! PDF download service.
//!
//! Fetches documents one at a time, verifies the `%PDF` signature and writes
//! the bytes verbatim. Emits events for progress tracking so the CLI can
//! render them without the service knowing about terminals.

mod types;

use std::path::Path;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use url::Url;

pub use types::{
    DownloadConfig, DownloadError, DownloadEvent, DownloadOutcome, DownloadSummary,
    DownloadedDocument,
};

use crate::extract::pdf_links::anchor_pdf_links;
use crate::scrapers::HttpClient;
use crate::storage::write_atomic;

/// Leading bytes every accepted document must start with.
pub const PDF_MAGIC: &[u8] = b"%PDF";

/// Nested links followed when a document URL serves an HTML page.
const NESTED_LINK_LIMIT: usize = 3;

/// Chars kept from a URL-derived file stem.
const URL_STEM_LIMIT: usize = 50;

/// Map every char outside `[a-zA-Z0-9_-]` to `_` and keep the first `max`.
pub fn sanitize_segment(text: &str, max: usize) -> String {
    text.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .take(max)
        .collect()
}

/// File name for a catalog document: `{api[..20]}_{doc[..30]}.pdf`.
pub fn pdf_filename(api_name: &str, doc_name: &str) -> String {
    format!(
        "{}_{}.pdf",
        sanitize_segment(api_name, 20),
        sanitize_segment(doc_name, 30)
    )
}

/// Sanitized stem of the last path segment of `url` plus `.pdf`, or
/// `document.pdf`.
pub fn url_filename(url: &str) -> String {
    let segment = Url::parse(url).ok().and_then(|u| {
        u.path_segments()
            .and_then(|mut segments| segments.next_back().map(str::to_string))
    });
    let stem = match segment.as_deref() {
        Some(s) => s.rsplit_once('.').map_or(s, |(stem, _)| stem),
        None => "",
    };
    if stem.is_empty() {
        return "document.pdf".to_string();
    }
    format!("{}.pdf", sanitize_segment(stem, URL_STEM_LIMIT))
}

/// Sequential PDF downloader shared by both harvest runs.
pub struct PdfDownloader {
    client: HttpClient,
    headers: Vec<(String, String)>,
    config: DownloadConfig,
    events: Option<mpsc::UnboundedSender<DownloadEvent>>,
    downloaded: Vec<DownloadedDocument>,
}

impl PdfDownloader {
    pub fn new(client: HttpClient, headers: Vec<(String, String)>, config: DownloadConfig) -> Self {
        Self {
            client,
            headers,
            config,
            events: None,
            downloaded: Vec::new(),
        }
    }

    pub fn with_events(mut self, events: mpsc::UnboundedSender<DownloadEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn take_downloaded(&mut self) -> Vec<DownloadedDocument> {
        std::mem::take(&mut self.downloaded)
    }

    fn emit(&self, event: DownloadEvent) {
        if let Some(ref tx) = self.events {
            let _ = tx.send(event);
        }
    }

    /// Pause between batch items.
    pub async fn pause(&self) {
        if !self.config.request_delay.is_zero() {
            tokio::time::sleep(self.config.request_delay).await;
        }
    }

    /// Download `url` to `target` unless it already exists.
    pub async fn download(
        &self,
        url: &str,
        target: &Path,
    ) -> Result<DownloadOutcome, DownloadError> {
        if target.exists() {
            debug!("Skipping existing {}", target.display());
            self.emit(DownloadEvent::Skipped {
                url: url.to_string(),
                path: target.to_path_buf(),
            });
            return Ok(DownloadOutcome::Skipped {
                path: target.to_path_buf(),
            });
        }

        self.emit(DownloadEvent::Started {
            url: url.to_string(),
            filename: target
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        });

        let response = self.client.get(url, &self.headers).await?;
        let status = response.status_code();
        if status != 200 {
            return Err(DownloadError::Status(status));
        }

        let content_type = response.content_type().map(str::to_string);
        let body = response.bytes().await?;
        if !body.starts_with(PDF_MAGIC) {
            let sniffed = infer::get(&body).map(|kind| kind.mime_type());
            warn!(
                "{} is not a PDF (content-type: {}, sniffed: {})",
                url,
                content_type.as_deref().unwrap_or("unknown"),
                sniffed.unwrap_or("unknown")
            );
            self.emit(DownloadEvent::NotPdf {
                url: url.to_string(),
                content_type: content_type.clone(),
            });
            return Err(DownloadError::NotPdf { content_type, body });
        }

        write_atomic(target, &body)?;
        let size = body.len() as u64;
        info!("Saved {} ({:.1} KB)", target.display(), size as f64 / 1024.0);
        self.emit(DownloadEvent::Completed {
            url: url.to_string(),
            path: target.to_path_buf(),
            size,
        });
        Ok(DownloadOutcome::Downloaded {
            path: target.to_path_buf(),
            size,
        })
    }

    /// Download to an explicit target and record written files under `api`.
    /// Existing files count as success.
    pub async fn fetch_to(&mut self, url: &str, target: &Path, api: &str) -> bool {
        match self.download(url, target).await {
            Ok(outcome) => {
                self.record(url, api, &outcome);
                true
            }
            Err(e) => {
                self.report_failure(url, &e);
                false
            }
        }
    }

    /// Download a catalog document named by [`pdf_filename`] into `dir`.
    ///
    /// When the URL serves an HTML page, up to three `.pdf` links on it are
    /// tried one level deep. The outer document still counts as failed.
    pub async fn download_with_recovery(
        &mut self,
        url: &str,
        api_name: &str,
        doc_name: &str,
        dir: &Path,
    ) -> bool {
        let target = dir.join(pdf_filename(api_name, doc_name));
        match self.download(url, &target).await {
            Ok(outcome) => {
                self.record(url, api_name, &outcome);
                true
            }
            Err(DownloadError::NotPdf {
                content_type: Some(content_type),
                body,
            }) if content_type.starts_with("text/html") => {
                let html = String::from_utf8_lossy(&body);
                let nested: Vec<String> = anchor_pdf_links(&html, url)
                    .into_iter()
                    .map(|(_, link)| link)
                    .take(NESTED_LINK_LIMIT)
                    .collect();
                if !nested.is_empty() {
                    info!("Found {} PDF links inside {}", nested.len(), url);
                }
                let nested_name = format!("nested_{}", doc_name);
                let nested_target = dir.join(pdf_filename(api_name, &nested_name));
                for link in nested {
                    self.fetch_to(&link, &nested_target, api_name).await;
                }
                false
            }
            Err(e) => {
                self.report_failure(url, &e);
                false
            }
        }
    }

    fn record(&mut self, url: &str, api: &str, outcome: &DownloadOutcome) {
        if let DownloadOutcome::Downloaded { path, size } = outcome {
            self.downloaded.push(DownloadedDocument {
                filename: path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                api: api.to_string(),
                size_kb: *size as f64 / 1024.0,
                url: url.to_string(),
            });
        }
    }

    fn report_failure(&self, url: &str, error: &DownloadError) {
        match error {
            // Already logged and emitted by `download`.
            DownloadError::NotPdf { .. } => {}
            _ => {
                warn!("Download of {} failed: {}", url, error);
                self.emit(DownloadEvent::Failed {
                    url: url.to_string(),
                    error: error.to_string(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_segment_charset_and_cap() {
        let s = sanitize_segment("防災情報API（FIWARE NGSI v2）", 20);
        assert_eq!(s.chars().count(), 20);
        assert!(s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-'));
        assert_eq!(sanitize_segment("a-b_c.d", 30), "a-b_c_d");
        assert_eq!(sanitize_segment("防災/避難 API", 30), "______API");
    }

    #[test]
    fn test_pdf_filename_caps() {
        let name = pdf_filename(&"x".repeat(40), &"y".repeat(40));
        assert_eq!(name, format!("{}_{}.pdf", "x".repeat(20), "y".repeat(30)));
        assert_eq!(pdf_filename("AED API", "spec"), "AED_API_spec.pdf");
    }

    #[test]
    fn test_url_filename() {
        assert_eq!(
            url_filename("https://docs.example.jp/files/shelter.pdf"),
            "shelter.pdf"
        );
        assert_eq!(url_filename("https://docs.example.jp/"), "document.pdf");
        assert_eq!(url_filename("not a url"), "document.pdf");

        let encoded =
            url_filename("https://docs.smartcity-yaizu.jp/files/%E9%81%BF%E9%9B%A3%E6%89%80.pdf");
        assert_eq!(encoded, "_E9_81_BF_E9_9B_A3_E6_89_80.pdf");

        let long = url_filename(&format!("https://docs.example.jp/{}.pdf", "a".repeat(80)));
        assert_eq!(long, format!("{}.pdf", "a".repeat(50)));
        assert_eq!(
            url_filename("https://docs.example.jp/files/Evacuation.Shelter.pdf"),
            "Evacuation_Shelter.pdf"
        );
    }

    #[test]
    fn test_summary_record() {
        let mut summary = DownloadSummary::default();
        summary.record(true);
        summary.record(false);
        summary.record(true);
        assert_eq!((summary.total, summary.success, summary.failed), (3, 2, 1));
    }
}
