//! Download service types and events.

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

/// Events emitted during download operations.
#[derive(Debug, Clone, PartialEq)]
pub enum DownloadEvent {
    /// Download started for a URL
    Started { url: String, filename: String },
    /// Target already on disk, no request made
    Skipped { url: String, path: PathBuf },
    /// File written
    Completed { url: String, path: PathBuf, size: u64 },
    /// Server answered with something that is not a PDF
    NotPdf {
        url: String,
        content_type: Option<String>,
    },
    /// Download failed
    Failed { url: String, error: String },
}

/// Configuration for the PDF downloader.
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    /// Fixed pause after each batch item.
    pub request_delay: Duration,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            request_delay: Duration::from_millis(500),
        }
    }
}

/// Successful result of a single download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    Downloaded { path: PathBuf, size: u64 },
    Skipped { path: PathBuf },
}

impl DownloadOutcome {
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::Downloaded { path, .. } | Self::Skipped { path } => path,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("response is not a PDF (content-type: {})", .content_type.as_deref().unwrap_or("unknown"))]
    NotPdf {
        content_type: Option<String>,
        body: Vec<u8>,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A file written by the downloader.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DownloadedDocument {
    pub filename: String,
    pub api: String,
    pub size_kb: f64,
    pub url: String,
}

/// Totals for a batch of downloads.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DownloadSummary {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub downloaded: Vec<DownloadedDocument>,
}

impl DownloadSummary {
    pub fn record(&mut self, ok: bool) {
        self.total += 1;
        if ok {
            self.success += 1;
        } else {
            self.failed += 1;
        }
    }

    pub fn total_size_kb(&self) -> f64 {
        self.downloaded.iter().map(|d| d.size_kb).sum()
    }
}
