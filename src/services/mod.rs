//! Service layer for document harvesting.
//!
//! Services emit events instead of printing, so the CLI decides how progress
//! is shown.

pub mod download;
pub mod harvest;

pub use download::{
    DownloadConfig, DownloadError, DownloadEvent, DownloadOutcome, DownloadSummary,
    DownloadedDocument, PdfDownloader,
};
pub use harvest::{
    harvest_openapi, harvest_portal_pdfs, yaml_category_dir, OpenApiHarvestReport,
    PortalHarvestReport, YamlHarvest,
};
