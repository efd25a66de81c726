//! PDF harvest runs.
//!
//! Two sources feed the documentation directory: the authenticated
//! documentation portal, and the markdown PDF links embedded in the OpenAPI
//! YAML files. The YAML run also turns each PDF link into an entity spec.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::download::{url_filename, DownloadConfig, DownloadEvent, DownloadSummary, PdfDownloader};
use crate::config::{ConfigError, Settings};
use crate::extract::pdf_links::markdown_pdf_links;
use crate::extract::{
    detail_page_documents, extract_documentation_apis, fallback_portal_apis, PortalApi,
};
use crate::scrapers::HttpClient;
use crate::session::Session;
use crate::specs::generate::DATA_MODELS_INDEX_DOCUMENT;
use crate::specs::{spec_from_pdf_name, DataModelIndex, IndexedModel, SpecError};
use crate::storage::LocalStore;

/// Result of [`harvest_portal_pdfs`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct PortalHarvestReport {
    pub authenticated: bool,
    pub apis: Vec<String>,
    pub summary: DownloadSummary,
}

/// Download every document linked from the portal's API detail pages into
/// `documentation/<api type>/`.
pub async fn harvest_portal_pdfs(
    session: &mut Session,
    client: &HttpClient,
    settings: &Settings,
    events: Option<mpsc::UnboundedSender<DownloadEvent>>,
) -> Result<PortalHarvestReport, ConfigError> {
    session.credentials().portal_login()?;

    let base_url = settings.catalog_base_url.trim_end_matches('/');
    let mut report = PortalHarvestReport::default();
    if !session.authenticate_documentation(client, base_url).await {
        warn!("Documentation portal login failed; nothing harvested");
        return Ok(report);
    }
    report.authenticated = true;

    let headers = session.headers();
    let apis = fetch_portal_apis(client, headers.as_slice(), base_url).await;
    info!("Harvesting documents for {} portal APIs", apis.len());

    let mut downloader = PdfDownloader::new(
        client.clone(),
        headers.as_slice().to_vec(),
        DownloadConfig {
            request_delay: settings.download_delay(),
        },
    );
    if let Some(tx) = events {
        downloader = downloader.with_events(tx);
    }

    for api in &apis {
        report.apis.push(api.name.clone());
        let Some(html) = fetch_page(client, headers.as_slice(), &api.detail_url).await else {
            continue;
        };
        let documents = detail_page_documents(&html, &api.detail_url, &api.kind);
        if documents.is_empty() {
            info!("No documents found for {}", api.name);
            continue;
        }

        let dir = settings.documentation_dir.join(&api.kind);
        for document in documents {
            let ok = downloader
                .download_with_recovery(&document.url, &api.name, &document.name, &dir)
                .await;
            report.summary.record(ok);
            downloader.pause().await;
        }
    }

    report.summary.downloaded = downloader.take_downloaded();
    info!(
        "Portal harvest: {}/{} documents, {:.1} KB written",
        report.summary.success,
        report.summary.total,
        report.summary.total_size_kb()
    );
    Ok(report)
}

/// Body of a page that answered 200.
async fn fetch_page(
    client: &HttpClient,
    headers: &[(String, String)],
    url: &str,
) -> Option<String> {
    let response = match client.get(url, headers).await {
        Ok(response) => response,
        Err(e) => {
            warn!("Failed to load {}: {}", url, e);
            return None;
        }
    };
    let status = response.status_code();
    if status != 200 {
        warn!("{} returned {}", url, status);
        return None;
    }
    match response.text().await {
        Ok(html) => Some(html),
        Err(e) => {
            warn!("Failed to read {}: {}", url, e);
            None
        }
    }
}

/// The portal's API listing, or the three known APIs when it yields none.
async fn fetch_portal_apis(
    client: &HttpClient,
    headers: &[(String, String)],
    base_url: &str,
) -> Vec<PortalApi> {
    let listing = format!("{}/documentation", base_url);
    let apis = match fetch_page(client, headers, &listing).await {
        Some(html) => extract_documentation_apis(&html, base_url),
        None => Vec::new(),
    };
    if apis.is_empty() {
        warn!("No APIs on the documentation listing; using the known API pages");
        return fallback_portal_apis(base_url);
    }
    apis
}

/// Documentation subdirectory for PDFs listed in a YAML file.
pub fn yaml_category_dir(documentation_dir: &Path, yaml_name: &str) -> PathBuf {
    match yaml_name {
        "bousai-orion-openapi.yaml" => documentation_dir.join("bousai-api"),
        "bousai-public-facility-orion-openapi.yaml" => {
            documentation_dir.join("public-facility-api")
        }
        "tiikikasseika-orion-openapi.yaml" => documentation_dir.join("tourism-api"),
        _ => documentation_dir.to_path_buf(),
    }
}

/// Per-file outcome of [`harvest_openapi`].
#[derive(Debug, Clone, Serialize)]
pub struct YamlHarvest {
    pub yaml_file: String,
    pub links: usize,
    pub processed: usize,
    pub models: Vec<IndexedModel>,
}

/// Result of [`harvest_openapi`].
#[derive(Debug, Clone, Serialize)]
pub struct OpenApiHarvestReport {
    pub files: Vec<YamlHarvest>,
    pub index: DataModelIndex,
    pub downloads: DownloadSummary,
}

fn sorted_yaml_files(dir: &Path) -> Result<Vec<PathBuf>, SpecError> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().and_then(|e| e.to_str()) == Some("yaml"))
        .collect();
    files.sort();
    Ok(files)
}

/// Walk `openapi_dir/*.yaml`, fetch every listed PDF and write a spec per
/// fetched PDF plus `data_models_index.json` into `store`.
///
/// With `download = false` no request is made and a spec is written for
/// every link.
pub async fn harvest_openapi(
    settings: &Settings,
    client: &HttpClient,
    store: &LocalStore,
    download: bool,
    events: Option<mpsc::UnboundedSender<DownloadEvent>>,
) -> Result<OpenApiHarvestReport, SpecError> {
    let yaml_files = sorted_yaml_files(&settings.openapi_dir)?;
    if yaml_files.is_empty() {
        warn!("No OpenAPI YAML files in {}", settings.openapi_dir.display());
    }

    let mut downloader = PdfDownloader::new(
        client.clone(),
        Vec::new(),
        DownloadConfig {
            request_delay: settings.yaml_download_delay(),
        },
    );
    if let Some(tx) = events {
        downloader = downloader.with_events(tx);
    }

    let mut files = Vec::new();
    let mut downloads = DownloadSummary::default();
    for path in &yaml_files {
        let yaml_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let content = std::fs::read_to_string(path)?;
        let links = markdown_pdf_links(&content);
        info!("{}: {} PDF links", yaml_name, links.len());

        let dir = yaml_category_dir(&settings.documentation_dir, &yaml_name);
        let mut harvest = YamlHarvest {
            yaml_file: yaml_name.clone(),
            links: links.len(),
            processed: 0,
            models: Vec::new(),
        };

        for (name, url) in links {
            let filename = url_filename(&url);
            if download {
                let ok = downloader.fetch_to(&url, &dir.join(&filename), &name).await;
                downloads.record(ok);
                downloader.pause().await;
                if !ok {
                    continue;
                }
            }

            let spec = spec_from_pdf_name(&name, &filename);
            store.save_as(&spec.entity_type, &spec)?;
            harvest.processed += 1;
            harvest.models.push(IndexedModel {
                source_yaml: yaml_name.clone(),
                name,
                pdf_file: filename,
                json_file: format!("{}.json", spec.entity_type),
                entity_type: spec.entity_type,
            });
        }

        files.push(harvest);
    }

    downloads.downloaded = downloader.take_downloaded();
    let index = DataModelIndex::new(
        files.iter().map(|f| f.yaml_file.clone()).collect(),
        files.iter().flat_map(|f| f.models.iter().cloned()).collect(),
    );
    store.save_as(DATA_MODELS_INDEX_DOCUMENT, &index)?;
    info!("Generated {} entity specs", index.total_models);

    Ok(OpenApiHarvestReport {
        files,
        index,
        downloads,
    })
}
