//! Catalog scrape pipeline: login, probe, build, enrich, save.

use serde::Serialize;
use tracing::{error, info, warn};

use super::{
    build, BuiltCatalog, CatalogDocument, CatalogEntry, DisasterCatalog, CATALOG_DOCUMENT,
    DISASTER_DOCUMENT,
};
use crate::config::{ConfigError, Settings};
use crate::extract::{discover_from_response, extract_api_details, ApiDetails};
use crate::scrapers::{catalog_candidates, HttpClient, Prober};
use crate::session::Session;
use crate::storage::LocalStore;

/// Result of [`CatalogScraper::scrape_and_save_all`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScrapeSummary {
    pub success: bool,
    pub total_apis: usize,
    pub disaster_apis: usize,
    pub saved_files: Vec<String>,
}

pub struct CatalogScraper {
    client: HttpClient,
    session: Session,
    base_url: String,
    api_base_url: String,
}

impl CatalogScraper {
    pub fn new(client: HttpClient, session: Session, settings: &Settings) -> Self {
        Self {
            client,
            session,
            base_url: settings.catalog_base_url.trim_end_matches('/').to_string(),
            api_base_url: settings.catalog_api_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    pub async fn login(&mut self) -> bool {
        self.session.authenticate(&self.client, &self.base_url).await
    }

    /// Probe the gateway endpoints and build the catalog document.
    ///
    /// Returns `None` without a login. An exhausted probe still yields an
    /// (empty) document.
    pub async fn fetch_catalog(&self) -> Option<CatalogDocument> {
        if !self.session.is_authenticated() {
            error!("Not authenticated; call login first");
            return None;
        }

        info!("Fetching API catalog from {}", self.api_base_url);
        let headers = self.session.headers();
        let mut prober = Prober::new(catalog_candidates(&self.api_base_url));
        let discovery = prober
            .probe_until(&self.client, headers.as_slice(), discover_from_response)
            .await;

        let doc = match discovery {
            Some(discovery) => {
                let built = build(&discovery.payload);
                CatalogDocument::new(built, Some(discovery.raw()))
            }
            None => {
                warn!("No catalog endpoint returned usable data");
                CatalogDocument::new(BuiltCatalog::default(), None)
            }
        };

        info!(
            "Parsed {} APIs in {} categories",
            doc.apis.len(),
            doc.categories.len()
        );
        Some(doc)
    }

    /// Fetch and parse one API detail page. Non-200 yields `None`.
    pub async fn fetch_api_details(&self, url: &str) -> Option<ApiDetails> {
        let headers = self.session.headers();
        let response = match self.client.get(url, headers.as_slice()).await {
            Ok(response) => response,
            Err(e) => {
                error!("Failed to fetch API details from {}: {}", url, e);
                return None;
            }
        };
        if response.status_code() != 200 {
            return None;
        }
        match response.text().await {
            Ok(html) => Some(extract_api_details(&html)),
            Err(e) => {
                error!("Failed to read API details from {}: {}", url, e);
                None
            }
        }
    }

    /// Disaster-related entries of `catalog`, enriched from their detail
    /// pages when they have one.
    pub async fn fetch_disaster_apis(&self, catalog: &CatalogDocument) -> Vec<CatalogEntry> {
        let mut disaster_apis = Vec::new();
        for entry in catalog.disaster_entries() {
            let mut entry = entry.clone();
            if let Some(url) = entry.detail_url.clone() {
                if let Some(details) = self.fetch_api_details(&url).await {
                    merge_details(&mut entry, details);
                }
            }
            disaster_apis.push(entry);
        }
        info!("Found {} disaster-related APIs", disaster_apis.len());
        disaster_apis
    }

    /// Login, fetch the catalog once, and save the catalog, the disaster
    /// subset and one document per disaster API.
    pub async fn scrape_and_save_all(
        &mut self,
        store: &LocalStore,
    ) -> Result<ScrapeSummary, ConfigError> {
        self.session.credentials().portal_login()?;

        let mut summary = ScrapeSummary::default();
        if !self.login().await {
            error!("Login failed");
            return Ok(summary);
        }

        let Some(catalog) = self.fetch_catalog().await else {
            return Ok(summary);
        };
        summary.total_apis = catalog.apis.len();
        self.save(store, CATALOG_DOCUMENT, &catalog, &mut summary);

        let disaster_apis = self.fetch_disaster_apis(&catalog).await;
        if !disaster_apis.is_empty() {
            summary.disaster_apis = disaster_apis.len();
            let disaster_catalog = DisasterCatalog::new(disaster_apis);
            self.save(store, DISASTER_DOCUMENT, &disaster_catalog, &mut summary);

            for api in &disaster_catalog.apis {
                self.save(store, &api.document_name(), api, &mut summary);
            }
        }

        summary.success = true;
        info!(
            "Scrape complete: {} APIs, {} disaster-related, {} files",
            summary.total_apis,
            summary.disaster_apis,
            summary.saved_files.len()
        );
        Ok(summary)
    }

    fn save<T: Serialize>(
        &self,
        store: &LocalStore,
        name: &str,
        doc: &T,
        summary: &mut ScrapeSummary,
    ) {
        match store.save_document(name, doc, &self.base_url) {
            Ok(path) => {
                info!("Saved {}", path.display());
                summary.saved_files.push(format!("{}.json", name));
            }
            Err(e) => error!("Failed to save {}: {}", name, e),
        }
    }
}

/// Copy non-empty detail fields onto the entry.
fn merge_details(entry: &mut CatalogEntry, details: ApiDetails) {
    if !details.endpoints.is_empty() {
        entry.endpoints = details.endpoints;
    }
    if !details.data_models.is_empty() {
        entry.data_models = Some(details.data_models);
    }
    if !details.parameters.is_empty() {
        entry.parameters = Some(details.parameters);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    fn entry() -> CatalogEntry {
        serde_json::from_value(json!({
            "name": "避難所",
            "endpoints": ["/old"],
            "is_disaster_related": true
        }))
        .unwrap()
    }

    #[test]
    fn test_merge_details_keeps_existing_on_empty() {
        let mut e = entry();
        merge_details(&mut e, ApiDetails::default());
        assert_eq!(e.endpoints, vec!["/old"]);
        assert!(e.data_models.is_none());
    }

    #[test]
    fn test_merge_details_overwrites_non_empty() {
        let mut e = entry();
        let mut row = Map::new();
        row.insert("Name".into(), json!("limit"));
        merge_details(
            &mut e,
            ApiDetails {
                endpoints: vec!["/v2/entities".into()],
                data_models: vec![json!("model")],
                parameters: vec![row],
            },
        );
        assert_eq!(e.endpoints, vec!["/v2/entities"]);
        assert_eq!(e.data_models, Some(vec![json!("model")]));
        assert_eq!(e.parameters.as_ref().map(Vec::len), Some(1));
    }
}
