//! Tool dispatcher: the user-facing operations over the local store, the
//! catalog scraper and the NGSI passthrough. Every operation returns
//! rendered text; failures are rendered too.

pub mod format;

use serde_json::Value;
use tracing::{error, warn};

use crate::catalog::{CatalogScraper, CATALOG_DOCUMENT, DISASTER_DOCUMENT};
use crate::config::{Credentials, Settings};
use crate::ngsi::{NgsiClient, NgsiError};
use crate::scrapers::client_from_settings;
use crate::session::Session;
use crate::storage::LocalStore;

/// Resource URIs served by [`ToolDispatcher::resource`].
pub const RESOURCE_API_DOCS: &str = "yaizu://api-docs";
pub const RESOURCE_DISASTER_APIS: &str = "yaizu://disaster-apis";
pub const RESOURCE_STATUS: &str = "yaizu://status";

pub struct ToolDispatcher<'a> {
    store: &'a LocalStore,
    settings: &'a Settings,
    credentials: &'a Credentials,
}

impl<'a> ToolDispatcher<'a> {
    pub fn new(
        store: &'a LocalStore,
        settings: &'a Settings,
        credentials: &'a Credentials,
    ) -> Self {
        Self {
            store,
            settings,
            credentials,
        }
    }

    /// Load a document, treating unreadable ones as absent.
    fn load(&self, name: &str) -> Option<Value> {
        match self.store.load(name) {
            Ok(doc) => doc,
            Err(e) => {
                warn!("Could not load {}: {}", name, e);
                None
            }
        }
    }

    pub async fn scrape_catalog(&self) -> String {
        let client = match client_from_settings(self.settings) {
            Ok(client) => client,
            Err(e) => return format!("Failed to create HTTP client: {}", e),
        };
        let session = Session::new(self.credentials.clone());
        let mut scraper = CatalogScraper::new(client, session, self.settings);
        match scraper.scrape_and_save_all(self.store).await {
            Ok(summary) => format::scrape_summary(&summary),
            Err(e) => {
                error!("Scrape aborted: {}", e);
                format!("Scrape aborted: {}", e)
            }
        }
    }

    pub fn list_saved_documents(&self) -> String {
        let docs: Vec<(String, Option<Value>)> = self
            .store
            .list()
            .into_iter()
            .map(|name| {
                let doc = self.load(&name);
                (name, doc)
            })
            .collect();
        format::document_list(&docs)
    }

    pub fn search_documents(&self, keyword: &str) -> String {
        format::search_results(keyword, &self.store.search(keyword))
    }

    /// Details of a document by file name, else of the first catalog entry
    /// matching `name`.
    pub fn get_document_details(&self, name: &str) -> String {
        if let Some(doc) = self.load(name) {
            return format::document_details(&doc);
        }
        match self.store.search(name).into_iter().next() {
            Some(hit) => format::document_details(&hit.api),
            None => format!("No API named \"{}\" was found.", name),
        }
    }

    pub async fn execute_typed_query(
        &self,
        entity_type: &str,
        params: Option<&str>,
        limit: u32,
    ) -> String {
        let result = match NgsiClient::from_settings(self.settings, self.credentials) {
            Ok(client) => client.execute(entity_type, params, limit).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(response) => format::query_result(entity_type, &response),
            Err(NgsiError::MissingApiKey) => {
                "Error: the API key is not set. Put YAIZU_API_KEY in the environment or .env."
                    .to_string()
            }
            Err(NgsiError::InvalidParams(_)) => {
                "Error: params must be a JSON object.".to_string()
            }
            Err(NgsiError::Timeout) => "Timeout: the API request timed out.".to_string(),
            Err(NgsiError::Http(e)) => format!("Connection error: {}", e),
        }
    }

    pub fn generate_api_command(&self, entity_type: &str) -> String {
        match self.load(entity_type) {
            Some(spec) => format::api_commands(entity_type, &spec),
            None => format!(
                "No information for entity type '{}'.\n\nAvailable entities: {}",
                entity_type,
                self.store.list().join(", ")
            ),
        }
    }

    pub fn resource(&self, uri: &str) -> String {
        match uri {
            RESOURCE_API_DOCS => format::catalog_resource(self.load(CATALOG_DOCUMENT).as_ref()),
            RESOURCE_DISASTER_APIS => {
                format::disaster_resource(self.load(DISASTER_DOCUMENT).as_ref())
            }
            RESOURCE_STATUS => format::status_resource(
                &self.store.list(),
                self.load(CATALOG_DOCUMENT).as_ref(),
                self.load(DISASTER_DOCUMENT).as_ref(),
            ),
            other => format!("Error: unknown resource {}", other),
        }
    }
}
