//! Catalog model: entries built from discovery payloads and the documents
//! written to the local store.

pub mod disaster;
mod pipeline;

pub use disaster::{is_disaster_related, DISASTER_KEYWORDS};
pub use pipeline::{CatalogScraper, ScrapeSummary};

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::extract::html::LINK_DISCOVERY;
use crate::extract::DiscoveredPayload;
use crate::storage::now_iso;

pub const CATALOG_TITLE: &str = "焼津市APIカタログ";
pub const DISASTER_CATALOG_TITLE: &str = "焼津市防災関連API";

/// Store name of the full catalog document.
pub const CATALOG_DOCUMENT: &str = "api_catalog";
/// Store name of the disaster subset document.
pub const DISASTER_DOCUMENT: &str = "disaster_apis";

/// One discovered API descriptor. Unique by `name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub endpoints: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub methods: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub is_disaster_related: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_models: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Vec<Map<String, Value>>>,
}

impl CatalogEntry {
    fn new(name: String, description: String, category: &str, endpoints: Vec<String>) -> Self {
        Self {
            name,
            description,
            category: category.to_string(),
            endpoints,
            methods: None,
            url: None,
            kind: None,
            is_disaster_related: false,
            detail_url: None,
            data_models: None,
            parameters: None,
        }
    }

    /// Store name of the per-API document.
    pub fn document_name(&self) -> String {
        let name = if self.name.is_empty() {
            "unknown"
        } else {
            self.name.as_str()
        };
        format!("api_{}", name.replace([' ', '/'], "_"))
    }
}

/// Entries and categories produced from one payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuiltCatalog {
    pub apis: Vec<CatalogEntry>,
    pub categories: Vec<String>,
}

impl BuiltCatalog {
    fn push(&mut self, entry: CatalogEntry) {
        if !self.categories.contains(&entry.category) {
            self.categories.push(entry.category.clone());
        }
        self.apis.push(entry);
    }
}

fn str_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

fn string_list(value: &Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Build catalog entries from a discovery payload.
pub fn build(payload: &DiscoveredPayload) -> BuiltCatalog {
    let mut built = BuiltCatalog::default();

    match payload {
        DiscoveredPayload::Gateway { services, routes } => {
            for service in services {
                let name = str_field(service, "name").unwrap_or_else(|| "Unknown Service".into());
                let description = str_field(service, "description").unwrap_or_default();
                let url = str_field(service, "url").unwrap_or_default();
                let mut entry = CatalogEntry::new(name, description, "service", vec![url]);
                entry.is_disaster_related =
                    is_disaster_related(&format!("{} {}", entry.name, entry.description));
                built.push(entry);
            }

            for route in routes {
                let paths = string_list(route, "paths");
                let name = str_field(route, "name").unwrap_or_else(|| {
                    let id = match route.get("id") {
                        Some(Value::String(id)) => id.clone(),
                        Some(Value::Null) | None => "Unknown".to_string(),
                        Some(other) => other.to_string(),
                    };
                    format!("Route {}", id)
                });
                let description = format!("Path: {}", paths.join(", "));
                let mut entry = CatalogEntry::new(name, description, "route", paths.clone());
                entry.methods = Some(
                    route
                        .get("methods")
                        .and_then(Value::as_array)
                        .cloned()
                        .unwrap_or_default(),
                );
                entry.is_disaster_related = is_disaster_related(&paths.join(" "));
                built.push(entry);
            }
        }
        DiscoveredPayload::Html { links, .. } => {
            // Table rows are kept in raw_api_data only.
            for link in links {
                let category = link.kind.clone().unwrap_or_else(|| "html_discovery".into());
                let mut entry = CatalogEntry::new(
                    link.name.clone(),
                    String::new(),
                    &category,
                    vec![link.url.clone()],
                );
                entry.url = Some(link.url.clone());
                entry.kind = Some(link.kind.clone().unwrap_or_else(|| LINK_DISCOVERY.into()));
                entry.is_disaster_related =
                    is_disaster_related(&format!("{} {}", link.name, link.url));
                built.push(entry);
            }
        }
        DiscoveredPayload::Opaque(_) => {}
    }

    built
}

/// Drop later entries whose name was already seen. Case-sensitive.
pub fn merge_by_name(entries: Vec<CatalogEntry>) -> Vec<CatalogEntry> {
    let mut seen = HashSet::new();
    entries
        .into_iter()
        .filter(|e| seen.insert(e.name.clone()))
        .collect()
}

/// The full catalog as written to `api_catalog.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogDocument {
    pub title: String,
    pub apis: Vec<CatalogEntry>,
    pub categories: Vec<String>,
    pub last_updated: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_api_data: Option<Value>,
}

impl CatalogDocument {
    pub fn new(built: BuiltCatalog, raw_api_data: Option<Value>) -> Self {
        let apis = merge_by_name(built.apis);
        let mut categories: Vec<String> = Vec::new();
        for entry in &apis {
            if !categories.contains(&entry.category) {
                categories.push(entry.category.clone());
            }
        }
        Self {
            title: CATALOG_TITLE.to_string(),
            apis,
            categories,
            last_updated: now_iso(),
            raw_api_data,
        }
    }

    pub fn disaster_entries(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.apis.iter().filter(|e| e.is_disaster_related)
    }
}

/// The disaster subset written to `disaster_apis.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisasterCatalog {
    pub title: String,
    pub apis: Vec<CatalogEntry>,
    pub last_updated: String,
}

impl DisasterCatalog {
    pub fn new(apis: Vec<CatalogEntry>) -> Self {
        Self {
            title: DISASTER_CATALOG_TITLE.to_string(),
            apis,
            last_updated: now_iso(),
        }
    }
}
