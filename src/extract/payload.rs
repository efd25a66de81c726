//! Folding extracted artifacts into a typed discovery payload.

use serde_json::{json, Map, Value};

use super::{
    ContentKind, EmbeddedJsonExtractor, ExtractedArtifact, Extractor, HtmlStructureExtractor,
};
use crate::scrapers::Classified;

/// An anchor found by HTML structure scanning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkCandidate {
    pub name: String,
    pub url: String,
    pub kind: Option<String>,
}

impl LinkCandidate {
    fn from_value(value: &Value) -> Self {
        let field = |key: &str| value.get(key).and_then(Value::as_str).map(str::to_string);
        Self {
            name: field("name").unwrap_or_default(),
            url: field("url").unwrap_or_default(),
            kind: field("type"),
        }
    }

    fn to_value(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("name".into(), json!(self.name));
        obj.insert("url".into(), json!(self.url));
        if let Some(ref kind) = self.kind {
            obj.insert("type".into(), json!(kind));
        }
        Value::Object(obj)
    }
}

/// What one accepted endpoint response turned out to contain.
#[derive(Debug, Clone, PartialEq)]
pub enum DiscoveredPayload {
    /// Kong-style listing with `services` and/or `routes` arrays.
    Gateway {
        services: Vec<Value>,
        routes: Vec<Value>,
    },
    Html {
        links: Vec<LinkCandidate>,
        table_rows: Vec<Map<String, Value>>,
    },
    /// JSON without a recognizable shape. Produces no catalog entries.
    Opaque(Value),
}

impl DiscoveredPayload {
    /// Classify a parsed JSON document by its top-level keys.
    pub fn from_json(value: Value) -> Self {
        let services = value.get("services").and_then(Value::as_array).cloned();
        let routes = value.get("routes").and_then(Value::as_array).cloned();
        if services.is_none() && routes.is_none() {
            return Self::Opaque(value);
        }
        Self::Gateway {
            services: services.unwrap_or_default(),
            routes: routes.unwrap_or_default(),
        }
    }

    /// Raw form stored alongside the catalog as `raw_api_data`.
    pub fn to_raw(&self, source_endpoint: &str) -> Value {
        match self {
            Self::Gateway { services, routes } => json!({
                "source_endpoint": source_endpoint,
                "data": {"services": services, "routes": routes},
            }),
            Self::Opaque(value) => json!({
                "source_endpoint": source_endpoint,
                "data": value,
            }),
            Self::Html { links, table_rows } => json!({
                "source_endpoint": source_endpoint,
                "html_data": {
                    "apis": links.iter().map(LinkCandidate::to_value).collect::<Vec<_>>(),
                    "services": table_rows,
                    "routes": [],
                },
            }),
        }
    }
}

/// A payload together with the endpoint it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Discovery {
    pub source_endpoint: String,
    pub payload: DiscoveredPayload,
}

impl Discovery {
    pub fn raw(&self) -> Value {
        self.payload.to_raw(&self.source_endpoint)
    }
}

/// Fold the artifacts of a single response.
///
/// A JSON artifact wins outright. Otherwise links and table rows form an
/// `Html` payload, or nothing when both are empty.
pub fn payload_from_artifacts(artifacts: &[ExtractedArtifact]) -> Option<DiscoveredPayload> {
    if let Some(json) = artifacts
        .iter()
        .find(|a| matches!(a.content_kind, ContentKind::Json | ContentKind::EmbeddedJson))
    {
        return Some(DiscoveredPayload::from_json(json.raw_payload.clone()));
    }

    let mut links = Vec::new();
    let mut table_rows = Vec::new();
    for artifact in artifacts {
        match artifact.content_kind {
            ContentKind::Link => links.push(LinkCandidate::from_value(&artifact.raw_payload)),
            ContentKind::HtmlTable => {
                if let Value::Object(row) = &artifact.raw_payload {
                    table_rows.push(row.clone());
                }
            }
            ContentKind::Json | ContentKind::EmbeddedJson | ContentKind::PdfUrl => {}
        }
    }

    if links.is_empty() && table_rows.is_empty() {
        None
    } else {
        Some(DiscoveredPayload::Html { links, table_rows })
    }
}

/// Run the extractor pipeline over a classified 200 response.
///
/// JSON bodies are always accepted. HTML bodies try embedded JSON first,
/// then page structure, and are rejected when neither yields anything.
pub fn discover_from_response(endpoint: &str, content: Classified) -> Option<Discovery> {
    let payload = match content {
        Classified::Json(value) => DiscoveredPayload::from_json(value),
        Classified::Html(body) => {
            let mut artifacts = EmbeddedJsonExtractor.extract(endpoint, &body);
            if artifacts.is_empty() {
                artifacts = HtmlStructureExtractor.extract(endpoint, &body);
            }
            payload_from_artifacts(&artifacts)?
        }
    };
    Some(Discovery {
        source_endpoint: endpoint.to_string(),
        payload,
    })
}
