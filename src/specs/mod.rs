//! FIWARE entity specifications.
//!
//! An [`EntitySpec`] describes one NGSI entity type: its service headers,
//! id pattern and ordered attribute set. Specs are written to the local store
//! by the known-model table, the OpenAPI harvest and the PDF enrichment step.

pub mod generate;
pub mod known;
pub mod openapi;
pub mod pdf_text;

pub use generate::{
    classify_entity, query_examples, spec_from_pdf_name, DataModelIndex, IndexedModel,
};
pub use known::{known_spec, write_known_specs, KnownModelEntry, KnownModelsIndex, KNOWN_MODELS};
pub use openapi::{parse_openapi, parse_openapi_file, EndpointSpec, OpenApiSummary, ParameterInfo};
pub use pdf_text::{
    enrich_spec, extract_fields, ExtractedField, PdfTextExtractor, PdftotextExtractor,
};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::storage::StoreError;

/// Value of the `Fiware-Service` header for every Yaizu entity.
pub const FIWARE_SERVICE: &str = "smartcity_yaizu";

#[derive(Debug, thiserror::Error)]
pub enum SpecError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("{0} is not installed")]
    ToolMissing(&'static str),

    #[error("{tool} failed: {message}")]
    Tool { tool: &'static str, message: String },
}

/// One attribute of an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl AttributeSpec {
    pub fn new(kind: &str, description: &str) -> Self {
        Self {
            name: None,
            kind: kind.to_string(),
            description: description.to_string(),
            required: None,
            value: None,
        }
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    fn into_value(self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// An entity specification as stored in `api_specs/<type>.json`.
///
/// Attributes stay a JSON map so hand-written keys (`properties`, `enum`,
/// Japanese labels) survive a load and save. Unknown top-level keys are kept
/// in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitySpec {
    pub data_model_name: String,
    pub entity_type: String,
    pub fiware_service: String,
    pub fiware_service_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id_pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_source: Option<String>,
    #[serde(default)]
    pub attributes: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EntitySpec {
    pub fn new(entity_type: &str, data_model_name: &str) -> Self {
        Self {
            data_model_name: data_model_name.to_string(),
            entity_type: entity_type.to_string(),
            fiware_service: FIWARE_SERVICE.to_string(),
            fiware_service_path: format!("/{}", entity_type),
            entity_id_pattern: None,
            description: None,
            last_updated: None,
            pdf_source: None,
            attributes: Map::new(),
            extra: Map::new(),
        }
    }

    /// Insert or replace an attribute. A replaced key keeps its position.
    pub fn set_attribute(&mut self, key: &str, attr: AttributeSpec) {
        self.attributes.insert(key.to_string(), attr.into_value());
    }

    pub fn has_attribute(&self, key: &str) -> bool {
        self.attributes.contains_key(key)
    }

    /// Typed view of one attribute, if it parses as an [`AttributeSpec`].
    pub fn attribute(&self, key: &str) -> Option<AttributeSpec> {
        self.attributes
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_spec_serializes_camel_case_in_order() {
        let mut spec = EntitySpec::new("Aed", "AED設置場所");
        spec.set_attribute("id", AttributeSpec::new("Text", "識別子"));
        spec.set_attribute("type", AttributeSpec::new("Text", "タイプ").with_value("Aed"));

        let value = serde_json::to_value(&spec).unwrap();
        assert_eq!(value["fiwareServicePath"], "/Aed");
        assert_eq!(value["fiwareService"], FIWARE_SERVICE);
        assert!(value.get("pdfSource").is_none());
        let keys: Vec<&String> = value["attributes"].as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["id", "type"]);
        assert!(value["attributes"]["id"].get("required").is_none());
    }

    #[test]
    fn test_spec_keeps_unknown_fields() {
        let raw = json!({
            "dataModelName": "避難所開設状況",
            "entityType": "EvacuationShelter",
            "fiwareService": "smartcity_yaizu",
            "fiwareServicePath": "/EvacuationShelter",
            "attributes": {"Name": {"type": "Text", "description": "名称", "properties": {"a": 1}}},
            "example_request": {"url": "x"}
        });
        let spec: EntitySpec = serde_json::from_value(raw.clone()).unwrap();
        assert!(spec.extra.contains_key("example_request"));
        assert_eq!(spec.attribute("Name").unwrap().kind, "Text");
        assert_eq!(serde_json::to_value(&spec).unwrap(), raw);
    }
}
