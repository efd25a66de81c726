//! OpenAPI document summaries.

use std::path::Path;

use serde::Serialize;
use serde_json::Value;
use serde_yaml::Value as Yaml;

use super::SpecError;

/// Used when a document declares no `servers`.
pub const DEFAULT_SERVER_URL: &str = "https://api.smartcity-yaizu.jp";

const METHODS: &[&str] = &["get", "post", "put", "delete"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub required: bool,
    pub example: Option<Value>,
    #[serde(rename = "enum")]
    pub allowed: Option<Value>,
    pub format: Option<String>,
}

/// Parameters of one operation, split by location.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParameterSet {
    pub query: Vec<ParameterInfo>,
    pub header: Vec<ParameterInfo>,
    pub path: Vec<ParameterInfo>,
    pub required_params: Vec<String>,
    pub optional_params: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndpointSpec {
    /// `"{METHOD} {path}"`
    pub id: String,
    pub method: String,
    pub path: String,
    pub summary: String,
    pub description: String,
    #[serde(rename = "operationId")]
    pub operation_id: String,
    pub parameters: ParameterSet,
    pub responses: Value,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenApiSummary {
    pub openapi_version: String,
    pub title: String,
    pub base_url: String,
    pub endpoints: Vec<EndpointSpec>,
}

fn yaml_str(value: &Yaml, key: &str) -> Option<String> {
    value.get(key).and_then(Yaml::as_str).map(str::to_string)
}

/// Convert a YAML subtree to JSON. Non-string mapping keys become strings.
fn to_json(value: &Yaml) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

fn parse_parameter(param: &Yaml) -> (String, ParameterInfo) {
    let schema = param.get("schema");
    let schema_field = |key: &str| {
        schema
            .and_then(|s| s.get(key))
            .filter(|v| !v.is_null())
            .map(to_json)
    };

    let info = ParameterInfo {
        name: yaml_str(param, "name").unwrap_or_default(),
        kind: schema
            .and_then(|s| yaml_str(s, "type"))
            .unwrap_or_else(|| "string".to_string()),
        description: yaml_str(param, "description").unwrap_or_default(),
        required: param.get("required").and_then(Yaml::as_bool).unwrap_or(false),
        example: schema_field("example"),
        allowed: schema_field("enum"),
        format: schema.and_then(|s| yaml_str(s, "format")),
    };
    let location = yaml_str(param, "in").unwrap_or_else(|| "query".to_string());
    (location, info)
}

fn parse_parameters(params: Option<&Yaml>) -> ParameterSet {
    let mut set = ParameterSet::default();
    let Some(params) = params.and_then(Yaml::as_sequence) else {
        return set;
    };

    for param in params {
        let (location, info) = parse_parameter(param);
        if info.required {
            set.required_params.push(info.name.clone());
        } else {
            set.optional_params.push(info.name.clone());
        }
        match location.as_str() {
            "query" => set.query.push(info),
            "header" => set.header.push(info),
            "path" => set.path.push(info),
            // cookie and unknown locations are only listed by name
            _ => {}
        }
    }
    set
}

/// Summarize an OpenAPI document.
pub fn parse_openapi(yaml: &str) -> Result<OpenApiSummary, SpecError> {
    let doc: Yaml = serde_yaml::from_str(yaml)?;

    let mut endpoints = Vec::new();
    if let Some(paths) = doc.get("paths").and_then(Yaml::as_mapping) {
        for (path, operations) in paths {
            let Some(path) = path.as_str() else { continue };
            let Some(operations) = operations.as_mapping() else {
                continue;
            };
            for (method, details) in operations {
                let Some(method) = method.as_str().map(str::to_lowercase) else {
                    continue;
                };
                if !METHODS.contains(&method.as_str()) {
                    continue;
                }
                let method = method.to_uppercase();
                endpoints.push(EndpointSpec {
                    id: format!("{} {}", method, path),
                    method,
                    path: path.to_string(),
                    summary: yaml_str(details, "summary").unwrap_or_default(),
                    description: yaml_str(details, "description").unwrap_or_default(),
                    operation_id: yaml_str(details, "operationId").unwrap_or_default(),
                    parameters: parse_parameters(details.get("parameters")),
                    responses: details
                        .get("responses")
                        .map(to_json)
                        .unwrap_or_else(|| Value::Object(Default::default())),
                    tags: details
                        .get("tags")
                        .and_then(Yaml::as_sequence)
                        .map(|tags| {
                            tags.iter()
                                .filter_map(Yaml::as_str)
                                .map(str::to_string)
                                .collect()
                        })
                        .unwrap_or_default(),
                });
            }
        }
    }

    let base_url = doc
        .get("servers")
        .and_then(Yaml::as_sequence)
        .and_then(|servers| servers.first())
        .and_then(|server| yaml_str(server, "url"))
        .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());

    Ok(OpenApiSummary {
        openapi_version: yaml_str(&doc, "openapi").unwrap_or_else(|| "3.0.3".to_string()),
        title: doc
            .get("info")
            .and_then(|info| yaml_str(info, "title"))
            .unwrap_or_default(),
        base_url,
        endpoints,
    })
}

pub fn parse_openapi_file(path: &Path) -> Result<OpenApiSummary, SpecError> {
    let yaml = std::fs::read_to_string(path)?;
    parse_openapi(&yaml)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const DOC: &str = r#"
openapi: 3.0.0
info:
  title: 防災API
paths:
  /v2/entities:
    get:
      summary: エンティティ一覧
      operationId: listEntities
      tags: [entities]
      parameters:
        - name: type
          in: query
          required: true
          schema:
            type: string
            example: Aed
        - name: limit
          in: query
          schema:
            type: integer
            format: int32
        - name: Fiware-Service
          in: header
          required: true
          schema:
            enum: [smartcity_yaizu]
      responses:
        200:
          description: OK
    patch:
      summary: ignored
  /v2/entities/{id}:
    delete:
      parameters:
        - name: id
          in: path
          required: true
"#;

    #[test]
    fn test_parse_openapi_endpoints() {
        let summary = parse_openapi(DOC).unwrap();
        assert_eq!(summary.openapi_version, "3.0.0");
        assert_eq!(summary.title, "防災API");
        assert_eq!(summary.base_url, DEFAULT_SERVER_URL);

        let ids: Vec<&str> = summary.endpoints.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["GET /v2/entities", "DELETE /v2/entities/{id}"]);

        let get = &summary.endpoints[0];
        assert_eq!(get.operation_id, "listEntities");
        assert_eq!(get.tags, vec!["entities"]);
        assert_eq!(get.responses["200"]["description"], "OK");
        assert_eq!(get.parameters.query.len(), 2);
        assert_eq!(get.parameters.query[0].example, Some(json!("Aed")));
        assert_eq!(get.parameters.query[1].kind, "integer");
        assert_eq!(get.parameters.query[1].format.as_deref(), Some("int32"));
        assert_eq!(get.parameters.header[0].kind, "string");
        assert_eq!(get.parameters.header[0].allowed, Some(json!(["smartcity_yaizu"])));
        assert_eq!(get.parameters.required_params, vec!["type", "Fiware-Service"]);
        assert_eq!(get.parameters.optional_params, vec!["limit"]);

        let delete = &summary.endpoints[1];
        assert_eq!(delete.parameters.path[0].name, "id");
        assert_eq!(delete.parameters.path[0].kind, "string");
    }

    #[test]
    fn test_parse_openapi_servers_and_defaults() {
        let summary =
            parse_openapi("servers:\n  - url: https://example.jp\npaths: {}\n").unwrap();
        assert_eq!(summary.base_url, "https://example.jp");
        assert_eq!(summary.openapi_version, "3.0.3");
        assert!(summary.endpoints.is_empty());
    }

    #[test]
    fn test_parse_openapi_rejects_bad_yaml() {
        assert!(matches!(parse_openapi("a: [b"), Err(SpecError::Yaml(_))));
    }
}
