//! Markdown rendering of store documents and query results.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::catalog::ScrapeSummary;
use crate::extract::truncate_chars;
use crate::ngsi::NgsiResponse;
use crate::storage::SearchHit;

const RESPONSE_EXAMPLE_CHARS: usize = 2000;
const QUERY_JSON_CHARS: usize = 4000;
const QUERY_TEXT_CHARS: usize = 2000;
const QUERY_ERROR_CHARS: usize = 1000;

fn str_or<'a>(value: &'a Value, key: &str, default: &'a str) -> &'a str {
    value.get(key).and_then(Value::as_str).unwrap_or(default)
}

fn array_len(value: &Value, key: &str) -> usize {
    value.get(key).and_then(Value::as_array).map_or(0, Vec::len)
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}

fn non_empty_array<'a>(value: &'a Value, key: &str) -> Option<&'a Vec<Value>> {
    value
        .get(key)
        .and_then(Value::as_array)
        .filter(|items| !items.is_empty())
}

fn strings<'a>(items: &'a [Value]) -> impl Iterator<Item = String> + 'a {
    items.iter().map(|v| match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    })
}

pub fn scrape_summary(summary: &ScrapeSummary) -> String {
    if !summary.success {
        return "Scrape failed. Check the portal credentials.".to_string();
    }
    let mut out = String::from("# Scrape complete\n\n## Summary\n");
    out.push_str(&format!("- **Total APIs**: {}\n", summary.total_apis));
    out.push_str(&format!("- **Disaster-related APIs**: {}\n", summary.disaster_apis));
    out.push_str(&format!("- **Files saved**: {}\n", summary.saved_files.len()));
    out.push_str("\n## Saved files\n");
    for file in &summary.saved_files {
        out.push_str(&format!("- {}\n", file));
    }
    out.push_str("\nAPI documents updated.");
    out
}

/// One section per saved document. `docs` pairs each name with its loaded
/// content, `None` when it could not be read.
pub fn document_list(docs: &[(String, Option<Value>)]) -> String {
    if docs.is_empty() {
        return "No saved API documents. Run `scrape` first.".to_string();
    }
    let mut out = String::from("# Saved API documents\n\n");
    out.push_str(&format!("**{}** documents available:\n\n", docs.len()));
    for (name, doc) in docs {
        match doc {
            Some(doc) => {
                out.push_str(&format!("## {}\n", name));
                out.push_str(&format!("- **Title**: {}\n", str_or(doc, "title", name)));
                out.push_str(&format!("- **APIs**: {}\n", array_len(doc, "apis")));
                out.push_str(&format!(
                    "- **Last updated**: {}\n\n",
                    str_or(doc, "last_updated", "unknown")
                ));
            }
            None => {
                out.push_str(&format!("- {}.json\n", name));
            }
        }
    }
    out
}

pub fn search_results(keyword: &str, hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return format!("No APIs matched \"{}\".", keyword);
    }
    let mut out = format!("# Search results: \"{}\"\n\n", keyword);
    out.push_str(&format!("**{}** APIs found:\n\n", hits.len()));
    for (i, hit) in hits.iter().enumerate() {
        let api = &hit.api;
        out.push_str(&format!("## {}. {}\n", i + 1, str_or(api, "name", "Unnamed")));
        out.push_str(&format!(
            "- **Description**: {}\n",
            str_or(api, "description", "No description")
        ));
        out.push_str(&format!("- **Category**: {}\n", str_or(api, "category", "Uncategorized")));
        let disaster = api
            .get("is_disaster_related")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        out.push_str(&format!(
            "- **Disaster-related**: {}\n",
            if disaster { "yes" } else { "no" }
        ));
        out.push_str(&format!("- **Source file**: {}.json\n", hit.source_file));
        if let Some(endpoints) = non_empty_array(api, "endpoints") {
            let first: Vec<String> = strings(&endpoints[..endpoints.len().min(3)]).collect();
            out.push_str(&format!("- **Endpoints**: {}\n", first.join(", ")));
        }
        out.push('\n');
    }
    out
}

fn entity_details(doc: &Value, data_model_name: &str) -> String {
    let mut out = String::from("# API details\n\n");
    out.push_str(&format!("## {}\n\n", data_model_name));
    out.push_str(&format!("**FIWARE service**: {}\n", str_or(doc, "fiwareService", "")));
    out.push_str(&format!("**Service path**: {}\n", str_or(doc, "fiwareServicePath", "")));
    out.push_str(&format!("**Entity type**: {}\n", str_or(doc, "entityType", "")));
    out.push_str(&format!(
        "**Entity id pattern**: {}\n\n",
        str_or(doc, "entityIdPattern", "")
    ));

    if let Some(attributes) = doc.get("attributes").and_then(Value::as_object) {
        out.push_str(&format!("### Attributes ({})\n", attributes.len()));
        for (key, attr) in attributes {
            out.push_str(&format!(
                "- **{}** ({}): {} - {}\n",
                key,
                str_or(attr, "name", ""),
                str_or(attr, "description", ""),
                str_or(attr, "type", "")
            ));
        }
        out.push('\n');
    }

    if let Some(request) = doc.get("example_request") {
        out.push_str(&format!("### Example request\n```json\n{}\n```\n\n", pretty(request)));
    }
    if let Some(response) = doc.get("example_response") {
        out.push_str(&format!(
            "### Example response\n```json\n{}\n```\n\n",
            truncate_chars(&pretty(response), RESPONSE_EXAMPLE_CHARS)
        ));
    }
    out
}

fn catalog_details(doc: &Value) -> String {
    let mut out = String::from("# API details\n\n");
    if let Some(title) = doc.get("title").or_else(|| doc.get("name")).and_then(Value::as_str) {
        out.push_str(&format!("## {}\n\n", title));
    }
    if let Some(description) = doc.get("description").and_then(Value::as_str) {
        out.push_str(&format!("**Description**: {}\n\n", description));
    }
    if let Some(category) = doc.get("category").and_then(Value::as_str) {
        out.push_str(&format!("**Category**: {}\n\n", category));
    }

    if let Some(endpoints) = non_empty_array(doc, "endpoints") {
        out.push_str("### Endpoints\n");
        for endpoint in strings(endpoints) {
            out.push_str(&format!("- `{}`\n", endpoint));
        }
        out.push('\n');
    }
    if let Some(models) = non_empty_array(doc, "data_models") {
        out.push_str(&format!(
            "### Data models\n```json\n{}\n```\n\n",
            pretty(&Value::Array(models.clone()))
        ));
    }
    if let Some(params) = non_empty_array(doc, "parameters") {
        out.push_str("### Parameters\n");
        for param in params.iter().filter(|p| p.is_object()) {
            out.push_str(&format!(
                "- **{}**: {}\n",
                str_or(param, "name", "unknown"),
                str_or(param, "description", "")
            ));
        }
        out.push('\n');
    }
    if let Some(apis) = doc.get("apis").and_then(Value::as_array) {
        out.push_str(&format!("### Included APIs ({})\n", apis.len()));
        for api in apis.iter().take(10) {
            out.push_str(&format!(
                "- {}: {}...\n",
                str_or(api, "name", "Unnamed"),
                truncate_chars(str_or(api, "description", ""), 50)
            ));
        }
        out.push('\n');
    }
    if let Some(metadata) = doc.get("metadata") {
        out.push_str("### Metadata\n");
        out.push_str(&format!("- **Scraped at**: {}\n", str_or(metadata, "scraped_at", "unknown")));
        out.push_str(&format!("- **Source URL**: {}\n", str_or(metadata, "source_url", "unknown")));
        out.push_str(&format!("- **Version**: {}\n", str_or(metadata, "version", "unknown")));
    }
    out
}

/// Entity specs render their FIWARE fields; anything else renders as a
/// catalog document or entry.
pub fn document_details(doc: &Value) -> String {
    match doc.get("dataModelName").and_then(Value::as_str) {
        Some(name) => entity_details(doc, name),
        None => catalog_details(doc),
    }
}

fn item_summary(item: &Value) -> (String, String, String) {
    let name = item
        .pointer("/Name/value")
        .and_then(Value::as_str)
        .unwrap_or("Unnamed")
        .to_string();
    let address = match item.pointer("/EquipmentAddress/value/FullAddress") {
        Some(Value::String(s)) => s.clone(),
        Some(full) => full
            .get("value")
            .and_then(Value::as_str)
            .unwrap_or("No address")
            .to_string(),
        None => "No address".to_string(),
    };
    let position = match item.pointer("/InstallationPosition/value") {
        Some(Value::String(s)) => format!(" ({})", s),
        Some(other) => format!(" ({})", other),
        None => String::new(),
    };
    (name, address, position)
}

pub fn query_result(entity_type: &str, response: &NgsiResponse) -> String {
    let mut out = String::from("# Yaizu API result\n\n");
    out.push_str(&format!("**Entity type**: `{}`\n", entity_type));
    out.push_str(&format!("**Endpoint**: `{}`\n", response.endpoint));
    out.push_str(&format!("**Service path**: `{}`\n", response.service_path));
    out.push_str(&format!("**Status**: {}\n", response.status));
    out.push_str(&format!(
        "**Rate limit remaining**: {}\n\n",
        response.rate_limit_remaining.as_deref().unwrap_or("N/A")
    ));

    let query: serde_json::Map<String, Value> = response
        .query
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect();
    out.push_str(&format!(
        "**Query parameters**:\n```json\n{}\n```\n\n",
        pretty(&Value::Object(query))
    ));

    match response.status {
        200 => {
            out.push_str("**Success**\n\n");
            match response.json() {
                Some(data) => {
                    let count = data.as_array().map_or(1, Vec::len);
                    out.push_str(&format!("**Items**: {}\n\n", count));
                    if let Some(items) = data.as_array().filter(|items| !items.is_empty()) {
                        out.push_str("**Summary**:\n");
                        for (i, item) in items.iter().take(3).enumerate() {
                            let (name, address, position) = item_summary(item);
                            out.push_str(&format!(
                                "- **{}. {}**: {}{}\n",
                                i + 1,
                                name,
                                address,
                                position
                            ));
                            out.push_str(&format!("  - ID: `{}`\n", str_or(item, "id", "N/A")));
                        }
                        if items.len() > 3 {
                            out.push_str(&format!("- ... and {} more\n", items.len() - 3));
                        }
                    }
                    let full = pretty(&data);
                    out.push_str("\n**Full response**:\n```json\n");
                    out.push_str(&truncate_chars(&full, QUERY_JSON_CHARS));
                    if full.chars().count() > QUERY_JSON_CHARS {
                        out.push_str("\n... (truncated)");
                    }
                    out.push_str("\n```");
                }
                None => {
                    out.push_str(&format!(
                        "**Response**:\n```\n{}\n```",
                        truncate_chars(&response.body, QUERY_TEXT_CHARS)
                    ));
                }
            }
        }
        401 => {
            out.push_str(&format!(
                "**Authentication error**: the API key is invalid or lacks permission.\nDetails: {}",
                response.body
            ));
        }
        403 => {
            out.push_str(&format!(
                "**Access denied**: check the API key permissions and the FIWARE service settings.\nDetails: {}",
                response.body
            ));
        }
        404 => {
            out.push_str(&format!(
                "**Not found**: the entity type or endpoint does not exist.\nDetails: {}",
                response.body
            ));
        }
        429 => {
            out.push_str(&format!(
                "**Rate limit exceeded**: wait before retrying.\nDetails: {}",
                response.body
            ));
        }
        status => {
            out.push_str(&format!(
                "**Error**: {}\nDetails: {}",
                status,
                truncate_chars(&response.body, QUERY_ERROR_CHARS)
            ));
        }
    }
    out
}

const NGSI_PARAMETERS: &[(&str, &str)] = &[
    ("type", "entity type"),
    ("id", "filter by entity id"),
    ("q", "attribute value conditions"),
    ("georel", "geographic relation (near, coveredBy, intersects, ...)"),
    ("geometry", "geographic shape (point, polygon, ...)"),
    ("coords", "coordinates"),
    ("limit", "result count (1-1000)"),
    ("offset", "result offset"),
    ("attrs", "restrict returned attributes"),
    ("orderBy", "sort order"),
    ("options", "extra options (count, keyValues, ...)"),
];

/// Usage examples for querying `entity_type`, derived from its stored spec.
pub fn api_commands(entity_type: &str, spec: &Value) -> String {
    let mut out = format!("# {} API commands\n\n## Basics\n", entity_type);
    out.push_str(&format!("- **Data model**: {}\n", str_or(spec, "dataModelName", "N/A")));
    out.push_str(&format!(
        "- **Fiware-Service**: `{}`\n",
        str_or(spec, "fiwareService", "smartcity_yaizu")
    ));
    out.push_str(&format!(
        "- **Fiware-ServicePath**: `{}`\n\n",
        str_or(spec, "fiwareServicePath", "/")
    ));

    out.push_str(&format!("## Basic query\n```\nyaizu query {} --limit 10\n```\n\n", entity_type));
    out.push_str("## Queries with parameters\n```\n");
    out.push_str(&format!("# Result count\nyaizu query {} --limit 50\n\n", entity_type));

    let attributes = spec.get("attributes").and_then(Value::as_object);
    if let Some(attributes) = attributes {
        let has_location = attributes.values().any(|attr| {
            let text = attr.to_string();
            text.contains("Latitude") || text.contains("Longitude")
        });
        if has_location {
            out.push_str(&format!(
                "# Within 1 km of Yaizu station\nyaizu query {} --params '{{\"georel\":\"near;maxDistance:1000\",\"geometry\":\"point\",\"coords\":\"34.8675,138.3236\"}}' --limit 20\n\n",
                entity_type
            ));
        }
        out.push_str(&format!(
            "# By id\nyaizu query {} --params '{{\"id\":\"jp.smartcity-yaizu.{}.001\"}}' --limit 1\n\n",
            entity_type, entity_type
        ));
        if let Some((first, _)) = attributes
            .iter()
            .find(|(_, attr)| attr.get("type").and_then(Value::as_str) == Some("Text"))
        {
            out.push_str(&format!(
                "# Attribute filter ({} contains 焼津)\nyaizu query {} --params '{{\"q\":\"{}~=.*焼津.*\"}}' --limit 30\n\n",
                first, entity_type, first
            ));
        }
        out.push_str(&format!(
            "# Combined options\nyaizu query {} --params '{{\"limit\":\"100\",\"options\":\"count\",\"orderBy\":\"Identification\"}}' --limit 100\n\n",
            entity_type
        ));
    }
    out.push_str("```\n\n## Main attributes\n");

    if let Some(attributes) = attributes {
        for (key, attr) in attributes.iter().take(10) {
            out.push_str(&format!(
                "- **{}** ({}): {} [{}]\n",
                key,
                str_or(attr, "name", ""),
                str_or(attr, "description", ""),
                str_or(attr, "type", "")
            ));
        }
        if attributes.len() > 10 {
            out.push_str(&format!("- ... {} more attributes\n", attributes.len() - 10));
        }
    }

    out.push_str("\n## NGSIv2 query parameters\n");
    for (name, meaning) in NGSI_PARAMETERS {
        out.push_str(&format!("- **{}**: {}\n", name, meaning));
    }
    out
}

/// `yaizu://api-docs`: catalog entries grouped by category, five each.
pub fn catalog_resource(catalog: Option<&Value>) -> String {
    let Some(catalog) = catalog else {
        return "API catalog not found. Run `scrape` to fetch it.".to_string();
    };
    let mut out = String::from("# Yaizu API catalog\n\n");
    out.push_str(&format!(
        "**Last updated**: {}\n\n",
        str_or(catalog, "last_updated", "unknown")
    ));

    if let Some(apis) = catalog.get("apis").and_then(Value::as_array) {
        out.push_str(&format!("## Available APIs ({})\n\n", apis.len()));
        let mut by_category: BTreeMap<&str, Vec<&Value>> = BTreeMap::new();
        for api in apis {
            by_category
                .entry(str_or(api, "category", "Uncategorized"))
                .or_default()
                .push(api);
        }
        for (category, apis) in by_category {
            out.push_str(&format!("### {} ({})\n", category, apis.len()));
            for api in apis.iter().take(5) {
                out.push_str(&format!(
                    "- **{}**: {}...\n",
                    str_or(api, "name", "Unnamed"),
                    truncate_chars(str_or(api, "description", ""), 50)
                ));
            }
            if apis.len() > 5 {
                out.push_str(&format!("- ... {} more\n", apis.len() - 5));
            }
            out.push('\n');
        }
    }
    out
}

/// `yaizu://disaster-apis`.
pub fn disaster_resource(doc: Option<&Value>) -> String {
    let Some(doc) = doc else {
        return "Disaster API document not found. Run `scrape` to fetch it.".to_string();
    };
    let mut out = String::from("# Yaizu disaster-related APIs\n\n");
    out.push_str(&format!("**Last updated**: {}\n\n", str_or(doc, "last_updated", "unknown")));

    let apis = doc.get("apis").and_then(Value::as_array).cloned().unwrap_or_default();
    out.push_str(&format!("## Disaster-related APIs ({})\n\n", apis.len()));
    for (i, api) in apis.iter().enumerate() {
        out.push_str(&format!("### {}. {}\n", i + 1, str_or(api, "name", "Unnamed")));
        out.push_str(&format!(
            "- **Description**: {}\n",
            str_or(api, "description", "No description")
        ));
        out.push_str(&format!("- **Category**: {}\n", str_or(api, "category", "Uncategorized")));
        if let Some(endpoints) = non_empty_array(api, "endpoints") {
            out.push_str("- **Main endpoints**:\n");
            for endpoint in strings(&endpoints[..endpoints.len().min(3)]) {
                out.push_str(&format!("  - `{}`\n", endpoint));
            }
        }
        if let Some(models) = non_empty_array(api, "data_models") {
            out.push_str(&format!("- **Data models**: {}\n", models.len()));
        }
        if let Some(params) = non_empty_array(api, "parameters") {
            out.push_str(&format!("- **Parameters**: {}\n", params.len()));
        }
        out.push('\n');
    }
    out
}

/// `yaizu://status`.
pub fn status_resource(
    files: &[String],
    catalog: Option<&Value>,
    disaster: Option<&Value>,
) -> String {
    let mut out = String::from("# Yaizu catalog status\n\n## Data\n");
    out.push_str(&format!("- **Saved documents**: {}\n\n", files.len()));
    out.push_str("### Files\n");
    for file in files.iter().take(10) {
        out.push_str(&format!("- {}.json\n", file));
    }

    if let Some(catalog) = catalog {
        let apis = catalog.get("apis").and_then(Value::as_array).cloned().unwrap_or_default();
        let mut categories: Vec<&str> = apis
            .iter()
            .map(|a| str_or(a, "category", "Uncategorized"))
            .collect();
        categories.sort_unstable();
        categories.dedup();
        out.push_str("\n## API catalog\n");
        out.push_str(&format!(
            "- **Last updated**: {}\n",
            str_or(catalog, "last_updated", "unknown")
        ));
        out.push_str(&format!("- **Total APIs**: {}\n", apis.len()));
        out.push_str(&format!("- **Categories**: {}\n", categories.len()));
    }
    if let Some(disaster) = disaster {
        out.push_str("\n## Disaster APIs\n");
        out.push_str(&format!("- **Disaster-related APIs**: {}\n", array_len(disaster, "apis")));
        out.push_str(&format!(
            "- **Last updated**: {}\n",
            str_or(disaster, "last_updated", "unknown")
        ));
    }

    out.push_str(
        "\n## Usage\n1. `scrape` - fetch the latest catalog\n2. `list` - list saved documents\n3. `search` - search APIs by keyword\n4. `show` - show one document\n",
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(status: u16, body: &str) -> NgsiResponse {
        NgsiResponse {
            status,
            body: body.to_string(),
            rate_limit_remaining: Some("59".into()),
            query: vec![("type".into(), "Aed".into()), ("limit".into(), "10".into())],
            service_path: "/Aed".into(),
            endpoint: "https://api.smartcity-yaizu.jp/v2/entities".into(),
        }
    }

    #[test]
    fn test_scrape_summary_layout() {
        let summary = ScrapeSummary {
            success: true,
            total_apis: 2,
            disaster_apis: 1,
            saved_files: vec!["api_catalog.json".into(), "disaster_apis.json".into()],
        };
        assert_eq!(
            scrape_summary(&summary),
            "# Scrape complete\n\n## Summary\n\
             - **Total APIs**: 2\n\
             - **Disaster-related APIs**: 1\n\
             - **Files saved**: 2\n\
             \n## Saved files\n\
             - api_catalog.json\n\
             - disaster_apis.json\n\
             \nAPI documents updated."
        );
    }

    #[test]
    fn test_query_result_summarizes_items() {
        let body = json!([
            {"id": "a1", "Name": {"value": "市役所"},
             "EquipmentAddress": {"value": {"FullAddress": {"value": "焼津市本町"}}},
             "InstallationPosition": {"value": "1階"}},
            {"id": "a2", "EquipmentAddress": {"value": {"FullAddress": "焼津市栄町"}}},
            {"id": "a3"},
            {"id": "a4"}
        ])
        .to_string();
        let out = query_result("Aed", &response(200, &body));
        assert!(out.contains("**Items**: 4"));
        assert!(out.contains("- **1. 市役所**: 焼津市本町 (1階)"));
        assert!(out.contains("- **2. Unnamed**: 焼津市栄町"));
        assert!(out.contains("ID: `a3`"));
        assert!(!out.contains("ID: `a4`"));
        assert!(out.contains("... and 1 more"));
        assert!(out.contains("**Rate limit remaining**: 59"));
    }

    #[test]
    fn test_query_result_truncates_large_json() {
        let items: Vec<Value> = (0..200).map(|i| json!({"id": format!("urn:{}", i)})).collect();
        let out = query_result("Aed", &response(200, &Value::Array(items).to_string()));
        assert!(out.contains("... (truncated)"));
    }

    #[test]
    fn test_query_result_status_messages() {
        assert!(query_result("Aed", &response(401, "no")).contains("Authentication error"));
        assert!(query_result("Aed", &response(429, "slow")).contains("Rate limit exceeded"));
        let long = "x".repeat(1500);
        let out = query_result("Aed", &response(500, &long));
        assert!(out.contains("**Error**: 500"));
        assert!(!out.contains(&"x".repeat(1001)));
    }

    #[test]
    fn test_document_details_entity_spec() {
        let doc = json!({
            "dataModelName": "AED設置場所",
            "entityType": "Aed",
            "fiwareService": "smartcity_yaizu",
            "fiwareServicePath": "/Aed",
            "attributes": {"id": {"name": "ID", "description": "識別子", "type": "Text"}},
            "example_response": {"body": "y".repeat(3000)}
        });
        let out = document_details(&doc);
        assert!(out.contains("## AED設置場所"));
        assert!(out.contains("### Attributes (1)"));
        assert!(out.contains("- **id** (ID): 識別子 - Text"));
        assert!(!out.contains(&"y".repeat(2000)));
    }

    #[test]
    fn test_document_details_catalog() {
        let doc = json!({
            "title": "焼津市APIカタログ",
            "apis": [{"name": "AED", "description": "設置場所"}],
            "metadata": {"scraped_at": "t", "source_url": "u", "version": "1.0"}
        });
        let out = document_details(&doc);
        assert!(out.contains("## 焼津市APIカタログ"));
        assert!(out.contains("### Included APIs (1)"));
        assert!(out.contains("- **Version**: 1.0"));
    }

    #[test]
    fn test_api_commands_uses_attributes() {
        let spec = json!({
            "dataModelName": "AED設置場所",
            "fiwareServicePath": "/Aed",
            "attributes": {
                "id": {"type": "Number"},
                "Name": {"type": "Text", "description": "名称"},
                "Position": {"type": "StructuredValue", "value": {"Latitude": 1}}
            }
        });
        let out = api_commands("Aed", &spec);
        assert!(out.contains("maxDistance:1000"));
        assert!(out.contains("Name~=.*焼津.*"));
        assert!(out.contains("- **orderBy**: sort order"));

        let bare = api_commands("Aed", &json!({"attributes": {"id": {"type": "Text"}}}));
        assert!(!bare.contains("maxDistance"));
    }

    #[test]
    fn test_catalog_resource_groups_by_category() {
        let apis: Vec<Value> = (0..7)
            .map(|i| json!({"name": format!("r{}", i), "category": "route"}))
            .chain(std::iter::once(json!({"name": "s", "category": "service"})))
            .collect();
        let out = catalog_resource(Some(&json!({"apis": apis})));
        assert!(out.contains("### route (7)"));
        assert!(out.contains("... 2 more"));
        assert!(out.find("### route").unwrap() < out.find("### service").unwrap());
        assert!(catalog_resource(None).contains("not found"));
    }

    #[test]
    fn test_document_list_unloadable() {
        let out = document_list(&[
            ("api_catalog".into(), Some(json!({"title": "t", "apis": [1, 2]}))),
            ("broken".into(), None),
        ]);
        assert!(out.contains("- **APIs**: 2"));
        assert!(out.contains("- broken.json"));
    }
}
