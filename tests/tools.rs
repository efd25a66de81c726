//! Tool dispatcher over a populated store.

use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use yaizu_catalog::config::{Credentials, Settings};
use yaizu_catalog::specs::known_spec;
use yaizu_catalog::storage::LocalStore;
use yaizu_catalog::tools::{ToolDispatcher, RESOURCE_DISASTER_APIS, RESOURCE_STATUS};

fn populated() -> (TempDir, Settings, LocalStore) {
    let dir = TempDir::new().unwrap();
    let settings = Settings::with_data_dir(dir.path().to_path_buf());
    let store = LocalStore::open(&settings.specs_dir).unwrap();

    store
        .save_document(
            "api_catalog",
            &json!({
                "title": "焼津市APIカタログ",
                "apis": [
                    {"name": "避難所API", "description": "指定避難所", "category": "service", "endpoints": ["/v2/entities"]},
                    {"name": "観光API", "description": "観光施設", "category": "service", "endpoints": []}
                ],
                "categories": ["service"],
                "last_updated": "2026-10-14T09:00:00.000000"
            }),
            "https://city-api-catalog.smartcity-pf.com/yaizu",
        )
        .unwrap();
    store
        .save_as(
            "disaster_apis",
            &json!({
                "title": "焼津市防災関連API",
                "apis": [{"name": "避難所API", "description": "指定避難所", "category": "service", "endpoints": ["/v2/entities"], "is_disaster_related": true}],
                "last_updated": "2026-10-14T09:00:00.000000"
            }),
        )
        .unwrap();
    if let Some(spec) = known_spec("EvacuationShelter") {
        store.save_as("EvacuationShelter", &spec).unwrap();
    }
    (dir, settings, store)
}

#[test]
fn test_list_search_and_details() {
    let (_dir, settings, store) = populated();
    let creds = Credentials::default();
    let tools = ToolDispatcher::new(&store, &settings, &creds);

    let listing = tools.list_saved_documents();
    assert!(listing.contains("**3** documents available"));
    assert!(listing.contains("## api_catalog"));

    // Both catalog files carry the shelter entry.
    let hits = tools.search_documents("避難");
    assert!(hits.contains("**2** APIs found"));
    assert!(hits.contains("- **Source file**: api_catalog.json"));
    assert!(hits.contains("- **Source file**: disaster_apis.json"));

    let catalog = tools.get_document_details("api_catalog");
    assert!(catalog.contains("### Included APIs (2)"));
    assert!(catalog.contains("https://city-api-catalog.smartcity-pf.com/yaizu"));

    let entity = tools.get_document_details("EvacuationShelter");
    assert!(entity.contains("**Service path**: /EvacuationShelter"));
    assert!(entity.contains("**Entity type**: EvacuationShelter"));
}

#[test]
fn test_resources() {
    let (_dir, settings, store) = populated();
    let creds = Credentials::default();
    let tools = ToolDispatcher::new(&store, &settings, &creds);

    let disaster = tools.resource(RESOURCE_DISASTER_APIS);
    assert!(disaster.contains("## Disaster-related APIs (1)"));
    assert!(disaster.contains("### 1. 避難所API"));

    let status = tools.resource(RESOURCE_STATUS);
    assert!(status.contains("EvacuationShelter"));
}

#[test]
fn test_generate_command_for_saved_spec() {
    let (_dir, settings, store) = populated();
    let creds = Credentials::default();
    let tools = ToolDispatcher::new(&store, &settings, &creds);

    let out = tools.generate_api_command("EvacuationShelter");
    assert!(out.starts_with("# EvacuationShelter API commands"));
    assert!(out.contains("yaizu query EvacuationShelter --limit 10"));
}

#[tokio::test]
async fn test_typed_query_renders_items() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/entities"))
        .and(query_param("type", "EvacuationShelter"))
        .and(header("apikey", "test-key"))
        .and(header("Fiware-ServicePath", "/EvacuationShelter"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "shelter-1", "type": "EvacuationShelter", "name": "焼津小学校"},
            {"id": "shelter-2", "type": "EvacuationShelter", "name": "焼津中学校"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let (_dir, mut settings, store) = populated();
    settings.ngsi_endpoint = format!("{}/v2/entities", server.uri());
    let creds = Credentials::new(None, None, Some("test-key".to_string()));
    let tools = ToolDispatcher::new(&store, &settings, &creds);

    let out = tools
        .execute_typed_query("EvacuationShelter", None, 10)
        .await;
    assert!(out.contains("**Status**: 200"));
    assert!(out.contains("**Items**: 2"));
    assert!(out.contains("shelter-1"));
}

#[tokio::test]
async fn test_typed_query_rejects_bad_params() {
    let (_dir, settings, store) = populated();
    let creds = Credentials::new(None, None, Some("test-key".to_string()));
    let tools = ToolDispatcher::new(&store, &settings, &creds);
    let out = tools.execute_typed_query("Aed", Some("[1]"), 10).await;
    assert_eq!(out, "Error: params must be a JSON object.");
}
