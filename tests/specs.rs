//! Entity spec generation through the store.

use std::time::Duration;

use tempfile::TempDir;

use yaizu_catalog::config::Settings;
use yaizu_catalog::scrapers::HttpClient;
use yaizu_catalog::services::harvest_openapi;
use yaizu_catalog::specs::generate::DATA_MODELS_INDEX_DOCUMENT;
use yaizu_catalog::specs::known::KNOWN_MODELS_DOCUMENT;
use yaizu_catalog::specs::{
    parse_openapi_file, write_known_specs, DataModelIndex, EntitySpec, KnownModelsIndex,
    KNOWN_MODELS,
};
use yaizu_catalog::storage::LocalStore;

const BOUSAI_YAML: &str = r#"
openapi: 3.0.3
info:
  title: 防災API
  description: |
    データモデル一覧
    * [避難所一覧](https://docs.example.jp/files/EvacuationShelter.pdf)
    * [AED設置場所](https://docs.example.jp/files/Aed.pdf)
    * [external](https://www.example.jp/files/Other.pdf)
servers:
  - url: https://api.example.jp
paths:
  /v2/entities:
    get:
      summary: エンティティ一覧
      parameters:
        - name: type
          in: query
          required: true
          schema:
            type: string
        - name: limit
          in: query
          schema:
            type: integer
            example: 10
      responses:
        200:
          description: OK
"#;

fn setup() -> (TempDir, Settings, LocalStore) {
    let dir = TempDir::new().unwrap();
    let settings = Settings::with_data_dir(dir.path().to_path_buf());
    settings.ensure_directories().unwrap();
    let store = LocalStore::open(&settings.specs_dir).unwrap();
    (dir, settings, store)
}

#[tokio::test]
async fn test_openapi_harvest_without_download() {
    let (_dir, settings, store) = setup();
    std::fs::write(
        settings.openapi_dir.join("bousai-orion-openapi.yaml"),
        BOUSAI_YAML,
    )
    .unwrap();
    std::fs::write(settings.openapi_dir.join("notes.txt"), BOUSAI_YAML).unwrap();

    let client = HttpClient::new(Duration::from_secs(5), Duration::ZERO).unwrap();
    let report = harvest_openapi(&settings, &client, &store, false, None)
        .await
        .unwrap();

    assert_eq!(report.files.len(), 1);
    assert_eq!(report.files[0].links, 2);
    assert_eq!(report.files[0].processed, 2);
    assert_eq!(report.downloads.total, 0);

    let shelter: EntitySpec = store.load_as("EvacuationShelter").unwrap();
    assert_eq!(shelter.data_model_name, "避難所一覧");
    assert_eq!(shelter.fiware_service_path, "/EvacuationShelter");
    assert_eq!(shelter.pdf_source.as_deref(), Some("EvacuationShelter.pdf"));
    assert!(shelter.has_attribute("capacity"));
    assert_eq!(shelter.extra["categories"], serde_json::json!(["disaster_management"]));
    assert_eq!(
        shelter.extra["queryExamples"][0]["headers"]["Fiware-ServicePath"],
        "/EvacuationShelter"
    );

    let aed: EntitySpec = store.load_as("Aed").unwrap();
    assert!(aed.has_attribute("manufacturer"));

    let index: DataModelIndex = store.load_as(DATA_MODELS_INDEX_DOCUMENT).unwrap();
    assert_eq!(index.total_models, 2);
    assert_eq!(index.yaml_sources, vec!["bousai-orion-openapi.yaml"]);
    assert_eq!(index.models[0].json_file, "EvacuationShelter.json");
    assert_eq!(index.models[1].source_yaml, "bousai-orion-openapi.yaml");
}

#[tokio::test]
async fn test_openapi_harvest_with_no_files_writes_empty_index() {
    let (_dir, settings, store) = setup();
    let client = HttpClient::new(Duration::from_secs(5), Duration::ZERO).unwrap();
    let report = harvest_openapi(&settings, &client, &store, true, None)
        .await
        .unwrap();
    assert!(report.files.is_empty());
    assert_eq!(report.index.total_models, 0);
    assert!(store.exists(DATA_MODELS_INDEX_DOCUMENT));
}

#[test]
fn test_known_specs_keep_existing_files() {
    let (_dir, _settings, store) = setup();
    let mut custom = EntitySpec::new("Aed", "手入力AED");
    custom.description = Some("hand edited".to_string());
    store.save_as("Aed", &custom).unwrap();

    let (index, written) = write_known_specs(&store).unwrap();
    assert_eq!(written.len(), KNOWN_MODELS.len() - 1);
    assert!(!written.iter().any(|t| t == "Aed"));

    let aed: EntitySpec = store.load_as("Aed").unwrap();
    assert_eq!(aed.description.as_deref(), Some("hand edited"));

    assert_eq!(index.data_models.len(), KNOWN_MODELS.len());
    let saved: KnownModelsIndex = store.load_as(KNOWN_MODELS_DOCUMENT).unwrap();
    assert_eq!(saved.data_models.len(), KNOWN_MODELS.len());

    // Second run writes nothing new.
    let (_, written) = write_known_specs(&store).unwrap();
    assert!(written.is_empty());
}

#[test]
fn test_openapi_summary_from_file() {
    let (dir, _settings, _store) = setup();
    let path = dir.path().join("bousai.yaml");
    std::fs::write(&path, BOUSAI_YAML).unwrap();

    let summary = parse_openapi_file(&path).unwrap();
    assert_eq!(summary.title, "防災API");
    assert_eq!(summary.base_url, "https://api.example.jp");
    assert_eq!(summary.endpoints.len(), 1);

    let endpoint = &summary.endpoints[0];
    assert_eq!(endpoint.id, "GET /v2/entities");
    assert_eq!(endpoint.parameters.required_params, vec!["type"]);
    assert_eq!(endpoint.parameters.optional_params, vec!["limit"]);
    assert_eq!(endpoint.responses["200"]["description"], "OK");
}
