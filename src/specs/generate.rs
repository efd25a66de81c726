//! Entity specs inferred from a PDF link name, plus the helpers that
//! describe how to query an entity.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{AttributeSpec, EntitySpec, FIWARE_SERVICE};
use crate::storage::now_iso;

/// Store name of the index written by the OpenAPI harvest.
pub const DATA_MODELS_INDEX_DOCUMENT: &str = "data_models_index";

/// Extra attributes keyed on a substring of the entity type. First match wins.
const SPECIALIZED_ATTRIBUTES: &[(&str, [(&str, &str, &str); 2])] = &[
    ("Aed", [("status", "string", "設置状況"), ("manufacturer", "string", "製造元")]),
    ("Camera", [("imageUrl", "string", "画像URL"), ("direction", "number", "方向")]),
    ("Gauge", [("value", "number", "測定値"), ("unit", "string", "単位")]),
    (
        "Evacuation",
        [("capacity", "number", "収容人数"), ("facilityType", "string", "施設タイプ")],
    ),
];

const CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "disaster_management",
        &["disaster", "emergency", "防災", "災害", "避難", "警戒", "危険", "evacuation", "alert"],
    ),
    (
        "infrastructure",
        &["facility", "infrastructure", "施設", "設備", "building", "warehouse"],
    ),
    (
        "environmental",
        &["weather", "environment", "気象", "環境", "雨量", "水位", "gauge", "sensor"],
    ),
    ("transportation", &["traffic", "road", "道路", "交通", "restricted"]),
    (
        "tourism_industry",
        &["event", "tourism", "sightseeing", "イベント", "観光", "産業"],
    ),
    (
        "medical_emergency",
        &["medical", "hospital", "aid", "救護", "医療", "aed"],
    ),
];

/// Stem of a file name: everything before the last `.`.
fn file_stem(filename: &str) -> &str {
    match filename.rfind('.') {
        Some(i) if i > 0 => &filename[..i],
        _ => filename,
    }
}

/// Basic spec for an entity known only by its PDF link.
///
/// The entity type is the PDF file stem.
pub fn spec_from_pdf_name(name: &str, pdf_filename: &str) -> EntitySpec {
    let entity_type = file_stem(pdf_filename);
    let mut spec = EntitySpec::new(entity_type, name);
    spec.description = Some(format!("{}の情報を管理するデータモデル", name));
    spec.last_updated = Some(now_iso());
    spec.pdf_source = Some(pdf_filename.to_string());

    spec.set_attribute(
        "id",
        AttributeSpec::new("string", "エンティティID").required(true),
    );
    spec.set_attribute(
        "type",
        AttributeSpec::new("string", "エンティティタイプ")
            .with_value(entity_type)
            .required(true),
    );
    spec.set_attribute("location", AttributeSpec::new("geo:point", "位置情報").required(false));
    spec.set_attribute(
        "address",
        AttributeSpec::new("StructuredValue", "住所情報").required(false),
    );
    spec.set_attribute("name", AttributeSpec::new("string", "名称").required(false));
    spec.set_attribute(
        "dateObserved",
        AttributeSpec::new("DateTime", "観測日時").required(false),
    );

    if let Some((_, extras)) = SPECIALIZED_ATTRIBUTES
        .iter()
        .find(|(needle, _)| entity_type.contains(needle))
    {
        for (key, kind, description) in extras {
            spec.set_attribute(key, AttributeSpec::new(kind, description));
        }
    }

    spec.extra.insert("categories".into(), json!(classify_entity(entity_type, name)));
    spec.extra.insert("queryExamples".into(), Value::Array(query_examples(entity_type)));
    spec
}

/// Category tags for an entity, or `["general"]`.
pub fn classify_entity(entity_type: &str, name: &str) -> Vec<&'static str> {
    let haystack = format!("{}{}", name.to_lowercase(), entity_type.to_lowercase());
    let categories: Vec<&'static str> = CATEGORY_KEYWORDS
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|k| haystack.contains(k)))
        .map(|(category, _)| *category)
        .collect();

    if categories.is_empty() {
        vec!["general"]
    } else {
        categories
    }
}

/// Three NGSI query examples: all entities, one by id, and a geo search
/// around central Yaizu.
pub fn query_examples(entity_type: &str) -> Vec<Value> {
    let headers = json!({
        "Fiware-Service": FIWARE_SERVICE,
        "Fiware-ServicePath": format!("/{}", entity_type),
    });

    vec![
        json!({
            "name": "全エンティティ取得",
            "description": format!("全ての{}エンティティを取得", entity_type),
            "method": "GET",
            "endpoint": "/v2/entities",
            "parameters": {"type": entity_type, "limit": 100},
            "headers": headers.clone(),
        }),
        json!({
            "name": "ID指定取得",
            "description": "特定のエンティティをID指定で取得",
            "method": "GET",
            "endpoint": "/v2/entities/{entity_id}",
            "parameters": {},
            "headers": headers.clone(),
        }),
        json!({
            "name": "地理的範囲検索",
            "description": "指定範囲内のエンティティを検索",
            "method": "GET",
            "endpoint": "/v2/entities",
            "parameters": {
                "type": entity_type,
                "georel": "near;maxDistance:1000",
                "geometry": "point",
                "coords": "34.866,138.321",
            },
            "headers": headers,
        }),
    ]
}

/// One model produced by the OpenAPI harvest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedModel {
    pub source_yaml: String,
    pub name: String,
    pub pdf_file: String,
    pub json_file: String,
    pub entity_type: String,
}

/// `data_models_index.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataModelIndex {
    pub title: String,
    pub description: String,
    pub generated_at: String,
    pub total_models: usize,
    pub yaml_sources: Vec<String>,
    pub models: Vec<IndexedModel>,
}

impl DataModelIndex {
    pub fn new(yaml_sources: Vec<String>, models: Vec<IndexedModel>) -> Self {
        Self {
            title: "焼津市スマートシティ API データモデル".to_string(),
            description: "OpenAPI仕様から生成されたデータモデルスキーマ".to_string(),
            generated_at: now_iso(),
            total_models: models.len(),
            yaml_sources,
            models,
        }
    }
}
