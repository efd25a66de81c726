//! Table of the entity types published by the Yaizu data platform.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{AttributeSpec, EntitySpec, SpecError, FIWARE_SERVICE};
use crate::config::DEFAULT_CATALOG_API_BASE_URL;
use crate::storage::LocalStore;

/// Store name of the manifest written by [`write_known_specs`].
pub const KNOWN_MODELS_DOCUMENT: &str = "api_specs";

/// `(entityType, dataModelName)` for every known entity.
pub const KNOWN_MODELS: &[(&str, &str)] = &[
    ("Aed", "AED設置場所"),
    ("DrinkingWaterTank", "飲料水貯水槽"),
    ("PrecipitationGauge", "雨量計"),
    ("SteepSlopeFailureSpecialVigilanceArea", "がけ崩れ（特別警戒区域）"),
    ("SteepSlopeFailureVigilanceArea", "がけ崩れ（警戒区域）"),
    ("CameraInformation", "河川・海岸カメラ"),
    ("StreamGauge", "河川水位計"),
    ("UnderpassInformation", "冠水センサー"),
    ("FirstAidStation", "救護所"),
    ("ReliefHospital", "救護病院"),
    ("WeatherAlert", "警報・注意報"),
    ("HouseCollapseRiskAreaRiverErosion", "洪水浸水想定区域（家屋倒壊等：河岸浸食）"),
    ("HouseCollapseRiskAreaOverflowing", "洪水浸水想定区域（家屋倒壊等：氾濫流）"),
    ("FloodRiskAreaPlanScale", "洪水浸水想定区域（計画規模）"),
    ("FloodRiskAreaMaxScale", "洪水浸水想定区域（最大規模）"),
    ("FloodRiskAreaMaxTime", "洪水浸水想定区域（浸水継続時間）"),
    ("TsunamiFloodRiskArea", "静岡県第4次地震被害想定（レベル２重合せ図）"),
    ("LandslideVigilanceArea", "地すべり（警戒区域）"),
    ("LandslidePreventionArea", "地すべり（防止区域）"),
    ("EvacuationSpace", "指定緊急避難場所"),
    ("TsunamiEvacuationBuilding", "指定津波避難ビル等"),
    ("FloodHistory", "浸水履歴"),
    ("FloodPreventionWarehouse", "水防倉庫"),
    ("WeatherForecast", "天候"),
    ("BroadcastRadioChildStation", "同報無線子局"),
    ("RestrictedTrafficAreaInformation", "道路規制情報"),
    ("DebrisFlowSpecialVigilanceArea", "土石流（特別警戒区域）"),
    ("DebrisFlowVigilanceArea", "土石流（警戒区域）"),
    ("SandbagStation", "土のうステーション"),
    ("SewerFloodRiskArea", "内水浸水想定区域（公共下水道区域内）"),
    ("EvacuationInformationFlood", "発令中の避難情報（洪水）"),
    ("EvacuationInformationSediment", "発令中の避難情報（土砂）"),
    ("EvacuationInformationStormSurge", "発令中の避難情報（高潮）"),
    ("EvacuationInformationEarthquake", "発令中の避難情報（地震）"),
    ("EvacuationInformationTsunami", "発令中の避難情報（津波）"),
    ("EvacuationInformationNuclearPower", "発令中の避難情報（原子力）"),
    ("EvacuationShelter", "避難所開設状況"),
    ("FirePreventionWaterTank", "防火水槽"),
    ("DisasterPreventionWarehouse", "防災倉庫"),
    ("DisasterMail", "防災メール発信コントロール"),
    ("DisasterPreventionHeliport", "防災用ヘリポート"),
];

/// Basic spec for a known entity type, or `None` for an unknown one.
pub fn known_spec(entity_type: &str) -> Option<EntitySpec> {
    let (_, data_model_name) = KNOWN_MODELS.iter().find(|(t, _)| *t == entity_type)?;

    let mut spec = EntitySpec::new(entity_type, data_model_name);
    spec.entity_id_pattern = Some(format!("jp.smartcity-yaizu.{}.[IDの値]", entity_type));
    spec.set_attribute(
        "id",
        AttributeSpec::new("Text", &format!("{}の識別子", data_model_name)).named("ID"),
    );
    spec.set_attribute(
        "type",
        AttributeSpec::new("Text", "エンティティタイプ")
            .named("タイプ")
            .with_value(entity_type),
    );
    Some(spec)
}

/// One line of the manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnownModelEntry {
    pub entity_type: String,
    pub data_model_name: String,
    pub fiware_service: String,
    pub fiware_service_path: String,
    pub entity_id_pattern: String,
    pub json_file: String,
}

/// Manifest of every spec in the store, written as `api_specs.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnownModelsIndex {
    pub description: String,
    pub version: String,
    pub base_url: String,
    pub fiware_service: String,
    pub data_models: Vec<KnownModelEntry>,
}

impl KnownModelsIndex {
    /// Build the manifest from every store document that looks like a spec.
    pub fn from_store(store: &LocalStore) -> Self {
        let data_models = store
            .list()
            .into_iter()
            .filter_map(|name| {
                let spec: EntitySpec = store.load_as(&name).ok()?;
                Some(KnownModelEntry {
                    entity_type: spec.entity_type,
                    data_model_name: spec.data_model_name,
                    fiware_service: spec.fiware_service,
                    fiware_service_path: spec.fiware_service_path,
                    entity_id_pattern: spec.entity_id_pattern.unwrap_or_default(),
                    json_file: store.path_for(&name).display().to_string(),
                })
            })
            .collect();

        Self {
            description: "焼津市スマートシティ防災API データモデル仕様".to_string(),
            version: "1.0.0".to_string(),
            base_url: DEFAULT_CATALOG_API_BASE_URL.to_string(),
            fiware_service: FIWARE_SERVICE.to_string(),
            data_models,
        }
    }
}

/// Write a basic spec for every known type not already in the store, then
/// rebuild the manifest. Returns the manifest and the types written.
pub fn write_known_specs(store: &LocalStore) -> Result<(KnownModelsIndex, Vec<String>), SpecError> {
    let mut written = Vec::new();
    for (entity_type, _) in KNOWN_MODELS {
        if store.exists(entity_type) {
            debug!("Keeping existing spec {}", entity_type);
            continue;
        }
        if let Some(spec) = known_spec(entity_type) {
            store.save_as(entity_type, &spec)?;
            written.push(entity_type.to_string());
        }
    }

    let index = KnownModelsIndex::from_store(store);
    store.save_as(KNOWN_MODELS_DOCUMENT, &index)?;
    info!(
        "Wrote {} specs, manifest lists {} models",
        written.len(),
        index.data_models.len()
    );
    Ok((index, written))
}
