//! NGSIv2 data-plane passthrough.
//!
//! A single GET against `/v2/entities` with the header set the Yaizu gateway
//! expects. Response bodies are returned as received.

use std::time::Duration;

use serde_json::Value;
use tracing::info;

use crate::config::{Credentials, Settings};
use crate::scrapers::HttpClient;
use crate::specs::FIWARE_SERVICE;

/// Requests to the data plane always use this timeout.
pub const NGSI_TIMEOUT: Duration = Duration::from_secs(30);

/// User agent the gateway WAF accepts.
pub const NGSI_USER_AGENT: &str = "smartcity-service";

const MAX_LIMIT: u32 = 1000;

/// Entity types with a dedicated service path.
const SERVICE_PATH_TYPES: &[&str] = &[
    "Aed",
    "EvacuationShelter",
    "DisasterMail",
    "WeatherAlert",
    "WeatherForecast",
    "FloodRiskAreaMaxScale",
    "TsunamiEvacuationBuilding",
    "DrinkingWaterTank",
    "PrecipitationGauge",
    "CameraInformation",
    "StreamGauge",
    "FirstAidStation",
    "ReliefHospital",
];

#[derive(Debug, thiserror::Error)]
pub enum NgsiError {
    #[error("API key is not set (YAIZU_API_KEY)")]
    MissingApiKey,

    #[error("params must be a JSON object: {0}")]
    InvalidParams(String),

    #[error("request timed out")]
    Timeout,

    #[error("HTTP request failed: {0}")]
    Http(#[source] reqwest::Error),
}

impl From<reqwest::Error> for NgsiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(e)
        }
    }
}

/// `Fiware-ServicePath` for an entity type.
pub fn service_path(entity_type: &str) -> String {
    if SERVICE_PATH_TYPES.contains(&entity_type) {
        format!("/{}", entity_type)
    } else {
        "/".to_string()
    }
}

fn param_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Query pairs: `type`, clamped `limit`, then the caller's params. A param
/// with an existing key replaces it in place.
pub fn build_query(
    entity_type: &str,
    params_json: Option<&str>,
    limit: u32,
) -> Result<Vec<(String, String)>, NgsiError> {
    let mut query = vec![
        ("type".to_string(), entity_type.to_string()),
        ("limit".to_string(), limit.clamp(1, MAX_LIMIT).to_string()),
    ];

    let Some(raw) = params_json.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(query);
    };
    let extra = match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => map,
        Ok(other) => return Err(NgsiError::InvalidParams(format!("got {}", other))),
        Err(e) => return Err(NgsiError::InvalidParams(e.to_string())),
    };

    for (key, value) in extra {
        let value = param_value(&value);
        match query.iter_mut().find(|(k, _)| *k == key) {
            Some(existing) => existing.1 = value,
            None => query.push((key, value)),
        }
    }
    Ok(query)
}

/// Header set for one data-plane call. A fresh trace id is generated each
/// time. No `Content-Type` is sent.
pub fn build_headers(api_key: &str, service_path: &str) -> Vec<(String, String)> {
    vec![
        ("Accept".to_string(), "application/json".to_string()),
        ("apikey".to_string(), api_key.to_string()),
        ("Fiware-Service".to_string(), FIWARE_SERVICE.to_string()),
        ("Fiware-ServicePath".to_string(), service_path.to_string()),
        (
            "x-request-trace-id".to_string(),
            uuid::Uuid::new_v4().to_string(),
        ),
        ("User-Agent".to_string(), NGSI_USER_AGENT.to_string()),
    ]
}

#[derive(Debug, Clone)]
pub struct NgsiResponse {
    pub status: u16,
    pub body: String,
    pub rate_limit_remaining: Option<String>,
    pub query: Vec<(String, String)>,
    pub service_path: String,
    pub endpoint: String,
}

impl NgsiResponse {
    /// Parsed body, when it is JSON.
    pub fn json(&self) -> Option<Value> {
        serde_json::from_str(&self.body).ok()
    }
}

pub struct NgsiClient {
    client: HttpClient,
    endpoint: String,
    api_key: Option<String>,
}

impl NgsiClient {
    pub fn new(endpoint: &str, api_key: Option<String>) -> Result<Self, NgsiError> {
        let client = HttpClient::new(NGSI_TIMEOUT, Duration::ZERO)?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            api_key,
        })
    }

    pub fn from_settings(
        settings: &Settings,
        credentials: &Credentials,
    ) -> Result<Self, NgsiError> {
        Self::new(
            &settings.ngsi_endpoint,
            credentials.api_key().ok().map(str::to_string),
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Fetch entities of `entity_type`. Fails before any request when the
    /// API key is missing or `params_json` is not a JSON object.
    pub async fn execute(
        &self,
        entity_type: &str,
        params_json: Option<&str>,
        limit: u32,
    ) -> Result<NgsiResponse, NgsiError> {
        let api_key = self.api_key.as_deref().ok_or(NgsiError::MissingApiKey)?;
        let service_path = service_path(entity_type);
        let query = build_query(entity_type, params_json, limit)?;
        let headers = build_headers(api_key, &service_path);

        info!("Querying {} entities ({})", entity_type, service_path);
        let response = self
            .client
            .get_with_query(&self.endpoint, &headers, &query)
            .await?;
        let status = response.status_code();
        let rate_limit_remaining = response
            .header("x-ratelimit-remaining-minute")
            .map(str::to_string);
        let body = response.text().await?;

        Ok(NgsiResponse {
            status,
            body,
            rate_limit_remaining,
            query,
            service_path,
            endpoint: self.endpoint.clone(),
        })
    }
}
