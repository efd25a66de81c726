//! Configuration management for yaizu-catalog using the prefer crate.
//!
//! File configuration only covers paths, endpoints and HTTP tuning. The three
//! credentials are read from the environment (see [`Credentials`]) and never
//! from a config file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Portal front-end base URL.
pub const DEFAULT_CATALOG_BASE_URL: &str = "https://city-api-catalog.smartcity-pf.com/yaizu";

/// Portal API (Kong gateway) base URL.
pub const DEFAULT_CATALOG_API_BASE_URL: &str =
    "https://city-api-catalog-api.smartcity-pf.com/yaizu";

/// Production NGSIv2 entities endpoint.
pub const DEFAULT_NGSI_ENDPOINT: &str = "https://api.smartcity-yaizu.jp/v2/entities";

/// Environment variable holding the portal login email.
pub const ENV_EMAIL: &str = "YAIZU_API_EMAIL";
/// Environment variable holding the portal login password.
pub const ENV_PASSWORD: &str = "YAIZU_API_PASSWORD";
/// Environment variable holding the data-plane API key.
pub const ENV_API_KEY: &str = "YAIZU_API_KEY";

const SPECS_SUBDIR: &str = "api_specs";
const DOCUMENTATION_SUBDIR: &str = "documentation";
const OPENAPI_SUBDIR: &str = "openapi";

/// Errors raised when a required setting or secret is missing.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("portal credentials are not set ({ENV_EMAIL} / {ENV_PASSWORD})")]
    CredentialsMissing,

    #[error("data-plane API key is not set ({ENV_API_KEY})")]
    ApiKeyMissing,

    #[error("Failed to load config: {0}")]
    Load(String),
}

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base data directory.
    pub data_dir: PathBuf,
    /// Directory holding catalog documents and entity specs (JSON).
    pub specs_dir: PathBuf,
    /// Directory for downloaded PDF documentation.
    pub documentation_dir: PathBuf,
    /// Directory holding externally supplied OpenAPI YAML files.
    pub openapi_dir: PathBuf,
    /// Portal front-end base URL.
    pub catalog_base_url: String,
    /// Portal API base URL.
    pub catalog_api_base_url: String,
    /// NGSI entities endpoint.
    pub ngsi_endpoint: String,
    /// User agent for scraping requests (None = default, "browser" = desktop browser UA).
    pub user_agent: Option<String>,
    /// Request timeout in seconds, applied to every outbound request.
    pub request_timeout: u64,
    /// Delay between catalog PDF downloads in milliseconds.
    pub download_delay_ms: u64,
    /// Delay between YAML-listed PDF downloads in milliseconds.
    pub yaml_download_delay_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self::with_data_dir(PathBuf::from("data"))
    }
}

impl Settings {
    /// Create settings with a custom data directory.
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self {
            specs_dir: data_dir.join(SPECS_SUBDIR),
            documentation_dir: data_dir.join(DOCUMENTATION_SUBDIR),
            openapi_dir: data_dir.join(OPENAPI_SUBDIR),
            data_dir,
            catalog_base_url: DEFAULT_CATALOG_BASE_URL.to_string(),
            catalog_api_base_url: DEFAULT_CATALOG_API_BASE_URL.to_string(),
            ngsi_endpoint: DEFAULT_NGSI_ENDPOINT.to_string(),
            user_agent: None,
            request_timeout: 30,
            download_delay_ms: 500,
            yaml_download_delay_ms: 300,
        }
    }

    /// Point every data subdirectory at a new data directory.
    pub fn set_data_dir(&mut self, data_dir: PathBuf) {
        self.specs_dir = data_dir.join(SPECS_SUBDIR);
        self.documentation_dir = data_dir.join(DOCUMENTATION_SUBDIR);
        self.openapi_dir = data_dir.join(OPENAPI_SUBDIR);
        self.data_dir = data_dir;
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    pub fn download_delay(&self) -> Duration {
        Duration::from_millis(self.download_delay_ms)
    }

    pub fn yaml_download_delay(&self) -> Duration {
        Duration::from_millis(self.yaml_download_delay_ms)
    }

    /// Ensure all data directories exist.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        for dir in [&self.specs_dir, &self.documentation_dir, &self.openapi_dir] {
            std::fs::create_dir_all(dir).map_err(|e| {
                std::io::Error::new(
                    e.kind(),
                    format!("Failed to create directory '{}': {}", dir.display(), e),
                )
            })?;
        }
        Ok(())
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, prefer::FromValue)]
pub struct Config {
    /// Data directory path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
    /// Portal front-end base URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_base_url: Option<String>,
    /// Portal API base URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_api_base_url: Option<String>,
    /// NGSI entities endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ngsi_endpoint: Option<String>,
    /// User agent string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<u64>,
    /// Delay between catalog PDF downloads in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_delay_ms: Option<u64>,
    /// Delay between YAML-listed PDF downloads in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yaml_download_delay_ms: Option<u64>,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    #[prefer(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Discover and load the config file, falling back to defaults.
    pub async fn load() -> Self {
        // Use prefer for file discovery, then parse with serde
        match prefer::load("yaizu").await {
            Ok(pref_config) => {
                if let Some(path) = pref_config.source_path() {
                    match Self::load_from_path(path).await {
                        Ok(config) => config,
                        Err(e) => {
                            warn!("{}", e);
                            Self::default()
                        }
                    }
                } else {
                    Self::default()
                }
            }
            Err(_) => Self::default(),
        }
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ConfigError::Load(format!("Failed to read config file: {}", e)))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

        let mut config: Config = match ext {
            "toml" => toml::from_str(&contents)
                .map_err(|e| ConfigError::Load(format!("Failed to parse TOML config: {}", e)))?,
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::Load(format!("Failed to parse YAML config: {}", e)))?,
            _ => serde_json::from_str(&contents)
                .map_err(|e| ConfigError::Load(format!("Failed to parse JSON config: {}", e)))?,
        };

        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Get the base directory for resolving relative paths.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    /// - Absolute paths are returned as-is
    /// - Paths starting with ~ are expanded
    /// - Relative paths are resolved relative to `base_dir`
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        if let Some(ref data_dir) = self.data_dir {
            settings.set_data_dir(self.resolve_path(data_dir, base_dir));
        }
        if let Some(ref url) = self.catalog_base_url {
            settings.catalog_base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(ref url) = self.catalog_api_base_url {
            settings.catalog_api_base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(ref url) = self.ngsi_endpoint {
            settings.ngsi_endpoint = url.clone();
        }
        if let Some(ref user_agent) = self.user_agent {
            settings.user_agent = Some(user_agent.clone());
        }
        if let Some(timeout) = self.request_timeout {
            settings.request_timeout = timeout;
        }
        if let Some(delay) = self.download_delay_ms {
            settings.download_delay_ms = delay;
        }
        if let Some(delay) = self.yaml_download_delay_ms {
            settings.yaml_download_delay_ms = delay;
        }
    }
}

/// Load settings from an explicit config path, or by discovery.
pub async fn load_settings(config_path: Option<&Path>) -> Result<Settings, ConfigError> {
    let config = match config_path {
        Some(path) => Config::load_from_path(path).await?,
        None => Config::load().await,
    };

    let mut settings = Settings::default();
    let base_dir = config
        .base_dir()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    config.apply_to_settings(&mut settings, &base_dir);

    if let Some(ref path) = config.source_path {
        info!("Loaded config from {}", path.display());
    }
    Ok(settings)
}

/// Portal credentials and the data-plane API key.
///
/// Immutable once loaded. The email/password pair only authenticates against
/// the documentation portal; the API key only authorizes NGSI queries.
#[derive(Clone, Default)]
pub struct Credentials {
    email: Option<String>,
    password: Option<String>,
    api_key: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .finish()
    }
}

impl Credentials {
    pub fn new(
        email: Option<String>,
        password: Option<String>,
        api_key: Option<String>,
    ) -> Self {
        let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        Self {
            email: non_empty(email),
            password: non_empty(password),
            api_key: non_empty(api_key),
        }
    }

    /// Read credentials from the environment.
    pub fn from_env() -> Self {
        let creds = Self::new(
            std::env::var(ENV_EMAIL).ok(),
            std::env::var(ENV_PASSWORD).ok(),
            std::env::var(ENV_API_KEY).ok(),
        );

        if !creds.has_portal_login() {
            warn!("Portal credentials ({ENV_EMAIL} / {ENV_PASSWORD}) are not set");
        }
        if creds.api_key.is_none() {
            info!("{ENV_API_KEY} is not set; NGSI queries will be unavailable");
        }
        creds
    }

    pub fn has_portal_login(&self) -> bool {
        self.email.is_some() && self.password.is_some()
    }

    /// The portal email/password pair, or an error if either is absent.
    pub fn portal_login(&self) -> Result<(&str, &str), ConfigError> {
        match (self.email.as_deref(), self.password.as_deref()) {
            (Some(email), Some(password)) => Ok((email, password)),
            _ => Err(ConfigError::CredentialsMissing),
        }
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// The data-plane API key, or an error if absent.
    pub fn api_key(&self) -> Result<&str, ConfigError> {
        self.api_key.as_deref().ok_or(ConfigError::ApiKeyMissing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_settings_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.specs_dir, PathBuf::from("data/api_specs"));
        assert_eq!(settings.documentation_dir, PathBuf::from("data/documentation"));
        assert_eq!(settings.request_timeout, 30);
        assert_eq!(settings.download_delay_ms, 500);
        assert_eq!(settings.yaml_download_delay_ms, 300);
    }

    #[tokio::test]
    async fn test_load_from_toml_and_apply() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("yaizu.toml");
        std::fs::write(
            &path,
            "data_dir = \"store\"\nrequest_timeout = 10\ncatalog_base_url = \"http://localhost:9/yaizu/\"\n",
        )
        .unwrap();

        let config = Config::load_from_path(&path).await.unwrap();
        let mut settings = Settings::default();
        config.apply_to_settings(&mut settings, &config.base_dir().unwrap());

        assert_eq!(settings.data_dir, dir.path().join("store"));
        assert_eq!(settings.specs_dir, dir.path().join("store").join("api_specs"));
        assert_eq!(settings.request_timeout, 10);
        assert_eq!(settings.catalog_base_url, "http://localhost:9/yaizu");
    }

    #[tokio::test]
    async fn test_load_from_yaml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("yaizu.yaml");
        std::fs::write(&path, "download_delay_ms: 0\n").unwrap();

        let config = Config::load_from_path(&path).await.unwrap();
        assert_eq!(config.download_delay_ms, Some(0));
        assert!(config.data_dir.is_none());
    }

    #[tokio::test]
    async fn test_load_invalid_json_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("yaizu.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(Config::load_from_path(&path).await.is_err());
    }

    #[test]
    fn test_credentials_empty_values_are_absent() {
        let creds = Credentials::new(Some("".into()), Some("pw".into()), Some("  ".into()));
        assert!(!creds.has_portal_login());
        assert!(matches!(
            creds.portal_login(),
            Err(ConfigError::CredentialsMissing)
        ));
        assert!(matches!(creds.api_key(), Err(ConfigError::ApiKeyMissing)));
    }

    #[test]
    fn test_credentials_debug_hides_secrets() {
        let creds = Credentials::new(
            Some("a@example.jp".into()),
            Some("secret".into()),
            Some("key".into()),
        );
        let debug = format!("{:?}", creds);
        assert!(debug.contains("a@example.jp"));
        assert!(!debug.contains("secret"));
        assert!(!debug.contains("\"key\""));
    }
}
