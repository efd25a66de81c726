//! Local JSON document store.
//!
//! One directory of `<name>.json` files. Writes go through a temporary file
//! in the same directory and are renamed into place, so a reader never sees
//! a half-written document. Last write wins.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

/// Version stamped into document metadata.
pub const DOCUMENT_VERSION: &str = "1.0";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("document not found: {0}")]
    NotFound(String),

    #[error("document {name} is malformed: {source}")]
    Malformed {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Local timestamp in ISO-8601 with microseconds and no offset.
pub fn now_iso() -> String {
    chrono::Local::now()
        .naive_local()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}

/// Write `bytes` to `path` atomically, creating parent directories.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// A catalog entry matched by [`LocalStore::search`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub source_file: String,
    pub api: Value,
}

#[derive(Debug)]
pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    /// Open (and create if needed) a store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        debug!("Opened store at {}", dir.display());
        Ok(Self { dir })
    }

    /// End the store's lifecycle.
    pub fn close(self) {
        debug!("Closed store at {}", self.dir.display());
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", name))
    }

    pub fn exists(&self, name: &str) -> bool {
        self.path_for(name).is_file()
    }

    /// Write `value` as pretty-printed UTF-8 JSON, replacing any previous file.
    pub fn save(&self, name: &str, value: &Value) -> Result<PathBuf, StoreError> {
        let path = self.path_for(name);
        let body = serde_json::to_string_pretty(value)?;
        write_atomic(&path, body.as_bytes())?;
        debug!("Saved {}", path.display());
        Ok(path)
    }

    /// Serialize and save without adding metadata.
    pub fn save_as<T: Serialize>(&self, name: &str, doc: &T) -> Result<PathBuf, StoreError> {
        self.save(name, &serde_json::to_value(doc)?)
    }

    /// Save with a `metadata {scraped_at, source_url, version}` block.
    pub fn save_document<T: Serialize>(
        &self,
        name: &str,
        doc: &T,
        source_url: &str,
    ) -> Result<PathBuf, StoreError> {
        let mut value = serde_json::to_value(doc)?;
        if let Value::Object(ref mut obj) = value {
            obj.insert(
                "metadata".to_string(),
                json!({
                    "scraped_at": now_iso(),
                    "source_url": source_url,
                    "version": DOCUMENT_VERSION,
                }),
            );
        }
        self.save(name, &value)
    }

    /// Load a document. Absent files are `Ok(None)`.
    pub fn load(&self, name: &str) -> Result<Option<Value>, StoreError> {
        let path = self.path_for(name);
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|source| StoreError::Malformed {
                name: name.to_string(),
                source,
            })
    }

    /// Load and deserialize a document that must exist.
    pub fn load_as<T: DeserializeOwned>(&self, name: &str) -> Result<T, StoreError> {
        let value = self
            .load(name)?
            .ok_or_else(|| StoreError::NotFound(name.to_string()))?;
        serde_json::from_value(value).map_err(|source| StoreError::Malformed {
            name: name.to_string(),
            source,
        })
    }

    /// Sorted stems of every `*.json` file in the store.
    pub fn list(&self) -> Vec<String> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Failed to list {}: {}", self.dir.display(), e);
                return Vec::new();
            }
        };

        let mut names: Vec<String> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file() && p.extension().and_then(|e| e.to_str()) == Some("json"))
            .filter_map(|p| p.file_stem().and_then(|s| s.to_str()).map(str::to_string))
            .collect();
        names.sort();
        names
    }

    /// Case-insensitive match on name, description and category of every
    /// entry of every document carrying an `apis` array.
    pub fn search(&self, keyword: &str) -> Vec<SearchHit> {
        let keyword = keyword.to_lowercase();
        let mut hits = Vec::new();

        for name in self.list() {
            let doc = match self.load(&name) {
                Ok(Some(doc)) => doc,
                Ok(None) => continue,
                Err(e) => {
                    warn!("Skipping {} during search: {}", name, e);
                    continue;
                }
            };
            let Some(apis) = doc.get("apis").and_then(Value::as_array) else {
                continue;
            };
            for api in apis {
                let matches = ["name", "description", "category"].iter().any(|field| {
                    api.get(*field)
                        .and_then(Value::as_str)
                        .map(|s| s.to_lowercase().contains(&keyword))
                        .unwrap_or(false)
                });
                if matches {
                    hits.push(SearchHit {
                        source_file: name.clone(),
                        api: api.clone(),
                    });
                }
            }
        }

        hits
    }

    /// Write raw bytes under the store directory.
    pub fn save_bytes(&self, relative: &Path, bytes: &[u8]) -> Result<PathBuf, StoreError> {
        let path = self.dir.join(relative);
        write_atomic(&path, bytes)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_save_load_roundtrip_keeps_japanese() {
        let dir = TempDir::new().unwrap();
        let store = LocalStore::open(dir.path()).unwrap();
        store.save("aed", &json!({"dataModelName": "AED設置場所"})).unwrap();

        let raw = std::fs::read_to_string(store.path_for("aed")).unwrap();
        assert!(raw.contains("AED設置場所"));
        assert!(raw.contains("\n  \"dataModelName\""));
        assert_eq!(
            store.load("aed").unwrap(),
            Some(json!({"dataModelName": "AED設置場所"}))
        );
    }

    #[test]
    fn test_load_absent_is_none() {
        let dir = TempDir::new().unwrap();
        let store = LocalStore::open(dir.path()).unwrap();
        assert!(store.load("missing").unwrap().is_none());
        assert!(matches!(
            store.load_as::<Value>("missing"),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_load_malformed_is_error() {
        let dir = TempDir::new().unwrap();
        let store = LocalStore::open(dir.path()).unwrap();
        std::fs::write(store.path_for("bad"), "{not json").unwrap();
        assert!(matches!(
            store.load("bad"),
            Err(StoreError::Malformed { ref name, .. }) if name == "bad"
        ));
    }

    #[test]
    fn test_save_document_stamps_metadata() {
        let dir = TempDir::new().unwrap();
        let store = LocalStore::open(dir.path()).unwrap();
        store
            .save_document("cat", &json!({"title": "t"}), "https://portal")
            .unwrap();
        let doc = store.load("cat").unwrap().unwrap();
        assert_eq!(doc["metadata"]["source_url"], "https://portal");
        assert_eq!(doc["metadata"]["version"], "1.0");
        assert!(doc["metadata"]["scraped_at"].is_string());
    }

    #[test]
    fn test_list_is_sorted_json_only() {
        let dir = TempDir::new().unwrap();
        let store = LocalStore::open(dir.path()).unwrap();
        store.save("b", &json!({})).unwrap();
        store.save("a", &json!({})).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "x").unwrap();
        assert_eq!(store.list(), vec!["a", "b"]);
    }

    #[test]
    fn test_save_bytes_creates_parents() {
        let dir = TempDir::new().unwrap();
        let store = LocalStore::open(dir.path()).unwrap();
        let path = store
            .save_bytes(Path::new("pdf/sub/x.pdf"), b"%PDF-1.4")
            .unwrap();
        assert_eq!(std::fs::read(path).unwrap(), b"%PDF-1.4");
    }
}
