//! Field hints pulled from PDF text.
//!
//! Text extraction is delegated to `pdftotext` (poppler-utils). The field
//! heuristics only look for `name: description` and `・名前：説明` lines.

use std::path::Path;
use std::process::Stdio;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use tokio::process::Command;
use tracing::debug;

use super::{AttributeSpec, EntitySpec, SpecError};

const MAX_FIELDS: usize = 10;
const MAX_DESCRIPTION_CHARS: usize = 200;

static ASCII_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([a-zA-Z_][a-zA-Z0-9_]*)\s*:\s*([^\n]+)").expect("field regex should compile")
});

static BULLET_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"・\s*([^：\n]+)：([^\n]+)").expect("bullet regex should compile")
});

static NON_ALNUM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9]+").expect("alnum regex should compile"));

/// Japanese label fragments and the attribute names they map to.
const NAME_TABLE: &[(&str, &str)] = &[
    ("名前", "name"),
    ("名称", "name"),
    ("住所", "address"),
    ("位置", "location"),
    ("座標", "coordinates"),
    ("ID", "id"),
    ("識別子", "id"),
    ("種別", "type"),
    ("分類", "category"),
    ("状態", "status"),
    ("状況", "status"),
    ("日時", "dateTime"),
    ("時刻", "time"),
    ("値", "value"),
    ("容量", "capacity"),
    ("人数", "capacity"),
];

/// Extracts plain text from a PDF file.
#[async_trait]
pub trait PdfTextExtractor: Send + Sync {
    async fn extract_text(&self, path: &Path) -> Result<String, SpecError>;
}

/// Runs `pdftotext -layout <file> -`.
#[derive(Debug, Clone, Default)]
pub struct PdftotextExtractor;

#[async_trait]
impl PdfTextExtractor for PdftotextExtractor {
    async fn extract_text(&self, path: &Path) -> Result<String, SpecError> {
        let output = Command::new("pdftotext")
            .arg("-layout")
            .arg(path)
            .arg("-")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => SpecError::ToolMissing("pdftotext"),
                _ => SpecError::Io(e),
            })?;

        if !output.status.success() {
            return Err(SpecError::Tool {
                tool: "pdftotext",
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!("pdftotext read {} chars from {}", text.len(), path.display());
        Ok(text)
    }
}

/// A field hint found in PDF text.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedField {
    pub name: String,
    pub description: String,
    pub kind: String,
    pub required: bool,
}

fn normalize_field_name(name: &str) -> String {
    if let Some((_, en)) = NAME_TABLE.iter().find(|(jp, _)| name.contains(jp)) {
        return en.to_string();
    }
    let normalized = NON_ALNUM.replace_all(name, "_");
    let normalized = normalized.trim_matches('_');
    if normalized.is_empty() {
        "unknown_field".to_string()
    } else {
        normalized.to_lowercase()
    }
}

fn guess_data_type(text: &str) -> &'static str {
    let any = |keywords: &[&str]| keywords.iter().any(|k| text.contains(k));
    if any(&["座標", "coordinate", "緯度", "経度", "location"]) {
        "geo:json"
    } else if any(&["日時", "datetime", "時刻", "time", "日付", "date"]) {
        "DateTime"
    } else if any(&["数", "number", "値", "value", "容量", "capacity", "人数"]) {
        "Number"
    } else if any(&["true", "false", "boolean", "有無", "フラグ"]) {
        "Boolean"
    } else {
        "Text"
    }
}

fn is_required(name: &str, text: &str) -> bool {
    let any = |keywords: &[&str]| keywords.iter().any(|k| text.contains(k));
    if any(&["必須", "required", "id", "識別子", "type", "種別"]) {
        true
    } else if any(&["任意", "optional", "可能", "オプション"]) {
        false
    } else {
        ["id", "type", "name", "識別子", "種別", "名称"].contains(&name.to_lowercase().as_str())
    }
}

/// Up to ten field hints from `text`, ASCII-style lines first.
pub fn extract_fields(text: &str) -> Vec<ExtractedField> {
    let mut fields = Vec::new();
    for pattern in [&*ASCII_FIELD, &*BULLET_FIELD] {
        for caps in pattern.captures_iter(text) {
            let raw_name = caps[1].trim();
            let description = caps[2].trim();
            if raw_name.chars().count() <= 1 || description.chars().count() <= 1 {
                continue;
            }
            let lowered = format!("{} {}", raw_name, description).to_lowercase();
            fields.push(ExtractedField {
                name: normalize_field_name(raw_name),
                description: description.chars().take(MAX_DESCRIPTION_CHARS).collect(),
                kind: guess_data_type(&lowered).to_string(),
                required: is_required(raw_name, &lowered),
            });
        }
    }
    fields.truncate(MAX_FIELDS);
    fields
}

/// Add fields missing from `spec`. Returns how many were added.
pub fn enrich_spec(spec: &mut EntitySpec, fields: &[ExtractedField]) -> usize {
    let mut added = 0;
    for field in fields {
        if spec.has_attribute(&field.name) {
            continue;
        }
        spec.set_attribute(
            &field.name,
            AttributeSpec::new(&field.kind, &field.description).required(field.required),
        );
        added += 1;
    }
    added
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_field_name() {
        assert_eq!(normalize_field_name("施設名称"), "name");
        assert_eq!(normalize_field_name("設置ID"), "id");
        assert_eq!(normalize_field_name("Opening-Hours "), "opening_hours");
        assert_eq!(normalize_field_name("備考"), "unknown_field");
    }

    #[test]
    fn test_guess_data_type() {
        assert_eq!(guess_data_type("location 緯度経度"), "geo:json");
        assert_eq!(guess_data_type("dateobserved 観測日"), "DateTime");
        assert_eq!(guess_data_type("capacity 収容人数"), "Number");
        assert_eq!(guess_data_type("open 開設有無"), "Boolean");
        assert_eq!(guess_data_type("remarks 備考"), "Text");
    }

    #[test]
    fn test_extract_fields() {
        let text = "capacity: 収容可能人数\n・施設名称：避難所の名前\nx: too short\nnote: a\n";
        let fields = extract_fields(text);
        assert_eq!(fields.len(), 2);

        assert_eq!(fields[0].name, "capacity");
        assert_eq!(fields[0].kind, "Number");
        assert!(!fields[0].required);

        assert_eq!(fields[1].name, "name");
        assert_eq!(fields[1].description, "避難所の名前");
    }

    #[test]
    fn test_extract_fields_caps() {
        let long = "あ".repeat(300);
        let text: String = (0..15).map(|i| format!("field_{}: {}\n", i, long)).collect();
        let fields = extract_fields(&text);
        assert_eq!(fields.len(), MAX_FIELDS);
        assert_eq!(fields[0].description.chars().count(), MAX_DESCRIPTION_CHARS);
    }

    #[test]
    fn test_enrich_spec_keeps_existing() {
        let mut spec = EntitySpec::new("Aed", "AED");
        spec.set_attribute("name", AttributeSpec::new("Text", "名称"));
        let fields = extract_fields("name: 施設名\nopening_hours: 開館時刻\n");
        let added = enrich_spec(&mut spec, &fields);
        assert_eq!(added, 1);
        assert_eq!(spec.attribute("name").unwrap().description, "名称");
        assert_eq!(spec.attribute("opening_hours").unwrap().kind, "DateTime");
    }
}
