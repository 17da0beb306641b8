//! Field Catalog
//!
//! Per-index field list used as context when drafting queries. Stored as
//! `{index_pattern: {field: {type, searchable, aggregatable}}}`.

use crate::error::{CopilotError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldInfo {
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub searchable: bool,
    #[serde(default)]
    pub aggregatable: bool,
}

pub type IndexFields = BTreeMap<String, FieldInfo>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldCatalog {
    indices: BTreeMap<String, IndexFields>,
}

impl FieldCatalog {
    /// Load a catalog file. A missing file gives an empty catalog.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            warn!("Field catalog not found at {}", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let catalog: FieldCatalog = serde_json::from_str(&content).map_err(|e| {
            CopilotError::Catalog(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        info!("Loaded field catalog with {} index pattern(s)", catalog.indices.len());
        Ok(catalog)
    }

    /// Write pretty JSON, creating parent directories as needed.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Build a single-index catalog from a `_field_caps` response.
    pub fn from_field_caps(index: &str, caps: &Value) -> Self {
        let mut fields = IndexFields::new();
        if let Some(entries) = caps.get("fields").and_then(Value::as_object) {
            for (name, by_type) in entries {
                if name.starts_with('_') {
                    continue;
                }
                // first type wins; one index rarely maps a field twice
                let Some(details) = by_type.as_object().and_then(|m| m.values().next()) else {
                    continue;
                };
                fields.insert(
                    name.clone(),
                    FieldInfo {
                        field_type: details
                            .get("type")
                            .and_then(Value::as_str)
                            .unwrap_or("unknown")
                            .to_string(),
                        searchable: details.get("searchable").and_then(Value::as_bool).unwrap_or(false),
                        aggregatable: details.get("aggregatable").and_then(Value::as_bool).unwrap_or(false),
                    },
                );
            }
        }

        let mut indices = BTreeMap::new();
        indices.insert(index.to_string(), fields);
        Self { indices }
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Fields for `index`. Falls back to the only entry when the catalog holds
    /// a single index pattern.
    pub fn index_fields(&self, index: &str) -> Option<&IndexFields> {
        self.indices.get(index).or_else(|| {
            if self.indices.len() == 1 {
                self.indices.values().next()
            } else {
                None
            }
        })
    }

    pub fn field_count(&self, index: &str) -> usize {
        self.index_fields(index).map_or(0, |f| f.len())
    }

    pub fn has_field(&self, index: &str, field: &str) -> bool {
        self.index_fields(index).is_some_and(|f| f.contains_key(field))
    }

    pub fn field_type(&self, index: &str, field: &str) -> Option<&str> {
        self.index_fields(index)
            .and_then(|f| f.get(field))
            .map(|info| info.field_type.as_str())
    }

    /// JSON rendering of the fields for `index`, cut to `max_chars` characters.
    pub fn truncated_json(&self, index: &str, max_chars: usize) -> String {
        let rendered = match self.index_fields(index) {
            Some(fields) => serde_json::to_string(fields).unwrap_or_else(|_| "{}".to_string()),
            None => "{}".to_string(),
        };
        match rendered.char_indices().nth(max_chars) {
            Some((cut, _)) => rendered[..cut].to_string(),
            None => rendered,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn caps() -> Value {
        json!({
            "indices": ["orders-2024"],
            "fields": {
                "_id": {"_id": {"type": "_id", "searchable": true, "aggregatable": false}},
                "status": {"text": {"type": "text", "searchable": true, "aggregatable": false}},
                "status.keyword": {"keyword": {"type": "keyword", "searchable": true, "aggregatable": true}},
                "amount": {"double": {"type": "double", "searchable": true, "aggregatable": true}}
            }
        })
    }

    #[test]
    fn test_from_field_caps_skips_metadata() {
        let catalog = FieldCatalog::from_field_caps("orders-*", &caps());
        assert_eq!(catalog.field_count("orders-*"), 3);
        assert!(!catalog.has_field("orders-*", "_id"));
        assert_eq!(catalog.field_type("orders-*", "status.keyword"), Some("keyword"));
        assert!(catalog.index_fields("orders-*").unwrap()["amount"].aggregatable);
    }

    #[test]
    fn test_single_index_fallback() {
        let catalog = FieldCatalog::from_field_caps("orders-*", &caps());
        assert_eq!(catalog.field_type("orders-2024.01", "amount"), Some("double"));

        let mut two = catalog.clone();
        two.indices.insert("users".to_string(), IndexFields::new());
        assert!(two.index_fields("orders-2024.01").is_none());
        assert_eq!(two.field_count("users"), 0);
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let catalog = FieldCatalog::load(dir.path().join("missing.json")).unwrap();
        assert!(catalog.is_empty());
        assert_eq!(catalog.truncated_json("orders", 100), "{}");
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data").join("field_catalog.json");
        let catalog = FieldCatalog::from_field_caps("orders-*", &caps());
        catalog.save(&path).unwrap();

        let loaded = FieldCatalog::load(&path).unwrap();
        assert_eq!(loaded, catalog);
    }

    #[test]
    fn test_bad_file_is_catalog_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("field_catalog.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(FieldCatalog::load(&path), Err(CopilotError::Catalog(_))));
    }

    #[test]
    fn test_truncation_is_char_safe() {
        let mut fields = IndexFields::new();
        fields.insert(
            "상태".to_string(),
            FieldInfo {
                field_type: "keyword".to_string(),
                searchable: true,
                aggregatable: true,
            },
        );
        let mut indices = BTreeMap::new();
        indices.insert("orders".to_string(), fields);
        let catalog = FieldCatalog { indices };

        let cut = catalog.truncated_json("orders", 3);
        assert_eq!(cut, "{\"상");
        assert!(catalog.truncated_json("orders", 10_000).ends_with('}'));
    }
}
