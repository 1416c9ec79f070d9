//! YAML data handling utilities.

use logweave_types::{LogweaveError, Result};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Load YAML from string.
///
/// An empty document loads as an empty mapping.
pub fn load_yaml(content: &str) -> Result<Value> {
    if content.trim().is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    serde_yaml::from_str(content).map_err(LogweaveError::Yaml)
}

/// Load YAML from file.
pub fn load_yaml_file(path: impl AsRef<Path>) -> Result<Value> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| {
        LogweaveError::Config(format!("Failed to read {}: {}", path.display(), e))
    })?;
    load_yaml(&content).map_err(|e| {
        LogweaveError::Config(format!("Failed to parse {}: {}", path.display(), e))
    })
}

/// Render a value as YAML, falling back to JSON if YAML serialization fails.
pub fn to_yaml_string(value: &Value) -> String {
    serde_yaml::to_string(value).unwrap_or_else(|_| value.to_string())
}
