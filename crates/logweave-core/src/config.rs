//! The configuration document.
//!
//! A document has three sections that the logger factory reads:
//!
//! - `channels`: channel name → channel spec
//! - `handlers`: handler name → component spec
//! - `processors`: processor name → component spec
//!
//! Every other top-level key is kept as a read-only setting. Section entries
//! stay raw (`serde_json::Value`) and are parsed into typed specs only when a
//! channel or component is requested, so a broken entry only fails the
//! channels that use it.
//!
//! ## Example
//!
//! ```rust
//! use logweave_core::config::ConfigDocument;
//!
//! let doc = ConfigDocument::from_yaml(r#"
//! channels:
//!   app:
//!     handlers: [main]
//! handlers:
//!   main:
//!     type: stream
//!     file: /var/log/app.log
//! "#)?;
//!
//! assert!(doc.channel("app").is_some());
//! # Ok::<(), logweave_types::LogweaveError>(())
//! ```

use indexmap::IndexMap;
use logweave_types::{ChannelSpec, LogweaveError, Result, Section};
use serde_json::{Map, Value};
use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::util::data::{load_yaml, load_yaml_file, to_yaml_string};

/// Environment variable naming an explicit configuration file.
pub const CONFIG_ENV_VAR: &str = "LOGWEAVE_CONFIG";

/// File name of the site configuration.
pub const PRIMARY_FILE: &str = "logweave.yaml";

/// File name of the distributed default configuration.
pub const FALLBACK_FILE: &str = "logweave.dist.yaml";

/// Parsed configuration document.
#[derive(Debug, Clone, Default)]
pub struct ConfigDocument {
    channels: IndexMap<String, Value>,
    handlers: IndexMap<String, Value>,
    processors: IndexMap<String, Value>,
    settings: Map<String, Value>,
    source: Option<PathBuf>,
}

impl ConfigDocument {
    /// Build a document from an already parsed nested mapping.
    pub fn from_value(value: Value) -> Result<Self> {
        let mut root = match value {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                return Err(LogweaveError::Config(format!(
                    "Top level of the logging configuration must be a mapping, got {}",
                    other
                )))
            }
        };

        let channels = take_section(&mut root, "channels")?;
        let handlers = take_section(&mut root, Section::Handlers.key())?;
        let processors = take_section(&mut root, Section::Processors.key())?;

        Ok(Self {
            channels,
            handlers,
            processors,
            settings: root,
            source: None,
        })
    }

    /// Parse a YAML document.
    pub fn from_yaml(content: &str) -> Result<Self> {
        Self::from_value(load_yaml(content)?)
    }

    /// Load a YAML document from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut doc = Self::from_value(load_yaml_file(path)?)?;
        doc.source = Some(path.to_path_buf());
        debug!(
            "Loaded logging configuration from {} ({} channels, {} handlers, {} processors)",
            path.display(),
            doc.channels.len(),
            doc.handlers.len(),
            doc.processors.len()
        );
        Ok(doc)
    }

    /// Raw channel entry.
    pub fn channel(&self, name: &str) -> Option<&Value> {
        self.channels.get(name)
    }

    /// Store a channel spec under `name`, replacing any existing entry.
    pub fn insert_channel(&mut self, name: &str, spec: &ChannelSpec) -> Result<()> {
        let value = serde_json::to_value(spec)?;
        self.channels.insert(name.to_string(), value);
        Ok(())
    }

    /// Raw component entry of a section.
    pub fn component(&self, section: Section, name: &str) -> Option<&Value> {
        match section {
            Section::Handlers => self.handlers.get(name),
            Section::Processors => self.processors.get(name),
        }
    }

    /// Configured channel names, in declaration order.
    pub fn channel_names(&self) -> impl Iterator<Item = &str> {
        self.channels.keys().map(String::as_str)
    }

    /// Top-level settings other than the three sections.
    pub fn settings(&self) -> &Map<String, Value> {
        &self.settings
    }

    /// A single top-level setting.
    pub fn setting(&self, key: &str) -> Option<&Value> {
        self.settings.get(key)
    }

    /// File the document was loaded from.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// The whole document as a nested mapping.
    pub fn to_value(&self) -> Value {
        let mut root = self.settings.clone();
        root.insert("channels".to_string(), section_value(&self.channels));
        root.insert("handlers".to_string(), section_value(&self.handlers));
        root.insert("processors".to_string(), section_value(&self.processors));
        Value::Object(root)
    }

    /// YAML rendering of the whole document, for error reports.
    pub fn snapshot(&self) -> String {
        to_yaml_string(&self.to_value())
    }
}

fn take_section(root: &mut Map<String, Value>, key: &str) -> Result<IndexMap<String, Value>> {
    match root.remove(key) {
        None | Some(Value::Null) => Ok(IndexMap::new()),
        Some(Value::Object(entries)) => Ok(entries.into_iter().collect()),
        Some(other) => Err(LogweaveError::Config(format!(
            "Section '{}' must be a mapping, got {}",
            key, other
        ))),
    }
}

fn section_value(section: &IndexMap<String, Value>) -> Value {
    Value::Object(section.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
}

/// Locates the configuration file: an explicit path from the environment,
/// else the site file, else the distributed default next to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLocator {
    primary: PathBuf,
    fallback: PathBuf,
}

impl ConfigLocator {
    /// Locator for an explicit primary/fallback pair.
    pub fn new(primary: impl Into<PathBuf>, fallback: impl Into<PathBuf>) -> Self {
        Self {
            primary: primary.into(),
            fallback: fallback.into(),
        }
    }

    /// Locator for `logweave.yaml` / `logweave.dist.yaml` in a directory.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self::new(dir.join(PRIMARY_FILE), dir.join(FALLBACK_FILE))
    }

    /// Path to load, honouring `LOGWEAVE_CONFIG`.
    pub fn resolve(&self) -> Result<PathBuf> {
        self.resolve_with(env::var_os(CONFIG_ENV_VAR).map(PathBuf::from))
    }

    /// Path to load, given an explicit override.
    pub fn resolve_with(&self, explicit: Option<PathBuf>) -> Result<PathBuf> {
        if let Some(path) = explicit {
            if path.is_file() {
                return Ok(path);
            }
            return Err(LogweaveError::Config(format!(
                "{} points to {}, which does not exist",
                CONFIG_ENV_VAR,
                path.display()
            )));
        }

        if self.primary.is_file() {
            return Ok(self.primary.clone());
        }

        if self.fallback.is_file() {
            debug!(
                "{} not found, using distributed default {}",
                self.primary.display(),
                self.fallback.display()
            );
            return Ok(self.fallback.clone());
        }

        Err(LogweaveError::Config(format!(
            "No logging configuration found: neither {} nor {} exists",
            self.primary.display(),
            self.fallback.display()
        )))
    }

    /// Resolve and load the document.
    ///
    /// Parse failures are returned as-is: a broken configuration must stop
    /// startup rather than silently fall back.
    pub fn load(&self) -> Result<ConfigDocument> {
        ConfigDocument::load(self.resolve()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_sections_and_settings() {
        let doc = ConfigDocument::from_value(json!({
            "channels": {"app": {"handlers": ["main"]}},
            "handlers": {"main": {"type": "null"}},
            "diagnostics": {"level": "debug"},
        }))
        .unwrap();

        assert_eq!(doc.channel_names().collect::<Vec<_>>(), vec!["app"]);
        assert!(doc.component(Section::Handlers, "main").is_some());
        assert!(doc.component(Section::Processors, "main").is_none());
        assert_eq!(doc.setting("diagnostics"), Some(&json!({"level": "debug"})));
    }

    #[test]
    fn test_section_must_be_mapping() {
        let err = ConfigDocument::from_value(json!({"handlers": ["main"]})).unwrap_err();
        assert!(matches!(err, LogweaveError::Config(_)));
    }

    #[test]
    fn test_insert_channel_and_snapshot() {
        let mut doc = ConfigDocument::default();
        doc.insert_channel("billing", &ChannelSpec::fallback("billing")).unwrap();

        assert_eq!(doc.channel("billing"), Some(&json!({"extends": "other"})));
        let snapshot = doc.snapshot();
        assert!(snapshot.contains("billing"));
        assert!(snapshot.contains("extends: other"));
    }

    #[test]
    fn test_locator_prefers_primary() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(PRIMARY_FILE), "channels: {}\n").unwrap();
        fs::write(temp_dir.path().join(FALLBACK_FILE), "channels: {}\n").unwrap();

        let locator = ConfigLocator::in_dir(temp_dir.path());
        assert_eq!(
            locator.resolve_with(None).unwrap(),
            temp_dir.path().join(PRIMARY_FILE)
        );
    }

    #[test]
    fn test_locator_falls_back_to_dist() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join(FALLBACK_FILE),
            "channels:\n  app: {}\n",
        )
        .unwrap();

        let locator = ConfigLocator::in_dir(temp_dir.path());
        let path = locator.resolve_with(None).unwrap();
        assert_eq!(path, temp_dir.path().join(FALLBACK_FILE));

        let doc = ConfigDocument::load(&path).unwrap();
        assert!(doc.channel("app").is_some());
        assert_eq!(doc.source(), Some(path.as_path()));
    }

    #[test]
    fn test_locator_explicit_override() {
        let temp_dir = TempDir::new().unwrap();
        let explicit = temp_dir.path().join("custom.yaml");
        fs::write(&explicit, "channels: {}\n").unwrap();

        let locator = ConfigLocator::in_dir(temp_dir.path());
        assert_eq!(locator.resolve_with(Some(explicit.clone())).unwrap(), explicit);
        assert!(locator
            .resolve_with(Some(temp_dir.path().join("missing.yaml")))
            .is_err());
    }

    #[test]
    fn test_missing_configuration_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let locator = ConfigLocator::in_dir(temp_dir.path());
        assert!(matches!(locator.resolve_with(None), Err(LogweaveError::Config(_))));
    }

    #[test]
    fn test_parse_failure_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(PRIMARY_FILE);
        fs::write(&path, "channels: [broken").unwrap();

        assert!(ConfigDocument::load(&path).is_err());
    }
}
