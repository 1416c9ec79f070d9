//! Diagnostics output for Logweave itself.
//!
//! The factory reports what it resolves through `tracing`. These helpers
//! install a subscriber for those events; applications that already have
//! one simply skip them.

use logweave_types::{LogweaveError, Result};
use serde::Deserialize;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::ConfigDocument;

/// Key of the diagnostics block among the document's top-level settings.
pub const DIAGNOSTICS_KEY: &str = "diagnostics";

/// Diagnostics output settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DiagnosticsConfig {
    /// Filter directive, e.g. `logweave=debug`
    #[serde(default = "default_filter")]
    pub filter: String,
    /// Output format
    #[serde(default)]
    pub format: DiagnosticsFormat,
    /// Optional file to write diagnostics to instead of stderr
    #[serde(default)]
    pub path: Option<PathBuf>,
}

fn default_filter() -> String {
    "logweave=info".to_string()
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
            format: DiagnosticsFormat::default(),
            path: None,
        }
    }
}

/// Diagnostics output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticsFormat {
    /// Human-readable format
    #[default]
    Pretty,
    /// JSON format for machine parsing
    Json,
    /// Compact single-line format
    Compact,
}

impl DiagnosticsConfig {
    /// Read the `diagnostics` block of a document, if present.
    pub fn from_document(doc: &ConfigDocument) -> Result<Self> {
        match doc.setting(DIAGNOSTICS_KEY) {
            None => Ok(Self::default()),
            Some(value) => serde_json::from_value(value.clone()).map_err(|e| {
                LogweaveError::Config(format!("Invalid '{}' settings: {}", DIAGNOSTICS_KEY, e))
            }),
        }
    }
}

/// Initialize diagnostics with the default configuration.
///
/// `RUST_LOG` takes precedence over the built-in filter.
pub fn init_default() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter()));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_filter(filter))
        .try_init()
        .map_err(|e| LogweaveError::Config(format!("Failed to install diagnostics subscriber: {}", e)))
}

/// Initialize diagnostics from configuration.
///
/// When output goes to a file, the returned guard must be kept alive for
/// buffered lines to be flushed.
pub fn init_from_config(config: &DiagnosticsConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_new(&config.filter)
        .map_err(|e| LogweaveError::Config(format!("Invalid diagnostics filter '{}': {}", config.filter, e)))?;

    let (writer, guard) = match &config.path {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."));
            let file_name = path.file_name().ok_or_else(|| {
                LogweaveError::Config(format!("Diagnostics path {} has no file name", path.display()))
            })?;
            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (fmt::writer::BoxMakeWriter::new(writer), Some(guard))
        }
        None => (fmt::writer::BoxMakeWriter::new(std::io::stderr), None),
    };

    let layer = match config.format {
        DiagnosticsFormat::Pretty => fmt::layer().with_writer(writer).boxed(),
        DiagnosticsFormat::Json => fmt::layer().json().with_writer(writer).boxed(),
        DiagnosticsFormat::Compact => fmt::layer().compact().with_writer(writer).boxed(),
    };

    tracing_subscriber::registry()
        .with(layer.with_filter(filter))
        .try_init()
        .map_err(|e| LogweaveError::Config(format!("Failed to install diagnostics subscriber: {}", e)))?;

    Ok(guard)
}
