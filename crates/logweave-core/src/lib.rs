//! # Logweave Core
//!
//! Configuration document handling and diagnostics setup for Logweave.
//!
//! This crate provides:
//!
//! - **Configuration**: the `channels` / `handlers` / `processors` document,
//!   loaded from YAML with site-file / distributed-default resolution
//! - **Diagnostics**: `tracing` subscriber setup for the factory's own events
//! - **Data utilities**: YAML loading and rendering helpers
//!
//! ## Example
//!
//! ```rust,no_run
//! use logweave_core::config::ConfigLocator;
//! use logweave_core::log::{self, DiagnosticsConfig};
//!
//! let doc = ConfigLocator::in_dir("/etc/myapp").load()?;
//! let _guard = log::init_from_config(&DiagnosticsConfig::from_document(&doc)?)?;
//! # Ok::<(), logweave_types::LogweaveError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod log;
pub mod util;

// Re-export commonly used items
pub use config::{ConfigDocument, ConfigLocator};
pub use logweave_types::{LogweaveError, Result};

/// Logweave version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
