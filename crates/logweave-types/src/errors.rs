//! Error types for Logweave operations.

use std::fmt;
use thiserror::Error;

/// Configuration section a component reference is resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    /// The `handlers` section (sinks)
    Handlers,
    /// The `processors` section (enrichers)
    Processors,
}

impl Section {
    /// Key of this section in the configuration document.
    pub fn key(&self) -> &'static str {
        match self {
            Section::Handlers => "handlers",
            Section::Processors => "processors",
        }
    }

    /// Suffix appended to a `type` tag to form a class name.
    pub fn class_suffix(&self) -> &'static str {
        match self {
            Section::Handlers => "Handler",
            Section::Processors => "Processor",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// The main error type for Logweave operations.
///
/// Every failure that aborts a `get_logger` call is one of the taxonomy
/// variants below, possibly wrapped in [`LogweaveError::Component`] (naming
/// the component being built) and, at the outermost call, in
/// [`LogweaveError::Resolution`] (naming the channel and carrying the full
/// configuration snapshot). Use [`LogweaveError::root`] to get at the
/// underlying cause.
#[derive(Error, Debug)]
pub enum LogweaveError {
    /// A channel's extends chain refers back to a channel already being built
    #[error("Cyclic channel dependency: '{channel}' requested while building '{requested_by}' (chain: {})", .chain.join(" -> "))]
    CyclicChannelDependency {
        /// Channel that was requested a second time
        channel: String,
        /// Channel whose build triggered the nested request
        requested_by: String,
        /// Channels in progress, outermost first
        chain: Vec<String>,
    },

    /// A handler that, directly or transitively, wraps itself
    #[error("Cyclic component reference: {section} '{name}' wraps itself (chain: {})", .chain.join(" -> "))]
    CyclicComponentReference {
        /// Section the reference was resolved against
        section: Section,
        /// Name that was referenced a second time
        name: String,
        /// Named references in progress, outermost first
        chain: Vec<String>,
    },

    /// A handler/processor name is referenced but not defined
    #[error("Undefined component reference: no entry '{name}' in section '{section}'")]
    UndefinedComponentReference {
        /// Section that was searched
        section: Section,
        /// Name that was not found
        name: String,
    },

    /// A component spec has neither `type` nor `class`
    #[error("Component spec in '{section}' has neither 'type' nor 'class'")]
    MissingTypeOrClass {
        /// Section the spec belongs to
        section: Section,
    },

    /// `type`/`class` does not name a registered implementation
    #[error("Unknown {section} class '{class}'")]
    UnknownComponentClass {
        /// Section the spec belongs to
        section: Section,
        /// Class name after `type` derivation
        class: String,
    },

    /// A required constructor parameter has no value and no default
    #[error("Missing required parameter '{parameter}' for {target}")]
    MissingRequiredParameter {
        /// Parameter name
        parameter: String,
        /// Target class name
        target: String,
    },

    /// A configured parameter value has the wrong shape
    #[error("Invalid value for parameter '{parameter}' of {target}: {reason}")]
    InvalidParameter {
        /// Parameter name
        parameter: String,
        /// Target class name
        target: String,
        /// What was wrong with the value
        reason: String,
    },

    /// More positional `arguments` than the target declares parameters
    #[error("{target} takes {expected} argument(s) but {given} were given")]
    TooManyArguments {
        /// Target class name
        target: String,
        /// Declared parameter count
        expected: usize,
        /// Positional values configured
        given: usize,
    },

    /// A level name is not in the fixed severity set
    #[error("Unknown log level '{0}'")]
    UnknownLevel(String),

    /// A `handlers`/`processors` entry of a channel is not a sequence
    #[error("Channel '{channel}': '{section}' must be a list of component references")]
    InvalidComponentListShape {
        /// Channel being resolved
        channel: String,
        /// Offending key
        section: Section,
    },

    /// A channel entry that cannot be read as a channel spec
    #[error("Channel '{channel}' is malformed: {reason}")]
    InvalidChannelSpec {
        /// Channel being resolved
        channel: String,
        /// Deserialization failure
        reason: String,
    },

    /// Context wrapper naming the component that failed to build
    #[error("Failed to build {section} component {reference}: {source}")]
    Component {
        /// Section of the component
        section: Section,
        /// Name of the reference, or `<inline>`
        reference: String,
        /// Underlying failure
        #[source]
        source: Box<LogweaveError>,
    },

    /// Outermost wrapper of a failed `get_logger` call
    #[error("Failed to resolve logger channel '{channel}': {source}")]
    Resolution {
        /// Channel that was requested by the caller
        channel: String,
        /// YAML rendering of the configuration document at failure time
        snapshot: String,
        /// Underlying failure
        #[source]
        source: Box<LogweaveError>,
    },

    /// Configuration loading error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A sink failed while writing or flushing a record
    #[error("Sink error: {0}")]
    Sink(String),

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON conversion error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LogweaveError {
    /// Strip the `Resolution`/`Component` context wrappers.
    pub fn root(&self) -> &LogweaveError {
        match self {
            LogweaveError::Component { source, .. } | LogweaveError::Resolution { source, .. } => {
                source.root()
            }
            other => other,
        }
    }

    /// Configuration snapshot carried by a top-level resolution failure.
    pub fn snapshot(&self) -> Option<&str> {
        match self {
            LogweaveError::Resolution { snapshot, .. } => Some(snapshot),
            _ => None,
        }
    }

    /// Wrap this error with the component that was being built.
    pub fn in_component(self, section: Section, reference: impl Into<String>) -> Self {
        LogweaveError::Component {
            section,
            reference: reference.into(),
            source: Box::new(self),
        }
    }
}

/// A specialized Result type for Logweave operations.
pub type Result<T> = std::result::Result<T, LogweaveError>;

/// Helper macro to bail out with a `LogweaveError::Config`.
///
/// # Example
///
/// ```ignore
/// if !path.exists() {
///     bail!("No configuration file at {}", path.display());
/// }
/// ```
#[macro_export]
macro_rules! bail {
    ($msg:expr) => {
        return Err($crate::LogweaveError::Config($msg.to_string()))
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::LogweaveError::Config(format!($fmt, $($arg)*)))
    };
}
