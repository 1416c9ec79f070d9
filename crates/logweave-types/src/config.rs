//! Configuration types and structures.
//!
//! These are the typed views over entries of the configuration document.
//! The document itself keeps raw values and parses an entry only when a
//! channel or component is actually requested.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use crate::errors::{LogweaveError, Result, Section};
use crate::level::Level;

/// Channel every unconfigured name falls back to.
pub const OTHER_CHANNEL: &str = "other";

/// Channel used when no name is requested.
pub const DEFAULT_CHANNEL: &str = "default";

/// Configuration of one channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelSpec {
    /// Parent channel whose components prefix this channel's
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,

    /// Whether records get microsecond timestamps
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_microseconds: Option<bool>,

    /// Process error handler registration
    #[serde(default, alias = "register_php_handlers", skip_serializing_if = "Option::is_none")]
    pub register_error_handler: Option<RegisterErrorHandler>,

    /// Handler references, kept raw until the shape is checked
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handlers: Option<Value>,

    /// Processor references, kept raw until the shape is checked
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processors: Option<Value>,
}

impl ChannelSpec {
    /// Parse a raw channel entry.
    pub fn from_value(channel: &str, value: &Value) -> Result<Self> {
        let invalid = |reason: String| LogweaveError::InvalidChannelSpec {
            channel: channel.to_string(),
            reason,
        };

        match value {
            // A bare `name:` entry in YAML is null and means "no settings".
            Value::Null => Ok(Self::default()),
            // serde would also read a sequence as the fields in order.
            Value::Object(_) => {
                serde_json::from_value(value.clone()).map_err(|e| invalid(e.to_string()))
            }
            other => Err(invalid(format!("expected a mapping, got {}", other))),
        }
    }

    /// Spec synthesized for a channel name that has no entry.
    ///
    /// `default` and `other` resolve to an empty logger; every other name
    /// inherits from `other`.
    pub fn fallback(channel: &str) -> Self {
        match channel {
            DEFAULT_CHANNEL | OTHER_CHANNEL => Self::default(),
            _ => Self {
                extends: Some(OTHER_CHANNEL.to_string()),
                ..Self::default()
            },
        }
    }

    /// Component references of one section, in declaration order.
    pub fn component_refs(&self, channel: &str, section: Section) -> Result<Vec<ComponentRef>> {
        let raw = match section {
            Section::Handlers => &self.handlers,
            Section::Processors => &self.processors,
        };

        let entries = match raw {
            None | Some(Value::Null) => return Ok(Vec::new()),
            Some(Value::Array(entries)) => entries,
            Some(_) => {
                return Err(LogweaveError::InvalidComponentListShape {
                    channel: channel.to_string(),
                    section,
                })
            }
        };

        entries
            .iter()
            .map(|entry| {
                ComponentRef::from_value(entry).ok_or_else(|| {
                    LogweaveError::InvalidComponentListShape {
                        channel: channel.to_string(),
                        section,
                    }
                })
            })
            .collect()
    }

    /// Error handler options, if registration is enabled.
    pub fn error_handler_options(&self) -> Option<ErrorHandlerOptions> {
        match &self.register_error_handler {
            Some(RegisterErrorHandler::Enabled(true)) => Some(ErrorHandlerOptions::default()),
            Some(RegisterErrorHandler::Options(options)) => Some(options.clone()),
            _ => None,
        }
    }
}

/// Either `true`/`false` or a full options mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RegisterErrorHandler {
    /// Shorthand switch; `true` uses default options
    Enabled(bool),
    /// Explicit options
    Options(ErrorHandlerOptions),
}

/// Options passed to the process error handler registrar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorHandlerOptions {
    /// Level per error type, overriding the registrar's own mapping
    #[serde(default)]
    pub level_map: IndexMap<String, Level>,

    /// Whether the previously installed handler is still invoked
    #[serde(default = "default_call_previous")]
    pub call_previous: bool,

    /// Error types to capture
    #[serde(default)]
    pub error_types: ErrorTypes,

    /// Only handle errors that would have been reported anyway. Every panic
    /// is reported, so the panic hook logs regardless of this flag.
    #[serde(default)]
    pub handle_only_reported_errors: bool,
}

fn default_call_previous() -> bool {
    true
}

impl Default for ErrorHandlerOptions {
    fn default() -> Self {
        Self {
            level_map: IndexMap::new(),
            call_previous: true,
            error_types: ErrorTypes::default(),
            handle_only_reported_errors: false,
        }
    }
}

/// Error type filter: `"all"` or an explicit list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorTypes {
    /// A single keyword, usually `all`
    Keyword(String),
    /// Explicit list of type names
    List(Vec<String>),
}

impl ErrorTypes {
    /// Whether errors of the given type are captured.
    pub fn includes(&self, error_type: &str) -> bool {
        match self {
            ErrorTypes::Keyword(keyword) => keyword == "all" || keyword == error_type,
            ErrorTypes::List(types) => types.iter().any(|t| t == "all" || t == error_type),
        }
    }
}

impl Default for ErrorTypes {
    fn default() -> Self {
        ErrorTypes::Keyword("all".to_string())
    }
}

/// Reference to a component: a name in its section, or an inline spec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ComponentRef {
    /// Name to dereference in the section
    Named(String),
    /// Spec given in place
    Inline(ComponentSpec),
}

impl ComponentRef {
    /// Read a reference from a raw value; `None` for anything that is
    /// neither a string nor a mapping.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(name) => Some(ComponentRef::Named(name.clone())),
            Value::Object(map) => Some(ComponentRef::Inline(ComponentSpec::from_map(map.clone()))),
            _ => None,
        }
    }

    /// Label used in diagnostics.
    pub fn label(&self) -> String {
        match self {
            ComponentRef::Named(name) => format!("'{}'", name),
            ComponentRef::Inline(_) => "<inline>".to_string(),
        }
    }
}

impl From<&str> for ComponentRef {
    fn from(name: &str) -> Self {
        ComponentRef::Named(name.to_string())
    }
}

/// Configuration of one handler or processor.
///
/// The well-known keys are split out; everything else stays in `params`
/// for name-binding against the target's descriptor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentSpec {
    /// Short type tag, turned into a class name by convention
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_tag: Option<String>,

    /// Explicit class name, overrides `type`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,

    /// Minimum level, a name or a numeric rank
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<Value>,

    /// Whether handled records continue to later handlers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bubble: Option<Value>,

    /// Positional constructor arguments, bypassing name-binding
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Vec<Value>>,

    /// Named parameters
    #[serde(flatten)]
    pub params: Map<String, Value>,
}

impl ComponentSpec {
    /// Split a raw mapping into a spec. Well-known keys of the wrong type
    /// are left in `params` and reported when the spec is built.
    pub fn from_map(mut map: Map<String, Value>) -> Self {
        let type_tag = take_string(&mut map, "type");
        let class = take_string(&mut map, "class");
        let level = map.remove("level").filter(|v| !v.is_null());
        let bubble = map.remove("bubble").filter(|v| !v.is_null());
        let arguments = match map.remove("arguments") {
            Some(Value::Array(values)) => Some(values),
            Some(Value::Null) | None => None,
            Some(other) => {
                map.insert("arguments".to_string(), other);
                None
            }
        };

        Self {
            type_tag,
            class,
            level,
            bubble,
            arguments,
            params: map,
        }
    }

    /// Parse a raw section entry.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self::from_map(map.clone())),
            _ => None,
        }
    }

    /// Named parameter value, ignoring explicit nulls.
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.get(name).filter(|v| !v.is_null())
    }

    /// The whole spec as a single mapping.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

fn take_string(map: &mut Map<String, Value>, key: &str) -> Option<String> {
    match map.remove(key) {
        Some(Value::String(s)) => Some(s),
        Some(Value::Null) | None => None,
        Some(other) => {
            map.insert(key.to_string(), other);
            None
        }
    }
}
