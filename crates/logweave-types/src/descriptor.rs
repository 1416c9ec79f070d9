//! Constructor descriptors for configurable components.
//!
//! Each component implementation publishes a [`HandlerDescriptor`] or
//! [`ProcessorDescriptor`]: its class name, the parameters its constructor
//! takes (name, kind, default) and a constructor function. The component builder binds configuration values
//! against the parameter table and hands the result to the constructor as
//! [`BoundArgs`].

use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;
use crate::errors::{LogweaveError, Result};
use crate::level::Level;
use crate::traits::{Handler, Processor};

/// How a parameter value is obtained from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Raw configured value
    Value,
    /// Level name or rank, mapped through the level table
    Level,
    /// Reference to another handler, built recursively
    Handler,
}

/// Value used when a parameter is not configured.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamDefault {
    /// No default; configuration must supply a value
    Required,
    /// Nullable, defaults to null
    Null,
    /// Boolean default
    Bool(bool),
    /// Integer default
    Int(i64),
    /// String default
    Str(&'static str),
    /// Level default
    Level(Level),
}

/// One constructor parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamDescriptor {
    /// Parameter name as written in configuration
    pub name: &'static str,
    /// Binding rule
    pub kind: ParamKind,
    /// Fallback when not configured
    pub default: ParamDefault,
}

impl ParamDescriptor {
    /// Required raw value.
    pub const fn required(name: &'static str) -> Self {
        Self { name, kind: ParamKind::Value, default: ParamDefault::Required }
    }

    /// Optional raw value defaulting to null.
    pub const fn nullable(name: &'static str) -> Self {
        Self { name, kind: ParamKind::Value, default: ParamDefault::Null }
    }

    /// Optional raw value with a default.
    pub const fn optional(name: &'static str, default: ParamDefault) -> Self {
        Self { name, kind: ParamKind::Value, default }
    }

    /// Required nested handler.
    pub const fn handler(name: &'static str) -> Self {
        Self { name, kind: ParamKind::Handler, default: ParamDefault::Required }
    }

    /// Level-valued parameter with a default.
    pub const fn level(name: &'static str, default: Level) -> Self {
        Self { name, kind: ParamKind::Level, default: ParamDefault::Level(default) }
    }

    /// Whether configuration must supply this parameter.
    pub fn is_required(&self) -> bool {
        self.default == ParamDefault::Required
    }

    /// Bound value for an unconfigured parameter, if it has one.
    pub fn default_value(&self) -> Option<BoundValue> {
        match self.default {
            ParamDefault::Required => None,
            ParamDefault::Null => Some(BoundValue::Null),
            ParamDefault::Bool(b) => Some(BoundValue::Value(Value::Bool(b))),
            ParamDefault::Int(n) => Some(BoundValue::Value(Value::from(n))),
            ParamDefault::Str(s) => Some(BoundValue::Value(Value::from(s))),
            ParamDefault::Level(level) => Some(BoundValue::Level(level)),
        }
    }
}

/// How configuration reaches the constructor.
#[derive(Debug, Clone, Copy)]
pub enum Binding {
    /// Bind each declared parameter by name
    Named(&'static [ParamDescriptor]),
    /// Pass the entire component spec as the single argument `spec`
    WholeSpec,
}

impl Binding {
    /// Declared parameters (empty for whole-spec targets).
    pub fn params(&self) -> &'static [ParamDescriptor] {
        match self {
            Binding::Named(params) => params,
            Binding::WholeSpec => &[],
        }
    }
}

/// Registered implementation of a handler class.
pub struct HandlerDescriptor {
    /// Class name, e.g. `StreamHandler`
    pub class: &'static str,
    /// Parameter binding
    pub binding: Binding,
    /// Bubble flag when the spec does not set one
    pub default_bubble: bool,
    /// Constructor
    pub construct: fn(BoundArgs) -> Result<Box<dyn Handler>>,
}

impl fmt::Debug for HandlerDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerDescriptor")
            .field("class", &self.class)
            .field("binding", &self.binding)
            .field("default_bubble", &self.default_bubble)
            .finish()
    }
}

/// Registered implementation of a processor class. Processors have no
/// level or bubble flag.
pub struct ProcessorDescriptor {
    /// Class name, e.g. `UidProcessor`
    pub class: &'static str,
    /// Parameter binding
    pub binding: Binding,
    /// Constructor
    pub construct: fn(BoundArgs) -> Result<Box<dyn Processor>>,
}

impl fmt::Debug for ProcessorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessorDescriptor")
            .field("class", &self.class)
            .field("binding", &self.binding)
            .finish()
    }
}

/// A resolved constructor argument.
#[derive(Debug)]
pub enum BoundValue {
    /// Explicit or defaulted null
    Null,
    /// Raw configuration value
    Value(Value),
    /// Level from the level table
    Level(Level),
    /// Fully built nested handler
    Handler(Box<dyn Handler>),
}

/// Constructor arguments after binding, keyed by parameter name.
#[derive(Debug)]
pub struct BoundArgs {
    target: &'static str,
    values: IndexMap<&'static str, BoundValue>,
}

impl BoundArgs {
    /// Empty argument set for a target class.
    pub fn new(target: &'static str) -> Self {
        Self { target, values: IndexMap::new() }
    }

    /// Class the arguments are bound for.
    pub fn target(&self) -> &'static str {
        self.target
    }

    /// Record a bound value.
    pub fn insert(&mut self, name: &'static str, value: BoundValue) {
        self.values.insert(name, value);
    }

    /// Number of bound parameters.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn invalid(&self, name: &str, reason: impl Into<String>) -> LogweaveError {
        LogweaveError::InvalidParameter {
            parameter: name.to_string(),
            target: self.target.to_string(),
            reason: reason.into(),
        }
    }

    fn take_value(&mut self, name: &str) -> Option<Value> {
        match self.values.shift_remove(name) {
            Some(BoundValue::Value(v)) => Some(v),
            Some(BoundValue::Level(level)) => Some(Value::from(level.name())),
            _ => None,
        }
    }

    /// Take a nested handler.
    pub fn take_handler(&mut self, name: &str) -> Result<Box<dyn Handler>> {
        match self.values.shift_remove(name) {
            Some(BoundValue::Handler(handler)) => Ok(handler),
            _ => Err(LogweaveError::MissingRequiredParameter {
                parameter: name.to_string(),
                target: self.target.to_string(),
            }),
        }
    }

    /// Take a level.
    pub fn take_level(&mut self, name: &str) -> Result<Option<Level>> {
        match self.values.shift_remove(name) {
            Some(BoundValue::Level(level)) => Ok(Some(level)),
            Some(BoundValue::Value(v)) => Level::from_value(&v).map(Some),
            _ => Ok(None),
        }
    }

    /// Take an optional string.
    pub fn take_string(&mut self, name: &str) -> Result<Option<String>> {
        match self.take_value(name) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(other) => Err(self.invalid(name, format!("expected a string, got {}", other))),
        }
    }

    /// Take a string that must be present.
    pub fn require_string(&mut self, name: &str) -> Result<String> {
        self.take_string(name)?.ok_or_else(|| LogweaveError::MissingRequiredParameter {
            parameter: name.to_string(),
            target: self.target.to_string(),
        })
    }

    /// Take an optional non-negative integer.
    pub fn take_u64(&mut self, name: &str) -> Result<Option<u64>> {
        match self.take_value(name) {
            None => Ok(None),
            Some(Value::Number(n)) => n
                .as_u64()
                .map(Some)
                .ok_or_else(|| self.invalid(name, format!("expected a non-negative integer, got {}", n))),
            Some(other) => Err(self.invalid(name, format!("expected an integer, got {}", other))),
        }
    }

    /// Take an optional boolean.
    pub fn take_bool(&mut self, name: &str) -> Result<Option<bool>> {
        match self.take_value(name) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(b)),
            Some(other) => Err(self.invalid(name, format!("expected a boolean, got {}", other))),
        }
    }

    /// Take an optional list of strings.
    pub fn take_strings(&mut self, name: &str) -> Result<Vec<String>> {
        match self.take_value(name) {
            None => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .into_iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s),
                    other => Err(self.invalid(name, format!("expected strings, got {}", other))),
                })
                .collect(),
            Some(Value::String(s)) => Ok(vec![s]),
            Some(other) => Err(self.invalid(name, format!("expected a list, got {}", other))),
        }
    }

    /// Take any raw value (used by whole-spec targets).
    pub fn take_raw(&mut self, name: &str) -> Option<Value> {
        self.take_value(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        assert!(ParamDescriptor::required("file").is_required());
        assert!(ParamDescriptor::required("file").default_value().is_none());
        assert!(matches!(
            ParamDescriptor::nullable("filePermission").default_value(),
            Some(BoundValue::Null)
        ));
        assert!(matches!(
            ParamDescriptor::optional("bufferLimit", ParamDefault::Int(0)).default_value(),
            Some(BoundValue::Value(v)) if v == json!(0)
        ));
    }

    #[test]
    fn test_typed_take() {
        let mut args = BoundArgs::new("BufferHandler");
        args.insert("bufferLimit", BoundValue::Value(json!(10)));
        args.insert("flushOnOverflow", BoundValue::Value(json!("yes")));
        args.insert("tags", BoundValue::Value(json!(["a", "b"])));
        args.insert("passthru", BoundValue::Null);

        assert_eq!(args.take_u64("bufferLimit").unwrap(), Some(10));
        assert!(matches!(
            args.take_bool("flushOnOverflow"),
            Err(LogweaveError::InvalidParameter { ref parameter, .. }) if parameter == "flushOnOverflow"
        ));
        assert_eq!(args.take_strings("tags").unwrap(), vec!["a", "b"]);
        assert_eq!(args.take_level("passthru").unwrap(), None);
        assert!(args.is_empty());
    }

    #[test]
    fn test_missing_handler() {
        let mut args = BoundArgs::new("BufferHandler");
        assert!(matches!(
            args.take_handler("handler"),
            Err(LogweaveError::MissingRequiredParameter { ref parameter, ref target })
                if parameter == "handler" && target == "BufferHandler"
        ));
    }
}
