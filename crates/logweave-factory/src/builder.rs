//! Component builder: turns handler/processor references into instances.

use logweave_core::ConfigDocument;
use logweave_handlers::{class_for_type, ComponentRegistry};
use logweave_types::{
    Binding, BoundArgs, BoundValue, ComponentRef, ComponentSpec, Handler, Level, LogweaveError,
    ParamDescriptor, ParamKind, Processor, Result, Section,
};
use serde_json::Value;
use tracing::debug;

/// Builds components against one configuration document and registry.
///
/// Named references are tracked while they are being built so a handler
/// that ends up wrapping itself is reported instead of recursing forever.
pub struct ComponentBuilder<'a> {
    document: &'a ConfigDocument,
    registry: &'a ComponentRegistry,
    trail: Vec<String>,
}

impl<'a> ComponentBuilder<'a> {
    /// Create a builder.
    pub fn new(document: &'a ConfigDocument, registry: &'a ComponentRegistry) -> Self {
        Self {
            document,
            registry,
            trail: Vec::new(),
        }
    }

    /// Build a handler from a name in the `handlers` section or an inline spec.
    pub fn build_handler(&mut self, reference: &ComponentRef) -> Result<Box<dyn Handler>> {
        self.build_tracked_handler(reference)
            .map_err(|e| e.in_component(Section::Handlers, reference.label()))
    }

    /// Build a processor from a name in the `processors` section or an
    /// inline spec.
    pub fn build_processor(&mut self, reference: &ComponentRef) -> Result<Box<dyn Processor>> {
        self.construct_processor(reference)
            .map_err(|e| e.in_component(Section::Processors, reference.label()))
    }

    fn build_tracked_handler(&mut self, reference: &ComponentRef) -> Result<Box<dyn Handler>> {
        let name = match reference {
            ComponentRef::Named(name) => name,
            ComponentRef::Inline(_) => return self.construct_handler(reference),
        };

        if self.trail.iter().any(|n| n == name) {
            let mut chain = self.trail.clone();
            chain.push(name.clone());
            return Err(LogweaveError::CyclicComponentReference {
                section: Section::Handlers,
                name: name.clone(),
                chain,
            });
        }

        self.trail.push(name.clone());
        let result = self.construct_handler(reference);
        self.trail.pop();
        result
    }

    fn construct_handler(&mut self, reference: &ComponentRef) -> Result<Box<dyn Handler>> {
        let spec = self.resolve_spec(Section::Handlers, reference)?;
        let class = class_of(Section::Handlers, &spec)?;
        let descriptor = self.registry.handler(&class)?;

        let level = match &spec.level {
            Some(value) => Level::from_value(value)?,
            None => Level::Info,
        };
        let bubble = match &spec.bubble {
            None => descriptor.default_bubble,
            Some(Value::Bool(bubble)) => *bubble,
            Some(other) => {
                return Err(LogweaveError::InvalidParameter {
                    parameter: "bubble".to_string(),
                    target: descriptor.class.to_string(),
                    reason: format!("expected a boolean, got {}", other),
                })
            }
        };

        let args = self.bind(descriptor.class, descriptor.binding, &spec)?;
        let mut handler = (descriptor.construct)(args)?;
        handler.set_level(level);
        handler.set_bubble(bubble);

        if let Some(rotating) = handler.as_rotating() {
            let filename_format = string_param(&spec, "filenameFormat", descriptor.class)?;
            let date_format = string_param(&spec, "dateFormat", descriptor.class)?;
            if filename_format.is_some() || date_format.is_some() {
                rotating.set_filename_format(filename_format, date_format)?;
            }
        }

        debug!("Built {} {} (level {}, bubble {})", descriptor.class, reference.label(), level, bubble);
        Ok(handler)
    }

    fn construct_processor(&mut self, reference: &ComponentRef) -> Result<Box<dyn Processor>> {
        let spec = self.resolve_spec(Section::Processors, reference)?;
        let class = class_of(Section::Processors, &spec)?;
        let descriptor = self.registry.processor(&class)?;

        let args = self.bind(descriptor.class, descriptor.binding, &spec)?;
        let processor = (descriptor.construct)(args)?;
        debug!("Built {} {}", descriptor.class, reference.label());
        Ok(processor)
    }

    fn resolve_spec(&self, section: Section, reference: &ComponentRef) -> Result<ComponentSpec> {
        match reference {
            ComponentRef::Inline(spec) => Ok(spec.clone()),
            ComponentRef::Named(name) => {
                let value = self.document.component(section, name).ok_or_else(|| {
                    LogweaveError::UndefinedComponentReference {
                        section,
                        name: name.clone(),
                    }
                })?;
                ComponentSpec::from_value(value).ok_or(LogweaveError::MissingTypeOrClass { section })
            }
        }
    }

    /// Bind configuration values to the target's constructor parameters.
    fn bind(
        &mut self,
        target: &'static str,
        binding: Binding,
        spec: &ComponentSpec,
    ) -> Result<BoundArgs> {
        let mut args = BoundArgs::new(target);
        let params = match binding {
            Binding::WholeSpec => {
                args.insert("spec", BoundValue::Value(spec.to_value()));
                return Ok(args);
            }
            Binding::Named(params) => params,
        };

        match &spec.arguments {
            Some(arguments) => {
                if arguments.len() > params.len() {
                    return Err(LogweaveError::TooManyArguments {
                        target: target.to_string(),
                        expected: params.len(),
                        given: arguments.len(),
                    });
                }
                for (param, value) in params.iter().zip(arguments) {
                    let bound = self.coerce(target, param, value)?;
                    args.insert(param.name, bound);
                }
                for param in &params[arguments.len()..] {
                    args.insert(param.name, default_for(target, param)?);
                }
            }
            None => {
                for param in params {
                    let bound = match spec.param(param.name) {
                        Some(value) => self.coerce(target, param, value)?,
                        None => default_for(target, param)?,
                    };
                    args.insert(param.name, bound);
                }
            }
        }

        Ok(args)
    }

    fn coerce(
        &mut self,
        target: &'static str,
        param: &ParamDescriptor,
        value: &Value,
    ) -> Result<BoundValue> {
        if value.is_null() {
            return default_for(target, param);
        }

        match param.kind {
            ParamKind::Value => Ok(BoundValue::Value(value.clone())),
            ParamKind::Level => Ok(BoundValue::Level(Level::from_value(value)?)),
            ParamKind::Handler => {
                let reference = ComponentRef::from_value(value).ok_or_else(|| {
                    LogweaveError::InvalidParameter {
                        parameter: param.name.to_string(),
                        target: target.to_string(),
                        reason: format!("expected a handler name or spec, got {}", value),
                    }
                })?;
                Ok(BoundValue::Handler(self.build_handler(&reference)?))
            }
        }
    }
}

fn class_of(section: Section, spec: &ComponentSpec) -> Result<String> {
    if let Some(class) = &spec.class {
        return Ok(class.clone());
    }
    spec.type_tag
        .as_deref()
        .map(|type_tag| class_for_type(type_tag, section))
        .ok_or(LogweaveError::MissingTypeOrClass { section })
}

fn default_for(target: &str, param: &ParamDescriptor) -> Result<BoundValue> {
    param
        .default_value()
        .ok_or_else(|| LogweaveError::MissingRequiredParameter {
            parameter: param.name.to_string(),
            target: target.to_string(),
        })
}

fn string_param<'s>(spec: &'s ComponentSpec, name: &str, target: &str) -> Result<Option<&'s str>> {
    match spec.param(name) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(other) => Err(LogweaveError::InvalidParameter {
            parameter: name.to_string(),
            target: target.to_string(),
            reason: format!("expected a string, got {}", other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logweave_handlers::handlers::stream::StreamTarget;
    use logweave_handlers::{
        BufferHandler, CouchDbHandler, FingersCrossedHandler, NullHandler, RotatingFileHandler,
        StreamHandler, UidProcessor,
    };
    use serde_json::json;
    use std::path::PathBuf;

    fn document() -> ConfigDocument {
        ConfigDocument::from_value(json!({
            "handlers": {
                "main": {"type": "stream", "file": "/var/log/app.log", "level": "debug"},
                "buffered": {"type": "buffer", "handler": "main", "bufferLimit": 10},
                "broken": {"type": "stream"},
                "loop_a": {"type": "buffer", "handler": "loop_b"},
                "loop_b": {"type": "buffer", "handler": "loop_a"},
                "typeless": {"file": "/tmp/x.log"},
                "not_a_mapping": "stream",
            },
            "processors": {
                "uid": {"type": "uid", "length": 12},
            },
        }))
        .unwrap()
    }

    fn inline(spec: Value) -> ComponentRef {
        ComponentRef::from_value(&spec).unwrap()
    }

    fn build(spec: Value) -> Result<Box<dyn Handler>> {
        let doc = document();
        let registry = ComponentRegistry::standard();
        let mut builder = ComponentBuilder::new(&doc, &registry);
        builder.build_handler(&inline(spec))
    }

    #[test]
    fn test_named_handler() {
        let doc = document();
        let registry = ComponentRegistry::standard();
        let mut builder = ComponentBuilder::new(&doc, &registry);

        let handler = builder.build_handler(&"main".into()).unwrap();
        let stream = handler.as_any().downcast_ref::<StreamHandler>().unwrap();
        assert_eq!(stream.target(), &StreamTarget::File(PathBuf::from("/var/log/app.log")));
        assert_eq!(handler.level(), Level::Debug);
        assert!(handler.bubble());
    }

    #[test]
    fn test_level_defaults_to_info_and_accepts_any_case() {
        let handler = build(json!({"type": "null"})).unwrap();
        assert_eq!(handler.level(), Level::Info);

        let handler = build(json!({"type": "stream", "file": "stderr", "level": "WARNING"})).unwrap();
        assert_eq!(handler.level(), Level::Warning);

        let handler = build(json!({"type": "stream", "file": "stderr", "level": 400})).unwrap();
        assert_eq!(handler.level(), Level::Error);
    }

    #[test]
    fn test_unknown_level() {
        let err = build(json!({"type": "null", "level": "verbose"})).unwrap_err();
        assert!(matches!(err.root(), LogweaveError::UnknownLevel(name) if name == "verbose"));
    }

    #[test]
    fn test_bubble() {
        let handler = build(json!({"type": "null"})).unwrap();
        assert!(!handler.bubble());

        let handler = build(json!({"type": "stream", "file": "stderr", "bubble": false})).unwrap();
        assert!(!handler.bubble());

        let err = build(json!({"type": "null", "bubble": "no"})).unwrap_err();
        assert!(matches!(
            err.root(),
            LogweaveError::InvalidParameter { parameter, .. } if parameter == "bubble"
        ));
    }

    #[test]
    fn test_buffer_wraps_named_target() {
        let doc = document();
        let registry = ComponentRegistry::standard();
        let mut builder = ComponentBuilder::new(&doc, &registry);

        let handler = builder.build_handler(&"buffered".into()).unwrap();
        let buffer = handler.as_any().downcast_ref::<BufferHandler>().unwrap();
        assert_eq!(buffer.buffer_limit(), 10);
        assert!(!buffer.flushes_on_overflow());

        let inner = buffer.inner().as_any().downcast_ref::<StreamHandler>().unwrap();
        assert_eq!(inner.target(), &StreamTarget::File(PathBuf::from("/var/log/app.log")));
        assert_eq!(buffer.inner().level(), Level::Debug);
    }

    #[test]
    fn test_nested_inline_target() {
        let handler = build(json!({
            "type": "fingers_crossed",
            "handler": {"type": "null"},
            "activationLevel": "error",
        }))
        .unwrap();

        let fingers = handler.as_any().downcast_ref::<FingersCrossedHandler>().unwrap();
        assert_eq!(fingers.activation_level(), Level::Error);
        assert_eq!(fingers.passthru_level(), None);
        assert!(fingers.inner().as_any().is::<NullHandler>());
    }

    #[test]
    fn test_missing_required_parameter() {
        let doc = document();
        let registry = ComponentRegistry::standard();
        let mut builder = ComponentBuilder::new(&doc, &registry);

        let err = builder.build_handler(&"broken".into()).unwrap_err();
        assert!(matches!(
            &err,
            LogweaveError::Component { section: Section::Handlers, reference, .. } if reference == "'broken'"
        ));
        assert!(matches!(
            err.root(),
            LogweaveError::MissingRequiredParameter { parameter, target }
                if parameter == "file" && target == "StreamHandler"
        ));
    }

    #[test]
    fn test_class_overrides_type() {
        let handler = build(json!({"type": "stream", "class": "NullHandler"})).unwrap();
        assert!(handler.as_any().is::<NullHandler>());
    }

    #[test]
    fn test_positional_arguments() {
        let handler = build(json!({"type": "buffer", "arguments": ["main", 5, true]})).unwrap();
        let buffer = handler.as_any().downcast_ref::<BufferHandler>().unwrap();
        assert_eq!(buffer.buffer_limit(), 5);
        assert!(buffer.flushes_on_overflow());
        assert!(buffer.inner().as_any().is::<StreamHandler>());

        let handler = build(json!({"type": "stream", "arguments": ["stderr"]})).unwrap();
        let stream = handler.as_any().downcast_ref::<StreamHandler>().unwrap();
        assert_eq!(stream.target(), &StreamTarget::Stderr);
    }

    #[test]
    fn test_too_many_arguments() {
        let err = build(json!({"type": "stream", "arguments": ["stderr", null, false, "extra"]}))
            .unwrap_err();
        assert!(matches!(
            err.root(),
            LogweaveError::TooManyArguments { expected: 3, given: 4, .. }
        ));
    }

    #[test]
    fn test_whole_spec_binding() {
        let handler = build(json!({"type": "couch_db", "host": "couch.local", "port": 6984})).unwrap();
        let couch = handler.as_any().downcast_ref::<CouchDbHandler>().unwrap();
        assert_eq!(couch.database_url(), "http://couch.local:6984/logger");
    }

    #[test]
    fn test_rotation_naming() {
        let handler = build(json!({
            "type": "rotating_file",
            "filename": "/var/log/app.log",
            "filenameFormat": "{date}-{filename}",
            "dateFormat": "%Y-%m",
        }))
        .unwrap();
        let rotating = handler.as_any().downcast_ref::<RotatingFileHandler>().unwrap();
        assert_eq!(rotating.filename_format(), "{date}-{filename}");
        assert_eq!(rotating.date_format(), "%Y-%m");

        let err = build(json!({
            "type": "rotating_file",
            "filename": "/var/log/app.log",
            "dateFormat": "%H",
        }))
        .unwrap_err();
        assert!(matches!(
            err.root(),
            LogweaveError::InvalidParameter { parameter, .. } if parameter == "dateFormat"
        ));
    }

    #[test]
    fn test_component_cycle() {
        let doc = document();
        let registry = ComponentRegistry::standard();
        let mut builder = ComponentBuilder::new(&doc, &registry);

        let err = builder.build_handler(&"loop_a".into()).unwrap_err();
        match err.root() {
            LogweaveError::CyclicComponentReference { name, chain, .. } => {
                assert_eq!(name, "loop_a");
                assert_eq!(chain, &vec!["loop_a", "loop_b", "loop_a"]);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_reference_errors() {
        let doc = document();
        let registry = ComponentRegistry::standard();
        let mut builder = ComponentBuilder::new(&doc, &registry);

        let err = builder.build_handler(&"nope".into()).unwrap_err();
        assert!(matches!(
            err.root(),
            LogweaveError::UndefinedComponentReference { section: Section::Handlers, name } if name == "nope"
        ));

        let err = builder.build_handler(&"typeless".into()).unwrap_err();
        assert!(matches!(err.root(), LogweaveError::MissingTypeOrClass { .. }));

        let err = builder.build_handler(&"not_a_mapping".into()).unwrap_err();
        assert!(matches!(err.root(), LogweaveError::MissingTypeOrClass { .. }));

        let err = builder.build_handler(&inline(json!({"type": "mail"}))).unwrap_err();
        assert!(matches!(
            err.root(),
            LogweaveError::UnknownComponentClass { class, .. } if class == "MailHandler"
        ));
    }

    #[test]
    fn test_processors() {
        let doc = document();
        let registry = ComponentRegistry::standard();
        let mut builder = ComponentBuilder::new(&doc, &registry);

        let processor = builder.build_processor(&"uid".into()).unwrap();
        let uid = processor.as_any().downcast_ref::<UidProcessor>().unwrap();
        assert_eq!(uid.uid().len(), 12);

        let err = builder.build_processor(&"main".into()).unwrap_err();
        assert!(matches!(
            err.root(),
            LogweaveError::UndefinedComponentReference { section: Section::Processors, .. }
        ));
    }

    #[test]
    fn test_processor_spec_has_no_bubble() {
        let doc = document();
        let registry = ComponentRegistry::standard();
        let mut builder = ComponentBuilder::new(&doc, &registry);

        let processor = builder
            .build_processor(&inline(json!({"type": "uid", "bubble": "no", "level": "verbose"})))
            .unwrap();
        assert!(processor.as_any().is::<UidProcessor>());
        assert_eq!(registry.processor("UidProcessor").unwrap().class, "UidProcessor");
    }
}
