//! Registry of component classes the factory may instantiate.
//!
//! Every class is registered explicitly with its descriptor. Lookups are
//! case-insensitive and ignore a leading namespace (`Vendor\Handler\X` and
//! `vendor::handler::X` both resolve to `X`).

use crate::handlers::{buffer, couchdb, fingers_crossed, null, rotating, stream, test};
use crate::processors::{process_id, psr, tag, uid};
use indexmap::IndexMap;
use logweave_types::{HandlerDescriptor, LogweaveError, ProcessorDescriptor, Result, Section};

/// Closed set of handler and processor classes.
#[derive(Debug, Clone)]
pub struct ComponentRegistry {
    handlers: IndexMap<String, &'static HandlerDescriptor>,
    processors: IndexMap<String, &'static ProcessorDescriptor>,
}

fn lookup_key(class: &str) -> String {
    let short = class
        .rsplit(|c| c == '\\' || c == ':')
        .find(|part| !part.is_empty())
        .unwrap_or(class);
    short.to_ascii_lowercase()
}

/// Derive a class name from a type tag: `rotating_file` becomes
/// `RotatingFileHandler` in the handlers section.
pub fn class_for_type(type_tag: &str, section: Section) -> String {
    let mut class: String = type_tag
        .split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect();
    class.push_str(section.class_suffix());
    class
}

impl ComponentRegistry {
    /// Registry with no classes.
    pub fn empty() -> Self {
        Self {
            handlers: IndexMap::new(),
            processors: IndexMap::new(),
        }
    }

    /// Registry with every built-in class.
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        for descriptor in [
            &stream::DESCRIPTOR,
            &rotating::DESCRIPTOR,
            &buffer::DESCRIPTOR,
            &fingers_crossed::DESCRIPTOR,
            &null::DESCRIPTOR,
            &test::DESCRIPTOR,
            &couchdb::DESCRIPTOR,
        ] {
            registry.register_handler(descriptor);
        }
        for descriptor in [
            &psr::DESCRIPTOR,
            &uid::DESCRIPTOR,
            &tag::DESCRIPTOR,
            &process_id::DESCRIPTOR,
        ] {
            registry.register_processor(descriptor);
        }
        registry
    }

    /// Add or replace a handler class.
    pub fn register_handler(&mut self, descriptor: &'static HandlerDescriptor) {
        self.handlers.insert(lookup_key(descriptor.class), descriptor);
    }

    /// Add or replace a processor class.
    pub fn register_processor(&mut self, descriptor: &'static ProcessorDescriptor) {
        self.processors.insert(lookup_key(descriptor.class), descriptor);
    }

    /// Look up a handler class.
    pub fn handler(&self, class: &str) -> Result<&'static HandlerDescriptor> {
        self.handlers
            .get(&lookup_key(class))
            .copied()
            .ok_or_else(|| LogweaveError::UnknownComponentClass {
                section: Section::Handlers,
                class: class.to_string(),
            })
    }

    /// Look up a processor class.
    pub fn processor(&self, class: &str) -> Result<&'static ProcessorDescriptor> {
        self.processors
            .get(&lookup_key(class))
            .copied()
            .ok_or_else(|| LogweaveError::UnknownComponentClass {
                section: Section::Processors,
                class: class.to_string(),
            })
    }

    /// Registered handler class names.
    pub fn handler_classes(&self) -> Vec<&'static str> {
        self.handlers.values().map(|d| d.class).collect()
    }

    /// Registered processor class names.
    pub fn processor_classes(&self) -> Vec<&'static str> {
        self.processors.values().map(|d| d.class).collect()
    }
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
