//! Adds fixed tags to every record.

use logweave_types::{
    Binding, BoundArgs, ParamDescriptor, Processor, ProcessorDescriptor, Record, Result,
};
use serde_json::Value;
use std::any::Any;

const PARAMS: &[ParamDescriptor] = &[ParamDescriptor::nullable("tags")];

/// Registry entry for `TagProcessor`.
pub const DESCRIPTOR: ProcessorDescriptor = ProcessorDescriptor {
    class: "TagProcessor",
    binding: Binding::Named(PARAMS),
    construct: TagProcessor::construct,
};

/// Stamps `extra.tags`.
#[derive(Debug)]
pub struct TagProcessor {
    tags: Vec<String>,
}

impl TagProcessor {
    /// Create a processor with a tag list.
    pub fn new(tags: Vec<String>) -> Self {
        Self { tags }
    }

    fn construct(mut args: BoundArgs) -> Result<Box<dyn Processor>> {
        Ok(Box::new(Self::new(args.take_strings("tags")?)))
    }

    /// Configured tags.
    pub fn tags(&self) -> &[String] {
        &self.tags
    }
}

impl Processor for TagProcessor {
    fn process(&self, record: &mut Record) {
        let tags = self.tags.iter().cloned().map(Value::from).collect();
        record.extra.insert("tags".to_string(), Value::Array(tags));
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
