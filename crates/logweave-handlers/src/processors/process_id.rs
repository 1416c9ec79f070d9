//! Adds the current process id to every record.

use logweave_types::{Binding, BoundArgs, Processor, ProcessorDescriptor, Record, Result};
use std::any::Any;

/// Registry entry for `ProcessIdProcessor`.
pub const DESCRIPTOR: ProcessorDescriptor = ProcessorDescriptor {
    class: "ProcessIdProcessor",
    binding: Binding::Named(&[]),
    construct: ProcessIdProcessor::construct,
};

/// Stamps `extra.process_id`.
#[derive(Debug, Default)]
pub struct ProcessIdProcessor;

impl ProcessIdProcessor {
    fn construct(_args: BoundArgs) -> Result<Box<dyn Processor>> {
        Ok(Box::new(Self))
    }
}

impl Processor for ProcessIdProcessor {
    fn process(&self, record: &mut Record) {
        record.extra.insert("process_id".to_string(), std::process::id().into());
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
