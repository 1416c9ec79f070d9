//! Adds a per-logger unique id to every record.

use logweave_types::{
    Binding, BoundArgs, LogweaveError, ParamDefault, ParamDescriptor, Processor,
    ProcessorDescriptor, Record, Result,
};
use std::any::Any;
use uuid::Uuid;

const PARAMS: &[ParamDescriptor] = &[ParamDescriptor::optional("length", ParamDefault::Int(7))];

/// Registry entry for `UidProcessor`.
pub const DESCRIPTOR: ProcessorDescriptor = ProcessorDescriptor {
    class: "UidProcessor",
    binding: Binding::Named(PARAMS),
    construct: UidProcessor::construct,
};

/// Stamps `extra.uid` with a random hex id fixed at construction, so all
/// records of one request share it.
#[derive(Debug)]
pub struct UidProcessor {
    uid: String,
}

impl UidProcessor {
    /// Create a processor with an id of `length` hex digits (1 to 32).
    pub fn new(length: usize) -> Result<Self> {
        if !(1..=32).contains(&length) {
            return Err(LogweaveError::InvalidParameter {
                parameter: "length".to_string(),
                target: DESCRIPTOR.class.to_string(),
                reason: format!("must be between 1 and 32, got {}", length),
            });
        }

        let mut uid = Uuid::new_v4().simple().to_string();
        uid.truncate(length);
        Ok(Self { uid })
    }

    fn construct(mut args: BoundArgs) -> Result<Box<dyn Processor>> {
        let length = args.take_u64("length")?.unwrap_or(7) as usize;
        Ok(Box::new(Self::new(length)?))
    }

    /// The id stamped on records.
    pub fn uid(&self) -> &str {
        &self.uid
    }
}

impl Processor for UidProcessor {
    fn process(&self, record: &mut Record) {
        record.extra.insert("uid".to_string(), self.uid.clone().into());
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
