//! Interpolates `{placeholder}` markers in messages from the record context.

use logweave_types::{
    Binding, BoundArgs, ParamDefault, ParamDescriptor, Processor, ProcessorDescriptor, Record,
    Result,
};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;
use std::any::Any;

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([A-Za-z0-9_.]+)\}").expect("static regex"));

const PARAMS: &[ParamDescriptor] = &[ParamDescriptor::optional(
    "removeUsedContextFields",
    ParamDefault::Bool(false),
)];

/// Registry entry for `PsrLogMessageProcessor`.
pub const DESCRIPTOR: ProcessorDescriptor = ProcessorDescriptor {
    class: "PsrLogMessageProcessor",
    binding: Binding::Named(PARAMS),
    construct: PsrLogMessageProcessor::construct,
};

/// Replaces `{key}` in the message with `context[key]`.
#[derive(Debug, Default)]
pub struct PsrLogMessageProcessor {
    remove_used_context_fields: bool,
}

impl PsrLogMessageProcessor {
    /// Create a processor.
    pub fn new(remove_used_context_fields: bool) -> Self {
        Self { remove_used_context_fields }
    }

    fn construct(mut args: BoundArgs) -> Result<Box<dyn Processor>> {
        let remove = args.take_bool("removeUsedContextFields")?.unwrap_or(false);
        Ok(Box::new(Self::new(remove)))
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::Null => "[null]".to_string(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) => "[array]".to_string(),
        Value::Object(_) => format!("[object {}]", value),
    }
}

impl Processor for PsrLogMessageProcessor {
    fn process(&self, record: &mut Record) {
        if !record.message.contains('{') {
            return;
        }

        let mut used = Vec::new();
        let message = PLACEHOLDER
            .replace_all(&record.message, |caps: &Captures| {
                let key = &caps[1];
                match record.context.get(key) {
                    Some(value) => {
                        used.push(key.to_string());
                        render(value)
                    }
                    None => caps[0].to_string(),
                }
            })
            .into_owned();

        record.message = message;
        if self.remove_used_context_fields {
            for key in used {
                record.context.remove(&key);
            }
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
