//! Handler that swallows records.

use logweave_types::{
    handler_options, Binding, BoundArgs, Handler, HandlerDescriptor, HandlerOptions, Record, Result,
};

/// Registry entry for `NullHandler`.
pub const DESCRIPTOR: HandlerDescriptor = HandlerDescriptor {
    class: "NullHandler",
    binding: Binding::Named(&[]),
    default_bubble: false,
    construct: NullHandler::construct,
};

/// Discards every record it handles and stops propagation.
#[derive(Debug)]
pub struct NullHandler {
    options: HandlerOptions,
}

impl NullHandler {
    /// Create a null handler.
    pub fn new() -> Self {
        Self {
            options: HandlerOptions { bubble: false, ..HandlerOptions::default() },
        }
    }

    fn construct(_args: BoundArgs) -> Result<Box<dyn Handler>> {
        Ok(Box::new(Self::new()))
    }
}

impl Default for NullHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl Handler for NullHandler {
    handler_options!();

    fn handle(&self, _record: &Record) -> Result<bool> {
        Ok(!self.options.bubble)
    }
}
