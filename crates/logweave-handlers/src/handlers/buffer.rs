//! Handler that buffers records and passes them to a wrapped handler in one
//! batch on close.

use logweave_types::{
    handler_options, Binding, BoundArgs, Handler, HandlerDescriptor, HandlerOptions,
    ParamDefault, ParamDescriptor, Record, Result,
};
use parking_lot::Mutex;
use tracing::warn;

const PARAMS: &[ParamDescriptor] = &[
    ParamDescriptor::handler("handler"),
    ParamDescriptor::optional("bufferLimit", ParamDefault::Int(0)),
    ParamDescriptor::optional("flushOnOverflow", ParamDefault::Bool(false)),
];

/// Registry entry for `BufferHandler`.
pub const DESCRIPTOR: HandlerDescriptor = HandlerDescriptor {
    class: "BufferHandler",
    binding: Binding::Named(PARAMS),
    default_bubble: true,
    construct: BufferHandler::construct,
};

/// Buffers records for a wrapped handler.
///
/// With a `buffer_limit` of 0 the buffer is unbounded. When the limit is
/// reached the oldest record is dropped, or the whole buffer is flushed if
/// `flush_on_overflow` is set.
#[derive(Debug)]
pub struct BufferHandler {
    options: HandlerOptions,
    inner: Box<dyn Handler>,
    buffer_limit: usize,
    flush_on_overflow: bool,
    buffer: Mutex<Vec<Record>>,
}

impl BufferHandler {
    /// Wrap a handler.
    pub fn new(inner: Box<dyn Handler>, buffer_limit: usize, flush_on_overflow: bool) -> Self {
        Self {
            options: HandlerOptions::default(),
            inner,
            buffer_limit,
            flush_on_overflow,
            buffer: Mutex::new(Vec::new()),
        }
    }

    fn construct(mut args: BoundArgs) -> Result<Box<dyn Handler>> {
        let inner = args.take_handler("handler")?;
        let buffer_limit = args.take_u64("bufferLimit")?.unwrap_or(0) as usize;
        let flush_on_overflow = args.take_bool("flushOnOverflow")?.unwrap_or(false);
        Ok(Box::new(Self::new(inner, buffer_limit, flush_on_overflow)))
    }

    /// The wrapped handler.
    pub fn inner(&self) -> &dyn Handler {
        self.inner.as_ref()
    }

    /// Maximum buffered records, 0 for unbounded.
    pub fn buffer_limit(&self) -> usize {
        self.buffer_limit
    }

    /// Whether overflowing flushes instead of dropping the oldest record.
    pub fn flushes_on_overflow(&self) -> bool {
        self.flush_on_overflow
    }

    /// Number of records waiting.
    pub fn buffered(&self) -> usize {
        self.buffer.lock().len()
    }

    /// Pass every buffered record to the wrapped handler.
    pub fn flush(&self) -> Result<()> {
        let records = std::mem::take(&mut *self.buffer.lock());
        for record in &records {
            if self.inner.is_handling(record.level) {
                self.inner.handle(record)?;
            }
        }
        Ok(())
    }
}

impl Handler for BufferHandler {
    handler_options!();

    fn handle(&self, record: &Record) -> Result<bool> {
        let overflow = {
            let mut buffer = self.buffer.lock();
            if self.buffer_limit > 0 && buffer.len() >= self.buffer_limit {
                if self.flush_on_overflow {
                    true
                } else {
                    buffer.remove(0);
                    false
                }
            } else {
                false
            }
        };

        if overflow {
            self.flush()?;
        }

        self.buffer.lock().push(record.clone());
        Ok(!self.options.bubble)
    }

    fn close(&self) -> Result<()> {
        self.flush()?;
        self.inner.close()
    }
}

impl Drop for BufferHandler {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            warn!("Failed to flush buffered log records: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::TestHandler;
    use logweave_types::Level;

    fn inner_records(handler: &BufferHandler) -> usize {
        handler
            .inner()
            .as_any()
            .downcast_ref::<TestHandler>()
            .unwrap()
            .records()
            .len()
    }

    #[test]
    fn test_buffers_until_close() {
        let handler = BufferHandler::new(Box::new(TestHandler::new()), 0, false);
        handler.handle(&Record::new("app", Level::Info, "one")).unwrap();
        handler.handle(&Record::new("app", Level::Info, "two")).unwrap();

        assert_eq!(handler.buffered(), 2);
        assert_eq!(inner_records(&handler), 0);

        handler.close().unwrap();
        assert_eq!(handler.buffered(), 0);
        assert_eq!(inner_records(&handler), 2);
    }

    #[test]
    fn test_limit_drops_oldest() {
        let handler = BufferHandler::new(Box::new(TestHandler::new()), 2, false);
        for message in ["one", "two", "three"] {
            handler.handle(&Record::new("app", Level::Info, message)).unwrap();
        }

        assert_eq!(handler.buffered(), 2);
        handler.flush().unwrap();
        let inner = handler.inner().as_any().downcast_ref::<TestHandler>().unwrap();
        let messages: Vec<String> = inner.records().into_iter().map(|r| r.message).collect();
        assert_eq!(messages, vec!["two", "three"]);
    }

    #[test]
    fn test_flush_on_overflow() {
        let handler = BufferHandler::new(Box::new(TestHandler::new()), 2, true);
        for message in ["one", "two", "three"] {
            handler.handle(&Record::new("app", Level::Info, message)).unwrap();
        }

        assert_eq!(inner_records(&handler), 2);
        assert_eq!(handler.buffered(), 1);
    }
}
