//! The logger handle assembled by the factory.

use chrono::Timelike;
use logweave_types::{Handler, Level, Processor, Record, Result};
use serde_json::{Map, Value};
use std::sync::Arc;

/// A named channel with its ordered handlers and processors.
///
/// Handlers are queried in the order they were pushed; the first one that
/// handles a record with `bubble == false` stops propagation. Processors run
/// in push order before any handler sees the record.
#[derive(Debug, Clone)]
pub struct Logger {
    name: String,
    handlers: Vec<Arc<dyn Handler>>,
    processors: Vec<Arc<dyn Processor>>,
    microseconds: bool,
}

impl Logger {
    /// Create an empty logger.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handlers: Vec::new(),
            processors: Vec::new(),
            microseconds: true,
        }
    }

    /// Channel name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Copy of this logger under another name, sharing the same handler and
    /// processor instances.
    pub fn with_name(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }

    /// Append a handler.
    pub fn push_handler(&mut self, handler: Box<dyn Handler>) {
        self.handlers.push(Arc::from(handler));
    }

    /// Append a processor.
    pub fn push_processor(&mut self, processor: Box<dyn Processor>) {
        self.processors.push(Arc::from(processor));
    }

    /// Handlers in query order.
    pub fn handlers(&self) -> &[Arc<dyn Handler>] {
        &self.handlers
    }

    /// Processors in run order.
    pub fn processors(&self) -> &[Arc<dyn Processor>] {
        &self.processors
    }

    /// Toggle sub-second precision of record timestamps.
    pub fn use_microsecond_timestamps(&mut self, enabled: bool) {
        self.microseconds = enabled;
    }

    /// Whether records carry sub-second precision.
    pub fn uses_microseconds(&self) -> bool {
        self.microseconds
    }

    /// Whether any handler would accept a record of this level.
    pub fn is_handling(&self, level: Level) -> bool {
        self.handlers.iter().any(|h| h.is_handling(level))
    }

    /// Log a message without context.
    pub fn log(&self, level: Level, message: impl Into<String>) -> Result<bool> {
        self.log_with_context(level, message, Map::new())
    }

    /// Log a message with context.
    ///
    /// Returns whether any handler handled the record.
    pub fn log_with_context(
        &self,
        level: Level,
        message: impl Into<String>,
        context: Map<String, Value>,
    ) -> Result<bool> {
        if !self.is_handling(level) {
            return Ok(false);
        }

        let mut record = Record::new(self.name.clone(), level, message).with_context(context);
        if self.microseconds {
            // Handlers format at microsecond precision.
            let micros = record.datetime.nanosecond() / 1_000 * 1_000;
            record.datetime = record.datetime.with_nanosecond(micros).unwrap_or(record.datetime);
        } else {
            record.datetime = record.datetime.with_nanosecond(0).unwrap_or(record.datetime);
        }

        for processor in &self.processors {
            processor.process(&mut record);
        }

        let mut handled = false;
        for handler in &self.handlers {
            if !handler.is_handling(level) {
                continue;
            }
            handled = true;
            if handler.handle(&record)? {
                break;
            }
        }

        Ok(handled)
    }

    /// Log at debug level.
    pub fn debug(&self, message: impl Into<String>) -> Result<bool> {
        self.log(Level::Debug, message)
    }

    /// Log at info level.
    pub fn info(&self, message: impl Into<String>) -> Result<bool> {
        self.log(Level::Info, message)
    }

    /// Log at warning level.
    pub fn warning(&self, message: impl Into<String>) -> Result<bool> {
        self.log(Level::Warning, message)
    }

    /// Log at error level.
    pub fn error(&self, message: impl Into<String>) -> Result<bool> {
        self.log(Level::Error, message)
    }

    /// Log at critical level.
    pub fn critical(&self, message: impl Into<String>) -> Result<bool> {
        self.log(Level::Critical, message)
    }

    /// Close every handler, flushing buffers.
    pub fn close(&self) -> Result<()> {
        for handler in &self.handlers {
            handler.close()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test::TestHandler;
    use crate::processors::tag::TagProcessor;

    fn test_handler(level: Level, bubble: bool) -> Box<TestHandler> {
        let mut handler = TestHandler::new();
        handler.set_level(level);
        handler.set_bubble(bubble);
        Box::new(handler)
    }

    fn records_of(logger: &Logger, index: usize) -> Vec<Record> {
        logger.handlers()[index]
            .as_any()
            .downcast_ref::<TestHandler>()
            .unwrap()
            .records()
    }

    #[test]
    fn test_handlers_in_push_order_until_bubble_stops() {
        let mut logger = Logger::new("app");
        logger.push_handler(test_handler(Level::Debug, true));
        logger.push_handler(test_handler(Level::Debug, false));
        logger.push_handler(test_handler(Level::Debug, true));

        assert!(logger.info("hello").unwrap());
        assert_eq!(records_of(&logger, 0).len(), 1);
        assert_eq!(records_of(&logger, 1).len(), 1);
        assert!(records_of(&logger, 2).is_empty());
    }

    #[test]
    fn test_level_filtering() {
        let mut logger = Logger::new("app");
        logger.push_handler(test_handler(Level::Error, true));

        assert!(!logger.warning("ignored").unwrap());
        assert!(logger.error("kept").unwrap());
        let records = records_of(&logger, 0);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].message, "kept");
        assert_eq!(records[0].channel, "app");
    }

    #[test]
    fn test_processors_run_before_handlers() {
        let mut logger = Logger::new("app");
        logger.push_processor(Box::new(TagProcessor::new(vec!["web".to_string()])));
        logger.push_handler(test_handler(Level::Debug, true));

        logger.info("tagged").unwrap();
        let records = records_of(&logger, 0);
        assert_eq!(records[0].extra["tags"], serde_json::json!(["web"]));
    }

    #[test]
    fn test_with_name_shares_components() {
        let mut parent = Logger::new("parent");
        parent.push_handler(test_handler(Level::Debug, true));
        parent.use_microsecond_timestamps(false);

        let child = parent.with_name("child");
        assert_eq!(child.name(), "child");
        assert!(!child.uses_microseconds());
        assert!(Arc::ptr_eq(&parent.handlers()[0], &child.handlers()[0]));

        child.info("from child").unwrap();
        assert_eq!(records_of(&parent, 0)[0].channel, "child");
    }

    #[test]
    fn test_second_precision_timestamps() {
        let mut logger = Logger::new("app");
        logger.use_microsecond_timestamps(false);
        logger.push_handler(test_handler(Level::Debug, true));

        logger.info("tick").unwrap();
        assert_eq!(records_of(&logger, 0)[0].datetime.nanosecond(), 0);
    }
}
