//! Log record passed through processors and handlers.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use crate::level::Level;

/// One log record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    /// Channel (logger name) that produced the record
    pub channel: String,
    /// Severity
    pub level: Level,
    /// Message, possibly with `{placeholder}` markers
    pub message: String,
    /// Caller-supplied context
    pub context: Map<String, Value>,
    /// Data added by processors
    pub extra: Map<String, Value>,
    /// Creation time
    pub datetime: DateTime<Utc>,
}

impl Record {
    /// Create a record stamped with the current time.
    pub fn new(channel: impl Into<String>, level: Level, message: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            level,
            message: message.into(),
            context: Map::new(),
            extra: Map::new(),
            datetime: Utc::now(),
        }
    }

    /// Attach caller context.
    pub fn with_context(mut self, context: Map<String, Value>) -> Self {
        self.context = context;
        self
    }
}
