//! Line formatting shared by the file handlers.

use logweave_types::Record;
use serde_json::{Map, Value};

/// Timestamp format used in formatted lines.
pub const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f%:z";

/// Format a record as a single line:
/// `[datetime] channel.LEVEL: message {context} {extra}`.
pub fn format_line(record: &Record) -> String {
    format!(
        "[{}] {}.{}: {} {} {}\n",
        record.datetime.format(DATETIME_FORMAT),
        record.channel,
        record.level,
        record.message,
        format_map(&record.context),
        format_map(&record.extra),
    )
}

fn format_map(map: &Map<String, Value>) -> String {
    if map.is_empty() {
        "[]".to_string()
    } else {
        Value::Object(map.clone()).to_string()
    }
}
