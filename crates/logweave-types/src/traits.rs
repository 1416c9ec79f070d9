//! Core trait definitions for Logweave components.

use std::any::Any;
use std::fmt;
use crate::errors::Result;
use crate::level::Level;
use crate::record::Record;

/// A sink: consumes finished log records.
///
/// Instances are configured (`set_level`, `set_bubble`, rotation options)
/// while the logger is being assembled and are shared read-only afterwards,
/// so any state touched by `handle` needs interior mutability.
pub trait Handler: Send + Sync + fmt::Debug + 'static {
    /// Minimum level this handler accepts.
    fn level(&self) -> Level;

    /// Set the minimum level.
    fn set_level(&mut self, level: Level);

    /// Whether handled records continue to later handlers.
    fn bubble(&self) -> bool;

    /// Set the bubble flag.
    fn set_bubble(&mut self, bubble: bool);

    /// Whether a record of this level would be handled.
    fn is_handling(&self, level: Level) -> bool {
        level >= self.level()
    }

    /// Handle a record.
    ///
    /// Returns `true` when the record must not be offered to later handlers.
    fn handle(&self, record: &Record) -> Result<bool>;

    /// Flush buffered state and release resources.
    fn close(&self) -> Result<()> {
        Ok(())
    }

    /// Rotation naming options, for file handlers that rotate.
    fn as_rotating(&mut self) -> Option<&mut dyn Rotating> {
        None
    }

    /// Downcast support.
    fn as_any(&self) -> &dyn Any;
}

/// An enricher: augments a record before it reaches handlers.
pub trait Processor: Send + Sync + fmt::Debug + 'static {
    /// Add data to the record.
    fn process(&self, record: &mut Record);

    /// Downcast support.
    fn as_any(&self) -> &dyn Any;
}

/// File naming options of rotating handlers.
pub trait Rotating {
    /// Set the filename template and the date format substituted into it.
    ///
    /// Either argument may be `None` to keep the current value.
    fn set_filename_format(
        &mut self,
        filename_format: Option<&str>,
        date_format: Option<&str>,
    ) -> Result<()>;
}

/// Shared state for the level/bubble part of a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandlerOptions {
    /// Minimum level
    pub level: Level,
    /// Bubble flag
    pub bubble: bool,
}

impl Default for HandlerOptions {
    fn default() -> Self {
        Self {
            level: Level::Debug,
            bubble: true,
        }
    }
}

/// Implements the level/bubble accessors of [`Handler`] for a struct with
/// an `options: HandlerOptions` field.
#[macro_export]
macro_rules! handler_options {
    () => {
        fn level(&self) -> $crate::Level {
            self.options.level
        }

        fn set_level(&mut self, level: $crate::Level) {
            self.options.level = level;
        }

        fn bubble(&self) -> bool {
            self.options.bubble
        }

        fn set_bubble(&mut self, bubble: bool) {
            self.options.bubble = bubble;
        }

        fn as_any(&self) -> &dyn ::std::any::Any {
            self
        }
    };
}
