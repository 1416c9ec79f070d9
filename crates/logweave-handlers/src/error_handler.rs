//! Routing of process-level failures into a logger.
//!
//! A channel with `register_error_handler` (or the older
//! `register_php_handlers` key) enabled hands its logger to an
//! [`ErrorHandlerRegistrar`] once it has been assembled. The standard
//! registrar installs one process-wide panic hook; later registrations only
//! retarget it. The hook holds the logger weakly, so loggers of finished
//! sessions are freed and never see later panics.

use crate::logger::Logger;
use logweave_types::{ErrorHandlerOptions, Level, Result};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::any::Any;
use std::panic;
use std::sync::{Arc, Once, Weak};

/// Error type name panics are reported under in `levelMap`/`errorTypes`.
pub const PANIC_ERROR_TYPE: &str = "panic";

/// Installs process-wide error routing for a logger.
pub trait ErrorHandlerRegistrar: Send {
    /// Route process errors to `logger` according to `options`.
    fn register(&mut self, logger: &Arc<Logger>, options: &ErrorHandlerOptions) -> Result<()>;
}

#[derive(Debug, Clone)]
struct PanicTarget {
    logger: Weak<Logger>,
    level: Level,
    call_previous: bool,
}

static PANIC_TARGET: Lazy<Mutex<Option<PanicTarget>>> = Lazy::new(|| Mutex::new(None));
static HOOK: Once = Once::new();

fn install_hook() {
    HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            // Copy out before logging: a panicking sink must not find the slot locked.
            let target = PANIC_TARGET.lock().clone();
            let Some(target) = target else {
                previous(info);
                return;
            };

            if let Some(logger) = target.logger.upgrade() {
                let mut context = Map::new();
                if let Some(location) = info.location() {
                    context.insert("file".to_string(), Value::from(location.file()));
                    context.insert("line".to_string(), Value::from(location.line()));
                }
                let message = format!("Uncaught panic: {}", payload_message(info.payload()));
                let _ = logger.log_with_context(target.level, message, context);
            }

            if target.call_previous {
                previous(info);
            }
        }));
    });
}

/// Registrar that logs panics through the most recently registered logger.
///
/// `handleOnlyReportedErrors` has no effect here: every panic is reported.
#[derive(Debug, Default)]
pub struct PanicHookRegistrar {
    registered: usize,
}

impl PanicHookRegistrar {
    /// Create a registrar.
    pub fn new() -> Self {
        Self::default()
    }

    /// How many loggers this registrar has routed panics to.
    pub fn registered(&self) -> usize {
        self.registered
    }

    /// Stop routing panics to any logger. The hook stays installed and
    /// defers to the previous one.
    pub fn clear() {
        PANIC_TARGET.lock().take();
    }
}

/// Level panics are logged at.
pub fn panic_level(options: &ErrorHandlerOptions) -> Level {
    options
        .level_map
        .get(PANIC_ERROR_TYPE)
        .copied()
        .unwrap_or(Level::Critical)
}

fn payload_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Box<dyn Any>".to_string()
    }
}

impl ErrorHandlerRegistrar for PanicHookRegistrar {
    fn register(&mut self, logger: &Arc<Logger>, options: &ErrorHandlerOptions) -> Result<()> {
        if !options.error_types.includes(PANIC_ERROR_TYPE) {
            tracing::debug!(
                channel = logger.name(),
                "Panics excluded by errorTypes, panic routing unchanged"
            );
            return Ok(());
        }

        let level = panic_level(options);
        install_hook();
        let replaced = PANIC_TARGET.lock().replace(PanicTarget {
            logger: Arc::downgrade(logger),
            level,
            call_previous: options.call_previous,
        });

        self.registered += 1;
        tracing::debug!(
            channel = logger.name(),
            %level,
            replaced = replaced.is_some(),
            "Routing panics to logger"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::TestHandler;
    use logweave_types::{ErrorTypes, Handler};

    // The hook and its target are process-wide.
    static SERIAL: Mutex<()> = parking_lot::const_mutex(());

    fn logger_with_test_handler(name: &str) -> (Arc<Logger>, Arc<dyn Handler>) {
        let mut logger = Logger::new(name);
        logger.push_handler(Box::new(TestHandler::new()));
        let handler = Arc::clone(&logger.handlers()[0]);
        (Arc::new(logger), handler)
    }

    fn records(handler: &Arc<dyn Handler>) -> usize {
        handler
            .as_any()
            .downcast_ref::<TestHandler>()
            .unwrap()
            .records()
            .len()
    }

    fn quiet_options() -> ErrorHandlerOptions {
        ErrorHandlerOptions {
            call_previous: false,
            ..ErrorHandlerOptions::default()
        }
    }

    #[test]
    fn test_panic_level() {
        let mut options = ErrorHandlerOptions::default();
        assert_eq!(panic_level(&options), Level::Critical);
        options.level_map.insert("panic".to_string(), Level::Alert);
        assert_eq!(panic_level(&options), Level::Alert);
    }

    #[test]
    fn test_payload_message() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(payload_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(payload_message(payload.as_ref()), "bang");
    }

    #[test]
    fn test_excluded_error_types_register_nothing() {
        let logger = Arc::new(Logger::new("app"));
        let options = ErrorHandlerOptions {
            error_types: ErrorTypes::List(vec!["warning".to_string()]),
            ..ErrorHandlerOptions::default()
        };

        let mut registrar = PanicHookRegistrar::new();
        registrar.register(&logger, &options).unwrap();
        assert_eq!(registrar.registered(), 0);
    }

    #[test]
    fn test_panic_is_logged() {
        let _serial = SERIAL.lock();
        let (logger, handler) = logger_with_test_handler("app");

        let mut registrar = PanicHookRegistrar::new();
        registrar.register(&logger, &quiet_options()).unwrap();
        assert_eq!(registrar.registered(), 1);

        let result = panic::catch_unwind(|| panic!("disk on fire"));
        PanicHookRegistrar::clear();
        assert!(result.is_err());

        let handler = handler.as_any().downcast_ref::<TestHandler>().unwrap();
        assert!(handler.has_record("Uncaught panic: disk on fire", Level::Critical));
    }

    #[test]
    fn test_later_registration_replaces_target() {
        let _serial = SERIAL.lock();
        let mut registrar = PanicHookRegistrar::new();

        let (first, first_handler) = logger_with_test_handler("app");
        registrar.register(&first, &quiet_options()).unwrap();
        let first_weak = Arc::downgrade(&first);
        drop(first);
        assert!(first_weak.upgrade().is_none());

        let (second, second_handler) = logger_with_test_handler("app");
        registrar.register(&second, &quiet_options()).unwrap();

        let _ = panic::catch_unwind(|| panic!("once"));
        PanicHookRegistrar::clear();

        assert_eq!(records(&first_handler), 0);
        assert_eq!(records(&second_handler), 1);
        assert_eq!(registrar.registered(), 2);
    }

    #[test]
    fn test_dropped_logger_is_skipped() {
        let _serial = SERIAL.lock();
        let (logger, handler) = logger_with_test_handler("app");

        let mut registrar = PanicHookRegistrar::new();
        registrar.register(&logger, &quiet_options()).unwrap();
        drop(logger);

        let _ = panic::catch_unwind(|| panic!("nobody listening"));
        PanicHookRegistrar::clear();
        assert_eq!(records(&handler), 0);
    }

    #[test]
    fn test_reported_only_flag_still_logs_panics() {
        let _serial = SERIAL.lock();
        let (logger, handler) = logger_with_test_handler("app");
        let options = ErrorHandlerOptions {
            handle_only_reported_errors: true,
            ..quiet_options()
        };

        let mut registrar = PanicHookRegistrar::new();
        registrar.register(&logger, &options).unwrap();

        let _ = panic::catch_unwind(|| panic!("still reported"));
        PanicHookRegistrar::clear();
        assert_eq!(records(&handler), 1);
    }
}
