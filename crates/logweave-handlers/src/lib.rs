//! # Logweave Handlers
//!
//! The logger handle and the component implementations the factory
//! assembles it from:
//!
//! - [`Logger`]: named channel with ordered handlers and processors
//! - Handlers: stream, rotating file, buffer, fingers-crossed, null, test
//!   and CouchDB sinks
//! - Processors: message interpolation, uid, tags, process id
//! - [`ComponentRegistry`]: the closed set of classes configuration may name
//! - [`ErrorHandlerRegistrar`]: routing of panics into a logger

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod logger;
pub mod formatter;
pub mod handlers;
pub mod processors;
pub mod registry;
pub mod error_handler;

pub use logger::Logger;
pub use handlers::*;
pub use processors::*;
pub use registry::{class_for_type, ComponentRegistry};
pub use error_handler::{ErrorHandlerRegistrar, PanicHookRegistrar};
