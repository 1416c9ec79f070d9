//! # Logweave Types
//!
//! Core types, traits, and enums shared across all Logweave crates.
//!
//! This crate provides the fundamental building blocks for assembling loggers
//! from declarative configuration, including:
//!
//! - The fixed level table and its name/rank mapping
//! - Typed views over channel and component configuration entries
//! - The `Handler` / `Processor` component traits and the `Record` they see
//! - Constructor descriptors used to bind configuration by parameter name
//! - Error types and result aliases
//!
//! ## Example
//!
//! ```
//! use logweave_types::Level;
//!
//! assert_eq!(Level::rank_of("WARNING").unwrap(), 300);
//! assert_eq!(Level::name_of(300), Some("warning"));
//! assert!(Level::rank_of("bogus").is_err());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod errors;
pub mod level;
pub mod record;
pub mod traits;
pub mod config;
pub mod descriptor;

// Re-export common types for convenience
pub use errors::{LogweaveError, Result, Section};
pub use level::Level;
pub use record::Record;
pub use traits::{Handler, HandlerOptions, Processor, Rotating};
pub use config::{ChannelSpec, ComponentRef, ComponentSpec, ErrorHandlerOptions, ErrorTypes};
pub use descriptor::{
    Binding, BoundArgs, BoundValue, HandlerDescriptor, ParamDefault, ParamDescriptor, ParamKind,
    ProcessorDescriptor,
};
