//! # Logweave Factory
//!
//! Resolves channel names to fully assembled loggers:
//!
//! - [`LoggerFactory`]: channel lookup, `other` fallback, `extends`
//!   inheritance, per-session memoization and cycle detection
//! - [`ComponentBuilder`]: handler/processor construction from named or
//!   inline specs, with name-based parameter binding
//! - [`ResolutionSession`]: the per-session channel registry
//!
//! ## Example
//!
//! ```rust,no_run
//! use logweave_factory::LoggerFactory;
//!
//! let mut factory = LoggerFactory::from_path("/etc/myapp/logweave.yaml")?;
//! let logger = factory.get_logger(Some("billing"))?;
//! logger.info("invoice sent")?;
//! # Ok::<(), logweave_types::LogweaveError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod session;
pub mod builder;
pub mod resolver;

pub use session::ResolutionSession;
pub use builder::ComponentBuilder;
pub use resolver::LoggerFactory;
