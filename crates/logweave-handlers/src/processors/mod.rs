//! Processor (enricher) implementations.

pub mod psr;
pub mod uid;
pub mod tag;
pub mod process_id;

pub use psr::PsrLogMessageProcessor;
pub use uid::UidProcessor;
pub use tag::TagProcessor;
pub use process_id::ProcessIdProcessor;
