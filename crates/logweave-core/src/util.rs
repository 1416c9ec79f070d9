//! Common utility functions.

pub mod data;

// Re-export commonly used items
pub use data::{load_yaml, load_yaml_file, to_yaml_string};
