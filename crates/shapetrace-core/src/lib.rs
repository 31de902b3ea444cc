//! # shapetrace-core
//!
//! Foundation crate for the shapetrace contract analyzer.
//! Defines shared types, errors, config, tracing setup, and constants.
//! Every other crate in the workspace depends on this.

pub mod config;
pub mod constants;
pub mod errors;
pub mod tracing;
pub mod types;

// Re-export the most commonly used types at the crate root.
pub use config::TraceConfig;
pub use errors::error_code::TraceErrorCode;
pub use types::collections::{FxHashMap, FxHashSet};
pub use types::location::SourceLocation;
