//! Error taxonomy. One `thiserror` enum per subsystem, each with a stable error code.
//!
//! Registry and extraction errors are caller-correctable input errors; none of these
//! represent internal faults.

pub mod compare_error;
pub mod config_error;
pub mod error_code;
pub mod extraction_error;
pub mod pack_error;
pub mod parse_error;
pub mod registry_error;

pub use compare_error::CompareError;
pub use config_error::ConfigError;
pub use error_code::TraceErrorCode;
pub use extraction_error::ExtractionError;
pub use pack_error::PackError;
pub use parse_error::ParseError;
pub use registry_error::RegistryError;
