//! Stable, wire-safe error codes shared by every error enum.

/// Implemented by every error enum so reports can carry a stable code string.
pub trait TraceErrorCode {
    fn error_code(&self) -> &'static str;
}

pub const REGISTRY_VALIDATION: &str = "REGISTRY_VALIDATION";
pub const REGISTRY_NOT_FOUND: &str = "REGISTRY_NOT_FOUND";
pub const EXTRACT_MISSING_OPTION: &str = "EXTRACT_MISSING_OPTION";
pub const EXTRACT_TARGET_NOT_FOUND: &str = "EXTRACT_TARGET_NOT_FOUND";
pub const EXTRACT_UNSUPPORTED_REF: &str = "EXTRACT_UNSUPPORTED_REF";
pub const EXTRACT_IO: &str = "EXTRACT_IO";
pub const EXTRACT_PARSE: &str = "EXTRACT_PARSE";
pub const COMPARE_INVALID_DIRECTION: &str = "COMPARE_INVALID_DIRECTION";
pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
pub const CONFIG_INVALID_VALUE: &str = "CONFIG_INVALID_VALUE";
pub const PACK_ERROR: &str = "PACK_ERROR";
pub const PACK_INVALID_PATTERN: &str = "PACK_INVALID_PATTERN";
pub const PARSE_ERROR: &str = "PARSE_ERROR";
