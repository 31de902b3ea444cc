//! Configuration loading and validation errors.

use super::error_code::{self, TraceErrorCode};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config parse error: {message}")]
    ParseError { message: String },

    #[error("Cannot read config {path}: {message}")]
    Io { path: String, message: String },

    #[error("Invalid config value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl TraceErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidValue { .. } => error_code::CONFIG_INVALID_VALUE,
            _ => error_code::CONFIG_ERROR,
        }
    }
}
