//! Pattern pack loading errors.

use super::error_code::{self, TraceErrorCode};

#[derive(Debug, thiserror::Error)]
pub enum PackError {
    #[error("Pattern pack parse error: {message}")]
    ParseError { message: String },

    #[error("Invalid pattern {pattern_id} in pack {pack}: {message}")]
    InvalidPattern {
        pack: String,
        pattern_id: String,
        message: String,
    },

    #[error("Cannot read pattern pack {path}: {message}")]
    Io { path: String, message: String },
}

impl TraceErrorCode for PackError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidPattern { .. } => error_code::PACK_INVALID_PATTERN,
            _ => error_code::PACK_ERROR,
        }
    }
}
