//! Single-target extraction errors. Bulk listing never produces these.

use super::error_code::{self, TraceErrorCode};

/// Errors raised by `SchemaAdapter::extract` for one schema reference.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractionError {
    #[error("{adapter}: missing required option \"{option}\"")]
    MissingOption { adapter: String, option: String },

    #[error("{adapter}: {target_kind} \"{name}\" not found in {path}")]
    TargetNotFound {
        adapter: String,
        target_kind: &'static str,
        name: String,
        path: String,
    },

    #[error("{adapter}: unsupported reference id \"{id}\": {reason}")]
    UnsupportedRef {
        adapter: String,
        id: String,
        reason: String,
    },

    #[error("{adapter}: cannot read {path}: {message}")]
    Io {
        adapter: String,
        path: String,
        message: String,
    },

    #[error("{adapter}: failed to parse {path}: {message}")]
    Parse {
        adapter: String,
        path: String,
        message: String,
    },
}

impl TraceErrorCode for ExtractionError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::MissingOption { .. } => error_code::EXTRACT_MISSING_OPTION,
            Self::TargetNotFound { .. } => error_code::EXTRACT_TARGET_NOT_FOUND,
            Self::UnsupportedRef { .. } => error_code::EXTRACT_UNSUPPORTED_REF,
            Self::Io { .. } => error_code::EXTRACT_IO,
            Self::Parse { .. } => error_code::EXTRACT_PARSE,
        }
    }
}
