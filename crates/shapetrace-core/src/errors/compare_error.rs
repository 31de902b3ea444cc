//! Comparator option errors. Data-level disagreements are never errors.

use super::error_code::{self, TraceErrorCode};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompareError {
    #[error("invalid comparison direction \"{value}\"; expected producer_to_consumer, consumer_to_producer, or bidirectional")]
    InvalidDirection { value: String },
}

impl TraceErrorCode for CompareError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidDirection { .. } => error_code::COMPARE_INVALID_DIRECTION,
        }
    }
}
