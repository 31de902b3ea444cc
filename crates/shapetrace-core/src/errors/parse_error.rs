//! Source parsing errors raised while building syntax trees.

use super::error_code::{self, TraceErrorCode};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Grammar not found for language: {language}")]
    GrammarNotFound { language: String },

    #[error("Tree-sitter error in {path}: {message}")]
    TreeSitterError { path: String, message: String },

    #[error("Syntax nesting in {path} exceeds {limit} levels")]
    TooDeep { path: String, limit: usize },
}

impl TraceErrorCode for ParseError {
    fn error_code(&self) -> &'static str {
        error_code::PARSE_ERROR
    }
}
