//! Registry-level errors: fail fast, always carry the available keys.

use crate::constants::NONE_REGISTERED;

use super::error_code::{self, TraceErrorCode};

/// Errors raised by the matcher and adapter registries.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("invalid {registry} entry: missing {}; got {entry}", .missing.join(", "))]
    Validation {
        registry: &'static str,
        missing: Vec<&'static str>,
        /// Debug rendering of the rejected (partial) entry.
        entry: String,
    },

    #[error("{registry} entry \"{requested}\" not found; available: {}", format_available(.available))]
    NotFound {
        registry: &'static str,
        requested: String,
        available: Vec<String>,
    },
}

impl RegistryError {
    /// Keys that were registered when the lookup failed. Empty for validation errors.
    pub fn available(&self) -> &[String] {
        match self {
            Self::NotFound { available, .. } => available,
            Self::Validation { .. } => &[],
        }
    }
}

fn format_available(available: &[String]) -> String {
    if available.is_empty() {
        NONE_REGISTERED.to_string()
    } else {
        available.join(", ")
    }
}

impl TraceErrorCode for RegistryError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => error_code::REGISTRY_VALIDATION,
            Self::NotFound { .. } => error_code::REGISTRY_NOT_FOUND,
        }
    }
}
