//! Top-level configuration document.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{CompareConfig, PackConfig, ScanConfig};
use crate::errors::ConfigError;

/// Root of `shapetrace.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct TraceConfig {
    pub compare: CompareConfig,
    pub scan: ScanConfig,
    pub packs: PackConfig,
}

impl TraceConfig {
    /// Parse and validate a TOML document. An empty string yields defaults.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse, and validate a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let config = Self::from_toml(&content)?;
        ::tracing::debug!(path = %path.display(), "loaded shapetrace config");
        Ok(config)
    }

    /// Serialize back to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string(self).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })
    }

    /// Reject values outside their documented ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(threshold) = self.compare.similarity_threshold {
            if !(0.0..=1.0).contains(&threshold) {
                return Err(ConfigError::InvalidValue {
                    field: "compare.similarity_threshold".to_string(),
                    message: format!("{threshold} is outside 0.0..=1.0"),
                });
            }
        }
        if let Some(direction) = &self.compare.direction {
            if !matches!(
                direction.as_str(),
                "producer_to_consumer" | "consumer_to_producer" | "bidirectional"
            ) {
                return Err(ConfigError::InvalidValue {
                    field: "compare.direction".to_string(),
                    message: format!("unknown direction \"{direction}\""),
                });
            }
        }
        if self.scan.max_depth == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "scan.max_depth".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
