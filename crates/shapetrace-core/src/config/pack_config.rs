//! Pattern pack selection.

use serde::{Deserialize, Serialize};

use crate::constants::CUSTOM_PACK_DIR;

/// Which built-in packs load, and where custom packs live.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct PackConfig {
    /// Directory of user `.toml` packs. Default: `.shapetrace/patterns`.
    pub custom_dir: Option<String>,
    /// Built-in pack names to skip.
    #[serde(default)]
    pub disabled: Vec<String>,
    /// If set, only these built-in packs load.
    pub enabled_only: Option<Vec<String>>,
}

impl PackConfig {
    pub fn effective_custom_dir(&self) -> &str {
        self.custom_dir.as_deref().unwrap_or(CUSTOM_PACK_DIR)
    }

    /// Whether the named built-in pack is filtered out by this config.
    pub fn is_disabled(&self, name: &str) -> bool {
        if let Some(ref enabled) = self.enabled_only {
            return !enabled.iter().any(|e| e == name);
        }
        self.disabled.iter().any(|d| d == name)
    }
}
