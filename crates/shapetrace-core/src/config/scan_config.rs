//! Pattern scan configuration.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_MATCH_LIMIT, DEFAULT_MAX_SCAN_DEPTH};

/// Configuration for pattern scans over syntax trees.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct ScanConfig {
    /// Maximum traversal depth. Default: 512.
    pub max_depth: Option<usize>,
    /// Maximum matches per scan. 0 = unlimited. Default: 0.
    pub match_limit: Option<usize>,
    /// If non-empty, only matchers for these frameworks run.
    #[serde(default)]
    pub frameworks: Vec<String>,
    /// Skip files larger than this many bytes when listing. Default: 1MB (1_048_576).
    pub max_file_size: Option<u64>,
    /// Follow symbolic links while listing. Default: false.
    pub follow_symlinks: Option<bool>,
}

impl ScanConfig {
    /// Returns the effective depth guard, defaulting to 512.
    pub fn effective_max_depth(&self) -> usize {
        self.max_depth.unwrap_or(DEFAULT_MAX_SCAN_DEPTH)
    }

    /// Returns the effective match limit, defaulting to unlimited.
    pub fn effective_match_limit(&self) -> usize {
        self.match_limit.unwrap_or(DEFAULT_MATCH_LIMIT)
    }

    /// Returns the effective max file size, defaulting to 1MB.
    pub fn effective_max_file_size(&self) -> u64 {
        self.max_file_size.unwrap_or(1_048_576)
    }
}
