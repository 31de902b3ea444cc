//! Comparator configuration.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_MAX_EDIT_DISTANCE, DEFAULT_SIMILARITY_THRESHOLD};

/// Configuration for the schema comparator and its typo detection.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct CompareConfig {
    /// One of `producer_to_consumer`, `consumer_to_producer`, `bidirectional`.
    /// Parsed by the comparator; default `producer_to_consumer`.
    pub direction: Option<String>,
    /// Minimum name similarity (0.0-1.0) to suggest a canonical name. Default: 0.8.
    pub similarity_threshold: Option<f64>,
    /// Edit distance that always qualifies as a typo. Default: 1.
    pub max_edit_distance: Option<usize>,
}

impl CompareConfig {
    pub fn effective_similarity_threshold(&self) -> f64 {
        self.similarity_threshold
            .unwrap_or(DEFAULT_SIMILARITY_THRESHOLD)
    }

    pub fn effective_max_edit_distance(&self) -> usize {
        self.max_edit_distance.unwrap_or(DEFAULT_MAX_EDIT_DISTANCE)
    }
}
