//! Comparator options and results.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use shapetrace_core::config::CompareConfig;
use shapetrace_core::constants::{DEFAULT_MAX_EDIT_DISTANCE, DEFAULT_SIMILARITY_THRESHOLD};
use shapetrace_core::errors::CompareError;
use shapetrace_core::SourceLocation;

use super::direction::Direction;

/// Kind of contract disagreement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueType {
    UnknownTool,
    ArgumentError,
    MissingProperty,
    /// Reserved for type-level checks. Never emitted by [`compare_schemas`](super::compare_schemas).
    TypeMismatch,
}

impl IssueType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UnknownTool => "UNKNOWN_TOOL",
            Self::ArgumentError => "ARGUMENT_ERROR",
            Self::MissingProperty => "MISSING_PROPERTY",
            Self::TypeMismatch => "TYPE_MISMATCH",
        }
    }
}

/// One disagreement between a consumer and its producer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mismatch {
    pub tool_name: String,
    pub issue_type: IssueType,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub producer_definition: Option<SourceLocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consumer_usage: Option<SourceLocation>,
    /// Canonical name suggested by typo detection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

/// A consumer/producer pair with no disagreements.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub tool_name: String,
    pub producer_definition: SourceLocation,
    pub consumer_usage: SourceLocation,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceResult {
    pub matches: Vec<Match>,
    pub mismatches: Vec<Mismatch>,
}

/// Counts for reporting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceSummary {
    pub matches: usize,
    pub mismatches: usize,
    pub by_issue: BTreeMap<IssueType, usize>,
}

impl TraceResult {
    pub fn is_clean(&self) -> bool {
        self.mismatches.is_empty()
    }

    pub fn count(&self, issue: IssueType) -> usize {
        self.mismatches.iter().filter(|m| m.issue_type == issue).count()
    }

    pub fn mismatches_for<'a>(&'a self, tool: &'a str) -> impl Iterator<Item = &'a Mismatch> + 'a {
        self.mismatches.iter().filter(move |m| m.tool_name == tool)
    }

    pub fn summary(&self) -> TraceSummary {
        let mut by_issue = BTreeMap::new();
        for mismatch in &self.mismatches {
            *by_issue.entry(mismatch.issue_type).or_insert(0) += 1;
        }
        TraceSummary {
            matches: self.matches.len(),
            mismatches: self.mismatches.len(),
            by_issue,
        }
    }
}

/// Comparator options. Build from config or a direction string; both validate the
/// direction before any comparison runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompareOptions {
    pub direction: Direction,
    /// Minimum similarity score for a typo suggestion.
    pub similarity_threshold: f64,
    /// Edit distance that always counts as a typo.
    pub max_edit_distance: usize,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            direction: Direction::default(),
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            max_edit_distance: DEFAULT_MAX_EDIT_DISTANCE,
        }
    }
}

impl CompareOptions {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            ..Self::default()
        }
    }

    pub fn from_direction_str(direction: &str) -> Result<Self, CompareError> {
        Ok(Self::new(direction.parse()?))
    }

    pub fn from_config(config: &CompareConfig) -> Result<Self, CompareError> {
        let direction = match &config.direction {
            Some(raw) => raw.parse()?,
            None => Direction::default(),
        };
        Ok(Self {
            direction,
            similarity_threshold: config.effective_similarity_threshold(),
            max_edit_distance: config.effective_max_edit_distance(),
        })
    }
}
