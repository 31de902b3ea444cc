//! Serde types for pattern pack TOML files.
//!
//! One file per framework. Each `[[matchers]]` entry becomes one registered
//! [`DefinitionMatcher`](super::DefinitionMatcher); its `[[matchers.patterns]]` are
//! tried in file order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::extraction::SchemaLocation;

use super::types::{PatternRole, PatternType};

/// Top-level pack definition.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct PackSpec {
    pub framework: PackMeta,
    #[serde(default)]
    pub matchers: Vec<MatcherSpec>,
}

/// Pack metadata.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct PackMeta {
    /// Framework identifier stamped on every match (e.g. "mcp", "trpc").
    pub name: String,
    pub display_name: Option<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    pub version: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct MatcherSpec {
    pub name: String,
    #[serde(default)]
    pub patterns: Vec<PatternSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct PatternSpec {
    pub id: String,
    #[serde(rename = "type")]
    pub pattern_type: PatternType,
    #[serde(default)]
    pub role: PatternRole,
    /// Exact name, or `/regex/`.
    pub signature: String,
    pub receiver: Option<String>,
    pub identifier: Option<SchemaLocation>,
    pub input: Option<SchemaLocation>,
    pub output: Option<SchemaLocation>,
    #[serde(default)]
    pub captures: BTreeMap<String, CaptureSpec>,
    #[serde(default)]
    pub validate: ValidateSpec,
}

/// `{ value = "GET" }`, `{ callee = "upper" }`, or `{ from = { arg = 0 } }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(untagged)]
pub enum CaptureSpec {
    Constant { value: String },
    Callee { callee: CalleeCase },
    Located { from: SchemaLocation },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum CalleeCase {
    Name,
    Upper,
}

/// Declarative acceptance checks, compiled into a validator closure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ValidateSpec {
    /// Minimum positional argument count.
    pub min_args: Option<usize>,
    /// Argument indices that must be string literals.
    #[serde(default)]
    pub string_args: Vec<usize>,
}

impl ValidateSpec {
    pub fn is_empty(&self) -> bool {
        self.min_args.is_none() && self.string_args.is_empty()
    }
}

/// JSON Schema for [`PackSpec`], for validating custom pack files.
pub fn generate_json_schema() -> schemars::schema::RootSchema {
    schemars::schema_for!(PackSpec)
}
