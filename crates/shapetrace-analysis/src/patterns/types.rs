//! Runtime pattern definitions and match results.

use std::fmt;
use std::sync::Arc;

use regex::Regex;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use shapetrace_core::SourceLocation;

use crate::extraction::SchemaLocation;
use crate::syntax::{NodeId, SyntaxTree};

/// Construct family a pattern recognizes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
    schemars::JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum PatternType {
    Call,
    Decorator,
    Property,
    Export,
    Chain,
}

impl PatternType {
    pub fn name(self) -> &'static str {
        match self {
            Self::Call => "call",
            Self::Decorator => "decorator",
            Self::Property => "property",
            Self::Export => "export",
            Self::Chain => "chain",
        }
    }
}

/// Whether a pattern marks the declaring side or the calling side of a contract.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, schemars::JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum PatternRole {
    #[default]
    Producer,
    Consumer,
}

/// Exact name or regex. Packs write regexes as `/.../`.
#[derive(Debug, Clone)]
pub enum NamePattern {
    Exact(String),
    Regex(Regex),
}

impl NamePattern {
    /// Parse `/re/` as a regex and anything else as an exact name.
    pub fn parse(raw: &str) -> Result<Self, regex::Error> {
        match raw.strip_prefix('/').and_then(|r| r.strip_suffix('/')) {
            Some(re) if !re.is_empty() => Ok(Self::Regex(Regex::new(re)?)),
            _ => Ok(Self::Exact(raw.to_string())),
        }
    }

    pub fn exact(name: impl Into<String>) -> Self {
        Self::Exact(name.into())
    }

    pub fn matches(&self, candidate: &str) -> bool {
        match self {
            Self::Exact(name) => name == candidate,
            Self::Regex(re) => re.is_match(candidate),
        }
    }
}

impl fmt::Display for NamePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(name) => f.write_str(name),
            Self::Regex(re) => write!(f, "/{}/", re.as_str()),
        }
    }
}

/// Extra acceptance predicate run after the structural match.
pub type Validator = Arc<dyn Fn(&SyntaxTree, NodeId) -> bool + Send + Sync>;

/// Where a capture's value comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureSource {
    Constant(String),
    /// Called method or decorator name; optionally uppercased (`get` → `GET`).
    CalleeName { uppercase: bool },
    /// Literal text at a location.
    Location(SchemaLocation),
}

/// One declarative construct recognizer. Immutable once registered.
#[derive(Clone)]
pub struct PatternDef {
    pub id: String,
    pub pattern_type: PatternType,
    pub role: PatternRole,
    pub signature: NamePattern,
    pub receiver: Option<NamePattern>,
    /// Where the contract name comes from; `None` uses the per-type default.
    pub identifier: Option<SchemaLocation>,
    pub input_location: Option<SchemaLocation>,
    pub output_location: Option<SchemaLocation>,
    pub captures: Vec<(String, CaptureSource)>,
    pub validate: Option<Validator>,
}

impl PatternDef {
    pub fn new(id: impl Into<String>, pattern_type: PatternType, signature: NamePattern) -> Self {
        Self {
            id: id.into(),
            pattern_type,
            role: PatternRole::Producer,
            signature,
            receiver: None,
            identifier: None,
            input_location: None,
            output_location: None,
            captures: Vec::new(),
            validate: None,
        }
    }

    pub fn with_receiver(mut self, receiver: NamePattern) -> Self {
        self.receiver = Some(receiver);
        self
    }

    pub fn with_role(mut self, role: PatternRole) -> Self {
        self.role = role;
        self
    }

    pub fn with_identifier(mut self, location: SchemaLocation) -> Self {
        self.identifier = Some(location);
        self
    }

    pub fn with_input(mut self, location: SchemaLocation) -> Self {
        self.input_location = Some(location);
        self
    }

    pub fn with_output(mut self, location: SchemaLocation) -> Self {
        self.output_location = Some(location);
        self
    }

    pub fn with_capture(mut self, name: impl Into<String>, source: CaptureSource) -> Self {
        self.captures.push((name.into(), source));
        self
    }

    pub fn with_validator(mut self, validate: Validator) -> Self {
        self.validate = Some(validate);
        self
    }
}

impl fmt::Debug for PatternDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternDef")
            .field("id", &self.id)
            .field("pattern_type", &self.pattern_type)
            .field("role", &self.role)
            .field("signature", &self.signature.to_string())
            .field("receiver", &self.receiver.as_ref().map(ToString::to_string))
            .field("identifier", &self.identifier)
            .field("input_location", &self.input_location)
            .field("output_location", &self.output_location)
            .field("captures", &self.captures)
            .field("validate", &self.validate.is_some())
            .finish()
    }
}

/// Open-ended capture value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CaptureValue {
    Text(String),
    Node(NodeId),
}

/// Values captured by a match. Well-known keys get typed fields; the rest go to `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchCaptures {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub procedure_kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<NodeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<NodeId>,
    #[serde(skip_serializing_if = "std::collections::HashMap::is_empty")]
    pub extra: FxHashMap<String, CaptureValue>,
}

impl MatchCaptures {
    /// Store a textual capture under its well-known field or in `extra`.
    pub fn set_text(&mut self, name: &str, value: String) {
        match name {
            "http_method" => self.http_method = Some(value),
            "route_path" => self.route_path = Some(value),
            "procedure_kind" => self.procedure_kind = Some(value),
            "description" => self.description = Some(value),
            other => {
                self.extra.insert(other.to_string(), CaptureValue::Text(value));
            }
        }
    }

    pub fn get_text(&self, name: &str) -> Option<&str> {
        match name {
            "http_method" => self.http_method.as_deref(),
            "route_path" => self.route_path.as_deref(),
            "procedure_kind" => self.procedure_kind.as_deref(),
            "description" => self.description.as_deref(),
            other => match self.extra.get(other) {
                Some(CaptureValue::Text(text)) => Some(text),
                _ => None,
            },
        }
    }
}

/// One recognized construct.
#[derive(Debug, Clone)]
pub struct MatchResult {
    pub pattern: Arc<PatternDef>,
    /// Name of the matcher that produced this result.
    pub matcher: String,
    pub node: NodeId,
    pub framework: String,
    /// Contract name (tool, route, procedure).
    pub identifier: String,
    pub location: SourceLocation,
    pub captures: MatchCaptures,
}

impl MatchResult {
    pub fn role(&self) -> PatternRole {
        self.pattern.role
    }
}

/// Per-node context handed to matchers.
#[derive(Debug, Clone, Copy)]
pub struct MatchContext<'a> {
    /// Label used for match locations.
    pub file: &'a str,
    /// Pattern types the scanner computed for the node.
    pub node_types: &'a [PatternType],
}
