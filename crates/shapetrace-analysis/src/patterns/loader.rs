//! Pattern pack loader: parses TOML and compiles it into matchers.
//!
//! Signatures and receivers are compiled to regexes at load time. A pattern that
//! fails to compile is skipped with a warning; the rest of the pack still loads.

use std::path::Path;
use std::sync::Arc;

use shapetrace_core::errors::PackError;

use crate::syntax::query;
use crate::syntax::{Field, NodeId, NodeKind, SyntaxTree};

use super::matcher::DefinitionMatcher;
use super::spec::{CalleeCase, CaptureSpec, PackSpec, PatternSpec, ValidateSpec};
use super::types::{CaptureSource, NamePattern, PatternDef, Validator};

/// A compiled pack ready for registration.
#[derive(Debug, Clone)]
pub struct CompiledPack {
    pub name: String,
    pub display_name: String,
    pub languages: Vec<String>,
    pub version: Option<String>,
    pub matchers: Vec<DefinitionMatcher>,
    pub patterns_compiled: usize,
    pub patterns_skipped: usize,
}

/// Load and compile a pack from a TOML string.
pub fn load_from_str(toml_str: &str) -> Result<CompiledPack, PackError> {
    let spec: PackSpec = toml::from_str(toml_str).map_err(|e| PackError::ParseError {
        message: e.to_string(),
    })?;
    Ok(compile_spec(spec))
}

/// Load and compile a pack from a file.
pub fn load_from_file(path: &Path) -> Result<CompiledPack, PackError> {
    let content = std::fs::read_to_string(path).map_err(|e| PackError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    load_from_str(&content)
}

fn compile_spec(spec: PackSpec) -> CompiledPack {
    let pack_name = spec.framework.name;
    let mut matchers = Vec::with_capacity(spec.matchers.len());
    let mut compiled = 0;
    let mut skipped = 0;

    for matcher in spec.matchers {
        let mut defs = Vec::with_capacity(matcher.patterns.len());
        for pattern in matcher.patterns {
            match compile_pattern(&pack_name, pattern) {
                Ok(def) => {
                    compiled += 1;
                    defs.push(def);
                }
                Err(e) => {
                    tracing::warn!(pack = %pack_name, error = %e, "skipping pattern");
                    skipped += 1;
                }
            }
        }
        matchers.push(DefinitionMatcher::new(matcher.name, pack_name.clone(), defs));
    }

    CompiledPack {
        display_name: spec
            .framework
            .display_name
            .unwrap_or_else(|| pack_name.clone()),
        name: pack_name,
        languages: spec.framework.languages,
        version: spec.framework.version,
        matchers,
        patterns_compiled: compiled,
        patterns_skipped: skipped,
    }
}

/// Compile one pattern definition.
pub fn compile_pattern(pack: &str, spec: PatternSpec) -> Result<PatternDef, PackError> {
    let invalid = |message: String| PackError::InvalidPattern {
        pack: pack.to_string(),
        pattern_id: spec.id.clone(),
        message,
    };
    if spec.signature.is_empty() {
        return Err(invalid("empty signature".to_string()));
    }
    let signature = NamePattern::parse(&spec.signature)
        .map_err(|e| invalid(format!("signature {}: {e}", spec.signature)))?;
    let receiver = spec
        .receiver
        .as_deref()
        .map(NamePattern::parse)
        .transpose()
        .map_err(|e| invalid(format!("receiver: {e}")))?;

    let mut def = PatternDef::new(spec.id.clone(), spec.pattern_type, signature).with_role(spec.role);
    def.receiver = receiver;
    def.identifier = spec.identifier;
    def.input_location = spec.input;
    def.output_location = spec.output;
    def.captures = spec
        .captures
        .into_iter()
        .map(|(name, capture)| {
            let source = match capture {
                CaptureSpec::Constant { value } => CaptureSource::Constant(value),
                CaptureSpec::Callee { callee } => CaptureSource::CalleeName {
                    uppercase: callee == CalleeCase::Upper,
                },
                CaptureSpec::Located { from } => CaptureSource::Location(from),
            };
            (name, source)
        })
        .collect();
    def.validate = compile_validator(&spec.validate);
    Ok(def)
}

fn compile_validator(spec: &ValidateSpec) -> Option<Validator> {
    if spec.is_empty() {
        return None;
    }
    let min_args = spec.min_args.unwrap_or(0);
    let string_args = spec.string_args.clone();
    Some(Arc::new(move |tree: &SyntaxTree, node: NodeId| {
        let args = node_arguments(tree, node);
        args.len() >= min_args
            && string_args
                .iter()
                .all(|&i| args.get(i).is_some_and(|&a| tree.kind(a) == NodeKind::String))
    }))
}

/// Arguments of a call, or of a decorator's call form.
fn node_arguments(tree: &SyntaxTree, node: NodeId) -> Vec<NodeId> {
    match tree.kind(node) {
        NodeKind::Decorator => tree
            .child_by_field(node, Field::Expression)
            .map(|e| query::call_arguments(tree, e))
            .unwrap_or_default(),
        _ => query::call_arguments(tree, node),
    }
}
