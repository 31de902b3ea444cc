//! `PatternMatcher` capability trait and the pack-driven `DefinitionMatcher`.

use std::sync::Arc;

use crate::extraction::{extract_location, SchemaLocation};
use crate::syntax::query;
use crate::syntax::{Field, NodeId, NodeKind, SyntaxTree};

use super::types::{
    CaptureSource, CaptureValue, MatchCaptures, MatchContext, MatchResult, PatternDef,
    PatternType,
};

/// Recognizes one construct family and reports a structured match.
///
/// Implementations must be stateless with respect to scans: the registry shares one
/// instance across threads.
pub trait PatternMatcher: Send + Sync {
    fn name(&self) -> &str;

    fn framework(&self) -> &str;

    fn supported_types(&self) -> &[PatternType];

    /// Try to match `node`. `None` means "not mine".
    fn match_node(
        &self,
        tree: &SyntaxTree,
        node: NodeId,
        ctx: &MatchContext<'_>,
    ) -> Option<MatchResult>;

    /// One-line rendering used in validation errors and logs.
    fn describe(&self) -> String {
        let types: Vec<&str> = self.supported_types().iter().map(|t| t.name()).collect();
        format!(
            "{{ name: {:?}, framework: {:?}, supported_types: [{}] }}",
            self.name(),
            self.framework(),
            types.join(", ")
        )
    }
}

/// Matcher backed by an ordered list of [`PatternDef`]s; the first definition that
/// matches wins.
#[derive(Debug, Clone)]
pub struct DefinitionMatcher {
    name: String,
    framework: String,
    supported_types: Vec<PatternType>,
    patterns: Vec<Arc<PatternDef>>,
}

impl DefinitionMatcher {
    /// Supported types are derived from the definitions.
    pub fn new(name: impl Into<String>, framework: impl Into<String>, patterns: Vec<PatternDef>) -> Self {
        let mut supported_types: Vec<PatternType> =
            patterns.iter().map(|p| p.pattern_type).collect();
        supported_types.sort();
        supported_types.dedup();
        Self {
            name: name.into(),
            framework: framework.into(),
            supported_types,
            patterns: patterns.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn patterns(&self) -> &[Arc<PatternDef>] {
        &self.patterns
    }

    fn try_pattern(
        &self,
        def: &Arc<PatternDef>,
        tree: &SyntaxTree,
        node: NodeId,
        ctx: &MatchContext<'_>,
    ) -> Option<MatchResult> {
        let site = match def.pattern_type {
            PatternType::Call => match_call(def, tree, node)?,
            PatternType::Chain => match_chain(def, tree, node)?,
            PatternType::Decorator => match_decorator(def, tree, node)?,
            PatternType::Property => match_property(def, tree, node)?,
            PatternType::Export => match_export(def, tree, node)?,
        };
        if let Some(validate) = &def.validate {
            if !validate(tree, node) {
                return None;
            }
        }

        let identifier = match &def.identifier {
            Some(loc) => literal_text(tree, extract_location(tree, site.anchor(loc), loc)?)?,
            None => default_identifier(tree, node, &site)?,
        };

        let mut captures = MatchCaptures {
            input_schema: def
                .input_location
                .as_ref()
                .and_then(|loc| extract_location(tree, site.anchor(loc), loc)),
            output_schema: def
                .output_location
                .as_ref()
                .and_then(|loc| extract_location(tree, site.anchor(loc), loc)),
            ..MatchCaptures::default()
        };
        for (name, source) in &def.captures {
            match source {
                CaptureSource::Constant(value) => captures.set_text(name, value.clone()),
                CaptureSource::CalleeName { uppercase } => {
                    let value = if *uppercase {
                        site.name.to_uppercase()
                    } else {
                        site.name.clone()
                    };
                    captures.set_text(name, value);
                }
                CaptureSource::Location(loc) => {
                    let Some(found) = extract_location(tree, site.anchor(loc), loc) else {
                        continue;
                    };
                    match literal_text(tree, found) {
                        Some(text) => captures.set_text(name, text),
                        None => {
                            captures.extra.insert(name.clone(), CaptureValue::Node(found));
                        }
                    }
                }
            }
        }

        Some(MatchResult {
            pattern: Arc::clone(def),
            matcher: self.name.clone(),
            node,
            framework: self.framework.clone(),
            identifier,
            location: tree.location(node, ctx.file),
            captures,
        })
    }
}

impl PatternMatcher for DefinitionMatcher {
    fn name(&self) -> &str {
        &self.name
    }

    fn framework(&self) -> &str {
        &self.framework
    }

    fn supported_types(&self) -> &[PatternType] {
        &self.supported_types
    }

    fn match_node(
        &self,
        tree: &SyntaxTree,
        node: NodeId,
        ctx: &MatchContext<'_>,
    ) -> Option<MatchResult> {
        self.patterns
            .iter()
            .filter(|def| ctx.node_types.contains(&def.pattern_type))
            .find_map(|def| self.try_pattern(def, tree, node, ctx))
    }
}

/// What a pattern matched on: the called/declared name, and the nodes locations
/// resolve against.
struct MatchSite {
    name: String,
    /// Anchor for every location except `DecoratorArg`.
    target: NodeId,
    decorator: Option<NodeId>,
}

impl MatchSite {
    fn anchor(&self, loc: &SchemaLocation) -> NodeId {
        match (loc, self.decorator) {
            (SchemaLocation::DecoratorArg(_), Some(decorator)) => decorator,
            _ => self.target,
        }
    }
}

fn receiver_ok(def: &PatternDef, path: Option<&str>) -> bool {
    match (&def.receiver, path) {
        (None, _) => true,
        (Some(pattern), Some(path)) => pattern.matches(path),
        (Some(_), None) => false,
    }
}

fn match_call(def: &PatternDef, tree: &SyntaxTree, node: NodeId) -> Option<MatchSite> {
    if tree.kind(node) != NodeKind::Call {
        return None;
    }
    let name = query::callee_name(tree, node)?;
    if !def.signature.matches(name) {
        return None;
    }
    let receiver = query::callee_receiver(tree, node).and_then(|r| query::member_path(tree, r));
    receiver_ok(def, receiver.as_deref()).then(|| MatchSite {
        name: name.to_string(),
        target: node,
        decorator: None,
    })
}

/// Method call on another call; the receiver pattern applies to the chain's root.
fn match_chain(def: &PatternDef, tree: &SyntaxTree, node: NodeId) -> Option<MatchSite> {
    if tree.kind(node) != NodeKind::Call || !query::is_chained_call(tree, node) {
        return None;
    }
    let name = query::callee_name(tree, node)?;
    if !def.signature.matches(name) {
        return None;
    }
    let mut root = query::callee_receiver(tree, node)?;
    while tree.kind(root) == NodeKind::Call {
        root = query::callee_receiver(tree, root)?;
    }
    let path = query::member_path(tree, root);
    receiver_ok(def, path.as_deref()).then(|| MatchSite {
        name: name.to_string(),
        target: node,
        decorator: None,
    })
}

/// `@Get('/x')` or `@Get`. The signature matches the last path segment and the
/// receiver the prefix (`@nestjs.Get` → receiver `nestjs`).
fn match_decorator(def: &PatternDef, tree: &SyntaxTree, node: NodeId) -> Option<MatchSite> {
    if tree.kind(node) != NodeKind::Decorator {
        return None;
    }
    let expr = tree.child_by_field(node, Field::Expression)?;
    let path_node = match tree.kind(expr) {
        NodeKind::Call => query::call_callee(tree, expr)?,
        _ => expr,
    };
    let path = query::member_path(tree, path_node)?;
    let (receiver, name) = match path.rsplit_once('.') {
        Some((receiver, name)) => (Some(receiver), name),
        None => (None, path.as_str()),
    };
    if !def.signature.matches(name) || !receiver_ok(def, receiver) {
        return None;
    }
    Some(MatchSite {
        name: name.to_string(),
        target: decorated_target(tree, node).unwrap_or(node),
        decorator: Some(node),
    })
}

/// The member or class a decorator applies to.
fn decorated_target(tree: &SyntaxTree, decorator: NodeId) -> Option<NodeId> {
    let parent = tree.parent(decorator)?;
    if matches!(
        tree.kind(parent),
        NodeKind::Function | NodeKind::ClassField | NodeKind::Class
    ) {
        return Some(parent);
    }
    // Method decorators sit next to the method in the class body.
    let siblings = tree.children(parent);
    let at = siblings.iter().position(|&s| s == decorator)?;
    siblings[at + 1..]
        .iter()
        .copied()
        .find(|&s| tree.kind(s) != NodeKind::Decorator)
        .filter(|&s| matches!(tree.kind(s), NodeKind::Function | NodeKind::ClassField | NodeKind::Class))
}

/// Object entry or class field whose key matches. The receiver is the enclosing
/// call's callee path (`router` in `router({ ... })`) or the class name.
fn match_property(def: &PatternDef, tree: &SyntaxTree, node: NodeId) -> Option<MatchSite> {
    let key = match tree.kind(node) {
        NodeKind::Pair => query::pair_key(tree, node)?,
        NodeKind::ClassField => tree
            .child_by_field(node, Field::Name)
            .or_else(|| tree.child_by_field(node, Field::Property))
            .map(|n| tree.text(n).to_string())?,
        _ => return None,
    };
    if !def.signature.matches(&key) {
        return None;
    }
    let owner = property_owner(tree, node);
    receiver_ok(def, owner.as_deref()).then(|| MatchSite {
        name: key,
        target: node,
        decorator: None,
    })
}

fn property_owner(tree: &SyntaxTree, node: NodeId) -> Option<String> {
    let container = tree.parent(node)?;
    match tree.kind(container) {
        NodeKind::Object => {
            let args = tree.parent(container)?;
            let call = if tree.kind(args) == NodeKind::Arguments {
                tree.parent(args)?
            } else {
                args
            };
            query::call_callee(tree, call).and_then(|c| query::member_path(tree, c))
        }
        _ => tree
            .ancestors(node)
            .find(|&a| tree.kind(a) == NodeKind::Class)
            .and_then(|class| tree.child_by_field(class, Field::Name))
            .map(|n| tree.text(n).to_string()),
    }
}

/// `export const NAME = ...` / `export function NAME() {}`. The target is the
/// declarator or the function.
fn match_export(def: &PatternDef, tree: &SyntaxTree, node: NodeId) -> Option<MatchSite> {
    if tree.kind(node) != NodeKind::Export {
        return None;
    }
    let (name, target) = exported_binding(tree, node)?;
    if !def.signature.matches(&name) || !receiver_ok(def, None) {
        return None;
    }
    Some(MatchSite {
        name,
        target,
        decorator: None,
    })
}

fn exported_binding(tree: &SyntaxTree, export: NodeId) -> Option<(String, NodeId)> {
    let declaration = tree.child_by_field(export, Field::Declaration)?;
    tree.descendants(declaration).find_map(|id| {
        if !matches!(
            tree.kind(id),
            NodeKind::Declarator | NodeKind::Function | NodeKind::Class
        ) {
            return None;
        }
        let name = tree.child_by_field(id, Field::Name)?;
        (tree.kind(name) == NodeKind::Identifier).then(|| (tree.text(name).to_string(), id))
    })
}

/// Identifier when the pattern does not name a location.
fn default_identifier(tree: &SyntaxTree, node: NodeId, site: &MatchSite) -> Option<String> {
    match tree.kind(node) {
        NodeKind::Call => {
            // Outermost call/await wrapping the match, then its binding site.
            let mut outer = node;
            while let Some(parent) = tree.parent(outer) {
                if matches!(tree.kind(parent), NodeKind::Await) {
                    outer = parent;
                } else {
                    break;
                }
            }
            if let Some(parent) = tree.parent(outer) {
                if tree.kind(parent) == NodeKind::Pair && tree.node(outer).field == Some(Field::Value) {
                    return query::pair_key(tree, parent);
                }
                if tree.kind(parent) == NodeKind::Declarator {
                    if let Some(name) = tree.child_by_field(parent, Field::Name) {
                        return Some(tree.text(name).to_string());
                    }
                }
            }
            let first_string = query::call_arguments(tree, node)
                .first()
                .copied()
                .filter(|&a| tree.kind(a) == NodeKind::String);
            Some(match first_string {
                Some(arg) => tree.text(arg).to_string(),
                None => site.name.clone(),
            })
        }
        NodeKind::Decorator => tree
            .child_by_field(site.target, Field::Name)
            .map(|n| tree.text(n).to_string())
            .or_else(|| Some(site.name.clone())),
        _ => Some(site.name.clone()),
    }
}

/// Text of a string/number/boolean literal or identifier.
fn literal_text(tree: &SyntaxTree, node: NodeId) -> Option<String> {
    match tree.kind(node) {
        NodeKind::String | NodeKind::Number | NodeKind::Boolean | NodeKind::Identifier => {
            Some(tree.text(node).to_string())
        }
        _ => None,
    }
}
