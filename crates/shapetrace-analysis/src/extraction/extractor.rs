//! Location extractor: one entry point, dispatched on [`SchemaLocation`].
//!
//! Pure and infallible. Returns `None` when the location does not apply to the node;
//! adapters decide whether that is an error.

use crate::syntax::query;
use crate::syntax::{Field, NodeId, NodeKind, SyntaxTree};

use super::location::SchemaLocation;

/// Resolve `location` relative to `node`.
pub fn extract_location(
    tree: &SyntaxTree,
    node: NodeId,
    location: &SchemaLocation,
) -> Option<NodeId> {
    match location {
        SchemaLocation::Arg(index) => positional_arg(tree, node, *index),
        SchemaLocation::ArgNamed(name) => named_arg(tree, node, name),
        SchemaLocation::Return => return_type(tree, node),
        SchemaLocation::TypeParam(index) => type_param(tree, node, *index),
        SchemaLocation::Body => body(tree, node),
        SchemaLocation::ChainMethod(name) => chain_method(tree, node, name),
        SchemaLocation::DecoratorArg(index) => decorator_arg(tree, node, *index),
    }
}

fn positional_arg(tree: &SyntaxTree, node: NodeId, index: usize) -> Option<NodeId> {
    let call = match tree.kind(node) {
        NodeKind::Call | NodeKind::Arguments => node,
        NodeKind::Decorator => decorator_call(tree, node)?,
        _ => return None,
    };
    query::call_arguments(tree, call).get(index).copied()
}

fn named_arg(tree: &SyntaxTree, node: NodeId, name: &str) -> Option<NodeId> {
    if tree.kind(node) != NodeKind::Call {
        return None;
    }
    query::call_arguments(tree, node)
        .into_iter()
        .filter(|&arg| tree.kind(arg) == NodeKind::Object)
        .find_map(|obj| query::object_get(tree, obj, name))
}

fn return_type(tree: &SyntaxTree, node: NodeId) -> Option<NodeId> {
    let func = query::enclosing_function(tree, node)?;
    let annotation = tree.child_by_field(func, Field::ReturnType)?;
    if tree.kind(annotation) == NodeKind::TypeAnnotation {
        // Unwrap `: T` to `T` when the annotation wraps a single type.
        return tree.children(annotation).first().copied().or(Some(annotation));
    }
    Some(annotation)
}

fn type_param(tree: &SyntaxTree, node: NodeId, index: usize) -> Option<NodeId> {
    let holder = match tree.kind(node) {
        NodeKind::Declarator | NodeKind::ClassField => tree.child_by_field(node, Field::Type)?,
        _ => node,
    };
    query::type_arguments(tree, holder).get(index).copied()
}

fn body(tree: &SyntaxTree, node: NodeId) -> Option<NodeId> {
    match tree.kind(node) {
        NodeKind::Function => {
            let body = tree.child_by_field(node, Field::Body)?;
            if tree.kind(body) == NodeKind::Block {
                query::first_return_expression(tree, body)
            } else {
                Some(body)
            }
        }
        NodeKind::Declarator | NodeKind::ClassField => tree.child_by_field(node, Field::Init),
        NodeKind::Pair => query::pair_value(tree, node),
        _ => Some(node),
    }
}

/// Phase 1 walks the fluent chain the call belongs to: the call itself, then its
/// receiver calls, then the calls it is a receiver of. Phase 2 runs only when phase 1
/// finds nothing and searches descendant calls in pre-order.
fn chain_method(tree: &SyntaxTree, node: NodeId, name: &str) -> Option<NodeId> {
    if tree.kind(node) != NodeKind::Call {
        return None;
    }

    let first_arg_if_named = |call: NodeId| -> Option<NodeId> {
        if query::callee_name(tree, call) == Some(name) {
            query::call_arguments(tree, call).first().copied()
        } else {
            None
        }
    };

    // Phase 1a: self and receivers.
    let mut current = Some(node);
    while let Some(call) = current {
        if let Some(arg) = first_arg_if_named(call) {
            return Some(arg);
        }
        current = query::callee_receiver(tree, call).filter(|&r| tree.kind(r) == NodeKind::Call);
    }

    // Phase 1b: calls this one is the receiver of.
    let mut inner = node;
    while let Some(outer) = enclosing_chain_call(tree, inner) {
        if let Some(arg) = first_arg_if_named(outer) {
            return Some(arg);
        }
        inner = outer;
    }

    // Phase 2: descendant calls.
    tree.descendants(node)
        .skip(1)
        .filter(|&d| tree.kind(d) == NodeKind::Call)
        .find_map(first_arg_if_named)
}

/// For `inner` in `inner.method(...)`, the outer call.
fn enclosing_chain_call(tree: &SyntaxTree, inner: NodeId) -> Option<NodeId> {
    if tree.node(inner).field != Some(Field::Object) {
        return None;
    }
    let member = tree.parent(inner)?;
    if tree.kind(member) != NodeKind::Member || tree.node(member).field != Some(Field::Callee) {
        return None;
    }
    let outer = tree.parent(member)?;
    (tree.kind(outer) == NodeKind::Call).then_some(outer)
}

fn decorator_arg(tree: &SyntaxTree, node: NodeId, index: usize) -> Option<NodeId> {
    if tree.kind(node) != NodeKind::Decorator {
        return None;
    }
    let call = decorator_call(tree, node)?;
    query::call_arguments(tree, call).get(index).copied()
}

fn decorator_call(tree: &SyntaxTree, decorator: NodeId) -> Option<NodeId> {
    tree.child_by_field(decorator, Field::Expression)
        .filter(|&e| tree.kind(e) == NodeKind::Call)
}
