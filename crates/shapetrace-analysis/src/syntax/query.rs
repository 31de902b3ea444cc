//! Shape queries over the neutral tree: calls, members, object literals, functions.
//!
//! Everything here is read-only and returns `None`/empty when a shape does not apply.

use serde_json::{Map, Number, Value};

use super::tree::{Field, NodeId, NodeKind, SyntaxTree};

/// Callee expression of a call.
pub fn call_callee(tree: &SyntaxTree, call: NodeId) -> Option<NodeId> {
    if tree.kind(call) != NodeKind::Call {
        return None;
    }
    tree.child_by_field(call, Field::Callee)
}

/// Positional arguments of a call (or of a bare argument list).
pub fn call_arguments(tree: &SyntaxTree, call: NodeId) -> Vec<NodeId> {
    let list = match tree.kind(call) {
        NodeKind::Arguments => Some(call),
        NodeKind::Call => tree.child_by_field(call, Field::Arguments),
        _ => None,
    };
    list.map(|l| tree.children(l).to_vec()).unwrap_or_default()
}

/// The called name: `foo` for `foo()`, `tool` for `server.tool()`.
pub fn callee_name(tree: &SyntaxTree, call: NodeId) -> Option<&str> {
    let callee = call_callee(tree, call)?;
    match tree.kind(callee) {
        NodeKind::Identifier => Some(tree.text(callee)),
        NodeKind::Member => member_property(tree, callee).map(|p| tree.text(p)),
        _ => None,
    }
}

/// Object side of a method call's callee: `server` in `server.tool()`.
pub fn callee_receiver(tree: &SyntaxTree, call: NodeId) -> Option<NodeId> {
    let callee = call_callee(tree, call)?;
    if tree.kind(callee) != NodeKind::Member {
        return None;
    }
    tree.child_by_field(callee, Field::Object)
}

/// Property name node of a member access.
pub fn member_property(tree: &SyntaxTree, member: NodeId) -> Option<NodeId> {
    tree.child_by_field(member, Field::Property)
}

/// Dotted path of an identifier/member chain, e.g. `t.procedure`. Calls inside the
/// chain render as `name()`, so `app.route("/x").get` becomes `app.route().get`.
pub fn member_path(tree: &SyntaxTree, node: NodeId) -> Option<String> {
    match tree.kind(node) {
        NodeKind::Identifier => Some(tree.text(node).to_string()),
        NodeKind::Member => {
            let object = tree.child_by_field(node, Field::Object)?;
            let property = member_property(tree, node)?;
            let base = member_path(tree, object)?;
            Some(format!("{base}.{}", tree.text(property)))
        }
        NodeKind::Call => {
            let callee = call_callee(tree, node)?;
            Some(format!("{}()", member_path(tree, callee)?))
        }
        NodeKind::Await => {
            let inner = tree.children(node).first().copied()?;
            member_path(tree, inner)
        }
        _ => None,
    }
}

/// Whether a call's receiver is itself a call (`a.b().c()`).
pub fn is_chained_call(tree: &SyntaxTree, call: NodeId) -> bool {
    callee_receiver(tree, call).is_some_and(|r| tree.kind(r) == NodeKind::Call)
}

/// Key text of an object-literal entry.
pub fn pair_key(tree: &SyntaxTree, pair: NodeId) -> Option<String> {
    if tree.kind(pair) != NodeKind::Pair {
        return None;
    }
    match tree.child_by_field(pair, Field::Key) {
        Some(key) => Some(tree.text(key).to_string()),
        None if !tree.text(pair).is_empty() => Some(tree.text(pair).to_string()),
        None => None,
    }
}

/// Value of an object-literal entry. Shorthand entries (`{ name }`) yield the pair itself.
pub fn pair_value(tree: &SyntaxTree, pair: NodeId) -> Option<NodeId> {
    if tree.kind(pair) != NodeKind::Pair {
        return None;
    }
    tree.child_by_field(pair, Field::Value).or(Some(pair))
}

/// `(key, value)` entries of an object literal, in source order.
pub fn object_entries(tree: &SyntaxTree, object: NodeId) -> Vec<(String, NodeId)> {
    if tree.kind(object) != NodeKind::Object {
        return Vec::new();
    }
    tree.children(object)
        .iter()
        .filter_map(|&child| {
            let key = pair_key(tree, child)?;
            let value = pair_value(tree, child)?;
            Some((key, value))
        })
        .collect()
}

/// Value of entry `key` in an object literal.
pub fn object_get(tree: &SyntaxTree, object: NodeId, key: &str) -> Option<NodeId> {
    object_entries(tree, object)
        .into_iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v)
}

pub fn is_function_like(tree: &SyntaxTree, node: NodeId) -> bool {
    tree.kind(node) == NodeKind::Function
}

/// Nearest function-like node at or above `node`.
pub fn enclosing_function(tree: &SyntaxTree, node: NodeId) -> Option<NodeId> {
    if is_function_like(tree, node) {
        return Some(node);
    }
    tree.ancestors(node).find(|&a| is_function_like(tree, a))
}

/// First `return` expression in a function's block body, not looking into nested functions.
pub fn first_return_expression(tree: &SyntaxTree, body: NodeId) -> Option<NodeId> {
    let mut stack = vec![body];
    while let Some(current) = stack.pop() {
        if tree.kind(current) == NodeKind::Return {
            return tree.children(current).first().copied();
        }
        if current != body && is_function_like(tree, current) {
            continue;
        }
        stack.extend(tree.children(current).iter().rev().copied());
    }
    None
}

/// Type arguments of a type reference or parameterized call: `User` in `Promise<User>`.
pub fn type_arguments(tree: &SyntaxTree, node: NodeId) -> Vec<NodeId> {
    let holder = match tree.kind(node) {
        NodeKind::TypeAnnotation => tree.children(node).first().copied(),
        _ => Some(node),
    };
    holder
        .and_then(|h| tree.child_by_field(h, Field::TypeArguments))
        .map(|args| tree.children(args).to_vec())
        .unwrap_or_default()
}

/// Name of the binding that receives `node`'s value: `result` in
/// `const result = await client.callTool(...)`.
pub fn bound_name(tree: &SyntaxTree, node: NodeId) -> Option<String> {
    for ancestor in tree.ancestors(node) {
        match tree.kind(ancestor) {
            NodeKind::Declarator => {
                let name = tree.child_by_field(ancestor, Field::Name)?;
                return (tree.kind(name) == NodeKind::Identifier)
                    .then(|| tree.text(name).to_string());
            }
            NodeKind::Await => {}
            _ => return None,
        }
    }
    None
}

/// Decode a literal subtree into JSON. Non-literal leaves become `None`.
pub fn literal_value(tree: &SyntaxTree, node: NodeId) -> Option<Value> {
    match tree.kind(node) {
        NodeKind::String => Some(Value::String(tree.text(node).to_string())),
        NodeKind::Number => parse_number(tree.text(node)).map(Value::Number),
        NodeKind::Boolean => Some(Value::Bool(tree.text(node) == "true")),
        NodeKind::Null => Some(Value::Null),
        NodeKind::Array => tree
            .children(node)
            .iter()
            .map(|&c| literal_value(tree, c))
            .collect::<Option<Vec<_>>>()
            .map(Value::Array),
        NodeKind::Object => {
            let mut map = Map::new();
            for (key, value) in object_entries(tree, node) {
                map.insert(key, literal_value(tree, value)?);
            }
            Some(Value::Object(map))
        }
        _ => None,
    }
}

fn parse_number(text: &str) -> Option<Number> {
    let cleaned = text.replace('_', "");
    if let Ok(i) = cleaned.parse::<i64>() {
        return Some(Number::from(i));
    }
    cleaned.parse::<f64>().ok().and_then(Number::from_f64)
}
