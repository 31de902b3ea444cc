//! Decode a located schema fragment into a [`NormalizedSchema`].
//!
//! A fragment is whatever a [`SchemaLocation`](crate::extraction::SchemaLocation)
//! resolved to: a JSON-Schema-shaped object literal, a Zod raw shape or builder chain,
//! a TypeScript type annotation, or an identifier bound to one of those.

use serde_json::{Map, Value};

use crate::syntax::query;
use crate::syntax::{Field, NodeId, NodeKind, SyntaxTree};

use super::json_schema::schema_from_json;
use super::ts_types::{find_type_declaration, schema_from_ts_node, MAX_RESOLVE_DEPTH};
use super::types::{NormalizedSchema, SchemaRef};
use super::zod::{zod_field, zod_shape};

/// Decode `node`. `None` when the fragment has no static object shape.
pub fn decode_schema(
    tree: &SyntaxTree,
    node: NodeId,
    source: &SchemaRef,
) -> Option<NormalizedSchema> {
    decode_at(tree, node, source, 0)
}

fn decode_at(
    tree: &SyntaxTree,
    node: NodeId,
    source: &SchemaRef,
    depth: usize,
) -> Option<NormalizedSchema> {
    if depth > MAX_RESOLVE_DEPTH {
        return None;
    }
    match tree.kind(node) {
        NodeKind::Object if is_json_schema_shaped(tree, node) => {
            Some(schema_from_json(&lenient_value(tree, node), source.clone()))
        }
        NodeKind::Object => Some(zod_shape(tree, node, source)),
        NodeKind::Call => zod_field(tree, node, source).and_then(|f| f.ty.as_object().cloned()),
        NodeKind::Identifier => {
            let name = tree.text(node);
            if let Some(init) = resolve_binding(tree, name) {
                return decode_at(tree, init, source, depth + 1);
            }
            find_type_declaration(tree, name).and_then(|_| schema_from_ts_node(tree, node, source))
        }
        NodeKind::TypeAnnotation | NodeKind::TypeReference | NodeKind::Other => {
            schema_from_ts_node(tree, node, source)
        }
        _ => None,
    }
}

/// Initializer of `const <name> = ...` anywhere in the tree.
pub fn resolve_binding(tree: &SyntaxTree, name: &str) -> Option<NodeId> {
    let root = tree.root()?;
    tree.descendants(root)
        .filter(|&id| tree.kind(id) == NodeKind::Declarator)
        .find(|&decl| {
            tree.child_by_field(decl, Field::Name)
                .is_some_and(|n| tree.kind(n) == NodeKind::Identifier && tree.text(n) == name)
        })
        .and_then(|decl| tree.child_by_field(decl, Field::Init))
}

/// `{ type: "object", properties: {...} }` rather than a Zod raw shape.
fn is_json_schema_shaped(tree: &SyntaxTree, object: NodeId) -> bool {
    let entries = query::object_entries(tree, object);
    let string_type = entries
        .iter()
        .any(|(k, v)| k == "type" && tree.kind(*v) == NodeKind::String);
    let object_properties = entries
        .iter()
        .any(|(k, v)| k == "properties" && tree.kind(*v) == NodeKind::Object);
    string_type || object_properties
}

/// Like [`query::literal_value`], but non-literal leaves become `null` instead of
/// failing the whole object.
fn lenient_value(tree: &SyntaxTree, node: NodeId) -> Value {
    match tree.kind(node) {
        NodeKind::Object => {
            let mut map = Map::new();
            for (key, value) in query::object_entries(tree, node) {
                map.insert(key, lenient_value(tree, value));
            }
            Value::Object(map)
        }
        NodeKind::Array => Value::Array(
            tree.children(node)
                .iter()
                .map(|&c| lenient_value(tree, c))
                .collect(),
        ),
        _ => query::literal_value(tree, node).unwrap_or(Value::Null),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::NormalizedType;
    use crate::syntax::parse_typescript;

    fn src() -> SchemaRef {
        SchemaRef::new("test", "fragment")
    }

    fn first_arg_of(tree: &SyntaxTree, callee: &str, index: usize) -> NodeId {
        let call = tree
            .descendants(tree.root().unwrap())
            .find(|&id| tree.kind(id) == NodeKind::Call && query::callee_name(tree, id) == Some(callee))
            .unwrap();
        query::call_arguments(tree, call)[index]
    }

    #[test]
    fn json_schema_object_literal() {
        let tree = parse_typescript(
            "server.registerTool('x', { type: 'object', properties: { id: { type: 'string' }, n: { type: 'number' } }, required: ['id'] });",
        )
        .unwrap();
        let schema = decode_schema(&tree, first_arg_of(&tree, "registerTool", 1), &src()).unwrap();
        assert!(schema.is_required("id"));
        assert!(!schema.is_required("n"));
        assert_eq!(schema.property("n").unwrap().ty, NormalizedType::number());
    }

    #[test]
    fn zod_raw_shape() {
        let tree = parse_typescript(
            "server.tool('get_user', { id: z.string(), verbose: z.boolean().optional() }, h);",
        )
        .unwrap();
        let schema = decode_schema(&tree, first_arg_of(&tree, "tool", 1), &src()).unwrap();
        assert_eq!(schema.property_names().collect::<Vec<_>>(), vec!["id", "verbose"]);
        assert!(schema.is_required("id"));
        assert!(!schema.is_required("verbose"));
    }

    #[test]
    fn zod_shape_with_type_key_is_not_json_schema() {
        let tree = parse_typescript("server.tool('t', { type: z.string() }, h);").unwrap();
        let schema = decode_schema(&tree, first_arg_of(&tree, "tool", 1), &src()).unwrap();
        assert_eq!(schema.property("type").unwrap().ty, NormalizedType::string());
    }

    #[test]
    fn identifier_bound_to_zod_object() {
        let tree = parse_typescript(
            "const Input = z.object({ q: z.string() });\nserver.tool('search', Input, h);",
        )
        .unwrap();
        let schema = decode_schema(&tree, first_arg_of(&tree, "tool", 1), &src()).unwrap();
        assert!(schema.is_required("q"));
    }

    #[test]
    fn identifier_naming_interface() {
        let tree = parse_typescript("interface Out { ok: boolean }\nregister(Out);").unwrap();
        let schema = decode_schema(&tree, first_arg_of(&tree, "register", 0), &src()).unwrap();
        assert!(schema.is_required("ok"));
    }

    #[test]
    fn unresolvable_fragment_is_none() {
        let tree = parse_typescript("server.tool('t', buildSchema(), h);").unwrap();
        assert!(decode_schema(&tree, first_arg_of(&tree, "tool", 1), &src()).is_none());
    }
}
