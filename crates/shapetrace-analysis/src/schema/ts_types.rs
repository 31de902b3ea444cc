//! TypeScript type nodes (annotations, interfaces, type aliases) → normalized types.

use crate::syntax::query;
use crate::syntax::{Field, NodeId, NodeKind, SyntaxTree};

use super::type_map::{normalize_type_name, SourceFormat};
use super::types::{LiteralValue, NormalizedSchema, NormalizedType, PropertyDef, SchemaRef};

/// Backstop on alias/interface hops. Cycles are cut by name before this is reached.
pub(crate) const MAX_RESOLVE_DEPTH: usize = 8;

/// Named types being expanded on the current decode path, innermost first.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Resolving<'a> {
    head: Option<(&'a str, &'a Resolving<'a>)>,
    depth: usize,
}

impl<'a> Resolving<'a> {
    pub(crate) fn enter<'b>(&'b self, name: &'b str) -> Resolving<'b>
    where
        'a: 'b,
    {
        Resolving {
            head: Some((name, self)),
            depth: self.depth + 1,
        }
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        let mut current = self;
        while let Some((entered, parent)) = current.head {
            if entered == name {
                return true;
            }
            current = parent;
        }
        false
    }

    pub(crate) fn exhausted(&self) -> bool {
        self.depth >= MAX_RESOLVE_DEPTH
    }
}

/// Decode a type-position node. Named types declared in the same tree are inlined;
/// a name already being expanded stays a [`NormalizedType::Ref`].
pub fn type_from_ts_node(tree: &SyntaxTree, node: NodeId, source: &SchemaRef) -> NormalizedType {
    decode(tree, node, source, &Resolving::default())
}

fn decode(
    tree: &SyntaxTree,
    node: NodeId,
    source: &SchemaRef,
    path: &Resolving<'_>,
) -> NormalizedType {
    let children = tree.children(node);
    match tree.kind(node) {
        NodeKind::TypeAnnotation => children
            .first()
            .map(|&c| decode(tree, c, source, path))
            .unwrap_or(NormalizedType::Unknown),
        NodeKind::Identifier => named(tree, tree.text(node), source, path),
        NodeKind::TypeReference if children.is_empty() => {
            normalize_type_name(SourceFormat::TypeScript, tree.text(node))
        }
        NodeKind::TypeReference => generic(tree, node, source, path),
        NodeKind::String => NormalizedType::literal_str(tree.text(node)),
        NodeKind::Null => NormalizedType::null(),
        _ => match tree.node(node).raw_kind.as_str() {
            "array_type" => NormalizedType::array(first(tree, node, source, path)),
            "parenthesized_type" | "readonly_type" => first(tree, node, source, path),
            "union_type" => NormalizedType::union(flatten(tree, node, "union_type", source, path)),
            "intersection_type" => NormalizedType::Intersection {
                variants: flatten(tree, node, "intersection_type", source, path),
            },
            "tuple_type" => NormalizedType::array(NormalizedType::union(
                children.iter().map(|&c| decode(tree, c, source, path)).collect(),
            )),
            "literal_type" => children
                .first()
                .map(|&c| literal(tree, c))
                .unwrap_or(NormalizedType::Unknown),
            "object_type" | "interface_body" => {
                NormalizedType::object(members_schema(tree, node, source, path))
            }
            _ => NormalizedType::Unknown,
        },
    }
}

fn first(
    tree: &SyntaxTree,
    node: NodeId,
    source: &SchemaRef,
    path: &Resolving<'_>,
) -> NormalizedType {
    tree.children(node)
        .first()
        .map(|&c| decode(tree, c, source, path))
        .unwrap_or(NormalizedType::Unknown)
}

/// Union/intersection nodes nest left-associatively; flatten them.
fn flatten(
    tree: &SyntaxTree,
    node: NodeId,
    raw: &str,
    source: &SchemaRef,
    path: &Resolving<'_>,
) -> Vec<NormalizedType> {
    let mut out = Vec::new();
    for &child in tree.children(node) {
        if tree.node(child).raw_kind == raw {
            out.extend(flatten(tree, child, raw, source, path));
        } else {
            out.push(decode(tree, child, source, path));
        }
    }
    out
}

fn literal(tree: &SyntaxTree, node: NodeId) -> NormalizedType {
    match query::literal_value(tree, node).and_then(|v| LiteralValue::from_json(&v)) {
        Some(value) => NormalizedType::Literal { value },
        None => NormalizedType::Unknown,
    }
}

fn generic(
    tree: &SyntaxTree,
    node: NodeId,
    source: &SchemaRef,
    path: &Resolving<'_>,
) -> NormalizedType {
    let Some(name) = tree.child_by_field(node, Field::Name).map(|n| tree.text(n)) else {
        return NormalizedType::Unknown;
    };
    let args = query::type_arguments(tree, node);
    let arg = |i: usize| {
        args.get(i)
            .map(|&a| decode(tree, a, source, path))
            .unwrap_or(NormalizedType::Unknown)
    };
    match name {
        "Array" | "ReadonlyArray" | "Set" => NormalizedType::array(arg(0)),
        "Promise" | "Awaited" | "Readonly" => arg(0),
        "Record" | "Map" | "Partial" | "Pick" | "Omit" => NormalizedType::Any,
        other => named(tree, other, source, path),
    }
}

/// A bare type name: builtin table first, then a same-file interface or alias.
fn named(
    tree: &SyntaxTree,
    name: &str,
    source: &SchemaRef,
    path: &Resolving<'_>,
) -> NormalizedType {
    let mapped = normalize_type_name(SourceFormat::TypeScript, name);
    if !matches!(mapped, NormalizedType::Ref { .. })
        || path.contains(name)
        || path.exhausted()
    {
        return mapped;
    }
    match find_type_declaration(tree, name) {
        Some(decl) => {
            let ty = declaration_type(tree, decl, source, &path.enter(name));
            match ty {
                NormalizedType::Object { schema } => {
                    NormalizedType::object(schema.named(name.to_string()))
                }
                NormalizedType::Unknown => mapped,
                other => other,
            }
        }
        None => mapped,
    }
}

fn declaration_type(
    tree: &SyntaxTree,
    decl: NodeId,
    source: &SchemaRef,
    path: &Resolving<'_>,
) -> NormalizedType {
    let body = match tree.node(decl).raw_kind.as_str() {
        "interface_declaration" => tree.child_by_field(decl, Field::Body),
        _ => tree.child_by_field(decl, Field::Value),
    };
    body.map(|b| decode(tree, b, source, path))
        .unwrap_or(NormalizedType::Unknown)
}

/// `interface X {..}` or `type X = ..` declared anywhere in the tree.
pub fn find_type_declaration(tree: &SyntaxTree, name: &str) -> Option<NodeId> {
    let root = tree.root()?;
    tree.descendants(root).find(|&id| {
        matches!(
            tree.node(id).raw_kind.as_str(),
            "interface_declaration" | "type_alias_declaration"
        ) && tree
            .child_by_field(id, Field::Name)
            .is_some_and(|n| tree.text(n) == name)
    })
}

fn members_schema(
    tree: &SyntaxTree,
    node: NodeId,
    source: &SchemaRef,
    path: &Resolving<'_>,
) -> NormalizedSchema {
    let mut schema = NormalizedSchema::new(source.clone());
    for &member in tree.children(node) {
        if tree.node(member).raw_kind != "property_signature" {
            continue;
        }
        let Some(name) = tree.child_by_field(member, Field::Name) else {
            continue;
        };
        let ty = tree
            .child_by_field(member, Field::Type)
            .map(|t| decode(tree, t, source, path))
            .unwrap_or(NormalizedType::Any);
        let flags = tree.text(member);
        let mut def = PropertyDef::new(ty);
        if flags.contains("optional") {
            def = def.optional();
        }
        if flags.contains("readonly") {
            def = def.readonly();
        }
        schema.insert_property(tree.text(name), def);
    }
    schema
}

/// Object schema for a type node, if it decodes to one.
pub fn schema_from_ts_node(
    tree: &SyntaxTree,
    node: NodeId,
    source: &SchemaRef,
) -> Option<NormalizedSchema> {
    match type_from_ts_node(tree, node, source) {
        NormalizedType::Object { schema } => Some(*schema),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse_typescript;

    fn src() -> SchemaRef {
        SchemaRef::new("test", "t")
    }

    fn return_annotation(tree: &SyntaxTree) -> NodeId {
        let func = tree
            .descendants(tree.root().unwrap())
            .find(|&id| tree.kind(id) == NodeKind::Function)
            .unwrap();
        tree.child_by_field(func, Field::ReturnType).unwrap()
    }

    #[test]
    fn interface_is_inlined_through_promise() {
        let tree = parse_typescript(
            "interface User { id: string; email?: string; readonly tags: string[] }\n\
             async function getUser(): Promise<User> { return db.get(); }",
        )
        .unwrap();
        let schema = schema_from_ts_node(&tree, return_annotation(&tree), &src()).unwrap();
        assert_eq!(schema.name.as_deref(), Some("User"));
        assert!(schema.is_required("id"));
        assert!(!schema.is_required("email"));
        let tags = schema.property("tags").unwrap();
        assert!(tags.readonly);
        assert_eq!(tags.ty, NormalizedType::array(NormalizedType::string()));
    }

    #[test]
    fn type_alias_union_of_literals() {
        let tree = parse_typescript(
            "type Role = 'admin' | 'user' | 'guest';\nfunction f(): Role { return 'admin'; }",
        )
        .unwrap();
        let ty = type_from_ts_node(&tree, return_annotation(&tree), &src());
        assert_eq!(ty, NormalizedType::string_enum(["admin", "user", "guest"]));
    }

    #[test]
    fn unresolved_name_stays_ref() {
        let tree = parse_typescript("function f(): External { return x; }").unwrap();
        let ty = type_from_ts_node(&tree, return_annotation(&tree), &src());
        assert_eq!(ty, NormalizedType::reference("External"));
    }

    #[test]
    fn self_referential_interface_becomes_ref() {
        let tree = parse_typescript(
            "interface Employee { id: string; manager: Employee; mentor: Employee; buddy?: Employee; reports: Employee[] }\n\
             function f(): Employee { return e; }",
        )
        .unwrap();
        let schema = schema_from_ts_node(&tree, return_annotation(&tree), &src()).unwrap();
        let employee = NormalizedType::reference("Employee");
        assert_eq!(schema.name.as_deref(), Some("Employee"));
        assert_eq!(schema.property("manager").unwrap().ty, employee);
        assert_eq!(schema.property("mentor").unwrap().ty, employee);
        assert_eq!(schema.property("buddy").unwrap().ty, employee);
        assert_eq!(
            schema.property("reports").unwrap().ty,
            NormalizedType::array(employee.clone())
        );
        assert_eq!(schema.property("id").unwrap().ty, NormalizedType::string());
    }

    #[test]
    fn mutual_recursion_is_cut_at_the_repeated_name() {
        let tree = parse_typescript(
            "interface Team { lead: Person }\ninterface Person { team: Team }\n\
             function f(): Team { return t; }",
        )
        .unwrap();
        let team = schema_from_ts_node(&tree, return_annotation(&tree), &src()).unwrap();
        let person = team.property("lead").unwrap().ty.as_object().unwrap();
        assert_eq!(person.name.as_deref(), Some("Person"));
        assert_eq!(person.property("team").unwrap().ty, NormalizedType::reference("Team"));
    }

    #[test]
    fn sibling_uses_of_one_type_both_expand() {
        let tree = parse_typescript(
            "interface Money { amount: number }\ninterface Order { total: Money; tax: Money }\n\
             function f(): Order { return o; }",
        )
        .unwrap();
        let order = schema_from_ts_node(&tree, return_annotation(&tree), &src()).unwrap();
        for key in ["total", "tax"] {
            let money = order.property(key).unwrap().ty.as_object().unwrap();
            assert!(money.is_required("amount"));
        }
    }

    #[test]
    fn inline_object_type() {
        let tree =
            parse_typescript("function f(): { ok: boolean; count: number | null } { return r; }")
                .unwrap();
        let schema = schema_from_ts_node(&tree, return_annotation(&tree), &src()).unwrap();
        assert_eq!(schema.property("ok").unwrap().ty, NormalizedType::boolean());
        assert!(schema.property("count").unwrap().nullable);
    }
}
