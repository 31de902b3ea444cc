//! Zod builder chains (`z.string().email().optional()`) → normalized types.
//!
//! Decoding is static: the chain is read from the syntax tree, never evaluated. Bindings
//! (`const User = z.object(..)`) declared in the same tree are followed.

use serde_json::Value;

use crate::syntax::query;
use crate::syntax::{NodeId, NodeKind, SyntaxTree};

use super::fragment::resolve_binding;
use super::ts_types::Resolving;
use super::type_map::{normalize_type_name, SourceFormat};
use super::types::{
    Constraints, LiteralValue, NormalizedSchema, NormalizedType, PrimitiveKind, PropertyDef,
    SchemaRef,
};

/// One decoded Zod field, before it is placed in a schema.
#[derive(Debug, Clone, PartialEq)]
pub struct ZodField {
    pub ty: NormalizedType,
    pub optional: bool,
    pub nullable: bool,
    pub readonly: bool,
    pub description: Option<String>,
    pub constraints: Constraints,
}

impl ZodField {
    fn of(ty: NormalizedType) -> Self {
        Self {
            ty,
            optional: false,
            nullable: false,
            readonly: false,
            description: None,
            constraints: Constraints::default(),
        }
    }

    pub fn into_property(self) -> PropertyDef {
        let mut def = PropertyDef::new(self.ty).with_constraints(self.constraints);
        def.optional = self.optional;
        def.nullable |= self.nullable;
        def.readonly = self.readonly;
        def.description = self.description;
        def
    }
}

/// Decode a Zod expression. `None` when `node` is not a Zod chain.
pub fn zod_field(tree: &SyntaxTree, node: NodeId, source: &SchemaRef) -> Option<ZodField> {
    decode(tree, node, source, &Resolving::default())
}

/// Decode a raw shape (`{ id: z.string() }`) into a schema.
pub fn zod_shape(
    tree: &SyntaxTree,
    object: NodeId,
    source: &SchemaRef,
) -> NormalizedSchema {
    shape(tree, object, source, &Resolving::default())
}

fn shape(
    tree: &SyntaxTree,
    object: NodeId,
    source: &SchemaRef,
    path: &Resolving<'_>,
) -> NormalizedSchema {
    let mut schema = NormalizedSchema::new(source.clone());
    for (key, value) in query::object_entries(tree, object) {
        let def = decode(tree, value, source, path)
            .map(ZodField::into_property)
            .unwrap_or_else(|| PropertyDef::new(NormalizedType::Unknown));
        schema.insert_property(key, def);
    }
    schema
}

fn decode(
    tree: &SyntaxTree,
    node: NodeId,
    source: &SchemaRef,
    path: &Resolving<'_>,
) -> Option<ZodField> {
    match tree.kind(node) {
        NodeKind::Identifier => {
            let name = tree.text(node);
            // A binding that refers back to itself stays a named reference.
            if path.contains(name) {
                return Some(ZodField::of(NormalizedType::reference(name)));
            }
            if path.exhausted() {
                return None;
            }
            let init = resolve_binding(tree, name)?;
            decode(tree, init, source, &path.enter(name))
        }
        NodeKind::Call => {
            let method = query::callee_name(tree, node)?;
            let args = query::call_arguments(tree, node);
            let receiver = query::callee_receiver(tree, node)?;
            if is_namespace(tree, receiver) {
                base(tree, method, &args, source, path)
            } else {
                let mut field = decode(tree, receiver, source, path)?;
                modifier(tree, &mut field, method, &args, source, path);
                Some(field)
            }
        }
        _ => None,
    }
}

/// `z` (or any import alias) rather than a schema-valued binding.
fn is_namespace(tree: &SyntaxTree, receiver: NodeId) -> bool {
    tree.kind(receiver) == NodeKind::Identifier
        && resolve_binding(tree, tree.text(receiver)).is_none()
}

fn base(
    tree: &SyntaxTree,
    method: &str,
    args: &[NodeId],
    source: &SchemaRef,
    path: &Resolving<'_>,
) -> Option<ZodField> {
    let arg_type = |i: usize| {
        args.get(i)
            .and_then(|&a| decode(tree, a, source, path))
            .map(|f| f.ty)
            .unwrap_or(NormalizedType::Unknown)
    };
    let ty = match method {
        "object" | "strictObject" | "looseObject" => {
            let obj = args.first().filter(|&&a| tree.kind(a) == NodeKind::Object)?;
            NormalizedType::object(shape(tree, *obj, source, path))
        }
        "array" | "set" => NormalizedType::array(arg_type(0)),
        "enum" => {
            let list = args.first().and_then(|&a| query::literal_value(tree, a));
            match list {
                Some(Value::Array(items)) => NormalizedType::union(
                    items
                        .iter()
                        .filter_map(LiteralValue::from_json)
                        .map(|value| NormalizedType::Literal { value })
                        .collect(),
                ),
                _ => NormalizedType::Unknown,
            }
        }
        "nativeEnum" => args
            .first()
            .filter(|&&a| tree.kind(a) == NodeKind::Identifier)
            .map(|&a| NormalizedType::reference(tree.text(a)))
            .unwrap_or(NormalizedType::Unknown),
        "literal" => args
            .first()
            .and_then(|&a| query::literal_value(tree, a))
            .and_then(|v| LiteralValue::from_json(&v))
            .map(|value| NormalizedType::Literal { value })
            .unwrap_or(NormalizedType::Unknown),
        "union" | "discriminatedUnion" => {
            let list_index = usize::from(method == "discriminatedUnion");
            let list = args.get(list_index).filter(|&&a| tree.kind(a) == NodeKind::Array)?;
            NormalizedType::union(
                tree.children(*list)
                    .iter()
                    .map(|&v| {
                        decode(tree, v, source, path)
                            .map(|f| f.ty)
                            .unwrap_or(NormalizedType::Unknown)
                    })
                    .collect(),
            )
        }
        "intersection" => NormalizedType::Intersection {
            variants: vec![arg_type(0), arg_type(1)],
        },
        "tuple" => {
            let list = args.first().filter(|&&a| tree.kind(a) == NodeKind::Array)?;
            NormalizedType::array(NormalizedType::union(
                tree.children(*list)
                    .iter()
                    .filter_map(|&v| decode(tree, v, source, path).map(|f| f.ty))
                    .collect(),
            ))
        }
        "optional" | "nullable" | "nullish" => {
            let mut field = args.first().and_then(|&a| decode(tree, a, source, path))?;
            modifier(tree, &mut field, method, &[], source, path);
            return Some(field);
        }
        "lazy" | "custom" | "instanceof" => NormalizedType::Unknown,
        other => {
            let ty = normalize_type_name(SourceFormat::Zod, other);
            let mut field = ZodField::of(ty);
            if matches!(other, "email" | "url" | "uuid" | "cuid" | "datetime" | "ip") {
                field.constraints.format = Some(other.to_string());
            }
            return Some(field);
        }
    };
    Some(ZodField::of(ty))
}

fn modifier(
    tree: &SyntaxTree,
    field: &mut ZodField,
    method: &str,
    args: &[NodeId],
    source: &SchemaRef,
    path: &Resolving<'_>,
) {
    let literal = |i: usize| args.get(i).and_then(|&a| query::literal_value(tree, a));
    let number = |i: usize| literal(i).and_then(|v| v.as_f64());
    match method {
        "optional" => field.optional = true,
        "nullable" => make_nullable(field),
        "nullish" => {
            field.optional = true;
            make_nullable(field);
        }
        "default" | "catch" => {
            field.optional = true;
            field.constraints.default = literal(0);
        }
        "describe" => {
            field.description = literal(0).and_then(|v| v.as_str().map(str::to_string));
        }
        "readonly" => field.readonly = true,
        "min" | "gte" | "nonempty" => {
            let n = if method == "nonempty" { Some(1.0) } else { number(0) };
            if counts_length(&field.ty) {
                field.constraints.min_length = n.map(|n| n as u64);
            } else {
                field.constraints.min = n;
            }
        }
        "max" | "lte" => {
            if counts_length(&field.ty) {
                field.constraints.max_length = number(0).map(|n| n as u64);
            } else {
                field.constraints.max = number(0);
            }
        }
        "length" => {
            let n = number(0).map(|n| n as u64);
            field.constraints.min_length = n;
            field.constraints.max_length = n;
        }
        "positive" | "nonnegative" => field.constraints.min = Some(0.0),
        "email" | "url" | "uuid" | "cuid" | "cuid2" | "ulid" | "datetime" | "ip" | "date" => {
            field.constraints.format = Some(method.to_string());
        }
        "regex" => {
            field.constraints.pattern = args
                .first()
                .filter(|&&a| tree.node(a).raw_kind == "regex")
                .map(|&a| tree.text(a).to_string());
        }
        "array" => {
            *field = ZodField::of(NormalizedType::array(std::mem::replace(
                &mut field.ty,
                NormalizedType::Unknown,
            )));
        }
        "or" => {
            let other = args
                .first()
                .and_then(|&a| decode(tree, a, source, path))
                .map(|f| f.ty)
                .unwrap_or(NormalizedType::Unknown);
            let current = std::mem::replace(&mut field.ty, NormalizedType::Unknown);
            field.ty = NormalizedType::union(vec![current, other]);
        }
        "and" => {
            let other = args
                .first()
                .and_then(|&a| decode(tree, a, source, path))
                .map(|f| f.ty)
                .unwrap_or(NormalizedType::Unknown);
            let current = std::mem::replace(&mut field.ty, NormalizedType::Unknown);
            field.ty = NormalizedType::Intersection {
                variants: vec![current, other],
            };
        }
        "extend" | "merge" | "partial" | "required" | "pick" | "omit" => {
            object_modifier(tree, field, method, args, source, path);
        }
        // Refinements, transforms, and unknown-key policies don't change the shape.
        _ => {}
    }
}

fn object_modifier(
    tree: &SyntaxTree,
    field: &mut ZodField,
    method: &str,
    args: &[NodeId],
    source: &SchemaRef,
    path: &Resolving<'_>,
) {
    let NormalizedType::Object { schema } = &mut field.ty else {
        return;
    };
    match method {
        "extend" | "merge" => {
            let extra = match args.first() {
                Some(&a) if tree.kind(a) == NodeKind::Object => Some(shape(tree, a, source, path)),
                Some(&a) => decode(tree, a, source, path)
                    .and_then(|f| f.ty.as_object().cloned()),
                None => None,
            };
            if let Some(extra) = extra {
                for (key, def) in extra.properties.iter() {
                    schema.insert_property(key, def.clone());
                }
            }
        }
        "partial" | "required" => {
            let keys: Vec<String> = schema.property_names().map(str::to_string).collect();
            for key in keys {
                schema.set_required(&key, method == "required");
            }
        }
        "pick" | "omit" => {
            let mask: Vec<String> = args
                .first()
                .map(|&a| query::object_entries(tree, a).into_iter().map(|(k, _)| k).collect())
                .unwrap_or_default();
            let keys: Vec<String> = schema.property_names().map(str::to_string).collect();
            for key in keys {
                let listed = mask.contains(&key);
                if listed == (method == "omit") {
                    schema.properties.remove(&key);
                    schema.required.remove(&key);
                }
            }
        }
        _ => {}
    }
}

fn make_nullable(field: &mut ZodField) {
    field.nullable = true;
    if !field.ty.admits_null() {
        let current = std::mem::replace(&mut field.ty, NormalizedType::Unknown);
        field.ty = NormalizedType::union(vec![current, NormalizedType::null()]);
    }
}

fn counts_length(ty: &NormalizedType) -> bool {
    matches!(
        ty,
        NormalizedType::Primitive {
            value: PrimitiveKind::String
        } | NormalizedType::Array { .. }
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse_typescript;

    fn src() -> SchemaRef {
        SchemaRef::new("test", "zod")
    }

    fn last_init(tree: &SyntaxTree) -> NodeId {
        let decl = tree
            .descendants(tree.root().unwrap())
            .filter(|&id| tree.kind(id) == NodeKind::Declarator)
            .last()
            .unwrap();
        tree.child_by_field(decl, crate::syntax::Field::Init).unwrap()
    }

    fn decode_last(source: &str) -> ZodField {
        let tree = parse_typescript(source).unwrap();
        zod_field(&tree, last_init(&tree), &src()).unwrap()
    }

    #[test]
    fn string_with_format_and_modifiers() {
        let field = decode_last("const s = z.string().email().optional().describe('Contact');");
        assert_eq!(field.ty, NormalizedType::string());
        assert!(field.optional);
        assert_eq!(field.constraints.format.as_deref(), Some("email"));
        assert_eq!(field.description.as_deref(), Some("Contact"));
    }

    #[test]
    fn number_bounds_vs_string_lengths() {
        let n = decode_last("const n = z.number().int().min(1).max(10);");
        assert_eq!(n.constraints.min, Some(1.0));
        assert_eq!(n.constraints.max, Some(10.0));
        let s = decode_last("const s = z.string().min(3);");
        assert_eq!(s.constraints.min_length, Some(3));
        assert_eq!(s.constraints.min, None);
    }

    #[test]
    fn object_shape_with_nested_binding() {
        let tree = parse_typescript(
            "const Address = z.object({ city: z.string() });\n\
             const User = z.object({ id: z.string().uuid(), address: Address.optional(), tags: z.array(z.string()) });",
        )
        .unwrap();
        let field = zod_field(&tree, last_init(&tree), &src()).unwrap();
        let schema = field.ty.as_object().unwrap();
        assert!(schema.is_required("id"));
        assert!(!schema.is_required("address"));
        let address = schema.property("address").unwrap().ty.as_object().unwrap();
        assert!(address.is_required("city"));
        assert_eq!(
            schema.property("tags").unwrap().ty,
            NormalizedType::array(NormalizedType::string())
        );
    }

    #[test]
    fn enum_literal_union_nullable() {
        assert_eq!(
            decode_last("const r = z.enum(['admin', 'user']);").ty,
            NormalizedType::string_enum(["admin", "user"])
        );
        assert_eq!(decode_last("const l = z.literal('x');").ty, NormalizedType::literal_str("x"));
        let u = decode_last("const u = z.union([z.string(), z.number()]).nullable();");
        assert!(u.nullable);
        assert!(u.ty.admits_null());
    }

    #[test]
    fn extend_partial_pick() {
        let tree = parse_typescript(
            "const Base = z.object({ a: z.string(), b: z.number() });\n\
             const X = Base.extend({ c: z.boolean() }).partial().pick({ a: true, c: true });",
        )
        .unwrap();
        let field = zod_field(&tree, last_init(&tree), &src()).unwrap();
        let schema = field.ty.as_object().unwrap();
        assert_eq!(schema.property_names().collect::<Vec<_>>(), vec!["a", "c"]);
        assert!(schema.required.is_empty());
        assert!(schema.invariant_violations().is_empty());
    }

    #[test]
    fn default_makes_optional() {
        let field = decode_last("const d = z.number().default(5);");
        assert!(field.optional);
        assert_eq!(field.constraints.default, Some(serde_json::json!(5)));
    }

    #[test]
    fn non_zod_expression_is_none() {
        let tree = parse_typescript("const v = 42;").unwrap();
        assert!(zod_field(&tree, last_init(&tree), &src()).is_none());
    }

    #[test]
    fn self_referencing_binding_becomes_ref() {
        let field = decode_last(
            "const Category = z.object({ name: z.string(), parent: Category.optional(), children: z.array(Category) });\n\
             const root = Category;",
        );
        let schema = field.ty.as_object().unwrap();
        let category = NormalizedType::reference("Category");
        let parent = schema.property("parent").unwrap();
        assert_eq!(parent.ty, category);
        assert!(parent.optional);
        assert_eq!(
            schema.property("children").unwrap().ty,
            NormalizedType::array(category)
        );
        assert!(schema.is_required("name"));
    }
}
