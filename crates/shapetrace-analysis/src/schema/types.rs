//! The canonical, adapter-independent schema model.
//!
//! Every source format (TypeScript, Zod, JSON Schema, Python, Go, Protobuf, GraphQL,
//! SQL DDL) decodes into these types so the comparator never sees a framework shape.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use shapetrace_core::SourceLocation;

use super::properties::PropertyMap;

/// Adapter-private address of a schema: `source` is the adapter kind, `id` its key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SchemaRef {
    pub source: String,
    pub id: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, Value>,
}

impl SchemaRef {
    pub fn new(source: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            id: id.into(),
            options: BTreeMap::new(),
        }
    }

    pub fn with_option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }

    /// String-valued option.
    pub fn option_str(&self, key: &str) -> Option<&str> {
        self.options.get(key).and_then(Value::as_str)
    }
}

/// Scalar categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    String,
    Number,
    Boolean,
}

/// A single literal value (enum member, `const`, `z.literal`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LiteralValue {
    String(String),
    Number(serde_json::Number),
    Boolean(bool),
    Null,
}

impl LiteralValue {
    /// Convert a JSON scalar. Arrays and objects are not literals.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::String(s.clone())),
            Value::Number(n) => Some(Self::Number(n.clone())),
            Value::Bool(b) => Some(Self::Boolean(*b)),
            Value::Null => Some(Self::Null),
            _ => None,
        }
    }
}

/// Canonical type. Exactly one tag per value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NormalizedType {
    Primitive { value: PrimitiveKind },
    Literal { value: LiteralValue },
    Array { element: Box<NormalizedType> },
    Object { schema: Box<NormalizedSchema> },
    Union { variants: Vec<NormalizedType> },
    Intersection { variants: Vec<NormalizedType> },
    Ref { name: String },
    Any,
    Unknown,
}

impl NormalizedType {
    pub fn string() -> Self {
        Self::Primitive {
            value: PrimitiveKind::String,
        }
    }

    pub fn number() -> Self {
        Self::Primitive {
            value: PrimitiveKind::Number,
        }
    }

    pub fn boolean() -> Self {
        Self::Primitive {
            value: PrimitiveKind::Boolean,
        }
    }

    pub fn null() -> Self {
        Self::Literal {
            value: LiteralValue::Null,
        }
    }

    pub fn literal_str(value: impl Into<String>) -> Self {
        Self::Literal {
            value: LiteralValue::String(value.into()),
        }
    }

    pub fn array(element: NormalizedType) -> Self {
        Self::Array {
            element: Box::new(element),
        }
    }

    pub fn object(schema: NormalizedSchema) -> Self {
        Self::Object {
            schema: Box::new(schema),
        }
    }

    pub fn reference(name: impl Into<String>) -> Self {
        Self::Ref { name: name.into() }
    }

    /// Union that flattens nested unions, drops repeats, and collapses to its single
    /// member when only one variant remains.
    pub fn union(variants: Vec<NormalizedType>) -> Self {
        let mut flat: Vec<NormalizedType> = Vec::with_capacity(variants.len());
        for variant in variants {
            let members = match variant {
                Self::Union { variants } => variants,
                other => vec![other],
            };
            for member in members {
                if !flat.contains(&member) {
                    flat.push(member);
                }
            }
        }
        let mut variants = flat;
        match variants.len() {
            0 => Self::Unknown,
            1 => variants.remove(0),
            _ => Self::Union { variants },
        }
    }

    /// Union of string literals, the normalized form of an enumeration.
    pub fn string_enum<I, S>(members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::union(members.into_iter().map(Self::literal_str).collect())
    }

    /// Whether `null` is one of the admissible values.
    pub fn admits_null(&self) -> bool {
        match self {
            Self::Literal {
                value: LiteralValue::Null,
            } => true,
            Self::Union { variants } => variants.iter().any(Self::admits_null),
            _ => false,
        }
    }

    /// Drop `null` from a union. Returns the type unchanged otherwise.
    pub fn without_null(self) -> Self {
        match self {
            Self::Union { variants } => Self::union(
                variants
                    .into_iter()
                    .filter(|v| !matches!(v, Self::Literal { value: LiteralValue::Null }))
                    .collect(),
            ),
            other => other,
        }
    }

    /// Tag name, e.g. `primitive` or `union`.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Primitive { .. } => "primitive",
            Self::Literal { .. } => "literal",
            Self::Array { .. } => "array",
            Self::Object { .. } => "object",
            Self::Union { .. } => "union",
            Self::Intersection { .. } => "intersection",
            Self::Ref { .. } => "ref",
            Self::Any => "any",
            Self::Unknown => "unknown",
        }
    }

    /// Nested object schema, if this is an object type.
    pub fn as_object(&self) -> Option<&NormalizedSchema> {
        match self {
            Self::Object { schema } => Some(&**schema),
            _ => None,
        }
    }
}

/// Validation constraints carried alongside a property's type.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl Constraints {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// One property of a schema.
///
/// `optional` mirrors the owning schema's `required` set; use
/// [`NormalizedSchema::insert_property`] so the two never disagree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDef {
    #[serde(rename = "type")]
    pub ty: NormalizedType,
    pub optional: bool,
    pub nullable: bool,
    pub readonly: bool,
    pub deprecated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<Constraints>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PropertyDef {
    /// A required, non-nullable property.
    pub fn new(ty: NormalizedType) -> Self {
        let nullable = ty.admits_null();
        Self {
            ty,
            optional: false,
            nullable,
            readonly: false,
            deprecated: false,
            constraints: None,
            description: None,
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn readonly(mut self) -> Self {
        self.readonly = true;
        self
    }

    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Attach constraints; empty constraint sets are dropped.
    pub fn with_constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = (!constraints.is_empty()).then_some(constraints);
        self
    }
}

/// A named shape: ordered properties plus the required subset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct NormalizedSchema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub properties: PropertyMap,
    pub required: BTreeSet<String>,
    pub source: SchemaRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
}

impl NormalizedSchema {
    pub fn new(source: SchemaRef) -> Self {
        Self {
            name: None,
            properties: PropertyMap::new(),
            required: BTreeSet::new(),
            source,
            location: None,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn at(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    /// Builder-style [`Self::insert_property`].
    pub fn with_property(mut self, key: impl Into<String>, def: PropertyDef) -> Self {
        self.insert_property(key, def);
        self
    }

    /// Insert or replace a property, keeping `required` in step with `def.optional`.
    /// A replaced key keeps its original position.
    pub fn insert_property(&mut self, key: impl Into<String>, def: PropertyDef) {
        let key = key.into();
        if def.optional {
            self.required.remove(&key);
        } else {
            self.required.insert(key.clone());
        }
        self.properties.insert(key, def);
    }

    /// Flip a property's requiredness. Returns `false` if the key is absent.
    pub fn set_required(&mut self, key: &str, required: bool) -> bool {
        let Some(def) = self.properties.get_mut(key) else {
            return false;
        };
        def.optional = !required;
        if required {
            self.required.insert(key.to_string());
        } else {
            self.required.remove(key);
        }
        true
    }

    pub fn property(&self, key: &str) -> Option<&PropertyDef> {
        self.properties.get(key)
    }

    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.properties.keys()
    }

    pub fn is_required(&self, key: &str) -> bool {
        self.required.contains(key)
    }

    /// Keys violating `required ⊆ properties` or `optional == !required`.
    pub fn invariant_violations(&self) -> Vec<String> {
        let mut bad: Vec<String> = self
            .required
            .iter()
            .filter(|k| !self.properties.contains_key(k))
            .cloned()
            .collect();
        bad.extend(
            self.properties
                .iter()
                .filter(|(k, def)| def.optional == self.required.contains(*k))
                .map(|(k, _)| k.to_string()),
        );
        bad
    }
}

/// A producer's declared contract (a tool, route, or procedure definition).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProducerSchema {
    pub tool_name: String,
    pub input_schema: NormalizedSchema,
    pub output_schema: NormalizedSchema,
    pub location: SourceLocation,
}

/// What a call site passes for one argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ArgumentValue {
    /// Statically known literal.
    Literal(Value),
    /// Anything requiring evaluation; holds the source text or a short label.
    Placeholder(String),
}

/// A consumer's usage of a producer at one call site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumerSchema {
    pub tool_name: String,
    pub call_site: SourceLocation,
    pub arguments_provided: BTreeMap<String, ArgumentValue>,
    /// Property names (or dotted paths) read off the response.
    pub expected_properties: Vec<String>,
}
