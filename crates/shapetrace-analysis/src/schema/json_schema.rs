//! JSON Schema (and OpenAPI-flavoured JSON Schema) → normalized model.

use serde_json::{Map, Value};

use super::type_map::{normalize_type_name, SourceFormat};
use super::types::{
    Constraints, LiteralValue, NormalizedSchema, NormalizedType, PropertyDef, SchemaRef,
};

/// Decode an object schema. Non-object shapes yield an empty schema.
pub fn schema_from_json(value: &Value, source: SchemaRef) -> NormalizedSchema {
    let mut schema = NormalizedSchema::new(source);
    let Some(obj) = value.as_object() else {
        return schema;
    };
    if let Some(title) = obj.get("title").and_then(Value::as_str) {
        schema.name = Some(title.to_string());
    }

    let required: Vec<&str> = obj
        .get("required")
        .and_then(Value::as_array)
        .map(|r| r.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    if let Some(props) = obj.get("properties").and_then(Value::as_object) {
        for (key, prop) in props {
            let def = property_from_json(prop, &schema.source);
            let def = if required.contains(&key.as_str()) {
                def
            } else {
                def.optional()
            };
            schema.insert_property(key.clone(), def);
        }
    }

    // allOf of object schemas flattens into this one.
    if let Some(parts) = obj.get("allOf").and_then(Value::as_array) {
        for part in parts {
            let nested = schema_from_json(part, schema.source.clone());
            for (key, def) in nested.properties.iter() {
                if !schema.properties.contains_key(key) {
                    schema.insert_property(key, def.clone());
                }
            }
        }
    }
    schema
}

/// Decode one property schema.
pub fn property_from_json(value: &Value, source: &SchemaRef) -> PropertyDef {
    let ty = type_from_json(value, source);
    let mut def = PropertyDef::new(ty);
    let Some(obj) = value.as_object() else {
        return def;
    };
    if flag(obj, "nullable") {
        def.nullable = true;
    }
    if flag(obj, "readOnly") {
        def.readonly = true;
    }
    if flag(obj, "deprecated") {
        def.deprecated = true;
    }
    if let Some(desc) = obj.get("description").and_then(Value::as_str) {
        def.description = Some(desc.to_string());
    }
    def.with_constraints(constraints_from_json(obj))
}

/// Decode a type-position schema.
pub fn type_from_json(value: &Value, source: &SchemaRef) -> NormalizedType {
    let obj = match value {
        Value::Object(obj) => obj,
        Value::Bool(true) => return NormalizedType::Any,
        _ => return NormalizedType::Unknown,
    };

    if let Some(reference) = obj.get("$ref").and_then(Value::as_str) {
        let name = reference.rsplit('/').next().unwrap_or(reference);
        return NormalizedType::reference(name);
    }
    if let Some(constant) = obj.get("const").and_then(LiteralValue::from_json) {
        return NormalizedType::Literal { value: constant };
    }
    if let Some(members) = obj.get("enum").and_then(Value::as_array) {
        return NormalizedType::union(
            members
                .iter()
                .filter_map(LiteralValue::from_json)
                .map(|value| NormalizedType::Literal { value })
                .collect(),
        );
    }
    for key in ["anyOf", "oneOf"] {
        if let Some(variants) = obj.get(key).and_then(Value::as_array) {
            return NormalizedType::union(
                variants.iter().map(|v| type_from_json(v, source)).collect(),
            );
        }
    }
    if let Some(parts) = obj.get("allOf").and_then(Value::as_array) {
        if !obj.contains_key("properties") {
            return NormalizedType::Intersection {
                variants: parts.iter().map(|v| type_from_json(v, source)).collect(),
            };
        }
    }

    let nullable = flag(obj, "nullable");
    let base = match obj.get("type") {
        Some(Value::String(name)) => single_type(name, obj, source),
        Some(Value::Array(names)) => NormalizedType::union(
            names
                .iter()
                .filter_map(Value::as_str)
                .map(|name| single_type(name, obj, source))
                .collect(),
        ),
        _ if obj.contains_key("properties") => single_type("object", obj, source),
        _ if obj.contains_key("items") => single_type("array", obj, source),
        _ if obj.is_empty() => NormalizedType::Any,
        _ => NormalizedType::Unknown,
    };
    if nullable && !base.admits_null() {
        NormalizedType::union(vec![base, NormalizedType::null()])
    } else {
        base
    }
}

fn single_type(name: &str, obj: &Map<String, Value>, source: &SchemaRef) -> NormalizedType {
    match name {
        "object" if obj.contains_key("properties") => NormalizedType::object(schema_from_json(
            &Value::Object(obj.clone()),
            source.clone(),
        )),
        "array" => {
            let element = obj
                .get("items")
                .map(|items| type_from_json(items, source))
                .unwrap_or(NormalizedType::Unknown);
            NormalizedType::array(element)
        }
        other => normalize_type_name(SourceFormat::JsonSchema, other),
    }
}

fn constraints_from_json(obj: &Map<String, Value>) -> Constraints {
    let number = |key: &str| obj.get(key).and_then(Value::as_f64);
    let count = |key: &str| obj.get(key).and_then(Value::as_u64);
    let text = |key: &str| obj.get(key).and_then(Value::as_str).map(str::to_string);
    Constraints {
        pattern: text("pattern"),
        min: number("minimum").or_else(|| number("exclusiveMinimum")),
        max: number("maximum").or_else(|| number("exclusiveMaximum")),
        min_length: count("minLength").or_else(|| count("minItems")),
        max_length: count("maxLength").or_else(|| count("maxItems")),
        format: text("format"),
        enum_values: obj.get("enum").and_then(Value::as_array).cloned(),
        default: obj.get("default").cloned(),
    }
}

fn flag(obj: &Map<String, Value>, key: &str) -> bool {
    obj.get(key).and_then(Value::as_bool).unwrap_or(false)
}
