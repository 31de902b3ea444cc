//! Per-format type name → [`NormalizedType`] tables.
//!
//! Total and stable: every input yields a type, and the same input always yields the
//! same type. Composite descriptors (`T[]`, `List[T]`, `[]T`, `repeated T`, ...) are
//! parsed recursively; the scalar tables sit at the leaves.

use serde::{Deserialize, Serialize};

use super::types::{LiteralValue, NormalizedType};

/// Source formats with a mapping table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFormat {
    TypeScript,
    Zod,
    JsonSchema,
    Python,
    Go,
    Protobuf,
    GraphQl,
    Sql,
}

impl SourceFormat {
    pub const ALL: [SourceFormat; 8] = [
        Self::TypeScript,
        Self::Zod,
        Self::JsonSchema,
        Self::Python,
        Self::Go,
        Self::Protobuf,
        Self::GraphQl,
        Self::Sql,
    ];

    /// Whether unknown bare identifiers name user-defined types in this format.
    fn has_named_types(self) -> bool {
        matches!(
            self,
            Self::TypeScript | Self::Python | Self::Go | Self::Protobuf | Self::GraphQl
        )
    }
}

/// Map a type descriptor written in `format` to its normalized type.
pub fn normalize_type_name(format: SourceFormat, raw: &str) -> NormalizedType {
    let name = raw.trim();
    if name.is_empty() {
        return NormalizedType::Unknown;
    }
    let composite = match format {
        SourceFormat::TypeScript => typescript_composite(name),
        SourceFormat::Python => python_composite(name),
        SourceFormat::Go => go_composite(name),
        SourceFormat::Protobuf => protobuf_composite(name),
        SourceFormat::GraphQl => graphql_composite(name),
        SourceFormat::Sql => sql_composite(name),
        SourceFormat::Zod | SourceFormat::JsonSchema => None,
    };
    if let Some(ty) = composite {
        return ty;
    }
    if let Some(ty) = scalar(format, name) {
        return ty;
    }
    if format.has_named_types() && is_identifier(name) {
        return NormalizedType::reference(name);
    }
    NormalizedType::Unknown
}

fn scalar(format: SourceFormat, name: &str) -> Option<NormalizedType> {
    match format {
        SourceFormat::TypeScript => typescript_scalar(name),
        SourceFormat::Zod => zod_scalar(name),
        SourceFormat::JsonSchema => json_schema_scalar(name),
        SourceFormat::Python => python_scalar(name),
        SourceFormat::Go => go_scalar(name),
        SourceFormat::Protobuf => protobuf_scalar(name),
        SourceFormat::GraphQl => graphql_scalar(name),
        SourceFormat::Sql => sql_scalar(&name.to_ascii_lowercase()),
    }
}

// ---- scalar tables ----

fn typescript_scalar(name: &str) -> Option<NormalizedType> {
    Some(match name {
        "string" | "String" | "Date" => NormalizedType::string(),
        "number" | "Number" | "bigint" | "BigInt" => NormalizedType::number(),
        "boolean" | "Boolean" => NormalizedType::boolean(),
        "null" | "undefined" | "void" => NormalizedType::null(),
        "any" | "object" | "Object" | "{}" | "Buffer" | "Uint8Array" => NormalizedType::Any,
        "unknown" | "never" => NormalizedType::Unknown,
        "true" | "false" => NormalizedType::Literal {
            value: LiteralValue::Boolean(name == "true"),
        },
        _ => return literal_token(name),
    })
}

fn zod_scalar(name: &str) -> Option<NormalizedType> {
    Some(match name {
        "string" | "email" | "url" | "uuid" | "cuid" | "datetime" | "date" | "ip" => {
            NormalizedType::string()
        }
        "number" | "int" | "bigint" | "nan" => NormalizedType::number(),
        "boolean" => NormalizedType::boolean(),
        "null" | "undefined" | "void" => NormalizedType::null(),
        "any" | "record" | "map" | "object" => NormalizedType::Any,
        "unknown" | "never" => NormalizedType::Unknown,
        _ => return None,
    })
}

fn json_schema_scalar(name: &str) -> Option<NormalizedType> {
    Some(match name {
        "string" => NormalizedType::string(),
        "number" | "integer" => NormalizedType::number(),
        "boolean" => NormalizedType::boolean(),
        "null" => NormalizedType::null(),
        "object" => NormalizedType::Any,
        "array" => NormalizedType::array(NormalizedType::Unknown),
        _ => return None,
    })
}

fn python_scalar(name: &str) -> Option<NormalizedType> {
    let bare = name.rsplit('.').next().unwrap_or(name);
    Some(match bare {
        "str" | "EmailStr" | "HttpUrl" | "AnyUrl" | "UUID" | "datetime" | "date" | "time"
        | "constr" => NormalizedType::string(),
        "int" | "float" | "Decimal" | "conint" | "confloat" | "condecimal" | "PositiveInt"
        | "NonNegativeInt" => NormalizedType::number(),
        "bool" | "StrictBool" => NormalizedType::boolean(),
        "None" | "NoneType" => NormalizedType::null(),
        "Any" | "dict" | "Dict" | "Json" | "bytes" | "object" => NormalizedType::Any,
        _ => return None,
    })
}

fn go_scalar(name: &str) -> Option<NormalizedType> {
    Some(match name {
        "string" | "rune" | "time.Time" | "uuid.UUID" => NormalizedType::string(),
        "int" | "int8" | "int16" | "int32" | "int64" | "uint" | "uint8" | "uint16" | "uint32"
        | "uint64" | "uintptr" | "float32" | "float64" | "byte" | "time.Duration" => {
            NormalizedType::number()
        }
        "bool" => NormalizedType::boolean(),
        "any" | "interface{}" | "json.RawMessage" | "[]byte" => NormalizedType::Any,
        _ => return None,
    })
}

fn protobuf_scalar(name: &str) -> Option<NormalizedType> {
    Some(match name {
        "string" | "google.protobuf.Timestamp" | "google.protobuf.Duration"
        | "google.protobuf.StringValue" => NormalizedType::string(),
        "double" | "float" | "int32" | "int64" | "uint32" | "uint64" | "sint32" | "sint64"
        | "fixed32" | "fixed64" | "sfixed32" | "sfixed64" | "google.protobuf.Int32Value"
        | "google.protobuf.Int64Value" | "google.protobuf.DoubleValue" => NormalizedType::number(),
        "bool" | "google.protobuf.BoolValue" => NormalizedType::boolean(),
        "bytes" | "google.protobuf.Any" | "google.protobuf.Struct" | "google.protobuf.Value" => {
            NormalizedType::Any
        }
        "google.protobuf.Empty" => NormalizedType::null(),
        _ => return None,
    })
}

fn graphql_scalar(name: &str) -> Option<NormalizedType> {
    Some(match name {
        "String" | "ID" | "DateTime" | "Date" => NormalizedType::string(),
        "Int" | "Float" => NormalizedType::number(),
        "Boolean" => NormalizedType::boolean(),
        "JSON" | "JSONObject" => NormalizedType::Any,
        _ => return None,
    })
}

/// Expects a lowercased name.
fn sql_scalar(name: &str) -> Option<NormalizedType> {
    // Drop size/precision parameters: varchar(255), numeric(10, 2).
    let base = name.split('(').next().unwrap_or(name).trim();
    if base == "tinyint" && name.contains("(1)") {
        return Some(NormalizedType::boolean());
    }
    Some(match base {
        "varchar" | "character varying" | "char" | "character" | "nchar" | "nvarchar" | "text"
        | "tinytext" | "mediumtext" | "longtext" | "citext" | "uuid" | "date" | "time"
        | "timetz" | "timestamp" | "timestamptz" | "datetime" | "interval" | "inet" | "cidr"
        | "timestamp with time zone" | "timestamp without time zone" => NormalizedType::string(),
        "int" | "integer" | "int2" | "int4" | "int8" | "smallint" | "bigint" | "tinyint"
        | "mediumint" | "serial" | "smallserial" | "bigserial" | "numeric" | "decimal" | "real"
        | "float" | "float4" | "float8" | "double" | "double precision" | "money" => {
            NormalizedType::number()
        }
        "bool" | "boolean" | "bit" => NormalizedType::boolean(),
        "json" | "jsonb" | "blob" | "bytea" | "binary" | "varbinary" | "longblob" | "xml" => {
            NormalizedType::Any
        }
        _ => return None,
    })
}

/// `'a'`, `"a"`, or a numeric token as a literal type.
fn literal_token(name: &str) -> Option<NormalizedType> {
    let bytes = name.as_bytes();
    if bytes.len() >= 2 && matches!(bytes[0], b'\'' | b'"') && bytes[bytes.len() - 1] == bytes[0]
    {
        return Some(NormalizedType::literal_str(&name[1..name.len() - 1]));
    }
    if name.starts_with(|c: char| c.is_ascii_digit() || c == '-') {
        let n = name
            .parse::<i64>()
            .ok()
            .map(serde_json::Number::from)
            .or_else(|| name.parse::<f64>().ok().and_then(serde_json::Number::from_f64))?;
        return Some(NormalizedType::Literal {
            value: LiteralValue::Number(n),
        });
    }
    None
}

// ---- composite descriptors ----

fn typescript_composite(name: &str) -> Option<NormalizedType> {
    let parts = split_top_level(name, '|');
    if parts.len() > 1 {
        return Some(NormalizedType::union(
            parts
                .iter()
                .map(|p| normalize_type_name(SourceFormat::TypeScript, p))
                .collect(),
        ));
    }
    let parts = split_top_level(name, '&');
    if parts.len() > 1 {
        return Some(NormalizedType::Intersection {
            variants: parts
                .iter()
                .map(|p| normalize_type_name(SourceFormat::TypeScript, p))
                .collect(),
        });
    }
    if let Some(inner) = name.strip_suffix("[]") {
        return Some(NormalizedType::array(normalize_type_name(
            SourceFormat::TypeScript,
            inner,
        )));
    }
    if let Some(inner) = strip_parens(name) {
        return Some(normalize_type_name(SourceFormat::TypeScript, inner));
    }
    let (base, args) = generic(name, '<', '>')?;
    Some(match base {
        "Array" | "ReadonlyArray" | "Set" => {
            NormalizedType::array(normalize_type_name(SourceFormat::TypeScript, args.first()?))
        }
        "Promise" | "Readonly" | "Awaited" => {
            normalize_type_name(SourceFormat::TypeScript, args.first()?)
        }
        "Record" | "Map" | "Partial" | "Pick" | "Omit" => NormalizedType::Any,
        other => NormalizedType::reference(other),
    })
}

fn python_composite(name: &str) -> Option<NormalizedType> {
    let parts = split_top_level(name, '|');
    if parts.len() > 1 {
        return Some(NormalizedType::union(
            parts
                .iter()
                .map(|p| normalize_type_name(SourceFormat::Python, p))
                .collect(),
        ));
    }
    let (base, args) = generic(name, '[', ']')?;
    let base = base.rsplit('.').next().unwrap_or(base);
    let first = || {
        args.first()
            .map(|a| normalize_type_name(SourceFormat::Python, a))
            .unwrap_or(NormalizedType::Unknown)
    };
    Some(match base {
        "Optional" => NormalizedType::union(vec![first(), NormalizedType::null()]),
        "Union" => NormalizedType::union(
            args.iter()
                .map(|a| normalize_type_name(SourceFormat::Python, a))
                .collect(),
        ),
        "List" | "list" | "Sequence" | "Set" | "set" | "FrozenSet" | "frozenset" | "Iterable"
        | "Tuple" | "tuple" => {
            // Tuple[int, ...] keeps the element; heterogeneous tuples become a union.
            let elements: Vec<NormalizedType> = args
                .iter()
                .filter(|a| a.as_str() != "...")
                .map(|a| normalize_type_name(SourceFormat::Python, a))
                .collect();
            NormalizedType::array(NormalizedType::union(elements))
        }
        "Dict" | "dict" | "Mapping" => NormalizedType::Any,
        "Literal" => NormalizedType::union(
            args.iter()
                .map(|a| literal_token(a).unwrap_or_else(|| python_literal_keyword(a)))
                .collect(),
        ),
        "Annotated" => first(),
        other => NormalizedType::reference(other),
    })
}

fn python_literal_keyword(token: &str) -> NormalizedType {
    match token {
        "True" | "False" => NormalizedType::Literal {
            value: LiteralValue::Boolean(token == "True"),
        },
        "None" => NormalizedType::null(),
        _ => NormalizedType::Unknown,
    }
}

fn go_composite(name: &str) -> Option<NormalizedType> {
    if name == "[]byte" {
        return None;
    }
    if let Some(inner) = name.strip_prefix('*') {
        return Some(normalize_type_name(SourceFormat::Go, inner));
    }
    if let Some(inner) = name.strip_prefix("[]") {
        return Some(NormalizedType::array(normalize_type_name(SourceFormat::Go, inner)));
    }
    if let Some(rest) = name.strip_prefix('[') {
        // Fixed-size array: [4]T
        let (_, inner) = rest.split_once(']')?;
        return Some(NormalizedType::array(normalize_type_name(SourceFormat::Go, inner)));
    }
    if name.starts_with("map[") {
        return Some(NormalizedType::Any);
    }
    None
}

fn protobuf_composite(name: &str) -> Option<NormalizedType> {
    if let Some(inner) = name.strip_prefix("repeated ") {
        return Some(NormalizedType::array(normalize_type_name(
            SourceFormat::Protobuf,
            inner,
        )));
    }
    if let Some(inner) = name.strip_prefix("optional ") {
        return Some(normalize_type_name(SourceFormat::Protobuf, inner));
    }
    if name.starts_with("map<") {
        return Some(NormalizedType::Any);
    }
    None
}

fn graphql_composite(name: &str) -> Option<NormalizedType> {
    if let Some(inner) = name.strip_suffix('!') {
        return Some(normalize_type_name(SourceFormat::GraphQl, inner));
    }
    let inner = name.strip_prefix('[')?.strip_suffix(']')?;
    Some(NormalizedType::array(normalize_type_name(
        SourceFormat::GraphQl,
        inner,
    )))
}

fn sql_composite(name: &str) -> Option<NormalizedType> {
    if let Some(inner) = name.strip_suffix("[]") {
        return Some(NormalizedType::array(normalize_type_name(SourceFormat::Sql, inner)));
    }
    let lower = name.to_ascii_lowercase();
    if lower.starts_with("enum(") || lower.starts_with("set(") {
        let open = name.find('(')?;
        let inner = name[open + 1..].strip_suffix(')')?;
        let members: Vec<NormalizedType> = split_top_level(inner, ',')
            .iter()
            .filter_map(|m| literal_token(m))
            .collect();
        let ty = NormalizedType::union(members);
        return Some(if lower.starts_with("set(") {
            NormalizedType::array(ty)
        } else {
            ty
        });
    }
    None
}

// ---- helpers ----

/// `Base<A, B>` → `("Base", ["A", "B"])`.
fn generic(name: &str, open: char, close: char) -> Option<(&str, Vec<String>)> {
    let start = name.find(open)?;
    let inner = name[start + open.len_utf8()..].strip_suffix(close)?;
    let base = name[..start].trim();
    if base.is_empty() {
        return None;
    }
    Some((base, split_top_level(inner, ',')))
}

fn strip_parens(name: &str) -> Option<&str> {
    let inner = name.strip_prefix('(')?.strip_suffix(')')?;
    // Reject `(a)(b)`, where the outer parens are not a pair.
    let mut depth = 0i32;
    for c in inner.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            _ => {}
        }
        if depth < 0 {
            return None;
        }
    }
    Some(inner)
}

/// Split on `sep` outside any bracket or quote nesting. Pieces are trimmed; empty
/// pieces (a leading `|`) are dropped.
fn split_top_level(input: &str, sep: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut current = String::new();
    for c in input.chars() {
        match quote {
            Some(q) => {
                if c == q {
                    quote = None;
                }
                current.push(c);
                continue;
            }
            None if c == '\'' || c == '"' => {
                quote = Some(c);
                current.push(c);
                continue;
            }
            None => {}
        }
        match c {
            '<' | '[' | '(' | '{' => depth += 1,
            '>' | ']' | ')' | '}' => depth -= 1,
            _ => {}
        }
        if c == sep && depth == 0 {
            parts.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    parts.push(current);
    parts
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '.')
}
