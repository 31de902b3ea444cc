//! SQL DDL adapter: `CREATE TABLE` statements → one schema per table.
//!
//! A column is required when it cannot be omitted on insert: `NOT NULL` or primary key,
//! with no default and no generated value. Nullable columns are optional and nullable.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use shapetrace_core::config::ScanConfig;
use shapetrace_core::errors::ExtractionError;
use shapetrace_core::SourceLocation;

use crate::schema::{
    normalize_type_name, Constraints, NormalizedSchema, PropertyDef, SchemaRef, SourceFormat,
};

use super::walk::source_files;
use super::{read_source, split_ref_id, SchemaAdapter};

const KIND: &str = "sql";

/// Keywords that end a column's type and start its constraints.
const COLUMN_KEYWORDS: &[&str] = &[
    "NOT", "NULL", "PRIMARY", "DEFAULT", "UNIQUE", "CHECK", "REFERENCES", "CONSTRAINT",
    "GENERATED", "AUTO_INCREMENT", "AUTOINCREMENT", "IDENTITY", "COLLATE", "COMMENT", "ON",
    "AS", "KEY",
];

/// First words of table-level constraint entries.
const TABLE_CONSTRAINTS: &[&str] = &[
    "PRIMARY", "FOREIGN", "UNIQUE", "CHECK", "CONSTRAINT", "INDEX", "KEY", "EXCLUDE",
    "FULLTEXT", "SPATIAL",
];

/// Type modifiers that do not change the normalized type.
const TYPE_MODIFIERS: &[&str] = &["UNSIGNED", "SIGNED", "ZEROFILL"];

fn create_table_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"(?i)\bcreate\s+(?:(?:global|local)\s+)?(?:temp(?:orary)?\s+)?(?:unlogged\s+)?table\s+(?:if\s+not\s+exists\s+)?((?:[`"\[]?[\w$]+[`"\]]?\s*\.\s*)*[`"\[]?[\w$]+[`"\]]?)\s*\("#,
        )
        .ok()
    })
    .as_ref()
}

#[derive(Debug, Default)]
pub struct SqlDdlAdapter {
    scan: ScanConfig,
}

impl SqlDdlAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scan_config(mut self, scan: ScanConfig) -> Self {
        self.scan = scan;
        self
    }
}

impl SchemaAdapter for SqlDdlAdapter {
    fn kind(&self) -> &str {
        KIND
    }

    /// `<path>#<table>`, or the `table` option. Table names match case-insensitively,
    /// with or without their schema qualifier.
    fn extract(&self, schema_ref: &SchemaRef) -> Result<NormalizedSchema, ExtractionError> {
        let (path, table) = split_ref_id(KIND, schema_ref, "table")?;
        let sql = read_source(KIND, path)?;
        parse_tables(path, &sql)
            .into_iter()
            .find(|schema| schema.name.as_deref().is_some_and(|name| table_matches(name, table)))
            .ok_or_else(|| ExtractionError::TargetNotFound {
                adapter: KIND.to_string(),
                target_kind: "table",
                name: table.to_string(),
                path: path.to_string(),
            })
    }

    fn list(&self, base_path: &Path) -> Vec<SchemaRef> {
        let mut refs: Vec<SchemaRef> = source_files(base_path, &["sql"], &self.scan)
            .iter()
            .flat_map(|path| {
                let label = path.display().to_string();
                match std::fs::read_to_string(path) {
                    Ok(sql) => parse_tables(&label, &sql)
                        .into_iter()
                        .map(|schema| schema.source)
                        .collect(),
                    Err(e) => {
                        tracing::debug!(path = %label, error = %e, "listing skipped file");
                        Vec::new()
                    }
                }
            })
            .collect();
        refs.sort_by(|a, b| a.id.cmp(&b.id));
        refs.dedup();
        refs
    }
}

fn table_matches(declared: &str, requested: &str) -> bool {
    declared.eq_ignore_ascii_case(requested)
        || declared
            .rsplit('.')
            .next()
            .is_some_and(|last| last.eq_ignore_ascii_case(requested))
}

/// Every `CREATE TABLE` in `sql`, in source order. Statements that do not parse are
/// skipped.
pub fn parse_tables(path: &str, sql: &str) -> Vec<NormalizedSchema> {
    let Some(re) = create_table_re() else {
        return Vec::new();
    };
    let text = strip_comments(sql);
    let mut tables = Vec::new();

    for caps in re.captures_iter(&text) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let Some(body) = balanced_body(&text[whole.end()..]) else {
            tracing::debug!(path, table = name.as_str(), "unterminated CREATE TABLE");
            continue;
        };
        let table = qualified_name(name.as_str());
        let location = location_of(path, &text, whole.start());
        tables.push(table_schema(path, &table, body, location));
    }
    tables
}

struct Column {
    name: String,
    def: PropertyDef,
    not_null: bool,
    primary_key: bool,
    generated: bool,
}

fn table_schema(path: &str, table: &str, body: &str, location: SourceLocation) -> NormalizedSchema {
    let mut columns: Vec<Column> = Vec::new();
    let mut table_pk: Vec<String> = Vec::new();

    for entry in split_top_level(body, ',') {
        let tokens = tokenize(entry);
        let Some(first) = tokens.first() else {
            continue;
        };
        if TABLE_CONSTRAINTS.contains(&first.to_ascii_uppercase().as_str()) {
            if let Some(cols) = primary_key_columns(&tokens) {
                table_pk.extend(cols);
            }
            continue;
        }
        if let Some(column) = parse_column(&tokens) {
            columns.push(column);
        }
    }

    let mut schema = NormalizedSchema::new(SchemaRef::new(KIND, format!("{path}#{table}")))
        .named(table)
        .at(location);
    for mut column in columns {
        let primary_key =
            column.primary_key || table_pk.iter().any(|k| k.eq_ignore_ascii_case(&column.name));
        let has_default = column.def.constraints.as_ref().is_some_and(|c| c.default.is_some());
        if !(column.not_null || primary_key) {
            column.def = column.def.optional().nullable();
        } else if has_default || column.generated {
            column.def = column.def.optional();
        }
        schema.insert_property(column.name, column.def);
    }
    schema
}

/// Columns named by `PRIMARY KEY (a, b)`, possibly after `CONSTRAINT name`.
fn primary_key_columns(tokens: &[String]) -> Option<Vec<String>> {
    let at = tokens.windows(2).position(|w| {
        w[0].eq_ignore_ascii_case("PRIMARY") && w[1].eq_ignore_ascii_case("KEY")
    })?;
    let list = tokens[at + 2..].iter().find(|t| t.starts_with('('))?;
    let inner = list.strip_prefix('(')?.strip_suffix(')')?;
    Some(split_top_level(inner, ',').into_iter().map(unquote_ident).collect())
}

fn parse_column(tokens: &[String]) -> Option<Column> {
    let (name, rest) = tokens.split_first()?;
    let upper: Vec<String> = rest.iter().map(|t| t.to_ascii_uppercase()).collect();

    let type_end = upper
        .iter()
        .position(|t| COLUMN_KEYWORDS.contains(&t.as_str()))
        .unwrap_or(rest.len());
    let type_text = rest[..type_end]
        .iter()
        .zip(&upper[..type_end])
        .filter(|(_, u)| !TYPE_MODIFIERS.contains(&u.as_str()))
        .map(|(t, _)| t.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    if type_text.is_empty() {
        return None;
    }

    let constraint = &upper[type_end..];
    let has_pair = |a: &str, b: &str| constraint.windows(2).any(|w| w[0] == a && w[1] == b);
    let has = |k: &str| constraint.iter().any(|t| t == k);
    let type_lower = type_text.to_ascii_lowercase();

    let mut constraints = Constraints {
        max_length: max_length(&type_lower),
        ..Constraints::default()
    };
    if let Some(at) = constraint.iter().position(|t| t == "DEFAULT") {
        constraints.default = rest.get(type_end + at + 1).map(|raw| default_value(raw));
    }

    let mut def = PropertyDef::new(normalize_type_name(SourceFormat::Sql, &type_text))
        .with_constraints(constraints);
    if let Some(at) = constraint.iter().position(|t| t == "COMMENT") {
        if let Some(text) = rest.get(type_end + at + 1) {
            def = def.with_description(unquote_string(text));
        }
    }

    Some(Column {
        name: unquote_ident(name),
        not_null: has_pair("NOT", "NULL"),
        primary_key: has_pair("PRIMARY", "KEY"),
        generated: has("AUTO_INCREMENT")
            || has("AUTOINCREMENT")
            || has("IDENTITY")
            || has("GENERATED")
            || type_lower.contains("serial"),
        def,
    })
}

/// `varchar(255)` → 255.
fn max_length(type_lower: &str) -> Option<u64> {
    let (base, params) = type_lower.split_once('(')?;
    let base = base.trim();
    if !matches!(
        base,
        "varchar" | "character varying" | "char" | "character" | "nchar" | "nvarchar"
    ) {
        return None;
    }
    params.trim_end_matches(')').trim().parse().ok()
}

fn default_value(raw: &str) -> serde_json::Value {
    if raw.starts_with('\'') {
        return serde_json::Value::String(unquote_string(raw));
    }
    if let Ok(n) = raw.parse::<i64>() {
        return n.into();
    }
    if let Some(n) = raw.parse::<f64>().ok().and_then(serde_json::Number::from_f64) {
        return serde_json::Value::Number(n);
    }
    match raw.to_ascii_lowercase().as_str() {
        "true" => true.into(),
        "false" => false.into(),
        "null" => serde_json::Value::Null,
        _ => serde_json::Value::String(raw.to_string()),
    }
}

// ---- lexing ----

/// Remove `--` and `/* */` comments, keeping newlines and string literals intact.
fn strip_comments(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut chars = sql.chars().peekable();
    let mut quote: Option<char> = None;

    while let Some(c) = chars.next() {
        if let Some(q) = quote {
            out.push(c);
            if c == q {
                quote = None;
            }
            continue;
        }
        let next = chars.peek().copied();
        match (c, next) {
            ('\'' | '"' | '`', _) => {
                quote = Some(c);
                out.push(c);
            }
            ('-', Some('-')) => {
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = '\0';
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        out.push('\n');
                    }
                    if prev == '*' && skipped == '/' {
                        break;
                    }
                    prev = skipped;
                }
                out.push(' ');
            }
            _ => out.push(c),
        }
    }
    out
}

/// Text up to the `)` closing an already-consumed `(`.
fn balanced_body(text: &str) -> Option<&str> {
    let mut depth = 1usize;
    let mut quote: Option<char> = None;
    for (i, c) in text.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '\'' | '"' | '`' => quote = Some(c),
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(&text[..i]);
                    }
                }
                _ => {}
            },
        }
    }
    None
}

/// Split on `sep` outside parentheses and quotes. Empty pieces are dropped.
fn split_top_level(text: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '\'' | '"' | '`' => quote = Some(c),
                '(' => depth += 1,
                ')' => depth = depth.saturating_sub(1),
                c if c == sep && depth == 0 => {
                    parts.push(text[start..i].trim());
                    start = i + c.len_utf8();
                }
                _ => {}
            },
        }
    }
    parts.push(text[start..].trim());
    parts.retain(|p| !p.is_empty());
    parts
}

/// Whitespace-separated tokens. A parenthesized group stays attached to the word
/// before it (`varchar(255)`, `numeric (10, 2)`), and quoted text is one token.
fn tokenize(entry: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;

    for c in entry.chars() {
        if let Some(q) = quote {
            current.push(c);
            if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' | '`' => {
                quote = Some(c);
                current.push(c);
            }
            '(' => {
                if depth == 0 && current.is_empty() && !is_keyword_token(tokens.last()) {
                    if let Some(prev) = tokens.pop() {
                        current = prev;
                    }
                }
                depth += 1;
                current.push(c);
            }
            ')' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            c if c.is_whitespace() && depth == 0 => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// `KEY (a, b)` and `CHECK (x > 0)` keep the group as a separate token.
fn is_keyword_token(token: Option<&String>) -> bool {
    token.is_some_and(|t| {
        let upper = t.to_ascii_uppercase();
        COLUMN_KEYWORDS.contains(&upper.as_str()) || upper == "EXISTS"
    })
}

fn unquote_ident(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c| matches!(c, '"' | '`' | '[' | ']'))
        .to_string()
}

fn unquote_string(raw: &str) -> String {
    raw.strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .map(|s| s.replace("''", "'"))
        .unwrap_or_else(|| raw.to_string())
}

/// `"public" . "users"` → `public.users`.
fn qualified_name(raw: &str) -> String {
    raw.split('.')
        .map(unquote_ident)
        .collect::<Vec<_>>()
        .join(".")
}

fn location_of(path: &str, text: &str, offset: usize) -> SourceLocation {
    let before = &text[..offset];
    let line = before.matches('\n').count() + 1;
    let column = before
        .rfind('\n')
        .map_or(before.chars().count(), |nl| before[nl + 1..].chars().count())
        + 1;
    SourceLocation::new(path, line as u32, column as u32)
}
