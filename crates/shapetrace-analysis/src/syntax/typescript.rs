//! Tree-sitter front end for TypeScript/JavaScript → neutral [`SyntaxTree`].
//!
//! Only named nodes are kept; comments and punctuation are dropped. Parenthesized
//! expressions are transparent (the inner expression takes the parenthesis' role).

use std::path::Path;

use shapetrace_core::constants::MAX_SYNTAX_DEPTH;
use shapetrace_core::errors::ParseError;
use tree_sitter::{Node, Parser};

use super::tree::{Field, NodeId, NodeKind, Position, SyntaxTree};

/// Languages this front end accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceLanguage {
    TypeScript,
    Tsx,
    JavaScript,
}

impl SourceLanguage {
    /// Detect from file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "ts" | "mts" | "cts" => Some(Self::TypeScript),
            "tsx" => Some(Self::Tsx),
            "js" | "mjs" | "cjs" | "jsx" => Some(Self::JavaScript),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::TypeScript => "typescript",
            Self::Tsx => "tsx",
            Self::JavaScript => "javascript",
        }
    }

    fn grammar(self) -> tree_sitter::Language {
        match self {
            Self::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Self::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
            Self::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
        }
    }
}

/// Parse TypeScript source into a neutral tree.
pub fn parse_typescript(source: &str) -> Result<SyntaxTree, ParseError> {
    parse_source(source, SourceLanguage::TypeScript, "<memory>")
}

/// Parse `source` with the grammar for `language`. `path` only labels errors.
pub fn parse_source(
    source: &str,
    language: SourceLanguage,
    path: &str,
) -> Result<SyntaxTree, ParseError> {
    let mut parser = Parser::new();
    parser
        .set_language(&language.grammar())
        .map_err(|_| ParseError::GrammarNotFound {
            language: language.name().to_string(),
        })?;

    let ts_tree = parser
        .parse(source, None)
        .ok_or_else(|| ParseError::TreeSitterError {
            path: path.to_string(),
            message: "tree-sitter returned None".to_string(),
        })?;

    let mut tree = SyntaxTree::new();
    convert(&mut tree, ts_tree.root_node(), source.as_bytes(), path)?;
    Ok(tree)
}

/// Copy named nodes into `tree` in pre-order. Walks with an explicit stack so nesting
/// depth is bounded by [`MAX_SYNTAX_DEPTH`], not by the thread's stack size.
fn convert(
    tree: &mut SyntaxTree,
    root: Node,
    source: &[u8],
    path: &str,
) -> Result<(), ParseError> {
    let mut stack: Vec<(Node, Option<NodeId>, Option<Field>, usize)> =
        vec![(root, None, None, 0)];
    while let Some((mut node, parent, field, depth)) = stack.pop() {
        if depth > MAX_SYNTAX_DEPTH {
            return Err(ParseError::TooDeep {
                path: path.to_string(),
                limit: MAX_SYNTAX_DEPTH,
            });
        }

        while node.kind() == "parenthesized_expression" {
            match named_children(node).into_iter().map(|(_, n)| n).next() {
                Some(inner) => node = inner,
                None => break,
            }
        }

        let raw = node.kind();
        let kind = map_kind(node);
        let text = leaf_text(node, kind, source);
        let start = node.start_position();
        let position = Position::new(start.row as u32 + 1, start.column as u32 + 1);
        let id = tree.add_node(parent, field, kind, raw, text, position);

        // Shorthand entries and literals are leaves in the neutral model.
        if matches!(kind, NodeKind::String | NodeKind::Number | NodeKind::Boolean | NodeKind::Null)
            || (kind == NodeKind::Pair && raw == "shorthand_property_identifier")
        {
            continue;
        }

        // Reverse so the first child is popped first.
        for (ts_field, child) in named_children(node).into_iter().rev() {
            stack.push((child, Some(id), map_field(kind, ts_field), depth + 1));
        }
    }
    Ok(())
}

/// Named, non-comment children with their tree-sitter field names.
fn named_children(node: Node) -> Vec<(Option<&'static str>, Node)> {
    let mut out = Vec::new();
    let mut cursor = node.walk();
    if cursor.goto_first_child() {
        loop {
            let child = cursor.node();
            if child.is_named() && child.kind() != "comment" {
                out.push((cursor.field_name(), child));
            }
            if !cursor.goto_next_sibling() {
                break;
            }
        }
    }
    out
}

fn map_kind(node: Node) -> NodeKind {
    match node.kind() {
        "program" => NodeKind::Program,
        "call_expression" | "new_expression" => NodeKind::Call,
        "member_expression" => NodeKind::Member,
        "identifier" | "property_identifier" | "type_identifier" | "this"
        | "shorthand_property_identifier_pattern" | "private_property_identifier"
        | "statement_identifier" => NodeKind::Identifier,
        "string" => NodeKind::String,
        "template_string" => {
            if named_children(node)
                .iter()
                .any(|(_, c)| c.kind() == "template_substitution")
            {
                NodeKind::Other
            } else {
                NodeKind::String
            }
        }
        "number" => NodeKind::Number,
        "true" | "false" => NodeKind::Boolean,
        "null" | "undefined" => NodeKind::Null,
        "object" => NodeKind::Object,
        "pair" | "shorthand_property_identifier" => NodeKind::Pair,
        "array" => NodeKind::Array,
        "function_declaration" | "function_expression" | "function" | "arrow_function"
        | "method_definition" | "generator_function_declaration" => NodeKind::Function,
        "return_statement" => NodeKind::Return,
        "variable_declarator" => NodeKind::Declarator,
        "decorator" => NodeKind::Decorator,
        "type_annotation" => NodeKind::TypeAnnotation,
        "generic_type" | "predefined_type" | "nested_type_identifier" => NodeKind::TypeReference,
        "type_arguments" => NodeKind::TypeArguments,
        "arguments" => NodeKind::Arguments,
        "statement_block" => NodeKind::Block,
        "export_statement" => NodeKind::Export,
        "class_declaration" | "class" | "abstract_class_declaration" => NodeKind::Class,
        "public_field_definition" | "field_definition" => NodeKind::ClassField,
        "await_expression" => NodeKind::Await,
        _ => NodeKind::Other,
    }
}

fn map_field(parent: NodeKind, ts_field: Option<&str>) -> Option<Field> {
    if parent == NodeKind::Decorator {
        return Some(Field::Expression);
    }
    match ts_field? {
        "function" | "constructor" => Some(Field::Callee),
        "arguments" => Some(Field::Arguments),
        "object" => Some(Field::Object),
        "property" => Some(Field::Property),
        "key" => Some(Field::Key),
        "value" => Some(match parent {
            NodeKind::Declarator | NodeKind::ClassField => Field::Init,
            NodeKind::Export => Field::Declaration,
            _ => Field::Value,
        }),
        "name" => Some(Field::Name),
        "parameters" | "parameter" => Some(Field::Parameters),
        "return_type" => Some(Field::ReturnType),
        "body" => Some(Field::Body),
        "type" => Some(Field::Type),
        "type_arguments" => Some(Field::TypeArguments),
        "declaration" => Some(Field::Declaration),
        _ => None,
    }
}

fn leaf_text(node: Node, kind: NodeKind, source: &[u8]) -> String {
    let raw = node.utf8_text(source).unwrap_or("");
    match kind {
        NodeKind::String => unescape(unquote(raw)),
        NodeKind::Identifier | NodeKind::Number | NodeKind::Boolean | NodeKind::Null => {
            raw.to_string()
        }
        NodeKind::Pair if node.kind() == "shorthand_property_identifier" => raw.to_string(),
        NodeKind::TypeReference if node.named_child_count() == 0 => raw.to_string(),
        NodeKind::Other if node.kind() == "regex" => raw.to_string(),
        NodeKind::Other if node.kind() == "property_signature" => member_flags(node),
        _ => String::new(),
    }
}

/// `optional`/`readonly` markers of a type member; they are anonymous tokens in the
/// grammar and would otherwise be dropped.
fn member_flags(node: Node) -> String {
    let mut flags = Vec::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "?" => flags.push("optional"),
            "readonly" => flags.push("readonly"),
            _ => {}
        }
    }
    flags.join(" ")
}

fn unquote(raw: &str) -> &str {
    let bytes = raw.as_bytes();
    if bytes.len() >= 2 {
        let first = bytes[0];
        let last = bytes[bytes.len() - 1];
        if first == last && matches!(first, b'"' | b'\'' | b'`') {
            return &raw[1..raw.len() - 1];
        }
    }
    raw
}

/// Resolve JS escape sequences in a literal body. Unknown escapes yield the escaped
/// character itself; malformed numeric escapes are kept verbatim.
fn unescape(body: &str) -> String {
    if !body.contains('\\') {
        return body.to_string();
    }
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(escaped) = chars.next() else {
            out.push('\\');
            break;
        };
        match escaped {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'v' => out.push('\u{b}'),
            '0' if !chars.peek().is_some_and(char::is_ascii_digit) => out.push('\0'),
            // Line continuation.
            '\n' => {}
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            'x' => {
                let hex: String = chars.by_ref().take(2).collect();
                push_code_point(&mut out, &hex, &format!("\\x{hex}"));
            }
            'u' if chars.peek() == Some(&'{') => {
                chars.next();
                let hex: String = chars.by_ref().take_while(|&c| c != '}').collect();
                push_code_point(&mut out, &hex, &format!("\\u{{{hex}}}"));
            }
            'u' => {
                let hex: String = chars.by_ref().take(4).collect();
                push_code_point(&mut out, &hex, &format!("\\u{hex}"));
            }
            other => out.push(other),
        }
    }
    out
}

fn push_code_point(out: &mut String, hex: &str, verbatim: &str) {
    match u32::from_str_radix(hex, 16).ok().and_then(char::from_u32) {
        Some(c) => out.push(c),
        None => out.push_str(verbatim),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::query;

    fn find_kind(tree: &SyntaxTree, kind: NodeKind) -> Vec<NodeId> {
        tree.descendants(tree.root().unwrap())
            .filter(|&id| tree.kind(id) == kind)
            .collect()
    }

    #[test]
    fn method_call_maps_to_neutral_call() {
        let tree = parse_typescript(r#"server.tool("get_user", { id: 1 });"#).unwrap();
        let calls = find_kind(&tree, NodeKind::Call);
        assert_eq!(calls.len(), 1);
        assert_eq!(query::callee_name(&tree, calls[0]), Some("tool"));
        let args = query::call_arguments(&tree, calls[0]);
        assert_eq!(args.len(), 2);
        assert_eq!(tree.kind(args[0]), NodeKind::String);
        assert_eq!(tree.text(args[0]), "get_user");
        assert_eq!(tree.kind(args[1]), NodeKind::Object);
    }

    #[test]
    fn string_escapes_are_decoded() {
        let tree = parse_typescript(
            r#"call('it\'s', "tab\there", "\u0041\x42\u{43}", `back\`tick`, 'a\qb', "\ud800");"#,
        )
        .unwrap();
        let call = find_kind(&tree, NodeKind::Call)[0];
        let texts: Vec<&str> = query::call_arguments(&tree, call)
            .into_iter()
            .map(|a| tree.text(a))
            .collect();
        assert_eq!(
            texts,
            vec!["it's", "tab\there", "ABC", "back`tick", "aqb", "\\ud800"]
        );
    }

    #[test]
    fn positions_are_one_based() {
        let tree = parse_typescript("\n  foo();").unwrap();
        let call = find_kind(&tree, NodeKind::Call)[0];
        assert_eq!(tree.node(call).position, Position::new(2, 3));
    }

    #[test]
    fn parenthesized_arrow_body_is_transparent() {
        let tree = parse_typescript("const f = () => ({ ok: true });").unwrap();
        let func = find_kind(&tree, NodeKind::Function)[0];
        let body = tree.child_by_field(func, Field::Body).unwrap();
        assert_eq!(tree.kind(body), NodeKind::Object);
    }

    #[test]
    fn declarator_value_is_init() {
        let tree = parse_typescript("const schema = { a: 1 };").unwrap();
        let decl = find_kind(&tree, NodeKind::Declarator)[0];
        let init = tree.child_by_field(decl, Field::Init).unwrap();
        assert_eq!(tree.kind(init), NodeKind::Object);
    }

    #[test]
    fn shorthand_property_becomes_leaf_pair() {
        let tree = parse_typescript("call({ name });").unwrap();
        let obj = find_kind(&tree, NodeKind::Object)[0];
        let entries = query::object_entries(&tree, obj);
        assert_eq!(entries[0].0, "name");
    }

    #[test]
    fn property_signature_keeps_optional_marker() {
        let tree = parse_typescript("interface U { readonly id: string; nick?: string }").unwrap();
        let sigs: Vec<&str> = tree
            .descendants(tree.root().unwrap())
            .filter(|&id| tree.node(id).raw_kind == "property_signature")
            .map(|id| tree.text(id))
            .collect();
        assert_eq!(sigs, vec!["readonly", "optional"]);
    }

    fn nested_arrays(depth: usize) -> String {
        format!("const x = {}1{};", "[".repeat(depth), "]".repeat(depth))
    }

    /// Parse on a thread with a typical worker stack.
    fn parse_on_small_stack(source: String) -> Result<SyntaxTree, ParseError> {
        std::thread::Builder::new()
            .stack_size(2 * 1024 * 1024)
            .spawn(move || parse_typescript(&source))
            .unwrap()
            .join()
            .unwrap()
    }

    #[test]
    fn deep_nesting_within_limit_converts() {
        let tree = parse_on_small_stack(nested_arrays(900)).unwrap();
        assert_eq!(find_kind(&tree, NodeKind::Array).len(), 900);
        let deepest = find_kind(&tree, NodeKind::Number)[0];
        assert_eq!(tree.ancestors(deepest).count(), 900 + 3);
    }

    #[test]
    fn nesting_past_limit_is_a_parse_error() {
        let err = parse_on_small_stack(nested_arrays(20_000)).unwrap_err();
        assert_eq!(
            err,
            ParseError::TooDeep {
                path: "<memory>".to_string(),
                limit: MAX_SYNTAX_DEPTH,
            }
        );
    }

    #[test]
    fn detects_language_from_extension() {
        assert_eq!(
            SourceLanguage::from_path(Path::new("a/b.ts")),
            Some(SourceLanguage::TypeScript)
        );
        assert_eq!(
            SourceLanguage::from_path(Path::new("a/b.jsx")),
            Some(SourceLanguage::JavaScript)
        );
        assert_eq!(SourceLanguage::from_path(Path::new("a/b.py")), None);
    }
}
