//! MCP tool adapter for TypeScript/JavaScript servers and clients.
//!
//! Producers are `server.tool(...)` / `server.registerTool(...)` calls, consumers are
//! `client.callTool({ name, arguments })` calls. Recognition is driven by the `mcp`
//! pattern pack; schemas are decoded from the located fragments.

use std::collections::BTreeMap;
use std::path::Path;

use rayon::prelude::*;
use shapetrace_core::config::{PackConfig, ScanConfig};
use shapetrace_core::errors::ExtractionError;

use crate::patterns::{MatchResult, PatternRegistry, PatternRole, ScanOptions};
use crate::schema::{
    decode_schema, resolve_binding, ArgumentValue, ConsumerSchema, NormalizedSchema,
    ProducerSchema, SchemaRef,
};
use crate::syntax::query;
use crate::syntax::{parse_source, Field, NodeId, NodeKind, SourceLanguage, SyntaxTree};

use super::walk::source_files;
use super::{read_source, split_ref_id, SchemaAdapter};

const KIND: &str = "mcp";
const FRAMEWORK: &str = "mcp";
const EXTENSIONS: &[&str] = &["ts", "tsx", "mts", "cts", "js", "jsx", "mjs", "cjs"];

/// Result envelope fields that are protocol plumbing rather than tool output.
const ENVELOPE_FIELDS: &[&str] = &["content", "isError", "_meta"];
const STRUCTURED_CONTENT: &str = "structuredContent";

#[derive(Debug)]
pub struct McpToolAdapter {
    registry: PatternRegistry,
    scan: ScanConfig,
}

impl Default for McpToolAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl McpToolAdapter {
    /// Adapter backed by the built-in `mcp` pack.
    pub fn new() -> Self {
        let packs = PackConfig {
            enabled_only: Some(vec![FRAMEWORK.to_string()]),
            ..PackConfig::default()
        };
        Self::with_registry(PatternRegistry::with_builtin_packs(Some(&packs)))
    }

    /// Adapter backed by a caller-built registry. Only `mcp` matchers are used.
    pub fn with_registry(registry: PatternRegistry) -> Self {
        Self {
            registry,
            scan: ScanConfig::default(),
        }
    }

    pub fn with_scan_config(mut self, scan: ScanConfig) -> Self {
        self.scan = scan;
        self
    }

    /// Tool declarations in one source file, in source order.
    pub fn extract_producers(
        &self,
        path: &str,
        source: &str,
    ) -> Result<Vec<ProducerSchema>, ExtractionError> {
        let tree = self.parse(path, source)?;
        Ok(self
            .matches(&tree, path, PatternRole::Producer)
            .into_iter()
            .map(|m| {
                let schema_ref = SchemaRef::new(KIND, format!("{path}#{}", m.identifier));
                let decode = |node: Option<NodeId>| {
                    node.and_then(|n| decode_schema(&tree, n, &schema_ref))
                        .unwrap_or_else(|| NormalizedSchema::new(schema_ref.clone()))
                        .at(m.location.clone())
                };
                ProducerSchema {
                    input_schema: decode(m.captures.input_schema),
                    output_schema: decode(m.captures.output_schema),
                    tool_name: m.identifier,
                    location: m.location,
                }
            })
            .collect())
    }

    /// `callTool` sites in one source file, in source order.
    pub fn trace_consumers(
        &self,
        path: &str,
        source: &str,
    ) -> Result<Vec<ConsumerSchema>, ExtractionError> {
        let tree = self.parse(path, source)?;
        Ok(self
            .matches(&tree, path, PatternRole::Consumer)
            .into_iter()
            .map(|m| ConsumerSchema {
                arguments_provided: m
                    .captures
                    .input_schema
                    .map(|node| provided_arguments(&tree, node))
                    .unwrap_or_default(),
                expected_properties: expected_properties(&tree, m.node),
                tool_name: m.identifier,
                call_site: m.location,
            })
            .collect())
    }

    /// Producers and consumers of every source file under `root`. Unreadable or
    /// unparsable files are skipped.
    pub fn trace_directory(&self, root: &Path) -> (Vec<ProducerSchema>, Vec<ConsumerSchema>) {
        let per_file: Vec<(Vec<ProducerSchema>, Vec<ConsumerSchema>)> = source_files(root, EXTENSIONS, &self.scan)
            .par_iter()
            .filter_map(|path| {
                let label = path.display().to_string();
                let source = std::fs::read_to_string(path)
                    .map_err(|e| tracing::debug!(path = %label, error = %e, "skipping unreadable file"))
                    .ok()?;
                let producers = self.extract_producers(&label, &source);
                let consumers = self.trace_consumers(&label, &source);
                match (producers, consumers) {
                    (Ok(p), Ok(c)) => Some((p, c)),
                    (Err(e), _) | (_, Err(e)) => {
                        tracing::debug!(path = %label, error = %e, "skipping file");
                        None
                    }
                }
            })
            .collect();

        let mut producers = Vec::new();
        let mut consumers = Vec::new();
        for (p, c) in per_file {
            producers.extend(p);
            consumers.extend(c);
        }
        (producers, consumers)
    }

    fn parse(&self, path: &str, source: &str) -> Result<SyntaxTree, ExtractionError> {
        let language = SourceLanguage::from_path(Path::new(path)).unwrap_or(SourceLanguage::TypeScript);
        parse_source(source, language, path).map_err(|e| ExtractionError::Parse {
            adapter: KIND.to_string(),
            path: path.to_string(),
            message: e.to_string(),
        })
    }

    fn matches(&self, tree: &SyntaxTree, path: &str, role: PatternRole) -> Vec<MatchResult> {
        let Some(root) = tree.root() else {
            return Vec::new();
        };
        let options = ScanOptions::from_config(path, &self.scan).with_frameworks([FRAMEWORK]);
        self.registry
            .scan(tree, root, &options)
            .matches
            .into_iter()
            .filter(|m| m.role() == role)
            .collect()
    }
}

impl SchemaAdapter for McpToolAdapter {
    fn kind(&self) -> &str {
        KIND
    }

    /// `<path>#<tool>`; option `schema` picks `input` (default) or `output`.
    fn extract(&self, schema_ref: &SchemaRef) -> Result<NormalizedSchema, ExtractionError> {
        let (path, tool) = split_ref_id(KIND, schema_ref, "tool")?;
        let want_output = match schema_ref.option_str("schema") {
            None | Some("input") => false,
            Some("output") => true,
            Some(other) => {
                return Err(ExtractionError::UnsupportedRef {
                    adapter: KIND.to_string(),
                    id: schema_ref.id.clone(),
                    reason: format!("schema option \"{other}\" is not input or output"),
                })
            }
        };
        let source = read_source(KIND, path)?;
        let producer = self
            .extract_producers(path, &source)?
            .into_iter()
            .find(|p| p.tool_name == tool)
            .ok_or_else(|| ExtractionError::TargetNotFound {
                adapter: KIND.to_string(),
                target_kind: "tool",
                name: tool.to_string(),
                path: path.to_string(),
            })?;
        Ok(if want_output {
            producer.output_schema
        } else {
            producer.input_schema
        })
    }

    fn list(&self, base_path: &Path) -> Vec<SchemaRef> {
        let mut refs: Vec<SchemaRef> = source_files(base_path, EXTENSIONS, &self.scan)
            .par_iter()
            .flat_map_iter(|path| {
                let label = path.display().to_string();
                let producers = std::fs::read_to_string(path)
                    .map_err(|e| e.to_string())
                    .and_then(|source| self.extract_producers(&label, &source).map_err(|e| e.to_string()))
                    .unwrap_or_else(|e| {
                        tracing::debug!(path = %label, error = %e, "listing skipped file");
                        Vec::new()
                    });
                producers
                    .into_iter()
                    .map(move |p| SchemaRef::new(KIND, format!("{label}#{}", p.tool_name)))
            })
            .collect();
        refs.sort_by(|a, b| a.id.cmp(&b.id));
        refs.dedup();
        refs
    }
}

/// Keys of an `arguments` object literal (or a same-file binding to one).
fn provided_arguments(tree: &SyntaxTree, node: NodeId) -> BTreeMap<String, ArgumentValue> {
    let object = match tree.kind(node) {
        NodeKind::Identifier => resolve_binding(tree, tree.text(node)),
        _ => Some(node),
    };
    let Some(object) = object else {
        return BTreeMap::new();
    };
    query::object_entries(tree, object)
        .into_iter()
        .map(|(key, value)| {
            let arg = match query::literal_value(tree, value) {
                Some(literal) => ArgumentValue::Literal(literal),
                None => ArgumentValue::Placeholder(placeholder(tree, value)),
            };
            (key, arg)
        })
        .collect()
}

fn placeholder(tree: &SyntaxTree, node: NodeId) -> String {
    match tree.kind(node) {
        NodeKind::Identifier | NodeKind::Pair => tree.text(node).to_string(),
        _ => query::member_path(tree, node).unwrap_or_else(|| format!("<{}>", tree.node(node).raw_kind)),
    }
}

/// Property paths read off the awaited result of a `callTool` call.
fn expected_properties(tree: &SyntaxTree, call: NodeId) -> Vec<String> {
    let Some(declarator) = result_declarator(tree, call) else {
        return Vec::new();
    };
    let Some(name) = tree.child_by_field(declarator, Field::Name) else {
        return Vec::new();
    };

    // (local binding, path of that binding inside the result)
    let mut bindings: Vec<(String, Vec<String>)> = Vec::new();
    let mut reads: Vec<Vec<String>> = Vec::new();
    if tree.kind(name) == NodeKind::Identifier {
        bindings.push((tree.text(name).to_string(), Vec::new()));
    } else {
        for &child in tree.children(name) {
            let (key, local) = match tree.kind(child) {
                NodeKind::Identifier => (tree.text(child).to_string(), tree.text(child).to_string()),
                _ => {
                    let Some(key) = tree.child_by_field(child, Field::Key) else {
                        continue;
                    };
                    let local = tree
                        .child_by_field(child, Field::Value)
                        .filter(|&v| tree.kind(v) == NodeKind::Identifier)
                        .map(|v| tree.text(v).to_string())
                        .unwrap_or_else(|| tree.text(key).to_string());
                    (tree.text(key).to_string(), local)
                }
            };
            reads.push(vec![key.clone()]);
            bindings.push((local, vec![key]));
        }
    }

    let scope = query::enclosing_function(tree, call).or_else(|| tree.root());
    if let Some(scope) = scope {
        for id in tree.descendants(scope) {
            if tree.kind(id) != NodeKind::Identifier || tree.node(id).field != Some(Field::Object) {
                continue;
            }
            let Some((_, prefix)) = bindings.iter().find(|(local, _)| local == tree.text(id)) else {
                continue;
            };
            let mut path = prefix.clone();
            path.extend(member_chain(tree, id));
            if path.len() > prefix.len() {
                reads.push(path);
            }
        }
    }

    let mut expected: Vec<String> = reads.into_iter().filter_map(result_path).collect();
    expected.sort();
    expected.dedup();
    expected
}

/// `const x = await client.callTool(...)` → the declarator.
fn result_declarator(tree: &SyntaxTree, call: NodeId) -> Option<NodeId> {
    let mut current = call;
    while let Some(parent) = tree.parent(current) {
        match tree.kind(parent) {
            NodeKind::Await => current = parent,
            NodeKind::Declarator => return Some(parent),
            _ => return None,
        }
    }
    None
}

/// Property names of `ident.a.b.c`, stopping at computed access.
fn member_chain(tree: &SyntaxTree, ident: NodeId) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = ident;
    while let Some(parent) = tree.parent(current) {
        if tree.kind(parent) != NodeKind::Member || tree.node(current).field != Some(Field::Object) {
            break;
        }
        let Some(property) = query::member_property(tree, parent) else {
            break;
        };
        segments.push(tree.text(property).to_string());
        current = parent;
    }
    segments
}

/// Map a read on the result envelope to a path in the tool's output schema.
fn result_path(segments: Vec<String>) -> Option<String> {
    let first = segments.first()?;
    if first == STRUCTURED_CONTENT {
        return (segments.len() > 1).then(|| segments[1..].join("."));
    }
    if ENVELOPE_FIELDS.contains(&first.as_str()) {
        return None;
    }
    Some(segments.join("."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::NormalizedType;

    const SERVER: &str = r#"
import { McpServer } from "@modelcontextprotocol/sdk/server/mcp.js";
import { z } from "zod";

const server = new McpServer({ name: "users", version: "1.0.0" });

server.tool("get_user", { id: z.string(), verbose: z.boolean().optional() }, async ({ id }) => ({
  content: [{ type: "text", text: id }],
}));

server.registerTool(
  "create_user",
  {
    description: "Create a user",
    inputSchema: { email: z.string().email(), name: z.string() },
    outputSchema: { id: z.string(), email: z.string() },
  },
  async (args) => ({ content: [], structuredContent: { id: "1", email: args.email } }),
);
"#;

    const CLIENT: &str = r#"
async function run(client) {
  const result = await client.callTool({ name: "create_user", arguments: { email: "a@b.c", nmae: userName } });
  console.log(result.structuredContent.emial, result.isError);
  const { structuredContent: data } = await client.callTool({ name: "get_user", arguments: { id: "1" } });
  return data.id;
}
"#;

    #[test]
    fn extracts_producers_with_schemas() {
        let adapter = McpToolAdapter::new();
        let producers = adapter.extract_producers("server.ts", SERVER).unwrap();
        let names: Vec<&str> = producers.iter().map(|p| p.tool_name.as_str()).collect();
        assert_eq!(names, vec!["get_user", "create_user"]);

        let get_user = &producers[0];
        assert!(get_user.input_schema.is_required("id"));
        assert!(!get_user.input_schema.is_required("verbose"));
        assert_eq!(get_user.input_schema.source.id, "server.ts#get_user");
        assert!(get_user.output_schema.properties.is_empty());

        let create_user = &producers[1];
        assert_eq!(
            create_user.input_schema.property("email").map(|p| &p.ty),
            Some(&NormalizedType::string())
        );
        assert_eq!(
            create_user.output_schema.property_names().collect::<Vec<_>>(),
            vec!["id", "email"]
        );
        assert_eq!(create_user.location.line, 11);
    }

    #[test]
    fn traces_consumers_arguments_and_reads() {
        let adapter = McpToolAdapter::new();
        let consumers = adapter.trace_consumers("client.ts", CLIENT).unwrap();
        assert_eq!(consumers.len(), 2);

        let create = &consumers[0];
        assert_eq!(create.tool_name, "create_user");
        assert_eq!(
            create.arguments_provided.get("email"),
            Some(&ArgumentValue::Literal("a@b.c".into()))
        );
        assert_eq!(
            create.arguments_provided.get("nmae"),
            Some(&ArgumentValue::Placeholder("userName".into()))
        );
        assert_eq!(create.expected_properties, vec!["emial"]);

        let get = &consumers[1];
        assert_eq!(get.expected_properties, vec!["id"]);
    }

    #[test]
    fn extract_by_ref() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server.ts");
        std::fs::write(&path, SERVER).unwrap();
        let adapter = McpToolAdapter::new();
        let id = format!("{}#create_user", path.display());

        let input = adapter.extract(&SchemaRef::new("mcp", id.clone())).unwrap();
        assert_eq!(input.property_names().collect::<Vec<_>>(), vec!["email", "name"]);

        let output = adapter
            .extract(&SchemaRef::new("mcp", id).with_option("schema", "output".into()))
            .unwrap();
        assert!(output.is_required("id"));

        let missing = adapter
            .extract(&SchemaRef::new("mcp", format!("{}#delete_user", path.display())))
            .unwrap_err();
        assert!(matches!(missing, ExtractionError::TargetNotFound { .. }));

        let unreadable = adapter
            .extract(&SchemaRef::new("mcp", "/nonexistent/server.ts#x"))
            .unwrap_err();
        assert!(matches!(unreadable, ExtractionError::Io { .. }));
    }

    #[test]
    fn list_never_fails() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("server.ts"), SERVER).unwrap();
        std::fs::write(dir.path().join("client.ts"), CLIENT).unwrap();
        let adapter = McpToolAdapter::new();

        let refs = adapter.list(dir.path());
        let tools: Vec<&str> = refs.iter().filter_map(|r| r.id.rsplit_once('#')).map(|(_, t)| t).collect();
        assert_eq!(tools, vec!["create_user", "get_user"]);

        assert!(adapter.list(Path::new("/nonexistent/dir")).is_empty());
    }
}
