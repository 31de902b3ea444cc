//! Single-pass pattern scan over a syntax tree.

use std::time::Instant;

use rayon::prelude::*;
use shapetrace_core::config::ScanConfig;
use smallvec::SmallVec;

use crate::syntax::query;
use crate::syntax::{NodeId, NodeKind, SyntaxTree};

use super::diagnostics::ScanDiagnostics;
use super::matcher::PatternMatcher;
use super::registry::PatternRegistry;
use super::types::{MatchContext, MatchResult, PatternType};

/// Per-scan options.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanOptions {
    /// Label stamped on match locations.
    pub file: String,
    /// Only run matchers of these frameworks. Empty means all.
    pub frameworks: Vec<String>,
    /// Nodes deeper than this are not visited.
    pub max_depth: Option<usize>,
    /// Stop after this many matches. 0 = unlimited.
    pub match_limit: usize,
}

impl ScanOptions {
    pub fn for_file(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            ..Self::default()
        }
    }

    pub fn from_config(file: impl Into<String>, config: &ScanConfig) -> Self {
        Self {
            file: file.into(),
            frameworks: config.frameworks.clone(),
            max_depth: Some(config.effective_max_depth()),
            match_limit: config.effective_match_limit(),
        }
    }

    pub fn with_frameworks<I, S>(mut self, frameworks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.frameworks = frameworks.into_iter().map(Into::into).collect();
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    /// Matches in pre-order.
    pub matches: Vec<MatchResult>,
    pub diagnostics: ScanDiagnostics,
}

/// Pattern types a node can satisfy.
pub fn node_pattern_types(tree: &SyntaxTree, node: NodeId) -> SmallVec<[PatternType; 2]> {
    let mut types = SmallVec::new();
    match tree.kind(node) {
        NodeKind::Call => {
            types.push(PatternType::Call);
            if query::is_chained_call(tree, node) {
                types.push(PatternType::Chain);
            }
        }
        NodeKind::Decorator => types.push(PatternType::Decorator),
        NodeKind::Pair | NodeKind::ClassField => types.push(PatternType::Property),
        NodeKind::Export => types.push(PatternType::Export),
        _ => {}
    }
    types
}

impl PatternRegistry {
    /// Visit `root` and every descendant once, in pre-order. At each node the first
    /// matcher (in registration order) that returns a result wins.
    pub fn scan(&self, tree: &SyntaxTree, root: NodeId, options: &ScanOptions) -> ScanOutcome {
        let started = Instant::now();
        let candidates: Vec<&dyn PatternMatcher> = self
            .iter()
            .filter(|m| {
                options.frameworks.is_empty()
                    || options.frameworks.iter().any(|f| f == m.framework())
            })
            .collect();

        let mut matches = Vec::new();
        let mut diag = ScanDiagnostics {
            files_scanned: 1,
            ..ScanDiagnostics::default()
        };

        let mut stack = vec![(root, 0usize)];
        while let Some((node, depth)) = stack.pop() {
            if options.max_depth.is_some_and(|max| depth > max) {
                diag.truncated = true;
                continue;
            }
            diag.nodes_visited += 1;

            let types = node_pattern_types(tree, node);
            if !types.is_empty() {
                let ctx = MatchContext {
                    file: &options.file,
                    node_types: &types,
                };
                let hit = candidates
                    .iter()
                    .filter(|m| m.supported_types().iter().any(|t| types.contains(t)))
                    .find_map(|m| m.match_node(tree, node, &ctx));
                if let Some(result) = hit {
                    *diag.hits_per_matcher.entry(result.matcher.clone()).or_insert(0) += 1;
                    matches.push(result);
                    if options.match_limit > 0 && matches.len() >= options.match_limit {
                        diag.truncated = !stack.is_empty() || !tree.children(node).is_empty();
                        break;
                    }
                }
            }

            // Reverse so the first child is popped first.
            for &child in tree.children(node).iter().rev() {
                stack.push((child, depth + 1));
            }
        }

        diag.matches = matches.len();
        diag.scan_duration = started.elapsed();
        tracing::debug!(
            file = %options.file,
            nodes = diag.nodes_visited,
            matches = diag.matches,
            truncated = diag.truncated,
            "pattern scan complete"
        );
        ScanOutcome {
            matches,
            diagnostics: diag,
        }
    }

    /// Scan many trees in parallel. Each entry's label replaces `options.file`;
    /// results keep input order.
    pub fn scan_many(&self, trees: &[(String, SyntaxTree)], options: &ScanOptions) -> ScanOutcome {
        let outcomes: Vec<ScanOutcome> = trees
            .par_iter()
            .filter_map(|(file, tree)| {
                let root = tree.root()?;
                let per_file = ScanOptions {
                    file: file.clone(),
                    ..options.clone()
                };
                Some(self.scan(tree, root, &per_file))
            })
            .collect();

        let mut merged = ScanOutcome::default();
        for outcome in outcomes {
            merged.diagnostics.merge(&outcome.diagnostics);
            merged.matches.extend(outcome.matches);
        }
        merged
    }
}

/// Free-function form of [`PatternRegistry::scan`].
pub fn scan_for_patterns(
    registry: &PatternRegistry,
    tree: &SyntaxTree,
    root: NodeId,
    options: &ScanOptions,
) -> ScanOutcome {
    registry.scan(tree, root, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::matcher::DefinitionMatcher;
    use crate::patterns::types::{NamePattern, PatternDef, PatternRole};
    use crate::syntax::parse_typescript;

    const SOURCE: &str = r#"
const server = new McpServer({ name: "demo", version: "1.0.0" });
server.tool("get_user", { id: z.string() }, async ({ id }) => ({ content: [] }));
server.tool("list_users", "List every user", { limit: z.number().optional() }, async () => ({ content: [] }));
const result = await client.callTool({ name: "get_user", arguments: { id: "1" } });
"#;

    fn scan_source(registry: &PatternRegistry, source: &str, options: &ScanOptions) -> ScanOutcome {
        let tree = parse_typescript(source).unwrap();
        let root = tree.root().unwrap();
        registry.scan(&tree, root, options)
    }

    #[test]
    fn builtin_mcp_pack_finds_producers_and_consumers() {
        let registry = PatternRegistry::with_builtin_packs(None);
        let outcome = scan_source(&registry, SOURCE, &ScanOptions::for_file("server.ts"));
        let found: Vec<(&str, PatternRole)> = outcome
            .matches
            .iter()
            .map(|m| (m.identifier.as_str(), m.role()))
            .collect();
        assert_eq!(
            found,
            vec![
                ("get_user", PatternRole::Producer),
                ("list_users", PatternRole::Producer),
                ("get_user", PatternRole::Consumer),
            ]
        );
        let described = &outcome.matches[1];
        assert_eq!(described.pattern.id, "mcp/tool-described");
        assert_eq!(described.captures.description.as_deref(), Some("List every user"));
        assert_eq!(outcome.diagnostics.hits_per_matcher["mcp-server"], 2);
        assert_eq!(outcome.diagnostics.hits_per_matcher["mcp-client"], 1);
        assert!(!outcome.diagnostics.truncated);
    }

    #[test]
    fn visits_every_node_and_first_matcher_wins() {
        let tree = parse_typescript("server.tool('a', {}); server.tool('b', {});").unwrap();
        let root = tree.root().unwrap();
        let mut registry = PatternRegistry::new();
        for name in ["first", "second"] {
            registry
                .register(DefinitionMatcher::new(
                    name,
                    "mcp",
                    vec![PatternDef::new("p", PatternType::Call, NamePattern::exact("tool"))],
                ))
                .unwrap();
        }
        let outcome = registry.scan(&tree, root, &ScanOptions::for_file("a.ts"));
        assert_eq!(outcome.diagnostics.nodes_visited, tree.descendants(root).count());
        assert_eq!(outcome.matches.len(), 2);
        assert!(outcome.matches.iter().all(|m| m.matcher == "first"));
    }

    #[test]
    fn framework_filter_limits_matchers() {
        let registry = PatternRegistry::with_builtin_packs(None);
        let options = ScanOptions::for_file("x.ts").with_frameworks(["express"]);
        let outcome = scan_source(&registry, SOURCE, &options);
        assert!(outcome.matches.is_empty());
    }

    #[test]
    fn match_limit_truncates() {
        let registry = PatternRegistry::with_builtin_packs(None);
        let options = ScanOptions {
            match_limit: 1,
            ..ScanOptions::for_file("x.ts")
        };
        let outcome = scan_source(&registry, SOURCE, &options);
        assert_eq!(outcome.matches.len(), 1);
        assert!(outcome.diagnostics.truncated);
    }

    #[test]
    fn depth_bound_truncates() {
        let registry = PatternRegistry::with_builtin_packs(None);
        let options = ScanOptions {
            max_depth: Some(1),
            ..ScanOptions::for_file("x.ts")
        };
        let outcome = scan_source(&registry, SOURCE, &options);
        assert!(outcome.matches.is_empty());
        assert!(outcome.diagnostics.truncated);
    }

    #[test]
    fn chained_calls_carry_both_types() {
        let tree = parse_typescript("t.procedure.input(A).query(h);").unwrap();
        let root = tree.root().unwrap();
        let outer = tree
            .descendants(root)
            .find(|&id| query::callee_name(&tree, id) == Some("query"))
            .unwrap();
        assert_eq!(
            node_pattern_types(&tree, outer).as_slice(),
            &[PatternType::Call, PatternType::Chain]
        );
        let inner = tree
            .descendants(root)
            .find(|&id| query::callee_name(&tree, id) == Some("input"))
            .unwrap();
        assert_eq!(node_pattern_types(&tree, inner).as_slice(), &[PatternType::Call]);
    }

    #[test]
    fn scan_many_merges_in_input_order() {
        let registry = PatternRegistry::with_builtin_packs(None);
        let trees = vec![
            ("a.ts".to_string(), parse_typescript("server.tool('a', {});").unwrap()),
            ("b.ts".to_string(), parse_typescript("server.tool('b', {});").unwrap()),
        ];
        let outcome = registry.scan_many(&trees, &ScanOptions::default());
        let files: Vec<&str> = outcome.matches.iter().map(|m| m.location.file.as_str()).collect();
        assert_eq!(files, vec!["a.ts", "b.ts"]);
        assert_eq!(outcome.diagnostics.files_scanned, 2);
    }
}
