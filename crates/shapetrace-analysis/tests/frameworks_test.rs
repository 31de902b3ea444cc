//! Built-in pattern packs against real-world source shapes, plus custom packs
//! loaded from disk.

use shapetrace_analysis::extraction::{extract_location, SchemaLocation};
use shapetrace_analysis::patterns::{MatchResult, PatternRegistry, PatternRole, ScanOptions};
use shapetrace_analysis::syntax::{parse_typescript, NodeKind, SyntaxTree};
use shapetrace_core::config::PackConfig;
use shapetrace_core::errors::{RegistryError, TraceErrorCode};

// ─── Helpers ───────────────────────────────────────────────────────────────

fn scan(source: &str, framework: &str) -> (SyntaxTree, Vec<MatchResult>) {
    let registry = PatternRegistry::with_builtin_packs(None);
    let tree = parse_typescript(source).unwrap();
    let root = tree.root().unwrap();
    let options = ScanOptions::for_file("src/app.ts").with_frameworks([framework]);
    let matches = registry.scan(&tree, root, &options).matches;
    (tree, matches)
}

// ─── Built-in packs ────────────────────────────────────────────────────────

#[test]
fn express_routes() {
    let (_, matches) = scan(
        r#"
const router = express.Router();
app.get("/users/:id", getUser);
router.post("/users", validate, createUser);
cache.get("key");
app.get(dynamicPath, handler);
"#,
        "express",
    );
    let routes: Vec<(&str, Option<&str>, Option<&str>)> = matches
        .iter()
        .map(|m| {
            (
                m.identifier.as_str(),
                m.captures.http_method.as_deref(),
                m.captures.route_path.as_deref(),
            )
        })
        .collect();
    assert_eq!(
        routes,
        vec![
            ("/users/:id", Some("GET"), Some("/users/:id")),
            ("/users", Some("POST"), Some("/users")),
        ]
    );
    assert!(matches.iter().all(|m| m.role() == PatternRole::Producer));
}

#[test]
fn trpc_procedures_take_the_router_key() {
    let (tree, matches) = scan(
        r#"
export const appRouter = t.router({
  getUser: t.procedure
    .input(z.object({ id: z.string() }))
    .output(z.object({ id: z.string(), email: z.string() }))
    .query(({ input }) => db.user(input.id)),
  ping: publicProcedure.query(() => "pong"),
});
"#,
        "trpc",
    );
    let found: Vec<(&str, &str, Option<&str>)> = matches
        .iter()
        .map(|m| {
            (
                m.identifier.as_str(),
                m.pattern.id.as_str(),
                m.captures.procedure_kind.as_deref(),
            )
        })
        .collect();
    assert_eq!(
        found,
        vec![
            ("getUser", "trpc/procedure-chain", Some("query")),
            ("ping", "trpc/procedure", Some("query")),
        ]
    );
    let input = matches[0].captures.input_schema.unwrap();
    assert_eq!(tree.kind(input), NodeKind::Call);
    assert!(matches[0].captures.output_schema.is_some());
    assert!(matches[1].captures.input_schema.is_none());
}

#[test]
fn next_route_handlers() {
    let (_, matches) = scan(
        r#"
export async function GET(request: Request): Promise<Response> {
  return Response.json({ ok: true });
}
export const POST = async (request: Request) => new Response(null);
export function helper() {}
"#,
        "next",
    );
    let methods: Vec<Option<&str>> = matches.iter().map(|m| m.captures.http_method.as_deref()).collect();
    assert_eq!(methods, vec![Some("GET"), Some("POST")]);
    assert!(matches[0].captures.output_schema.is_some());
}

#[test]
fn nest_message_patterns_use_the_decorator_argument() {
    let (_, matches) = scan(
        r#"
@Controller()
export class UsersHandler {
  @MessagePattern("users.get")
  handle(data: GetUserDto): UserDto {
    return this.users.get(data.id);
  }
}
"#,
        "nest",
    );
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].matcher, "nest-message");
    assert_eq!(matches[0].identifier, "users.get");
}

// ─── Registry behavior ─────────────────────────────────────────────────────

#[test]
fn disabled_packs_are_not_registered() {
    let config = PackConfig {
        disabled: vec!["express".to_string(), "nest".to_string()],
        ..PackConfig::default()
    };
    let registry = PatternRegistry::with_builtin_packs(Some(&config));
    let err = registry.get("express-route").err().unwrap();
    assert!(matches!(err, RegistryError::NotFound { .. }));
    assert_eq!(err.error_code(), "REGISTRY_NOT_FOUND");
    assert!(err.available().iter().any(|n| n == "mcp-server"));
    assert_eq!(registry.diagnostics().builtin_packs_skipped, 2);
}

#[test]
fn custom_pack_overrides_builtin_matcher() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("rpc.toml"),
        r#"
[framework]
name = "mcp"
version = "2.0.0"

[[matchers]]
name = "mcp-server"

[[matchers.patterns]]
id = "acme/define-tool"
type = "call"
signature = "defineTool"
identifier = { arg = 0 }
input = { arg = 1 }
"#,
    )
    .unwrap();
    std::fs::write(dir.path().join("broken.toml"), "not = [valid").unwrap();

    let registry = PatternRegistry::with_builtin_and_custom(dir.path(), None);
    assert_eq!(registry.diagnostics().custom_packs_loaded, 1);
    assert_eq!(registry.diagnostics().custom_packs_skipped, 1);
    assert_eq!(registry.diagnostics().overwrites, 1);

    let tree = parse_typescript("defineTool('lookup', { q: z.string() });").unwrap();
    let root = tree.root().unwrap();
    let matches = registry.scan(&tree, root, &ScanOptions::for_file("a.ts")).matches;
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].identifier, "lookup");
    assert_eq!(matches[0].pattern.id, "acme/define-tool");
}

// ─── Location extraction ───────────────────────────────────────────────────

#[test]
fn chain_method_falls_back_to_descendants() {
    let tree = parse_typescript("wrap(t.procedure.input(Schema)).query(h);").unwrap();
    let root = tree.root().unwrap();
    let outer = tree
        .descendants(root)
        .find(|&id| {
            tree.kind(id) == NodeKind::Call
                && shapetrace_analysis::syntax::query::callee_name(&tree, id) == Some("query")
        })
        .unwrap();
    let found = extract_location(&tree, outer, &SchemaLocation::ChainMethod("input".into())).unwrap();
    assert_eq!(tree.text(found), "Schema");
    assert!(extract_location(&tree, outer, &SchemaLocation::ChainMethod("output".into())).is_none());
}
