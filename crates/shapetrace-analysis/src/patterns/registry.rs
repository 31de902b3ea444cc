//! Matcher registry: built-in packs, custom packs, and hand-written matchers.
//!
//! Built-in packs are embedded at compile time via `include_str!`.
//! Custom packs are loaded from `.shapetrace/patterns/` at runtime.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use shapetrace_core::config::PackConfig;
use shapetrace_core::errors::{PackError, RegistryError};

use super::diagnostics::RegistryDiagnostics;
use super::loader::{self, CompiledPack};
use super::matcher::PatternMatcher;

const REGISTRY: &str = "matcher";

/// Reported when a registration replaces an existing matcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverwriteEvent {
    pub name: String,
    pub previous_framework: String,
    pub framework: String,
}

pub type OverwriteHook = Box<dyn Fn(&OverwriteEvent) + Send + Sync>;

/// Ordered set of matchers keyed by name.
///
/// Registration takes `&mut self` and scanning `&self`, so every matcher is in place
/// before any concurrent scan starts.
#[derive(Default)]
pub struct PatternRegistry {
    matchers: Vec<Arc<dyn PatternMatcher>>,
    index: FxHashMap<String, usize>,
    on_overwrite: Option<OverwriteHook>,
    diag: RegistryDiagnostics,
}

impl PatternRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in packs, filtered by `config`.
    pub fn with_builtin_packs(config: Option<&PackConfig>) -> Self {
        let mut registry = Self::new();
        for (name, toml_str) in builtin_packs() {
            if config.is_some_and(|cfg| cfg.is_disabled(name)) {
                registry.diag.builtin_packs_skipped += 1;
                continue;
            }
            match loader::load_from_str(toml_str) {
                Ok(pack) => {
                    registry.diag.builtin_packs_loaded += 1;
                    registry.add_pack(pack);
                }
                Err(e) => {
                    tracing::warn!(pack = name, error = %e, "failed to load built-in pack");
                    registry.diag.builtin_packs_skipped += 1;
                }
            }
        }
        registry
    }

    /// Built-in packs plus every `*.toml` pack in `custom_dir`.
    pub fn with_builtin_and_custom(custom_dir: &Path, config: Option<&PackConfig>) -> Self {
        let mut registry = Self::with_builtin_packs(config);
        registry.load_custom_packs(custom_dir);
        registry
    }

    /// Load every `*.toml` pack in `dir`, in file-name order. Unreadable or malformed
    /// packs are skipped. Returns the number of packs loaded.
    pub fn load_custom_packs(&mut self, dir: &Path) -> usize {
        let Ok(entries) = std::fs::read_dir(dir) else {
            return 0;
        };
        let mut paths: Vec<_> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "toml"))
            .collect();
        paths.sort();

        let mut loaded = 0;
        for path in paths {
            match loader::load_from_file(&path) {
                Ok(pack) => {
                    self.diag.custom_packs_loaded += 1;
                    self.add_pack(pack);
                    loaded += 1;
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "failed to load custom pack");
                    self.diag.custom_packs_skipped += 1;
                }
            }
        }
        loaded
    }

    /// Compile a pack from TOML and register its matchers.
    pub fn load_pack_str(&mut self, toml_str: &str) -> Result<usize, PackError> {
        let pack = loader::load_from_str(toml_str)?;
        let count = pack.matchers.len();
        self.add_pack(pack);
        Ok(count)
    }

    fn add_pack(&mut self, pack: CompiledPack) {
        self.diag.patterns_compiled += pack.patterns_compiled;
        self.diag.patterns_skipped += pack.patterns_skipped;
        if let Some(version) = &pack.version {
            self.diag
                .pack_versions
                .insert(pack.name.clone(), version.clone());
        }
        for matcher in pack.matchers {
            if let Err(e) = self.register(matcher) {
                // Pack matchers with no compiled patterns have no supported types.
                tracing::warn!(pack = %pack.name, error = %e, "skipping matcher");
            }
        }
    }

    pub fn set_overwrite_hook(&mut self, hook: OverwriteHook) {
        self.on_overwrite = Some(hook);
    }

    pub fn register<M: PatternMatcher + 'static>(&mut self, matcher: M) -> Result<(), RegistryError> {
        self.register_arc(Arc::new(matcher))
    }

    /// Validate and insert. A duplicate name replaces the old matcher in its slot.
    pub fn register_arc(&mut self, matcher: Arc<dyn PatternMatcher>) -> Result<(), RegistryError> {
        let mut missing = Vec::new();
        if matcher.name().is_empty() {
            missing.push("name");
        }
        if matcher.framework().is_empty() {
            missing.push("framework");
        }
        if matcher.supported_types().is_empty() {
            missing.push("supported_types");
        }
        if !missing.is_empty() {
            return Err(RegistryError::Validation {
                registry: REGISTRY,
                missing,
                entry: matcher.describe(),
            });
        }

        let name = matcher.name().to_string();
        match self.index.get(&name).copied() {
            Some(slot) => {
                let event = OverwriteEvent {
                    name: name.clone(),
                    previous_framework: self.matchers[slot].framework().to_string(),
                    framework: matcher.framework().to_string(),
                };
                tracing::warn!(
                    matcher = %event.name,
                    previous = %event.previous_framework,
                    framework = %event.framework,
                    "matcher overwritten"
                );
                self.diag.overwrites += 1;
                if let Some(hook) = &self.on_overwrite {
                    hook(&event);
                }
                self.matchers[slot] = matcher;
            }
            None => {
                self.index.insert(name, self.matchers.len());
                self.matchers.push(matcher);
                self.diag.matchers_registered += 1;
            }
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn PatternMatcher>, RegistryError> {
        self.index
            .get(name)
            .map(|&slot| Arc::clone(&self.matchers[slot]))
            .ok_or_else(|| RegistryError::NotFound {
                registry: REGISTRY,
                requested: name.to_string(),
                available: self.names(),
            })
    }

    /// Names in registration order.
    pub fn names(&self) -> Vec<String> {
        self.matchers.iter().map(|m| m.name().to_string()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn PatternMatcher> + '_ {
        self.matchers.iter().map(|m| m.as_ref())
    }

    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }

    pub fn diagnostics(&self) -> &RegistryDiagnostics {
        &self.diag
    }
}

impl fmt::Debug for PatternRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternRegistry")
            .field("matchers", &self.names())
            .field("on_overwrite", &self.on_overwrite.is_some())
            .field("diag", &self.diag)
            .finish()
    }
}

/// Built-in packs embedded at compile time.
fn builtin_packs() -> Vec<(&'static str, &'static str)> {
    vec![
        ("mcp", include_str!("packs/mcp.toml")),
        ("express", include_str!("packs/express.toml")),
        ("trpc", include_str!("packs/trpc.toml")),
        ("nest", include_str!("packs/nest.toml")),
        ("next", include_str!("packs/next.toml")),
    ]
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::patterns::matcher::DefinitionMatcher;
    use crate::patterns::types::{MatchContext, MatchResult, NamePattern, PatternDef, PatternType};
    use crate::syntax::{NodeId, SyntaxTree};

    fn matcher(name: &str, framework: &str) -> DefinitionMatcher {
        DefinitionMatcher::new(
            name,
            framework,
            vec![PatternDef::new("p", PatternType::Call, NamePattern::exact("tool"))],
        )
    }

    struct Empty;

    impl PatternMatcher for Empty {
        fn name(&self) -> &str {
            ""
        }
        fn framework(&self) -> &str {
            "custom"
        }
        fn supported_types(&self) -> &[PatternType] {
            &[]
        }
        fn match_node(&self, _: &SyntaxTree, _: NodeId, _: &MatchContext<'_>) -> Option<MatchResult> {
            None
        }
    }

    #[test]
    fn register_then_get() {
        let mut registry = PatternRegistry::new();
        registry.register(matcher("a", "mcp")).unwrap();
        assert_eq!(registry.get("a").unwrap().framework(), "mcp");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn get_unknown_lists_available() {
        let mut registry = PatternRegistry::new();
        let err = registry.get("x").err().unwrap();
        assert_eq!(err.to_string(), "matcher entry \"x\" not found; available: none");

        registry.register(matcher("a", "mcp")).unwrap();
        registry.register(matcher("b", "trpc")).unwrap();
        let err = registry.get("x").err().unwrap();
        assert_eq!(err.available().to_vec(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn validation_names_missing_fields() {
        let mut registry = PatternRegistry::new();
        let err = registry.register(Empty).unwrap_err();
        match err {
            RegistryError::Validation { missing, entry, .. } => {
                assert_eq!(missing, vec!["name", "supported_types"]);
                assert!(entry.contains("framework: \"custom\""));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn overwrite_keeps_slot_and_is_observable() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let mut registry = PatternRegistry::new();
        registry.set_overwrite_hook(Box::new(move |event: &OverwriteEvent| {
            assert_eq!(event.previous_framework, "mcp");
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        registry.register(matcher("a", "mcp")).unwrap();
        registry.register(matcher("b", "mcp")).unwrap();
        registry.register(matcher("a", "custom")).unwrap();

        assert_eq!(registry.names(), vec!["a", "b"]);
        assert_eq!(registry.get("a").unwrap().framework(), "custom");
        assert_eq!(registry.diagnostics().overwrites, 1);
        assert_eq!(registry.diagnostics().matchers_registered, 2);
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn builtin_packs_all_load() {
        let registry = PatternRegistry::with_builtin_packs(None);
        let diag = registry.diagnostics();
        assert_eq!(diag.builtin_packs_loaded, builtin_packs().len());
        assert_eq!(diag.builtin_packs_skipped, 0);
        assert_eq!(diag.patterns_skipped, 0);
        assert!(registry.get("mcp-server").is_ok());
        assert!(registry.get("mcp-client").is_ok());
        assert!(registry.get("trpc-procedure").is_ok());
    }

    #[test]
    fn pack_config_filters_builtins() {
        let config = PackConfig {
            enabled_only: Some(vec!["mcp".into()]),
            ..Default::default()
        };
        let registry = PatternRegistry::with_builtin_packs(Some(&config));
        assert!(registry.iter().all(|m| m.framework() == "mcp"));
        assert_eq!(
            registry.diagnostics().builtin_packs_skipped,
            builtin_packs().len() - 1
        );
    }

    #[test]
    fn custom_packs_load_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("acme.toml"),
            r#"
[framework]
name = "acme"
version = "1.0.0"

[[matchers]]
name = "acme-rpc"

[[matchers.patterns]]
id = "acme/rpc"
type = "call"
signature = "rpc"
"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("broken.toml"), "not [valid").unwrap();
        std::fs::write(dir.path().join("notes.md"), "ignored").unwrap();

        let registry = PatternRegistry::with_builtin_and_custom(
            dir.path(),
            Some(&PackConfig {
                enabled_only: Some(vec![]),
                ..Default::default()
            }),
        );
        let diag = registry.diagnostics();
        assert_eq!(diag.custom_packs_loaded, 1);
        assert_eq!(diag.custom_packs_skipped, 1);
        assert_eq!(diag.pack_versions.get("acme").map(String::as_str), Some("1.0.0"));
        assert_eq!(registry.names(), vec!["acme-rpc"]);
    }
}
