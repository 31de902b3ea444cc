//! Workspace-wide constants.

/// Environment variable consulted by [`crate::tracing::init_tracing`].
pub const LOG_ENV_VAR: &str = "SHAPETRACE_LOG";

/// Default log filter when [`LOG_ENV_VAR`] is unset.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Minimum similarity score (0.0-1.0) for a name to count as a typo of another.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.8;

/// Edit distance that always counts as a typo, regardless of name length.
/// `username` vs `userName` is one substitution.
pub const DEFAULT_MAX_EDIT_DISTANCE: usize = 1;

/// Default per-scan match limit (0 = unlimited).
pub const DEFAULT_MATCH_LIMIT: usize = 0;

/// Default traversal depth guard for pattern scans.
pub const DEFAULT_MAX_SCAN_DEPTH: usize = 512;

/// Deepest syntax nesting accepted when building a tree. Deeper files fail to parse
/// instead of being walked by recursive passes.
pub const MAX_SYNTAX_DEPTH: usize = 1024;

/// Marker reported by registries when nothing is registered.
pub const NONE_REGISTERED: &str = "none";

/// Directory scanned for user pattern packs, relative to the project root.
pub const CUSTOM_PACK_DIR: &str = ".shapetrace/patterns";
