//! Pattern registry and matcher dispatch.
//!
//! Matchers are compiled from TOML pattern packs (built-in or custom) or written by
//! hand against [`PatternMatcher`]. A scan walks a [`SyntaxTree`](crate::syntax::SyntaxTree)
//! once and hands each node to the matchers whose supported types it satisfies.

pub mod diagnostics;
pub mod loader;
pub mod matcher;
pub mod registry;
pub mod scan;
pub mod spec;
pub mod types;

pub use diagnostics::{RegistryDiagnostics, ScanDiagnostics};
pub use loader::CompiledPack;
pub use matcher::{DefinitionMatcher, PatternMatcher};
pub use registry::{OverwriteEvent, OverwriteHook, PatternRegistry};
pub use scan::{node_pattern_types, scan_for_patterns, ScanOptions, ScanOutcome};
pub use types::{
    CaptureSource, CaptureValue, MatchCaptures, MatchContext, MatchResult, NamePattern,
    PatternDef, PatternRole, PatternType, Validator,
};
