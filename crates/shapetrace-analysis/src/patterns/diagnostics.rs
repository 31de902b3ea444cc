//! Registry and scan diagnostics.

use std::time::Duration;

use rustc_hash::FxHashMap;

/// Load-time metrics for a [`PatternRegistry`](super::PatternRegistry).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegistryDiagnostics {
    pub builtin_packs_loaded: usize,
    pub builtin_packs_skipped: usize,
    pub custom_packs_loaded: usize,
    pub custom_packs_skipped: usize,
    pub patterns_compiled: usize,
    pub patterns_skipped: usize,
    pub matchers_registered: usize,
    /// Registrations that replaced an existing matcher of the same name.
    pub overwrites: usize,
    pub pack_versions: FxHashMap<String, String>,
}

impl RegistryDiagnostics {
    pub fn merge(&mut self, other: &RegistryDiagnostics) {
        self.builtin_packs_loaded += other.builtin_packs_loaded;
        self.builtin_packs_skipped += other.builtin_packs_skipped;
        self.custom_packs_loaded += other.custom_packs_loaded;
        self.custom_packs_skipped += other.custom_packs_skipped;
        self.patterns_compiled += other.patterns_compiled;
        self.patterns_skipped += other.patterns_skipped;
        self.matchers_registered += other.matchers_registered;
        self.overwrites += other.overwrites;
        for (k, v) in &other.pack_versions {
            self.pack_versions.entry(k.clone()).or_insert_with(|| v.clone());
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "pattern registry: {} packs ({} builtin, {} custom, {} skipped), {} patterns, \
             {} matchers, {} overwrites",
            self.builtin_packs_loaded + self.custom_packs_loaded,
            self.builtin_packs_loaded,
            self.custom_packs_loaded,
            self.builtin_packs_skipped + self.custom_packs_skipped,
            self.patterns_compiled,
            self.matchers_registered,
            self.overwrites,
        )
    }
}

/// Per-scan metrics. Additive across files.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanDiagnostics {
    pub files_scanned: usize,
    pub nodes_visited: usize,
    pub matches: usize,
    pub hits_per_matcher: FxHashMap<String, usize>,
    /// Set when the depth bound or match limit cut a scan short.
    pub truncated: bool,
    pub scan_duration: Duration,
}

impl ScanDiagnostics {
    pub fn merge(&mut self, other: &ScanDiagnostics) {
        self.files_scanned += other.files_scanned;
        self.nodes_visited += other.nodes_visited;
        self.matches += other.matches;
        for (k, v) in &other.hits_per_matcher {
            *self.hits_per_matcher.entry(k.clone()).or_insert(0) += v;
        }
        self.truncated |= other.truncated;
        self.scan_duration += other.scan_duration;
    }

    pub fn summary(&self) -> String {
        format!(
            "pattern scan: {} files, {} nodes, {} matches{}",
            self.files_scanned,
            self.nodes_visited,
            self.matches,
            if self.truncated { " (truncated)" } else { "" },
        )
    }
}
