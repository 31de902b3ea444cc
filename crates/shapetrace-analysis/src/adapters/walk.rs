//! Source file discovery for adapter listing.
//!
//! Honors `.gitignore`, `.shapetraceignore`, and a fixed set of vendor/build
//! directories. Output is sorted for deterministic listings.

use std::path::{Path, PathBuf};

use shapetrace_core::config::ScanConfig;

/// Directories never walked.
pub const DEFAULT_IGNORES: &[&str] = &[
    "node_modules",
    ".git",
    "dist",
    "build",
    "target",
    ".next",
    "coverage",
    "vendor",
    ".venv",
    "__pycache__",
];

/// Files under `root` whose extension is one of `extensions`. A file `root` is
/// returned as-is when its extension matches. Walk errors are skipped.
pub fn source_files(root: &Path, extensions: &[&str], config: &ScanConfig) -> Vec<PathBuf> {
    let mut builder = ignore::WalkBuilder::new(root);
    builder
        .hidden(false)
        .git_ignore(true)
        .git_exclude(true)
        .add_custom_ignore_filename(".shapetraceignore")
        .max_filesize(Some(config.effective_max_file_size()))
        .follow_links(config.follow_symlinks.unwrap_or(false));

    let mut overrides = ignore::overrides::OverrideBuilder::new(root);
    for pattern in DEFAULT_IGNORES {
        let _ = overrides.add(&format!("!{pattern}/**"));
        let _ = overrides.add(&format!("!{pattern}"));
    }
    if let Ok(built) = overrides.build() {
        builder.overrides(built);
    }

    let mut files: Vec<PathBuf> = builder
        .build()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::debug!(error = %e, "skipping unreadable entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
        .map(ignore::DirEntry::into_path)
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| extensions.contains(&ext))
        })
        .collect();
    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_by_extension_and_skips_vendor_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("src")).unwrap();
        std::fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        std::fs::write(root.join("src/b.ts"), "").unwrap();
        std::fs::write(root.join("src/a.ts"), "").unwrap();
        std::fs::write(root.join("src/readme.md"), "").unwrap();
        std::fs::write(root.join("node_modules/pkg/index.ts"), "").unwrap();

        let files = source_files(root, &["ts"], &ScanConfig::default());
        let names: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(names, vec!["src/a.ts", "src/b.ts"]);
    }

    #[test]
    fn missing_root_is_empty() {
        let files = source_files(Path::new("/nonexistent/shapetrace"), &["ts"], &ScanConfig::default());
        assert!(files.is_empty());
    }
}
