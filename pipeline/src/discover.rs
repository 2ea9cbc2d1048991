//! Phase 1: filesystem discovery (`spec.md` §4.8 phase 1).
//!
//! Grounded on `ccmemory::service::code::index::scan_directory`'s
//! `ignore::WalkBuilder` usage (gitignore-aware walking, a `max_filesize`
//! cap) and `codegraph_prep::core::fs_scan::scan_repo`'s directory-level
//! coarse filtering; extended with the config's own glob ignore list via
//! `globset`, since the teacher's walker only knows about `.gitignore`.

use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use rk_diffing::DiscoveredFile;
use rk_parsing::Language;
use std::path::Path;

/// Files larger than this are excluded regardless of extension (`spec.md`
/// §4.8 phase 1's "1 MiB per-file cap").
pub const MAX_FILE_BYTES: u64 = 1024 * 1024;

fn build_ignore_globset(patterns: &[String]) -> Option<GlobSet> {
    if patterns.is_empty() {
        return None;
    }
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        if let Ok(glob) = Glob::new(pattern) {
            builder.add(glob);
        } else {
            tracing::warn!(pattern = %pattern, "discover: invalid ignore glob, skipping");
        }
    }
    builder.build().ok()
}

/// Walk `root`, honoring `.gitignore`/global gitignore/`.git/info/exclude`,
/// the project's own `ignore_patterns`, a 1 MiB size cap, and excluding
/// zero-size files. Results are sorted by relative path for determinism.
pub fn discover_files(root: &Path, ignore_patterns: &[String]) -> Vec<DiscoveredFile> {
    let ignore_globs = build_ignore_globset(ignore_patterns);
    let mut out = Vec::new();

    let walker = WalkBuilder::new(root)
        .hidden(false)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true)
        .max_filesize(Some(MAX_FILE_BYTES))
        .build();

    for entry in walker.flatten() {
        let path = entry.path();
        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }

        let rel_path = match path.strip_prefix(root) {
            Ok(rel) => rel.to_string_lossy().replace('\\', "/"),
            Err(_) => continue,
        };

        if let Some(globs) = &ignore_globs {
            if globs.is_match(&rel_path) {
                continue;
            }
        }

        let size = match std::fs::metadata(path) {
            Ok(meta) => meta.len(),
            Err(_) => continue,
        };
        if size == 0 || size > MAX_FILE_BYTES {
            continue;
        }

        out.push(DiscoveredFile {
            rel_path,
            abs_path: path.to_path_buf(),
            size,
        });
    }

    out.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));
    out
}

/// Narrow a discovery to files whose extension maps to a known language
/// (code or otherwise) — non-matching extensions are invisible to the
/// pipeline entirely, per `spec.md` §4.1's fixed extension table.
pub fn known_language_files(files: Vec<DiscoveredFile>) -> Vec<DiscoveredFile> {
    files
        .into_iter()
        .filter(|f| Language::from_path(Path::new(&f.rel_path)).is_some())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn discovers_files_sorted_and_respects_size_cap() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.rs"), b"fn b() {}").unwrap();
        fs::write(dir.path().join("a.rs"), b"fn a() {}").unwrap();
        fs::write(dir.path().join("empty.rs"), b"").unwrap();
        fs::write(dir.path().join("huge.rs"), vec![b'x'; (MAX_FILE_BYTES + 1) as usize]).unwrap();

        let files = discover_files(dir.path(), &[]);
        let paths: Vec<&str> = files.iter().map(|f| f.rel_path.as_str()).collect();
        assert_eq!(paths, vec!["a.rs", "b.rs"]);
    }

    #[test]
    fn honors_config_ignore_globs() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("vendor")).unwrap();
        fs::write(dir.path().join("vendor/v.rs"), b"fn v() {}").unwrap();
        fs::write(dir.path().join("a.rs"), b"fn a() {}").unwrap();

        let files = discover_files(dir.path(), &["**/vendor/**".to_string()]);
        let paths: Vec<&str> = files.iter().map(|f| f.rel_path.as_str()).collect();
        assert_eq!(paths, vec!["a.rs"]);
    }

    #[test]
    fn known_language_files_drops_unrecognized_extensions() {
        let files = vec![
            DiscoveredFile {
                rel_path: "a.rs".to_string(),
                abs_path: "a.rs".into(),
                size: 1,
            },
            DiscoveredFile {
                rel_path: "a.bin".to_string(),
                abs_path: "a.bin".into(),
                size: 1,
            },
        ];
        let kept = known_language_files(files);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].rel_path, "a.rs");
    }
}
