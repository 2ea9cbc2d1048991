//! Content-addressed hashing and the discovered-vs-persisted file diff.
//!
//! Mirrors `codegraph-prep::core::ids`'s "hash content for identity" idiom,
//! swapped from FNV-1a to SHA-256 for the stronger collision resistance the
//! persisted file identity needs.

use sha2::{Digest, Sha256};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};
use tracing::debug;

/// `hashContent(bytes) = SHA-256 hex`.
pub fn hash_content(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// A file discovered on disk during the current pipeline run.
#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    /// Normalized, repo-relative path — the stable identity key.
    pub rel_path: String,
    /// Absolute path used to read bytes when the fast path can't decide.
    pub abs_path: PathBuf,
    pub size: u64,
}

/// Content read while computing the diff, cached so the pipeline's parse
/// phase does not re-read the file from disk.
#[derive(Debug, Clone)]
pub struct CachedContent {
    pub content: String,
    pub hash: String,
}

#[derive(Debug, Clone, Default)]
pub struct Diff {
    pub added: Vec<String>,
    pub modified: Vec<String>,
    pub unchanged: Vec<String>,
    pub removed: Vec<String>,
    pub content_cache: HashMap<String, CachedContent>,
}

/// Partition `discovered` into added/modified/unchanged against the
/// previously persisted `existing_hashes`/`existing_sizes` (keyed by the same
/// relative path), and compute `removed` as the persisted paths absent from
/// `discovered`.
///
/// Fast path: if the persisted size differs from the discovered size, the
/// file is classified `modified` without reading its bytes. Otherwise the
/// file is read, hashed, cached, and classified by hash equality.
pub fn compute_diff(
    discovered: &[DiscoveredFile],
    existing_hashes: &HashMap<String, String>,
    existing_sizes: &HashMap<String, u64>,
) -> std::io::Result<Diff> {
    let mut diff = Diff::default();
    let mut discovered_paths: std::collections::HashSet<&str> =
        std::collections::HashSet::with_capacity(discovered.len());

    for file in discovered {
        discovered_paths.insert(file.rel_path.as_str());

        let Some(existing_hash) = existing_hashes.get(&file.rel_path) else {
            diff.added.push(file.rel_path.clone());
            continue;
        };

        if let Some(existing_size) = existing_sizes.get(&file.rel_path) {
            if *existing_size != file.size {
                diff.modified.push(file.rel_path.clone());
                continue;
            }
        }

        let bytes = fs::read(&file.abs_path)?;
        let content = String::from_utf8_lossy(&bytes).into_owned();
        let hash = hash_content(&bytes);
        let is_unchanged = hash == *existing_hash;
        diff.content_cache.insert(
            file.rel_path.clone(),
            CachedContent {
                content,
                hash: hash.clone(),
            },
        );

        if is_unchanged {
            diff.unchanged.push(file.rel_path.clone());
        } else {
            diff.modified.push(file.rel_path.clone());
        }
        debug!(path = %file.rel_path, unchanged = is_unchanged, "diff: hashed");
    }

    for existing_path in existing_hashes.keys() {
        if !discovered_paths.contains(existing_path.as_str()) {
            diff.removed.push(existing_path.clone());
        }
    }

    Ok(diff)
}

/// Always treat every discovered file as added — used for `--full` reindexing.
pub fn full_diff(discovered: &[DiscoveredFile]) -> Diff {
    Diff {
        added: discovered.iter().map(|f| f.rel_path.clone()).collect(),
        ..Default::default()
    }
}

pub fn read_and_cache(path: &Path) -> std::io::Result<CachedContent> {
    let bytes = fs::read(path)?;
    let hash = hash_content(&bytes);
    let content = String::from_utf8_lossy(&bytes).into_owned();
    Ok(CachedContent { content, hash })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        let a = hash_content(b"hello world");
        let b = hash_content(b"hello world");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn diff_classifies_added_modified_unchanged_removed() {
        let dir = tempfile::tempdir().unwrap();
        let a_path = dir.path().join("a.rs");
        let b_path = dir.path().join("b.rs");
        fs::write(&a_path, b"fn a() {}").unwrap();
        fs::write(&b_path, b"fn b() {}").unwrap();

        let a_hash = hash_content(b"fn a() {}");
        let old_b_hash = hash_content(b"fn b_old() {}");

        let mut existing_hashes = HashMap::new();
        existing_hashes.insert("a.rs".to_string(), a_hash.clone());
        existing_hashes.insert("b.rs".to_string(), old_b_hash);
        existing_hashes.insert("c.rs".to_string(), "deadbeef".to_string());

        let mut existing_sizes = HashMap::new();
        existing_sizes.insert("a.rs".to_string(), 9u64);
        existing_sizes.insert("b.rs".to_string(), 999u64); // forces fast-path modified

        let discovered = vec![
            DiscoveredFile {
                rel_path: "a.rs".to_string(),
                abs_path: a_path,
                size: 9,
            },
            DiscoveredFile {
                rel_path: "b.rs".to_string(),
                abs_path: b_path,
                size: 9,
            },
            DiscoveredFile {
                rel_path: "d.rs".to_string(),
                abs_path: dir.path().join("d.rs"),
                size: 0,
            },
        ];
        fs::write(dir.path().join("d.rs"), b"").unwrap();

        let diff = compute_diff(&discovered, &existing_hashes, &existing_sizes).unwrap();
        assert_eq!(diff.unchanged, vec!["a.rs".to_string()]);
        assert_eq!(diff.modified, vec!["b.rs".to_string()]);
        assert_eq!(diff.added, vec!["d.rs".to_string()]);
        assert_eq!(diff.removed, vec!["c.rs".to_string()]);
    }

    #[test]
    fn full_diff_treats_everything_as_added() {
        let discovered = vec![DiscoveredFile {
            rel_path: "a.rs".to_string(),
            abs_path: PathBuf::from("a.rs"),
            size: 1,
        }];
        let diff = full_diff(&discovered);
        assert_eq!(diff.added, vec!["a.rs".to_string()]);
        assert!(diff.modified.is_empty());
        assert!(diff.removed.is_empty());
    }
}
