//! Local-path import resolution (`spec.md` §4.5 step 2a).
//!
//! Grounded on `codegraph_prep::graph::rs_linker`/`ts_linker`'s file-scoped
//! edge construction, generalized to the spec's documented extension/index
//! fallback order rather than the teacher's same-file-only `Declares`
//! heuristic.

use std::collections::HashSet;

/// Join `base_dir` and `rel` and normalize `.`/`..` components and
/// backslashes, producing a repo-relative path with forward slashes.
fn normalize_join(base_dir: &str, rel: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    if !rel.starts_with('/') {
        parts.extend(base_dir.split('/').filter(|s| !s.is_empty()));
    }
    parts.extend(rel.split('/').filter(|s| !s.is_empty()));

    let mut stack: Vec<&str> = Vec::new();
    for part in parts {
        match part {
            "." => {}
            ".." => {
                stack.pop();
            }
            other => stack.push(other),
        }
    }
    stack.join("/")
}

/// Attempt to resolve `import_source` (the raw specifier written in the
/// importing file) to a path present in `known_paths`, from the
/// perspective of a file living in `file_dir` (the importing file's
/// directory, repo-relative, `""` for the root).
///
/// Only specifiers starting with `.` or `/` are attempted; everything else
/// (bare package specifiers) is left unresolved, per `spec.md` §9's "the
/// import resolver does not consult any package resolution configuration".
pub fn resolve_local_import(
    import_source: &str,
    file_dir: &str,
    known_paths: &HashSet<String>,
) -> Option<String> {
    if !(import_source.starts_with('.') || import_source.starts_with('/')) {
        return None;
    }

    let raw = normalize_join(file_dir, import_source);

    let mut candidates: Vec<String> = vec![raw.clone()];
    for ext in ["ts", "tsx", "js", "jsx"] {
        candidates.push(format!("{raw}.{ext}"));
    }
    for ext in ["ts", "tsx", "js", "jsx"] {
        candidates.push(format!("{raw}/index.{ext}"));
    }
    for ext in ["py", "rs", "go"] {
        candidates.push(format!("{raw}.{ext}"));
    }
    if raw.ends_with(".js") || raw.ends_with(".jsx") {
        let stem = raw.rsplit_once('.').map(|(s, _)| s).unwrap_or(&raw);
        for ext in ["ts", "tsx"] {
            candidates.push(format!("{stem}.{ext}"));
        }
        for ext in ["ts", "tsx"] {
            candidates.push(format!("{stem}/index.{ext}"));
        }
    }

    candidates.into_iter().find(|c| known_paths.contains(c))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(paths: &[&str]) -> HashSet<String> {
        paths.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn resolves_raw_path_first() {
        let known = set(&["src/b.ts"]);
        assert_eq!(
            resolve_local_import("./b.ts", "src", &known),
            Some("src/b.ts".to_string())
        );
    }

    #[test]
    fn resolves_extensionless_specifier_by_appending_extension() {
        let known = set(&["src/b.ts"]);
        assert_eq!(
            resolve_local_import("./b", "src", &known),
            Some("src/b.ts".to_string())
        );
    }

    #[test]
    fn resolves_directory_index() {
        let known = set(&["src/util/index.ts"]);
        assert_eq!(
            resolve_local_import("./util", "src", &known),
            Some("src/util/index.ts".to_string())
        );
    }

    #[test]
    fn js_specifier_falls_back_to_ts_sibling() {
        let known = set(&["src/b.ts"]);
        assert_eq!(
            resolve_local_import("./b.js", "src", &known),
            Some("src/b.ts".to_string())
        );
    }

    #[test]
    fn bare_package_specifiers_never_resolve() {
        let known = set(&["node_modules/lodash/index.ts"]);
        assert_eq!(resolve_local_import("lodash", "src", &known), None);
    }

    #[test]
    fn normalizes_parent_directory_components() {
        let known = set(&["src/a.ts"]);
        assert_eq!(
            resolve_local_import("../a.ts", "src/nested", &known),
            Some("src/a.ts".to_string())
        );
    }

    #[test]
    fn unresolvable_local_path_returns_none() {
        let known = set(&["src/other.ts"]);
        assert_eq!(resolve_local_import("./missing", "src", &known), None);
    }
}
