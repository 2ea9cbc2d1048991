//! Phase 10: heuristic file/directory/project summaries (`spec.md` §4.8).
//!
//! The spec leaves the summarization heuristic unspecified beyond "scope,
//! content, token count" (see `DESIGN.md`'s Open Question decision); this
//! module builds summaries from what's already persisted — exported
//! top-level symbol names and docstrings — rather than calling out to the
//! embedding model or an LLM, keeping phase 10 a pure function of the
//! metadata store.

use rk_chunking::estimate_tokens;
use rk_metadata_store::{MetadataStore, SymbolRecord};
use std::collections::BTreeMap;

fn file_summary_text(path: &str, symbols: &[SymbolRecord]) -> String {
    let exported: Vec<&SymbolRecord> = symbols.iter().filter(|s| s.exported).collect();
    if exported.is_empty() {
        return format!("{path}: no exported symbols.");
    }
    let names: Vec<String> = exported
        .iter()
        .take(12)
        .map(|s| format!("{} ({})", s.name, s.kind))
        .collect();
    let docs: Vec<&str> = exported
        .iter()
        .filter_map(|s| s.docstring.as_deref())
        .take(3)
        .collect();
    let mut text = format!("{path} exports: {}.", names.join(", "));
    if !docs.is_empty() {
        text.push_str(&format!(" Notes: {}", docs.join(" ")));
    }
    text
}

fn dir_of(path: &str) -> String {
    match path.rfind('/') {
        Some(pos) => path[..pos].to_string(),
        None => String::new(),
    }
}

/// Regenerate and upsert file/directory/project summaries for every file
/// currently in the store.
pub async fn build_summaries(store: &MetadataStore) -> rk_metadata_store::Result<()> {
    let files = store.all_file_paths().await?;
    let mut dir_fragments: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for (file_id, path, _size) in &files {
        let symbols = store.symbols_for_file(*file_id).await?;
        let text = file_summary_text(path, &symbols);
        store
            .upsert_summary(
                "file".to_string(),
                path.clone(),
                text.clone(),
                estimate_tokens(&text) as i64,
            )
            .await?;
        dir_fragments.entry(dir_of(path)).or_default().push(text);
    }

    for (dir, fragments) in &dir_fragments {
        let scope_id = if dir.is_empty() { ".".to_string() } else { dir.clone() };
        let text = format!(
            "{scope_id} contains {} file(s). {}",
            fragments.len(),
            fragments.join(" ")
        );
        store
            .upsert_summary("directory".to_string(), scope_id, text.clone(), estimate_tokens(&text) as i64)
            .await?;
    }

    let project_text = format!(
        "Project spans {} file(s) across {} directory/directories.",
        files.len(),
        dir_fragments.len()
    );
    store
        .upsert_summary(
            "project".to_string(),
            "root".to_string(),
            project_text.clone(),
            estimate_tokens(&project_text) as i64,
        )
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rk_symbols::SymbolKind;

    fn symbol(name: &str, exported: bool) -> SymbolRecord {
        SymbolRecord {
            id: 1,
            file_id: 1,
            name: name.to_string(),
            kind: SymbolKind::Function.as_str().to_string(),
            signature: None,
            start_line: 1,
            end_line: 2,
            start_col: 0,
            end_col: 0,
            parent_id: None,
            docstring: None,
            exported,
            importance: 0.0,
        }
    }

    #[test]
    fn file_summary_lists_exported_symbols_only() {
        let symbols = vec![symbol("pub_fn", true), symbol("helper", false)];
        let text = file_summary_text("a.rs", &symbols);
        assert!(text.contains("pub_fn"));
        assert!(!text.contains("helper"));
    }

    #[test]
    fn file_with_no_exports_gets_placeholder_text() {
        let text = file_summary_text("a.rs", &[]);
        assert!(text.contains("no exported symbols"));
    }

    #[test]
    fn dir_of_handles_root_files() {
        assert_eq!(dir_of("a.rs"), "");
        assert_eq!(dir_of("src/a.rs"), "src");
    }
}
