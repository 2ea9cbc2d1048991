//! The structured metadata store: files, symbols, chunks, graph edges, file
//! dependencies, summaries, and index state, plus `chunks_fts`/`symbols_fts`
//! full-text search, in a WAL-mode SQLite database.
//!
//! The async wrapper is grounded on
//! `mylinyuzhi_codex::retrieval::storage::sqlite::SqliteStore`; the teacher
//! repo has no SQL store of its own to build on.

mod chunks;
mod error;
mod files;
mod fts;
mod graph;
mod retrieval;
mod schema;
mod state;
mod store;
mod symbols;

pub use error::{MetadataStoreError, Result};
pub use models::*;
pub use store::MetadataStore;

pub mod models;

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn open_store() -> (MetadataStore, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let store = MetadataStore::open(&dir.path().join("metadata.db")).unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn upserts_and_reads_back_a_file() {
        let (store, _dir) = open_store().await;
        let id = store
            .upsert_file(NewFile {
                path: "a.ts".into(),
                language: Some("typescript".into()),
                size: 10,
                content_hash: "deadbeef".into(),
                last_indexed: 1,
                line_count: 1,
                purpose: None,
            })
            .await
            .unwrap();
        let record = store.get_file_by_path("a.ts".into()).await.unwrap().unwrap();
        assert_eq!(record.id, id);
        assert_eq!(record.content_hash, "deadbeef");
    }

    #[tokio::test]
    async fn symbol_parent_resolves_to_top_level_only() {
        let (store, _dir) = open_store().await;
        let file_id = store
            .upsert_file(NewFile {
                path: "a.rs".into(),
                language: Some("rust".into()),
                size: 1,
                content_hash: "h".into(),
                last_indexed: 1,
                line_count: 1,
                purpose: None,
            })
            .await
            .unwrap();

        let symbols = vec![
            NewSymbol {
                name: "Foo".into(),
                kind: "class".into(),
                signature: None,
                start_line: 1,
                end_line: 5,
                start_col: 0,
                end_col: 0,
                parent_name: None,
                docstring: None,
                exported: true,
            },
            NewSymbol {
                name: "bar".into(),
                kind: "method".into(),
                signature: None,
                start_line: 2,
                end_line: 3,
                start_col: 0,
                end_col: 0,
                parent_name: Some("Foo".into()),
                docstring: None,
                exported: false,
            },
        ];
        let ids = store.insert_symbols_for_file(file_id, symbols).await.unwrap();
        let bar = store.symbol_by_id(ids[1]).await.unwrap().unwrap();
        assert_eq!(bar.parent_id, Some(ids[0]));
    }

    #[tokio::test]
    async fn fts_rebuild_makes_chunks_searchable() {
        let (store, _dir) = open_store().await;
        let file_id = store
            .upsert_file(NewFile {
                path: "a.ts".into(),
                language: Some("typescript".into()),
                size: 40,
                content_hash: "h".into(),
                last_indexed: 1,
                line_count: 1,
                purpose: None,
            })
            .await
            .unwrap();
        store
            .insert_chunks_for_file(
                file_id,
                vec![NewChunk {
                    chunk_index: 0,
                    content: "export function foo() { return 1; }".into(),
                    content_hash: "h2".into(),
                    start_line: 1,
                    end_line: 1,
                    symbol_names: vec!["foo".into()],
                    token_count: 10,
                }],
            )
            .await
            .unwrap();
        store.rebuild_fts().await.unwrap();
        let hits = store.search_chunks_fts("foo".into(), 10).await.unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn symbol_dependencies_follows_edges_to_depth() {
        // `spec.md` §8 scenario 3: `caller` imports and calls `foo` in
        // another file; `get_dependencies` at depth=1 must surface `foo`.
        let (store, _dir) = open_store().await;
        let a = store
            .upsert_file(NewFile {
                path: "a.ts".into(),
                language: Some("typescript".into()),
                size: 1,
                content_hash: "h1".into(),
                last_indexed: 1,
                line_count: 1,
                purpose: None,
            })
            .await
            .unwrap();
        let b = store
            .upsert_file(NewFile {
                path: "b.ts".into(),
                language: Some("typescript".into()),
                size: 1,
                content_hash: "h2".into(),
                last_indexed: 1,
                line_count: 1,
                purpose: None,
            })
            .await
            .unwrap();
        let caller_id = store
            .insert_symbols_for_file(
                a,
                vec![NewSymbol {
                    name: "caller".into(),
                    kind: "function".into(),
                    signature: None,
                    start_line: 1,
                    end_line: 1,
                    start_col: 0,
                    end_col: 0,
                    parent_name: None,
                    docstring: None,
                    exported: true,
                }],
            )
            .await
            .unwrap()[0];
        let foo_id = store
            .insert_symbols_for_file(
                b,
                vec![NewSymbol {
                    name: "foo".into(),
                    kind: "function".into(),
                    signature: None,
                    start_line: 1,
                    end_line: 1,
                    start_col: 0,
                    end_col: 0,
                    parent_name: None,
                    docstring: None,
                    exported: true,
                }],
            )
            .await
            .unwrap()[0];
        store
            .insert_graph_edges(vec![
                NewGraphEdge {
                    source_symbol_id: caller_id,
                    target_symbol_id: foo_id,
                    edge_type: EdgeType::Imports,
                    weight: 0.5,
                    source_file_id: a,
                    target_file_id: b,
                },
                NewGraphEdge {
                    source_symbol_id: caller_id,
                    target_symbol_id: foo_id,
                    edge_type: EdgeType::Calls,
                    weight: 1.0,
                    source_file_id: a,
                    target_file_id: b,
                },
            ])
            .await
            .unwrap();

        let deps = store.symbol_dependencies(caller_id, 1).await.unwrap();
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].symbol.name, "foo");
        assert_eq!(deps[0].file_path, "b.ts");
    }

    #[tokio::test]
    async fn clear_all_empties_every_table() {
        let (store, _dir) = open_store().await;
        store
            .upsert_file(NewFile {
                path: "a.ts".into(),
                language: None,
                size: 1,
                content_hash: "h".into(),
                last_indexed: 1,
                line_count: 1,
                purpose: None,
            })
            .await
            .unwrap();
        store.clear_all().await.unwrap();
        assert!(store.get_file_by_path("a.ts".into()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn state_set_and_get_round_trip() {
        let (store, _dir) = open_store().await;
        assert_eq!(store.get("last_indexed".into()).await.unwrap(), None);
        store.set("last_indexed".into(), "1".into()).await.unwrap();
        store.set("last_indexed".into(), "2".into()).await.unwrap();
        assert_eq!(store.get("last_indexed".into()).await.unwrap(), Some("2".into()));
    }

    #[tokio::test]
    async fn state_set_many_upserts_every_entry_in_one_transaction() {
        let (store, _dir) = open_store().await;
        store
            .set_many(vec![
                StateEntry { key: "total_files".into(), value: "3".into() },
                StateEntry { key: "total_chunks".into(), value: "9".into() },
            ])
            .await
            .unwrap();
        assert_eq!(store.get("total_files".into()).await.unwrap(), Some("3".into()));
        assert_eq!(store.get("total_chunks".into()).await.unwrap(), Some("9".into()));
    }
}
