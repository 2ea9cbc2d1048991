//! Hybrid retrieval (`spec.md` §4.7): vector, lexical, and symbol queries
//! fused by reciprocal-rank fusion, deduplicated by overlapping range, and
//! filtered by language/file glob.
//!
//! Grounded on `rag_store::retrieve`'s embed-then-search shape for the
//! vector path and `codex_rs_retrieval::search::hybrid::HybridSearcher` for
//! the concurrent multi-source-then-fuse structure, generalized from the
//! teacher's BM25-or-vector duopoly to this crate's three-way
//! vector/keyword/symbol fusion.

mod budget;
mod error;
mod file_filter;
mod fusion;
mod tokenize;
mod types;

pub use budget::{apply_token_budget, estimate_tokens};
pub use error::{Result, RetrieverError};
pub use fusion::{deduplicate_by_overlap, reciprocal_rank_fusion, RRF_K};
pub use types::{MatchType, SearchMode, SearchOptions, SearchResult};

use std::sync::Arc;

use rk_embeddings::{EmbeddingProvider, LazyEmbeddingProvider};
use rk_metadata_store::MetadataStore;
use rk_vector_store::VectorStore;

/// Hybrid-search weights (`spec.md` §4.7): vector 0.5, keyword 0.3, symbol
/// 0.2.
const VECTOR_WEIGHT: f64 = 0.5;
const KEYWORD_WEIGHT: f64 = 0.3;
const SYMBOL_WEIGHT: f64 = 0.2;

/// `max(3*limit, 30)`, giving fusion enough candidates per source to work
/// with before dedup/limit trims the final list.
fn fetch_limit(limit: usize) -> i64 {
    (3 * limit).max(30) as i64
}

pub struct Retriever<P: EmbeddingProvider> {
    store: MetadataStore,
    vectors: VectorStore,
    embeddings: Arc<LazyEmbeddingProvider<P>>,
}

impl<P: EmbeddingProvider> Retriever<P> {
    pub fn new(
        store: MetadataStore,
        vectors: VectorStore,
        embeddings: Arc<LazyEmbeddingProvider<P>>,
    ) -> Self {
        Self { store, vectors, embeddings }
    }

    pub async fn search(&self, query: &str, options: &SearchOptions) -> Result<Vec<SearchResult>> {
        let fetch = fetch_limit(options.limit);

        let fused = match options.mode {
            SearchMode::Vector => self.vector_search(query, fetch, options.language_filter.as_deref()).await?,
            SearchMode::Keyword => self.keyword_search(query, fetch).await?,
            SearchMode::Symbol => self.symbol_search(query, fetch).await?,
            SearchMode::Hybrid => {
                let (vector, keyword, symbol) = tokio::try_join!(
                    self.vector_search(query, fetch, options.language_filter.as_deref()),
                    self.keyword_search(query, fetch),
                    self.symbol_search(query, fetch),
                )?;
                reciprocal_rank_fusion(&[
                    (vector, VECTOR_WEIGHT),
                    (keyword, KEYWORD_WEIGHT),
                    (symbol, SYMBOL_WEIGHT),
                ])
            }
        };

        let filtered: Vec<SearchResult> = fused
            .into_iter()
            .filter(|r| file_filter::matches(&options.file_filter, &r.file_path))
            .collect();

        let deduped = deduplicate_by_overlap(filtered);
        Ok(deduped.into_iter().take(options.limit).collect())
    }

    /// `spec.md` §4.7 *Vector*: embed the query, apply the optional
    /// sanitized language predicate, score = `1/(1+distance)` (0 when
    /// distance is negative).
    async fn vector_search(
        &self,
        query: &str,
        fetch: i64,
        language_filter: Option<&str>,
    ) -> Result<Vec<SearchResult>> {
        self.embeddings.ensure_initialized().await?;
        let query_vector = self.embeddings.provider().embed_query(query).await?;

        let sanitized = language_filter.map(tokenize::sanitize_language);
        let hits = self
            .vectors
            .search(query_vector, fetch as u64, sanitized.as_deref())
            .await?;

        Ok(hits
            .into_iter()
            .map(|hit| SearchResult {
                file_path: hit.file_path,
                start_line: hit.start_line,
                end_line: hit.end_line,
                content: hit.content,
                score: if hit.distance >= 0.0 { 1.0 / (1.0 + hit.distance as f64) } else { 0.0 },
                match_type: MatchType::Vector,
                symbols: hit.symbol_names,
                language: hit.language,
            })
            .collect())
    }

    /// `spec.md` §4.7 *Keyword*: tokenize, query `chunks_fts`, score =
    /// `1/(1+|rank|)`. Syntax errors and empty queries both yield `[]`.
    async fn keyword_search(&self, query: &str, fetch: i64) -> Result<Vec<SearchResult>> {
        let Some(expr) = tokenize::tokenize_query(query) else {
            return Ok(Vec::new());
        };
        let hits = self.store.search_chunks_fts(expr, fetch).await?;
        if hits.is_empty() {
            return Ok(Vec::new());
        }

        let ids = hits.iter().map(|h| h.row_id).collect();
        let rows = self.store.chunks_with_file_for_ids(ids).await?;
        let mut by_id: std::collections::HashMap<i64, rk_metadata_store::ChunkWithFile> =
            rows.into_iter().map(|r| (r.chunk.id, r)).collect();

        // Preserve the FTS ranking order; the join above loses it.
        Ok(hits
            .into_iter()
            .filter_map(|hit| by_id.remove(&hit.row_id).map(|row| (hit.rank, row)))
            .map(|(rank, row)| SearchResult {
                file_path: row.file_path,
                start_line: row.chunk.start_line,
                end_line: row.chunk.end_line,
                content: row.chunk.content,
                score: 1.0 / (1.0 + rank.abs()),
                match_type: MatchType::Keyword,
                symbols: row.chunk.symbol_names,
                language: row.language,
            })
            .collect())
    }

    /// `spec.md` §8 scenario 3: `get_dependencies(identifier, depth)` walks
    /// the persisted graph from a starting symbol or file out to `depth`
    /// hops and returns each distinct node reached as a `MatchType::Graph`
    /// result. `identifier` is tried first as a symbol name (exact match,
    /// via `graph_edges`), then as a file path (via `file_dependencies`);
    /// an identifier matching neither yields an empty result.
    pub async fn get_dependencies(&self, identifier: &str, depth: usize) -> Result<Vec<SearchResult>> {
        if let Some(symbol) = self.store.find_symbol_by_name(identifier.to_string()).await? {
            let deps = self.store.symbol_dependencies(symbol.id, depth).await?;
            return Ok(deps
                .into_iter()
                .map(|row| SearchResult {
                    file_path: row.file_path,
                    start_line: row.symbol.start_line,
                    end_line: row.symbol.end_line,
                    content: row
                        .symbol
                        .signature
                        .clone()
                        .unwrap_or_else(|| row.symbol.name.clone()),
                    score: (row.symbol.importance + 0.1).min(1.0),
                    match_type: MatchType::Graph,
                    symbols: vec![row.symbol.name],
                    language: row.language,
                })
                .collect());
        }

        if let Some(file) = self.store.get_file_by_path(identifier.to_string()).await? {
            let deps = self.store.file_dependencies_transitive(file.id, depth).await?;
            return Ok(deps
                .into_iter()
                .map(|rec| SearchResult {
                    file_path: rec.path.clone(),
                    start_line: 1,
                    end_line: rec.line_count.max(1),
                    content: rec.purpose.unwrap_or(rec.path),
                    score: 1.0,
                    match_type: MatchType::Graph,
                    symbols: Vec::new(),
                    language: rec.language,
                })
                .collect());
        }

        Ok(Vec::new())
    }

    /// `spec.md` §4.7 *Symbol*: tokenize, query `symbols_fts`, score =
    /// `min(importance + 0.1, 1.0)`.
    async fn symbol_search(&self, query: &str, fetch: i64) -> Result<Vec<SearchResult>> {
        let Some(expr) = tokenize::tokenize_query(query) else {
            return Ok(Vec::new());
        };
        let hits = self.store.search_symbols_fts(expr, fetch).await?;
        if hits.is_empty() {
            return Ok(Vec::new());
        }

        let ids = hits.iter().map(|h| h.row_id).collect();
        let rows = self.store.symbols_with_file_for_ids(ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| SearchResult {
                file_path: row.file_path,
                start_line: row.symbol.start_line,
                end_line: row.symbol.end_line,
                content: row
                    .symbol
                    .signature
                    .clone()
                    .unwrap_or_else(|| row.symbol.name.clone()),
                score: (row.symbol.importance + 0.1).min(1.0),
                match_type: MatchType::Symbol,
                symbols: vec![row.symbol.name],
                language: row.language,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rk_embeddings::DeterministicEmbeddingProvider;
    use rk_metadata_store::{EdgeType, NewFile, NewGraphEdge, NewSymbol};

    #[test]
    fn fetch_limit_is_max_of_triple_and_thirty() {
        assert_eq!(fetch_limit(5), 30);
        assert_eq!(fetch_limit(20), 60);
    }

    async fn retriever() -> (Retriever<DeterministicEmbeddingProvider>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = MetadataStore::open(&dir.path().join("metadata.db")).unwrap();
        let vectors = VectorStore::connect("http://localhost:6334", "chunks", 4).unwrap();
        let embeddings = Arc::new(LazyEmbeddingProvider::new(DeterministicEmbeddingProvider::new(4)));
        (Retriever::new(store, vectors, embeddings), dir)
    }

    #[tokio::test]
    async fn get_dependencies_resolves_symbol_then_falls_back_to_file() {
        // `spec.md` §8 scenario 3.
        let (retriever, _dir) = retriever().await;
        let a = retriever
            .store
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
        let b = retriever
            .store
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
        let caller_id = retriever
            .store
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
        let foo_id = retriever
            .store
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
        retriever
            .store
            .insert_graph_edges(vec![NewGraphEdge {
                source_symbol_id: caller_id,
                target_symbol_id: foo_id,
                edge_type: EdgeType::Calls,
                weight: 1.0,
                source_file_id: a,
                target_file_id: b,
            }])
            .await
            .unwrap();

        let deps = retriever.get_dependencies("caller", 1).await.unwrap();
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].file_path, "b.ts");
        assert_eq!(deps[0].match_type, MatchType::Graph);
        assert_eq!(deps[0].symbols, vec!["foo".to_string()]);

        let unknown = retriever.get_dependencies("does-not-exist", 1).await.unwrap();
        assert!(unknown.is_empty());
    }
}
