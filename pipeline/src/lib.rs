//! Pipeline orchestration (`spec.md` §4.8): discover → diff → parse+extract
//! → chunk → persist metadata → embed → store vectors → build graph → rank
//! → summarize → state.
//!
//! Grounded on `codegraph_prep::run::prepare_qdrant_context`'s numbered,
//! single-entry-point orchestration style — `tracing::info!` counts between
//! steps, `anyhow::Result` at the orchestration layer — generalized from its
//! scan-once/export-to-disk shape to this crate's incremental, dual-store
//! persistence with restart-after-failure semantics up to phase 2.

pub mod discover;
pub mod summaries;

use anyhow::{Context, Result};
use rk_chunking::chunk_file;
use rk_config::RepoKnowledgeConfig;
use rk_diffing::{compute_diff, full_diff, hash_content, read_and_cache, DiscoveredFile};
use rk_embeddings::{EmbeddingProvider, LazyEmbeddingProvider};
use rk_graph::{
    build_call_symbol_edges, build_file_dependencies, build_import_symbol_edges, build_name_index,
    ParsedFile, ParsedFileSymbol, SymbolRef,
};
use rk_metadata_store::{ChunkRecord, MetadataStore, NewChunk, NewFile, NewSymbol, StateEntry};
use rk_parsing::{Language, Parser};
use rk_ranker::rank_symbols;
use rk_symbols::{extractor_for, Symbol};
use rk_vector_store::{ChunkVectorRecord, VectorStore};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

pub use discover::{discover_files, known_language_files, MAX_FILE_BYTES};

/// `spec.md` §4.8 phase 6: "embed chunk contents in batches of 16".
const EMBED_BATCH_SIZE: usize = 16;

#[derive(Debug, Clone, Default)]
pub struct IndexOptions {
    /// Clear every table and treat every discovered file as added.
    pub full: bool,
    /// Run phase 10 (file/directory/project summaries).
    pub with_summaries: bool,
}

#[derive(Debug, Clone, Default)]
pub struct IndexReport {
    pub added: usize,
    pub modified: usize,
    pub removed: usize,
    pub unchanged: usize,
    pub total_files: usize,
    pub total_chunks: usize,
}

/// Orchestrates one full indexing run over a project. Generic over the
/// embedding backend so callers can swap `OllamaEmbeddingProvider` for
/// `DeterministicEmbeddingProvider` in tests without a trait object.
pub struct Pipeline<P: EmbeddingProvider> {
    store: MetadataStore,
    vectors: VectorStore,
    embeddings: Arc<LazyEmbeddingProvider<P>>,
    config: RepoKnowledgeConfig,
}

impl<P: EmbeddingProvider> Pipeline<P> {
    /// `embeddings` is shared (not owned) so the same lazily-initialized
    /// provider instance can back both indexing and `rk-retriever` queries
    /// without double-initializing the model.
    pub fn new(
        store: MetadataStore,
        vectors: VectorStore,
        embeddings: Arc<LazyEmbeddingProvider<P>>,
        config: RepoKnowledgeConfig,
    ) -> Self {
        Self {
            store,
            vectors,
            embeddings,
            config,
        }
    }

    pub fn store(&self) -> &MetadataStore {
        &self.store
    }

    pub fn vectors(&self) -> &VectorStore {
        &self.vectors
    }

    #[tracing::instrument(level = "info", skip(self))]
    pub async fn run(&self, options: IndexOptions) -> Result<IndexReport> {
        // 1. Discover.
        let discovered = known_language_files(discover_files(
            &self.config.project_root,
            &self.config.ignore_patterns,
        ));
        info!(count = discovered.len(), "pipeline: discovered files");

        // 2. Diff.
        let diff = if options.full {
            self.store.clear_all().await.context("clearing store for --full reindex")?;
            full_diff(&discovered)
        } else {
            let existing = self.store.all_files().await?;
            let existing_hashes: HashMap<String, String> =
                existing.iter().map(|f| (f.path.clone(), f.content_hash.clone())).collect();
            let existing_sizes: HashMap<String, u64> =
                existing.iter().map(|f| (f.path.clone(), f.size as u64)).collect();
            compute_diff(&discovered, &existing_hashes, &existing_sizes)
                .context("computing discovery-vs-store diff")?
        };
        info!(
            added = diff.added.len(),
            modified = diff.modified.len(),
            removed = diff.removed.len(),
            unchanged = diff.unchanged.len(),
            "pipeline: diffed"
        );

        for path in &diff.removed {
            if let Some(rec) = self.store.get_file_by_path(path.clone()).await? {
                let _ = self.vectors.delete_by_file_id(rec.id).await;
                self.store.delete_file_by_path(path.clone()).await?;
            }
        }
        for path in &diff.modified {
            if let Some(rec) = self.store.get_file_by_path(path.clone()).await? {
                let _ = self.vectors.delete_by_file_id(rec.id).await;
                self.store.delete_graph_edges_for_file(rec.id).await?;
                self.store.delete_file_dependencies_for_file(rec.id).await?;
                self.store.delete_chunks_for_file(rec.id).await?;
                self.store.delete_symbols_for_file(rec.id).await?;
            }
        }

        let by_path: HashMap<&str, &DiscoveredFile> =
            discovered.iter().map(|f| (f.rel_path.as_str(), f)).collect();
        let touched: Vec<String> = diff.added.iter().chain(diff.modified.iter()).cloned().collect();

        // 3, 4, 5: parse+extract, chunk, persist metadata, per touched file.
        let parser = Parser::new();
        let mut parsed_files: Vec<ParsedFile> = Vec::with_capacity(touched.len());
        let mut vector_targets: Vec<PendingVector> = Vec::new();

        for path in &touched {
            let Some(discovered_file) = by_path.get(path.as_str()) else {
                continue;
            };
            let cached = match diff.content_cache.get(path) {
                Some(c) => c.clone(),
                None => match read_and_cache(&discovered_file.abs_path) {
                    Ok(c) => c,
                    Err(err) => {
                        warn!(path = %path, error = %err, "pipeline: failed to read file, skipping");
                        continue;
                    }
                },
            };

            let language = Language::from_path(Path::new(path));
            let extraction = language
                .filter(|l| l.is_code())
                .and_then(|l| {
                    extractor_for(l)
                        .and_then(|extractor| parser.parse(&cached.content, l).map(|tree| extractor.extract(&tree, &cached.content)))
                })
                .unwrap_or_default();

            let chunks = chunk_file(path, &cached.content, &extraction.symbols, self.config.chunk_max_tokens);

            let file_id = self
                .store
                .upsert_file(NewFile {
                    path: path.clone(),
                    language: language.map(|l| l.as_str().to_string()),
                    size: discovered_file.size as i64,
                    content_hash: cached.hash.clone(),
                    last_indexed: now_ts(),
                    line_count: line_count(&cached.content),
                    purpose: None,
                })
                .await?;

            let new_symbols: Vec<NewSymbol> = extraction.symbols.iter().map(symbol_to_new).collect();
            let symbol_ids = self.store.insert_symbols_for_file(file_id, new_symbols).await?;
            let parsed_symbols: Vec<ParsedFileSymbol> = symbol_ids
                .into_iter()
                .zip(extraction.symbols.into_iter())
                .map(|(id, symbol)| ParsedFileSymbol { id, symbol })
                .collect();

            let new_chunks: Vec<NewChunk> = chunks
                .iter()
                .enumerate()
                .map(|(i, c)| NewChunk {
                    chunk_index: i as i64,
                    content: c.text.clone(),
                    content_hash: hash_content(c.text.as_bytes()),
                    start_line: c.start_line as i64,
                    end_line: c.end_line as i64,
                    symbol_names: c.symbol_names.clone(),
                    token_count: c.token_estimate as i64,
                })
                .collect();
            let chunk_ids = self.store.insert_chunks_for_file(file_id, new_chunks.clone()).await?;

            let language_str = language.map(|l| l.as_str().to_string());
            let chunk_records: Vec<ChunkRecord> = chunk_ids
                .iter()
                .zip(new_chunks.iter())
                .map(|(&id, c)| ChunkRecord {
                    id,
                    file_id,
                    chunk_index: c.chunk_index,
                    content: c.content.clone(),
                    content_hash: c.content_hash.clone(),
                    start_line: c.start_line,
                    end_line: c.end_line,
                    symbol_names: c.symbol_names.clone(),
                    token_count: c.token_count,
                })
                .collect();

            for record in &chunk_records {
                vector_targets.push(PendingVector {
                    chunk_id: record.id,
                    file_id,
                    file_path: path.clone(),
                    language: language_str.clone(),
                    start_line: record.start_line,
                    end_line: record.end_line,
                    symbol_names: record.symbol_names.clone(),
                    content: record.content.clone(),
                });
            }

            parsed_files.push(ParsedFile {
                file_id,
                path: path.clone(),
                symbols: parsed_symbols,
                imports: extraction.imports,
                chunks: chunk_records,
            });
        }

        self.store.rebuild_fts().await.context("rebuilding full-text indexes")?;

        // 6. Embed.
        self.embeddings.ensure_initialized().await.context("initializing embedding provider")?;

        let mut embedded: Vec<(PendingVector, Vec<f32>)> = Vec::with_capacity(vector_targets.len());
        for (batch_index, batch) in vector_targets.chunks(EMBED_BATCH_SIZE).enumerate() {
            let texts: Vec<String> = batch.iter().map(|t| t.content.clone()).collect();
            let vectors = self
                .embeddings
                .provider()
                .embed(&texts)
                .await
                .with_context(|| format!("embedding batch {batch_index} ({} chunks)", batch.len()))?;
            info!(batch = batch_index, chunks = batch.len(), "pipeline: embedded batch");
            for (target, vector) in batch.iter().cloned().zip(vectors.into_iter()) {
                embedded.push((target, vector));
            }
        }

        // 7. Store vectors.
        if options.full {
            self.vectors.recreate_collection().await.context("recreating vector collection")?;
        } else {
            self.vectors.ensure_collection().await.context("ensuring vector collection")?;
        }
        let records: Vec<ChunkVectorRecord> = embedded
            .into_iter()
            .map(|(target, vector)| ChunkVectorRecord {
                vector,
                chunk_id: target.chunk_id,
                file_id: target.file_id,
                file_path: target.file_path,
                language: target.language,
                start_line: target.start_line,
                end_line: target.end_line,
                symbol_names: target.symbol_names,
                content: target.content,
            })
            .collect();
        self.vectors.upsert_chunks(records).await.context("upserting chunk vectors")?;

        // 8. Build graph.
        if !parsed_files.is_empty() {
            let all_symbols = self.store.all_symbols().await?;
            let name_index = build_name_index(
                &all_symbols
                    .iter()
                    .map(|s| {
                        (
                            SymbolRef {
                                id: s.id,
                                file_id: s.file_id,
                                kind: s.kind.clone(),
                            },
                            s.name.clone(),
                        )
                    })
                    .collect::<Vec<_>>(),
            );

            let all_files = self.store.all_file_paths().await?;
            let known_paths: HashSet<String> = all_files.iter().map(|(_, path, _)| path.clone()).collect();
            let path_to_file_id: HashMap<String, i64> =
                all_files.iter().map(|(id, path, _)| (path.clone(), *id)).collect();

            let file_deps = build_file_dependencies(&parsed_files, &known_paths, &path_to_file_id);
            self.store.insert_file_dependencies(file_deps).await?;

            let mut edges = build_import_symbol_edges(&parsed_files, &name_index);
            edges.extend(build_call_symbol_edges(&parsed_files, &name_index));
            self.store.insert_graph_edges(edges).await?;
        }

        // 9. Rank.
        let all_symbol_ids = self.store.all_symbol_ids().await?;
        let all_edges = self.store.all_graph_edges().await?;
        let scores = rank_symbols(&all_symbol_ids, &all_edges);
        self.store.update_importance_scores(scores.into_iter().collect()).await?;

        // 10. Summaries (only when requested).
        if options.with_summaries {
            summaries::build_summaries(&self.store).await?;
        }

        // 11. State.
        let total_files = self.store.all_file_paths().await?.len();
        let total_chunks = self.store.count_chunks().await? as usize;
        let indexed_at = now_ts().to_string();
        let mut state_entries = vec![
            StateEntry { key: "last_indexed".to_string(), value: indexed_at.clone() },
            StateEntry {
                key: "embedding_model".to_string(),
                value: self.config.embedding_model.clone(),
            },
            StateEntry { key: "total_files".to_string(), value: total_files.to_string() },
            StateEntry { key: "total_chunks".to_string(), value: total_chunks.to_string() },
        ];
        if options.full {
            state_entries.push(StateEntry { key: "last_full_index".to_string(), value: indexed_at });
        }
        self.store.set_many(state_entries).await?;

        Ok(IndexReport {
            added: diff.added.len(),
            modified: diff.modified.len(),
            removed: diff.removed.len(),
            unchanged: diff.unchanged.len(),
            total_files,
            total_chunks,
        })
    }

    /// Shutdown: close the vector store, dispose the embedding provider,
    /// close the metadata store; errors are suppressed (`spec.md` §5).
    pub async fn shutdown(&self) {
        let _ = self.embeddings.provider().dispose().await;
    }
}

#[derive(Debug, Clone)]
struct PendingVector {
    chunk_id: i64,
    file_id: i64,
    file_path: String,
    language: Option<String>,
    start_line: i64,
    end_line: i64,
    symbol_names: Vec<String>,
    content: String,
}

fn symbol_to_new(symbol: &Symbol) -> NewSymbol {
    NewSymbol {
        name: symbol.name.clone(),
        kind: symbol.kind.as_str().to_string(),
        signature: symbol.signature.clone(),
        start_line: symbol.start_line as i64,
        end_line: symbol.end_line as i64,
        start_col: symbol.start_col as i64,
        end_col: symbol.end_col as i64,
        parent_name: symbol.parent_name.clone(),
        docstring: symbol.docstring.clone(),
        exported: symbol.exported,
    }
}

/// `spec.md` §4.8 phase 5: "line count = newline count, minus one if the
/// file ends with a newline".
fn line_count(content: &str) -> i64 {
    let newlines = content.bytes().filter(|&b| b == b'\n').count() as i64;
    if content.ends_with('\n') {
        newlines - 1
    } else {
        newlines
    }
}

fn now_ts() -> i64 {
    chrono::Utc::now().timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_count_subtracts_one_for_trailing_newline() {
        assert_eq!(line_count("a\nb\n"), 1);
        assert_eq!(line_count("a\nb"), 1);
        assert_eq!(line_count(""), 0);
    }
}
