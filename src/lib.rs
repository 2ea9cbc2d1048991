//! Composition root: wires `rk-config`, `rk-metadata-store`,
//! `rk-vector-store`, `rk-embeddings`, `rk-pipeline`, and `rk-retriever`
//! into a runnable `index`/`search` surface.
//!
//! `src/main.rs` is the thin CLI entry point; the wire adaptor that exposes
//! these operations to external agent clients, and full argument parsing,
//! are external collaborators out of this crate's scope (`spec.md` §1) —
//! this module exists so both the binary and integration tests share one
//! non-trivial construction path, the way the teacher's `main.rs` delegates
//! straight to its own composition root (`api::start`).

use std::sync::Arc;

use anyhow::{Context, Result};

use rk_config::RepoKnowledgeConfig;
use rk_embeddings::{EmbeddingProvider, LazyEmbeddingProvider, OllamaConfig, OllamaEmbeddingProvider};
use rk_metadata_store::MetadataStore;
use rk_pipeline::{IndexOptions, IndexReport, Pipeline};
use rk_retriever::{Retriever, SearchOptions, SearchResult};
use rk_vector_store::VectorStore;

/// Runtime endpoints for the two external stores. Neither belongs in
/// `config.json` (`spec.md` §6 lists only project-content keys there); both
/// are ordinary deployment environment variables, read the way the
/// teacher's `dotenvy::dotenv()` + env-var config loads its own endpoints.
pub struct Endpoints {
    pub qdrant_url: String,
    pub ollama_url: String,
}

impl Endpoints {
    pub fn from_env() -> Self {
        Self {
            qdrant_url: std::env::var("REPO_KNOWLEDGE_QDRANT_URL")
                .unwrap_or_else(|_| "http://localhost:6334".to_string()),
            ollama_url: std::env::var("REPO_KNOWLEDGE_OLLAMA_URL")
                .unwrap_or_else(|_| "http://localhost:11434".to_string()),
        }
    }
}

pub struct Stack {
    pub config: RepoKnowledgeConfig,
    pub pipeline: Pipeline<OllamaEmbeddingProvider>,
    pub retriever: Retriever<OllamaEmbeddingProvider>,
}

impl Stack {
    /// Load (or initialize) the project config and build every dependent
    /// store/provider, in the leaf-to-root order of `spec.md` §2.
    pub async fn open(project_root: &std::path::Path, endpoints: Endpoints) -> Result<Self> {
        let config = RepoKnowledgeConfig::load_or_init(project_root)
            .context("loading or initializing project config")?;

        let store = MetadataStore::open(&config.metadata_db_path())
            .context("opening metadata store")?;

        let vectors = VectorStore::connect(
            &endpoints.qdrant_url,
            "chunks",
            config.embedding_dimensions as u64,
        )
        .context("connecting to vector store")?;
        vectors.ensure_collection().await.context("ensuring vector collection exists")?;

        let provider = OllamaEmbeddingProvider::new(OllamaConfig {
            url: endpoints.ollama_url,
            model: config.embedding_model.clone(),
            dimensions: config.embedding_dimensions,
        });
        let embeddings = Arc::new(LazyEmbeddingProvider::new(provider));

        // A second `MetadataStore`/`VectorStore` handle is cheap (both wrap
        // an `Arc`-shared connection), so the pipeline and retriever each
        // own one rather than sharing a reference across an async boundary.
        let store_for_pipeline = MetadataStore::open(&config.metadata_db_path())
            .context("opening metadata store for pipeline")?;
        let vectors_for_pipeline = VectorStore::connect(
            &endpoints.qdrant_url,
            "chunks",
            config.embedding_dimensions as u64,
        )
        .context("connecting to vector store for pipeline")?;

        let pipeline = Pipeline::new(store_for_pipeline, vectors_for_pipeline, embeddings.clone(), config.clone());
        let retriever = Retriever::new(store, vectors, embeddings);

        Ok(Self { config, pipeline, retriever })
    }

    pub async fn run_index(&self, options: IndexOptions) -> Result<IndexReport> {
        self.pipeline.run(options).await.context("running indexing pipeline")
    }

    pub async fn run_search(&self, query: &str, options: SearchOptions) -> Result<Vec<SearchResult>> {
        self.retriever.search(query, &options).await.context("running hybrid search")
    }

    /// `spec.md` §8 scenario 3: walk the graph from a symbol or file out to
    /// `depth` hops.
    pub async fn run_dependencies(&self, identifier: &str, depth: usize) -> Result<Vec<SearchResult>> {
        self.retriever
            .get_dependencies(identifier, depth)
            .await
            .context("walking dependency graph")
    }
}
