//! Dense-vector store facade: one `chunks` collection of chunk embeddings,
//! similarity search with a language predicate.
//!
//! Grounded on `rag_store::qdrant_facade::QdrantFacade` and
//! `rag_store::filters`: the builder-API usage and the thin
//! `Result<_, ThisError>`-per-call shape carry over, generalized from the
//! teacher's generic JSON-payload record to this crate's fixed `chunks`
//! schema (`spec.md` §6).

mod error;

pub use error::{Result, VectorStoreError};

use qdrant_client::Qdrant;
use qdrant_client::qdrant::{
    Condition, CreateCollectionBuilder, Distance, Filter, Match, PointStruct,
    SearchParamsBuilder, SearchPointsBuilder, UpsertPointsBuilder, Value as QValue,
    VectorParamsBuilder, condition, r#match::MatchValue,
};
use std::collections::HashMap;

/// The record shape of one row in the `chunks` vector table (`spec.md` §3's
/// `ChunkEmbedding` entity / §6's column list).
#[derive(Debug, Clone)]
pub struct ChunkVectorRecord {
    pub vector: Vec<f32>,
    pub chunk_id: i64,
    pub file_id: i64,
    pub file_path: String,
    pub language: Option<String>,
    pub start_line: i64,
    pub end_line: i64,
    pub symbol_names: Vec<String>,
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct VectorSearchHit {
    pub chunk_id: i64,
    pub file_id: i64,
    pub file_path: String,
    pub language: Option<String>,
    pub start_line: i64,
    pub end_line: i64,
    pub symbol_names: Vec<String>,
    pub content: String,
    /// Non-negative distance; smaller is closer (`spec.md` §6).
    pub distance: f32,
}

pub struct VectorStore {
    client: Qdrant,
    collection: String,
    dimensions: u64,
}

impl VectorStore {
    pub fn connect(url: &str, collection: &str, dimensions: u64) -> Result<Self> {
        let client = Qdrant::from_url(url)
            .build()
            .map_err(|e| VectorStoreError::Config(e.to_string()))?;
        Ok(Self {
            client,
            collection: collection.to_string(),
            dimensions,
        })
    }

    /// Create the collection if absent; no-op otherwise.
    #[tracing::instrument(level = "info", skip(self))]
    pub async fn ensure_collection(&self) -> Result<()> {
        if self.client.collection_info(&self.collection).await.is_ok() {
            return Ok(());
        }
        self.client
            .create_collection(
                CreateCollectionBuilder::new(&self.collection)
                    .vectors_config(VectorParamsBuilder::new(self.dimensions, Distance::Euclid)),
            )
            .await
            .map_err(|e| VectorStoreError::Qdrant(e.to_string()))?;
        Ok(())
    }

    /// Full-index path: drop and recreate the collection, then populate it.
    #[tracing::instrument(level = "info", skip(self))]
    pub async fn recreate_collection(&self) -> Result<()> {
        let _ = self.client.delete_collection(&self.collection).await;
        self.client
            .create_collection(
                CreateCollectionBuilder::new(&self.collection)
                    .vectors_config(VectorParamsBuilder::new(self.dimensions, Distance::Euclid)),
            )
            .await
            .map_err(|e| VectorStoreError::Qdrant(e.to_string()))?;
        Ok(())
    }

    #[tracing::instrument(level = "debug", skip(self, records))]
    pub async fn upsert_chunks(&self, records: Vec<ChunkVectorRecord>) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        let mut points = Vec::with_capacity(records.len());
        for record in records {
            if record.vector.len() != self.dimensions as usize {
                return Err(VectorStoreError::DimensionMismatch {
                    got: record.vector.len(),
                    want: self.dimensions as usize,
                });
            }
            let mut payload: HashMap<String, QValue> = HashMap::new();
            payload.insert("chunk_id".into(), record.chunk_id.into());
            payload.insert("file_id".into(), record.file_id.into());
            payload.insert("file_path".into(), record.file_path.clone().into());
            if let Some(lang) = &record.language {
                payload.insert("language".into(), lang.clone().into());
            }
            payload.insert("start_line".into(), record.start_line.into());
            payload.insert("end_line".into(), record.end_line.into());
            payload.insert("symbol_names".into(), record.symbol_names.join(" ").into());
            payload.insert("content".into(), record.content.into());

            points.push(PointStruct::new(record.chunk_id as u64, record.vector, payload));
        }
        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection, points))
            .await
            .map_err(|e| VectorStoreError::Qdrant(e.to_string()))?;
        Ok(())
    }

    /// Delete every vector belonging to `file_id`, used when a file is
    /// modified or removed during incremental re-indexing.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn delete_by_file_id(&self, file_id: i64) -> Result<()> {
        let filter = Filter {
            must: vec![field_eq_int("file_id", file_id)],
            ..Default::default()
        };
        self.client
            .delete_points(
                qdrant_client::qdrant::DeletePointsBuilder::new(&self.collection)
                    .points(qdrant_client::qdrant::PointsSelector::from(filter)),
            )
            .await
            .map_err(|e| VectorStoreError::Qdrant(e.to_string()))?;
        Ok(())
    }

    #[tracing::instrument(level = "debug", skip(self, query_vector))]
    pub async fn search(
        &self,
        query_vector: Vec<f32>,
        limit: u64,
        language_filter: Option<&str>,
    ) -> Result<Vec<VectorSearchHit>> {
        let mut builder = SearchPointsBuilder::new(&self.collection, query_vector, limit)
            .with_payload(true)
            .params(SearchParamsBuilder::default().exact(false));
        if let Some(lang) = language_filter {
            let filter = Filter {
                must: vec![field_eq_str("language", lang)],
                ..Default::default()
            };
            builder = builder.filter(filter);
        }
        let res = self
            .client
            .search_points(builder)
            .await
            .map_err(|e| VectorStoreError::Qdrant(e.to_string()))?;

        Ok(res
            .result
            .into_iter()
            .filter_map(|point| point_to_hit(point.payload, point.score))
            .collect())
    }
}

fn field_eq_str(key: &str, value: &str) -> Condition {
    Condition {
        condition_one_of: Some(condition::ConditionOneOf::Field(
            qdrant_client::qdrant::FieldCondition {
                key: key.to_string(),
                r#match: Some(Match {
                    match_value: Some(MatchValue::Keyword(value.to_string())),
                }),
                ..Default::default()
            },
        )),
    }
}

fn field_eq_int(key: &str, value: i64) -> Condition {
    Condition {
        condition_one_of: Some(condition::ConditionOneOf::Field(
            qdrant_client::qdrant::FieldCondition {
                key: key.to_string(),
                r#match: Some(Match {
                    match_value: Some(MatchValue::Integer(value)),
                }),
                ..Default::default()
            },
        )),
    }
}

fn point_to_hit(payload: HashMap<String, QValue>, score: f32) -> Option<VectorSearchHit> {
    use qdrant_client::qdrant::value::Kind as K;

    let get_str = |p: &HashMap<String, QValue>, key: &str| -> Option<String> {
        p.get(key).and_then(|v| match &v.kind {
            Some(K::StringValue(s)) => Some(s.clone()),
            _ => None,
        })
    };
    let get_int = |p: &HashMap<String, QValue>, key: &str| -> Option<i64> {
        p.get(key).and_then(|v| match &v.kind {
            Some(K::IntegerValue(i)) => Some(*i),
            _ => None,
        })
    };

    Some(VectorSearchHit {
        chunk_id: get_int(&payload, "chunk_id")?,
        file_id: get_int(&payload, "file_id")?,
        file_path: get_str(&payload, "file_path")?,
        language: get_str(&payload, "language"),
        start_line: get_int(&payload, "start_line")?,
        end_line: get_int(&payload, "end_line")?,
        symbol_names: get_str(&payload, "symbol_names")
            .map(|s| s.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default(),
        content: get_str(&payload, "content")?,
        // Qdrant negates distance into its `score` so "higher is always
        // better" holds across every metric; for our Euclidean collection
        // that means `score = -distance`. Negate back to the non-negative
        // distance this struct's field promises.
        distance: -score,
    })
}
