//! A deterministic, network-free provider for tests and pipeline dry-runs.
//!
//! Plays the role `rag_store::embed::noop_embedder::NoopEmbedder` plays in
//! the teacher (a provider that needs no live backend), but produces a
//! real, stable vector from the text's bytes instead of erroring, so
//! pipeline/retriever tests can exercise vector search end to end.

use crate::error::Result;
use crate::EmbeddingProvider;
use async_trait::async_trait;

pub struct DeterministicEmbeddingProvider {
    model_id: String,
    dimensions: usize,
}

impl DeterministicEmbeddingProvider {
    pub fn new(dimensions: usize) -> Self {
        Self {
            model_id: "deterministic-test-embedder".to_string(),
            dimensions,
        }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        for (i, byte) in text.bytes().enumerate() {
            let slot = i % self.dimensions;
            vector[slot] += (byte as f32 + 1.0) / 255.0;
        }
        let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for DeterministicEmbeddingProvider {
    async fn initialize(&self) -> Result<()> {
        Ok(())
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed_one(text))
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_text_yields_same_vector() {
        let provider = DeterministicEmbeddingProvider::new(8);
        let a = provider.embed_query("hello world").await.unwrap();
        let b = provider.embed_query("hello world").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 8);
    }

    #[tokio::test]
    async fn different_text_yields_different_vector() {
        let provider = DeterministicEmbeddingProvider::new(8);
        let a = provider.embed_query("hello").await.unwrap();
        let b = provider.embed_query("goodbye").await.unwrap();
        assert_ne!(a, b);
    }
}
