//! Ollama HTTP embedding backend.
//!
//! Grounded on `rag_store::embed::ollama::OllamaEmbedder`: same
//! `reqwest::Client` + `/api/embeddings` request shape, extended to batch
//! (the teacher's client embeds one string per call) and to probe the
//! declared dimension on `initialize`.

use crate::error::{EmbeddingError, Result};
use crate::EmbeddingProvider;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug)]
pub struct OllamaConfig {
    pub url: String,
    pub model: String,
    pub dimensions: usize,
}

pub struct OllamaEmbeddingProvider {
    client: reqwest::Client,
    config: OllamaConfig,
}

impl OllamaEmbeddingProvider {
    pub fn new(config: OllamaConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        #[derive(Serialize)]
        struct Request<'a> {
            model: &'a str,
            prompt: &'a str,
        }
        #[derive(Deserialize)]
        struct Response {
            embedding: Vec<f32>,
        }

        let req = Request {
            model: &self.config.model,
            prompt: text,
        };

        let resp = self
            .client
            .post(format!("{}/api/embeddings", self.config.url))
            .json(&req)
            .send()
            .await
            .map_err(|e| EmbeddingError::Provider(format!("ollama request failed: {e}")))?
            .error_for_status()
            .map_err(|e| EmbeddingError::Provider(format!("ollama http error: {e}")))?;

        let parsed: Response = resp
            .json()
            .await
            .map_err(|e| EmbeddingError::Provider(format!("ollama json parse failed: {e}")))?;

        if parsed.embedding.len() != self.config.dimensions {
            return Err(EmbeddingError::DimensionMismatch {
                got: parsed.embedding.len(),
                want: self.config.dimensions,
            });
        }
        Ok(parsed.embedding)
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbeddingProvider {
    #[tracing::instrument(level = "info", skip(self))]
    async fn initialize(&self) -> Result<()> {
        self.embed_one("repo-knowledge dimension probe").await?;
        Ok(())
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for (i, text) in texts.iter().enumerate() {
            let vector = self.embed_one(text).await.map_err(|e| {
                EmbeddingError::BatchFailure {
                    start: i,
                    end: i + 1,
                    cause: e.to_string(),
                }
            })?;
            out.push(vector);
        }
        Ok(out)
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_one(text).await
    }

    fn model_id(&self) -> &str {
        &self.config.model
    }

    fn dimensions(&self) -> usize {
        self.config.dimensions
    }
}
